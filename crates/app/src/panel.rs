//! Rendering for the collapsed bubble and the expanded chat panel.

use eframe::egui::{self, Color32};

use crate::scroll::offset_from_scroll_area;
use crate::state::AppState;

const INPUT_HEIGHT: f32 = 34.0;
const HEADER_HEIGHT: f32 = 28.0;

struct Palette {
    panel: Color32,
    user_bubble: Color32,
    ai_bubble: Color32,
    text: Color32,
    on_accent: Color32,
    subtle: Color32,
}

impl Palette {
    fn new(dark: bool, opacity: f32) -> Self {
        let p = if dark {
            Palette {
                panel: Color32::from_rgb(24, 24, 28),
                user_bubble: Color32::from_rgb(70, 130, 180),
                ai_bubble: Color32::from_rgb(50, 50, 58),
                text: Color32::from_rgb(220, 220, 230),
                on_accent: Color32::WHITE,
                subtle: Color32::from_rgb(160, 160, 180),
            }
        } else {
            Palette {
                panel: Color32::from_rgb(250, 250, 252),
                user_bubble: Color32::from_rgb(70, 130, 180),
                ai_bubble: Color32::from_rgb(236, 236, 242),
                text: Color32::from_rgb(40, 40, 50),
                on_accent: Color32::WHITE,
                subtle: Color32::from_rgb(100, 100, 115),
            }
        };
        Palette {
            panel: p.panel.gamma_multiply(opacity),
            user_bubble: p.user_bubble.gamma_multiply(opacity),
            ai_bubble: p.ai_bubble.gamma_multiply(opacity),
            text: p.text.gamma_multiply(opacity),
            on_accent: p.on_accent.gamma_multiply(opacity),
            subtle: p.subtle.gamma_multiply(opacity),
        }
    }
}

/// The pill shown while collapsed.
pub fn show_bubble(ui: &mut egui::Ui, state: &AppState, opacity: f32) {
    let rect = ui.max_rect();
    let rounding = egui::Rounding {
        nw: 0.0,
        ne: 0.0,
        sw: rect.height() / 2.0,
        se: rect.height() / 2.0,
    };
    ui.painter().rect_filled(
        rect,
        rounding,
        Color32::from_rgb(18, 18, 20).gamma_multiply(opacity),
    );

    let label = if state.is_thinking() {
        let time = ui.input(|i| i.time);
        match ((time * 2.0) as i32) % 3 {
            0 => "•",
            1 => "• •",
            _ => "• • •",
        }
    } else {
        "💬"
    };
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional(15.0),
        Color32::from_rgb(220, 220, 230).gamma_multiply(opacity),
    );
}

/// What one row in the message list shows.
struct Row {
    is_user: bool,
    text: String,
    thinking: bool,
}

pub fn show_chat_panel(ui: &mut egui::Ui, s: &mut AppState, opacity: f32) {
    let palette = Palette::new(s.settings.dark_mode, opacity);

    egui::Frame::none()
        .fill(palette.panel)
        .rounding(egui::Rounding {
            nw: 0.0,
            ne: 0.0,
            sw: 16.0,
            se: 16.0,
        })
        .inner_margin(egui::Margin::same(10.0))
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());

            // Header
            ui.horizontal(|ui| {
                ui.set_height(HEADER_HEIGHT);
                ui.label(
                    egui::RichText::new("Notch Chat")
                        .strong()
                        .size(14.0)
                        .color(palette.text),
                );
                if let Some(status) = s.status() {
                    ui.label(
                        egui::RichText::new(status)
                            .size(11.0)
                            .color(palette.subtle),
                    );
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(
                            !s.messages().is_empty(),
                            egui::Button::new(egui::RichText::new("Clear").size(12.0)),
                        )
                        .on_hover_text("Delete the whole conversation")
                        .clicked()
                    {
                        s.clear_history();
                    }
                    if ui
                        .add_enabled(
                            s.conversation.last_response().is_some(),
                            egui::Button::new(egui::RichText::new("Copy").size(12.0)),
                        )
                        .on_hover_text("Copy the last response")
                        .clicked()
                    {
                        s.copy_last_response();
                    }
                });
            });
            ui.separator();

            let pending = s.conversation.pending_placeholder();
            let rows: Vec<Row> = s
                .messages()
                .iter()
                .map(|m| Row {
                    is_user: m.is_user,
                    text: s.visible_text(m).to_string(),
                    thinking: pending == Some(m.id) && s.visible_text(m).is_empty(),
                })
                // An empty answer left over from an interrupted session has nothing to show
                .filter(|row| row.is_user || row.thinking || !row.text.is_empty())
                .collect();
            let jump_to_bottom = s.scroll.on_messages_changed(s.messages().len());

            let list_height = (ui.available_height() - INPUT_HEIGHT - 12.0).max(0.0);
            let output = egui::ScrollArea::vertical()
                .max_height(list_height)
                .auto_shrink([false, false])
                .stick_to_bottom(s.scroll.auto_scroll())
                .show(ui, |ui| {
                    if rows.is_empty() {
                        ui.add_space(list_height / 3.0);
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new("Ask me anything")
                                    .size(13.0)
                                    .color(palette.subtle),
                            );
                        });
                    }
                    for row in &rows {
                        ui.add_space(4.0);
                        render_row(ui, row, &palette);
                        ui.add_space(4.0);
                    }
                    if jump_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });

            // Only user scrolling moves the pin; content growth must not
            let user_scrolled = ui.input(|i| {
                let over = i
                    .pointer
                    .hover_pos()
                    .is_some_and(|p| output.inner_rect.contains(p));
                over && (i.raw_scroll_delta.y != 0.0 || i.pointer.any_down())
            });
            if user_scrolled {
                s.scroll.update_offset(offset_from_scroll_area(
                    output.state.offset.y,
                    output.content_size.y,
                    output.inner_rect.height(),
                ));
            }

            ui.add_space(6.0);
            render_input(ui, s, &palette);
        });
}

fn render_row(ui: &mut egui::Ui, row: &Row, palette: &Palette) {
    let max_width = ui.available_width() * 0.8;
    if row.is_user {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
            egui::Frame::none()
                .fill(palette.user_bubble)
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    ui.label(
                        egui::RichText::new(&row.text)
                            .color(palette.on_accent)
                            .size(13.0),
                    );
                });
        });
        return;
    }

    egui::Frame::none()
        .fill(palette.ai_bubble)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.set_max_width(max_width);
            if row.thinking {
                let time = ui.input(|i| i.time);
                let dots = match ((time * 2.0) as i32) % 4 {
                    0 => "   ",
                    1 => ".  ",
                    2 => ".. ",
                    _ => "...",
                };
                ui.label(
                    egui::RichText::new(format!("Thinking{}", dots))
                        .color(palette.subtle)
                        .italics()
                        .size(13.0),
                );
            } else {
                ui.label(
                    egui::RichText::new(&row.text)
                        .color(palette.text)
                        .size(13.0),
                );
            }
        });
}

fn render_input(ui: &mut egui::Ui, s: &mut AppState, palette: &Palette) {
    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [ui.available_width() - 64.0, INPUT_HEIGHT],
            egui::TextEdit::singleline(&mut s.input_text)
                .hint_text("Type a message")
                .text_color(palette.text)
                .font(egui::FontId::new(13.0, egui::FontFamily::Proportional)),
        );

        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if enter && s.can_send() {
            s.send_message();
            response.request_focus();
        }

        let btn = egui::Button::new(egui::RichText::new("Send").color(palette.on_accent))
            .fill(palette.user_bubble);
        if ui
            .add_enabled(s.can_send(), btn.min_size(egui::vec2(56.0, INPUT_HEIGHT)))
            .clicked()
        {
            s.send_message();
        }
    });
}
