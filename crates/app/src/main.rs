use eframe::egui;
use parking_lot::Mutex;
use services::{FileSlotStorage, SlotStorage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod animator;
mod config;
mod hover;
mod panel;
mod scroll;
mod state;
mod utils;
mod window;

use hover::{ContentView, HoverController, PointerSample, WindowCommand, WindowError};
use state::AppState;
use window::WindowDriver;

/// Frames to wait for the backend to report a monitor before giving up.
const DISPLAY_PROBE_FRAMES: u32 = 10;
const THINKING_REPAINT: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config::load_settings();
    let storage: Arc<dyn SlotStorage> = Arc::new(FileSlotStorage::default_location());
    let collapsed = settings.window.collapsed_size;
    let dark = settings.dark_mode;
    let state = AppState::new(settings, storage);
    tracing::info!(messages = state.messages().len(), "chat history restored");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Notch Chat")
            .with_inner_size(collapsed)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_resizable(false),
        vsync: true,
        ..Default::default()
    };

    let fatal: Arc<Mutex<Option<WindowError>>> = Arc::new(Mutex::new(None));
    let app = NotchChatApp {
        state: Arc::new(Mutex::new(state)),
        fatal: fatal.clone(),
        display_probes: 0,
    };
    eframe::run_native(
        "Notch Chat",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(if dark {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("window system error: {}", e))?;

    if let Some(err) = fatal.lock().take() {
        return Err(err.into());
    }
    Ok(())
}

struct NotchChatApp {
    state: Arc<Mutex<AppState>>,
    fatal: Arc<Mutex<Option<WindowError>>>,
    display_probes: u32,
}

impl NotchChatApp {
    /// Place the window once the primary display is known.
    fn ensure_hover(&mut self, ctx: &egui::Context, s: &mut AppState) -> bool {
        if s.hover.is_some() {
            return true;
        }
        let display = ctx.input(|i| i.viewport().monitor_size);
        match HoverController::new(display, &s.settings.window) {
            Ok(hover) => {
                let initial = hover.state();
                tracing::info!(frame = ?initial.frame(), "window placed");
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(initial.frame().min));
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(initial.frame().size()));
                s.window = Some(WindowDriver::new(initial));
                s.hover = Some(hover);
                true
            }
            Err(e) if self.display_probes < DISPLAY_PROBE_FRAMES => {
                self.display_probes += 1;
                tracing::debug!(error = %e, attempt = self.display_probes, "display not reported yet");
                ctx.request_repaint();
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot place window");
                *self.fatal.lock() = Some(e);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                false
            }
        }
    }
}

fn pointer_sample(ctx: &egui::Context) -> PointerSample {
    ctx.input(|i| {
        let origin = i
            .viewport()
            .inner_rect
            .map(|r| r.min.to_vec2())
            .unwrap_or_default();
        let hover = i.pointer.hover_pos();
        PointerSample {
            inside: hover.is_some(),
            pointer: hover.map(|p| p + origin),
            focused: i.viewport().focused.unwrap_or(false),
        }
    })
}

impl eframe::App for NotchChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let state = self.state.clone();
        let mut s = state.lock();

        // Poll for finished or streaming responses (non-blocking)
        s.poll_chat_events();

        if !self.ensure_hover(ctx, &mut s) {
            return;
        }

        // Hover and focus edges drive expand/collapse
        let events = s.pointer.observe(pointer_sample(ctx));
        for event in events {
            let commands = match s.hover.as_mut() {
                Some(hover) => hover.handle(event),
                None => Vec::new(),
            };
            if commands.contains(&WindowCommand::SwapContent(ContentView::Bubble)) {
                s.cancel_reveals();
            }
            if let Some(window) = s.window.as_mut() {
                window.apply(&commands, now);
            }
        }

        let (content, opacity) = match s.window.as_mut() {
            Some(window) => {
                if let Some(frame) = window.tick(now) {
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(frame.min));
                    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(frame.size()));
                }
                if window.is_animating() {
                    ctx.request_repaint();
                }
                (window.content(), window.opacity())
            }
            None => (ContentView::Bubble, 1.0),
        };

        // Reveal state is settled before drawing so a fresh answer never flashes in full
        let revealing = s.update_reveals(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| match content {
                ContentView::Bubble => panel::show_bubble(ui, &s, opacity),
                ContentView::ChatPanel => panel::show_chat_panel(ui, &mut s, opacity),
            });

        if revealing {
            if let Some(next) = s.next_reveal_tick() {
                ctx.request_repaint_after(next.saturating_duration_since(now));
            }
        }
        if s.is_thinking() {
            ctx.request_repaint_after(THINKING_REPAINT);
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Color32::TRANSPARENT.to_normalized_gamma_f32()
    }
}
