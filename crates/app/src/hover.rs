//! Hover-driven expand/collapse of the notch window.
//!
//! The controller never touches the window itself. Each transition returns
//! the next state plus the commands the shell must run, in order.

use eframe::egui::{pos2, vec2, Pos2, Rect, Vec2};
use shared::settings::WindowSettings;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("no primary display found")]
    NoPrimaryDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentView {
    Bubble,
    ChatPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    EaseInEaseOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    SetOpacity(f32),
    SwapContent(ContentView),
    AnimateFrame {
        to: Rect,
        opacity: f32,
        duration: Duration,
        curve: Curve,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowState {
    Collapsed { frame: Rect, opacity: f32 },
    Expanded { frame: Rect, opacity: f32 },
}

impl WindowState {
    pub fn frame(&self) -> Rect {
        match self {
            WindowState::Collapsed { frame, .. } | WindowState::Expanded { frame, .. } => *frame,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            WindowState::Collapsed { opacity, .. } | WindowState::Expanded { opacity, .. } => {
                *opacity
            }
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, WindowState::Expanded { .. })
    }

    pub fn content(&self) -> ContentView {
        if self.is_expanded() {
            ContentView::ChatPanel
        } else {
            ContentView::Bubble
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverEvent {
    PointerEntered,
    /// Pointer left the tracking region; `pointer` is its last known screen
    /// position, if any.
    PointerExited { pointer: Option<Pos2> },
    /// Window stopped being the key/focused window.
    KeyStatusLost { pointer: Option<Pos2> },
}

/// Target rectangles for both states, in screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub collapsed: Rect,
    pub expanded: Rect,
    pub collapsed_opacity: f32,
    pub duration: Duration,
}

impl Geometry {
    /// Both frames are centred horizontally at the top of the display.
    pub fn for_display(display: Vec2, settings: &WindowSettings) -> Self {
        let top_center = |size: [f32; 2]| {
            let size = vec2(size[0], size[1]);
            let min = pos2((display.x - size.x) / 2.0, settings.top_margin);
            Rect::from_min_size(min, size)
        };
        Self {
            collapsed: top_center(settings.collapsed_size),
            expanded: top_center(settings.expanded_size),
            collapsed_opacity: settings.collapsed_opacity.clamp(0.0, 1.0),
            duration: Duration::from_millis(settings.animation_ms),
        }
    }

    fn collapsed_state(&self) -> WindowState {
        WindowState::Collapsed {
            frame: self.collapsed,
            opacity: self.collapsed_opacity,
        }
    }

    fn expanded_state(&self) -> WindowState {
        WindowState::Expanded {
            frame: self.expanded,
            opacity: 1.0,
        }
    }
}

/// Pure transition function.
pub fn transition(
    state: WindowState,
    geometry: &Geometry,
    event: HoverEvent,
) -> (WindowState, Vec<WindowCommand>) {
    match (state, event) {
        (WindowState::Collapsed { .. }, HoverEvent::PointerEntered) => {
            let next = geometry.expanded_state();
            let commands = vec![
                WindowCommand::SetOpacity(0.0),
                WindowCommand::SwapContent(ContentView::ChatPanel),
                WindowCommand::AnimateFrame {
                    to: next.frame(),
                    opacity: next.opacity(),
                    duration: geometry.duration,
                    curve: Curve::EaseInEaseOut,
                },
            ];
            (next, commands)
        }
        (
            WindowState::Expanded { frame, .. },
            HoverEvent::PointerExited { pointer } | HoverEvent::KeyStatusLost { pointer },
        ) => {
            // Exit events can fire mid-animation while the pointer is still inside
            if pointer.is_some_and(|p| frame.contains(p)) {
                return (state, Vec::new());
            }
            let next = geometry.collapsed_state();
            let commands = vec![
                WindowCommand::SwapContent(ContentView::Bubble),
                WindowCommand::AnimateFrame {
                    to: next.frame(),
                    opacity: next.opacity(),
                    duration: geometry.duration,
                    curve: Curve::EaseInEaseOut,
                },
            ];
            (next, commands)
        }
        _ => (state, Vec::new()),
    }
}

pub struct HoverController {
    geometry: Geometry,
    state: WindowState,
}

impl HoverController {
    /// A missing display is unrecoverable: there is nowhere to put the window.
    pub fn new(display: Option<Vec2>, settings: &WindowSettings) -> Result<Self, WindowError> {
        let display = display
            .filter(|d| d.x > 0.0 && d.y > 0.0)
            .ok_or(WindowError::NoPrimaryDisplay)?;
        let geometry = Geometry::for_display(display, settings);
        Ok(Self {
            state: geometry.collapsed_state(),
            geometry,
        })
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn is_expanded(&self) -> bool {
        self.state.is_expanded()
    }

    pub fn handle(&mut self, event: HoverEvent) -> Vec<WindowCommand> {
        let (next, commands) = transition(self.state, &self.geometry, event);
        if next != self.state {
            tracing::debug!(expanded = next.is_expanded(), ?event, "window transition");
        }
        self.state = next;
        commands
    }
}

/// One frame's worth of pointer and focus input, in screen coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSample {
    /// Pointer is over the window
    pub inside: bool,
    /// Last known pointer position
    pub pointer: Option<Pos2>,
    pub focused: bool,
}

/// Turns per-frame samples into enter/exit/focus-loss edges.
#[derive(Debug, Default)]
pub struct PointerTracker {
    inside: bool,
    focused: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: PointerSample) -> Vec<HoverEvent> {
        let mut events = Vec::new();
        if sample.inside && !self.inside {
            events.push(HoverEvent::PointerEntered);
        } else if !sample.inside && self.inside {
            events.push(HoverEvent::PointerExited {
                pointer: sample.pointer,
            });
        }
        if self.focused && !sample.focused {
            events.push(HoverEvent::KeyStatusLost {
                pointer: sample.pointer,
            });
        }
        self.inside = sample.inside;
        self.focused = sample.focused;
        events
    }
}
