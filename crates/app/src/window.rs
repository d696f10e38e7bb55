//! Executes `WindowCommand`s: tracks the visible frame, opacity and content
//! view, and interpolates frame animations over time.

use eframe::egui::{lerp, Rect};
use std::time::{Duration, Instant};

use crate::hover::{ContentView, Curve, WindowCommand, WindowState};

/// Cubic ease-in-ease-out on `t` in `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone, Copy)]
pub struct FrameTween {
    from: Rect,
    to: Rect,
    from_opacity: f32,
    to_opacity: f32,
    started: Instant,
    duration: Duration,
    curve: Curve,
}

impl FrameTween {
    pub fn new(
        from: (Rect, f32),
        to: (Rect, f32),
        duration: Duration,
        curve: Curve,
        now: Instant,
    ) -> Self {
        Self {
            from: from.0,
            to: to.0,
            from_opacity: from.1,
            to_opacity: to.1,
            started: now,
            duration,
            curve,
        }
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = now.saturating_duration_since(self.started).as_secs_f32()
            / self.duration.as_secs_f32();
        match self.curve {
            Curve::EaseInEaseOut => ease_in_out(t),
        }
    }

    pub fn sample(&self, now: Instant) -> (Rect, f32) {
        let p = self.progress(now);
        let rect = Rect::from_min_max(
            self.from.min.lerp(self.to.min, p),
            self.from.max.lerp(self.to.max, p),
        );
        (rect, lerp(self.from_opacity..=self.to_opacity, p))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// What the shell currently shows, plus any running animation.
pub struct WindowDriver {
    frame: Rect,
    opacity: f32,
    content: ContentView,
    tween: Option<FrameTween>,
}

impl WindowDriver {
    pub fn new(initial: WindowState) -> Self {
        Self {
            frame: initial.frame(),
            opacity: initial.opacity(),
            content: initial.content(),
            tween: None,
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn content(&self) -> ContentView {
        self.content
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Run commands in order. Frame animations start from wherever the window
    /// is right now, so a reversed transition mid-flight does not jump.
    pub fn apply(&mut self, commands: &[WindowCommand], now: Instant) {
        for command in commands {
            match command {
                WindowCommand::SetOpacity(opacity) => self.opacity = *opacity,
                WindowCommand::SwapContent(view) => self.content = *view,
                WindowCommand::AnimateFrame {
                    to,
                    opacity,
                    duration,
                    curve,
                } => {
                    self.tween = Some(FrameTween::new(
                        (self.frame, self.opacity),
                        (*to, *opacity),
                        *duration,
                        *curve,
                        now,
                    ));
                }
            }
        }
    }

    /// Advance the animation. Returns the new frame when it moved.
    pub fn tick(&mut self, now: Instant) -> Option<Rect> {
        let tween = self.tween?;
        let (frame, opacity) = tween.sample(now);
        self.opacity = opacity;
        if tween.is_finished(now) {
            self.tween = None;
        }
        if frame != self.frame {
            self.frame = frame;
            Some(frame)
        } else {
            None
        }
    }
}
