//! Auto-scroll decisions for the message list.

/// Tracks how far the list is from its bottom edge.
///
/// Offsets are signed distances from the bottom: `0` means pinned to the
/// newest message, negative values mean the user scrolled up.
pub struct ScrollCoordinator {
    threshold: f32,
    auto_scroll: bool,
    last_len: usize,
}

impl ScrollCoordinator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.abs(),
            auto_scroll: true,
            last_len: 0,
        }
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Recomputed on every change, so scrolling back near the bottom
    /// re-enables auto-scroll.
    pub fn update_offset(&mut self, offset: f32) {
        self.auto_scroll = offset >= -self.threshold;
    }

    /// Call with the current message count. Returns true when a message was
    /// appended and the view should jump to it.
    pub fn on_messages_changed(&mut self, len: usize) -> bool {
        let appended = len > self.last_len;
        self.last_len = len;
        appended && self.auto_scroll
    }
}

/// Convert egui's top-origin scroll offset into a signed distance from the bottom.
pub fn offset_from_scroll_area(offset_y: f32, content_height: f32, viewport_height: f32) -> f32 {
    let max_offset = (content_height - viewport_height).max(0.0);
    -(max_offset - offset_y).max(0.0)
}
