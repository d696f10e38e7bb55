//! Hiding model "thinking" output that precedes a reasoning delimiter.

/// Returns the part of `text` after the first `delimiter`, or all of it when
/// the delimiter is absent or disabled.
pub fn strip_reasoning<'a>(text: &'a str, delimiter: Option<&str>) -> &'a str {
    match delimiter {
        Some(d) if !d.is_empty() => match text.find(d) {
            Some(pos) => &text[pos + d.len()..],
            None => text,
        },
        _ => text,
    }
}

/// Accumulates streamed deltas and exposes only the text after the delimiter.
///
/// Nothing is visible until the delimiter has been seen. With no delimiter
/// configured everything is visible immediately.
pub struct ReasoningFilter {
    delimiter: Option<String>,
    accumulated: String,
    visible_from: Option<usize>,
}

impl ReasoningFilter {
    pub fn new(delimiter: Option<&str>) -> Self {
        let delimiter = delimiter.filter(|d| !d.is_empty()).map(str::to_string);
        let visible_from = if delimiter.is_none() { Some(0) } else { None };
        Self {
            delimiter,
            accumulated: String::new(),
            visible_from,
        }
    }

    /// Append a delta. Returns the visible text when there is something to publish.
    pub fn push(&mut self, delta: &str) -> Option<&str> {
        let previous_len = self.accumulated.len();
        self.accumulated.push_str(delta);

        if self.visible_from.is_none() {
            if let Some(d) = &self.delimiter {
                // Only rescan the tail that could contain a delimiter split across deltas
                let mut start = previous_len.saturating_sub(d.len());
                while !self.accumulated.is_char_boundary(start) {
                    start -= 1;
                }
                if let Some(pos) = self.accumulated[start..].find(d.as_str()) {
                    self.visible_from = Some(start + pos + d.len());
                }
            }
        }

        self.visible().filter(|v| !v.is_empty())
    }

    /// Visible text so far, `None` while still inside the reasoning section.
    pub fn visible(&self) -> Option<&str> {
        self.visible_from
            .map(|from| self.accumulated[from..].trim_start())
    }

    pub fn saw_delimiter(&self) -> bool {
        self.delimiter.is_some() && self.visible_from.is_some()
    }

    /// Final answer text. Falls back to the whole accumulation when the
    /// delimiter never showed up.
    pub fn finish(self) -> String {
        match self.visible_from {
            Some(from) => self.accumulated[from..].trim().to_string(),
            None => self.accumulated.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reasoning() {
        assert_eq!(
            strip_reasoning("<think>hmm</think>\nAnswer", Some("</think>")),
            "\nAnswer"
        );
        assert_eq!(strip_reasoning("Answer", Some("</think>")), "Answer");
        assert_eq!(strip_reasoning("a</think>b", None), "a</think>b");
    }

    #[test]
    fn test_nothing_visible_before_delimiter() {
        let mut filter = ReasoningFilter::new(Some("</think>"));
        assert_eq!(filter.push("<think>secret "), None);
        assert_eq!(filter.push("plans"), None);
        assert_eq!(filter.push("</think>\n\nHi"), Some("Hi"));
        assert_eq!(filter.push(" there"), Some("Hi there"));
        assert!(filter.saw_delimiter());
        assert_eq!(filter.finish(), "Hi there");
    }

    #[test]
    fn test_delimiter_split_across_deltas() {
        let mut filter = ReasoningFilter::new(Some("</think>"));
        assert_eq!(filter.push("thinking</thi"), None);
        assert_eq!(filter.push("nk>Done"), Some("Done"));
    }

    #[test]
    fn test_no_delimiter_configured() {
        let mut filter = ReasoningFilter::new(None);
        assert_eq!(filter.push("Hello"), Some("Hello"));
        assert!(!filter.saw_delimiter());
    }

    #[test]
    fn test_delimiter_never_seen_finishes_with_everything() {
        let mut filter = ReasoningFilter::new(Some("</think>"));
        assert_eq!(filter.push(" plain answer "), None);
        assert_eq!(filter.finish(), "plain answer");
    }

    #[test]
    fn test_multibyte_before_delimiter() {
        let mut filter = ReasoningFilter::new(Some("</think>"));
        assert_eq!(filter.push("é"), None);
        assert_eq!(filter.push("</think>ok"), Some("ok"));
    }
}
