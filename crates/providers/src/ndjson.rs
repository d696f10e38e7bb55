//! Incremental newline-delimited JSON decoder for streamed model responses.
//!
//! Each non-empty line is one JSON object. Lines may carry an SSE-style
//! `data:` prefix, and a bare `[DONE]` line ends the stream.

use serde_json::Value;

/// One decoded line of the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamLine {
    Object(Value),
    /// `[DONE]` sentinel
    Done,
}

/// Buffers bytes until complete lines are available.
///
/// Bytes are kept raw until a newline arrives so multi-byte characters split
/// across network chunks decode correctly.
pub struct NdjsonParser {
    buffer: Vec<u8>,
}

impl NdjsonParser {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed raw bytes from the HTTP response. Returns any complete lines found.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<StreamLine, serde_json::Error>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(decoded) = decode_line(&String::from_utf8_lossy(&line)) {
                lines.push(decoded);
            }
        }
        lines
    }

    /// Decode whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<Result<StreamLine, serde_json::Error>> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&rest))
    }
}

impl Default for NdjsonParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_line(raw: &str) -> Option<Result<StreamLine, serde_json::Error>> {
    let mut line = raw.trim();
    if let Some(rest) = line.strip_prefix("data:") {
        line = rest.trim_start();
    }
    // Comments and SSE fields other than data: carry nothing for us
    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
        return None;
    }
    if line == "[DONE]" {
        return Some(Ok(StreamLine::Done));
    }
    Some(serde_json::from_str(line).map(StreamLine::Object))
}
