//! Server-sent-event line classification.
//!
//! OpenAI-compatible vendors stream `data: <json>` lines separated by
//! blank lines and end with the literal line `data: [DONE]`. Only `data`
//! fields matter here; `event:`, `id:`, `retry:` and comment lines are
//! skipped.

/// What one SSE line means to a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// A `data:` payload (without the prefix).
    Data(&'a str),
    /// The `data: [DONE]` terminator.
    Done,
    /// Anything else.
    Skip,
}

impl<'a> SseLine<'a> {
    /// Classifies a single line.
    pub fn parse(line: &'a str) -> Self {
        let Some(payload) = line.strip_prefix("data:") else {
            return Self::Skip;
        };
        let payload = payload.trim();
        match payload {
            "" => Self::Skip,
            "[DONE]" => Self::Done,
            data => Self::Data(data),
        }
    }
}
