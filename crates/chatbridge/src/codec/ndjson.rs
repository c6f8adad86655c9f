//! Newline-delimited JSON.
//!
//! Each non-blank line is one complete JSON object with no prefix. Unlike
//! the array framing, a line that fails to parse can never be completed
//! by later data, so it is a [`LlmError::Decode`].

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Parses one NDJSON line. Blank lines yield `None`.
pub fn parse_line<T: DeserializeOwned>(line: &str) -> Result<Option<T>, LlmError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| LlmError::decode(format!("invalid NDJSON line: {e}"), line))
}
