//! Incremental decoding of a streamed JSON array.
//!
//! Gemini streams `[elem, elem, ...]` where each element is a complete
//! JSON object spread over several lines, and the array punctuation
//! (`[`, `,`, `]`) lands on arbitrary lines around them:
//!
//! ```text
//! [{
//!   "candidates": [...]
//! }
//! ,
//! {
//!   "candidates": [...]
//! }
//! ]
//! ```
//!
//! [`ArrayDecoder`] is a small state machine. In `Accumulating` it
//! appends each line to a buffer, then tries to parse the buffer
//! (`TryParse`). On success it emits the element and resets the buffer.
//! On failure it keeps accumulating, because a failed parse only means
//! the element is not complete yet.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::codec::MAX_BUF;
use crate::error::LlmError;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayState {
    /// Nothing seen yet; a leading `[` is expected.
    Start,
    /// Inside the array, buffering the current element.
    Accumulating,
    /// The closing `]` has been seen.
    Closed,
}

/// Streaming decoder for a JSON array of `T`.
#[derive(Debug)]
pub struct ArrayDecoder<T> {
    state: ArrayState,
    buffer: String,
    _element: PhantomData<fn() -> T>,
}

impl<T> Default for ArrayDecoder<T> {
    fn default() -> Self {
        Self {
            state: ArrayState::Start,
            buffer: String::new(),
            _element: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> ArrayDecoder<T> {
    /// Creates a decoder in the `Start` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> ArrayState {
        self.state
    }

    /// Returns `true` once the closing `]` has been consumed.
    pub fn is_closed(&self) -> bool {
        self.state == ArrayState::Closed
    }

    /// Feeds one line and returns the elements it completed.
    pub fn push_line(&mut self, line: &str) -> Result<Vec<T>, LlmError> {
        let mut rest = line.trim();

        if self.state == ArrayState::Closed {
            return Ok(Vec::new());
        }

        if self.state == ArrayState::Start {
            if rest.is_empty() {
                return Ok(Vec::new());
            }
            rest = rest.strip_prefix('[').unwrap_or(rest).trim_start();
            self.state = ArrayState::Accumulating;
        }

        let mut out = Vec::new();
        if self.buffer.is_empty() {
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
            if rest == "]" {
                self.state = ArrayState::Closed;
                return Ok(out);
            }
            if rest.is_empty() {
                return Ok(out);
            }
        }

        if self.buffer.len() + rest.len() > MAX_BUF {
            self.buffer.clear();
            return Err(LlmError::decode("array element exceeded 16 MiB", ""));
        }
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(rest);

        if let Some(element) = self.try_parse() {
            out.push(element);
        }
        Ok(out)
    }

    /// Checks that the stream ended on an element boundary.
    pub fn finish(&mut self) -> Result<(), LlmError> {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return Ok(());
        }
        let raw = std::mem::take(&mut self.buffer);
        Err(LlmError::decode("stream ended inside an array element", raw))
    }

    /// TryParse: whole buffer, then with a trailing `,` or `]` removed.
    fn try_parse(&mut self) -> Option<T> {
        if let Ok(element) = serde_json::from_str::<T>(&self.buffer) {
            self.buffer.clear();
            return Some(element);
        }

        let trimmed = self.buffer.trim_end();
        for (suffix, closes) in [(',', false), (']', true)] {
            if let Some(body) = trimmed.strip_suffix(suffix) {
                if let Ok(element) = serde_json::from_str::<T>(body) {
                    self.buffer.clear();
                    if closes {
                        self.state = ArrayState::Closed;
                    }
                    return Some(element);
                }
            }
        }
        None
    }
}
