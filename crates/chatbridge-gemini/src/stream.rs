//! Stream decoding for `:streamGenerateContent`.
//!
//! The body is one JSON array whose elements are full `Response`
//! objects; [`ArrayDecoder`] reassembles them line by line. The element
//! carrying a `finishReason` (or the closing `]`) ends the stream.

use chatbridge::codec::array::ArrayDecoder;
use chatbridge::codec::{FrameDecoder, frame_stream};
use chatbridge::error::LlmError;
use chatbridge::stream::{ChatStream, StreamEvent};
use futures::StreamExt;

use crate::convert::{convert_tool_calls, first_candidate, parts_text};
use crate::types::Response;

/// Convert a reqwest response into a [`ChatStream`].
pub(crate) fn into_stream(response: reqwest::Response) -> ChatStream {
    // The request URL carries the API key; keep it out of read errors.
    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(reqwest::Error::without_url));
    frame_stream(body, GeminiDecoder::default())
}

#[derive(Debug, Default)]
pub(crate) struct GeminiDecoder {
    array: ArrayDecoder<Response>,
    /// Function calls seen so far, for `call_{name}_{index}` ids.
    calls_seen: usize,
    done: bool,
}

impl GeminiDecoder {
    fn decode_element(&mut self, element: Response, events: &mut Vec<StreamEvent>) -> Result<(), LlmError> {
        let Some(candidate) = first_candidate(element)? else {
            return Ok(());
        };
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        let text = parts_text(&parts);
        if !text.is_empty() {
            events.push(StreamEvent::text(text));
        }
        let calls = convert_tool_calls(&parts, self.calls_seen);
        if !calls.is_empty() {
            self.calls_seen += calls.len();
            events.push(StreamEvent::tool_calls(calls));
        }

        if candidate.finish_reason.is_some() {
            self.close(events);
        }
        Ok(())
    }

    fn close(&mut self, events: &mut Vec<StreamEvent>) {
        self.done = true;
        match events.pop() {
            Some(last) => events.push(last.into_final()),
            None => events.push(StreamEvent::done()),
        }
    }
}

impl FrameDecoder for GeminiDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, LlmError> {
        let mut events = Vec::new();
        if self.done {
            return Ok(events);
        }
        for element in self.array.push_line(line)? {
            self.decode_element(element, &mut events)?;
            if self.done {
                return Ok(events);
            }
        }
        if self.array.is_closed() {
            self.close(&mut events);
        }
        Ok(events)
    }

    fn finish(&mut self) -> Result<Vec<StreamEvent>, LlmError> {
        self.array.finish()?;
        let mut events = Vec::new();
        if !self.done {
            self.close(&mut events);
        }
        Ok(events)
    }
}
