//! NDJSON stream decoding for the Ollama Chat API.
//!
//! Each line is a complete chunk; text arrives in `message.content`, and
//! tool calls arrive complete (Ollama never splits them). The chunk with
//! `done: true` ends the stream.

use chatbridge::codec::{FrameDecoder, ndjson, response_stream};
use chatbridge::error::LlmError;
use chatbridge::stream::{ChatStream, StreamEvent};

use crate::convert::convert_tool_calls;
use crate::types::Response;

/// Convert a reqwest response into a [`ChatStream`].
pub(crate) fn into_stream(response: reqwest::Response) -> ChatStream {
    response_stream(response, OllamaDecoder::default())
}

#[derive(Debug, Default)]
pub(crate) struct OllamaDecoder {
    /// Tool calls seen so far, for `call_{name}_{index}` ids.
    calls_seen: usize,
    done: bool,
}

impl FrameDecoder for OllamaDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, LlmError> {
        let Some(chunk) = ndjson::parse_line::<Response>(line)? else {
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        if let Some(message) = chunk.message {
            if let Some(text) = message.content.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::text(text));
            }
            if let Some(calls) = message.tool_calls.filter(|c| !c.is_empty()) {
                let calls = convert_tool_calls(&calls, self.calls_seen);
                self.calls_seen += calls.len();
                events.push(StreamEvent::tool_calls(calls));
            }
        }

        if chunk.done {
            self.done = true;
            match events.pop() {
                Some(last) => events.push(last.into_final()),
                None => events.push(StreamEvent::done()),
            }
        }
        Ok(events)
    }

    fn finish(&mut self) -> Result<Vec<StreamEvent>, LlmError> {
        if self.done {
            return Ok(Vec::new());
        }
        // Body closed without a `done` chunk; what arrived is the answer.
        self.done = true;
        Ok(vec![StreamEvent::done()])
    }
}
