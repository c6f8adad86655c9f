//! SSE stream decoding for the Chat Completions API.
//!
//! Text deltas are surfaced as they arrive. Tool calls are streamed as
//! fragments keyed by `index` (the first fragment carries the id and
//! name, later ones append to the argument string); they are held back
//! and surfaced together once `finish_reason` or `[DONE]` arrives.

use std::collections::BTreeMap;

use chatbridge::chat::ToolCall;
use chatbridge::codec::sse::SseLine;
use chatbridge::codec::{FrameDecoder, response_stream};
use chatbridge::error::LlmError;
use chatbridge::stream::{ChatStream, StreamEvent};

use crate::convert::parse_arguments;
use crate::types::{StreamChunk, ToolCallDelta};

/// Convert a reqwest SSE response into a [`ChatStream`].
pub(crate) fn into_stream(response: reqwest::Response) -> ChatStream {
    response_stream(response, SseDecoder::default())
}

#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    pending: BTreeMap<u32, PendingCall>,
    done: bool,
}

impl SseDecoder {
    fn accumulate(&mut self, delta: &ToolCallDelta) {
        let mut index = delta.index.unwrap_or(0);
        // Some vendors send every call complete at index 0; a new id there
        // starts a new call rather than overwriting the previous one.
        if let Some(id) = &delta.id {
            if self.pending.get(&index).is_some_and(|p| &p.id != id) {
                index = self.pending.keys().next_back().map_or(0, |k| k + 1);
            }
        }

        let entry = self.pending.entry(index).or_default();
        if let Some(id) = &delta.id {
            entry.id.clone_from(id);
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                entry.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                entry.arguments.push_str(arguments);
            }
        }
    }

    fn flush(&mut self) -> Option<StreamEvent> {
        if self.pending.is_empty() {
            return None;
        }
        let calls = std::mem::take(&mut self.pending)
            .into_values()
            .map(|p| ToolCall::new(p.id, p.name, parse_arguments(&p.arguments)))
            .collect();
        Some(StreamEvent::tool_calls(calls))
    }

    /// Ends the stream: pending tool calls become the final event.
    fn close(&mut self, events: &mut Vec<StreamEvent>) {
        self.done = true;
        if let Some(calls) = self.flush() {
            events.push(calls);
        }
        match events.pop() {
            Some(last) => events.push(last.into_final()),
            None => events.push(StreamEvent::done()),
        }
    }
}

impl FrameDecoder for SseDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, LlmError> {
        let data = match SseLine::parse(line) {
            SseLine::Skip => return Ok(Vec::new()),
            SseLine::Done if self.done => return Ok(Vec::new()),
            SseLine::Done => {
                let mut events = Vec::new();
                self.close(&mut events);
                return Ok(events);
            }
            SseLine::Data(data) => data,
        };

        let chunk: StreamChunk = serde_json::from_str(data)
            .map_err(|e| LlmError::decode(format!("invalid SSE payload: {e}"), data))?;

        let mut events = Vec::new();
        if self.done {
            return Ok(events);
        }
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(events);
        };

        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            events.push(StreamEvent::text(text));
        }
        for delta in choice.delta.tool_calls.iter().flatten() {
            self.accumulate(delta);
        }
        if choice.finish_reason.is_some() {
            self.close(&mut events);
        }
        Ok(events)
    }

    fn finish(&mut self) -> Result<Vec<StreamEvent>, LlmError> {
        let mut events = Vec::new();
        if !self.done {
            self.close(&mut events);
        }
        Ok(events)
    }
}
