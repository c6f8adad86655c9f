//! Vendor stream codecs.
//!
//! Every vendor frames its streaming body differently, but all of them
//! are line-oriented once the bytes are decoded:
//!
//! | Module | Framing | Used by |
//! |--------|---------|---------|
//! | [`sse`] | `data: <json>` lines, `data: [DONE]` terminator | OpenAI, Groq, Mistral |
//! | [`ndjson`] | one bare JSON object per line, `done: true` terminator | Ollama |
//! | [`array`] | a JSON array flushed element by element | Gemini |
//!
//! [`frame_stream`] owns the byte-to-line pump (UTF-8 reassembly across
//! chunk boundaries, CRLF, buffer cap) and hands each complete line to a
//! vendor-specific [`FrameDecoder`], which turns lines into
//! [`StreamEvent`]s using the primitives above.

pub mod array;
pub mod ndjson;
pub mod sse;

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::stream::{ChatStream, StreamEvent};

/// Maximum size for line buffers before the stream is aborted.
pub const MAX_BUF: usize = 16 * 1024 * 1024; // 16 MiB

/// Turns complete lines of a vendor stream into events.
///
/// A decoder must produce exactly one event with `is_final` set, either
/// when it sees the vendor's termination signal or from
/// [`finish`](Self::finish). [`frame_stream`] stops pulling bytes once
/// the final event has been emitted.
pub trait FrameDecoder {
    /// Decodes one line (without its line terminator).
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, LlmError>;

    /// Called once when the body ends.
    fn finish(&mut self) -> Result<Vec<StreamEvent>, LlmError>;
}

/// Splits a byte stream into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
    utf8_buf: Vec<u8>,
}

impl LineBuffer {
    /// Appends a chunk and returns every line it completed.
    ///
    /// A multi-byte character split across chunks is held back until its
    /// remaining bytes arrive. Permanently invalid bytes are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, LlmError> {
        self.utf8_buf.extend_from_slice(bytes);

        if self.utf8_buf.len() > MAX_BUF || self.buffer.len() > MAX_BUF {
            self.utf8_buf.clear();
            self.buffer.clear();
            return Err(LlmError::decode("stream buffer exceeded 16 MiB", ""));
        }

        loop {
            match std::str::from_utf8(&self.utf8_buf) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.utf8_buf.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.utf8_buf[..valid_up_to]));
                    match e.error_len() {
                        // Truncated sequence: wait for the next chunk.
                        None => {
                            self.utf8_buf.drain(..valid_up_to);
                            break;
                        }
                        Some(len) => {
                            self.utf8_buf.drain(..valid_up_to + len);
                        }
                    }
                }
            }
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            lines.push(line);
        }
        Ok(lines)
    }

    /// Takes whatever is left after the body ends without a newline.
    pub fn take_rest(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

struct Pump<S, D> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    decoder: D,
    pending: VecDeque<Result<StreamEvent, LlmError>>,
    done: bool,
}

impl<S, D: FrameDecoder> Pump<S, D> {
    fn decode(&mut self, line: &str) {
        match self.decoder.decode_line(line) {
            Ok(events) => self.enqueue(events),
            Err(e) => self.fail(e),
        }
    }

    fn enqueue(&mut self, events: Vec<StreamEvent>) {
        for event in events {
            let last = event.is_final;
            self.pending.push_back(Ok(event));
            if last {
                self.done = true;
                return;
            }
        }
    }

    fn fail(&mut self, err: LlmError) {
        self.pending.push_back(Err(err));
        self.done = true;
    }

    fn feed(&mut self, bytes: &[u8]) {
        match self.lines.push(bytes) {
            Ok(lines) => {
                for line in lines {
                    if self.done {
                        break;
                    }
                    self.decode(&line);
                }
            }
            Err(e) => self.fail(e),
        }
    }

    fn finish(&mut self) {
        if let Some(rest) = self.lines.take_rest() {
            self.decode(&rest);
        }
        if !self.done {
            match self.decoder.finish() {
                Ok(events) => self.enqueue(events),
                Err(e) => self.fail(e),
            }
        }
        self.done = true;
    }
}

/// Converts a streaming body into a [`ChatStream`] using `decoder`.
///
/// Events are decoded lazily: nothing is read from `body` until the
/// consumer polls for the next event. A transport error, a decode error,
/// or the final event ends the stream.
pub fn frame_stream<S, B, E, D>(body: S, decoder: D) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    D: FrameDecoder + Send + 'static,
{
    let pump = Pump {
        body: Box::pin(body),
        lines: LineBuffer::default(),
        decoder,
        pending: VecDeque::new(),
        done: false,
    };

    let stream = futures::stream::unfold(pump, |mut pump| async move {
        loop {
            if let Some(item) = pump.pending.pop_front() {
                return Some((item, pump));
            }
            if pump.done {
                return None;
            }
            match pump.body.next().await {
                Some(Ok(chunk)) => pump.feed(chunk.as_ref()),
                Some(Err(e)) => pump.fail(LlmError::transport(format!("stream read error: {e}"))),
                None => pump.finish(),
            }
        }
    });

    Box::pin(stream)
}

/// Convenience wrapper for a `reqwest` streaming response.
pub fn response_stream<D>(response: reqwest::Response, decoder: D) -> ChatStream
where
    D: FrameDecoder + Send + 'static,
{
    frame_stream(response.bytes_stream(), decoder)
}
