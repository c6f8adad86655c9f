//! Streaming response types.
//!
//! When a provider streams its response, it yields a sequence of
//! [`StreamEvent`]s through a [`ChatStream`]. Each event carries a
//! partial [`Message`]: either a text increment or a batch of completed
//! tool calls. Exactly one event per stream has `is_final` set.
//!
//! # Consuming a stream
//!
//! Streams are pulled, one event at a time, by whoever drives the turn.
//! A [`PartialSink`] sees every event before the next one is decoded, so
//! a slow sink (a chat transport busy editing a message) throttles the
//! network read. That is the only backpressure in the system.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use chatbridge::{ChatStream, StreamEvent};
//!
//! async fn print_stream(mut stream: ChatStream) {
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             Ok(event) if event.partial.has_tool_calls() => println!("[tool call]"),
//!             Ok(event) => print!("{}", event.partial.text()),
//!             Err(e) => eprintln!("stream error: {e}"),
//!         }
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use futures::Stream;

use crate::chat::{Message, ToolCall};
use crate::error::LlmError;

/// A pinned, boxed, `Send` stream of [`StreamEvent`] results.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// One decoded increment of a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// The increment: assistant text, or an assistant tool-call carrier.
    pub partial: Message,
    /// Set on the last event of the stream.
    pub is_final: bool,
}

impl StreamEvent {
    /// A text increment.
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            partial: Message::assistant(delta),
            is_final: false,
        }
    }

    /// A batch of completed tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            partial: Message::from_tool_calls(calls),
            is_final: false,
        }
    }

    /// The end-of-stream marker, with no content of its own.
    pub fn done() -> Self {
        Self {
            partial: Message::assistant(""),
            is_final: true,
        }
    }

    /// Marks this event as the last one.
    #[must_use]
    pub fn into_final(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// Receives every partial message of a streaming turn, in arrival order.
///
/// Returning an error stops the stream immediately; the error is what
/// the turn fails with. Closures work directly:
///
/// ```rust
/// use chatbridge::{LlmError, StreamEvent};
/// use chatbridge::stream::PartialSink;
///
/// let mut text = String::new();
/// let mut sink = |event: &StreamEvent| -> Result<(), LlmError> {
///     text.push_str(&event.partial.text());
///     Ok(())
/// };
/// # fn takes(_: &mut dyn PartialSink) {}
/// takes(&mut sink);
/// ```
pub trait PartialSink: Send {
    /// Handles one partial message.
    fn on_partial<'a>(
        &'a mut self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), LlmError>> + Send + 'a>>;
}

impl<F> PartialSink for F
where
    F: FnMut(&StreamEvent) -> Result<(), LlmError> + Send,
{
    fn on_partial<'a>(
        &'a mut self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), LlmError>> + Send + 'a>> {
        let result = self(event);
        Box::pin(std::future::ready(result))
    }
}
