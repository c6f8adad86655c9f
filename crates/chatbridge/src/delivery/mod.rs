//! Rendering a turn's output onto a chat transport.
//!
//! Two paths lead to the user:
//!
//! - **Streaming**: a [`StreamRenderer`] is handed to the tool loop as its
//!   [`PartialSink`](crate::stream::PartialSink). It posts a placeholder,
//!   edits it as text arrives, rolls over to a new message before the
//!   transport limit, and finishes with a watermarked edit.
//! - **Complete**: [`Delivery::send_complete`] sends a finished answer,
//!   split into transport-sized chunks.
//!
//! Transport failures are logged with `warn!` and swallowed. The user may
//! see less, but the turn itself never fails because of delivery.

mod format;
mod render;
mod transport;

pub use format::{char_len, format_error_message, split_chunks, watermark};
pub use render::{RenderState, StreamRenderer};
pub use transport::{ChatTransport, SentMessage, TransportError, TransportFuture};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LlmError;

/// Tunables for the delivery adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Hard message-size limit of the transport, in characters.
    pub max_len: usize,
    /// Characters accumulated since the last edit that trigger a new edit.
    pub edit_threshold: usize,
    /// A segment this close to `max_len` rolls over to a new message.
    pub limit_margin: usize,
    /// Placeholder shown while text streams in.
    pub typing_label: String,
    /// Placeholder shown while a tool runs.
    pub tool_label: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_len: 4096,
            edit_threshold: 500,
            limit_margin: 100,
            typing_label: "Typing…".into(),
            tool_label: "Using tool…".into(),
        }
    }
}

impl DeliveryConfig {
    /// Largest segment a single streamed message grows to.
    pub fn segment_limit(&self) -> usize {
        self.max_len.saturating_sub(self.limit_margin).max(1)
    }
}

/// Delivery of one turn's output into one chat.
#[derive(Clone, Copy)]
pub struct Delivery<'t> {
    transport: &'t dyn ChatTransport,
    config: &'t DeliveryConfig,
    chat_id: i64,
    reply_to: Option<i64>,
}

impl std::fmt::Debug for Delivery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("chat_id", &self.chat_id)
            .field("reply_to", &self.reply_to)
            .finish_non_exhaustive()
    }
}

impl<'t> Delivery<'t> {
    /// Targets `chat_id` through `transport`.
    pub fn new(transport: &'t dyn ChatTransport, config: &'t DeliveryConfig, chat_id: i64) -> Self {
        Self {
            transport,
            config,
            chat_id,
            reply_to: None,
        }
    }

    /// Makes the first message of the answer a reply to `message_id`.
    #[must_use]
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = (message_id != 0).then_some(message_id);
        self
    }

    /// A streaming renderer for an answer from `model`.
    pub fn renderer(&self, model: impl Into<String>) -> StreamRenderer<'t> {
        StreamRenderer::new(*self, model.into())
    }

    /// Sends a finished answer.
    ///
    /// Text over the limit is split into chunks; the first replies to the
    /// user's message. Only the last chunk carries the watermark, and only
    /// if it still fits.
    pub async fn send_complete(&self, text: &str, model: &str) {
        let mut chunks = split_chunks(text, self.config.max_len);
        let Some(last) = chunks.pop() else {
            self.send(self.reply_to, &watermark("", model)).await;
            return;
        };

        let mut reply_to = self.reply_to;
        for chunk in &chunks {
            self.send(reply_to, chunk).await;
            reply_to = None;
        }

        let marked = watermark(&last, model);
        if char_len(&marked) <= self.config.max_len {
            self.send(reply_to, &marked).await;
        } else {
            self.send(reply_to, &last).await;
        }
    }

    /// Tells the user their turn failed.
    ///
    /// This is the single error notification for a turn. JSON error bodies
    /// are pretty-printed, and the text goes out without markdown so vendor
    /// payloads cannot break it.
    pub async fn send_error(&self, err: &LlmError) {
        let text = match err {
            LlmError::ContentPolicy { reason } => {
                format!("Sorry, the model declined to answer this ({reason}).")
            }
            other => format_error_message(&other.to_string()),
        };
        for (i, chunk) in split_chunks(&text, self.config.max_len).iter().enumerate() {
            let reply_to = if i == 0 { self.reply_to } else { None };
            self.post(reply_to, chunk, false).await;
        }
    }

    /// Sends a reply that is not a model answer (command output and the
    /// like): chunked, markdown with a plain-text retry, no watermark.
    pub async fn send_reply(&self, text: &str) {
        for (i, chunk) in split_chunks(text, self.config.max_len).iter().enumerate() {
            let reply_to = if i == 0 { self.reply_to } else { None };
            self.send(reply_to, chunk).await;
        }
    }

    /// Sends with markdown, retrying once as plain text if rejected.
    async fn send(&self, reply_to: Option<i64>, text: &str) -> Option<i64> {
        match self.post(reply_to, text, true).await {
            Some(id) => Some(id),
            None => self.post(reply_to, text, false).await,
        }
    }

    pub(crate) async fn post(&self, reply_to: Option<i64>, text: &str, markdown: bool) -> Option<i64> {
        if let Err(e) = self.transport.send_typing(self.chat_id).await {
            warn!(chat_id = self.chat_id, error = %e, "typing indicator failed");
        }
        match self.transport.send_message(self.chat_id, reply_to, text, markdown).await {
            Ok(sent) => Some(sent.message_id),
            Err(e) => {
                warn!(chat_id = self.chat_id, markdown, error = %e, "send failed");
                None
            }
        }
    }

    pub(crate) async fn edit(&self, message_id: i64, text: &str, markdown: bool) -> bool {
        match self.transport.edit_message(self.chat_id, message_id, text, markdown).await {
            Ok(()) => true,
            Err(e) => {
                warn!(chat_id = self.chat_id, message_id, markdown, error = %e, "edit failed");
                false
            }
        }
    }

    pub(crate) fn config(&self) -> &'t DeliveryConfig {
        self.config
    }

    pub(crate) fn reply_target(&self) -> Option<i64> {
        self.reply_to
    }
}
