//! The chat transport collaborator.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ChatTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// A message the transport accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    /// Transport-assigned id, used for later edits.
    pub message_id: i64,
}

/// Failure reported by a [`ChatTransport`].
///
/// The delivery adapter logs these and carries on; they never end a turn.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The chat service answered but refused the request (bad markdown,
    /// message too long, unknown chat...).
    #[error("failed to {action} message, {code} {description}")]
    Rejected {
        /// `"send"`, `"edit"` or `"fetch"`.
        action: &'static str,
        /// Service error code.
        code: i64,
        /// Service error description.
        description: String,
    },

    /// The request never got an answer.
    #[error("transport failure: {0}")]
    Network(String),

    /// The transport has no way to perform the operation.
    #[error("transport cannot {0}")]
    Unsupported(&'static str),
}

/// Outbound side of a chat service (Telegram, a test double...).
///
/// Object-safe so sessions can hold `Arc<dyn ChatTransport>`.
pub trait ChatTransport: Send + Sync {
    /// Sends a new message, optionally as a reply, and returns its id.
    fn send_message<'a>(
        &'a self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, SentMessage>;

    /// Replaces the text of a message sent earlier.
    fn edit_message<'a>(
        &'a self,
        chat_id: i64,
        message_id: i64,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, ()>;

    /// Shows a "typing" hint in the chat. Transports without one keep
    /// the default no-op.
    fn send_typing(&self, _chat_id: i64) -> TransportFuture<'_, ()> {
        Box::pin(std::future::ready(Ok(())))
    }

    /// Downloads a file users attached to a message (photo, voice note,
    /// document), identified by the service's file id.
    fn fetch_file<'a>(&'a self, _file_id: &'a str) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(std::future::ready(Err(TransportError::Unsupported("fetch files"))))
    }
}
