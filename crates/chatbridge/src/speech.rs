//! The speech-to-text collaborator.
//!
//! Voice notes reach the bridge as audio bytes. A [`SpeechToText`]
//! implementation turns them into the text of an ordinary user message
//! before the turn starts; the model never sees audio.

use std::future::Future;
use std::pin::Pin;

use crate::error::LlmError;

/// Boxed future returned by [`SpeechToText::transcribe`].
pub type SpeechFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// Transcribes recorded speech.
///
/// Object-safe so sessions can hold `Arc<dyn SpeechToText>`.
pub trait SpeechToText: Send + Sync + std::fmt::Debug {
    /// Returns the spoken text of `audio`, an encoded audio file (Telegram
    /// voice notes are OGG/Opus).
    fn transcribe<'a>(&'a self, audio: &'a [u8]) -> SpeechFuture<'a>;
}
