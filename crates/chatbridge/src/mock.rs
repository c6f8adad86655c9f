//! Test doubles for the provider and chat transport collaborators.
//!
//! [`MockProvider`] is a queue-based fake provider: tests decide exactly
//! which replies, streams and errors it returns, without touching the
//! network. It implements [`Provider`], so it works anywhere a real
//! adapter does, including behind [`DynProvider`](crate::DynProvider).
//!
//! [`MockTransport`] records every send and edit and can be told to fail
//! the next few of them. It also serves files registered with
//! [`MockTransport::add_file`].
//!
//! ```rust,no_run
//! use chatbridge::mock::MockProvider;
//! use chatbridge::{ChatParams, Message, Provider};
//!
//! # async fn example() {
//! let mock = MockProvider::new("mock", "mock-model");
//! mock.queue_reply(Message::assistant("Hello!"));
//!
//! let reply = mock.chat(&ChatParams::default()).await.unwrap();
//! assert_eq!(reply.text(), "Hello!");
//! assert_eq!(mock.recorded_calls().len(), 1);
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::chat::Message;
use crate::delivery::{ChatTransport, SentMessage, TransportError, TransportFuture};
use crate::error::LlmError;
use crate::provider::{ChatParams, Provider};
use crate::speech::{SpeechFuture, SpeechToText};
use crate::stream::{ChatStream, StreamEvent};

type StreamScript = Vec<Result<StreamEvent, LlmError>>;

/// A queue-based mock provider for unit and integration tests.
///
/// Each `chat`, `chat_stream` or `models` call pops from the front of its
/// queue. Every chat call records its [`ChatParams`] for later assertion
/// via [`recorded_calls`](Self::recorded_calls).
///
/// # Panics
///
/// Each method panics if its queue is empty.
pub struct MockProvider {
    name: String,
    model: String,
    replies: Mutex<VecDeque<Result<Message, LlmError>>>,
    streams: Mutex<VecDeque<Result<StreamScript, LlmError>>>,
    models: Mutex<VecDeque<Result<Vec<String>, LlmError>>>,
    calls: Mutex<Vec<ChatParams>>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("queued_replies", &self.replies.lock().unwrap().len())
            .field("queued_streams", &self.streams.lock().unwrap().len())
            .field("recorded_calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

impl MockProvider {
    /// Creates a mock with the given vendor name, default model and empty
    /// queues.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            replies: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            models: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues a reply for the next `chat` call.
    pub fn queue_reply(&self, message: Message) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(message));
        self
    }

    /// Enqueues an error for the next `chat` call.
    pub fn queue_error(&self, error: LlmError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Enqueues events for the next `chat_stream` call.
    pub fn queue_stream(&self, events: Vec<StreamEvent>) -> &Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(Ok(events.into_iter().map(Ok).collect()));
        self
    }

    /// Enqueues a stream that yields `events` and then fails with `error`.
    pub fn queue_broken_stream(&self, events: Vec<StreamEvent>, error: LlmError) -> &Self {
        let mut script: StreamScript = events.into_iter().map(Ok).collect();
        script.push(Err(error));
        self.streams.lock().unwrap().push_back(Ok(script));
        self
    }

    /// Enqueues an error returned by `chat_stream` itself, before any
    /// event (a refused request).
    pub fn queue_stream_error(&self, error: LlmError) -> &Self {
        self.streams.lock().unwrap().push_back(Err(error));
        self
    }

    /// Enqueues a catalog for the next `models` call.
    pub fn queue_models(&self, models: Result<Vec<String>, LlmError>) -> &Self {
        self.models.lock().unwrap().push_back(models);
        self
    }

    /// All params passed to `chat` or `chat_stream`, in call order.
    pub fn recorded_calls(&self) -> Vec<ChatParams> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, params: &ChatParams) {
        self.calls.lock().unwrap().push(params.clone());
    }
}

impl Provider for MockProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn configured_model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, params: &ChatParams) -> Result<Message, LlmError> {
        self.record_call(params);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no queued replies remaining")
    }

    async fn chat_stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        self.record_call(params);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no queued streams remaining")?;
        Ok(Box::pin(futures::stream::iter(script)))
    }

    async fn models(&self) -> Result<Vec<String>, LlmError> {
        self.models
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no queued model lists remaining")
    }
}

/// A queue-based transcriber.
///
/// # Panics
///
/// `transcribe` panics if no transcript is queued.
#[derive(Debug, Default)]
pub struct MockSpeech {
    transcripts: Mutex<VecDeque<Result<String, LlmError>>>,
    heard: Mutex<Vec<Vec<u8>>>,
}

impl MockSpeech {
    /// A transcriber with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the result of the next `transcribe` call.
    pub fn queue_transcript(&self, transcript: Result<String, LlmError>) -> &Self {
        self.transcripts.lock().unwrap().push_back(transcript);
        self
    }

    /// Audio passed to `transcribe`, in call order.
    pub fn heard(&self) -> Vec<Vec<u8>> {
        self.heard.lock().unwrap().clone()
    }
}

impl SpeechToText for MockSpeech {
    fn transcribe<'a>(&'a self, audio: &'a [u8]) -> SpeechFuture<'a> {
        self.heard.lock().unwrap().push(audio.to_vec());
        let result = self
            .transcripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockSpeech: no queued transcripts remaining");
        Box::pin(std::future::ready(result))
    }
}

/// One call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `send_message`.
    Send {
        /// Target chat.
        chat_id: i64,
        /// Message replied to.
        reply_to: Option<i64>,
        /// Message text.
        text: String,
        /// Whether markdown was requested.
        markdown: bool,
    },
    /// `edit_message`.
    Edit {
        /// Target chat.
        chat_id: i64,
        /// Edited message.
        message_id: i64,
        /// New text.
        text: String,
        /// Whether markdown was requested.
        markdown: bool,
    },
    /// `send_typing`.
    Typing {
        /// Target chat.
        chat_id: i64,
    },
    /// `fetch_file`.
    Fetch {
        /// Requested file.
        file_id: String,
    },
}

/// A recording chat transport.
///
/// Successful sends get ids counting up from 100. Failed calls are
/// recorded too.
#[derive(Debug)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_id: AtomicI64,
    failing_sends: AtomicUsize,
    failing_edits: AtomicUsize,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A transport that accepts everything.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            failing_sends: AtomicUsize::new(0),
            failing_edits: AtomicUsize::new(0),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Makes `fetch_file(file_id)` return `bytes`. Unknown ids are
    /// rejected.
    pub fn add_file(&self, file_id: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(file_id.into(), bytes.into());
    }

    /// Rejects the next `n` sends.
    pub fn fail_next_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    /// Rejects the next `n` edits.
    pub fn fail_next_edits(&self, n: usize) {
        self.failing_edits.store(n, Ordering::SeqCst);
    }

    /// Everything observed so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of all sends, failed ones included.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Clears the recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn rejected(action: &'static str) -> TransportError {
        TransportError::Rejected {
            action,
            code: 400,
            description: "Bad Request: can't parse entities".into(),
        }
    }
}

impl ChatTransport for MockTransport {
    fn send_message<'a>(
        &'a self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, SentMessage> {
        self.calls.lock().unwrap().push(TransportCall::Send {
            chat_id,
            reply_to,
            text: text.to_string(),
            markdown,
        });
        let result = if Self::take_failure(&self.failing_sends) {
            Err(Self::rejected("send"))
        } else {
            Ok(SentMessage {
                message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            })
        };
        Box::pin(std::future::ready(result))
    }

    fn edit_message<'a>(
        &'a self,
        chat_id: i64,
        message_id: i64,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, ()> {
        self.calls.lock().unwrap().push(TransportCall::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            markdown,
        });
        let result = if Self::take_failure(&self.failing_edits) {
            Err(Self::rejected("edit"))
        } else {
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }

    fn send_typing(&self, chat_id: i64) -> TransportFuture<'_, ()> {
        self.calls.lock().unwrap().push(TransportCall::Typing { chat_id });
        Box::pin(std::future::ready(Ok(())))
    }

    fn fetch_file<'a>(&'a self, file_id: &'a str) -> TransportFuture<'a, Vec<u8>> {
        self.calls.lock().unwrap().push(TransportCall::Fetch {
            file_id: file_id.to_string(),
        });
        let result = self
            .files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| TransportError::Rejected {
                action: "fetch",
                code: 400,
                description: "Bad Request: invalid file_id".into(),
            });
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DynProvider;
    use futures::StreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_chat_returns_queued_in_order() {
        let mock = MockProvider::new("mock", "m");
        mock.queue_reply(Message::assistant("one"))
            .queue_error(LlmError::transport("down"));

        let first = Provider::chat(&mock, &ChatParams::default()).await.unwrap();
        assert_eq!(first.text(), "one");
        let second = Provider::chat(&mock, &ChatParams::default()).await;
        assert!(matches!(second, Err(LlmError::Upstream { status: None, .. })));
        assert_eq!(mock.recorded_calls().len(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "no queued replies")]
    async fn test_mock_chat_empty_queue_panics() {
        let mock = MockProvider::new("mock", "m");
        let _ = Provider::chat(&mock, &ChatParams::default()).await;
    }

    #[tokio::test]
    async fn test_mock_broken_stream_yields_then_fails() {
        let mock = MockProvider::new("mock", "m");
        mock.queue_broken_stream(vec![StreamEvent::text("a")], LlmError::decode("bad", "x"));

        let stream = Provider::chat_stream(&mock, &ChatParams::default()).await.unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(LlmError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_mock_stream_error_before_events() {
        let mock = MockProvider::new("mock", "m");
        mock.queue_stream_error(LlmError::ContentPolicy {
            reason: "SAFETY".into(),
        });
        let result = Provider::chat_stream(&mock, &ChatParams::default()).await;
        assert!(matches!(result, Err(LlmError::ContentPolicy { .. })));
    }

    #[tokio::test]
    async fn test_dyn_provider_blanket_impl() {
        let mock = Arc::new(MockProvider::new("mock", "default-model"));
        mock.queue_models(Ok(vec!["a".into(), "b".into()]));
        let provider: Arc<dyn DynProvider> = mock.clone();

        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.default_model(""), "default-model");
        assert_eq!(provider.default_model("x"), "x");
        assert_eq!(provider.models_boxed().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_transport_records_and_fails_on_demand() {
        let transport = MockTransport::new();
        transport.fail_next_sends(1);

        assert!(transport.send_message(1, None, "x", true).await.is_err());
        let sent = transport.send_message(1, Some(4), "y", false).await.unwrap();
        assert_eq!(sent.message_id, 100);
        transport.edit_message(1, 100, "z", true).await.unwrap();

        assert_eq!(transport.sent_texts(), vec!["x", "y"]);
        assert_eq!(transport.calls().len(), 3);
        transport.clear();
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_transport_serves_registered_files() {
        let transport = MockTransport::new();
        transport.add_file("photo-1", b"jpeg".to_vec());

        assert_eq!(transport.fetch_file("photo-1").await.unwrap(), b"jpeg");
        assert!(matches!(
            transport.fetch_file("missing").await,
            Err(TransportError::Rejected { action: "fetch", .. })
        ));
        assert_eq!(transport.calls().len(), 2);
    }
}
