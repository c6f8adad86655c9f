//! One conversational turn, end to end.
//!
//! The [`Engine`] is built once from an explicit provider map and tool
//! registry and shared by every turn; it holds no per-turn state, so
//! turns for different users run concurrently without locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{Span, info, instrument};

use crate::chat::{Message, Role};
use crate::config::BridgeConfig;
use crate::context::ContextWindow;
use crate::error::LlmError;
use crate::factory::{ProviderFactory, build_providers};
use crate::provider::DynProvider;
use crate::stream::{PartialSink, StreamEvent};
use crate::tool::{ToolLoopConfig, ToolRegistry, tool_loop, tool_loop_stream};

/// Input of [`Engine::run_turn`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    /// Stored history, system message first.
    pub history: Vec<Message>,
    /// The new user message.
    pub message: Message,
    /// Requested model; empty for the provider's default.
    pub model: String,
    /// Name of the provider to use.
    pub provider: String,
    /// Stream partials to the sink instead of waiting for the full answer.
    pub streaming: bool,
}

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text of the final assistant message.
    pub text: String,
    /// History to persist: the request's history minus its system
    /// message, then the user message and everything the turn added.
    pub history: Vec<Message>,
    /// The model that answered.
    pub model: String,
    /// Tool rounds the turn needed.
    pub rounds: u32,
}

/// Runs turns against a fixed set of providers and tools.
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use chatbridge::engine::{Engine, TurnRequest};
/// use chatbridge::{DynProvider, Message, ToolRegistry};
///
/// # async fn example(ollama: Arc<dyn DynProvider>) -> Result<(), chatbridge::LlmError> {
/// let engine = Engine::new(HashMap::from([("ollama".to_string(), ollama)]), ToolRegistry::new());
///
/// let request = TurnRequest {
///     history: vec![Message::system("Be brief.")],
///     message: Message::user("Hello"),
///     model: String::new(),
///     provider: "ollama".into(),
///     streaming: false,
/// };
/// let mut ignore = |_: &chatbridge::StreamEvent| -> Result<(), chatbridge::LlmError> { Ok(()) };
/// let outcome = engine.run_turn(&request, &mut ignore).await?;
/// println!("{}", outcome.text);
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    providers: HashMap<String, Arc<dyn DynProvider>>,
    tools: ToolRegistry,
    window: ContextWindow,
    loop_config: ToolLoopConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("providers", &self.provider_names())
            .field("tools", &self.tools)
            .field("window", &self.window)
            .field("loop_config", &self.loop_config)
            .finish()
    }
}

impl Engine {
    /// Creates an engine over the given providers (keyed by name) and tools.
    pub fn new(providers: HashMap<String, Arc<dyn DynProvider>>, tools: ToolRegistry) -> Self {
        Self {
            providers,
            tools,
            window: ContextWindow::default(),
            loop_config: ToolLoopConfig::default(),
        }
    }

    /// Builds the providers `config` asks for and applies its
    /// `bridge.context_window` and `bridge.max_tool_rounds`.
    ///
    /// # Errors
    ///
    /// As [`build_providers`].
    pub fn from_config(
        config: &BridgeConfig,
        factories: &[Box<dyn ProviderFactory>],
        tools: ToolRegistry,
    ) -> Result<Self, LlmError> {
        let providers = build_providers(config, factories)?;
        Ok(Self::new(providers, tools)
            .with_window(ContextWindow::new(config.bridge.context_window))
            .with_loop_config(ToolLoopConfig {
                max_rounds: config.bridge.max_tool_rounds,
            }))
    }

    /// Replaces the context window.
    #[must_use]
    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self
    }

    /// Replaces the tool loop configuration.
    #[must_use]
    pub fn with_loop_config(mut self, config: ToolLoopConfig) -> Self {
        self.loop_config = config;
        self
    }

    /// The provider registered under `name`.
    pub fn provider(&self, name: &str) -> Result<&Arc<dyn DynProvider>, LlmError> {
        self.providers
            .get(name)
            .ok_or_else(|| LlmError::UnknownProvider(name.to_string()))
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one turn.
    ///
    /// With `request.streaming` set, every partial goes to `sink` as it is
    /// decoded; otherwise `sink` is not called.
    ///
    /// # Errors
    ///
    /// Provider, decode and loop-guard errors, plus
    /// [`LlmError::UnknownProvider`]. On error no history is produced, so
    /// the caller's stored history stays as it was.
    #[instrument(
        skip_all,
        fields(provider = %request.provider, model = tracing::field::Empty, streaming = request.streaming)
    )]
    pub async fn run_turn(
        &self,
        request: &TurnRequest,
        sink: &mut dyn PartialSink,
    ) -> Result<TurnOutcome, LlmError> {
        let provider = self.provider(&request.provider)?;
        let model = provider.default_model(&request.model);
        Span::current().record("model", model.as_str());

        let mut full = Vec::with_capacity(request.history.len() + 1);
        full.extend_from_slice(&request.history);
        full.push(request.message.clone());

        let mut working = self.window.apply(&full);
        let sent = working.len();

        let outcome = if request.streaming {
            tool_loop_stream(
                provider.as_ref(),
                &self.tools,
                &model,
                &mut working,
                self.loop_config,
                sink,
            )
            .await?
        } else {
            tool_loop(provider.as_ref(), &self.tools, &model, &mut working, self.loop_config).await?
        };

        // Everything the model said this turn, including text streamed ahead
        // of a tool round.
        let text: String = working[sent..]
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(Message::text)
            .collect();

        let skip = usize::from(full.first().is_some_and(|m| m.role == Role::System));
        let mut history = full.split_off(skip);
        history.extend(working.drain(sent..));

        info!(rounds = outcome.rounds, "turn complete");
        Ok(TurnOutcome {
            text,
            history,
            model,
            rounds: outcome.rounds,
        })
    }

    /// Runs a non-streaming turn.
    pub async fn run_turn_complete(&self, request: &TurnRequest) -> Result<TurnOutcome, LlmError> {
        let mut ignore = |_: &StreamEvent| -> Result<(), LlmError> { Ok(()) };
        self.run_turn(request, &mut ignore).await
    }

    /// The model catalog of `provider`.
    #[instrument(skip(self))]
    pub async fn list_models(&self, provider: &str) -> Result<Vec<String>, LlmError> {
        self.provider(provider)?.models_boxed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ToolCall;
    use crate::factory::ProviderSettings;
    use crate::mock::MockProvider;
    use crate::test_helpers::{provider_map, static_tool, tool_call_msg};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine_with(mock: Arc<MockProvider>) -> Engine {
        let mut tools = ToolRegistry::new();
        tools.register(static_tool("get_weather", "18C, clear"));
        Engine::new(provider_map(mock), tools)
    }

    fn request(history: Vec<Message>, text: &str) -> TurnRequest {
        TurnRequest {
            history,
            message: Message::user(text),
            model: String::new(),
            provider: "mock".into(),
            streaming: false,
        }
    }

    #[tokio::test]
    async fn test_run_turn_paris_weather() {
        let mock = Arc::new(MockProvider::new("mock", "mock-default"));
        mock.queue_reply(tool_call_msg("call_1", "get_weather", json!({"location": "Paris"})))
            .queue_reply(Message::assistant("18C and clear."));
        let engine = engine_with(mock.clone());

        let req = request(vec![Message::system("sys")], "hi");
        let outcome = engine.run_turn_complete(&req).await.unwrap();

        assert_eq!(outcome.text, "18C and clear.");
        assert_eq!(outcome.model, "mock-default");
        assert_eq!(outcome.rounds, 1);
        // user message, tool carrier, tool answer, final reply
        assert_eq!(outcome.history.len(), 4);
        assert_eq!(outcome.history[0], Message::user("hi"));
        assert_eq!(outcome.history[2].text(), "18C, clear");
        assert_eq!(mock.recorded_calls()[0].model, "mock-default");
    }

    #[tokio::test]
    async fn test_run_turn_upstream_error_leaves_history_alone() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_error(LlmError::Upstream {
            status: Some(http::StatusCode::TOO_MANY_REQUESTS),
            body: r#"{"error":"rate limited"}"#.into(),
        });
        let engine = engine_with(mock);

        let history = vec![Message::system("sys"), Message::user("a"), Message::assistant("b")];
        let req = request(history.clone(), "hi");
        let err = engine.run_turn_complete(&req).await.unwrap_err();

        assert_eq!(err.status(), Some(http::StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(req.history, history);
    }

    #[tokio::test]
    async fn test_run_turn_unknown_provider() {
        let engine = engine_with(Arc::new(MockProvider::new("mock", "m")));
        let mut req = request(vec![], "hi");
        req.provider = "nope".into();
        let err = engine.run_turn_complete(&req).await.unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_run_turn_applies_window_but_keeps_full_history() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_reply(Message::assistant("ok"));
        let engine = engine_with(mock.clone()).with_window(ContextWindow::new(4));

        let mut history = vec![Message::system("sys")];
        history.extend((0..20).map(|i| Message::user(format!("old {i}"))));
        let outcome = engine.run_turn_complete(&request(history, "new")).await.unwrap();

        let sent = &mock.recorded_calls()[0].messages;
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0].text(), "sys");
        assert_eq!(sent[4].text(), "new");
        assert_eq!(outcome.history.len(), 20 + 2);
    }

    #[tokio::test]
    async fn test_run_turn_streaming_uses_sink() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_stream(vec![StreamEvent::text("He"), StreamEvent::text("y").into_final()]);
        let engine = engine_with(mock);

        let mut req = request(vec![Message::system("sys")], "hi");
        req.streaming = true;
        req.model = "explicit".into();

        let mut seen = String::new();
        let mut sink = |event: &StreamEvent| -> Result<(), LlmError> {
            seen.push_str(&event.partial.text());
            Ok(())
        };
        let outcome = engine.run_turn(&req, &mut sink).await.unwrap();
        assert_eq!(seen, "Hey");
        assert_eq!(outcome.text, "Hey");
        assert_eq!(outcome.model, "explicit");
    }

    #[tokio::test]
    async fn test_streamed_text_before_tool_round_is_kept() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_stream(vec![
            StreamEvent::text("Checking. "),
            StreamEvent::tool_calls(vec![ToolCall::new("call_1", "get_weather", json!({}))]),
            StreamEvent::done(),
        ])
        .queue_stream(vec![StreamEvent::text("18C.").into_final()]);
        let engine = engine_with(mock);

        let mut req = request(vec![Message::system("sys")], "weather?");
        req.streaming = true;
        let mut ignore = |_: &StreamEvent| -> Result<(), LlmError> { Ok(()) };
        let outcome = engine.run_turn(&req, &mut ignore).await.unwrap();

        assert_eq!(outcome.text, "Checking. 18C.");
        assert_eq!(outcome.history.len(), 5);
        assert_eq!(outcome.history[1], Message::assistant("Checking. "));
        assert_eq!(outcome.history[4], Message::assistant("18C."));
    }

    #[tokio::test]
    async fn test_run_turn_loop_limit_from_config() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_reply(tool_call_msg("c", "get_weather", json!({})))
            .queue_reply(tool_call_msg("c", "get_weather", json!({})));
        let engine = engine_with(mock).with_loop_config(ToolLoopConfig { max_rounds: 1 });

        let err = engine
            .run_turn_complete(&request(vec![Message::system("s")], "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ToolLoopExceeded { rounds: 1 }));
    }

    /// Hands out one shared mock under the name `mock`.
    struct SharedFactory(Arc<MockProvider>);

    impl ProviderFactory for SharedFactory {
        fn name(&self) -> &str {
            "mock"
        }

        fn build(&self, _settings: &ProviderSettings) -> Result<Arc<dyn DynProvider>, LlmError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_from_config_applies_bridge_limits() {
        let config = BridgeConfig::parse(
            r#"
            [bridge]
            provider = "mock"
            context_window = 2
            max_tool_rounds = 1
            "#,
        )
        .unwrap();
        let mock = Arc::new(MockProvider::new("mock", "m"));
        let factories: Vec<Box<dyn ProviderFactory>> = vec![Box::new(SharedFactory(mock.clone()))];
        let mut tools = ToolRegistry::new();
        tools.register(static_tool("get_weather", "18C, clear"));
        let engine = Engine::from_config(&config, &factories, tools).unwrap();

        mock.queue_reply(Message::assistant("ok"));
        let history = vec![
            Message::system("s"),
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
        ];
        engine.run_turn_complete(&request(history, "four")).await.unwrap();
        let sent = &mock.recorded_calls()[0].messages;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].text(), "three");

        mock.queue_reply(tool_call_msg("c1", "get_weather", json!({})))
            .queue_reply(tool_call_msg("c2", "get_weather", json!({})));
        let err = engine
            .run_turn_complete(&request(vec![Message::system("s")], "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ToolLoopExceeded { rounds: 1 }));
        assert_eq!(mock.recorded_calls().len(), 3);
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = BridgeConfig::parse("[bridge]\nprovider = \"nope\"").unwrap();
        let err = Engine::from_config(&config, &[], ToolRegistry::new()).unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mock = Arc::new(MockProvider::new("mock", "m"));
        mock.queue_models(Ok(vec!["a".into()]));
        let engine = engine_with(mock);
        assert_eq!(engine.list_models("mock").await.unwrap(), vec!["a"]);
        assert!(engine.list_models("other").await.is_err());
        assert_eq!(engine.provider_names(), vec!["mock"]);
    }
}
