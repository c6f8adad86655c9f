//! HTTP-level tests for the Ollama provider against a `wiremock` server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatbridge::delivery::DeliveryConfig;
use chatbridge::mock::{MockTransport, TransportCall};
use chatbridge::store::{ConversationStore, MemoryStore};
use chatbridge::test_helpers::{collect_stream, stream_text};
use chatbridge::tool::{ToolRegistry, tool_fn};
use chatbridge::{
    ChatParams, DynProvider, Engine, Incoming, JsonSchema, LlmError, Message, Provider, Session,
    SessionSettings, ToolDefinition, TurnRequest,
};
use chatbridge_ollama::{OllamaConfig, OllamaProvider};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new(OllamaConfig {
        model: "llama3.2".into(),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

fn params(text: &str) -> ChatParams {
    ChatParams {
        model: String::new(),
        messages: vec![Message::system("Be brief."), Message::user(text)],
        tools: Vec::new(),
    }
}

fn ndjson(lines: &[serde_json::Value]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

fn three_line_stream() -> String {
    ndjson(&[
        json!({"model": "llama3.2", "message": {"role": "assistant", "content": "Hel"}, "done": false}),
        json!({"model": "llama3.2", "message": {"role": "assistant", "content": "lo"}, "done": false}),
        json!({"model": "llama3.2", "message": {"role": "assistant", "content": ""}, "done": true, "done_reason": "stop"}),
    ])
}

fn weather_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tool_fn(
        ToolDefinition {
            name: "get_weather".into(),
            description: "Current weather for a city".into(),
            parameters: JsonSchema::new(json!({
                "type": "object",
                "properties": { "location": { "type": "string" } },
                "required": ["location"]
            })),
        },
        |_arguments: String| async move { Ok("18C, clear".to_string()) },
    ));
    registry
}

#[tokio::test]
async fn test_chat_text_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.2", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "4"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = provider(&server).chat(&params("2+2?")).await.unwrap();
    assert_eq!(reply, Message::assistant("4"));
}

#[tokio::test]
async fn test_chat_uses_requested_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "mistral"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "ok"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut p = params("hi");
    p.model = "mistral".into();
    provider(&server).chat(&p).await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_is_upstream_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).set_body_string(r#"{"error":"too many requests"}"#))
        .mount(&server)
        .await;

    let err = provider(&server).chat(&params("hi")).await.unwrap_err();
    match err {
        LlmError::Upstream { status, body } => {
            assert_eq!(status, Some(http::StatusCode::TOO_MANY_REQUESTS));
            assert_eq!(body, r#"{"error":"too many requests"}"#);
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"content": "late"}, "done": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(OllamaConfig {
        base_url: server.uri(),
        timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    })
    .unwrap();
    let err = provider.chat(&params("hi")).await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout { elapsed_ms: 50 }), "got {err:?}");
}

#[tokio::test]
async fn test_stream_three_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(three_line_stream(), "application/x-ndjson"))
        .mount(&server)
        .await;

    let stream = provider(&server).chat_stream(&params("hi")).await.unwrap();
    let events = collect_stream(stream).await;
    assert_eq!(events.len(), 3);
    assert_eq!(stream_text(&events), "Hello");
    assert!(events[2].is_final);
    assert!(events[..2].iter().all(|e| !e.is_final));
}

#[tokio::test]
async fn test_stream_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model 'x' not found"}"#))
        .mount(&server)
        .await;

    let err = provider(&server).chat_stream(&params("hi")).await.err().unwrap();
    assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_models_lists_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llama3.2:latest", "model": "llama3.2:latest"},
                {"name": "qwen2.5:1.5b-instruct", "model": "qwen2.5:1.5b-instruct"}
            ]
        })))
        .mount(&server)
        .await;

    let models = provider(&server).models().await.unwrap();
    assert_eq!(models, vec!["llama3.2:latest", "qwen2.5:1.5b-instruct"]);
}

#[tokio::test]
async fn test_engine_tool_round_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "get_weather", "arguments": {"location": "Paris"}}}]
            },
            "done": true
        })))
        .with_priority(1)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("18C, clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "It is 18C and clear in Paris."},
            "done": true
        })))
        .mount(&server)
        .await;

    let mut providers: HashMap<String, Arc<dyn DynProvider>> = HashMap::new();
    providers.insert("ollama".into(), Arc::new(provider(&server)));
    let engine = Engine::new(providers, weather_registry());

    let request = TurnRequest {
        history: vec![Message::system("Be brief.")],
        message: Message::user("Weather in Paris?"),
        model: String::new(),
        provider: "ollama".into(),
        streaming: false,
    };
    let outcome = engine.run_turn_complete(&request).await.unwrap();

    assert_eq!(outcome.text, "It is 18C and clear in Paris.");
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.history.len(), 4);
    assert_eq!(outcome.history[1].tool_calls()[0].id, "call_get_weather_0");
    assert_eq!(outcome.history[2].tool_call_id.as_deref(), Some("call_get_weather_0"));
}

#[tokio::test]
async fn test_streamed_session_sends_one_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(three_line_stream(), "application/x-ndjson"))
        .mount(&server)
        .await;

    let mut providers: HashMap<String, Arc<dyn DynProvider>> = HashMap::new();
    providers.insert("ollama".into(), Arc::new(provider(&server)));
    let engine = Arc::new(Engine::new(providers, ToolRegistry::new()));
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(MockTransport::new());
    let session = Session::new(
        engine,
        store.clone(),
        transport.clone(),
        SessionSettings {
            provider: "ollama".into(),
            model: String::new(),
            system_prompt: "Be brief.".into(),
            streaming: true,
            delivery: DeliveryConfig::default(),
        },
    );

    session
        .handle_text(Incoming {
            user_id: 1,
            chat_id: 10,
            message_id: 42,
            text: "hi".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            TransportCall::Typing { chat_id: 10 },
            TransportCall::Send {
                chat_id: 10,
                reply_to: Some(42),
                text: "Typing…".into(),
                markdown: false,
            },
            TransportCall::Edit {
                chat_id: 10,
                message_id: 100,
                text: "Hello\n\n🤖 *llama3.2*".into(),
                markdown: true,
            },
        ]
    );
    let history = store.get_history(1).await.unwrap();
    assert_eq!(history, vec![Message::user("hi"), Message::assistant("Hello")]);
}
