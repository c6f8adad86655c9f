//! HTTP-level tests for the OpenAI-compatible provider against `wiremock`.

use std::collections::HashMap;
use std::sync::Arc;

use chatbridge::test_helpers::{collect_stream, stream_text};
use chatbridge::tool::{ToolRegistry, tool_fn};
use chatbridge::{
    ChatParams, DynProvider, Engine, JsonSchema, LlmError, Message, Provider, ToolCall,
    ToolDefinition, TurnRequest,
};
use chatbridge::speech::SpeechToText;
use chatbridge_openai::{Flavor, OpenAiConfig, OpenAiProvider, OpenAiTranscriber};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_regex, method, path,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, flavor: Flavor) -> OpenAiProvider {
    OpenAiProvider::new(OpenAiConfig {
        api_key: "sk-test".into(),
        base_url: server.uri(),
        ..OpenAiConfig::for_flavor(flavor)
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

fn weather_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_weather".into(),
        description: "Current weather for a city".into(),
        parameters: JsonSchema::new(json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        })),
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn sse(chunks: &[serde_json::Value]) -> String {
    let mut body: String = chunks.iter().map(|c| format!("data: {c}\n\n")).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

#[tokio::test]
async fn test_chat_sends_bearer_and_parses_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("4")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = provider(&server, Flavor::OpenAi)
        .chat(&params("2+2?"))
        .await
        .unwrap();
    assert_eq!(reply, Message::assistant("4"));
}

#[tokio::test]
async fn test_chat_tool_call_arguments_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let mut p = params("Weather in Paris?");
    p.tools = vec![weather_tool()];
    let reply = provider(&server, Flavor::OpenAi).chat(&p).await.unwrap();
    assert_eq!(
        reply.tool_calls(),
        &[ToolCall::new("call_abc", "get_weather", json!({"location": "Paris"}))]
    );
}

#[tokio::test]
async fn test_groq_sends_tool_choice_auto() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "llama-3.2-1b-preview",
            "tool_choice": "auto",
            "tools": [{"type": "function", "function": {"name": "get_weather"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let mut p = params("hi");
    p.tools = vec![weather_tool()];
    provider(&server, Flavor::Groq).chat(&p).await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_is_upstream_error_with_body() {
    let server = MockServer::start().await;
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(body))
        .mount(&server)
        .await;

    let err = provider(&server, Flavor::Mistral)
        .chat(&params("hi"))
        .await
        .unwrap_err();
    match err {
        LlmError::Upstream { status, body: got } => {
            assert_eq!(status, Some(http::StatusCode::TOO_MANY_REQUESTS));
            assert_eq!(got, body);
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_text_matches_non_streamed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]}),
                json!({"choices": [{"index": 0, "delta": {"content": "Hel"}}]}),
                json!({"choices": [{"index": 0, "delta": {"content": "lo"}}]}),
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}),
            ]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello")))
        .mount(&server)
        .await;

    let provider = provider(&server, Flavor::OpenAi);
    let events = collect_stream(provider.chat_stream(&params("hi")).await.unwrap()).await;
    let whole = provider.chat(&params("hi")).await.unwrap();

    assert_eq!(stream_text(&events), whole.text());
    assert_eq!(events.iter().filter(|e| e.is_final).count(), 1);
    assert!(events.last().unwrap().is_final);
}

#[tokio::test]
async fn test_stream_tool_call_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 0, "id": "call_1", "type": "function", "function": {"name": "get_weather", "arguments": ""}}
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 0, "function": {"arguments": "{\"location\":"}}
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 0, "function": {"arguments": "\"Paris\"}"}}
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]}),
            ]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let mut p = params("Weather in Paris?");
    p.tools = vec![weather_tool()];
    let events = collect_stream(
        provider(&server, Flavor::Groq)
            .chat_stream(&p)
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(events.len(), 1);
    assert!(events[0].is_final);
    assert_eq!(
        events[0].partial.tool_calls(),
        &[ToolCall::new("call_1", "get_weather", json!({"location": "Paris"}))]
    );
}

#[tokio::test]
async fn test_models_lists_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"id": "gpt-4o", "object": "model"},
                {"id": "gpt-4o-mini", "object": "model"}
            ]
        })))
        .mount(&server)
        .await;

    let models = provider(&server, Flavor::OpenAi).models().await.unwrap();
    assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);
}

#[tokio::test]
async fn test_engine_tool_round_keeps_call_linkage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_xyz",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .with_priority(1)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system"},
                {"role": "user"},
                {"role": "assistant", "content": null, "tool_calls": [{"id": "call_xyz"}]},
                {"role": "tool", "tool_call_id": "call_xyz", "name": "get_weather"}
            ]
        })))
        .and(body_string_contains("18C, clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("18C and clear.")))
        .mount(&server)
        .await;

    let mut registry = ToolRegistry::new();
    registry.register(tool_fn(weather_tool(), |_arguments: String| async move {
        Ok("18C, clear".to_string())
    }));
    let mut providers: HashMap<String, Arc<dyn DynProvider>> = HashMap::new();
    providers.insert("openai".into(), Arc::new(provider(&server, Flavor::OpenAi)));
    let engine = Engine::new(providers, registry);

    let outcome = engine
        .run_turn_complete(&TurnRequest {
            history: vec![Message::system("Be brief.")],
            message: Message::user("Weather in Paris?"),
            model: String::new(),
            provider: "openai".into(),
            streaming: false,
        })
        .await
        .unwrap();

    assert_eq!(outcome.text, "18C and clear.");
    assert_eq!(outcome.rounds, 1);
}

fn transcriber(server: &MockServer) -> OpenAiTranscriber {
    OpenAiTranscriber::new(OpenAiConfig {
        api_key: "gsk-test".into(),
        base_url: server.uri(),
        ..OpenAiConfig::transcription(Flavor::Groq)
    })
    .unwrap()
}

#[tokio::test]
async fn test_transcription_uploads_multipart_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(header("authorization", "Bearer gsk-test"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("whisper-large-v3-turbo"))
        .and(body_string_contains(r#"filename="audio.ogg""#))
        .and(body_string_contains("OggS-voice"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": " What time is it in Paris?"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let speech: Arc<dyn SpeechToText> = Arc::new(transcriber(&server));
    let text = speech.transcribe(b"OggS-voice").await.unwrap();
    assert_eq!(text, " What time is it in Paris?");
}

#[tokio::test]
async fn test_transcription_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "file must be one of flac, mp3, ogg", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = transcriber(&server).transcribe_audio(b"not audio").await.unwrap_err();
    match err {
        LlmError::Upstream { status, body } => {
            assert_eq!(status.map(|s| s.as_u16()), Some(400));
            assert!(body.contains("file must be one of"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transcription_garbage_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = transcriber(&server).transcribe_audio(b"OggS").await.unwrap_err();
    assert!(matches!(err, LlmError::Decode { .. }));
}
