//! Pre-built helpers for testing code that uses `chatbridge` types.
//!
//! Available when the `test-utils` feature is enabled, so vendor crates
//! and applications can reuse them in their own suites. Also compiled
//! during `#[cfg(test)]` for this crate's own tests.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;

use crate::chat::{Message, ToolCall};
use crate::error::LlmError;
use crate::mock::MockProvider;
use crate::provider::{DynProvider, JsonSchema, ToolDefinition};
use crate::stream::{ChatStream, StreamEvent};
use crate::tool::{ToolHandler, tool_fn};

/// Shorthand for [`Message::user`].
pub fn user_msg(text: &str) -> Message {
    Message::user(text)
}

/// Shorthand for [`Message::assistant`].
pub fn assistant_msg(text: &str) -> Message {
    Message::assistant(text)
}

/// Shorthand for [`Message::system`].
pub fn system_msg(text: &str) -> Message {
    Message::system(text)
}

/// An assistant tool-call carrier with a single call.
pub fn tool_call_msg(id: &str, name: &str, arguments: Value) -> Message {
    Message::from_tool_calls(vec![ToolCall::new(id, name, arguments)])
}

/// A tool that answers every call with `answer`.
pub fn static_tool(name: &str, answer: &str) -> impl ToolHandler + use<> {
    let answer = answer.to_string();
    tool_fn(
        ToolDefinition {
            name: name.to_string(),
            description: format!("Test tool {name}"),
            parameters: JsonSchema::new(serde_json::json!({"type": "object"})),
        },
        move |_arguments: String| std::future::ready(Ok(answer.clone())),
    )
}

/// A provider map with one [`MockProvider`] under its own name.
pub fn provider_map(mock: Arc<MockProvider>) -> HashMap<String, Arc<dyn DynProvider>> {
    let name = DynProvider::provider_name(mock.as_ref()).to_string();
    HashMap::from([(name, mock as Arc<dyn DynProvider>)])
}

/// Collect stream events, returning results including errors.
pub async fn collect_stream_results(stream: ChatStream) -> Vec<Result<StreamEvent, LlmError>> {
    stream.collect::<Vec<_>>().await
}

/// Collect stream events, panicking on any error.
/// Use `collect_stream_results` when testing error scenarios.
pub async fn collect_stream(stream: ChatStream) -> Vec<StreamEvent> {
    stream
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|r| r.expect("stream event should be Ok"))
        .collect()
}

/// Concatenated text of all events.
pub fn stream_text(events: &[StreamEvent]) -> String {
    events.iter().map(|e| e.partial.text()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    #[test]
    fn test_helper_messages() {
        assert_eq!(user_msg("hi").role, Role::User);
        assert_eq!(assistant_msg("hello").role, Role::Assistant);
        assert_eq!(system_msg("be nice").role, Role::System);
        assert!(tool_call_msg("c1", "f", serde_json::json!({})).has_tool_calls());
    }

    #[tokio::test]
    async fn test_static_tool_answers() {
        let tool = static_tool("get_weather", "18C, clear");
        assert_eq!(tool.definition().name, "get_weather");
        assert_eq!(tool.execute("{}").await.unwrap(), "18C, clear");
    }

    #[tokio::test]
    async fn test_collect_stream_results_with_errors() {
        let events = vec![Ok(StreamEvent::text("hello")), Err(LlmError::transport("reset"))];
        let stream: ChatStream = Box::pin(futures::stream::iter(events));
        let collected = collect_stream_results(stream).await;
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_err());
    }

    #[tokio::test]
    async fn test_collect_stream_and_text() {
        let events = vec![Ok(StreamEvent::text("he")), Ok(StreamEvent::text("y").into_final())];
        let stream: ChatStream = Box::pin(futures::stream::iter(events));
        let collected = collect_stream(stream).await;
        assert_eq!(stream_text(&collected), "hey");
    }

    #[test]
    fn test_provider_map_keys_by_name() {
        let map = provider_map(Arc::new(MockProvider::new("ollama", "m")));
        assert!(map.contains_key("ollama"));
    }
}
