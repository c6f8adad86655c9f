//! Conversion between chatbridge types and Chat Completions API types.

use chatbridge::chat::{self, Content, Message, Role};
use chatbridge::error::LlmError;
use chatbridge::provider::ChatParams;
use serde_json::Value;

use crate::config::Flavor;
use crate::types::{
    self, ContentPart, FunctionCall, FunctionDef, ImageUrl, MessageContent, Request, Tool,
};

// ── Request conversion ───────────────────────────────────────────────

/// Build a Chat Completions request for `model`.
pub(crate) fn build_request(
    params: &ChatParams,
    model: &str,
    flavor: Flavor,
    stream: bool,
) -> Request {
    let tools: Vec<Tool> = params
        .tools
        .iter()
        .map(|t| Tool {
            tool_type: "function",
            function: FunctionDef {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.as_value().clone(),
            },
        })
        .collect();
    let tool_choice = (!tools.is_empty() && flavor.sends_tool_choice()).then_some("auto");

    Request {
        model: model.to_string(),
        messages: params.messages.iter().map(convert_message).collect(),
        stream,
        tools: (!tools.is_empty()).then_some(tools),
        tool_choice,
    }
}

fn convert_message(msg: &Message) -> types::Message {
    let mut out = types::Message {
        role: msg.role.as_str(),
        content: None,
        name: None,
        tool_calls: None,
        tool_call_id: None,
    };

    match &msg.content {
        Content::ToolCalls(calls) => {
            out.tool_calls = Some(
                calls
                    .iter()
                    .map(|call| types::ToolCall {
                        id: call.id.clone(),
                        call_type: "function",
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments_string(),
                        },
                    })
                    .collect(),
            );
        }
        Content::Text(text) if msg.images.is_empty() => {
            out.content = Some(MessageContent::Text(text.clone()));
        }
        Content::Text(text) => {
            let mut parts = vec![ContentPart::Text { text: text.clone() }];
            parts.extend(image_parts(&msg.images));
            out.content = Some(MessageContent::Parts(parts));
        }
        Content::Parts(parts) => {
            let mut wire: Vec<ContentPart> = parts
                .iter()
                .map(|part| match part {
                    chat::ContentPart::Text { text } => ContentPart::Text { text: text.clone() },
                    chat::ContentPart::ImageUrl { url } => ContentPart::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    },
                })
                .collect();
            wire.extend(image_parts(&msg.images));
            out.content = Some(MessageContent::Parts(wire));
        }
    }

    if msg.role == Role::Tool {
        out.name.clone_from(&msg.name);
        out.tool_call_id.clone_from(&msg.tool_call_id);
    }
    out
}

fn image_parts(images: &[String]) -> impl Iterator<Item = ContentPart> + '_ {
    images.iter().map(|b64| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: format!("data:image/jpeg;base64,{b64}"),
        },
    })
}

// ── Response conversion ──────────────────────────────────────────────

/// Tool-call arguments arrive as a JSON string. Parse them; keep the raw
/// string if the model produced something that is not JSON.
pub(crate) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Convert a Chat Completions response to a [`Message`].
pub(crate) fn convert_response(resp: types::Response, raw: &str) -> Result<Message, LlmError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::decode("response has no choices", raw))?;

    match choice.message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(Message::from_tool_calls(
            calls
                .into_iter()
                .map(|tc| {
                    let arguments = parse_arguments(&tc.function.arguments);
                    chat::ToolCall::new(tc.id, tc.function.name, arguments)
                })
                .collect(),
        )),
        _ => Ok(Message::assistant(choice.message.content.unwrap_or_default())),
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(crate) fn convert_error(status: http::StatusCode, body: &str) -> LlmError {
    LlmError::Upstream {
        status: Some(status),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge::chat::ToolCall;
    use chatbridge::provider::{JsonSchema, ToolDefinition};
    use serde_json::json;

    fn params_with_tool() -> ChatParams {
        ChatParams {
            model: String::new(),
            messages: vec![Message::user("Weather?")],
            tools: vec![ToolDefinition {
                name: "get_weather".into(),
                description: "Weather for a city".into(),
                parameters: JsonSchema::new(json!({"type": "object"})),
            }],
        }
    }

    #[test]
    fn test_build_request_openai_has_no_tool_choice() {
        let req = build_request(&params_with_tool(), "gpt-4o", Flavor::OpenAi, false);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["tools"][0]["function"]["name"], "get_weather");
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn test_build_request_groq_sends_tool_choice() {
        let req = build_request(&params_with_tool(), "m", Flavor::Groq, true);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_build_request_without_tools() {
        let mut params = params_with_tool();
        params.tools.clear();
        let json = serde_json::to_value(build_request(&params, "m", Flavor::Mistral, false)).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn test_user_images_become_data_urls() {
        let msg = Message::user("What is this?").with_image("AAAA");
        let json = serde_json::to_value(convert_message(&msg)).unwrap();
        assert_eq!(json["content"][0], json!({"type": "text", "text": "What is this?"}));
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn test_tool_call_linkage_round_trip() {
        let carrier = Message::from_tool_calls(vec![ToolCall::new(
            "call_abc",
            "get_weather",
            json!({"location": "Paris"}),
        )]);
        let answer = Message::tool_result("call_abc", "get_weather", "18C, clear");

        let carrier = serde_json::to_value(convert_message(&carrier)).unwrap();
        let answer = serde_json::to_value(convert_message(&answer)).unwrap();
        assert_eq!(carrier["content"], Value::Null);
        assert_eq!(carrier["tool_calls"][0]["id"], "call_abc");
        assert_eq!(
            carrier["tool_calls"][0]["function"]["arguments"],
            r#"{"location":"Paris"}"#
        );
        assert_eq!(answer["role"], "tool");
        assert_eq!(answer["tool_call_id"], "call_abc");
        assert_eq!(answer["name"], "get_weather");
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("not json"), json!("not json"));
    }

    #[test]
    fn test_convert_response_text() {
        let raw = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"},"finish_reason":"stop"}]}"#;
        let resp: types::Response = serde_json::from_str(raw).unwrap();
        assert_eq!(convert_response(resp, raw).unwrap(), Message::assistant("Hi!"));
    }

    #[test]
    fn test_convert_response_tool_calls() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
            {"id":"call_1","type":"function","function":{"name":"get_weather","arguments":"{\"location\":\"Paris\"}"}}
        ]},"finish_reason":"tool_calls"}]}"#;
        let resp: types::Response = serde_json::from_str(raw).unwrap();
        let msg = convert_response(resp, raw).unwrap();
        assert_eq!(
            msg.tool_calls(),
            &[ToolCall::new("call_1", "get_weather", json!({"location": "Paris"}))]
        );
    }

    #[test]
    fn test_convert_response_no_choices() {
        let resp: types::Response = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            convert_response(resp, "{}").unwrap_err(),
            LlmError::Decode { .. }
        ));
    }
}
