//! Conversion between chatbridge types and Gemini API types.

use chatbridge::chat::{self, ContentPart, Message, Role, ToolCall, parse_data_url};
use chatbridge::error::LlmError;
use chatbridge::provider::ChatParams;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::types::{
    self, Candidate, Content, FunctionCall, FunctionCallingConfig, FunctionDeclaration,
    FunctionResponse, InlineData, Part, Request, Tool, ToolConfig,
};

/// Finish reasons that mean the answer was withheld on policy grounds.
const POLICY_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

// ── Request conversion ───────────────────────────────────────────────

/// Build a Gemini request. The model goes in the URL, not the body.
pub(crate) fn build_request(params: &ChatParams) -> Request {
    let system_instruction = params
        .messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| Content {
            role: None,
            parts: vec![text_part(m.text())],
        });

    let mut contents: Vec<Content> = Vec::with_capacity(params.messages.len());
    for msg in &params.messages {
        match msg.role {
            Role::System => {}
            // Answers to one round's calls go back together in one turn.
            Role::Tool => {
                let part = function_response_part(msg);
                match contents.last_mut() {
                    Some(last) if is_function_response_turn(last) => last.parts.push(part),
                    _ => contents.push(Content {
                        role: Some("user".into()),
                        parts: vec![part],
                    }),
                }
            }
            Role::User | Role::Assistant => contents.push(convert_message(msg)),
        }
    }

    let (tools, tool_config) = if params.tools.is_empty() {
        (None, None)
    } else {
        let declarations = params
            .tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.as_value().clone(),
            })
            .collect();
        (
            Some(vec![Tool {
                function_declarations: declarations,
            }]),
            Some(ToolConfig {
                function_calling_config: FunctionCallingConfig { mode: "AUTO" },
            }),
        )
    };

    Request {
        contents,
        system_instruction,
        tools,
        tool_config,
    }
}

fn text_part(text: impl Into<String>) -> Part {
    Part {
        text: Some(text.into()),
        ..Default::default()
    }
}

fn image_part(mime_type: &str, data: &str) -> Part {
    Part {
        inline_data: Some(InlineData {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        }),
        ..Default::default()
    }
}

fn is_function_response_turn(content: &Content) -> bool {
    !content.parts.is_empty() && content.parts.iter().all(|p| p.function_response.is_some())
}

fn function_response_part(msg: &Message) -> Part {
    Part {
        function_response: Some(FunctionResponse {
            name: msg.name.clone().unwrap_or_default(),
            response: json!({ "response": msg.text() }),
        }),
        ..Default::default()
    }
}

fn convert_message(msg: &Message) -> Content {
    let role = if msg.role == Role::Assistant { "model" } else { "user" };
    let mut parts = Vec::new();

    match &msg.content {
        chat::Content::Text(text) => {
            if !text.is_empty() {
                parts.push(text_part(text.as_str()));
            }
        }
        chat::Content::Parts(content_parts) => {
            for part in content_parts {
                match part {
                    ContentPart::Text { text } => parts.push(text_part(text.as_str())),
                    ContentPart::ImageUrl { url } => match parse_data_url(url) {
                        Some((mime, data)) => parts.push(image_part(mime, data)),
                        None => warn!("gemini accepts inline images only, dropping {url}"),
                    },
                }
            }
        }
        chat::Content::ToolCalls(calls) => {
            parts.extend(calls.iter().map(|call| Part {
                function_call: Some(FunctionCall {
                    name: call.name.clone(),
                    args: call_args(call),
                }),
                ..Default::default()
            }));
        }
    }

    parts.extend(msg.images.iter().map(|data| image_part("image/jpeg", data)));
    if parts.is_empty() {
        parts.push(text_part(""));
    }

    Content {
        role: Some(role.into()),
        parts,
    }
}

/// Gemini wants `args` as an object.
fn call_args(call: &ToolCall) -> Value {
    match &call.arguments {
        Value::Object(_) => call.arguments.clone(),
        _ => match serde_json::from_str::<Value>(&call.arguments_string()) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::Object(Map::new()),
        },
    }
}

// ── Response conversion ──────────────────────────────────────────────

/// Checks a response for policy blocks and returns its first candidate.
///
/// `Ok(None)` means the response carried no candidate and no block
/// reason; callers decide whether that is an error.
pub(crate) fn first_candidate(resp: types::Response) -> Result<Option<Candidate>, LlmError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::ContentPolicy { reason });
    }
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Ok(None);
    };
    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| POLICY_REASONS.contains(r))
    {
        return Err(LlmError::ContentPolicy {
            reason: reason.to_string(),
        });
    }
    Ok(Some(candidate))
}

/// Function calls in `parts`, with ids numbered from `first_index`.
pub(crate) fn convert_tool_calls(parts: &[Part], first_index: usize) -> Vec<ToolCall> {
    parts
        .iter()
        .filter_map(|p| p.function_call.as_ref())
        .enumerate()
        .map(|(i, fc)| {
            ToolCall::new(
                format!("call_{}_{}", fc.name, first_index + i),
                fc.name.clone(),
                fc.args.clone(),
            )
        })
        .collect()
}

/// The concatenated text parts.
pub(crate) fn parts_text(parts: &[Part]) -> String {
    parts.iter().filter_map(|p| p.text.as_deref()).collect()
}

/// Convert a Gemini response to a [`Message`].
pub(crate) fn convert_response(resp: types::Response, raw: &str) -> Result<Message, LlmError> {
    let candidate =
        first_candidate(resp)?.ok_or_else(|| LlmError::decode("gemini response has no candidates", raw))?;
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let calls = convert_tool_calls(&parts, 0);
    if calls.is_empty() {
        Ok(Message::assistant(parts_text(&parts)))
    } else {
        Ok(Message::from_tool_calls(calls))
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
    use chatbridge::provider::{JsonSchema, ToolDefinition};
    use pretty_assertions::assert_eq;

    fn params(messages: Vec<Message>) -> ChatParams {
        ChatParams {
            model: String::new(),
            messages,
            tools: Vec::new(),
        }
    }

    fn to_json(params: &ChatParams) -> Value {
        serde_json::to_value(build_request(params)).unwrap()
    }

    #[test]
    fn test_system_lifted_and_assistant_renamed() {
        let json = to_json(&params(vec![
            Message::system("Be brief."),
            Message::user("hi"),
            Message::assistant("hello"),
        ]));
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert_eq!(json["contents"].as_array().unwrap().len(), 2);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert!(json.get("tools").is_none());
        assert!(json.get("toolConfig").is_none());
    }

    #[test]
    fn test_images_become_inline_data() {
        let json = to_json(&params(vec![
            Message::user("What is this?").with_image("QUJD"),
        ]));
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "What is this?");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn test_data_url_part_keeps_mime() {
        let msg = Message {
            content: chat::Content::Parts(vec![
                ContentPart::Text { text: "look".into() },
                ContentPart::ImageUrl {
                    url: "data:image/png;base64,iVBO".into(),
                },
                ContentPart::ImageUrl {
                    url: "https://example.com/cat.png".into(),
                },
            ]),
            ..Message::user("")
        };
        let json = to_json(&params(vec![msg]));
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    }

    #[test]
    fn test_tool_round_mapping() {
        let json = to_json(&params(vec![
            Message::user("Weather in Paris and Rome?"),
            Message::from_tool_calls(vec![
                ToolCall::new("call_get_weather_0", "get_weather", json!({"location": "Paris"})),
                ToolCall::new("call_get_weather_1", "get_weather", json!({"location": "Rome"})),
            ]),
            Message::tool_result("call_get_weather_0", "get_weather", "18C"),
            Message::tool_result("call_get_weather_1", "get_weather", "24C"),
        ]));
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);

        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["name"], "get_weather");
        assert_eq!(contents[1]["parts"][1]["functionCall"]["args"]["location"], "Rome");

        assert_eq!(contents[2]["role"], "user");
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses[0]["functionResponse"],
            json!({"name": "get_weather", "response": {"response": "18C"}})
        );
    }

    #[test]
    fn test_string_arguments_become_object() {
        let call = ToolCall::new("c", "f", json!("{\"a\":1}"));
        assert_eq!(call_args(&call), json!({"a": 1}));
        let call = ToolCall::new("c", "f", json!("not json"));
        assert_eq!(call_args(&call), json!({}));
    }

    #[test]
    fn test_tools_sent_with_auto_mode() {
        let mut p = params(vec![Message::user("hi")]);
        p.tools = vec![ToolDefinition {
            name: "get_time".into(),
            description: "Current time".into(),
            parameters: JsonSchema::new(json!({"type": "object", "properties": {}})),
        }];
        let json = to_json(&p);
        assert_eq!(json["tools"][0]["function_declarations"][0]["name"], "get_time");
        assert_eq!(json["toolConfig"]["function_calling_config"]["mode"], "AUTO");
    }

    fn response(value: Value) -> types::Response {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_response_text() {
        let msg = convert_response(
            response(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there"}]},
                    "finishReason": "STOP"
                }]
            })),
            "",
        )
        .unwrap();
        assert_eq!(msg, Message::assistant("Hello there"));
    }

    #[test]
    fn test_convert_response_function_calls_get_ids() {
        let msg = convert_response(
            response(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"functionCall": {"name": "get_time", "args": {}}},
                        {"functionCall": {"name": "get_weather", "args": {"location": "Paris"}}}
                    ]}
                }]
            })),
            "",
        )
        .unwrap();
        let ids: Vec<&str> = msg.tool_calls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_get_time_0", "call_get_weather_1"]);
    }

    #[test]
    fn test_safety_finish_is_content_policy() {
        let err = convert_response(
            response(json!({"candidates": [{"finishReason": "SAFETY"}]})),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::ContentPolicy { reason } if reason == "SAFETY"));
    }

    #[test]
    fn test_block_reason_is_content_policy() {
        let err = convert_response(
            response(json!({"promptFeedback": {"blockReason": "OTHER"}})),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::ContentPolicy { reason } if reason == "OTHER"));
    }

    #[test]
    fn test_no_candidates_is_decode_error() {
        let err = convert_response(response(json!({})), "{}").unwrap_err();
        assert!(matches!(err, LlmError::Decode { raw, .. } if raw == "{}"));
    }
}
