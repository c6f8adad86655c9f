//! Conversion between chatbridge types and Ollama API types.

use chatbridge::chat::{Content, ContentPart, Message, Role, ToolCall, parse_data_url};
use chatbridge::error::LlmError;
use chatbridge::provider::ChatParams;
use tracing::warn;

use crate::types::{
    self, FunctionCallRequest, FunctionDef, Request, Tool, ToolCallRequest, ToolCallResponse,
};

// ── Request conversion ───────────────────────────────────────────────

/// Build an Ollama API request for `model`.
pub(crate) fn build_request(params: &ChatParams, model: &str, stream: bool) -> Request {
    let tools = if params.tools.is_empty() {
        None
    } else {
        Some(
            params
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
                .collect(),
        )
    };

    Request {
        model: model.to_string(),
        messages: params.messages.iter().map(convert_message).collect(),
        stream,
        tools,
    }
}

/// Convert a single message to Ollama's shape.
///
/// Ollama takes images as bare base64 strings next to the text, so a
/// multi-part body is flattened: text parts are joined, `data:` image
/// URLs are unwrapped, and remote image URLs are dropped.
fn convert_message(msg: &Message) -> types::Message {
    let mut images = msg.images.clone();
    let mut tool_calls = None;

    let content = match &msg.content {
        Content::Text(text) => text.clone(),
        Content::Parts(parts) => {
            for part in parts {
                if let ContentPart::ImageUrl { url } = part {
                    match parse_data_url(url) {
                        Some((_, data)) => images.push(data.to_string()),
                        None => warn!("ollama accepts inline images only, dropping {url}"),
                    }
                }
            }
            msg.text()
        }
        Content::ToolCalls(calls) => {
            tool_calls = Some(
                calls
                    .iter()
                    .map(|call| ToolCallRequest {
                        function: FunctionCallRequest {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            );
            String::new()
        }
    };

    types::Message {
        role: msg.role.as_str(),
        content,
        images: (!images.is_empty()).then_some(images),
        tool_calls,
        tool_name: if msg.role == Role::Tool {
            msg.name.clone()
        } else {
            None
        },
    }
}

// ── Response conversion ──────────────────────────────────────────────

/// Ollama has no tool-call ids; synthesize `call_{name}_{index}` so the
/// same tool called twice in one round still gets distinct ids. Indices
/// start at `first_index`, which streams advance chunk by chunk.
pub(crate) fn convert_tool_calls(calls: &[ToolCallResponse], first_index: usize) -> Vec<ToolCall> {
    calls
        .iter()
        .enumerate()
        .map(|(i, tc)| {
            ToolCall::new(
                format!("call_{}_{}", tc.function.name, first_index + i),
                tc.function.name.clone(),
                tc.function.arguments.clone(),
            )
        })
        .collect()
}

/// Convert an Ollama API response to a [`Message`].
pub(crate) fn convert_response(resp: types::Response, raw: &str) -> Result<Message, LlmError> {
    let message = resp
        .message
        .ok_or_else(|| LlmError::decode("ollama response has no message", raw))?;

    match message.tool_calls.as_deref() {
        Some(calls) if !calls.is_empty() => Ok(Message::from_tool_calls(convert_tool_calls(calls, 0))),
        _ => Ok(Message::assistant(message.content.unwrap_or_default())),
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(crate) fn convert_error(status: http::StatusCode, body: &str) -> LlmError {
    LlmError::Upstream {
        status: Some(status),
        body: body.to_string(),
    }
}
