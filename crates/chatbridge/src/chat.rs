//! Conversation data model shared by every adapter.
//!
//! A [`Message`] is the single currency passed between the engine, the
//! tool loop, the provider adapters and the persistence collaborator.
//! Vendor crates translate it to and from their wire shapes; nothing
//! outside those crates ever sees a vendor type.
//!
//! [`Content`] is a closed union. A message that carries tool calls
//! holds them in [`Content::ToolCalls`], so it cannot also carry
//! user-visible text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,
    /// The human on the chat surface.
    User,
    /// The model.
    Assistant,
    /// The answer of a tool invocation.
    Tool,
}

impl Role {
    /// The lowercase wire name (`"system"`, `"user"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One element of a multi-part message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// A run of text.
    Text {
        /// The text itself.
        text: String,
    },
    /// An image referenced by URL (or a `data:` URL).
    ImageUrl {
        /// Where the image lives.
        url: String,
    },
}

/// The body of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// Plain text. An empty string stands in for "no content".
    Text(String),
    /// An ordered list of text and image parts.
    Parts(Vec<ContentPart>),
    /// A pure tool-call carrier emitted by the model.
    ToolCalls(Vec<ToolCall>),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A model-emitted request to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier linking the call to its `tool` answer.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    /// Arguments as produced by the model.
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// The arguments as the JSON string handed to a tool capability.
    ///
    /// Some vendors send arguments as an already-encoded JSON string;
    /// those pass through untouched instead of being quoted twice.
    pub fn arguments_string(&self) -> String {
        match &self.arguments {
            Value::String(raw) => raw.clone(),
            Value::Null => "{}".to_string(),
            other => other.to_string(),
        }
    }
}

/// A single entry of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Optional author name; tool answers carry the tool name here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Message body.
    #[serde(default)]
    pub content: Content,
    /// Base64-encoded images attached to a user message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// For `tool` messages, the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            name: None,
            content: Content::Text(text.into()),
            images: Vec::new(),
            tool_call_id: None,
        }
    }

    /// A system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_text(Role::System, text)
    }

    /// A user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_text(Role::User, text)
    }

    /// An assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_text(Role::Assistant, text)
    }

    /// An assistant message carrying only tool calls.
    pub fn from_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            name: None,
            content: Content::ToolCalls(calls),
            images: Vec::new(),
            tool_call_id: None,
        }
    }

    /// The answer of tool `name` to the call identified by `call_id`.
    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            name: Some(name.into()),
            content: Content::Text(result.into()),
            images: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Attaches a base64 image.
    #[must_use]
    pub fn with_image(mut self, base64: impl Into<String>) -> Self {
        self.images.push(base64.into());
        self
    }

    /// The visible text of the message.
    ///
    /// Text parts of a multi-part body are joined with newlines. Tool-call
    /// carriers have no text.
    pub fn text(&self) -> String {
        match &self.content {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Content::ToolCalls(_) => String::new(),
        }
    }

    /// The tool calls this message carries, if any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match &self.content {
            Content::ToolCalls(calls) => calls,
            _ => &[],
        }
    }

    /// Returns `true` if the message carries at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into its MIME type and
/// base64 payload. Returns `None` for any other URL.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    Some((mime, payload))
}
