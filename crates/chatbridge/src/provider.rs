//! Provider trait and request types.
//!
//! This module defines two core abstractions:
//!
//! - **[`Provider`]**: the trait every vendor adapter implements. It uses
//!   Rust 2024's native async-fn-in-traits, so implementations are plain
//!   `async fn`s.
//!
//! - **[`DynProvider`]**: an object-safe mirror of `Provider` that uses
//!   boxed futures. A blanket `impl<T: Provider> DynProvider for T`
//!   bridges the two, so the engine can hold `Arc<dyn DynProvider>`
//!   values keyed by vendor name.
//!
//! # When to use which
//!
//! | Situation | Use |
//! |-----------|-----|
//! | Generic code that knows the concrete type | `Provider` |
//! | Storing adapters in a map or behind `dyn` | `DynProvider` |
//! | Implementing a new vendor | `impl Provider for MyAdapter` |

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::Message;
use crate::error::LlmError;
use crate::stream::ChatStream;

/// The contract every vendor adapter implements.
///
/// Adapters never retry and never loop on tool calls; a response that
/// carries tool calls is returned as-is and the
/// [tool loop](crate::tool::tool_loop) takes it from there.
pub trait Provider: Send + Sync {
    /// Stable vendor identifier (e.g. `"ollama"`).
    fn provider_name(&self) -> &str;

    /// The model configured for this adapter when the caller has none.
    fn configured_model(&self) -> &str;

    /// Returns `requested` verbatim if non-empty, otherwise the
    /// configured default.
    fn default_model(&self, requested: &str) -> String {
        if requested.is_empty() {
            self.configured_model().to_string()
        } else {
            requested.to_string()
        }
    }

    /// One non-streaming round trip.
    fn chat(&self, params: &ChatParams) -> impl Future<Output = Result<Message, LlmError>> + Send;

    /// Opens a streaming request and returns the decoded event stream.
    fn chat_stream(
        &self,
        params: &ChatParams,
    ) -> impl Future<Output = Result<ChatStream, LlmError>> + Send;

    /// Lists model identifiers from the vendor's catalog.
    fn models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send;
}

/// Object-safe counterpart of [`Provider`] for dynamic dispatch.
///
/// You rarely implement this directly; every `Provider` gets it through
/// the blanket impl.
pub trait DynProvider: Send + Sync {
    /// See [`Provider::provider_name`].
    fn provider_name(&self) -> &str;

    /// See [`Provider::default_model`].
    fn default_model(&self, requested: &str) -> String;

    /// Boxed-future version of [`Provider::chat`].
    fn chat_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<Message, LlmError>> + Send + 'a>>;

    /// Boxed-future version of [`Provider::chat_stream`].
    fn chat_stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatStream, LlmError>> + Send + 'a>>;

    /// Boxed-future version of [`Provider::models`].
    fn models_boxed(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>>;
}

impl<T: Provider> DynProvider for T {
    fn provider_name(&self) -> &str {
        Provider::provider_name(self)
    }

    fn default_model(&self, requested: &str) -> String {
        Provider::default_model(self, requested)
    }

    fn chat_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<Message, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(params))
    }

    fn chat_stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatStream, LlmError>> + Send + 'a>> {
        Box::pin(self.chat_stream(params))
    }

    fn models_boxed(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>> {
        Box::pin(self.models())
    }
}

/// Parameters for one adapter call.
///
/// ```rust
/// use chatbridge::{ChatParams, Message};
///
/// let params = ChatParams {
///     model: "gpt-4o".into(),
///     messages: vec![Message::user("Hello")],
///     ..Default::default()
/// };
/// assert!(params.tools.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatParams {
    /// Resolved model identifier.
    pub model: String,
    /// The conversation window, system message first.
    pub messages: Vec<Message>,
    /// Tools the model may call. Empty means none are advertised.
    pub tools: Vec<ToolDefinition>,
}

/// A tool the model can invoke.
///
/// Adapters translate this into their native tool format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's name, matched against [`ToolCall::name`](crate::ToolCall::name).
    pub name: String,
    /// Shown to the model so it knows when to use the tool.
    pub description: String,
    /// JSON Schema describing the tool's arguments.
    pub parameters: JsonSchema,
}

/// A JSON Schema document describing tool parameters.
///
/// Wraps a [`serde_json::Value`]; use [`as_value`](Self::as_value) for
/// read access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema(Value);

impl JsonSchema {
    /// Creates a schema from a raw JSON value.
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    /// Returns a reference to the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Validates `value` against this schema, returning the joined
    /// violation messages on failure.
    ///
    /// Requires the `schema` feature (enabled by default).
    #[cfg(feature = "schema")]
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let validator = jsonschema::validator_for(&self.0)
            .map_err(|e| format!("invalid JSON schema: {e}"))?;
        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}
