//! Helper functions for creating tool handlers.

use std::future::Future;

use super::{FnToolHandler, ToolError};
use crate::provider::ToolDefinition;

/// Creates a [`ToolHandler`](super::ToolHandler) from an async closure.
///
/// The closure receives the model's arguments as a JSON string and
/// returns the answer text, or a [`ToolError`] that the registry turns
/// into an error answer.
///
/// # Example
///
/// ```rust
/// use chatbridge::tool::{tool_fn, ToolError};
/// use chatbridge::{JsonSchema, ToolDefinition};
/// use serde_json::{json, Value};
///
/// let handler = tool_fn(
///     ToolDefinition {
///         name: "add".into(),
///         description: "Add two numbers".into(),
///         parameters: JsonSchema::new(json!({
///             "type": "object",
///             "properties": {
///                 "a": { "type": "number" },
///                 "b": { "type": "number" }
///             },
///             "required": ["a", "b"]
///         })),
///     },
///     |arguments: String| async move {
///         let input: Value = serde_json::from_str(&arguments)?;
///         let a = input["a"].as_f64().unwrap_or(0.0);
///         let b = input["b"].as_f64().unwrap_or(0.0);
///         Ok::<_, ToolError>(format!("{}", a + b))
///     },
/// );
/// ```
pub fn tool_fn<F, Fut>(definition: ToolDefinition, handler: F) -> FnToolHandler<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    FnToolHandler {
        definition,
        handler,
    }
}
