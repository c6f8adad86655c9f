//! Tool handler trait and the closure-backed implementation.

use std::future::Future;
use std::pin::Pin;

use super::ToolError;
use crate::provider::ToolDefinition;

/// A single capability the model can invoke.
///
/// The contract is deliberately narrow: one JSON argument string in, one
/// plain string out. Tool results are always text to the model; a
/// handler with structured output serializes it itself.
///
/// The trait is object-safe (boxed futures) so handlers can be stored
/// as `Arc<dyn ToolHandler>`.
///
/// ```rust
/// use chatbridge::tool::{ToolHandler, ToolError};
/// use chatbridge::{ToolDefinition, JsonSchema};
/// use serde_json::json;
/// use std::future::Future;
/// use std::pin::Pin;
///
/// struct Echo;
///
/// impl ToolHandler for Echo {
///     fn definition(&self) -> ToolDefinition {
///         ToolDefinition {
///             name: "echo".into(),
///             description: "Repeat the arguments".into(),
///             parameters: JsonSchema::new(json!({"type": "object"})),
///         }
///     }
///
///     fn execute<'a>(
///         &'a self,
///         arguments: &'a str,
///     ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>> {
///         Box::pin(async move { Ok(arguments.to_string()) })
///     }
/// }
/// ```
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's definition (name, description, parameter schema).
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool with the model's arguments, encoded as JSON.
    fn execute<'a>(
        &'a self,
        arguments: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>>;
}

/// A tool handler backed by an async closure.
///
/// Created via [`super::tool_fn`].
pub struct FnToolHandler<F> {
    pub(crate) definition: ToolDefinition,
    pub(crate) handler: F,
}

impl<F> std::fmt::Debug for FnToolHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnToolHandler")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn execute<'a>(
        &'a self,
        arguments: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>> {
        Box::pin((self.handler)(arguments.to_string()))
    }
}
