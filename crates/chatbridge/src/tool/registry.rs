//! Tool registry for looking up and executing tools.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::ToolHandler;
use crate::chat::ToolCall;
use crate::provider::ToolDefinition;

/// A registry of tool handlers, indexed by name.
///
/// Built once and handed to the [`Engine`](crate::engine::Engine); there
/// is no global registry. Cloning is cheap (it clones `Arc`s).
///
/// Execution never fails at the outer level: unknown tools, invalid
/// arguments and handler errors all come back as the result text.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool handler.
    ///
    /// If a handler with the same name already exists, it is replaced.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> &mut Self {
        let name = handler.definition().name;
        self.handlers.insert(name, Arc::new(handler));
        self
    }

    /// Registers a shared tool handler.
    pub fn register_shared(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let name = handler.definition().name;
        self.handlers.insert(name, handler);
        self
    }

    /// Returns the handler for the given tool name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Returns whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Definitions of all registered tools, sorted by name so request
    /// bodies are deterministic.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.handlers.values().map(|h| h.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Executes one tool call and returns its answer text.
    pub async fn execute(&self, call: &ToolCall) -> String {
        let Some(handler) = self.handlers.get(&call.name) else {
            warn!(tool = %call.name, "model called an unregistered tool");
            return format!("Error: tool '{}' not available.", call.name);
        };

        let arguments = call.arguments_string();

        #[cfg(feature = "schema")]
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&arguments) {
            if let Err(e) = handler.definition().parameters.validate(&value) {
                return format!("Error: invalid arguments for tool '{}': {e}", call.name);
            }
        }

        match handler.execute(&arguments).await {
            Ok(result) => {
                debug!(tool = %call.name, bytes = result.len(), "tool finished");
                result
            }
            Err(e) => {
                debug!(tool = %call.name, error = %e, "tool returned an error");
                format!("Error: {e}")
            }
        }
    }
}
