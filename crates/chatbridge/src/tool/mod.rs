//! Tool registry and the tool-calling loop.
//!
//! # Architecture
//!
//! ```text
//!   ToolHandler        : one capability: JSON argument string in, text out
//!       │
//!   ToolRegistry       : handlers by name; unknown tools answer with an error string
//!       │
//!   tool_loop()        : chat → execute calls → feed answers back, until plain text
//!   tool_loop_stream() : same, forwarding each partial to a PartialSink
//! ```
//!
//! Calls within a round run strictly one after another, and rounds are
//! bounded by [`ToolLoopConfig::max_rounds`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbridge::tool::{ToolRegistry, tool_fn, ToolLoopConfig, tool_loop};
//! use chatbridge::{JsonSchema, Message, ToolDefinition};
//! use serde_json::json;
//!
//! # async fn example(provider: &dyn chatbridge::DynProvider) -> Result<(), chatbridge::LlmError> {
//! let mut registry = ToolRegistry::new();
//! registry.register(tool_fn(
//!     ToolDefinition {
//!         name: "get_weather".into(),
//!         description: "Current weather for a city".into(),
//!         parameters: JsonSchema::new(json!({
//!             "type": "object",
//!             "properties": { "location": { "type": "string" } },
//!             "required": ["location"]
//!         })),
//!     },
//!     |_arguments: String| async move { Ok("18C, clear".to_string()) },
//! ));
//!
//! let mut working = vec![Message::system("Be brief."), Message::user("Weather in Paris?")];
//! let outcome = tool_loop(provider, &registry, "gpt-4o", &mut working, ToolLoopConfig::default()).await?;
//! println!("Final answer: {}", outcome.message.text());
//! # Ok(())
//! # }
//! ```

pub mod builtin;
mod config;
mod error;
mod execution;
mod handler;
mod helpers;
mod loop_stream;
mod loop_sync;
mod registry;

pub use config::{DEFAULT_MAX_ROUNDS, LoopOutcome, ToolLoopConfig};
pub use error::ToolError;
pub use handler::{FnToolHandler, ToolHandler};
pub use helpers::tool_fn;
pub use loop_stream::tool_loop_stream;
pub use loop_sync::tool_loop;
pub use registry::ToolRegistry;
