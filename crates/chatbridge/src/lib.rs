//! # chatbridge
//!
//! The core of a chat bridge between Telegram and large language models.
//!
//! This crate holds everything that does not depend on a particular LLM
//! vendor or on the Telegram wire format: the message model, the
//! [`Provider`] contract, the tool-calling loop, stream codecs, the turn
//! engine, conversation storage, and the delivery of answers to a chat.
//! Vendor adapters live in sibling crates and implement [`Provider`].
//!
//! # Provider Crates
//!
//! | Crate | Vendor | Stream framing |
//! |-------|--------|----------------|
//! | `chatbridge-openai` | OpenAI, Groq, Mistral | SSE |
//! | `chatbridge-ollama` | Ollama (local) | NDJSON |
//! | `chatbridge-gemini` | Google Gemini | JSON array |
//!
//! `chatbridge-telegram` implements [`delivery::ChatTransport`] against
//! the Telegram Bot API.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   ┌─────────────────────┐
//!  │   -openai    │ │   -ollama    │ │   -gemini    │   │ chatbridge-telegram │
//!  └──────┬───────┘ └──────┬───────┘ └──────┬───────┘   └──────────┬──────────┘
//!         └────────────────┼────────────────┘                      │
//!                          ▼                                       ▼
//!        ┌────────────────────────────────────────────────────────────────┐
//!        │                          chatbridge                            │
//!        │  Provider · tool loop · Engine · Session · Delivery · Store    │
//!        └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chatbridge::{ChatParams, Message, Provider};
//!
//! # async fn example(provider: impl Provider) -> Result<(), chatbridge::LlmError> {
//! let params = ChatParams {
//!     model: String::new(),
//!     messages: vec![Message::user("Explain ownership in Rust")],
//!     tools: Vec::new(),
//! };
//!
//! let reply = provider.chat(&params).await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chat`] | Messages, content parts and tool calls |
//! | [`codec`] | SSE, NDJSON and JSON-array stream decoding |
//! | [`config`] | TOML configuration with environment overrides |
//! | [`context`] | Sliding context window over the history |
//! | [`delivery`] | Chunking, watermarking and streamed message edits |
//! | [`engine`] | One conversational turn, end to end |
//! | [`error`] | The unified [`LlmError`] |
//! | [`factory`] | Building providers from configuration |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`provider`] | The [`Provider`] trait and request parameters |
//! | [`session`] | Chat commands and per-user turn orchestration |
//! | [`speech`] | Transcription of voice messages |
//! | [`store`] | Conversation history and profile persistence |
//! | [`stream`] | [`StreamEvent`], [`ChatStream`] and the partial sink |
//! | [`tool`] | Tool registry and the tool-calling loop |

#![warn(missing_docs)]

pub mod chat;
pub mod codec;
pub mod config;
pub mod context;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod factory;
pub mod logging;
pub mod provider;
pub mod session;
pub mod speech;
pub mod store;
pub mod stream;
pub mod tool;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

// ── Core re-exports ────────────────────────────────────────────────
//
// Only the types that appear in nearly every program are re-exported
// at the crate root. Everything else lives in its submodule.

pub use chat::{Content, ContentPart, Message, Role, ToolCall};
pub use engine::{Engine, TurnOutcome, TurnRequest};
pub use error::LlmError;
pub use provider::{ChatParams, DynProvider, JsonSchema, Provider, ToolDefinition};
pub use session::{Incoming, Session, SessionSettings};
pub use stream::{ChatStream, StreamEvent};
pub use tool::{ToolHandler, ToolLoopConfig, ToolRegistry};
