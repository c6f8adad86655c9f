//! Ollama adapter for chatbridge.
//!
//! This crate implements [`Provider`](chatbridge::Provider) for Ollama's
//! Chat API, covering non-streaming and streaming chat with tool calling,
//! and the model catalog from `/api/tags`.
//!
//! Ollama runs locally and requires no authentication by default.
//! Streaming bodies are newline-delimited JSON; the last object carries
//! `done: true`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chatbridge_ollama::{OllamaConfig, OllamaProvider};
//! use chatbridge::{ChatParams, Message, Provider};
//!
//! # async fn example() -> Result<(), chatbridge::LlmError> {
//! let provider = OllamaProvider::new(OllamaConfig::default())?;
//!
//! let params = ChatParams {
//!     messages: vec![Message::user("Hello!")],
//!     ..Default::default()
//! };
//!
//! let reply = provider.chat(&params).await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod convert;
mod factory;
mod provider;
mod stream;
mod types;

pub use config::OllamaConfig;
pub use factory::OllamaFactory;
pub use provider::OllamaProvider;
