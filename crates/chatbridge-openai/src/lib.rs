//! OpenAI-compatible adapter for chatbridge.
//!
//! One implementation of [`Provider`](chatbridge::Provider) serves every
//! vendor that speaks the Chat Completions dialect. The [`Flavor`] picks
//! the vendor's name, base URL, default model and small request
//! differences:
//!
//! | Flavor | Name | Base URL | Default model |
//! |--------|------|----------|---------------|
//! | [`Flavor::OpenAi`] | `openai` | `https://api.openai.com` | `gpt-4o` |
//! | [`Flavor::Groq`] | `groq` | `https://api.groq.com/openai` | `llama-3.2-1b-preview` |
//! | [`Flavor::Mistral`] | `mistral` | `https://api.mistral.ai` | `ministral-3b-latest` |
//!
//! Streaming uses server-sent events terminated by `data: [DONE]`.
//! Tool-call arguments arrive in fragments keyed by index and are
//! reassembled before the calls are surfaced.
//!
//! [`OpenAiTranscriber`] turns voice notes into text through the same
//! vendors' `audio/transcriptions` endpoint.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chatbridge_openai::{Flavor, OpenAiConfig, OpenAiProvider};
//! use chatbridge::{ChatParams, Message, Provider};
//!
//! # async fn example() -> Result<(), chatbridge::LlmError> {
//! let provider = OpenAiProvider::new(OpenAiConfig {
//!     api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
//!     ..OpenAiConfig::for_flavor(Flavor::Groq)
//! })?;
//!
//! let reply = provider
//!     .chat(&ChatParams {
//!         messages: vec![Message::user("Hello!")],
//!         ..Default::default()
//!     })
//!     .await?;
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
mod transcribe;
mod types;

pub use config::{Flavor, OpenAiConfig};
pub use factory::OpenAiFactory;
pub use provider::OpenAiProvider;
pub use transcribe::OpenAiTranscriber;
