//! Google Gemini adapter for chatbridge.
//!
//! Implements [`Provider`](chatbridge::Provider) against the Generative
//! Language API (`v1beta`). Requests authenticate with the `key` query
//! parameter. Streaming uses `:streamGenerateContent`, which answers
//! with one JSON array whose elements arrive over time; see
//! [`ArrayDecoder`](chatbridge::codec::array::ArrayDecoder).
//!
//! Gemini has no tool-call ids. The adapter synthesizes
//! `call_{name}_{index}` ids on the way in and matches tool results back
//! by function name on the way out.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chatbridge_gemini::{GeminiConfig, GeminiProvider};
//! use chatbridge::{ChatParams, Message, Provider};
//!
//! # async fn example() -> Result<(), chatbridge::LlmError> {
//! let provider = GeminiProvider::new(GeminiConfig {
//!     api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!     ..Default::default()
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
mod types;

pub use config::GeminiConfig;
pub use factory::GeminiFactory;
pub use provider::GeminiProvider;
