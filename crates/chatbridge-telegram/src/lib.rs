//! Telegram Bot API transport for chatbridge.
//!
//! [`TelegramTransport`] implements
//! [`ChatTransport`](chatbridge::delivery::ChatTransport): it posts
//! `sendMessage`, `editMessageText` and `sendChatAction` calls and maps
//! the Bot API's `{ok, result, error_code, description}` envelope onto
//! [`TransportError`](chatbridge::delivery::TransportError).
//!
//! Receiving updates (webhooks or long polling) is the host
//! application's job. It deserializes each one into an [`Update`] and
//! hands it to [`TelegramBot::handle_update`], which downloads photos and
//! voice notes with `getFile` and runs the turn through a
//! [`chatbridge::Session`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatbridge_telegram::{TelegramConfig, TelegramTransport};
//!
//! # fn example() -> Result<(), chatbridge::LlmError> {
//! let transport = Arc::new(TelegramTransport::new(TelegramConfig {
//!     bot_token: std::env::var("BOT_TOKEN").unwrap_or_default(),
//!     ..Default::default()
//! })?);
//! # let _ = transport;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod bot;
mod config;
mod transport;
mod types;

pub use bot::{TelegramBot, incoming_from};
pub use config::TelegramConfig;
pub use transport::TelegramTransport;
pub use types::{Chat, Document, FileRef, InboundMessage, Update, User};
