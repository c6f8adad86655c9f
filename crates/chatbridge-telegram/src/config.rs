//! Telegram transport configuration.

use std::time::Duration;

use chatbridge::config::TelegramSection;

/// Configuration for [`TelegramTransport`](crate::TelegramTransport).
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Bot API base URL. Override for a local Bot API server or tests.
    pub base_url: String,
    /// Request timeout. `None` uses reqwest's default.
    pub timeout: Option<Duration>,
    /// Pre-configured HTTP client. When `None`, a new client is created.
    pub client: Option<reqwest::Client>,
}

impl TelegramConfig {
    /// Settings from the `[telegram]` section of the bridge config.
    pub fn from_section(section: &TelegramSection) -> Self {
        Self {
            bot_token: section.bot_token.clone(),
            base_url: section.base_url.clone(),
            ..Default::default()
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            base_url: "https://api.telegram.org".into(),
            timeout: Some(Duration::from_secs(30)),
            client: None,
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"****")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
