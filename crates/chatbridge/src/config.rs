//! Bridge configuration, loaded from TOML and the environment.
//!
//! ```toml
//! [bridge]
//! provider = "openai"
//! streaming = true
//!
//! [providers.openai]
//! api_key = "sk-..."
//! model = "gpt-4o"
//!
//! [telegram]
//! bot_token = "123:abc"
//! ```
//!
//! Every section is optional. Environment variables override the file;
//! see [`BridgeConfig::apply_env`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::DEFAULT_WINDOW;
use crate::delivery::DeliveryConfig;
use crate::factory::ProviderSettings;
use crate::tool::DEFAULT_MAX_ROUNDS;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`BridgeConfig`].
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Turn behaviour.
    #[serde(default)]
    pub bridge: BridgeSection,

    /// Delivery adapter tunables.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Per-vendor settings, keyed by provider name.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,

    /// Telegram transport.
    #[serde(default)]
    pub telegram: TelegramSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Voice-note transcription.
    #[serde(default)]
    pub speech: SpeechSection,
}

/// The `[bridge]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Active provider name.
    pub provider: String,
    /// Model override; empty means the provider's default.
    pub model: String,
    /// System prompt for users who have not set their own.
    pub system_prompt: String,
    /// Stream answers by editing a placeholder message.
    pub streaming: bool,
    /// Messages kept after the system message.
    pub context_window: usize,
    /// Tool rounds allowed per turn.
    pub max_tool_rounds: u32,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            model: String::new(),
            system_prompt: default_system_prompt(),
            streaming: false,
            context_window: DEFAULT_WINDOW,
            max_tool_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

fn default_system_prompt() -> String {
    "You are a helpful assistant living in Telegram. Answer using Telegram markdown.".into()
}

/// The `[telegram]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Bot API token.
    pub bot_token: String,
    /// Bot API base URL.
    pub base_url: String,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            base_url: "https://api.telegram.org".into(),
        }
    }
}

impl std::fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSection")
            .field("bot_token", &"****")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

/// The `[speech]` section.
///
/// Transcription reuses the credentials of `providers.<provider>`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    /// Transcription vendor; empty disables voice notes.
    pub provider: String,
    /// Transcription model; empty means the vendor's default.
    pub model: String,
}

impl SpeechSection {
    /// Whether voice notes are transcribed.
    pub fn enabled(&self) -> bool {
        !self.provider.is_empty()
    }
}

impl BridgeConfig {
    /// Loads the file at `path`, applies environment overrides and
    /// validates the result.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: BridgeConfig = toml::from_str(&content)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML string and validates it. The environment is not read.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    ///
    /// | Variable | Overrides |
    /// |---|---|
    /// | `LLM_PROVIDER_NAME` | `bridge.provider` |
    /// | `LLM_PROVIDER_BASE_URL` | `providers.<active>.base_url` |
    /// | `LLM_PROVIDER_API_KEY` | `providers.<active>.api_key` |
    /// | `LLM_MODEL` | `bridge.model` |
    /// | `STREAM_RESPONSE` | `bridge.streaming` |
    /// | `BOT_TOKEN` | `telegram.bot_token` |
    /// | `SPEECH_PROVIDER` | `speech.provider` |
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// [`apply_env`](Self::apply_env) with an explicit variable lookup.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(name) = get("LLM_PROVIDER_NAME") {
            self.bridge.provider = name;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.bridge.model = model;
        }
        if let Some(raw) = get("STREAM_RESPONSE") {
            self.bridge.streaming = parse_bool(&raw).ok_or_else(|| {
                ConfigError::Validation(format!("STREAM_RESPONSE must be a boolean, got {raw:?}"))
            })?;
        }
        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(provider) = get("SPEECH_PROVIDER") {
            self.speech.provider = provider;
        }

        let base_url = get("LLM_PROVIDER_BASE_URL");
        let api_key = get("LLM_PROVIDER_API_KEY");
        if base_url.is_some() || api_key.is_some() {
            let settings = self.providers.entry(self.bridge.provider.clone()).or_default();
            if base_url.is_some() {
                settings.base_url = base_url;
            }
            if api_key.is_some() {
                settings.api_key = api_key;
            }
        }
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.provider.is_empty() {
            return Err(ConfigError::Validation(
                "bridge.provider must not be empty".to_string(),
            ));
        }
        if self.delivery.max_len == 0 {
            return Err(ConfigError::Validation(
                "delivery.max_len must be non-zero".to_string(),
            ));
        }
        if self.delivery.limit_margin >= self.delivery.max_len {
            return Err(ConfigError::Validation(format!(
                "delivery.limit_margin ({}) must be below delivery.max_len ({})",
                self.delivery.limit_margin, self.delivery.max_len
            )));
        }
        if self.delivery.edit_threshold == 0 {
            return Err(ConfigError::Validation(
                "delivery.edit_threshold must be non-zero".to_string(),
            ));
        }
        for (name, settings) in &self.providers {
            if let Some(url) = &settings.base_url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Validation(format!(
                        "providers.{name}.base_url must be an http(s) URL, got {url:?}"
                    )));
                }
            }
            if settings.timeout_secs == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "providers.{name}.timeout_secs must be non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Settings of the transcription vendor, if it has a section.
    pub fn speech_provider(&self) -> Option<&ProviderSettings> {
        self.providers.get(&self.speech.provider)
    }

    /// Settings of the active provider, if it has a section.
    pub fn active_provider(&self) -> Option<&ProviderSettings> {
        self.providers.get(&self.bridge.provider)
    }
}

/// Accepts the spellings `1 t T TRUE true True` and their `false` twins.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
