//! OpenAI-compatible provider configuration.

use std::time::Duration;

/// Which OpenAI-compatible vendor a provider talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    /// OpenAI.
    #[default]
    OpenAi,
    /// Groq.
    Groq,
    /// Mistral.
    Mistral,
}

impl Flavor {
    /// The provider name used in configuration and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
        }
    }

    /// The flavor answering to `name`, as used in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(Self::OpenAi),
            "groq" => Some(Self::Groq),
            "mistral" => Some(Self::Mistral),
            _ => None,
        }
    }

    /// The vendor's API root, without the `/v1` segment.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Groq => "https://api.groq.com/openai",
            Self::Mistral => "https://api.mistral.ai",
        }
    }

    /// The model used when neither the request nor the config names one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Groq => "llama-3.2-1b-preview",
            Self::Mistral => "ministral-3b-latest",
        }
    }

    /// The speech-to-text model used when the config names none.
    pub fn default_transcription_model(self) -> &'static str {
        match self {
            Self::OpenAi => "whisper-1",
            Self::Groq => "whisper-large-v3-turbo",
            Self::Mistral => "voxtral-mini-latest",
        }
    }

    /// Groq and Mistral want `tool_choice: "auto"` next to the tools.
    pub(crate) fn sends_tool_choice(self) -> bool {
        matches!(self, Self::Groq | Self::Mistral)
    }
}

/// Configuration for an OpenAI-compatible provider.
///
/// Use struct update syntax with [`OpenAiConfig::for_flavor`] or
/// [`Default`] (the OpenAI flavor):
///
/// ```rust
/// use chatbridge_openai::{Flavor, OpenAiConfig};
///
/// let config = OpenAiConfig {
///     api_key: "sk-...".into(),
///     model: "gpt-4o-mini".into(),
///     ..Default::default()
/// };
/// assert_eq!(config.flavor, Flavor::OpenAi);
/// ```
#[derive(Clone)]
pub struct OpenAiConfig {
    /// The vendor.
    pub flavor: Flavor,
    /// API key, sent as a bearer token. Required.
    pub api_key: String,
    /// Model used when a request names none.
    pub model: String,
    /// API root. Override for proxies or local servers.
    pub base_url: String,
    /// Request timeout. `None` uses reqwest's default.
    pub timeout: Option<Duration>,
    /// Pre-configured HTTP client for connection pooling across providers.
    /// When `None`, a new client is created.
    pub client: Option<reqwest::Client>,
}

impl OpenAiConfig {
    /// The defaults of `flavor`, with an empty API key.
    pub fn for_flavor(flavor: Flavor) -> Self {
        Self {
            flavor,
            api_key: String::new(),
            model: flavor.default_model().into(),
            base_url: flavor.default_base_url().into(),
            timeout: Some(Duration::from_secs(120)),
            client: None,
        }
    }
}

impl OpenAiConfig {
    /// The defaults of `flavor` for speech-to-text: as
    /// [`for_flavor`](Self::for_flavor) with the transcription model.
    pub fn transcription(flavor: Flavor) -> Self {
        Self {
            model: flavor.default_transcription_model().into(),
            ..Self::for_flavor(flavor)
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("flavor", &self.flavor)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("client", &self.client.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::for_flavor(Flavor::OpenAi)
    }
}
