//! Gemini provider configuration.

use std::time::Duration;

/// Configuration for the Gemini provider.
///
/// ```rust
/// use chatbridge_gemini::GeminiConfig;
///
/// let config = GeminiConfig {
///     api_key: "AIza...".into(),
///     model: "models/gemini-1.5-pro".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter. Required.
    pub api_key: String,
    /// Model used when a request names none. The `models/` prefix is
    /// optional.
    pub model: String,
    /// Base URL. Defaults to `https://generativelanguage.googleapis.com`.
    pub base_url: String,
    /// Request timeout. `None` uses reqwest's default.
    pub timeout: Option<Duration>,
    /// Pre-configured HTTP client for connection pooling.
    /// When `None`, a new client is created.
    pub client: Option<reqwest::Client>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "models/gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout: Some(Duration::from_secs(120)),
            client: None,
        }
    }
}
