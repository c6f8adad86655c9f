//! Ollama provider configuration.

use std::time::Duration;

/// Configuration for the Ollama provider.
///
/// Use struct update syntax with [`Default`] for ergonomic construction:
///
/// ```rust
/// use chatbridge_ollama::OllamaConfig;
///
/// let config = OllamaConfig {
///     model: "llama3.2".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct OllamaConfig {
    /// Model used when a request names none.
    pub model: String,
    /// Base URL for the Ollama API. Defaults to `http://localhost:11434`.
    pub base_url: String,
    /// Bearer token for an Ollama instance behind an authenticating proxy.
    pub api_key: Option<String>,
    /// Request timeout. `None` uses reqwest's default.
    pub timeout: Option<Duration>,
    /// Pre-configured HTTP client for connection pooling.
    /// When `None`, a new client is created.
    pub client: Option<reqwest::Client>,
}

impl std::fmt::Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:1.5b-instruct".into(),
            base_url: "http://localhost:11434".into(),
            api_key: None,
            timeout: Some(Duration::from_secs(120)),
            client: None,
        }
    }
}
