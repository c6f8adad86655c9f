//! Building providers from configuration.
//!
//! Each vendor crate exports a [`ProviderFactory`]. The application hands
//! the factories it links to [`build_providers`] together with the loaded
//! configuration and gets back the provider map the
//! [`Engine`](crate::engine::Engine) is constructed from. There is no
//! global registry.
//!
//! ```rust,ignore
//! use chatbridge::factory::{ProviderFactory, build_providers};
//!
//! let factories: Vec<Box<dyn ProviderFactory>> = vec![
//!     Box::new(chatbridge_ollama::OllamaFactory),
//!     Box::new(chatbridge_openai::OpenAiFactory::openai()),
//! ];
//! let providers = build_providers(&config, &factories)?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BridgeConfig;
use crate::error::LlmError;
use crate::provider::DynProvider;

/// Settings shared by every vendor adapter.
///
/// Unset fields fall back to the vendor's defaults.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key for authenticated vendors.
    pub api_key: Option<String>,
    /// Custom base URL of the vendor API.
    pub base_url: Option<String>,
    /// Default model when a turn names none.
    pub model: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderSettings {
    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The API key, or [`LlmError::Config`] naming `vendor` if it is unset
    /// or empty.
    pub fn require_api_key(&self, vendor: &str) -> Result<&str, LlmError> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(LlmError::Config(format!("{vendor}: api_key is required"))),
        }
    }
}

/// Builds one vendor's adapter from settings.
pub trait ProviderFactory: Send + Sync {
    /// The provider name used in configuration (e.g. `"ollama"`).
    fn name(&self) -> &str;

    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] when the settings are unusable (for example a
    /// missing API key).
    fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn DynProvider>, LlmError>;
}

/// Builds every configured provider.
///
/// A provider is built when it has a `[providers.<name>]` section or is the
/// active provider of `[bridge]`. Factories for other names are skipped.
///
/// # Errors
///
/// [`LlmError::UnknownProvider`] when a configured name has no factory,
/// or the first factory error.
pub fn build_providers(
    config: &BridgeConfig,
    factories: &[Box<dyn ProviderFactory>],
) -> Result<HashMap<String, Arc<dyn DynProvider>>, LlmError> {
    let by_name: HashMap<&str, &dyn ProviderFactory> =
        factories.iter().map(|f| (f.name(), f.as_ref())).collect();

    let mut wanted: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    if !wanted.contains(&config.bridge.provider.as_str()) {
        wanted.push(&config.bridge.provider);
    }

    let defaults = ProviderSettings::default();
    let mut providers = HashMap::with_capacity(wanted.len());
    for name in wanted {
        let factory = by_name
            .get(name)
            .ok_or_else(|| LlmError::UnknownProvider(name.to_string()))?;
        let settings = config.providers.get(name).unwrap_or(&defaults);
        debug!(provider = name, ?settings, "building provider");
        providers.insert(name.to_string(), factory.build(settings)?);
    }
    Ok(providers)
}
