//! Factory for building Gemini providers from configuration.

use std::sync::Arc;

use chatbridge::factory::{ProviderFactory, ProviderSettings};
use chatbridge::{DynProvider, LlmError};

use crate::{GeminiConfig, GeminiProvider};

/// Factory for creating [`GeminiProvider`] instances from configuration.
///
/// # Configuration
///
/// | Field | Required | Description |
/// |-------|----------|-------------|
/// | `api_key` | Yes | Google AI Studio API key |
/// | `model` | No | Default model (default: `models/gemini-1.5-flash`) |
/// | `base_url` | No | Custom API endpoint |
/// | `timeout_secs` | No | Request timeout (default: 120) |
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiFactory;

impl ProviderFactory for GeminiFactory {
    fn name(&self) -> &str {
        "gemini"
    }

    fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn DynProvider>, LlmError> {
        let mut config = GeminiConfig {
            api_key: settings.require_api_key("gemini")?.to_string(),
            ..Default::default()
        };
        if let Some(model) = &settings.model {
            config.model.clone_from(model);
        }
        if let Some(base_url) = &settings.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(timeout) = settings.timeout() {
            config.timeout = Some(timeout);
        }
        Ok(Arc::new(GeminiProvider::new(config)?))
    }
}
