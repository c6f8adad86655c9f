//! Factories for building OpenAI-compatible providers from configuration.

use std::sync::Arc;

use chatbridge::factory::{ProviderFactory, ProviderSettings};
use chatbridge::{DynProvider, LlmError};

use crate::{Flavor, OpenAiConfig, OpenAiProvider};

/// Factory for one OpenAI-compatible vendor.
///
/// Register one factory per flavor; each answers to the flavor's name.
///
/// # Configuration
///
/// | Field | Required | Description |
/// |-------|----------|-------------|
/// | `api_key` | Yes | Vendor API key |
/// | `model` | No | Default model (flavor-specific) |
/// | `base_url` | No | Custom API root |
/// | `timeout_secs` | No | Request timeout (default: 120) |
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiFactory {
    flavor: Flavor,
}

impl OpenAiFactory {
    /// Factory for OpenAI.
    pub fn openai() -> Self {
        Self {
            flavor: Flavor::OpenAi,
        }
    }

    /// Factory for Groq.
    pub fn groq() -> Self {
        Self {
            flavor: Flavor::Groq,
        }
    }

    /// Factory for Mistral.
    pub fn mistral() -> Self {
        Self {
            flavor: Flavor::Mistral,
        }
    }
}

impl ProviderFactory for OpenAiFactory {
    fn name(&self) -> &str {
        self.flavor.name()
    }

    fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn DynProvider>, LlmError> {
        let mut config = OpenAiConfig {
            api_key: settings.require_api_key(self.flavor.name())?.to_string(),
            ..OpenAiConfig::for_flavor(self.flavor)
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
        Ok(Arc::new(OpenAiProvider::new(config)?))
    }
}
