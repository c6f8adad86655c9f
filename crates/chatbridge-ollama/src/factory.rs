//! Factory for building Ollama providers from configuration.

use std::sync::Arc;

use chatbridge::factory::{ProviderFactory, ProviderSettings};
use chatbridge::{DynProvider, LlmError};

use crate::{OllamaConfig, OllamaProvider};

/// Factory for creating [`OllamaProvider`] instances from configuration.
///
/// # Configuration
///
/// | Field | Required | Description |
/// |-------|----------|-------------|
/// | `api_key` | No | Only for instances behind an authenticating proxy |
/// | `model` | No | Default model (default: `qwen2.5:1.5b-instruct`) |
/// | `base_url` | No | Custom API endpoint (default: `http://localhost:11434`) |
/// | `timeout_secs` | No | Request timeout (default: 120) |
#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaFactory;

impl ProviderFactory for OllamaFactory {
    fn name(&self) -> &str {
        "ollama"
    }

    fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn DynProvider>, LlmError> {
        let mut config = OllamaConfig {
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
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
        Ok(Arc::new(OllamaProvider::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_name() {
        assert_eq!(OllamaFactory.name(), "ollama");
    }

    #[test]
    fn test_factory_build_with_overrides() {
        let settings = ProviderSettings::default()
            .model("llama3.2")
            .base_url("http://remote:11434");
        let provider = OllamaFactory.build(&settings).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.default_model(""), "llama3.2");
    }

    #[test]
    fn test_factory_no_api_key_required() {
        let provider = OllamaFactory.build(&ProviderSettings::default()).unwrap();
        assert_eq!(provider.default_model(""), "qwen2.5:1.5b-instruct");
        assert_eq!(provider.default_model("mistral"), "mistral");
    }
}
