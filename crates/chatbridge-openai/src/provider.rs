//! OpenAI-compatible `Provider` implementation.

use chatbridge::chat::Message;
use chatbridge::error::LlmError;
use chatbridge::provider::{ChatParams, Provider};
use chatbridge::stream::ChatStream;
use tracing::{debug, instrument};

use crate::config::OpenAiConfig;
use crate::convert;
use crate::types::{ModelList, Response};

/// A Chat Completions provider for OpenAI, Groq or Mistral.
///
/// The [`Flavor`](crate::Flavor) in the config decides the provider
/// name and request quirks; the wire protocol is shared.
///
/// # Example
///
/// ```rust,no_run
/// use chatbridge_openai::{OpenAiConfig, OpenAiProvider};
/// use chatbridge::{ChatParams, Message, Provider};
///
/// # async fn example() -> Result<(), chatbridge::LlmError> {
/// let provider = OpenAiProvider::new(OpenAiConfig {
///     api_key: "sk-...".into(),
///     ..Default::default()
/// })?;
///
/// let reply = provider.chat(&ChatParams {
///     messages: vec![Message::user("Hello!")],
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new provider from configuration.
    ///
    /// If `config.client` is `Some`, that client is reused for connection
    /// pooling. Otherwise a new client is built with the configured timeout.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = match &config.client {
            Some(client) => client.clone(),
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| LlmError::Config(format!("{}: {e}", config.flavor.name())))?
            }
        };
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/v1{path}")
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(convert::convert_error(status, &body));
        }
        Ok(response)
    }

    async fn post_chat(&self, params: &ChatParams, stream: bool) -> Result<reqwest::Response, LlmError> {
        let model = self.default_model(&params.model);
        let body = convert::build_request(params, &model, self.config.flavor, stream);
        debug!(
            provider = self.config.flavor.name(),
            %model,
            messages = body.messages.len(),
            tools = params.tools.len(),
            stream,
            "chat completions request"
        );
        self.send(self.client.post(self.url("/chat/completions")).json(&body))
            .await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, LlmError> {
    response
        .text()
        .await
        .map_err(|e| LlmError::decode(format!("failed to read response body: {e}"), ""))
}

impl Provider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        self.config.flavor.name()
    }

    fn configured_model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat(&self, params: &ChatParams) -> Result<Message, LlmError> {
        let response = self.post_chat(params, false).await?;
        let body = read_body(response).await?;
        let parsed: Response = serde_json::from_str(&body).map_err(|e| {
            LlmError::decode(format!("failed to parse chat completion: {e}"), body.as_str())
        })?;
        convert::convert_response(parsed, &body)
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat_stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        let response = self.post_chat(params, true).await?;
        Ok(crate::stream::into_stream(response))
    }

    #[instrument(skip_all)]
    async fn models(&self) -> Result<Vec<String>, LlmError> {
        let response = self.send(self.client.get(self.url("/models"))).await?;
        let body = read_body(response).await?;
        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| LlmError::decode(format!("failed to parse model list: {e}"), body.as_str()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flavor;

    #[test]
    fn test_url_appends_v1() {
        let provider = OpenAiProvider::new(OpenAiConfig::default()).unwrap();
        assert_eq!(
            provider.url("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_url_for_groq() {
        let provider = OpenAiProvider::new(OpenAiConfig::for_flavor(Flavor::Groq)).unwrap();
        assert_eq!(
            provider.url("/models"),
            "https://api.groq.com/openai/v1/models"
        );
    }

    #[test]
    fn test_provider_name_follows_flavor() {
        let provider = OpenAiProvider::new(OpenAiConfig::for_flavor(Flavor::Mistral)).unwrap();
        assert_eq!(provider.provider_name(), "mistral");
        assert_eq!(provider.default_model(""), "ministral-3b-latest");
        assert_eq!(provider.default_model("mistral-large-latest"), "mistral-large-latest");
    }
}
