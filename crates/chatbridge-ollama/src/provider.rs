//! Ollama `Provider` implementation.

use chatbridge::chat::Message;
use chatbridge::error::LlmError;
use chatbridge::provider::{ChatParams, Provider};
use chatbridge::stream::ChatStream;
use tracing::{debug, instrument};

use crate::config::OllamaConfig;
use crate::convert;
use crate::types::{Response, TagsResponse};

/// Ollama provider implementing [`Provider`].
///
/// Connects to a locally running Ollama instance. No authentication
/// is required by default.
///
/// # Example
///
/// ```rust,no_run
/// use chatbridge_ollama::{OllamaConfig, OllamaProvider};
/// use chatbridge::{ChatParams, Message, Provider};
///
/// # async fn example() -> Result<(), chatbridge::LlmError> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
///
/// let reply = provider.chat(&ChatParams {
///     messages: vec![Message::user("Hello!")],
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration.
    ///
    /// If `config.client` is `Some`, that client is reused for connection
    /// pooling. Otherwise a new client is built with the configured timeout.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = match &config.client {
            Some(client) => client.clone(),
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| LlmError::Config(format!("ollama: {e}")))?
            }
        };
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}{path}")
    }

    /// Send a request and return the response if its status is a success.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let request = match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        let response = request
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
        let body = convert::build_request(params, &model, stream);
        debug!(%model, messages = body.messages.len(), stream, "ollama chat request");
        self.send(self.client.post(self.url("/api/chat")).json(&body))
            .await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, LlmError> {
    response
        .text()
        .await
        .map_err(|e| LlmError::decode(format!("failed to read Ollama response body: {e}"), ""))
}

impl Provider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn configured_model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat(&self, params: &ChatParams) -> Result<Message, LlmError> {
        let response = self.post_chat(params, false).await?;
        let body = read_body(response).await?;
        let parsed: Response = serde_json::from_str(&body)
            .map_err(|e| LlmError::decode(format!("failed to parse Ollama response: {e}"), body.as_str()))?;
        convert::convert_response(parsed, &body)
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat_stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        let response = self.post_chat(params, true).await?;
        Ok(crate::stream::into_stream(response))
    }

    #[instrument(skip_all)]
    async fn models(&self) -> Result<Vec<String>, LlmError> {
        let response = self.send(self.client.get(self.url("/api/tags"))).await?;
        let body = read_body(response).await?;
        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::decode(format!("failed to parse Ollama tags: {e}"), body.as_str()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
