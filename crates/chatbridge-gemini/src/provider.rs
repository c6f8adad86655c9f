//! Gemini `Provider` implementation.

use chatbridge::chat::Message;
use chatbridge::error::LlmError;
use chatbridge::provider::{ChatParams, Provider};
use chatbridge::stream::ChatStream;
use tracing::{debug, instrument};

use crate::config::GeminiConfig;
use crate::convert;
use crate::types::{ModelList, Response};

/// Name fragments of models hidden from the model list.
const HIDDEN_MODELS: &[&str] = &["1.0", "gemini-pro", "exp"];

/// Google Gemini provider implementing [`Provider`].
///
/// # Example
///
/// ```rust,no_run
/// use chatbridge_gemini::{GeminiConfig, GeminiProvider};
/// use chatbridge::{ChatParams, Message, Provider};
///
/// # async fn example() -> Result<(), chatbridge::LlmError> {
/// let provider = GeminiProvider::new(GeminiConfig {
///     api_key: "AIza...".into(),
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
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = match &config.client {
            Some(client) => client.clone(),
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| LlmError::Config(format!("gemini: {e}")))?
            }
        };
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/v1beta/{path}")
    }

    /// `{model}:{method}`, adding the `models/` prefix if it is missing.
    fn method_path(model: &str, method: &str) -> String {
        if model.contains('/') {
            format!("{model}:{method}")
        } else {
            format!("models/{model}:{method}")
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let response = request
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&e.without_url(), self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(convert::convert_error(status, &body));
        }
        Ok(response)
    }

    async fn post_generate(&self, params: &ChatParams, method: &str) -> Result<reqwest::Response, LlmError> {
        let model = self.default_model(&params.model);
        let body = convert::build_request(params);
        debug!(%model, contents = body.contents.len(), method, "gemini request");
        let url = self.url(&Self::method_path(&model, method));
        self.send(self.client.post(url).json(&body)).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, LlmError> {
    response
        .text()
        .await
        .map_err(|e| LlmError::decode(format!("failed to read Gemini response body: {}", e.without_url()), ""))
}

impl Provider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn configured_model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat(&self, params: &ChatParams) -> Result<Message, LlmError> {
        let response = self.post_generate(params, "generateContent").await?;
        let body = read_body(response).await?;
        let parsed: Response = serde_json::from_str(&body)
            .map_err(|e| LlmError::decode(format!("failed to parse Gemini response: {e}"), body.as_str()))?;
        convert::convert_response(parsed, &body)
    }

    #[instrument(skip_all, fields(model = %self.default_model(&params.model)))]
    async fn chat_stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        let response = self.post_generate(params, "streamGenerateContent").await?;
        Ok(crate::stream::into_stream(response))
    }

    #[instrument(skip_all)]
    async fn models(&self) -> Result<Vec<String>, LlmError> {
        let response = self.send(self.client.get(self.url("models"))).await?;
        let body = read_body(response).await?;
        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| LlmError::decode(format!("failed to parse Gemini models: {e}"), body.as_str()))?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| !HIDDEN_MODELS.iter().any(|hidden| m.name.contains(hidden)))
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| m.name)
            .collect())
    }
}
