//! Speech-to-text over the `audio/transcriptions` endpoint.

use chatbridge::config::BridgeConfig;
use chatbridge::error::LlmError;
use chatbridge::speech::{SpeechFuture, SpeechToText};
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use crate::config::{Flavor, OpenAiConfig};
use crate::convert;
use crate::types::Transcription;

/// File name sent with the audio; Telegram voice notes are OGG/Opus.
const AUDIO_FILE_NAME: &str = "audio.ogg";

/// Transcribes voice notes with a Whisper-style model.
///
/// Groq's `whisper-large-v3-turbo` is the usual choice; OpenAI and
/// Mistral serve the same multipart endpoint.
///
/// ```rust,no_run
/// use chatbridge_openai::{Flavor, OpenAiConfig, OpenAiTranscriber};
///
/// # async fn example(audio: Vec<u8>) -> Result<(), chatbridge::LlmError> {
/// let transcriber = OpenAiTranscriber::new(OpenAiConfig {
///     api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
///     ..OpenAiConfig::transcription(Flavor::Groq)
/// })?;
/// let text = transcriber.transcribe_audio(&audio).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenAiTranscriber {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    /// Creates a transcriber. `config.model` names the speech model.
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

    /// Builds the transcriber named by `[speech]`, with the credentials of
    /// `providers.<speech.provider>`. Returns `None` when voice notes are
    /// disabled.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] when the vendor has no transcription endpoint
    /// or no API key.
    pub fn from_config(config: &BridgeConfig) -> Result<Option<Self>, LlmError> {
        if !config.speech.enabled() {
            return Ok(None);
        }
        let name = config.speech.provider.as_str();
        let flavor = Flavor::from_name(name).ok_or_else(|| {
            LlmError::Config(format!("speech: provider {name:?} cannot transcribe audio"))
        })?;
        let settings = config.speech_provider().cloned().unwrap_or_default();

        let mut transcription = OpenAiConfig {
            api_key: settings.require_api_key(name)?.to_string(),
            ..OpenAiConfig::transcription(flavor)
        };
        if !config.speech.model.is_empty() {
            transcription.model.clone_from(&config.speech.model);
        }
        if let Some(base_url) = &settings.base_url {
            transcription.base_url.clone_from(base_url);
        }
        if let Some(timeout) = settings.timeout() {
            transcription.timeout = Some(timeout);
        }
        Self::new(transcription).map(Some)
    }

    /// The speech model in use.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/v1/audio/transcriptions")
    }

    /// Uploads `audio` and returns the recognized text.
    ///
    /// # Errors
    ///
    /// Transport failures as [`LlmError::from_reqwest`], non-success
    /// statuses as [`LlmError::Upstream`], and unreadable bodies as
    /// [`LlmError::Decode`].
    #[instrument(skip_all, fields(provider = self.config.flavor.name(), model = %self.config.model, bytes = audio.len()))]
    pub async fn transcribe_audio(&self, audio: &[u8]) -> Result<String, LlmError> {
        let form = Form::new()
            .part("file", Part::bytes(audio.to_vec()).file_name(AUDIO_FILE_NAME))
            .text("model", self.config.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::decode(format!("failed to read response body: {e}"), ""))?;
        if !status.is_success() {
            return Err(convert::convert_error(status, &body));
        }

        let parsed: Transcription = serde_json::from_str(&body).map_err(|e| {
            LlmError::decode(format!("failed to parse transcription: {e}"), body.as_str())
        })?;
        debug!(chars = parsed.text.chars().count(), "transcribed");
        Ok(parsed.text)
    }
}

impl SpeechToText for OpenAiTranscriber {
    fn transcribe<'a>(&'a self, audio: &'a [u8]) -> SpeechFuture<'a> {
        Box::pin(self.transcribe_audio(audio))
    }
}
