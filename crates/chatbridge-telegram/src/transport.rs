//! [`ChatTransport`] over the Telegram Bot API.

use chatbridge::delivery::{ChatTransport, SentMessage, TransportError, TransportFuture};
use chatbridge::error::LlmError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::types::{self, ChatAction, EditMessage, Envelope, GetFile, SendMessage};

/// Telegram refuses an edit that would leave the text unchanged.
const NOT_MODIFIED: &str = "message is not modified";

/// Telegram Bot API transport.
///
/// Sends are plain `POST {base}/bot{token}/{method}` calls with a JSON
/// body. Attachments are resolved with `getFile` and downloaded from
/// `{base}/file/bot{token}/{file_path}`. Markdown is requested with `parse_mode: "markdown"`; when
/// Telegram rejects the markup, the error comes back as
/// [`TransportError::Rejected`] and the delivery layer retries as plain
/// text.
#[derive(Debug)]
pub struct TelegramTransport {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] if the token is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: TelegramConfig) -> Result<Self, LlmError> {
        if config.bot_token.is_empty() {
            return Err(LlmError::Config("telegram: bot_token is required".into()));
        }
        let client = match &config.client {
            Some(client) => client.clone(),
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| LlmError::Config(format!("telegram: {e}")))?
            }
        };
        Ok(Self { config, client })
    }

    fn url(&self, method: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/bot{}/{method}", self.config.bot_token)
    }

    fn file_url(&self, file_path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/file/bot{}/{file_path}", self.config.bot_token)
    }

    async fn download(&self, file_path: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                action: "fetch",
                code: i64::from(status.as_u16()),
                description,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Calls a Bot API method and unwraps the envelope.
    ///
    /// `action` names the operation in [`TransportError::Rejected`].
    async fn call<B, T>(&self, method: &str, action: &'static str, body: &B) -> Result<Option<T>, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // The token is part of the URL; reqwest errors must not carry it.
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.ok && status.is_success() => Ok(envelope.result),
            Ok(envelope) => Err(TransportError::Rejected {
                action,
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            }),
            Err(_) => Err(TransportError::Rejected {
                action,
                code: i64::from(status.as_u16()),
                description: raw,
            }),
        }
    }
}

impl ChatTransport for TelegramTransport {
    fn send_message<'a>(
        &'a self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, SentMessage> {
        Box::pin(async move {
            let body = SendMessage {
                chat_id,
                text,
                parse_mode: types::parse_mode(markdown),
                reply_to_message_id: reply_to,
            };
            let sent: Option<types::SentMessage> = self.call("sendMessage", "send", &body).await?;
            let message_id = sent
                .map(|m| m.message_id)
                .ok_or_else(|| TransportError::Network("sendMessage returned no message".into()))?;
            debug!(chat_id, message_id, "message sent");
            Ok(SentMessage { message_id })
        })
    }

    fn edit_message<'a>(
        &'a self,
        chat_id: i64,
        message_id: i64,
        text: &'a str,
        markdown: bool,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let body = EditMessage {
                chat_id,
                message_id,
                text,
                parse_mode: types::parse_mode(markdown),
            };
            match self
                .call::<_, serde_json::Value>("editMessageText", "edit", &body)
                .await
            {
                Ok(_) => Ok(()),
                Err(TransportError::Rejected { description, .. }) if description.contains(NOT_MODIFIED) => {
                    debug!(chat_id, message_id, "edit left text unchanged");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })
    }

    fn send_typing(&self, chat_id: i64) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let body = ChatAction {
                chat_id,
                action: "typing",
            };
            self.call::<_, serde_json::Value>("sendChatAction", "send", &body)
                .await
                .map(|_| ())
        })
    }

    fn fetch_file<'a>(&'a self, file_id: &'a str) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let file: Option<types::File> = self.call("getFile", "fetch", &GetFile { file_id }).await?;
            let file_path = file.and_then(|f| f.file_path).ok_or_else(|| TransportError::Rejected {
                action: "fetch",
                code: 400,
                description: format!("no download path for file {file_id}"),
            })?;
            let bytes = self.download(&file_path).await?;
            debug!(file_id, bytes = bytes.len(), "file downloaded");
            Ok(bytes)
        })
    }
}
