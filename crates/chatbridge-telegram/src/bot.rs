//! Inbound updates: from a Bot API [`Update`] to a session turn.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chatbridge::config::BridgeConfig;
use chatbridge::delivery::{ChatTransport, TransportError};
use chatbridge::factory::ProviderFactory;
use chatbridge::speech::SpeechToText;
use chatbridge::store::ConversationStore;
use chatbridge::tool::ToolRegistry;
use chatbridge::{Engine, Incoming, LlmError, Session, SessionSettings, logging};
use tracing::{debug, instrument, warn};

use crate::config::TelegramConfig;
use crate::transport::TelegramTransport;
use crate::types::{InboundMessage, Update};

const ATTACHMENT_FAILED: &str = "Sorry, I could not download that file from Telegram.";

/// Turns Telegram updates into session turns.
///
/// Photos (and documents with an image MIME type) are downloaded and
/// attached base64-encoded; voice notes and audio files are downloaded
/// and handed to the session for transcription.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use chatbridge::config::BridgeConfig;
/// use chatbridge::store::MemoryStore;
/// use chatbridge::tool::{ToolRegistry, builtin};
/// use chatbridge_telegram::{TelegramBot, Update};
///
/// # async fn example(
/// #     config: BridgeConfig,
/// #     factories: Vec<Box<dyn chatbridge::factory::ProviderFactory>>,
/// #     update: Update,
/// # ) -> Result<(), chatbridge::LlmError> {
/// let mut tools = ToolRegistry::new();
/// tools.register(builtin::current_time());
/// let bot = TelegramBot::from_config(&config, &factories, tools, Arc::new(MemoryStore::new()))?;
/// bot.handle_update(update).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TelegramBot {
    transport: Arc<TelegramTransport>,
    session: Session,
}

impl TelegramBot {
    /// Wires a bot from a transport and a session that sends through it.
    pub fn new(transport: Arc<TelegramTransport>, session: Session) -> Self {
        Self { transport, session }
    }

    /// Builds everything from configuration: logging (with
    /// `logging.filter`), the transport from `[telegram]`, the engine's
    /// providers and limits, and the session defaults.
    ///
    /// # Errors
    ///
    /// [`LlmError::Config`] for an unusable transport or provider, and
    /// [`LlmError::UnknownProvider`] for a provider without a factory.
    pub fn from_config(
        config: &BridgeConfig,
        factories: &[Box<dyn ProviderFactory>],
        tools: ToolRegistry,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self, LlmError> {
        logging::init(&config.logging.filter);

        let transport = Arc::new(TelegramTransport::new(TelegramConfig::from_section(
            &config.telegram,
        ))?);
        let engine = Engine::from_config(config, factories, tools)?;
        debug!(providers = ?engine.provider_names(), "engine ready");

        let session = Session::new(
            Arc::new(engine),
            store,
            transport.clone(),
            SessionSettings::from_config(config),
        );
        Ok(Self::new(transport, session))
    }

    /// Enables voice notes.
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechToText>) -> Self {
        self.session = self.session.with_speech(speech);
        self
    }

    /// The session updates are handed to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handles one update. Updates without a message, or with nothing the
    /// bridge understands, are ignored.
    ///
    /// # Errors
    ///
    /// As [`Session::handle`]. A failed download is reported to the user
    /// and is not an error.
    #[instrument(skip_all, fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: Update) -> Result<(), LlmError> {
        let Some(message) = update.message else {
            debug!("update carries no message");
            return Ok(());
        };
        match incoming_from(self.transport.as_ref(), &message).await {
            Ok(Some(incoming)) => self.session.handle(incoming).await,
            Ok(None) => {
                debug!(message_id = message.message_id, "nothing to answer");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "attachment download failed");
                if let Err(e) = self
                    .transport
                    .send_message(message.chat.id, Some(message.message_id), ATTACHMENT_FAILED, false)
                    .await
                {
                    warn!(error = %e, "could not report the failed download");
                }
                Ok(())
            }
        }
    }
}

/// Builds the session input for `message`, downloading its attachment
/// through `transport`.
///
/// Returns `None` for messages with no text, caption, image or audio
/// (stickers, locations...).
///
/// # Errors
///
/// The transport's error when the attachment cannot be fetched.
pub async fn incoming_from(
    transport: &dyn ChatTransport,
    message: &InboundMessage,
) -> Result<Option<Incoming>, TransportError> {
    let text = message
        .text
        .as_deref()
        .or(message.caption.as_deref())
        .unwrap_or_default()
        .to_string();
    let reply_context = message
        .reply_to_message
        .as_deref()
        .and_then(|m| m.text.as_deref().or(m.caption.as_deref()))
        .map(str::to_string);

    let mut incoming = Incoming {
        user_id: message.from.as_ref().map_or(message.chat.id, |u| u.id),
        chat_id: message.chat.id,
        message_id: message.message_id,
        text,
        reply_context,
        ..Default::default()
    };

    if let Some(file_id) = image_file_id(message) {
        let bytes = transport.fetch_file(file_id).await?;
        incoming.images.push(BASE64.encode(bytes));
    } else if let Some(audio) = message.voice.as_ref().or(message.audio.as_ref()) {
        incoming.voice = Some(transport.fetch_file(&audio.file_id).await?);
    }

    if incoming.text.is_empty() && incoming.images.is_empty() && incoming.voice.is_none() {
        return Ok(None);
    }
    Ok(Some(incoming))
}

/// The largest photo size, else a document sent with an image MIME type.
fn image_file_id(message: &InboundMessage) -> Option<&str> {
    if let Some(largest) = message.photo.last() {
        return Some(&largest.file_id);
    }
    message
        .document
        .as_ref()
        .filter(|d| d.mime_type.as_deref().is_some_and(|m| m.starts_with("image/")))
        .map(|d| d.file_id.as_str())
}
