//! Turn orchestration around the collaborators.
//!
//! A [`Session`] takes one inbound chat message and carries it through:
//! chat commands, history and profile loading, the engine turn, delivery
//! of the answer, and persistence of the new history. It is shared by
//! all users; every call to [`Session::handle`] is independent.
//!
//! Voice notes are transcribed by the optional [`SpeechToText`]
//! collaborator first and then take the text path.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::chat::Message;
use crate::config::BridgeConfig;
use crate::delivery::{ChatTransport, Delivery, DeliveryConfig};
use crate::engine::{Engine, TurnOutcome, TurnRequest};
use crate::error::LlmError;
use crate::speech::SpeechToText;
use crate::store::{ConversationStore, UserProfile};

const IMAGE_PROMPT: &str = "Explain this image";
const VOICE_UNAVAILABLE: &str = "Voice messages are not supported by this bot.";
const VOICE_EMPTY: &str = "I could not make out any words in that voice message.";

/// Per-deployment defaults a session applies to every user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Provider every turn goes to.
    pub provider: String,
    /// Model for users who have not picked one; empty for the
    /// provider's default.
    pub model: String,
    /// System prompt for users who have not set one.
    pub system_prompt: String,
    /// Stream answers by editing a placeholder.
    pub streaming: bool,
    /// Delivery tunables.
    pub delivery: DeliveryConfig,
}

impl SessionSettings {
    /// Takes the `[bridge]` and `[delivery]` sections of `config`.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            provider: config.bridge.provider.clone(),
            model: config.bridge.model.clone(),
            system_prompt: config.bridge.system_prompt.clone(),
            streaming: config.bridge.streaming,
            delivery: config.delivery.clone(),
        }
    }
}

/// One inbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Incoming {
    /// Sender.
    pub user_id: i64,
    /// Chat to answer in.
    pub chat_id: i64,
    /// Id of the inbound message; the answer replies to it. Zero for none.
    pub message_id: i64,
    /// Message text or image caption.
    pub text: String,
    /// Base64-encoded images.
    pub images: Vec<String>,
    /// Text of the message being replied to, added as context.
    pub reply_context: Option<String>,
    /// Audio of a voice note, transcribed into `text` by [`Session::handle`].
    pub voice: Option<Vec<u8>>,
}

impl Incoming {
    fn to_message(&self) -> Message {
        let mut text = if self.text.is_empty() && !self.images.is_empty() {
            IMAGE_PROMPT.to_string()
        } else {
            self.text.clone()
        };
        if let Some(context) = self.reply_context.as_deref().filter(|c| !c.is_empty()) {
            text.push_str("\n\ncontext:\n");
            text.push_str(context);
        }
        self.images
            .iter()
            .fold(Message::user(text), |message, image| message.with_image(image.clone()))
    }
}

/// A chat command, parsed from text starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Start,
    About,
    System(&'a str),
    Reset,
    Models(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let body = text.strip_prefix('/')?;
        let (name, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
        let name = name.split('@').next().unwrap_or(name);
        let args = args.trim();
        Some(match name {
            "start" => Self::Start,
            "about" => Self::About,
            "system" => Self::System(args),
            "reset" => Self::Reset,
            "models" => Self::Models(args),
            other => Self::Unknown(other),
        })
    }
}

/// The chat-facing service.
pub struct Session {
    engine: Arc<Engine>,
    store: Arc<dyn ConversationStore>,
    transport: Arc<dyn ChatTransport>,
    speech: Option<Arc<dyn SpeechToText>>,
    settings: SessionSettings,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("speech", &self.speech)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wires a session from its collaborators.
    pub fn new(
        engine: Arc<Engine>,
        store: Arc<dyn ConversationStore>,
        transport: Arc<dyn ChatTransport>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            engine,
            store,
            transport,
            speech: None,
            settings,
        }
    }

    /// Enables voice messages, transcribed by `speech`.
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechToText>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// The session's defaults.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Handles one inbound message of any kind.
    ///
    /// A voice note is transcribed and its text replaces `incoming.text`
    /// (a caption, if any, is kept in front of it); everything then goes
    /// through [`handle_text`](Self::handle_text). Without a transcriber
    /// the user is told voice is unsupported.
    ///
    /// # Errors
    ///
    /// A failed transcription is reported to the user once and returned.
    /// Otherwise as [`handle_text`](Self::handle_text).
    #[instrument(skip_all, fields(user_id = incoming.user_id, chat_id = incoming.chat_id))]
    pub async fn handle(&self, mut incoming: Incoming) -> Result<(), LlmError> {
        let Some(audio) = incoming.voice.take() else {
            return self.handle_text(incoming).await;
        };
        let delivery = Delivery::new(self.transport.as_ref(), &self.settings.delivery, incoming.chat_id)
            .reply_to(incoming.message_id);

        let Some(speech) = &self.speech else {
            delivery.send_reply(VOICE_UNAVAILABLE).await;
            return Ok(());
        };
        let transcript = match speech.transcribe(&audio).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(error = %e, "transcription failed");
                delivery.send_error(&e).await;
                return Err(e);
            }
        };
        let transcript = transcript.trim();
        if transcript.is_empty() {
            delivery.send_reply(VOICE_EMPTY).await;
            return Ok(());
        }
        debug!(bytes = audio.len(), chars = transcript.chars().count(), "voice note transcribed");

        incoming.text = if incoming.text.is_empty() {
            transcript.to_string()
        } else {
            format!("{}\n\n{transcript}", incoming.text)
        };
        self.handle_text(incoming).await
    }

    /// Handles one inbound text message: a command, or a conversational turn.
    ///
    /// # Errors
    ///
    /// Returns the turn's error after the user has been sent exactly one
    /// error notification. The stored history is only replaced after a
    /// successful turn. A failure to save that history is returned too;
    /// the answer has already been delivered by then.
    #[instrument(skip_all, fields(user_id = incoming.user_id, chat_id = incoming.chat_id))]
    pub async fn handle_text(&self, incoming: Incoming) -> Result<(), LlmError> {
        let delivery = Delivery::new(self.transport.as_ref(), &self.settings.delivery, incoming.chat_id)
            .reply_to(incoming.message_id);

        if let Some(command) = Command::parse(&incoming.text) {
            let reply = self.run_command(incoming.user_id, command).await;
            delivery.send_reply(&reply).await;
            return Ok(());
        }

        let outcome = match self.turn(&incoming, delivery).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "turn failed");
                delivery.send_error(&e).await;
                return Err(e);
            }
        };

        info!(model = %outcome.model, rounds = outcome.rounds, "answer delivered");
        self.store
            .save_history(incoming.user_id, outcome.history)
            .await
            .inspect_err(|e| warn!(error = %e, "could not save history"))
    }

    async fn turn(&self, incoming: &Incoming, delivery: Delivery<'_>) -> Result<TurnOutcome, LlmError> {
        let profile = self.store.get_profile(incoming.user_id).await?;
        let stored = self.store.get_history(incoming.user_id).await?;

        let system_prompt = profile
            .system_prompt
            .unwrap_or_else(|| self.settings.system_prompt.clone());
        let mut history = Vec::with_capacity(stored.len() + 1);
        history.push(Message::system(system_prompt));
        history.extend(stored);

        let request = TurnRequest {
            history,
            message: incoming.to_message(),
            model: profile.model.unwrap_or_else(|| self.settings.model.clone()),
            provider: self.settings.provider.clone(),
            streaming: self.settings.streaming,
        };

        if request.streaming {
            let model = self
                .engine
                .provider(&request.provider)?
                .default_model(&request.model);
            let mut renderer = delivery.renderer(model);
            let outcome = self.engine.run_turn(&request, &mut renderer).await?;
            renderer.finish().await;
            Ok(outcome)
        } else {
            let outcome = self.engine.run_turn_complete(&request).await?;
            delivery.send_complete(&outcome.text, &outcome.model).await;
            Ok(outcome)
        }
    }

    async fn run_command(&self, user_id: i64, command: Command<'_>) -> String {
        match command {
            Command::Start => START_TEXT.to_string(),
            Command::About => ABOUT_TEXT.to_string(),
            Command::System(prompt) => self.set_system_prompt(user_id, prompt).await,
            Command::Reset => match self.store.save_history(user_id, Vec::new()).await {
                Ok(()) => "Conversation history cleared.".to_string(),
                Err(e) => {
                    warn!(error = %e, "reset failed");
                    "Failed to reset the conversation history.".to_string()
                }
            },
            Command::Models(args) => self.models_command(user_id, args).await,
            Command::Unknown(name) => format!("Command /{name} not found."),
        }
    }

    async fn set_system_prompt(&self, user_id: i64, prompt: &str) -> String {
        if prompt.is_empty() {
            return "Usage: /system <prompt>".to_string();
        }
        let result = self
            .update_profile(user_id, |profile| profile.system_prompt = Some(prompt.to_string()))
            .await;
        match result {
            Ok(()) => "System prompt updated.".to_string(),
            Err(e) => {
                warn!(error = %e, "saving system prompt failed");
                "Failed to update the system prompt.".to_string()
            }
        }
    }

    async fn models_command(&self, user_id: i64, args: &str) -> String {
        let models = match self.model_catalog().await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "listing models failed");
                return "Failed to fetch the model list.".to_string();
            }
        };

        if args.is_empty() {
            let requested = match self.store.get_profile(user_id).await {
                Ok(profile) => profile.model.unwrap_or_else(|| self.settings.model.clone()),
                Err(_) => self.settings.model.clone(),
            };
            let current = match self.engine.provider(&self.settings.provider) {
                Ok(provider) => provider.default_model(&requested),
                Err(_) => requested,
            };
            return format_model_list(&self.settings.provider, &models, &current);
        }

        let Some(model) = args.parse::<usize>().ok().and_then(|i| models.get(i)) else {
            return format!(
                "Model number must be between 0 and {}.",
                models.len().saturating_sub(1)
            );
        };
        let model = model.clone();
        match self
            .update_profile(user_id, |profile| profile.model = Some(model.clone()))
            .await
        {
            Ok(()) => format!("Model changed to {model}."),
            Err(e) => {
                warn!(error = %e, "saving model choice failed");
                "Failed to change the model.".to_string()
            }
        }
    }

    /// The active provider's catalog, from the store cache when present.
    async fn model_catalog(&self) -> Result<Vec<String>, LlmError> {
        let vendor = &self.settings.provider;
        if let Some(models) = self.store.get_model_cache(vendor).await? {
            return Ok(models);
        }
        let models = self.engine.list_models(vendor).await?;
        if let Err(e) = self.store.save_model_cache(vendor, models.clone()).await {
            warn!(error = %e, "caching model list failed");
        }
        Ok(models)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        change: impl FnOnce(&mut UserProfile),
    ) -> Result<(), LlmError> {
        let mut profile = self.store.get_profile(user_id).await?;
        change(&mut profile);
        self.store.save_profile(user_id, profile).await
    }
}

const START_TEXT: &str = "Welcome! I'm your personal assistant.\n\
Here are some commands to configure me:\n\n\
- /start - Welcome message and menu\n\
- /system <prompt> - Set the system prompt\n\
- /models - List models, /models <number> to switch\n\
- /reset - Clear the conversation history\n\
- /about - About this bot\n\n\
You can also just talk to me.";

const ABOUT_TEXT: &str = "A Telegram bridge to large language models, with tool calling and streamed answers.";

fn format_model_list(provider: &str, models: &[String], current: &str) -> String {
    let mut out = format!("🧠 {provider} models\n\n");
    for (i, model) in models.iter().enumerate() {
        let marker = if model == current { " ✅ *active*" } else { "" };
        out.push_str(&format!("{i} - {model}{marker}\n"));
    }
    out.push_str("\nUsage: /models <number>\nExample: /models 0");
    out
}
