//! Bot API request and response bodies.

use serde::{Deserialize, Serialize};

/// `sendMessage` body.
#[derive(Debug, Serialize)]
pub(crate) struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

/// `editMessageText` body.
#[derive(Debug, Serialize)]
pub(crate) struct EditMessage<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

/// `sendChatAction` body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatAction {
    pub chat_id: i64,
    pub action: &'static str,
}

/// Envelope around every Bot API answer.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The parts of a sent `Message` the transport needs.
#[derive(Debug, Deserialize)]
pub(crate) struct SentMessage {
    pub message_id: i64,
}

pub(crate) fn parse_mode(markdown: bool) -> Option<&'static str> {
    markdown.then_some("markdown")
}

/// `getFile` body.
#[derive(Debug, Serialize)]
pub(crate) struct GetFile<'a> {
    pub file_id: &'a str,
}

/// A `File` as returned by `getFile`. `file_path` is missing once the
/// download link has expired.
#[derive(Debug, Deserialize)]
pub(crate) struct File {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// An inbound update, as delivered by webhooks or `getUpdates`.
///
/// Only the fields the bridge reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Update {
    /// Update sequence number.
    pub update_id: i64,
    /// A new message. Other update kinds leave this empty.
    #[serde(default)]
    pub message: Option<InboundMessage>,
}

/// An inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// Message id within the chat.
    pub message_id: i64,
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message was sent in.
    pub chat: Chat,
    /// Text of a text message.
    #[serde(default)]
    pub text: Option<String>,
    /// Caption of a photo, document or voice note.
    #[serde(default)]
    pub caption: Option<String>,
    /// Sizes of a photo, smallest first.
    #[serde(default)]
    pub photo: Vec<FileRef>,
    /// A file sent as a document.
    #[serde(default)]
    pub document: Option<Document>,
    /// A voice note.
    #[serde(default)]
    pub voice: Option<FileRef>,
    /// A music or audio file.
    #[serde(default)]
    pub audio: Option<FileRef>,
    /// The message this one replies to.
    #[serde(default)]
    pub reply_to_message: Option<Box<InboundMessage>>,
}

/// Message sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct User {
    /// User id.
    pub id: i64,
}

/// Chat a message belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
}

/// Any downloadable attachment: a photo size, voice note or audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileRef {
    /// Id to pass to `getFile`.
    pub file_id: String,
}

/// A file sent as a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Document {
    /// Id to pass to `getFile`.
    pub file_id: String,
    /// MIME type reported by the sender.
    #[serde(default)]
    pub mime_type: Option<String>,
}
