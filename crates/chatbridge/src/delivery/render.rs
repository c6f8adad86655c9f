//! The streaming render state machine.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use super::Delivery;
use super::format::{char_boundary, char_len, watermark};
use crate::error::LlmError;
use crate::stream::{PartialSink, StreamEvent};

/// What the renderer knows about the message it is currently growing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Id of the placeholder being edited, if one was sent successfully.
    pub placeholder: Option<i64>,
    /// Text of the current segment. Earlier segments were committed to
    /// their own messages.
    pub accumulated: String,
    /// Characters added since the last edit.
    pub buffered: usize,
    /// The model is in the middle of a tool round.
    pub tool_pending: bool,
}

/// Streams a turn into the chat by editing a placeholder message.
///
/// ```text
/// Idle ──first partial──▶ Streaming ──final──▶ Done
///                           │    ▲
///                           └────┘ edit every `edit_threshold` chars or on
///                                  indicator change; new placeholder near
///                                  the transport limit
/// ```
///
/// Every transport failure is logged and ignored; [`on_partial`] never
/// fails, so delivery trouble cannot abort the turn. When the initial
/// placeholder cannot be sent, text keeps accumulating and shows up with
/// the final message.
///
/// [`on_partial`]: PartialSink::on_partial
pub struct StreamRenderer<'t> {
    delivery: Delivery<'t>,
    model: String,
    state: RenderState,
    reply_to: Option<i64>,
    started: bool,
    finished: bool,
}

impl std::fmt::Debug for StreamRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRenderer")
            .field("model", &self.model)
            .field("state", &self.state)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<'t> StreamRenderer<'t> {
    pub(crate) fn new(delivery: Delivery<'t>, model: String) -> Self {
        Self {
            reply_to: delivery.reply_target(),
            delivery,
            model,
            state: RenderState::default(),
            started: false,
            finished: false,
        }
    }

    /// Current render state.
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Whether the final message has been written.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    async fn handle(&mut self, event: &StreamEvent) {
        if self.finished {
            return;
        }

        let carries_tools = event.partial.has_tool_calls();
        if !self.started {
            self.started = true;
            if !event.is_final {
                self.open(carries_tools).await;
            }
        }

        let mut indicator_changed = false;
        if carries_tools {
            if !self.state.tool_pending {
                self.state.tool_pending = true;
                indicator_changed = true;
            }
        } else {
            let delta = event.partial.text();
            if !delta.is_empty() {
                if self.state.tool_pending {
                    self.state.tool_pending = false;
                    indicator_changed = true;
                }
                self.state.buffered += char_len(&delta);
                self.state.accumulated.push_str(&delta);
            }
        }

        let rolled = self.roll_over().await;
        if event.is_final {
            self.finish().await;
        } else if rolled {
            if !self.state.accumulated.is_empty() {
                self.refresh().await;
            }
        } else if indicator_changed || self.state.buffered >= self.delivery.config().edit_threshold {
            self.refresh().await;
        }
    }

    /// Writes the final message: the segment plus watermark when that
    /// fits, sent with markdown and retried once as plain text.
    pub async fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let text = std::mem::take(&mut self.state.accumulated);
        let marked = watermark(&text, &self.model);
        let body = if char_len(&marked) <= self.delivery.config().max_len {
            marked
        } else {
            text
        };

        match self.state.placeholder {
            Some(id) => {
                if !self.delivery.edit(id, &body, true).await {
                    self.delivery.edit(id, &body, false).await;
                }
            }
            None => {
                let reply_to = self.reply_to.take();
                self.delivery.send(reply_to, &body).await;
            }
        }
        self.state.buffered = 0;
    }

    async fn open(&mut self, tools: bool) {
        let label = self.label(tools);
        let reply_to = self.reply_to.take();
        self.state.placeholder = self.delivery.post(reply_to, label, false).await;
        self.state.tool_pending = tools;
        self.state.buffered = 0;
        if self.state.placeholder.is_none() {
            debug!("no placeholder; text will appear with the final message");
        }
    }

    /// Commits every full segment to its own message and opens a fresh
    /// placeholder for the remainder. Returns whether anything rolled.
    async fn roll_over(&mut self) -> bool {
        let limit = self.delivery.config().segment_limit();
        let mut rolled = false;
        while char_len(&self.state.accumulated) >= limit {
            let cut = char_boundary(&self.state.accumulated, limit);
            let rest = self.state.accumulated.split_off(cut);
            let segment = std::mem::replace(&mut self.state.accumulated, rest);
            self.commit(&segment).await;
            self.open(self.state.tool_pending).await;
            rolled = true;
        }
        if rolled {
            self.state.buffered = 0;
        }
        rolled
    }

    async fn commit(&mut self, segment: &str) {
        match self.state.placeholder.take() {
            Some(id) => {
                if !self.delivery.edit(id, segment, true).await {
                    self.delivery.edit(id, segment, false).await;
                }
            }
            None => {
                let reply_to = self.reply_to.take();
                self.delivery.send(reply_to, segment).await;
            }
        }
    }

    async fn refresh(&mut self) {
        self.state.buffered = 0;
        let Some(id) = self.state.placeholder else {
            return;
        };
        let label = self.label(self.state.tool_pending);
        let text = if self.state.accumulated.is_empty() {
            label.to_string()
        } else {
            format!("{}\n\n{label}", self.state.accumulated)
        };
        self.delivery.edit(id, &text, false).await;
    }

    fn label(&self, tools: bool) -> &'t str {
        let config = self.delivery.config();
        if tools {
            &config.tool_label
        } else {
            &config.typing_label
        }
    }
}

impl PartialSink for StreamRenderer<'_> {
    fn on_partial<'a>(
        &'a mut self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), LlmError>> + Send + 'a>> {
        Box::pin(async move {
            self.handle(event).await;
            Ok(())
        })
    }
}
