//! Tool loop configuration and outcome.

use crate::chat::Message;

/// Default bound on tool-execution rounds per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

/// Configuration for [`tool_loop`](super::tool_loop) and
/// [`tool_loop_stream`](super::tool_loop_stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolLoopConfig {
    /// How many rounds of tool execution a single turn may run. A model
    /// still asking for tools after that many rounds ends the turn with
    /// [`LlmError::ToolLoopExceeded`](crate::LlmError::ToolLoopExceeded).
    pub max_rounds: u32,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// What a completed loop produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    /// The terminal assistant message (never a tool-call carrier).
    pub message: Message,
    /// Tool-execution rounds that ran before it.
    pub rounds: u32,
}
