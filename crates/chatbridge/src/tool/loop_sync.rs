//! Non-streaming tool loop.

use tracing::debug;

use super::ToolRegistry;
use super::config::{LoopOutcome, ToolLoopConfig};
use super::execution::{check_budget, execute_round};
use crate::chat::Message;
use crate::error::LlmError;
use crate::provider::{ChatParams, DynProvider};

/// Runs the model in a tool-calling loop until it answers without tools.
///
/// Each round:
/// 1. Calls `provider.chat_boxed()` with the current `working` messages
/// 2. If the reply has no tool calls, appends it and returns
/// 3. Otherwise appends the tool-call carrier, executes every call in
///    order via the registry, appends each answer, and repeats
///
/// Every message the loop produces is pushed onto `working`, so on
/// success the caller finds the carrier/answer pairs and the final
/// reply at its tail.
///
/// # Errors
///
/// Provider errors propagate unchanged (nothing is retried).
/// [`LlmError::ToolLoopExceeded`] is returned when the model still asks
/// for tools after `config.max_rounds` rounds.
pub async fn tool_loop(
    provider: &dyn DynProvider,
    registry: &ToolRegistry,
    model: &str,
    working: &mut Vec<Message>,
    config: ToolLoopConfig,
) -> Result<LoopOutcome, LlmError> {
    let tools = registry.definitions();
    let mut rounds = 0u32;

    loop {
        let params = ChatParams {
            model: model.to_string(),
            messages: working.clone(),
            tools: tools.clone(),
        };
        let message = provider.chat_boxed(&params).await?;

        if !message.has_tool_calls() {
            working.push(message.clone());
            return Ok(LoopOutcome { message, rounds });
        }

        check_budget(rounds, config.max_rounds)?;
        let calls = message.tool_calls().to_vec();
        debug!(round = rounds + 1, calls = calls.len(), "model requested tools");
        execute_round(registry, calls, working).await;
        rounds += 1;
    }
}
