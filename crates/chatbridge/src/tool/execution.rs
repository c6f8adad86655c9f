//! One round of tool execution.

use futures::{StreamExt, stream};
use tracing::debug;

use super::ToolRegistry;
use crate::chat::{Message, ToolCall};
use crate::error::LlmError;

/// Fails with [`LlmError::ToolLoopExceeded`] once `completed` rounds have
/// used up the budget.
pub(crate) fn check_budget(completed: u32, max_rounds: u32) -> Result<(), LlmError> {
    if completed >= max_rounds {
        return Err(LlmError::ToolLoopExceeded { rounds: max_rounds });
    }
    Ok(())
}

/// Appends the assistant's tool-call carrier to `working`, then runs each
/// call in order and appends its answer as a `tool` message.
///
/// Calls run one after another, never concurrently, so answers land in
/// the same order as the calls that produced them.
pub(crate) async fn execute_round(
    registry: &ToolRegistry,
    calls: Vec<ToolCall>,
    working: &mut Vec<Message>,
) {
    working.push(Message::from_tool_calls(calls.clone()));

    let answers: Vec<Message> = stream::iter(calls)
        .then(|call| async move {
            debug!(tool = %call.name, call_id = %call.id, "executing tool call");
            let result = registry.execute(&call).await;
            Message::tool_result(call.id, call.name, result)
        })
        .collect()
        .await;

    working.extend(answers);
}
