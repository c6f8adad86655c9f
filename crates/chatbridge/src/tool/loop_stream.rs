//! Streaming tool loop.

use futures::StreamExt;
use tracing::debug;

use super::ToolRegistry;
use super::config::{LoopOutcome, ToolLoopConfig};
use super::execution::{check_budget, execute_round};
use crate::chat::{Message, ToolCall};
use crate::error::LlmError;
use crate::provider::{ChatParams, DynProvider};
use crate::stream::{PartialSink, StreamEvent};

/// Streaming counterpart of [`tool_loop`](super::tool_loop).
///
/// Every decoded event is handed to `sink` before the next one is pulled
/// from the network, in arrival order. Tool-call partials are forwarded
/// too, so a chat surface can show that a tool is running.
///
/// The stream's final event is forwarded with `is_final` set only on the
/// terminal round. A round that ends in tool calls forwards it as an
/// ordinary partial, because the turn is not over yet.
///
/// Text streamed in a round that ends in tool calls has already been shown,
/// so it is kept in `working` as an assistant message ahead of the tool
/// calls.
///
/// # Errors
///
/// A sink error stops the stream at once (the response body is dropped)
/// and is returned as-is. Provider and decode errors propagate unchanged.
pub async fn tool_loop_stream(
    provider: &dyn DynProvider,
    registry: &ToolRegistry,
    model: &str,
    working: &mut Vec<Message>,
    config: ToolLoopConfig,
    sink: &mut dyn PartialSink,
) -> Result<LoopOutcome, LlmError> {
    let tools = registry.definitions();
    let mut rounds = 0u32;

    loop {
        let params = ChatParams {
            model: model.to_string(),
            messages: working.clone(),
            tools: tools.clone(),
        };
        let mut stream = provider.chat_stream_boxed(&params).await?;

        let mut text = String::new();
        let mut calls: Vec<ToolCall> = Vec::new();
        let mut last = StreamEvent::done();

        while let Some(event) = stream.next().await {
            let event = event?;
            if event.is_final {
                last = event;
                break;
            }
            collect(&event, &mut text, &mut calls);
            sink.on_partial(&event).await?;
        }
        drop(stream);

        collect(&last, &mut text, &mut calls);

        if calls.is_empty() {
            sink.on_partial(&last).await?;
            let message = Message::assistant(text);
            working.push(message.clone());
            return Ok(LoopOutcome { message, rounds });
        }

        last.is_final = false;
        if last.partial.has_tool_calls() || !last.partial.text().is_empty() {
            sink.on_partial(&last).await?;
        }

        check_budget(rounds, config.max_rounds)?;
        debug!(round = rounds + 1, calls = calls.len(), "model requested tools mid-stream");
        if !text.is_empty() {
            working.push(Message::assistant(text));
        }
        execute_round(registry, calls, working).await;
        rounds += 1;
    }
}

fn collect(event: &StreamEvent, text: &mut String, calls: &mut Vec<ToolCall>) {
    if event.partial.has_tool_calls() {
        calls.extend(event.partial.tool_calls().iter().cloned());
    } else {
        text.push_str(&event.partial.text());
    }
}
