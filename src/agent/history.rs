//! Translation of stored messages into provider turns.

use crate::llm::Turn;
use crate::models::{Message, MessagePayload};

/// Result text recorded for a tool call that never finished.
pub const INTERRUPTED_TOOL_CALL: &str = "tool call was interrupted before completion";

/// Identifier pairing a tool call with its result.
pub fn call_id(message_id: u64) -> String {
    format!("call_{}", message_id)
}

/// Build the provider context for a chat's history.
///
/// Each tool message expands into a function-call turn immediately followed
/// by its function-result turn. A call that never completed is answered with
/// an error result so the pair is never broken.
pub fn build_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(messages.len());
    for message in messages {
        match &message.payload {
            MessagePayload::User { text } => turns.push(Turn::User { text: text.clone() }),
            MessagePayload::Agent { text } => {
                turns.push(Turn::Assistant { text: text.clone() })
            }
            MessagePayload::Tool(call) => {
                let id = call_id(message.message_id);
                turns.push(Turn::FunctionCall {
                    call_id: id.clone(),
                    name: call.tool_name.clone(),
                    arguments: call.tool_args.clone(),
                });
                let (content, is_error) = if !call.done {
                    (INTERRUPTED_TOOL_CALL.to_string(), true)
                } else if call.is_error() {
                    (call.tool_error.clone(), true)
                } else {
                    (call.tool_result.clone(), false)
                };
                turns.push(Turn::FunctionResult {
                    call_id: id,
                    name: call.tool_name.clone(),
                    content,
                    is_error,
                });
            }
        }
    }
    turns
}
