//! In-progress response record.
//!
//! A [`StreamAccumulator`] folds provider increments into the message that
//! represents the response so far. It is flushed to the chat repository
//! after every change: the first flush creates the message, later flushes
//! overwrite it under the same id.

use crate::llm::{FunctionCall, ResponseDelta};
use crate::models::{Message, ToolCall};
use crate::repository::ChatRepository;
use crate::AgntError;

#[derive(Debug)]
pub struct StreamAccumulator {
    chat_id: u64,
    message_id: Option<u64>,
    text: String,
    function_call: Option<FunctionCall>,
    done: bool,
}

impl StreamAccumulator {
    pub fn new(chat_id: u64) -> Self {
        Self {
            chat_id,
            message_id: None,
            text: String::new(),
            function_call: None,
            done: false,
        }
    }

    /// Fold one increment in. Returns whether the record changed.
    pub fn apply(&mut self, delta: ResponseDelta) -> bool {
        let mut changed = false;
        if !delta.text.is_empty() {
            self.text.push_str(&delta.text);
            changed = true;
        }
        if let Some(call) = delta.function_call {
            self.function_call = Some(call);
            changed = true;
        }
        self.done |= delta.done;
        changed
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The record as it stands, or `None` while there is nothing to show.
    ///
    /// A function call turns the record into a pending tool message; text
    /// streamed before the call is not kept.
    pub fn snapshot(&self) -> Option<Message> {
        let mut message = match &self.function_call {
            Some(call) => Message::tool(
                self.chat_id,
                ToolCall::pending(call.name.clone(), call.arguments.clone()),
            ),
            None if !self.text.is_empty() => Message::agent(self.chat_id, self.text.clone()),
            None => return None,
        };
        message.message_id = self.message_id.unwrap_or_default();
        Some(message)
    }

    /// Persist the current record, creating it on first use.
    ///
    /// Returns the persisted message, or `None` when there is nothing yet.
    pub fn flush(&mut self, chats: &dyn ChatRepository) -> Result<Option<Message>, AgntError> {
        let Some(message) = self.snapshot() else {
            return Ok(None);
        };
        match self.message_id {
            Some(_) => {
                chats.update_message(&message)?;
                Ok(Some(message))
            }
            None => {
                let created = chats.create_message(message)?;
                self.message_id = Some(created.message_id);
                Ok(Some(created))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;
    use serde_json::Map;

    #[test]
    fn test_empty_deltas_produce_nothing() {
        let mut acc = StreamAccumulator::new(1);
        assert!(!acc.apply(ResponseDelta::default()));
        assert!(!acc.apply(ResponseDelta::finished()));
        assert!(acc.is_done());
        assert!(acc.snapshot().is_none());
    }

    #[test]
    fn test_text_accumulates() {
        let mut acc = StreamAccumulator::new(4);
        assert!(acc.apply(ResponseDelta::text("h")));
        assert!(acc.apply(ResponseDelta::text("i")));
        let message = acc.snapshot().unwrap();
        assert_eq!(message.chat_id, 4);
        assert_eq!(message.text(), Some("hi"));
        assert!(!acc.is_done());
    }

    #[test]
    fn test_function_call_converts_record() {
        let mut acc = StreamAccumulator::new(1);
        acc.apply(ResponseDelta::text("let me check"));
        acc.apply(ResponseDelta {
            text: String::new(),
            function_call: Some(FunctionCall {
                name: "list_nodes".into(),
                arguments: Map::new(),
            }),
            done: true,
        });
        let message = acc.snapshot().unwrap();
        assert_eq!(message.kind(), MessageKind::Tool);
        match message.payload {
            crate::models::MessagePayload::Tool(call) => {
                assert!(!call.done);
                assert_eq!(call.tool_name, "list_nodes");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
