use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminant of a [`MessagePayload`], for callers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Agent,
    Tool,
}

/// One persisted chat message.
///
/// `message_id` is assigned by the chat's own sequence when the message is
/// created; the value passed to `create_message` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub chat_id: u64,
    #[serde(default)]
    pub message_id: u64,
    #[serde(flatten)]
    pub payload: MessagePayload,
}

/// Message content, tagged by `kind` on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    User { text: String },
    Agent { text: String },
    Tool(ToolCall),
}

/// A model-issued tool invocation and, once `done`, its outcome.
///
/// After completion exactly one of `tool_result` / `tool_error` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub done: bool,
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: Map<String, Value>,
    #[serde(default)]
    pub tool_result: String,
    #[serde(default)]
    pub tool_error: String,
}

impl ToolCall {
    /// A pending call, not yet dispatched.
    pub fn pending(tool_name: impl Into<String>, tool_args: Map<String, Value>) -> Self {
        Self {
            done: false,
            tool_name: tool_name.into(),
            tool_args,
            tool_result: String::new(),
            tool_error: String::new(),
        }
    }

    /// Mark the call done with a successful result.
    ///
    /// Results are JSON text; an empty one is stored as `null`.
    pub fn succeed(&mut self, result: String) {
        self.done = true;
        self.tool_result = if result.is_empty() {
            "null".to_string()
        } else {
            result
        };
        self.tool_error.clear();
    }

    /// Mark the call done with an error visible to the model.
    ///
    /// An empty error text is replaced so the completed call never carries
    /// two empty outcome fields.
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.done = true;
        self.tool_result.clear();
        self.tool_error = if error.is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
    }

    pub fn is_error(&self) -> bool {
        !self.tool_error.is_empty()
    }
}

impl Message {
    pub fn user(chat_id: u64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id: 0,
            payload: MessagePayload::User { text: text.into() },
        }
    }

    pub fn agent(chat_id: u64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id: 0,
            payload: MessagePayload::Agent { text: text.into() },
        }
    }

    pub fn tool(chat_id: u64, call: ToolCall) -> Self {
        Self {
            chat_id,
            message_id: 0,
            payload: MessagePayload::Tool(call),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self.payload {
            MessagePayload::User { .. } => MessageKind::User,
            MessagePayload::Agent { .. } => MessageKind::Agent,
            MessagePayload::Tool(_) => MessageKind::Tool,
        }
    }

    /// Text of a user or agent message.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::User { text } | MessagePayload::Agent { text } => Some(text),
            MessagePayload::Tool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_message_layout() {
        let mut args = Map::new();
        args.insert("id".into(), json!(4));
        let msg = Message {
            chat_id: 1,
            message_id: 2,
            payload: MessagePayload::Tool(ToolCall::pending("get_node", args)),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["kind"], "tool");
        assert_eq!(value["tool_name"], "get_node");
        assert_eq!(value["tool_args"]["id"], 4);
        assert_eq!(value["done"], false);

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_wrong_payload_for_kind_is_rejected() {
        let err = serde_json::from_value::<Message>(json!({
            "chat_id": 1,
            "message_id": 1,
            "kind": "user",
            "tool_name": "get_node"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_completion_sets_exactly_one_outcome() {
        let mut call = ToolCall::pending("get_node", Map::new());
        call.succeed("{}".into());
        call.fail("");
        assert!(call.done);
        assert!(call.tool_result.is_empty());
        assert_eq!(call.tool_error, "unknown error");

        call.succeed(String::new());
        assert_eq!(call.tool_result, "null");
        assert!(call.tool_error.is_empty());
        assert!(!call.is_error());
    }
}
