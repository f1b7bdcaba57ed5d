use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AgntError;

/// Generation state of a chat thread.
///
/// Only the orchestrator flips this, around a generation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    #[default]
    Idle,
    Running,
}

impl ChatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::Running => "running",
        }
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatState {
    type Err = AgntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(ChatState::Idle),
            "running" => Ok(ChatState::Running),
            other => Err(AgntError::InvalidArgument(format!(
                "chat state must be 'idle' or 'running', got '{}'",
                other
            ))),
        }
    }
}

/// A conversation thread. Its messages live in a partition of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: ChatState,
    /// Process id of the round holder while `running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<u32>,
}

impl ChatThread {
    pub fn is_running(&self) -> bool {
        self.state == ChatState::Running
    }

    /// A `running` chat whose holder is gone (or was never recorded).
    pub fn is_abandoned(&self, is_alive: impl Fn(u32) -> bool) -> bool {
        self.is_running() && !self.owner.is_some_and(is_alive)
    }
}
