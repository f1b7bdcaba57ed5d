use thiserror::Error;

/// Custom error type for agnt operations.
#[derive(Debug, Error)]
pub enum AgntError {
    /// Requested chat, message, node or edge does not exist.
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: u64 },

    /// Input validation failed (bad state value, malformed tool arguments).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An edge endpoint does not name an existing node.
    #[error("Reference error: {role} node {id} does not exist")]
    Reference { role: &'static str, id: u64 },

    /// Model provider I/O failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Embedded store transaction or I/O failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The store cannot be used by this build (unrecognized schema version).
    #[error("Fatal: {0}")]
    Fatal(String),

    /// The round was aborted by the cancellation token.
    #[error("Generation cancelled")]
    Cancelled,

    /// The chat already has a generation round in flight.
    #[error("Chat {0} is busy")]
    Busy(u64),

    /// The request queue is full or its worker has shut down.
    #[error("Request queue unavailable: {0}")]
    QueueUnavailable(String),

    /// The model kept chaining tool calls past the configured depth.
    #[error("Tool call chain exceeded {limit} rounds")]
    ToolLimit { limit: usize },
}

impl AgntError {
    /// Errors a tool call records into its message instead of aborting the round.
    ///
    /// The model sees these as the tool result and can correct itself on the
    /// next round.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgntError::NotFound { .. } | AgntError::InvalidArgument(_) | AgntError::Reference { .. }
        )
    }
}

impl From<rusqlite::Error> for AgntError {
    fn from(err: rusqlite::Error) -> Self {
        AgntError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AgntError {
    fn from(err: serde_json::Error) -> Self {
        AgntError::Storage(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AgntError {
    fn from(err: std::io::Error) -> Self {
        AgntError::Storage(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for AgntError {
    fn from(err: reqwest::Error) -> Self {
        AgntError::Transport(err.to_string())
    }
}
