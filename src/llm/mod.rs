//! Model provider boundary.
//!
//! The orchestrator talks to a [`Provider`] in provider-neutral terms: an
//! ordered list of [`Turn`]s plus the declared tools go in, a stream of
//! [`ResponseDelta`] increments comes back. The final increment has `done`
//! set and carries the function call, if the model asked for one.

pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};

use crate::tools::ToolSpec;
use crate::AgntError;

pub use openai::OpenAiProvider;

/// One turn of conversation context.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User {
        text: String,
    },
    Assistant {
        text: String,
    },
    /// The assistant invoking a tool. Always directly followed by the
    /// matching [`Turn::FunctionResult`].
    FunctionCall {
        call_id: String,
        name: String,
        arguments: Map<String, Value>,
    },
    FunctionResult {
        call_id: String,
        name: String,
        content: String,
        is_error: bool,
    },
}

/// A complete generation request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub turns: Vec<Turn>,
    pub tools: Vec<ToolSpec>,
}

/// A function-call directive issued by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// One increment of a model response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDelta {
    /// Text appended by this increment (may be empty).
    pub text: String,
    pub function_call: Option<FunctionCall>,
    /// Set on the last increment of the response.
    pub done: bool,
}

impl ResponseDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }
}

pub type DeltaStream = BoxStream<'static, Result<ResponseDelta, AgntError>>;

/// A language-model backend.
///
/// Implementations report I/O failures as [`AgntError::Transport`], either
/// from `stream` itself or as an item of the returned stream.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, AgntError>;
}
