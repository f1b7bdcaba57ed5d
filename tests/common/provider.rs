//! Scripted model provider.
//!
//! Replays canned responses in order and records every request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use agnt::llm::{DeltaStream, FunctionCall, Provider, ProviderRequest, ResponseDelta};
use agnt::AgntError;

use super::builders::props;

/// One scripted provider exchange.
pub enum Step {
    /// Stream these increments, then end.
    Respond(Vec<ResponseDelta>),
    /// Stream these increments, then never finish.
    Stall(Vec<ResponseDelta>),
    /// Fail the request with a transport error.
    Fail(String),
}

impl Step {
    /// Plain text reply, streamed one word at a time.
    pub fn text(text: &str) -> Self {
        let mut deltas: Vec<ResponseDelta> = text
            .split_inclusive(' ')
            .map(ResponseDelta::text)
            .collect();
        deltas.push(ResponseDelta::finished());
        Step::Respond(deltas)
    }

    /// Reply that calls a tool with `args` (a JSON object literal).
    pub fn tool(name: &str, args: Value) -> Self {
        Step::Respond(vec![ResponseDelta {
            text: String::new(),
            function_call: Some(FunctionCall {
                name: name.to_string(),
                arguments: props(args),
            }),
            done: true,
        }])
    }
}

pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, AgntError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(deltas)) => Ok(stream::iter(deltas.into_iter().map(Ok)).boxed()),
            Some(Step::Stall(deltas)) => Ok(stream::iter(deltas.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
            Some(Step::Fail(message)) => Err(AgntError::Transport(message)),
            None => Err(AgntError::Transport("script exhausted".to_string())),
        }
    }
}
