//! Conversation orchestrator.
//!
//! A generation round reads a chat's history, asks the provider for the next
//! response and persists it as it streams. When the response is a function
//! call the tool is dispatched, its outcome recorded on the tool message,
//! and the provider is asked again with the extended history. The round
//! ends at the first plain-text response.

pub mod accumulator;
pub mod history;
pub mod owner;
pub mod progress;
pub mod worker;

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::AgntConfig;
use crate::llm::{Provider, ProviderRequest};
use crate::models::{ChatState, Message, MessagePayload};
use crate::repository::ChatRepository;
use crate::tools::ToolRegistry;
use crate::AgntError;

pub use accumulator::StreamAccumulator;
pub use progress::{noop_progress, NoopProgress, ProgressSink};
pub use worker::{spawn_worker, AgentEvent, GenerationQueue};

/// Provider request parameters fixed for the agent's lifetime.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub max_tool_rounds: usize,
}

impl From<&AgntConfig> for AgentSettings {
    fn from(config: &AgntConfig) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            max_tool_rounds: config.max_tool_rounds,
        }
    }
}

/// How a single provider exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    /// A plain-text (or empty) response: the round is over.
    Final,
    /// A tool was dispatched; the provider must be asked again.
    ToolDispatched,
}

pub struct Agent {
    chats: Arc<dyn ChatRepository>,
    tools: Arc<ToolRegistry>,
    provider: Arc<dyn Provider>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        tools: Arc<ToolRegistry>,
        provider: Arc<dyn Provider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            chats,
            tools,
            provider,
            settings,
        }
    }

    /// Persist a user message, refusing while a round is running on the chat.
    pub fn send_user_message(&self, chat_id: u64, text: &str) -> Result<Message, AgntError> {
        self.chats.create_message_when_idle(Message::user(chat_id, text))
    }

    /// Reset chats left `running` by a process that no longer exists.
    ///
    /// Rounds held by live processes, this one included, are left alone.
    /// Returns the ids that were reset.
    pub fn recover_interrupted(&self) -> Result<Vec<u64>, AgntError> {
        let reset = self.chats.reset_abandoned(&owner::is_alive)?;
        if !reset.is_empty() {
            tracing::warn!("Reset {} interrupted chat(s) to idle: {:?}", reset.len(), reset);
        }
        Ok(reset)
    }

    /// Run one generation round for a chat.
    ///
    /// The chat is `running` for the duration and is set back to `idle` on
    /// every exit path, including errors and cancellation.
    #[instrument(skip(self, progress, cancel))]
    pub async fn generate(
        &self,
        chat_id: u64,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), AgntError> {
        self.chats.begin_round(chat_id, owner::current())?;

        let result = self.run_round(chat_id, progress, cancel).await;

        let reset = self.chats.set_chat_state(chat_id, ChatState::Idle);
        match (result, reset) {
            (Err(e), reset) => {
                if let Err(reset_err) = reset {
                    tracing::error!("Failed to reset chat {} to idle: {}", chat_id, reset_err);
                }
                Err(e)
            }
            (Ok(()), reset) => reset.map(|_| ()),
        }
    }

    async fn run_round(
        &self,
        chat_id: u64,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), AgntError> {
        let limit = self.settings.max_tool_rounds;
        let mut dispatched = 0usize;
        loop {
            if cancel.is_cancelled() {
                return Err(AgntError::Cancelled);
            }
            match self
                .exchange(chat_id, progress, cancel, dispatched < limit)
                .await?
            {
                Exchange::Final => {
                    tracing::debug!(chat_id, tool_calls = dispatched, "Round complete");
                    return Ok(());
                }
                Exchange::ToolDispatched => dispatched += 1,
            }
        }
    }

    /// One provider request plus, if the model called a tool, its dispatch.
    async fn exchange(
        &self,
        chat_id: u64,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        may_dispatch: bool,
    ) -> Result<Exchange, AgntError> {
        let history = self.chats.list_messages(chat_id)?;
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            max_tokens: self.settings.max_tokens,
            turns: history::build_turns(&history),
            tools: self.tools.specs(),
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgntError::Cancelled),
            stream = self.provider.stream(request) => stream?,
        };

        let mut acc = StreamAccumulator::new(chat_id);
        while !acc.is_done() {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgntError::Cancelled),
                next = stream.next() => next,
            };
            let Some(delta) = next else {
                break;
            };
            if acc.apply(delta?) {
                if let Some(message) = acc.flush(self.chats.as_ref())? {
                    progress.progressed(chat_id, message.message_id).await;
                }
            }
        }

        let Some(mut message) = acc.snapshot() else {
            tracing::debug!(chat_id, "Provider returned an empty response");
            return Ok(Exchange::Final);
        };
        let MessagePayload::Tool(call) = &mut message.payload else {
            return Ok(Exchange::Final);
        };

        if !may_dispatch {
            call.fail(format!(
                "tool call limit of {} reached",
                self.settings.max_tool_rounds
            ));
            self.chats.update_message(&message)?;
            progress.progressed(chat_id, message.message_id).await;
            return Err(AgntError::ToolLimit {
                limit: self.settings.max_tool_rounds,
            });
        }

        match self.tools.dispatch(&call.tool_name, &call.tool_args) {
            Ok(result) => call.succeed(result),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(tool = %call.tool_name, "Tool call failed: {}", e);
                call.fail(e.to_string());
            }
            Err(e) => return Err(e),
        }
        self.chats.update_message(&message)?;
        progress.progressed(chat_id, message.message_id).await;
        Ok(Exchange::ToolDispatched)
    }
}
