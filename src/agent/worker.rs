//! Request queue and the generation worker.
//!
//! Consumers enqueue chat ids on a [`GenerationQueue`] and return
//! immediately. A single worker task drains the queue and runs one round at
//! a time, reporting progress and completion as [`AgentEvent`]s.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Agent, ProgressSink};
use crate::models::Message;
use crate::AgntError;

/// Notification delivered to the consumer.
#[derive(Debug)]
pub enum AgentEvent {
    /// A message of the running round was created or updated.
    Progressed { chat_id: u64, message_id: u64 },
    /// A round finished; `error` is set when it failed.
    Completed {
        chat_id: u64,
        error: Option<AgntError>,
    },
}

/// Handle for submitting generation requests.
#[derive(Clone)]
pub struct GenerationQueue {
    agent: Arc<Agent>,
    tx: mpsc::Sender<u64>,
}

impl GenerationQueue {
    /// Enqueue a round for `chat_id` without waiting for it to run.
    pub fn submit(&self, chat_id: u64) -> Result<(), AgntError> {
        self.tx.try_send(chat_id).map_err(|e| match e {
            TrySendError::Full(_) => {
                AgntError::QueueUnavailable("too many pending requests".to_string())
            }
            TrySendError::Closed(_) => {
                AgntError::QueueUnavailable("generation worker has stopped".to_string())
            }
        })
    }

    /// Persist a user message and enqueue a round to answer it.
    pub fn submit_user_message(&self, chat_id: u64, text: &str) -> Result<Message, AgntError> {
        let message = self.agent.send_user_message(chat_id, text)?;
        self.submit(chat_id)?;
        Ok(message)
    }
}

struct ChannelProgress {
    events: mpsc::UnboundedSender<AgentEvent>,
}

#[async_trait]
impl ProgressSink for ChannelProgress {
    async fn progressed(&self, chat_id: u64, message_id: u64) {
        let _ = self.events.send(AgentEvent::Progressed {
            chat_id,
            message_id,
        });
    }
}

/// Drain `requests` until it closes or `cancel` fires.
///
/// Pending requests are not started once cancellation is observed; an
/// in-flight round is aborted and its chat returned to idle.
pub async fn run_worker(
    agent: Arc<Agent>,
    mut requests: mpsc::Receiver<u64>,
    events: mpsc::UnboundedSender<AgentEvent>,
    cancel: CancellationToken,
) {
    tracing::info!("Generation worker started");
    let progress = ChannelProgress {
        events: events.clone(),
    };

    loop {
        let chat_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = requests.recv() => match next {
                Some(chat_id) => chat_id,
                None => break,
            },
        };

        let result = agent.generate(chat_id, &progress, &cancel).await;
        if let Err(e) = &result {
            tracing::warn!(chat_id, "Generation round failed: {}", e);
        }
        let _ = events.send(AgentEvent::Completed {
            chat_id,
            error: result.err(),
        });
    }

    tracing::info!("Generation worker stopped");
}

/// Start the worker on the tokio runtime.
pub fn spawn_worker(
    agent: Arc<Agent>,
    capacity: usize,
    cancel: CancellationToken,
) -> (
    GenerationQueue,
    mpsc::UnboundedReceiver<AgentEvent>,
    JoinHandle<()>,
) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_worker(agent.clone(), rx, events_tx, cancel));
    (GenerationQueue { agent, tx }, events_rx, handle)
}
