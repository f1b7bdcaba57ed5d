//! Progress notifications emitted while a round streams.

use std::sync::Arc;

use async_trait::async_trait;

/// Receives a notification each time a message of the running round changes.
///
/// Implementations must not fail the caller.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn progressed(&self, chat_id: u64, message_id: u64);
}

/// Sink that drops every notification.
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn progressed(&self, _chat_id: u64, _message_id: u64) {}
}

/// Shorthand for a no-op sink.
pub fn noop_progress() -> Arc<dyn ProgressSink> {
    Arc::new(NoopProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        count: AtomicUsize,
    }

    #[async_trait]
    impl ProgressSink for CountingSink {
        async fn progressed(&self, _chat_id: u64, _message_id: u64) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn test_sink_through_trait_object() {
        let sink = Arc::new(CountingSink {
            count: AtomicUsize::new(0),
        });
        let dynamic: Arc<dyn ProgressSink> = sink.clone();
        dynamic.progressed(1, 1).await;
        dynamic.progressed(1, 2).await;
        noop_progress().progressed(1, 3).await;
        assert_eq!(sink.count.load(Ordering::Relaxed), 2);
    }
}
