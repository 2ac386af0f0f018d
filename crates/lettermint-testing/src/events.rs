//! Event handler that records what it receives.

use std::{sync::Arc, time::Duration};

use lettermint_core::{EventHandler, EventType, LettermintEvent};
use tokio::sync::{Notify, RwLock};

/// Default timeout when waiting for events, generous enough for slow CI.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Records every event for later assertions.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventHandler {
    events: Arc<RwLock<Vec<LettermintEvent>>>,
    notify: Arc<Notify>,
}

impl RecordingEventHandler {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub async fn events(&self) -> Vec<LettermintEvent> {
        self.events.read().await.clone()
    }

    /// Number of events received so far.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Event types received so far, in order.
    pub async fn event_types(&self) -> Vec<EventType> {
        self.events.read().await.iter().map(LettermintEvent::event_type).collect()
    }

    /// The only event received.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one event was recorded.
    pub async fn single(&self) -> LettermintEvent {
        let events = self.events.read().await;
        assert_eq!(events.len(), 1, "expected exactly one event, got {events:?}");
        events[0].clone()
    }

    /// Waits until at least `count` events were recorded.
    ///
    /// # Panics
    ///
    /// Panics after [`DEFAULT_EVENT_TIMEOUT`].
    pub async fn wait_for(&self, count: usize) {
        let result = tokio::time::timeout(DEFAULT_EVENT_TIMEOUT, async {
            loop {
                let notified = self.notify.notified();
                if self.count().await >= count {
                    return;
                }
                notified.await;
            }
        })
        .await;

        if result.is_err() {
            panic!(
                "expected {count} events within {DEFAULT_EVENT_TIMEOUT:?}, got {}",
                self.count().await
            );
        }
    }
}

#[async_trait::async_trait]
impl EventHandler for RecordingEventHandler {
    async fn handle_event(&self, event: LettermintEvent) {
        self.events.write().await.push(event);
        self.notify.notify_waiters();
    }
}
