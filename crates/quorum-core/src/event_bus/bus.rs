use super::types::WorkflowEvent;
use tokio::sync::broadcast;

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast-based bus for workflow events.
///
/// A subscriber that falls more than `capacity` events behind gets
/// `RecvError::Lagged`; publishing never waits on subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receiver for all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publish to every subscriber; returns how many received it.
    pub fn publish(&self, event: WorkflowEvent) -> usize {
        // no receivers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
