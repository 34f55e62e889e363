use tokio::sync::broadcast;
use tracing::debug;

use crate::traits::EventPublisher;
use crate::types::DomainEvent;

/// In-process fan-out of [`DomainEvent`]s to any number of subscribers, e.g. a task forwarding them to a message
/// broker. Slow subscribers lose the oldest events once `capacity` is exceeded; publishing never blocks or fails.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            debug!(event_type, "no subscribers, event dropped");
        }
    }
}
