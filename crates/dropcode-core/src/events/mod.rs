//! Domain events emitted by DropCode operations.
//!
//! Events are dispatched through the event bus and consumed by the daemon
//! log subscriber; anything operating the service in-process can subscribe.

pub mod share;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub use share::ShareEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: ShareEvent,
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(payload: ShareEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Broadcast bus carrying [`DomainEvent`]s to in-process subscribers.
///
/// Publishing never blocks; events are dropped when no subscriber exists,
/// which is the correct behavior for an observability side channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with the given buffered capacity per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ShareEvent) {
        let _ = self.sender.send(DomainEvent::new(event));
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
