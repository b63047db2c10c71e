//! Event bus for escalation listeners
//!
//! Pub/sub over a Tokio broadcast channel. Sending is synchronous, so the
//! single-threaded core can publish without a runtime; listeners in an
//! async host receive with `recv().await`, tests with `try_recv()`.

use tokio::sync::broadcast;
use tracing::debug;

use super::types::HarnessEvent;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Subscriber lagged and missed {0} events")]
    Lagged(u64),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for event bus operations
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Broadcast bus for [`HarnessEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HarnessEvent>,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: 0,
        }
    }

    /// Publish to all current subscribers. Having none is not an error.
    pub fn publish(&mut self, event: HarnessEvent) {
        let event_type = event.event_type();
        self.published += 1;
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HarnessEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Events published since construction, delivered or not
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain everything currently queued on a receiver without waiting.
///
/// Lag is reported as an error after the remaining events are collected.
pub fn drain(rx: &mut broadcast::Receiver<HarnessEvent>) -> EventBusResult<Vec<HarnessEvent>> {
    let mut events = Vec::new();
    let mut lagged = 0;
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Empty) => break,
            Err(broadcast::error::TryRecvError::Lagged(n)) => lagged += n,
            Err(broadcast::error::TryRecvError::Closed) => {
                if events.is_empty() {
                    return Err(EventBusError::ChannelClosed);
                }
                break;
            }
        }
    }
    if lagged > 0 {
        return Err(EventBusError::Lagged(lagged));
    }
    Ok(events)
}
