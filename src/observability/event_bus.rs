//! Tokio broadcast bus for outcome events.
//!
//! Monitors, speakers and other display collaborators subscribe here. The
//! sorter publishes without waiting on any of them.

use super::OutcomeSink;
use crate::models::OutcomeEvent;
use tokio::sync::broadcast;

const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Broadcast bus for outcome events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OutcomeEvent>,
}

/// Receiver that only yields events matching a predicate.
pub struct FilteredReceiver<F> {
    receiver: broadcast::Receiver<OutcomeEvent>,
    predicate: F,
}

impl EventBus {
    /// Creates a new event bus with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers (best effort).
    pub fn publish(&self, event: OutcomeEvent) {
        metrics::counter!("event_bus_publish_total").increment(1);
        if self.sender.send(event).is_err() {
            // No subscribers.
            metrics::counter!("event_bus_publish_dropped_total").increment(1);
        }
    }

    /// Subscribes to every event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        metrics::gauge!("event_bus_receivers").set((self.sender.receiver_count() + 1) as f64);
        self.sender.subscribe()
    }

    /// Subscribes with a predicate.
    #[must_use]
    pub fn subscribe_filtered<F>(&self, predicate: F) -> FilteredReceiver<F>
    where
        F: Fn(&OutcomeEvent) -> bool,
    {
        FilteredReceiver {
            receiver: self.subscribe(),
            predicate,
        }
    }

    /// Subscribes to the outcomes that should sound the failure tone.
    #[must_use]
    pub fn subscribe_alerts(&self) -> FilteredReceiver<impl Fn(&OutcomeEvent) -> bool + use<>> {
        self.subscribe_filtered(|event| event.kind.alerts())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl OutcomeSink for EventBus {
    fn notify(&self, event: &OutcomeEvent) {
        self.publish(event.clone());
    }
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&OutcomeEvent) -> bool,
{
    /// Receives the next event that matches the predicate.
    ///
    /// # Errors
    ///
    /// Returns an error once the bus is closed.
    pub async fn recv(&mut self) -> Result<OutcomeEvent, broadcast::error::RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if (self.predicate)(&event) {
                        return Ok(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    metrics::counter!("event_bus_lagged_total").increment(skipped);
                },
                Err(err) => return Err(err),
            }
        }
    }
}
