//! Publishes appended events to the feed.

use std::sync::Arc;

use libram_core::bus::{EventBus, EventMessage};
use libram_core::event::EventRecord;

/// Publishes event records to their lifecycle topic.
///
/// The topic is the record's event type, so `book.created` events go out
/// on the `book.created` topic.
#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
}

impl EventPublisher {
    /// Creates a publisher over the given feed.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Publishes one record. A feed failure is logged, not propagated:
    /// the append already made the event durable and the feed is
    /// at-least-once, so consumers recover on replay.
    pub async fn publish(&self, record: &EventRecord) {
        let message = EventMessage {
            event_type: record.event_type.clone(),
            aggregate_id: record.aggregate_id,
            payload: record.payload.clone(),
            version: record.version,
            occurred_at: record.occurred_at,
        };
        if let Err(err) = self.bus.publish(&record.event_type, message).await {
            tracing::error!(
                aggregate_id = %record.aggregate_id,
                event_type = %record.event_type,
                version = record.version,
                error = %err,
                "failed to publish event to feed"
            );
        }
    }

    /// Publishes a batch of records in order.
    pub async fn publish_all(&self, records: &[EventRecord]) {
        for record in records {
            self.publish(record).await;
        }
    }
}
