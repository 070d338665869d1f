//! In-memory implementation of the `EventStore` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use libram_core::clock::{Clock, SystemClock};
use libram_core::error::DomainError;
use libram_core::event::{EventDraft, EventRecord};
use libram_core::store::EventStore;

/// In-memory event store with the same contract as the Postgres store.
///
/// Backs tests and single-process runs. Identifier assignment and
/// conflict detection mirror the database behavior.
pub struct MemoryEventStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<Inner>,
}

struct Inner {
    next_id: i64,
    events: Vec<EventRecord>,
}

impl MemoryEventStore {
    /// Creates a store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store with an injected clock for deterministic
    /// timestamps.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(Inner {
                next_id: 1,
                events: Vec::new(),
            }),
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, draft: EventDraft) -> Result<EventRecord, DomainError> {
        let mut inner = self.inner.write().await;

        let occupied = inner
            .events
            .iter()
            .any(|e| e.aggregate_id == draft.aggregate_id && e.version == draft.version);
        if occupied {
            return Err(DomainError::Conflict {
                aggregate_id: draft.aggregate_id,
                version: draft.version,
            });
        }

        let record = EventRecord {
            id: inner.next_id,
            aggregate_id: draft.aggregate_id,
            aggregate_type: draft.aggregate_type,
            event_type: draft.event_type,
            payload: draft.payload,
            version: draft.version,
            occurred_at: self.clock.now(),
        };
        inner.next_id += 1;
        inner.events.push(record.clone());
        Ok(record)
    }

    async fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError> {
        let inner = self.inner.read().await;
        let mut events: Vec<EventRecord> = inner
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn latest_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(0))
    }

    async fn all_events(
        &self,
        event_type: Option<&str>,
    ) -> Result<Vec<EventRecord>, DomainError> {
        let inner = self.inner.read().await;
        let mut events: Vec<EventRecord> = inner
            .events
            .iter()
            .filter(|e| event_type.is_none_or(|t| e.event_type == t))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.occurred_at, e.id));
        Ok(events)
    }
}
