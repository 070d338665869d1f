//! Mock `EventStore` implementations for tests.

use async_trait::async_trait;
use uuid::Uuid;

use libram_core::error::DomainError;
use libram_core::event::{EventDraft, EventRecord};
use libram_core::store::EventStore;

/// An event store that always fails with a connectivity error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(&self, _draft: EventDraft) -> Result<EventRecord, DomainError> {
        Err(DomainError::Connectivity("connection refused".into()))
    }

    async fn events_for(&self, _aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError> {
        Err(DomainError::Connectivity("connection refused".into()))
    }

    async fn latest_version(&self, _aggregate_id: Uuid) -> Result<i64, DomainError> {
        Err(DomainError::Connectivity("connection refused".into()))
    }

    async fn all_events(
        &self,
        _event_type: Option<&str>,
    ) -> Result<Vec<EventRecord>, DomainError> {
        Err(DomainError::Connectivity("connection refused".into()))
    }
}
