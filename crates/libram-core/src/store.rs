//! Event store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{EventDraft, EventRecord};

/// Append-only store for domain events with optimistic per-aggregate
/// versioning.
///
/// The store owns event identifiers and timestamps. Within one aggregate
/// the stored versions are contiguous from 1; uniqueness of
/// `(aggregate_id, version)` is the concurrency control for the whole
/// write path.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a single event, assigning its identifier and timestamp.
    ///
    /// Fails with [`DomainError::Conflict`] when the draft's
    /// `(aggregate_id, version)` slot is already occupied. The stored
    /// log is unchanged in that case.
    async fn append(&self, draft: EventDraft) -> Result<EventRecord, DomainError>;

    /// All events for one aggregate, ascending by version.
    async fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError>;

    /// Highest stored version for the aggregate, `0` when it has none.
    async fn latest_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError>;

    /// Every stored event ascending by occurrence time, optionally
    /// filtered to a single event type.
    async fn all_events(&self, event_type: Option<&str>)
    -> Result<Vec<EventRecord>, DomainError>;
}
