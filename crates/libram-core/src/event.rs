//! Event log record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted domain event, exactly as the store returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Store-assigned identifier, ascending in insertion order.
    pub id: i64,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Aggregate type discriminator, for example `"Book"`.
    pub aggregate_type: String,
    /// Event type tag used to decode `payload`.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Per-aggregate version, contiguous from 1.
    pub version: i64,
    /// Store-assigned timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// A new event as produced by a command handler, before the store has
/// assigned its identifier and timestamp.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Aggregate type discriminator.
    pub aggregate_type: String,
    /// Event type tag.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Version the event claims within the aggregate stream.
    pub version: i64,
}
