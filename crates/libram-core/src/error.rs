//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every fallible operation funnels into this enum so that all command
/// entry points classify failures identically.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A command failed domain validation before any event was emitted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Creation was attempted for an aggregate that already has history.
    #[error("aggregate already exists: {0}")]
    AlreadyExists(Uuid),

    /// The aggregate has no visible state.
    #[error("aggregate not found: {0}")]
    NotFound(Uuid),

    /// Optimistic concurrency conflict: the `(aggregate_id, version)`
    /// slot was taken by a concurrent writer.
    #[error("version conflict on aggregate {aggregate_id} at version {version}")]
    Conflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version that was already occupied.
        version: i64,
    },

    /// The stored history for an aggregate is undecodable or violates
    /// version contiguity. Fatal for that aggregate, never skipped.
    #[error("corrupt event log for aggregate {aggregate_id}: {detail}")]
    CorruptLog {
        /// The aggregate whose log is damaged.
        aggregate_id: Uuid,
        /// What was wrong with the history.
        detail: String,
    },

    /// The backing store or event feed is unreachable or failing.
    #[error("connectivity error: {0}")]
    Connectivity(String),
}
