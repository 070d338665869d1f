//! Projection of book events onto the read model.
//!
//! The feed delivers at least once and topics are independent, so the
//! projector must absorb duplicates and out-of-order arrivals. Dedup is
//! by `(aggregate_id, version)`: a creation for an existing row and an
//! update at or below the row version are skipped. Updates that arrive
//! before their creation are buffered per aggregate and drained, in
//! version order, once the creation lands. Deletions tombstone the
//! aggregate so late events cannot resurrect the row.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use uuid::Uuid;

use libram_books::domain::events::{
    BOOK_CREATED, BOOK_DELETED, BOOK_UPDATED, BookCreated, BookDeleted, BookUpdated,
};
use libram_core::bus::EventMessage;
use libram_core::error::DomainError;

use crate::model::BookReadModel;
use crate::store::ReadModelStore;

/// Cap on out-of-order updates held per aggregate while its creation is
/// outstanding. Past this the log is treated as corrupt rather than
/// holding an unbounded buffer.
const MAX_BUFFERED_UPDATES: usize = 64;

/// What the projector did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// The read model changed.
    Applied,
    /// Duplicate or stale message; the read model is unchanged.
    Skipped,
    /// Update held until its creation event arrives.
    Buffered,
}

/// Folds book events into the read model store.
///
/// Intended to be driven by a single worker. Processing one message at
/// a time keeps the per-aggregate version checks free of races.
pub struct BookProjector {
    store: Arc<dyn ReadModelStore>,
    pending: Mutex<HashMap<Uuid, BTreeMap<i64, BookUpdated>>>,
    tombstones: Mutex<HashSet<Uuid>>,
}

impl BookProjector {
    /// Creates a projector writing to the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ReadModelStore>) -> Self {
        Self {
            store,
            pending: Mutex::new(HashMap::new()),
            tombstones: Mutex::new(HashSet::new()),
        }
    }

    /// Applies one feed message to the read model.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CorruptLog`] for an unknown event type, an
    /// undecodable payload, or an overflowing out-of-order buffer, and
    /// propagates store failures.
    pub async fn project(&self, message: &EventMessage) -> Result<ProjectionOutcome, DomainError> {
        match message.event_type.as_str() {
            BOOK_CREATED => self.apply_created(message).await,
            BOOK_UPDATED => self.apply_updated(message).await,
            BOOK_DELETED => self.apply_deleted(message).await,
            other => Err(DomainError::CorruptLog {
                aggregate_id: message.aggregate_id,
                detail: format!("unknown event type: {other}"),
            }),
        }
    }

    async fn apply_created(
        &self,
        message: &EventMessage,
    ) -> Result<ProjectionOutcome, DomainError> {
        let payload: BookCreated = decode_message(message)?;
        let id = message.aggregate_id;

        if self.tombstones.lock().await.contains(&id) {
            return Ok(ProjectionOutcome::Skipped);
        }
        if self.store.get(id).await?.is_some() {
            return Ok(ProjectionOutcome::Skipped);
        }

        let mut row = BookReadModel {
            id,
            title: payload.title,
            description: payload.description,
            author: payload.author,
            version: message.version,
            created_at: payload.created_at,
            updated_at: payload.created_at,
        };

        // Drain updates that overtook the creation on the feed.
        let buffered = self.pending.lock().await.remove(&id);
        if let Some(updates) = buffered {
            for (version, update) in updates {
                if version > row.version {
                    merge_update(&mut row, version, &update);
                }
            }
        }

        self.store.put(row).await?;
        Ok(ProjectionOutcome::Applied)
    }

    async fn apply_updated(
        &self,
        message: &EventMessage,
    ) -> Result<ProjectionOutcome, DomainError> {
        let payload: BookUpdated = decode_message(message)?;
        let id = message.aggregate_id;

        if self.tombstones.lock().await.contains(&id) {
            return Ok(ProjectionOutcome::Skipped);
        }

        match self.store.get(id).await? {
            Some(mut row) => {
                if message.version <= row.version {
                    return Ok(ProjectionOutcome::Skipped);
                }
                merge_update(&mut row, message.version, &payload);
                self.store.put(row).await?;
                Ok(ProjectionOutcome::Applied)
            }
            None => {
                let mut pending = self.pending.lock().await;
                let buffer = pending.entry(id).or_default();
                if buffer.len() >= MAX_BUFFERED_UPDATES && !buffer.contains_key(&message.version) {
                    return Err(DomainError::CorruptLog {
                        aggregate_id: id,
                        detail: format!(
                            "{MAX_BUFFERED_UPDATES} updates buffered with no creation event"
                        ),
                    });
                }
                buffer.insert(message.version, payload);
                Ok(ProjectionOutcome::Buffered)
            }
        }
    }

    async fn apply_deleted(
        &self,
        message: &EventMessage,
    ) -> Result<ProjectionOutcome, DomainError> {
        let _payload: BookDeleted = decode_message(message)?;
        let id = message.aggregate_id;

        self.tombstones.lock().await.insert(id);
        self.pending.lock().await.remove(&id);
        self.store.remove(id).await?;
        Ok(ProjectionOutcome::Applied)
    }
}

fn merge_update(row: &mut BookReadModel, version: i64, update: &BookUpdated) {
    if let Some(title) = &update.title {
        row.title = title.clone();
    }
    if let Some(description) = &update.description {
        row.description = Some(description.clone());
    }
    if let Some(author) = &update.author {
        row.author = author.clone();
    }
    row.version = version;
    row.updated_at = update.updated_at;
}

fn decode_message<T: DeserializeOwned>(message: &EventMessage) -> Result<T, DomainError> {
    serde_json::from_value(message.payload.clone()).map_err(|e| DomainError::CorruptLog {
        aggregate_id: message.aggregate_id,
        detail: format!("undecodable {} payload: {e}", message.event_type),
    })
}
