//! `PostgreSQL` implementation of the `EventStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use libram_core::error::DomainError;
use libram_core::event::{EventDraft, EventRecord};
use libram_core::store::EventStore;

/// PostgreSQL-backed event store.
///
/// Uses runtime-bound queries so the crate builds without a live
/// database. Identifier and timestamp assignment happen in the database
/// (`BIGSERIAL` and `DEFAULT NOW()`).
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore` on an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    aggregate_id: Uuid,
    aggregate_type: String,
    event_type: String,
    payload: serde_json::Value,
    version: i64,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            event_type: row.event_type,
            payload: row.payload,
            version: row.version,
            occurred_at: row.occurred_at,
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, draft: EventDraft) -> Result<EventRecord, DomainError> {
        tracing::debug!(
            aggregate_id = %draft.aggregate_id,
            event_type = %draft.event_type,
            version = draft.version,
            "appending event"
        );

        let (id, occurred_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO book_events (aggregate_id, aggregate_type, event_type, payload, version)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, occurred_at",
        )
        .bind(draft.aggregate_id)
        .bind(&draft.aggregate_type)
        .bind(&draft.event_type)
        .bind(&draft.payload)
        .bind(draft.version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DomainError::Conflict {
                    aggregate_id: draft.aggregate_id,
                    version: draft.version,
                }
            }
            _ => DomainError::Connectivity(format!("failed to append event: {e}")),
        })?;

        Ok(EventRecord {
            id,
            aggregate_id: draft.aggregate_id,
            aggregate_type: draft.aggregate_type,
            event_type: draft.event_type,
            payload: draft.payload,
            version: draft.version,
            occurred_at,
        })
    }

    async fn events_for(&self, aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT id, aggregate_id, aggregate_type, event_type, payload, version, occurred_at
             FROM book_events
             WHERE aggregate_id = $1
             ORDER BY version",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to load events: {e}")))?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    async fn latest_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        let (version,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) FROM book_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to read latest version: {e}")))?;

        Ok(version)
    }

    async fn all_events(
        &self,
        event_type: Option<&str>,
    ) -> Result<Vec<EventRecord>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT id, aggregate_id, aggregate_type, event_type, payload, version, occurred_at
             FROM book_events
             WHERE ($1::varchar IS NULL OR event_type = $1)
             ORDER BY occurred_at, id",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to scan events: {e}")))?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}
