//! Event store database schema.

use sqlx::PgPool;

use libram_core::error::DomainError;

/// SQL to create the event log table.
///
/// The `UNIQUE (aggregate_id, version)` constraint is the optimistic
/// concurrency control for the whole write path.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS book_events (
    id             BIGSERIAL PRIMARY KEY,
    aggregate_id   UUID NOT NULL,
    aggregate_type VARCHAR(100) NOT NULL,
    event_type     VARCHAR(100) NOT NULL,
    payload        JSONB NOT NULL,
    version        BIGINT NOT NULL,
    occurred_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (aggregate_id, version)
);

CREATE INDEX IF NOT EXISTS idx_book_events_aggregate_id
    ON book_events (aggregate_id, version);

CREATE INDEX IF NOT EXISTS idx_book_events_event_type
    ON book_events (event_type);
";

/// Creates the event log table and its indexes if they do not exist.
///
/// # Errors
///
/// Returns [`DomainError::Connectivity`] when the statements cannot be
/// executed.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::raw_sql(CREATE_EVENTS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("event store schema setup failed: {e}")))?;
    Ok(())
}
