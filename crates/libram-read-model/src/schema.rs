//! Read model database schema.

use sqlx::PgPool;

use libram_core::error::DomainError;

/// SQL to create the read model table.
pub const CREATE_READ_MODELS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS book_read_models (
    id          UUID PRIMARY KEY,
    title       VARCHAR(255) NOT NULL,
    description TEXT,
    author      VARCHAR(255) NOT NULL,
    version     BIGINT NOT NULL DEFAULT 1,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_book_read_models_author
    ON book_read_models (author);

CREATE INDEX IF NOT EXISTS idx_book_read_models_created_at
    ON book_read_models (created_at);
";

/// Creates the read model table and its indexes if they do not exist.
///
/// # Errors
///
/// Returns [`DomainError::Connectivity`] when the statements cannot be
/// executed.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::raw_sql(CREATE_READ_MODELS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("read model schema setup failed: {e}")))?;
    Ok(())
}
