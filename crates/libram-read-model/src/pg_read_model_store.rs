//! PostgreSQL-backed read model store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use libram_core::error::DomainError;

use crate::model::{self, BookReadModel, BookSearch, BookStatistics};
use crate::store::ReadModelStore;

/// Read model store backed by the `book_read_models` table.
pub struct PgReadModelStore {
    pool: PgPool,
}

impl PgReadModelStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadModelStore for PgReadModelStore {
    async fn get(&self, id: Uuid) -> Result<Option<BookReadModel>, DomainError> {
        sqlx::query_as::<_, BookReadModel>(
            r"
            SELECT id, title, description, author, version, created_at, updated_at
            FROM book_read_models
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to load read model: {e}")))
    }

    async fn put(&self, book: BookReadModel) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO book_read_models
                (id, title, description, author, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                title       = EXCLUDED.title,
                description = EXCLUDED.description,
                author      = EXCLUDED.author,
                version     = EXCLUDED.version,
                created_at  = EXCLUDED.created_at,
                updated_at  = EXCLUDED.updated_at
            ",
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.author)
        .bind(book.version)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to upsert read model: {e}")))?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM book_read_models WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Connectivity(format!("failed to remove read model: {e}")))?;
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<BookReadModel>, DomainError> {
        sqlx::query_as::<_, BookReadModel>(
            r"
            SELECT id, title, description, author, version, created_at, updated_at
            FROM book_read_models
            ORDER BY created_at, id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to list read models: {e}")))
    }

    async fn search(&self, search: &BookSearch) -> Result<Vec<BookReadModel>, DomainError> {
        let title = search.title.as_ref().map(|t| format!("%{t}%"));
        let author = search.author.as_ref().map(|a| format!("%{a}%"));
        let description = search.description.as_ref().map(|d| format!("%{d}%"));

        sqlx::query_as::<_, BookReadModel>(
            r"
            SELECT id, title, description, author, version, created_at, updated_at
            FROM book_read_models
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
              AND ($3::text IS NULL OR description ILIKE $3)
            ORDER BY created_at, id
            ",
        )
        .bind(title)
        .bind(author)
        .bind(description)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to search read models: {e}")))
    }

    async fn recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookReadModel>, DomainError> {
        sqlx::query_as::<_, BookReadModel>(
            r"
            SELECT id, title, description, author, version, created_at, updated_at
            FROM book_read_models
            WHERE created_at >= $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to load recent read models: {e}")))
    }

    async fn statistics(&self, since: DateTime<Utc>) -> Result<BookStatistics, DomainError> {
        let (total_books,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book_read_models")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Connectivity(format!("failed to count read models: {e}")))?;

        let by_author: Vec<(String, i64)> = sqlx::query_as(
            r"
            SELECT author, COUNT(*)
            FROM book_read_models
            GROUP BY author
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Connectivity(format!("failed to count books by author: {e}")))?;

        let (recent_books,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM book_read_models WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::Connectivity(format!("failed to count recent read models: {e}"))
                })?;

        let books_by_author: BTreeMap<String, i64> = by_author.into_iter().collect();
        let most_popular_author = model::most_popular_author(&books_by_author);

        Ok(BookStatistics {
            total_books,
            books_by_author,
            recent_books,
            most_popular_author,
        })
    }

    async fn authors(&self) -> Result<Vec<String>, DomainError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT author FROM book_read_models ORDER BY author")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::Connectivity(format!("failed to list authors: {e}")))?;
        Ok(rows.into_iter().map(|(author,)| author).collect())
    }
}
