//! Read model store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use libram_core::error::DomainError;

use crate::model::{BookReadModel, BookSearch, BookStatistics};

/// Storage for projected book rows.
///
/// Written only by the projector; everything else reads. Listing
/// operations order by `(created_at, id)` ascending unless stated
/// otherwise, so pagination is stable.
#[async_trait]
pub trait ReadModelStore: Send + Sync {
    /// Fetches one row by aggregate id.
    async fn get(&self, id: Uuid) -> Result<Option<BookReadModel>, DomainError>;

    /// Inserts or replaces a row.
    async fn put(&self, book: BookReadModel) -> Result<(), DomainError>;

    /// Deletes a row; absent rows are a no-op.
    async fn remove(&self, id: Uuid) -> Result<(), DomainError>;

    /// Pages through all rows.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<BookReadModel>, DomainError>;

    /// Case-insensitive substring search across title, author and
    /// description; filters are combined with AND.
    async fn search(&self, search: &BookSearch) -> Result<Vec<BookReadModel>, DomainError>;

    /// Rows created at or after `since`, newest first.
    async fn recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookReadModel>, DomainError>;

    /// Catalog counters; `since` bounds the recent-books counter.
    async fn statistics(&self, since: DateTime<Utc>) -> Result<BookStatistics, DomainError>;

    /// Distinct authors, sorted ascending.
    async fn authors(&self) -> Result<Vec<String>, DomainError>;
}
