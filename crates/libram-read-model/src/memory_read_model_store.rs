//! In-memory read model store for tests and local development.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use libram_core::error::DomainError;

use crate::model::{self, BookReadModel, BookSearch, BookStatistics};
use crate::store::ReadModelStore;

/// Read model store that keeps all rows in process memory.
///
/// Mirrors the query semantics of [`crate::PgReadModelStore`] so tests
/// exercise the same ordering and filtering behavior without a database.
#[derive(Default)]
pub struct MemoryReadModelStore {
    books: RwLock<HashMap<Uuid, BookReadModel>>,
}

impl MemoryReadModelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ReadModelStore for MemoryReadModelStore {
    async fn get(&self, id: Uuid) -> Result<Option<BookReadModel>, DomainError> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn put(&self, book: BookReadModel) -> Result<(), DomainError> {
        self.books.write().await.insert(book.id, book);
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), DomainError> {
        self.books.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<BookReadModel>, DomainError> {
        let mut books: Vec<BookReadModel> = self.books.read().await.values().cloned().collect();
        books.sort_by_key(|b| (b.created_at, b.id));
        Ok(books
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn search(&self, search: &BookSearch) -> Result<Vec<BookReadModel>, DomainError> {
        let mut books: Vec<BookReadModel> = self
            .books
            .read()
            .await
            .values()
            .filter(|b| {
                search.title.as_ref().is_none_or(|t| matches(&b.title, t))
                    && search.author.as_ref().is_none_or(|a| matches(&b.author, a))
                    && search.description.as_ref().is_none_or(|d| {
                        b.description.as_ref().is_some_and(|desc| matches(desc, d))
                    })
            })
            .cloned()
            .collect();
        books.sort_by_key(|b| (b.created_at, b.id));
        Ok(books)
    }

    async fn recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookReadModel>, DomainError> {
        let mut books: Vec<BookReadModel> = self
            .books
            .read()
            .await
            .values()
            .filter(|b| b.created_at >= since)
            .cloned()
            .collect();
        books.sort_by_key(|b| (b.created_at, b.id));
        books.reverse();
        books.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(books)
    }

    async fn statistics(&self, since: DateTime<Utc>) -> Result<BookStatistics, DomainError> {
        let books = self.books.read().await;
        let total_books = i64::try_from(books.len()).unwrap_or(i64::MAX);

        let mut books_by_author: BTreeMap<String, i64> = BTreeMap::new();
        for book in books.values() {
            *books_by_author.entry(book.author.clone()).or_insert(0) += 1;
        }

        let recent_books = i64::try_from(
            books
                .values()
                .filter(|b| b.created_at >= since)
                .count(),
        )
        .unwrap_or(i64::MAX);

        let most_popular_author = model::most_popular_author(&books_by_author);

        Ok(BookStatistics {
            total_books,
            books_by_author,
            recent_books,
            most_popular_author,
        })
    }

    async fn authors(&self) -> Result<Vec<String>, DomainError> {
        let books = self.books.read().await;
        let mut authors: Vec<String> = books.values().map(|b| b.author.clone()).collect();
        authors.sort();
        authors.dedup();
        Ok(authors)
    }
}
