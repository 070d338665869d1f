//! Cache contract fronting hot read-model queries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use libram_core::clock::Clock;
use libram_read_model::BookReadModel;

/// Default cache entry lifetime in seconds.
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Cache fronting single-book lookups and the default book listing.
///
/// Implementations are best-effort: every operation is infallible from
/// the caller's side, and a backend failure must degrade to a miss, not
/// fail the request. Staleness is bounded by the entry lifetime.
#[async_trait]
pub trait BookCache: Send + Sync {
    /// Returns the cached row for a book, if still fresh.
    async fn get(&self, id: Uuid) -> Option<BookReadModel>;

    /// Caches one row.
    async fn put(&self, book: BookReadModel);

    /// Drops a cached row.
    async fn remove(&self, id: Uuid);

    /// Returns the cached default listing, if still fresh.
    async fn cached_list(&self) -> Option<Vec<BookReadModel>>;

    /// Caches the default listing.
    async fn put_list(&self, books: Vec<BookReadModel>);

    /// Drops the cached default listing.
    async fn invalidate_list(&self);
}

struct Entry<T> {
    expires_at: DateTime<Utc>,
    value: T,
}

/// TTL-based in-process implementation of [`BookCache`].
///
/// Expired entries are replaced on the next put; there is no background
/// sweep.
pub struct InMemoryBookCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    rows: RwLock<HashMap<Uuid, Entry<BookReadModel>>>,
    list: RwLock<Option<Entry<Vec<BookReadModel>>>>,
}

impl InMemoryBookCache {
    /// Creates a cache whose entries live for `ttl_seconds`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl_seconds: i64) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(ttl_seconds),
            rows: RwLock::new(HashMap::new()),
            list: RwLock::new(None),
        }
    }

    fn entry<T>(&self, value: T) -> Entry<T> {
        Entry {
            expires_at: self.clock.now() + self.ttl,
            value,
        }
    }
}

#[async_trait]
impl BookCache for InMemoryBookCache {
    async fn get(&self, id: Uuid) -> Option<BookReadModel> {
        let rows = self.rows.read().await;
        let entry = rows.get(&id)?;
        if self.clock.now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    async fn put(&self, book: BookReadModel) {
        let id = book.id;
        let entry = self.entry(book);
        self.rows.write().await.insert(id, entry);
    }

    async fn remove(&self, id: Uuid) {
        self.rows.write().await.remove(&id);
    }

    async fn cached_list(&self) -> Option<Vec<BookReadModel>> {
        let list = self.list.read().await;
        let entry = list.as_ref()?;
        if self.clock.now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    async fn put_list(&self, books: Vec<BookReadModel>) {
        *self.list.write().await = Some(self.entry(books));
    }

    async fn invalidate_list(&self) {
        *self.list.write().await = None;
    }
}
