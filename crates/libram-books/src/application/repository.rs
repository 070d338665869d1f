//! Replay-based access to book aggregates.

use std::sync::Arc;

use uuid::Uuid;

use libram_core::error::DomainError;
use libram_core::event::{EventDraft, EventRecord};
use libram_core::store::EventStore;

use crate::domain::aggregates::{Book, BookState};
use crate::domain::events::BookEvent;

/// Loads aggregates by replaying their events and appends new history.
///
/// The repository holds no cache; every read replays the aggregate's
/// stored events through the pure fold.
#[derive(Clone)]
pub struct BookRepository {
    store: Arc<dyn EventStore>,
}

impl BookRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Replays the full history of one aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CorruptLog`] when the stored history does
    /// not fold, and propagates store failures.
    pub async fn load_state(&self, aggregate_id: Uuid) -> Result<BookState, DomainError> {
        let records = self.store.events_for(aggregate_id).await?;
        let mut state = BookState::NonExistent;
        for record in &records {
            let event = BookEvent::decode(record)?;
            state = state.apply(&event)?;
        }
        Ok(state)
    }

    /// Returns the live book, treating deleted aggregates the same as
    /// absent ones.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] unless the aggregate folds to an
    /// active book.
    pub async fn get_by_id(&self, aggregate_id: Uuid) -> Result<Book, DomainError> {
        match self.load_state(aggregate_id).await? {
            BookState::Active(book) => Ok(book),
            BookState::NonExistent | BookState::Deleted(_) => {
                Err(DomainError::NotFound(aggregate_id))
            }
        }
    }

    /// Appends drafts to the store in order, stopping at the first
    /// failure. Already appended drafts stay appended; retry is caller
    /// policy.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure unchanged.
    pub async fn append(&self, drafts: Vec<EventDraft>) -> Result<Vec<EventRecord>, DomainError> {
        let mut records = Vec::with_capacity(drafts.len());
        for draft in drafts {
            records.push(self.store.append(draft).await?);
        }
        Ok(records)
    }

    /// Replays every aggregate seen in the log, in first-appearance
    /// order, skipping deleted ones. Linear in the size of the log.
    ///
    /// # Errors
    ///
    /// Propagates store failures and corrupt histories.
    pub async fn list_all(&self) -> Result<Vec<Book>, DomainError> {
        let records = self.store.all_events(None).await?;
        let mut aggregate_ids: Vec<Uuid> = Vec::new();
        for record in &records {
            if !aggregate_ids.contains(&record.aggregate_id) {
                aggregate_ids.push(record.aggregate_id);
            }
        }

        let mut books = Vec::new();
        for aggregate_id in aggregate_ids {
            if let BookState::Active(book) = self.load_state(aggregate_id).await? {
                books.push(book);
            }
        }
        Ok(books)
    }
}
