//! The book aggregate and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use libram_core::error::DomainError;

use super::events::{BookEvent, BookEventKind};

/// A fully materialized book, derived purely from its event history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Book title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Book author.
    pub author: String,
    /// Version of the last applied event.
    pub version: i64,
    /// When the book was created.
    pub created_at: DateTime<Utc>,
    /// When the book last changed.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a book aggregate.
///
/// `Deleted` is terminal: a deleted book accepts no further events, so an
/// aggregate identifier can never be resurrected.
#[derive(Debug, Clone, PartialEq)]
pub enum BookState {
    /// No events exist for the aggregate.
    NonExistent,
    /// The book is live.
    Active(Book),
    /// The book was removed; the last known state is retained.
    Deleted(Book),
}

impl BookState {
    /// Folds one event into the state.
    ///
    /// The fold is pure and total: every state and event pairing either
    /// produces the next state or reports the history as corrupt.
    /// Replaying the same sequence always yields the same state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CorruptLog`] when the event does not fit
    /// the current state or its version is not the next in the stream.
    pub fn apply(self, event: &BookEvent) -> Result<Self, DomainError> {
        match (self, &event.kind) {
            (Self::NonExistent, BookEventKind::Created(payload)) => {
                if event.version != 1 {
                    return Err(DomainError::CorruptLog {
                        aggregate_id: event.aggregate_id,
                        detail: format!("created event at version {}", event.version),
                    });
                }
                Ok(Self::Active(Book {
                    id: event.aggregate_id,
                    title: payload.title.clone(),
                    description: payload.description.clone(),
                    author: payload.author.clone(),
                    version: event.version,
                    created_at: payload.created_at,
                    updated_at: payload.created_at,
                }))
            }
            (Self::Active(mut book), BookEventKind::Updated(payload)) => {
                if event.version != book.version + 1 {
                    return Err(DomainError::CorruptLog {
                        aggregate_id: event.aggregate_id,
                        detail: format!(
                            "updated event at version {} after version {}",
                            event.version, book.version
                        ),
                    });
                }
                if let Some(title) = &payload.title {
                    book.title = title.clone();
                }
                if let Some(description) = &payload.description {
                    book.description = Some(description.clone());
                }
                if let Some(author) = &payload.author {
                    book.author = author.clone();
                }
                book.version = event.version;
                book.updated_at = payload.updated_at;
                Ok(Self::Active(book))
            }
            (Self::Active(mut book), BookEventKind::Deleted(payload)) => {
                if event.version != book.version + 1 {
                    return Err(DomainError::CorruptLog {
                        aggregate_id: event.aggregate_id,
                        detail: format!(
                            "deleted event at version {} after version {}",
                            event.version, book.version
                        ),
                    });
                }
                book.version = event.version;
                book.updated_at = payload.deleted_at;
                Ok(Self::Deleted(book))
            }
            (state, kind) => Err(DomainError::CorruptLog {
                aggregate_id: event.aggregate_id,
                detail: format!(
                    "{} event does not apply to {} aggregate",
                    kind.event_type(),
                    state.name()
                ),
            }),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NonExistent => "non-existent",
            Self::Active(_) => "active",
            Self::Deleted(_) => "deleted",
        }
    }
}
