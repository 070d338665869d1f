//! Command handlers for the Book context.
//!
//! Application-level functions that orchestrate domain logic: load the
//! aggregate, validate the command against it, and persist the resulting
//! event. Handlers read then append without locks; the store's version
//! uniqueness is the only safety net, so the second of two racing
//! commands surfaces a conflict. Retry is caller policy.

use libram_core::clock::Clock;
use libram_core::error::DomainError;
use libram_core::event::EventRecord;

use crate::application::repository::BookRepository;
use crate::domain::aggregates::BookState;
use crate::domain::commands::{CreateBook, DeleteBook, UpdateBook};
use crate::domain::events::{BookCreated, BookDeleted, BookEventKind, BookUpdated};

/// Handles `CreateBook`: validates input, rejects identifiers with any
/// existing history, and persists `book.created` at version 1.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank title or author, and
/// `DomainError::AlreadyExists` when the aggregate has history, deleted
/// included. An identifier is never reused for a new book.
pub async fn handle_create_book(
    command: &CreateBook,
    clock: &dyn Clock,
    repository: &BookRepository,
) -> Result<Vec<EventRecord>, DomainError> {
    if command.title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    if command.author.trim().is_empty() {
        return Err(DomainError::Validation("author must not be empty".into()));
    }

    match repository.load_state(command.aggregate_id).await? {
        BookState::NonExistent => {}
        BookState::Active(_) | BookState::Deleted(_) => {
            return Err(DomainError::AlreadyExists(command.aggregate_id));
        }
    }

    let kind = BookEventKind::Created(BookCreated {
        title: command.title.clone(),
        description: command.description.clone(),
        author: command.author.clone(),
        created_at: clock.now(),
    });
    repository
        .append(vec![kind.into_draft(command.aggregate_id, 1)])
        .await
}

/// Handles `UpdateBook`: persists `book.updated` carrying only the
/// supplied fields at the next version.
///
/// # Errors
///
/// Returns `DomainError::Validation` when no field is supplied and
/// `DomainError::NotFound` unless the book is active.
pub async fn handle_update_book(
    command: &UpdateBook,
    clock: &dyn Clock,
    repository: &BookRepository,
) -> Result<Vec<EventRecord>, DomainError> {
    if command.title.is_none() && command.description.is_none() && command.author.is_none() {
        return Err(DomainError::Validation("no fields to update".into()));
    }

    let book = match repository.load_state(command.aggregate_id).await? {
        BookState::Active(book) => book,
        BookState::NonExistent | BookState::Deleted(_) => {
            return Err(DomainError::NotFound(command.aggregate_id));
        }
    };

    let kind = BookEventKind::Updated(BookUpdated {
        title: command.title.clone(),
        description: command.description.clone(),
        author: command.author.clone(),
        updated_at: clock.now(),
    });
    repository
        .append(vec![kind.into_draft(command.aggregate_id, book.version + 1)])
        .await
}

/// Handles `DeleteBook`: persists the terminal `book.deleted` event at
/// the next version.
///
/// # Errors
///
/// Returns `DomainError::NotFound` unless the book is active. Deleting
/// twice is therefore rejected.
pub async fn handle_delete_book(
    command: &DeleteBook,
    clock: &dyn Clock,
    repository: &BookRepository,
) -> Result<Vec<EventRecord>, DomainError> {
    let book = match repository.load_state(command.aggregate_id).await? {
        BookState::Active(book) => book,
        BookState::NonExistent | BookState::Deleted(_) => {
            return Err(DomainError::NotFound(command.aggregate_id));
        }
    };

    let kind = BookEventKind::Deleted(BookDeleted {
        deleted_at: clock.now(),
    });
    repository
        .append(vec![kind.into_draft(command.aggregate_id, book.version + 1)])
        .await
}
