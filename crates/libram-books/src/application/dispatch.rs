//! Single dispatch point for book commands.
//!
//! Every entry path funnels through [`execute`] so that HTTP requests
//! and command-feed messages run the same handlers and classify
//! failures identically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libram_core::clock::Clock;
use libram_core::error::DomainError;
use libram_core::event::EventRecord;

use crate::application::command_handlers;
use crate::application::publisher::EventPublisher;
use crate::application::repository::BookRepository;
use crate::domain::commands::{CreateBook, DeleteBook, UpdateBook};

/// Feed topic that carries inbound command envelopes.
pub const COMMAND_TOPIC: &str = "book.commands";

/// Wire envelope for book commands.
///
/// Serializes as `{"command_type": ..., "command_data": {...}}`, the
/// shape command-feed producers send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "command_data", rename_all = "snake_case")]
pub enum BookCommand {
    /// Register a new book.
    CreateBook(CreateBook),
    /// Change fields on an existing book.
    UpdateBook(UpdateBook),
    /// Remove a book from the catalog.
    DeleteBook(DeleteBook),
}

impl BookCommand {
    /// The aggregate the command addresses.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            Self::CreateBook(c) => c.aggregate_id,
            Self::UpdateBook(c) => c.aggregate_id,
            Self::DeleteBook(c) => c.aggregate_id,
        }
    }

    /// The wire name of the command, for logging.
    #[must_use]
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::CreateBook(_) => "create_book",
            Self::UpdateBook(_) => "update_book",
            Self::DeleteBook(_) => "delete_book",
        }
    }
}

/// Runs a command end to end: handle, append, publish.
///
/// Publishing happens only after the append succeeded. A publish failure
/// is logged inside the publisher and does not fail the command; no
/// transaction spans the store and the feed.
///
/// # Errors
///
/// Propagates the handler's domain error unchanged.
pub async fn execute(
    command: &BookCommand,
    clock: &dyn Clock,
    repository: &BookRepository,
    publisher: &EventPublisher,
) -> Result<Vec<EventRecord>, DomainError> {
    let records = match command {
        BookCommand::CreateBook(c) => {
            command_handlers::handle_create_book(c, clock, repository).await?
        }
        BookCommand::UpdateBook(c) => {
            command_handlers::handle_update_book(c, clock, repository).await?
        }
        BookCommand::DeleteBook(c) => {
            command_handlers::handle_delete_book(c, clock, repository).await?
        }
    };
    publisher.publish_all(&records).await;
    Ok(records)
}
