//! Commands for the Book context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to register a new book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    /// Aggregate identifier chosen by the caller.
    pub aggregate_id: Uuid,
    /// Book title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Book author.
    pub author: String,
}

/// Command to change fields on an existing book.
///
/// At least one field must be supplied; `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBook {
    /// The book to update.
    pub aggregate_id: Uuid,
    /// New title, if any.
    pub title: Option<String>,
    /// New description, if any.
    pub description: Option<String>,
    /// New author, if any.
    pub author: Option<String>,
}

/// Command to remove a book from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBook {
    /// The book to delete.
    pub aggregate_id: Uuid,
}
