//! Domain events for the Book context.
//!
//! The stored payload is the flat inner struct; the `event_type` column
//! carries the tag. Decoding an unknown type or a malformed payload is a
//! corrupt log, never a skip.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libram_core::error::DomainError;
use libram_core::event::{EventDraft, EventRecord};

/// Aggregate type discriminator stored with every book event.
pub const AGGREGATE_TYPE: &str = "Book";

/// Event type for book creation; doubles as the feed topic.
pub const BOOK_CREATED: &str = "book.created";
/// Event type for book field changes; doubles as the feed topic.
pub const BOOK_UPDATED: &str = "book.updated";
/// Event type for book removal; doubles as the feed topic.
pub const BOOK_DELETED: &str = "book.deleted";

/// Emitted when a book is registered in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreated {
    /// Book title.
    pub title: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Book author.
    pub author: String,
    /// When the book was created.
    pub created_at: DateTime<Utc>,
}

/// Emitted when book fields change.
///
/// Only the supplied fields appear in the payload; `None` means the
/// field is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdated {
    /// New title, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New author, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// When the change happened.
    pub updated_at: DateTime<Utc>,
}

/// Emitted when a book is removed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDeleted {
    /// When the book was deleted.
    pub deleted_at: DateTime<Utc>,
}

/// Event payload variants for the Book context.
#[derive(Debug, Clone)]
pub enum BookEventKind {
    /// A book was registered.
    Created(BookCreated),
    /// Book fields changed.
    Updated(BookUpdated),
    /// The book was removed.
    Deleted(BookDeleted),
}

impl BookEventKind {
    /// Returns the event type tag for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => BOOK_CREATED,
            Self::Updated(_) => BOOK_UPDATED,
            Self::Deleted(_) => BOOK_DELETED,
        }
    }

    /// Serializes the payload without an enum wrapper; the event type
    /// column is the tag.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        match self {
            Self::Created(payload) => serde_json::to_value(payload),
            Self::Updated(payload) => serde_json::to_value(payload),
            Self::Deleted(payload) => serde_json::to_value(payload),
        }
        .expect("book event payload serialization is infallible")
    }

    /// Packages the payload as a draft for the event store.
    #[must_use]
    pub fn into_draft(self, aggregate_id: Uuid, version: i64) -> EventDraft {
        EventDraft {
            aggregate_id,
            aggregate_type: AGGREGATE_TYPE.to_owned(),
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            version,
        }
    }
}

/// Domain event envelope for the Book context.
#[derive(Debug, Clone)]
pub struct BookEvent {
    /// Aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Per-aggregate version of the event.
    pub version: i64,
    /// Event-specific payload.
    pub kind: BookEventKind,
}

impl BookEvent {
    /// Decodes a stored record into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::CorruptLog`] for an unknown event type or
    /// an undecodable payload.
    pub fn decode(record: &EventRecord) -> Result<Self, DomainError> {
        let kind = match record.event_type.as_str() {
            BOOK_CREATED => BookEventKind::Created(decode_payload(record)?),
            BOOK_UPDATED => BookEventKind::Updated(decode_payload(record)?),
            BOOK_DELETED => BookEventKind::Deleted(decode_payload(record)?),
            other => {
                return Err(DomainError::CorruptLog {
                    aggregate_id: record.aggregate_id,
                    detail: format!("unknown event type: {other}"),
                });
            }
        };
        Ok(Self {
            aggregate_id: record.aggregate_id,
            version: record.version,
            kind,
        })
    }
}

fn decode_payload<T: DeserializeOwned>(record: &EventRecord) -> Result<T, DomainError> {
    serde_json::from_value(record.payload.clone()).map_err(|e| DomainError::CorruptLog {
        aggregate_id: record.aggregate_id,
        detail: format!("undecodable {} payload: {e}", record.event_type),
    })
}
