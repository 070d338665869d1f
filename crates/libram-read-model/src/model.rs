//! Read model row and query types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One queryable row per live book.
///
/// Maintained only by the projector; may lag the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookReadModel {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Book title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Book author.
    pub author: String,
    /// Version of the last projected event.
    pub version: i64,
    /// When the book was created.
    pub created_at: DateTime<Utc>,
    /// When the row last changed.
    pub updated_at: DateTime<Utc>,
}

/// Case-insensitive substring filters, combined with AND.
///
/// An empty search matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSearch {
    /// Substring to match against titles.
    pub title: Option<String>,
    /// Substring to match against authors.
    pub author: Option<String>,
    /// Substring to match against descriptions.
    pub description: Option<String>,
}

/// Aggregated catalog counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStatistics {
    /// Number of live books.
    pub total_books: i64,
    /// Live book count per author.
    pub books_by_author: BTreeMap<String, i64>,
    /// Books created since the requested cutoff.
    pub recent_books: i64,
    /// Author with the most live books, `None` for an empty catalog.
    /// Ties resolve to the alphabetically first author.
    pub most_popular_author: Option<String>,
}

/// Picks the most frequent author. Iteration order of the map makes the
/// alphabetically first author win ties.
pub(crate) fn most_popular_author(books_by_author: &BTreeMap<String, i64>) -> Option<String> {
    let mut best: Option<(&String, i64)> = None;
    for (author, count) in books_by_author {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((author, *count)),
        }
    }
    best.map(|(author, _)| author.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_popular_author_prefers_highest_count() {
        // Arrange
        let mut counts = BTreeMap::new();
        counts.insert("Frank Herbert".to_owned(), 3);
        counts.insert("Dan Simmons".to_owned(), 1);

        // Act / Assert
        assert_eq!(
            most_popular_author(&counts).as_deref(),
            Some("Frank Herbert")
        );
    }

    #[test]
    fn test_most_popular_author_breaks_ties_alphabetically() {
        // Arrange
        let mut counts = BTreeMap::new();
        counts.insert("Frank Herbert".to_owned(), 2);
        counts.insert("Dan Simmons".to_owned(), 2);

        // Act / Assert
        assert_eq!(most_popular_author(&counts).as_deref(), Some("Dan Simmons"));
    }

    #[test]
    fn test_most_popular_author_of_empty_catalog_is_none() {
        assert_eq!(most_popular_author(&BTreeMap::new()), None);
    }
}
