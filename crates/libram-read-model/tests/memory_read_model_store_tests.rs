//! Contract tests for `MemoryReadModelStore`.

use chrono::{DateTime, TimeZone, Utc};
use libram_read_model::{BookReadModel, BookSearch, MemoryReadModelStore, ReadModelStore};
use uuid::Uuid;

fn timestamp(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

/// Helper to build a read model row with sensible defaults.
fn make_book(title: &str, author: &str, hour: u32) -> BookReadModel {
    BookReadModel {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: Some(format!("{title} by {author}")),
        author: author.to_string(),
        version: 1,
        created_at: timestamp(hour),
        updated_at: timestamp(hour),
    }
}

// --- row access ---

#[tokio::test]
async fn test_get_returns_none_for_unknown_id() {
    let store = MemoryReadModelStore::new();

    let row = store.get(Uuid::new_v4()).await.unwrap();

    assert_eq!(row, None);
}

#[tokio::test]
async fn test_put_then_get_round_trips_the_row() {
    let store = MemoryReadModelStore::new();
    let book = make_book("Dune", "Frank Herbert", 8);

    store.put(book.clone()).await.unwrap();

    assert_eq!(store.get(book.id).await.unwrap(), Some(book));
}

#[tokio::test]
async fn test_put_replaces_an_existing_row() {
    let store = MemoryReadModelStore::new();
    let mut book = make_book("Dune", "Frank Herbert", 8);
    store.put(book.clone()).await.unwrap();

    book.title = "Dune Messiah".to_string();
    book.version = 2;
    store.put(book.clone()).await.unwrap();

    let loaded = store.get(book.id).await.unwrap().unwrap();
    assert_eq!(loaded.title, "Dune Messiah");
    assert_eq!(loaded.version, 2);
}

#[tokio::test]
async fn test_remove_deletes_the_row_and_is_silent_when_absent() {
    let store = MemoryReadModelStore::new();
    let book = make_book("Dune", "Frank Herbert", 8);
    store.put(book.clone()).await.unwrap();

    store.remove(book.id).await.unwrap();
    store.remove(book.id).await.unwrap();

    assert_eq!(store.get(book.id).await.unwrap(), None);
}

// --- listing ---

#[tokio::test]
async fn test_list_orders_by_creation_time() {
    let store = MemoryReadModelStore::new();
    for book in [
        make_book("Children of Dune", "Frank Herbert", 11),
        make_book("Dune", "Frank Herbert", 9),
        make_book("Dune Messiah", "Frank Herbert", 10),
    ] {
        store.put(book).await.unwrap();
    }

    let listed = store.list(100, 0).await.unwrap();

    let titles: Vec<&str> = listed.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Dune", "Dune Messiah", "Children of Dune"]);
}

#[tokio::test]
async fn test_list_applies_limit_and_offset() {
    let store = MemoryReadModelStore::new();
    for hour in 9..=12 {
        store
            .put(make_book(&format!("Book {hour}"), "Frank Herbert", hour))
            .await
            .unwrap();
    }

    let page = store.list(2, 1).await.unwrap();

    let titles: Vec<&str> = page.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Book 10", "Book 11"]);
}

#[tokio::test]
async fn test_list_breaks_timestamp_ties_by_id() {
    let store = MemoryReadModelStore::new();
    let first = make_book("Dune", "Frank Herbert", 9);
    let second = make_book("Hyperion", "Dan Simmons", 9);
    store.put(first.clone()).await.unwrap();
    store.put(second.clone()).await.unwrap();

    let listed = store.list(100, 0).await.unwrap();

    let mut expected = [first.id, second.id];
    expected.sort();
    let ids: Vec<Uuid> = listed.iter().map(|b| b.id).collect();
    assert_eq!(ids, expected);
}

// --- search ---

#[tokio::test]
async fn test_search_matches_title_substring_case_insensitively() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Dune Messiah", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("Hyperion", "Dan Simmons", 10)).await.unwrap();

    let found = store
        .search(&BookSearch {
            title: Some("messiah".to_string()),
            ..BookSearch::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Dune Messiah");
}

#[tokio::test]
async fn test_search_requires_all_supplied_filters_to_match() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Dune", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("Dune Companion", "Dan Simmons", 10)).await.unwrap();

    let found = store
        .search(&BookSearch {
            title: Some("Dune".to_string()),
            author: Some("herbert".to_string()),
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].author, "Frank Herbert");
}

#[tokio::test]
async fn test_search_description_filter_skips_rows_without_description() {
    let store = MemoryReadModelStore::new();
    let mut bare = make_book("Dune", "Frank Herbert", 9);
    bare.description = None;
    store.put(bare).await.unwrap();
    store.put(make_book("Hyperion", "Dan Simmons", 10)).await.unwrap();

    let found = store
        .search(&BookSearch {
            description: Some("by".to_string()),
            ..BookSearch::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Hyperion");
}

#[tokio::test]
async fn test_search_with_no_filters_returns_everything() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Dune", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("Hyperion", "Dan Simmons", 10)).await.unwrap();

    let found = store.search(&BookSearch::default()).await.unwrap();

    assert_eq!(found.len(), 2);
}

// --- recency ---

#[tokio::test]
async fn test_recent_filters_by_cutoff_and_orders_newest_first() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Old", "Frank Herbert", 1)).await.unwrap();
    store.put(make_book("Newer", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("Newest", "Frank Herbert", 10)).await.unwrap();

    let recent = store.recent(timestamp(8), 10).await.unwrap();

    let titles: Vec<&str> = recent.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Newest", "Newer"]);
}

#[tokio::test]
async fn test_recent_applies_the_limit() {
    let store = MemoryReadModelStore::new();
    for hour in 9..=12 {
        store
            .put(make_book(&format!("Book {hour}"), "Frank Herbert", hour))
            .await
            .unwrap();
    }

    let recent = store.recent(timestamp(8), 2).await.unwrap();

    let titles: Vec<&str> = recent.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Book 12", "Book 11"]);
}

// --- statistics ---

#[tokio::test]
async fn test_statistics_counts_totals_authors_and_recency() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Dune", "Frank Herbert", 1)).await.unwrap();
    store.put(make_book("Dune Messiah", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("The Dispossessed", "Ursula K. Le Guin", 10)).await.unwrap();

    let stats = store.statistics(timestamp(8)).await.unwrap();

    assert_eq!(stats.total_books, 3);
    assert_eq!(stats.books_by_author.get("Frank Herbert"), Some(&2));
    assert_eq!(stats.books_by_author.get("Ursula K. Le Guin"), Some(&1));
    assert_eq!(stats.recent_books, 2);
    assert_eq!(stats.most_popular_author.as_deref(), Some("Frank Herbert"));
}

#[tokio::test]
async fn test_statistics_breaks_popularity_ties_alphabetically() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Hyperion", "Dan Simmons", 9)).await.unwrap();
    store.put(make_book("Foundation", "Isaac Asimov", 10)).await.unwrap();

    let stats = store.statistics(timestamp(8)).await.unwrap();

    assert_eq!(stats.most_popular_author.as_deref(), Some("Dan Simmons"));
}

#[tokio::test]
async fn test_statistics_on_empty_store() {
    let store = MemoryReadModelStore::new();

    let stats = store.statistics(timestamp(8)).await.unwrap();

    assert_eq!(stats.total_books, 0);
    assert!(stats.books_by_author.is_empty());
    assert_eq!(stats.recent_books, 0);
    assert_eq!(stats.most_popular_author, None);
}

// --- authors ---

#[tokio::test]
async fn test_authors_are_distinct_and_sorted() {
    let store = MemoryReadModelStore::new();
    store.put(make_book("Dune", "Frank Herbert", 9)).await.unwrap();
    store.put(make_book("Dune Messiah", "Frank Herbert", 10)).await.unwrap();
    store.put(make_book("Hyperion", "Dan Simmons", 11)).await.unwrap();

    let authors = store.authors().await.unwrap();

    assert_eq!(authors, ["Dan Simmons", "Frank Herbert"]);
}
