//! Routes for the read side of the catalog.

use axum::extract::{Path, Query, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::Duration;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use libram_core::error::DomainError;
use libram_read_model::{BookReadModel, BookSearch, BookStatistics};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;
const DEFAULT_RECENT_HOURS: i64 = 24;
const MAX_RECENT_HOURS: i64 = 168;
const DEFAULT_RECENT_LIMIT: i64 = 10;
const MAX_RECENT_LIMIT: i64 = 100;

/// Query parameters for GET /books.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Page size, 1 to 1000, default 100.
    pub limit: Option<i64>,
    /// Rows to skip, default 0.
    pub offset: Option<i64>,
}

/// Query parameters for GET /books/recent.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Look-back window in hours, 1 to 168, default 24.
    pub hours: Option<i64>,
    /// Maximum rows, 1 to 100, default 10.
    pub limit: Option<i64>,
}

/// Out-of-range values are rejected, not clamped.
fn bounded(name: &str, value: Option<i64>, default: i64, max: i64) -> Result<i64, DomainError> {
    let value = value.unwrap_or(default);
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::Validation(format!(
            "{name} must be between 1 and {max}"
        )))
    }
}

fn non_negative(name: &str, value: Option<i64>) -> Result<i64, DomainError> {
    let value = value.unwrap_or(0);
    if value >= 0 {
        Ok(value)
    } else {
        Err(DomainError::Validation(format!(
            "{name} must not be negative"
        )))
    }
}

/// GET /books
///
/// The default page is served through the cache; any other pagination
/// goes straight to the store.
#[instrument(skip(state, query))]
async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookReadModel>>, ApiError> {
    let limit = bounded("limit", query.limit, DEFAULT_LIMIT, MAX_LIMIT)?;
    let offset = non_negative("offset", query.offset)?;

    if limit == DEFAULT_LIMIT && offset == 0 {
        if let Some(books) = state.cache.cached_list().await {
            return Ok(Json(books));
        }
        let books = state.read_model.list(limit, offset).await?;
        state.cache.put_list(books.clone()).await;
        return Ok(Json(books));
    }

    let books = state.read_model.list(limit, offset).await?;
    Ok(Json(books))
}

/// GET /books/recent
#[instrument(skip(state, query))]
async fn recent_books(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<BookReadModel>>, ApiError> {
    let hours = bounded("hours", query.hours, DEFAULT_RECENT_HOURS, MAX_RECENT_HOURS)?;
    let limit = bounded("limit", query.limit, DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT)?;

    let since = state.clock.now() - Duration::hours(hours);
    let books = state.read_model.recent(since, limit).await?;
    Ok(Json(books))
}

/// GET /books/{id}
///
/// Read-through: a fresh cache entry short-circuits the store, a miss
/// populates the cache.
#[instrument(skip(state))]
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookReadModel>, ApiError> {
    if let Some(book) = state.cache.get(id).await {
        return Ok(Json(book));
    }

    let book = state
        .read_model
        .get(id)
        .await?
        .ok_or(DomainError::NotFound(id))?;
    state.cache.put(book.clone()).await;
    Ok(Json(book))
}

/// GET /books/by-author/{author}
#[instrument(skip(state))]
async fn books_by_author(
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> Result<Json<Vec<BookReadModel>>, ApiError> {
    let search = BookSearch {
        author: Some(author),
        ..BookSearch::default()
    };
    let books = state.read_model.search(&search).await?;
    Ok(Json(books))
}

/// POST /books/search
#[instrument(skip(state, search))]
async fn search_books(
    State(state): State<AppState>,
    Json(search): Json<BookSearch>,
) -> Result<Json<Vec<BookReadModel>>, ApiError> {
    let books = state.read_model.search(&search).await?;
    Ok(Json(books))
}

/// GET /statistics
#[instrument(skip(state))]
async fn statistics(State(state): State<AppState>) -> Result<Json<BookStatistics>, ApiError> {
    let since = state.clock.now() - Duration::hours(DEFAULT_RECENT_HOURS);
    let stats = state.read_model.statistics(since).await?;
    Ok(Json(stats))
}

/// GET /authors
#[instrument(skip(state))]
async fn authors(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let authors = state.read_model.authors().await?;
    Ok(Json(authors))
}

/// Returns the router for the read side.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/recent", get(recent_books))
        .route("/books/search", post(search_books))
        .route("/books/by-author/{author}", get(books_by_author))
        .route("/books/{id}", get(get_book))
        .route("/statistics", get(statistics))
        .route("/authors", get(authors))
}
