//! Routes for write-side introspection.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use libram_books::domain::aggregates::Book;
use libram_core::event::EventRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for GET /events.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Restrict the listing to one event type.
    pub event_type: Option<String>,
}

/// Response body for GET /events.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Matching events, oldest first.
    pub events: Vec<EventRecord>,
    /// Number of events returned.
    pub total_count: usize,
}

/// Response body for GET /events/{aggregate_id}.
#[derive(Debug, Serialize)]
pub struct AggregateEventsResponse {
    /// Aggregate the history belongs to.
    pub aggregate_id: Uuid,
    /// The aggregate's events in version order.
    pub events: Vec<EventRecord>,
}

/// GET /events
#[instrument(skip(state, query))]
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state
        .event_store
        .all_events(query.event_type.as_deref())
        .await?;
    let total_count = events.len();
    Ok(Json(EventsResponse {
        events,
        total_count,
    }))
}

/// GET /events/{aggregate_id}
#[instrument(skip(state))]
async fn aggregate_events(
    State(state): State<AppState>,
    Path(aggregate_id): Path<Uuid>,
) -> Result<Json<AggregateEventsResponse>, ApiError> {
    let events = state.event_store.events_for(aggregate_id).await?;
    Ok(Json(AggregateEventsResponse {
        aggregate_id,
        events,
    }))
}

/// GET /aggregates/{aggregate_id}
///
/// Replays the aggregate from its events. Deleted aggregates are
/// indistinguishable from absent ones here and report 404 alike.
#[instrument(skip(state))]
async fn get_aggregate(
    State(state): State<AppState>,
    Path(aggregate_id): Path<Uuid>,
) -> Result<Json<Book>, ApiError> {
    let book = state.repository.get_by_id(aggregate_id).await?;
    Ok(Json(book))
}

/// Returns the router for write-side introspection.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{aggregate_id}", get(aggregate_events))
        .route("/aggregates/{aggregate_id}", get(get_aggregate))
}
