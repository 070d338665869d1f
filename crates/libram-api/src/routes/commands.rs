//! Routes for the command side of the catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{delete, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use libram_books::application::dispatch::{self, BookCommand};
use libram_books::domain::commands::{CreateBook, DeleteBook, UpdateBook};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /commands/create-book.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    /// Book title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Book author.
    pub author: String,
}

/// Request body for PUT /commands/update-book.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    /// Book to update.
    pub aggregate_id: Uuid,
    /// New title, if supplied.
    pub title: Option<String>,
    /// New description, if supplied.
    pub description: Option<String>,
    /// New author, if supplied.
    pub author: Option<String>,
}

/// Request body for DELETE /commands/delete-book.
#[derive(Debug, Deserialize)]
pub struct DeleteBookRequest {
    /// Book to delete.
    pub aggregate_id: Uuid,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Aggregate the command acted on.
    pub aggregate_id: Uuid,
    /// Number of events produced and persisted.
    pub events_count: usize,
}

/// POST /commands/create-book
#[instrument(skip(state, request), fields(title = %request.title))]
async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let command = BookCommand::CreateBook(CreateBook {
        aggregate_id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        author: request.author,
    });
    let aggregate_id = command.aggregate_id();

    info!(aggregate_id = %aggregate_id, "handling create_book command");

    let stored_events = dispatch::execute(
        &command,
        state.clock.as_ref(),
        &state.repository,
        &state.publisher,
    )
    .await?;

    state.cache.invalidate_list().await;

    Ok((
        StatusCode::CREATED,
        Json(CommandResponse {
            message: "Book creation command processed".to_string(),
            aggregate_id,
            events_count: stored_events.len(),
        }),
    ))
}

/// PUT /commands/update-book
#[instrument(skip(state, request), fields(aggregate_id = %request.aggregate_id))]
async fn update_book(
    State(state): State<AppState>,
    Json(request): Json<UpdateBookRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = BookCommand::UpdateBook(UpdateBook {
        aggregate_id: request.aggregate_id,
        title: request.title,
        description: request.description,
        author: request.author,
    });

    info!(aggregate_id = %request.aggregate_id, "handling update_book command");

    let stored_events = dispatch::execute(
        &command,
        state.clock.as_ref(),
        &state.repository,
        &state.publisher,
    )
    .await?;

    state.cache.remove(request.aggregate_id).await;
    state.cache.invalidate_list().await;

    Ok(Json(CommandResponse {
        message: "Book update command processed".to_string(),
        aggregate_id: request.aggregate_id,
        events_count: stored_events.len(),
    }))
}

/// DELETE /commands/delete-book
#[instrument(skip(state, request), fields(aggregate_id = %request.aggregate_id))]
async fn delete_book(
    State(state): State<AppState>,
    Json(request): Json<DeleteBookRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = BookCommand::DeleteBook(DeleteBook {
        aggregate_id: request.aggregate_id,
    });

    info!(aggregate_id = %request.aggregate_id, "handling delete_book command");

    let stored_events = dispatch::execute(
        &command,
        state.clock.as_ref(),
        &state.repository,
        &state.publisher,
    )
    .await?;

    state.cache.remove(request.aggregate_id).await;
    state.cache.invalidate_list().await;

    Ok(Json(CommandResponse {
        message: "Book deletion command processed".to_string(),
        aggregate_id: request.aggregate_id,
        events_count: stored_events.len(),
    }))
}

/// Returns the router for the command side.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/commands/create-book", post(create_book))
        .route("/commands/update-book", put(update_book))
        .route("/commands/delete-book", delete(delete_book))
}
