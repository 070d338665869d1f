//! Route modules for the catalog API.

pub mod books;
pub mod commands;
pub mod events;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Assembles every route group into one router.
///
/// `main` layers tracing and CORS on top; tests drive this router
/// directly.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(commands::router())
        .merge(events::router())
        .merge(books::router())
}
