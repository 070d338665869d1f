//! Shared application state.

use std::sync::Arc;

use libram_books::application::publisher::EventPublisher;
use libram_books::application::repository::BookRepository;
use libram_core::clock::Clock;
use libram_core::store::EventStore;
use libram_read_model::ReadModelStore;

use crate::cache::BookCache;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wall clock commands are timestamped with.
    pub clock: Arc<dyn Clock>,
    /// Append-only event log, exposed read-only for introspection routes.
    pub event_store: Arc<dyn EventStore>,
    /// Queryable read model maintained by the projector.
    pub read_model: Arc<dyn ReadModelStore>,
    /// Cache fronting the hot read-model queries.
    pub cache: Arc<dyn BookCache>,
    /// Aggregate repository over the event store.
    pub repository: BookRepository,
    /// Publisher pushing stored events onto the feed.
    pub publisher: EventPublisher,
}

impl AppState {
    /// Create new application state.
    ///
    /// The repository is derived from the store handed in, so the HTTP
    /// routes and the command consumer share one wiring.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        event_store: Arc<dyn EventStore>,
        publisher: EventPublisher,
        read_model: Arc<dyn ReadModelStore>,
        cache: Arc<dyn BookCache>,
    ) -> Self {
        let repository = BookRepository::new(event_store.clone());
        Self {
            clock,
            event_store,
            read_model,
            cache,
            repository,
            publisher,
        }
    }
}
