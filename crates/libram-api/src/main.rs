//! Libram catalog API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use libram_api::cache::{self, InMemoryBookCache};
use libram_api::error::AppError;
use libram_api::routes;
use libram_api::state::AppState;
use libram_api::worker::CommandConsumer;
use libram_books::application::dispatch::COMMAND_TOPIC;
use libram_books::application::publisher::EventPublisher;
use libram_books::application::repository::BookRepository;
use libram_books::domain::events::{BOOK_CREATED, BOOK_DELETED, BOOK_UPDATED};
use libram_bus::InMemoryEventBus;
use libram_core::bus::EventBus;
use libram_core::clock::{Clock, SystemClock};
use libram_core::store::EventStore;
use libram_event_store::PgEventStore;
use libram_event_store::schema as event_schema;
use libram_read_model::schema as read_model_schema;
use libram_read_model::{BookProjector, PgReadModelStore, ProjectorWorker, ReadModelStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Libram catalog API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        AppError::Config("DATABASE_URL environment variable must be set".to_string())
    })?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create the connection pool and make sure both schemas exist.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    event_schema::ensure_schema(&pool).await?;
    read_model_schema::ensure_schema(&pool).await?;

    // Wire the command side, the feed, and the read side.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let event_store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));
    let bus = Arc::new(InMemoryEventBus::new());
    let publisher = EventPublisher::new(bus.clone());
    let read_model: Arc<dyn ReadModelStore> = Arc::new(PgReadModelStore::new(pool));
    let cache = Arc::new(InMemoryBookCache::new(
        clock.clone(),
        cache::DEFAULT_TTL_SECONDS,
    ));

    // Start the workers before taking traffic so no event is published
    // without a live subscription.
    let projector_subscription = bus
        .subscribe(&[BOOK_CREATED, BOOK_UPDATED, BOOK_DELETED])
        .await?;
    let projector_worker = ProjectorWorker::spawn(
        BookProjector::new(read_model.clone()),
        projector_subscription,
    );

    let consumer_subscription = bus.subscribe(&[COMMAND_TOPIC]).await?;
    let command_consumer = CommandConsumer::spawn(
        clock.clone(),
        BookRepository::new(event_store.clone()),
        publisher.clone(),
        consumer_subscription,
    );

    let app_state = AppState::new(clock, event_store, publisher, read_model, cache);

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server stopped taking commands; let the workers drain.
    command_consumer.shutdown().await;
    projector_worker.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
