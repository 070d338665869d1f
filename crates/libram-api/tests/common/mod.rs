//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use libram_api::cache::InMemoryBookCache;
use libram_api::routes;
use libram_api::state::AppState;
use libram_api::worker::CommandConsumer;
use libram_books::application::dispatch::COMMAND_TOPIC;
use libram_books::application::publisher::EventPublisher;
use libram_books::application::repository::BookRepository;
use libram_books::domain::events::{BOOK_CREATED, BOOK_DELETED, BOOK_UPDATED};
use libram_bus::InMemoryEventBus;
use libram_core::bus::EventBus;
use libram_core::clock::Clock;
use libram_core::store::EventStore;
use libram_event_store::MemoryEventStore;
use libram_read_model::{BookProjector, MemoryReadModelStore, ProjectorWorker, ReadModelStore};
use libram_test_support::FixedClock;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// A fully wired in-process service: router, feed, and both workers.
///
/// The cache is built with a zero lifetime so reads always reflect the
/// read model; caching itself is covered by the route unit tests.
pub struct TestApp {
    /// The assembled router, ready for `oneshot` calls.
    pub router: Router,
    /// Feed handle for publishing command envelopes and inspecting dead
    /// letters.
    pub bus: Arc<InMemoryEventBus>,
    projector: ProjectorWorker,
    consumer: CommandConsumer,
}

impl TestApp {
    /// Stops both workers, letting any in-flight delivery resolve.
    pub async fn shutdown(self) {
        self.consumer.shutdown().await;
        self.projector.shutdown().await;
    }
}

/// Build the full app over in-memory infrastructure: event store, feed,
/// read model, cache, projector worker, and command consumer. Uses the
/// same route structure as `main.rs`.
pub async fn build_test_app() -> TestApp {
    let clock = fixed_clock();
    let event_store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::with_clock(clock.clone()));
    let bus = Arc::new(InMemoryEventBus::new());
    let publisher = EventPublisher::new(bus.clone());
    let read_model: Arc<dyn ReadModelStore> = Arc::new(MemoryReadModelStore::new());
    let cache = Arc::new(InMemoryBookCache::new(clock.clone(), 0));

    let projector_subscription = bus
        .subscribe(&[BOOK_CREATED, BOOK_UPDATED, BOOK_DELETED])
        .await
        .unwrap();
    let projector = ProjectorWorker::spawn(
        BookProjector::new(read_model.clone()),
        projector_subscription,
    );

    let consumer_subscription = bus.subscribe(&[COMMAND_TOPIC]).await.unwrap();
    let consumer = CommandConsumer::spawn(
        clock.clone(),
        BookRepository::new(event_store.clone()),
        publisher.clone(),
        consumer_subscription,
    );

    let state = AppState::new(clock, event_store, publisher, read_model, cache);
    let router = routes::router().with_state(state);

    TestApp {
        router,
        bus,
        projector,
        consumer,
    }
}

/// Send a request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Poll a GET endpoint until it answers with the wanted status; returns
/// the last response either way. Projection is asynchronous, so reads
/// catch up shortly after a command is accepted.
pub async fn get_json_eventually(
    app: Router,
    uri: &str,
    wanted: StatusCode,
) -> (StatusCode, serde_json::Value) {
    let mut last = get_json(app.clone(), uri).await;
    for _ in 0..200 {
        if last.0 == wanted {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        last = get_json(app.clone(), uri).await;
    }
    last
}
