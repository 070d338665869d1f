//! Integration tests for the event log and aggregate endpoints.

mod common;

use axum::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn test_event_log_starts_empty() {
    let app = common::build_test_app().await;

    let (status, json) = common::get_json(app.router.clone(), "/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 0);
    assert_eq!(json["events"].as_array().unwrap().len(), 0);
    app.shutdown().await;
}

#[tokio::test]
async fn test_commands_append_to_the_event_log() {
    let app = common::build_test_app().await;
    let (_, created) = common::post_json(
        app.router.clone(),
        "/commands/create-book",
        &serde_json::json!({ "title": "Dune", "author": "Frank Herbert" }),
    )
    .await;
    let aggregate_id = created["aggregate_id"].as_str().unwrap().to_owned();
    common::send_json(
        app.router.clone(),
        "PUT",
        "/commands/update-book",
        &serde_json::json!({ "aggregate_id": aggregate_id, "title": "Dune Messiah" }),
    )
    .await;

    // GET /events lists both lifecycle events in order.
    let (status, json) = common::get_json(app.router.clone(), "/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 2);
    let events = json["events"].as_array().unwrap();
    assert_eq!(events[0]["event_type"], "book.created");
    assert_eq!(events[0]["version"], 1);
    assert_eq!(events[1]["event_type"], "book.updated");
    assert_eq!(events[1]["version"], 2);

    // GET /events?event_type=book.updated narrows the log.
    let (status, json) =
        common::get_json(app.router.clone(), "/events?event_type=book.updated").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["events"][0]["event_type"], "book.updated");
    app.shutdown().await;
}

#[tokio::test]
async fn test_aggregate_event_stream_is_isolated() {
    let app = common::build_test_app().await;
    let (_, first) = common::post_json(
        app.router.clone(),
        "/commands/create-book",
        &serde_json::json!({ "title": "Dune", "author": "Frank Herbert" }),
    )
    .await;
    common::post_json(
        app.router.clone(),
        "/commands/create-book",
        &serde_json::json!({ "title": "Hyperion", "author": "Dan Simmons" }),
    )
    .await;
    let first_id = first["aggregate_id"].as_str().unwrap().to_owned();

    let (status, json) =
        common::get_json(app.router.clone(), &format!("/events/{first_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["aggregate_id"], first_id);
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["aggregate_id"], first_id);
    app.shutdown().await;
}

#[tokio::test]
async fn test_unknown_aggregate_has_an_empty_event_stream() {
    let app = common::build_test_app().await;

    let (status, json) =
        common::get_json(app.router.clone(), &format!("/events/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["events"].as_array().unwrap().len(), 0);
    app.shutdown().await;
}

#[tokio::test]
async fn test_aggregate_endpoint_replays_current_state() {
    let app = common::build_test_app().await;
    let (_, created) = common::post_json(
        app.router.clone(),
        "/commands/create-book",
        &serde_json::json!({
            "title": "Dune",
            "description": "Desert planet epic",
            "author": "Frank Herbert"
        }),
    )
    .await;
    let aggregate_id = created["aggregate_id"].as_str().unwrap().to_owned();
    common::send_json(
        app.router.clone(),
        "PUT",
        "/commands/update-book",
        &serde_json::json!({ "aggregate_id": aggregate_id, "title": "Dune Messiah" }),
    )
    .await;

    let (status, json) =
        common::get_json(app.router.clone(), &format!("/aggregates/{aggregate_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], aggregate_id);
    assert_eq!(json["title"], "Dune Messiah");
    assert_eq!(json["description"], "Desert planet epic");
    assert_eq!(json["author"], "Frank Herbert");
    assert_eq!(json["version"], 2);
    app.shutdown().await;
}

#[tokio::test]
async fn test_deleted_aggregate_returns_404() {
    let app = common::build_test_app().await;
    let (_, created) = common::post_json(
        app.router.clone(),
        "/commands/create-book",
        &serde_json::json!({ "title": "Dune", "author": "Frank Herbert" }),
    )
    .await;
    let aggregate_id = created["aggregate_id"].as_str().unwrap().to_owned();
    common::send_json(
        app.router.clone(),
        "DELETE",
        "/commands/delete-book",
        &serde_json::json!({ "aggregate_id": aggregate_id }),
    )
    .await;

    let (status, json) =
        common::get_json(app.router.clone(), &format!("/aggregates/{aggregate_id}")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");

    // The history survives the deletion; only the replayed state is gone.
    let (status, json) =
        common::get_json(app.router.clone(), &format!("/events/{aggregate_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["events"].as_array().unwrap().len(), 2);
    app.shutdown().await;
}
