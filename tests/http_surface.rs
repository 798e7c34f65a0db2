//! Read-only HTTP surface: the two viewer endpoints.
//!
//! Run with: `cargo test --test http_surface --features http`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::util::ServiceExt;

use blackbox::{TelemetryPoint, TelemetryStore};
use common::{fix, tracker_over, ScriptedSource};

/// Capture two journeys and return (ids, db path, temp dir guard).
fn seeded_db() -> (Vec<String>, std::path::PathBuf, TempDir) {
    let tmp = TempDir::new().unwrap();
    let (source, handle) = ScriptedSource::granted();
    let (mut tracker, db_path) = tracker_over(&tmp, source);

    let first = tracker.start().unwrap();
    handle.deliver(fix(-37.10, -72.01, 5.0, 1000));
    handle.deliver(fix(-37.11, -72.02, 12.0, 2000));
    tracker.stop();

    let second = tracker.start().unwrap();
    handle.deliver(fix(-37.20, -72.10, 8.0, 3000));
    tracker.stop();

    (vec![first, second], db_path, tmp)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_list_journeys_returns_distinct_ids() {
    let (ids, db_path, _tmp) = seeded_db();

    let (status, body) = get(blackbox::http::router(db_path), "/journeys").await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_get_journey_returns_ordered_points() {
    let (ids, db_path, _tmp) = seeded_db();

    let uri = format!("/journeys/{}", ids[0]);
    let (status, body) = get(blackbox::http::router(db_path.clone()), &uri).await;
    assert_eq!(status, StatusCode::OK);

    let points: Vec<TelemetryPoint> = serde_json::from_slice(&body).unwrap();
    let reader = TelemetryStore::open(&db_path).unwrap();
    assert_eq!(points, reader.query_by_journey(&ids[0]).unwrap());
}

#[tokio::test]
async fn test_unknown_journey_is_404_with_error_body() {
    let (_ids, db_path, _tmp) = seeded_db();

    let (status, body) = get(blackbox::http::router(db_path), "/journeys/no-such-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value.get("error").is_some());
}
