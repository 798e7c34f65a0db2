//! # Read-only HTTP surface
//!
//! The two endpoints the map viewer consumes:
//!
//! - `GET /journeys`: distinct journey ids
//! - `GET /journeys/{id}`: that journey's ordered points in export shape,
//!   `404` when the journey has no points
//!
//! Handlers open a per-request reader connection inside `spawn_blocking`;
//! this surface never writes. CORS is permissive because the viewer runs on
//! a different origin.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::warn;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::Result;
use crate::persistence::TelemetryStore;

#[derive(Clone)]
struct ApiState {
    db_path: Arc<PathBuf>,
}

/// Build the read-only router over the store at `db_path`.
pub fn router(db_path: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/journeys", get(list_journeys))
        .route("/journeys/:journey_id", get(get_journey))
        .layer(CorsLayer::permissive())
        .with_state(ApiState {
            db_path: Arc::new(db_path.into()),
        })
}

async fn list_journeys(State(state): State<ApiState>) -> Response {
    match with_store(&state, |store| store.list_journey_ids()).await {
        Ok(ids) => Json(ids).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn get_journey(
    State(state): State<ApiState>,
    UrlPath(journey_id): UrlPath<String>,
) -> Response {
    let id = journey_id.clone();
    match with_store(&state, move |store| store.query_by_journey(&id)).await {
        Ok(points) if points.is_empty() => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("no points recorded for journey '{}'", journey_id)
            })),
        )
            .into_response(),
        Ok(points) => Json(points).into_response(),
        Err(err) => storage_error(err),
    }
}

/// Run a read against a per-request store handle on the blocking pool.
async fn with_store<T, F>(state: &ApiState, read: F) -> Result<T>
where
    F: FnOnce(&TelemetryStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db_path = Arc::clone(&state.db_path);
    tokio::task::spawn_blocking(move || {
        let store = TelemetryStore::open(db_path.as_path())?;
        read(&store)
    })
    .await
    .map_err(std::io::Error::other)?
}

fn storage_error(err: crate::error::TelemetryError) -> Response {
    warn!("[journey-api] read failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "storage failure" })),
    )
        .into_response()
}
