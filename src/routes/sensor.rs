//! `GET /api/latest`: the freshest sensor reading.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tracing::debug;

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/latest", get(handler))
}

/// Freshest reading within the freshness window, or an error object.
async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.sources.sensor.latest().await {
        Some(reading) => Json(reading).into_response(),
        None => {
            debug!("GET /api/latest - no fresh reading");
            Json(json!({ "error": "No sensor data" })).into_response()
        }
    }
}
