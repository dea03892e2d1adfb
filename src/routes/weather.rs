//! WeatherAPI passthrough endpoints and the forecast sync action.
//!
//! The reads serve whatever the cached source holds. `POST /api/weatherapi/sync`
//! persists the current forecast as one batch in the `forecasts` table and is
//! the only endpoint that reports an upstream or storage failure to the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::db;

// ---

const SYNC_SOURCE: &str = "weatherapi";
const SYNC_SUMMARY: &str = "Manual sync";

#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_id: Option<Uuid>,
}

impl SyncResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            batch_id: None,
        }
    }
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/weatherapi", get(current))
        .route("/api/weatherapi_7day", get(forecast))
        .route("/api/weatherapi/sync", post(sync))
}

async fn current(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.sources.weather.current().await {
        Some(now) => Json(now).into_response(),
        None => Json(json!({ "error": "WeatherAPI current unavailable" })).into_response(),
    }
}

async fn forecast(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.sources.weather.forecast_7day().await {
        Some(days) => Json(days).into_response(),
        None => Json(json!({ "error": "WeatherAPI 7day unavailable" })).into_response(),
    }
}

async fn sync(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let Some(days) = state.sources.weather.forecast_7day().await else {
        warn!("POST /api/weatherapi/sync - no forecast available");
        return (
            StatusCode::BAD_GATEWAY,
            Json(SyncResponse::error("Could not fetch data from WeatherAPI")),
        );
    };

    match db::insert_forecast_batch(&state.pool, SYNC_SOURCE, Utc::now(), &days, Some(SYNC_SUMMARY))
        .await
    {
        Ok(batch_id) => {
            info!("Synced {} forecast days as batch {}", days.len(), batch_id);
            (
                StatusCode::OK,
                Json(SyncResponse {
                    status: "success",
                    message: format!("Synced {} days to DB", days.len()),
                    batch_id: Some(batch_id),
                }),
            )
        }
        Err(e) => {
            error!("Forecast sync failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncResponse::error(e.to_string())),
            )
        }
    }
}
