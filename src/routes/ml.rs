//! `GET /api/ml_forecast`: the raw model forecast, wrapped in `{"forecast": [...]}`.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;
use crate::MlForecastEntry;

// ---

#[derive(Serialize)]
struct MlForecastResponse {
    forecast: Vec<MlForecastEntry>,
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/ml_forecast", get(handler))
}

/// Empty `forecast` when the model or the latest reading is unavailable.
async fn handler(State(state): State<AppState>) -> Json<MlForecastResponse> {
    // ---
    Json(MlForecastResponse {
        forecast: state.sources.ml.forecast().await,
    })
}
