//! `GET /api/insights`: summary and recommendations for the current reconciliation.

use axum::{extract::State, routing::get, Json, Router};
use tracing::debug;

use super::AppState;
use crate::{insights::summarize, Insights};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/insights", get(handler))
}

async fn handler(State(state): State<AppState>) -> Json<Insights> {
    // ---
    let output = state.reconcile_now().await;
    let insights = summarize(&output.current, &output.daily, output.sensor_status);

    debug!("GET /api/insights - {}", insights.summary);
    Json(insights)
}
