//! `GET /api/combined`: the reconciled dashboard payload.

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use super::AppState;
use crate::ReconciledOutput;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/combined", get(handler))
}

/// Always 200: every source failure has already degraded to an absent value.
async fn handler(State(state): State<AppState>) -> Json<ReconciledOutput> {
    // ---
    let output = state.reconcile_now().await;

    info!(
        "GET /api/combined - {} daily entries, sensor {}",
        output.daily.len(),
        output.sensor_status.as_str()
    );
    Json(output)
}
