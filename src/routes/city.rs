//! `POST /api/city`: switch the active WeatherAPI location.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;

// ---

#[derive(Deserialize)]
struct CityUpdate {
    city: String,
}

#[derive(Debug, PartialEq, Serialize)]
struct CityResponse {
    status: &'static str,
    city: String,
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/city", post(handler))
}

/// Change the active API location. The next API read refetches.
async fn handler(
    State(state): State<AppState>,
    Json(update): Json<CityUpdate>,
) -> (StatusCode, Json<CityResponse>) {
    // ---
    let Some(city) = normalize_city(&update.city) else {
        debug!("POST /api/city - rejected blank city");
        return (
            StatusCode::BAD_REQUEST,
            Json(CityResponse {
                status: "error",
                city: state.sources.weather.city(),
            }),
        );
    };

    state.sources.weather.set_city(city);
    (
        StatusCode::OK,
        Json(CityResponse {
            status: "success",
            city: city.to_string(),
        }),
    )
}

fn normalize_city(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|c| !c.is_empty())
}
