//! HTTP gateway (EMBP): every endpoint group lives in its own sibling module
//! and exports a sub-router; this module merges them and attaches the state.

use axum::Router;
use sqlx::PgPool;

use crate::reconcile::{reconcile, ReconcileOptions, SourceSnapshot};
use crate::{Config, ReconciledOutput, Sources};

mod city;
mod combined;
mod health;
mod insights;
mod ml;
mod sensor;
mod weather;

// ---

/// Shared by every handler. Cheap to clone: the pool and the weather source
/// are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sources: Sources,
}

impl AppState {
    // ---
    /// Read every source and reconcile against the current wall clock.
    pub async fn reconcile_now(&self) -> ReconciledOutput {
        // ---
        let snapshot = SourceSnapshot::collect(&self.sources, self.config.history_days).await;
        let options = ReconcileOptions {
            synthetic_fill: self.config.synthetic_fill,
        };
        reconcile(
            &snapshot,
            &self.sources.weather.city(),
            chrono::Utc::now(),
            options,
        )
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(combined::router())
        .merge(insights::router())
        .merge(sensor::router())
        .merge(weather::router())
        .merge(ml::router())
        .merge(city::router())
        .merge(health::router())
        .with_state(state)
}
