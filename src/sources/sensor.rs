//! Latest-reading source with a freshness policy.
//!
//! Every call reads through to the store; nothing is cached because the
//! dashboard wants the live value. A reading older than the freshness window
//! is treated exactly like no reading at all.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::db;
use crate::models::{DailyTrend, Reading};

// ---

#[derive(Clone)]
pub struct SensorSource {
    pool: PgPool,
    freshness: Duration,
    timeout: Duration,
}

impl SensorSource {
    // ---
    pub fn new(pool: PgPool, freshness: Duration, timeout: Duration) -> Self {
        Self {
            pool,
            freshness,
            timeout,
        }
    }

    /// Freshest reading, or `None` when the store fails, times out, is
    /// empty, or only holds a stale row.
    pub async fn latest(&self) -> Option<Reading> {
        // ---
        let reading = self.latest_any_age().await?;
        keep_if_fresh(reading, Utc::now(), self.freshness)
    }

    /// Most recent reading without the freshness check.
    async fn latest_any_age(&self) -> Option<Reading> {
        // ---
        match tokio::time::timeout(self.timeout, db::latest_reading(&self.pool)).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                warn!("Sensor store read failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Sensor store read timed out after {:?}", self.timeout);
                None
            }
        }
    }

    /// Per-day aggregates over the last `days` days, empty on any failure.
    pub async fn daily_history(&self, days: u32) -> Vec<DailyTrend> {
        // ---
        match tokio::time::timeout(self.timeout, db::daily_trends(&self.pool, days)).await {
            Ok(Ok(trends)) => trends,
            Ok(Err(e)) => {
                warn!("Trend history query failed: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Trend history query timed out after {:?}", self.timeout);
                Vec::new()
            }
        }
    }
}

/// Apply the freshness window relative to `now`.
///
/// Readings stamped slightly in the future (clock skew) count as fresh.
pub fn keep_if_fresh(reading: Reading, now: DateTime<Utc>, window: Duration) -> Option<Reading> {
    // ---
    let age = now.signed_duration_since(reading.timestamp);
    let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(36_500));

    if age > window {
        debug!(
            "Latest reading at {} is {}s old (window {}s), treating sensor as disconnected",
            reading.timestamp,
            age.num_seconds(),
            window.num_seconds()
        );
        return None;
    }
    Some(reading)
}
