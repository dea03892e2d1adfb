//! Reconciliation of the sensor, weather API and ML feeds.
//!
//! [`SourceSnapshot::collect`] reads every source once; [`reconcile`] is a
//! pure transformation of that snapshot into the fixed-shape
//! [`ReconciledOutput`]. Nothing in here fails: missing inputs only make the
//! output emptier, never malformed.
//!
//! Step order:
//! 1. drop ML days that are already past
//! 2. merge API and ML days (API wins per date), sorted, capped at seven
//! 3. extrapolate estimated days when one to six days remain
//! 4. `current` from sensor then API, sunrise/sunset from day 0
//! 5. chart bundle, with cosmetic rain on a dry tail when no history backs
//!    the trend charts, and the hourly sparkline

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{
    ApiCurrent, ApiDailyForecast, DailyEntry, DailyTrend, HourlySparkPoint, MlForecastEntry,
    Reading, ReconciledOutput, SensorStatus,
};
use crate::sources::Sources;

mod chart;
mod current;
mod merge;
mod synth;

use chart::{apply_cosmetic_rain, build_chart};
use current::{api_snapshot, sensor_snapshot, unify};
use merge::{extrapolate, merge_daily, upcoming_ml};
use synth::SyntheticGenerator;

// ---

/// Maximum number of points in the hourly sparkline.
pub const HOURLY_CAP: usize = 24;

/// Everything the reconciler needs, fetched once per request.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    // ---
    /// Fresh sensor reading; stale rows are already filtered out.
    pub reading: Option<Reading>,
    pub api_current: Option<ApiCurrent>,
    pub api_forecast: Option<Vec<ApiDailyForecast>>,
    pub ml_forecast: Vec<MlForecastEntry>,
    pub history: Vec<DailyTrend>,
}

impl SourceSnapshot {
    /// Read all sources concurrently. Each degrades on its own.
    pub async fn collect(sources: &Sources, history_days: u32) -> Self {
        // ---
        let (reading, api_current, api_forecast, ml_forecast, history) = tokio::join!(
            sources.sensor.latest(),
            sources.weather.current(),
            sources.weather.forecast_7day(),
            sources.ml.forecast(),
            sources.sensor.daily_history(history_days),
        );

        debug!(
            "Sources: sensor={} api_current={} api_days={} ml_days={} history_days={}",
            reading.is_some(),
            api_current.is_some(),
            api_forecast.as_ref().map_or(0, Vec::len),
            ml_forecast.len(),
            history.len()
        );

        Self {
            reading,
            api_current,
            api_forecast,
            ml_forecast,
            history,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Extrapolate missing days and add cosmetic chart rain.
    pub synthetic_fill: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            synthetic_fill: true,
        }
    }
}

/// Merge the snapshot into the dashboard contract.
pub fn reconcile(
    sources: &SourceSnapshot,
    city: &str,
    now: DateTime<Utc>,
    options: ReconcileOptions,
) -> ReconciledOutput {
    // ---
    let api_today = sources.api_forecast.as_ref().and_then(|days| days.first());
    let ml = upcoming_ml(&sources.ml_forecast, now.date_naive());

    let mut daily = merge_daily(sources.api_forecast.as_deref(), &ml);

    let mut synth = if options.synthetic_fill {
        daily
            .last()
            .map(|d| SyntheticGenerator::seeded(&d.day.format("%Y-%m-%d").to_string()))
    } else {
        None
    };
    if let Some(synth) = synth.as_mut() {
        extrapolate(&mut daily, synth);
    }

    let sensor_data = sources.reading.as_ref().map(sensor_snapshot);
    let api_data = sources
        .api_current
        .as_ref()
        .map(|c| api_snapshot(c, api_today));
    let current = unify(sensor_data.as_ref(), api_data.as_ref(), &daily, api_today);

    let mut chart = build_chart(&daily, &ml, &sources.history, now.date_naive());
    if let Some(synth) = synth.as_mut() {
        if sources.history.is_empty() && apply_cosmetic_rain(&mut chart.rainfall, synth) {
            debug!("Dry forecast tail, added cosmetic chart rain");
        }
    }
    let hourly_forecast = hourly_forecast(&daily, now);

    let sensor_status = if sources.reading.is_some() {
        SensorStatus::Connected
    } else {
        SensorStatus::Disconnected
    };

    ReconciledOutput {
        current,
        sensor_data,
        api_data,
        daily,
        sensor_status,
        city: city.to_string(),
        chart,
        hourly_forecast,
    }
}

/// Upcoming hourly points across all days, capped at [`HOURLY_CAP`].
///
/// `None` when no day carries hourly data at all.
fn hourly_forecast(daily: &[DailyEntry], now: DateTime<Utc>) -> Option<Vec<HourlySparkPoint>> {
    // ---
    if daily.iter().all(|d| d.hourly.is_empty()) {
        return None;
    }
    let now = now.timestamp();

    Some(
        daily
            .iter()
            .flat_map(|d| d.hourly.iter())
            .filter(|h| h.time_epoch >= now)
            .take(HOURLY_CAP)
            .map(|h| HourlySparkPoint {
                time: h.time_epoch,
                temp: h.temp_c,
                pressure: h.pressure_mb,
            })
            .collect(),
    )
}
