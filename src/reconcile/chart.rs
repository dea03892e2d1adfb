//! Fixed-shape chart bundle.
//!
//! Every series comes out with exactly [`FORECAST_LEN`] slots whatever the
//! inputs look like: short series are padded, long ones truncated.

use chrono::NaiveDate;

use super::synth::{SyntheticGenerator, COSMETIC_SKIP_DAYS};
use crate::models::{Chart, DailyEntry, DailyTrend, MlForecastEntry, FORECAST_LEN};

// ---

/// Build the chart bundle.
///
/// Labels (and the `AI` line) come from the raw ML forecast when there is
/// one, else from the merged daily days. `API_high`/`API_low` and the
/// per-day trend series are looked up in `daily` by label date. When
/// `history` is non-empty the humidity, pressure and rainfall series come
/// from it positionally instead.
pub fn build_chart(
    daily: &[DailyEntry],
    ml: &[MlForecastEntry],
    history: &[DailyTrend],
    today: NaiveDate,
) -> Chart {
    // ---
    let (labels, ai): (Vec<NaiveDate>, Vec<Option<f64>>) = if ml.is_empty() {
        (daily.iter().map(|d| d.day).collect(), Vec::new())
    } else {
        ml.iter()
            .take(FORECAST_LEN)
            .map(|m| (m.day, Some(m.temp_high_c)))
            .unzip()
    };
    let labels = pad_labels(labels, today);

    let day_of = |label: &NaiveDate| daily.iter().find(|d| d.day == *label);

    let api_high: Vec<Option<f64>> = labels
        .iter()
        .map(|l| day_of(l).and_then(|d| d.temp_high_c))
        .collect();
    let api_low: Vec<Option<f64>> = labels
        .iter()
        .map(|l| day_of(l).and_then(|d| d.temp_low_c))
        .collect();

    type Trends = (Vec<Option<f64>>, Vec<Option<f64>>, Vec<f64>);
    let (humidity, pressure, rainfall): Trends = if history.is_empty() {
        (
            labels.iter().map(|l| day_of(l).and_then(|d| d.humidity)).collect(),
            labels.iter().map(|l| day_of(l).map(|d| d.pressure)).collect(),
            labels.iter().map(|l| day_of(l).map_or(0.0, |d| d.rainfall)).collect(),
        )
    } else {
        let recent = &history[history.len().saturating_sub(FORECAST_LEN)..];
        (
            recent.iter().map(|h| h.avg_humidity).collect(),
            recent.iter().map(|h| h.avg_pressure).collect(),
            recent.iter().map(|h| h.total_rainfall.unwrap_or(0.0)).collect(),
        )
    };

    Chart {
        labels,
        ai: pad(ai, None),
        api_high: pad(api_high, None),
        api_low: pad(api_low, None),
        humidity: pad(humidity, None),
        pressure: pad(pressure, None),
        rainfall: pad(rainfall, 0.0),
    }
}

/// Sprinkle 2–3 rainy days into an otherwise dry chart tail.
///
/// Applies only when every slot past the first few has zero rainfall, so the
/// rainfall chart is not a flat line. Only the chart series is touched; the
/// daily entries keep their real values. Returns whether anything changed.
pub fn apply_cosmetic_rain(rainfall: &mut [f64], synth: &mut SyntheticGenerator) -> bool {
    // ---
    let tail_dry = rainfall.iter().skip(COSMETIC_SKIP_DAYS).all(|r| *r == 0.0);
    if rainfall.len() <= COSMETIC_SKIP_DAYS || !tail_dry {
        return false;
    }

    for (idx, mm) in synth.cosmetic_rain(rainfall.len()) {
        rainfall[idx] = mm;
    }
    true
}

/// Truncate to [`FORECAST_LEN`] or extend by one calendar day at a time.
///
/// An empty list starts from `today`.
pub fn pad_labels(mut labels: Vec<NaiveDate>, today: NaiveDate) -> Vec<NaiveDate> {
    // ---
    labels.truncate(FORECAST_LEN);
    while labels.len() < FORECAST_LEN {
        let next = match labels.last() {
            Some(last) => last.succ_opt().unwrap_or(*last),
            None => today,
        };
        labels.push(next);
    }
    labels
}

fn pad<T: Clone>(mut series: Vec<T>, filler: T) -> Vec<T> {
    // ---
    series.truncate(FORECAST_LEN);
    series.resize(FORECAST_LEN, filler);
    series
}
