//! Daily merge and extrapolation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::synth::SyntheticGenerator;
use crate::models::{ApiDailyForecast, DailyEntry, MlForecastEntry, FORECAST_LEN};

// ---

/// Merge API days with ML days into at most [`FORECAST_LEN`] entries.
///
/// API days win on a shared date. The result is ascending by day with no
/// duplicate days.
pub fn merge_daily(api: Option<&[ApiDailyForecast]>, ml: &[MlForecastEntry]) -> Vec<DailyEntry> {
    // ---
    let mut by_day: BTreeMap<NaiveDate, DailyEntry> = BTreeMap::new();

    for day in api.unwrap_or_default() {
        by_day.entry(day.day).or_insert_with(|| DailyEntry::from(day.clone()));
    }
    let api_days = by_day.len();

    for day in ml {
        by_day.entry(day.day).or_insert_with(|| DailyEntry::from(day));
    }

    debug!(
        "Merged {} API days with {} ML days into {} entries",
        api_days,
        ml.len(),
        by_day.len()
    );
    by_day.into_values().take(FORECAST_LEN).collect()
}

/// ML days dated on or after `today`.
///
/// A model fed from an old reading predicts days that are already over; those
/// must not crowd real forecast days out of the merge.
pub fn upcoming_ml(ml: &[MlForecastEntry], today: NaiveDate) -> Vec<MlForecastEntry> {
    // ---
    let upcoming: Vec<MlForecastEntry> = ml.iter().filter(|m| m.day >= today).cloned().collect();
    if upcoming.len() < ml.len() {
        debug!("Dropped {} past ML days", ml.len() - upcoming.len());
    }
    upcoming
}

/// Append estimated days until there are [`FORECAST_LEN`] entries.
///
/// Each new day is derived from the one before it, so drift accumulates.
/// An empty list stays empty; there is nothing to extrapolate from.
pub fn extrapolate(daily: &mut Vec<DailyEntry>, synth: &mut SyntheticGenerator) {
    // ---
    let real = daily.len();
    while !daily.is_empty() && daily.len() < FORECAST_LEN {
        let Some(next) = daily.last().and_then(|prev| synth.next_day(prev)) else {
            break;
        };
        daily.push(next);
    }
    if daily.len() > real {
        debug!("Extrapolated {} estimated days", daily.len() - real);
    }
}
