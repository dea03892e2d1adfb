//! Seeded generator for estimated forecast days.
//!
//! Everything here is fake data produced for chart continuity, kept apart
//! from the real-data path. The generator is seeded from a date string, so
//! the same last real day always yields the same synthetic continuation and
//! a page refresh does not make estimated values jump around.

use rand::{seq::index, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{DailyEntry, DaySource};

// ---

/// Suffix appended to the condition of every estimated value.
pub const ESTIMATED_SUFFIX: &str = " (estimated)";

pub const RAIN_CONDITION: &str = "Patchy rain";
pub const FALLBACK_CONDITION: &str = "Partly cloudy";

const DEFAULT_HIGH_C: f64 = 25.0;
const DEFAULT_LOW_C: f64 = 15.0;
const DEFAULT_HUMIDITY: f64 = 50.0;

const TEMP_DRIFT_C: f64 = 1.5;
const HUMIDITY_DRIFT: f64 = 5.0;
const PRESSURE_DRIFT_HPA: f64 = 2.0;

const BASE_RAIN_CHANCE: f64 = 0.3;
const STICKY_RAIN_CHANCE: f64 = 0.6;
const RAIN_START_MM: (f64, f64) = (1.5, 6.0);
const COSMETIC_RAIN_MM: (f64, f64) = (2.0, 8.0);

/// Leading days never touched by cosmetic rain.
pub const COSMETIC_SKIP_DAYS: usize = 3;

pub struct SyntheticGenerator {
    rng: ChaCha8Rng,
}

impl SyntheticGenerator {
    // ---
    pub fn seeded(seed: &str) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(fnv1a(seed)),
        }
    }

    /// Estimate the day after `prev`, drifting from `prev`'s values.
    ///
    /// Returns `None` only if the calendar cannot advance.
    pub fn next_day(&mut self, prev: &DailyEntry) -> Option<DailyEntry> {
        // ---
        let day = prev.day.succ_opt()?;

        let temp_drift = self.rng.gen_range(-TEMP_DRIFT_C..=TEMP_DRIFT_C);
        let humidity_drift = self.rng.gen_range(-HUMIDITY_DRIFT..=HUMIDITY_DRIFT);
        let pressure_drift = self.rng.gen_range(-PRESSURE_DRIFT_HPA..=PRESSURE_DRIFT_HPA);

        let rain_chance = if prev.rainfall > 0.0 {
            STICKY_RAIN_CHANCE
        } else {
            BASE_RAIN_CHANCE
        };
        let (rainfall, condition) = if self.rng.gen::<f64>() < rain_chance {
            let mm = round1(self.rng.gen_range(RAIN_START_MM.0..=RAIN_START_MM.1));
            (mm, estimated(RAIN_CONDITION))
        } else {
            (0.0, estimated(FALLBACK_CONDITION))
        };

        Some(DailyEntry {
            day,
            temp_high_c: Some(round1(prev.temp_high_c.unwrap_or(DEFAULT_HIGH_C) + temp_drift)),
            temp_low_c: Some(round1(prev.temp_low_c.unwrap_or(DEFAULT_LOW_C) + temp_drift)),
            rain_prob_perc: None,
            condition,
            sunrise: None,
            sunset: None,
            humidity: Some(
                (prev.humidity.unwrap_or(DEFAULT_HUMIDITY) + humidity_drift)
                    .clamp(0.0, 100.0)
                    .round(),
            ),
            rainfall,
            pressure: round1(prev.pressure + pressure_drift),
            hourly: Vec::new(),
            source: DaySource::Synthetic,
        })
    }

    /// Pick 2–3 distinct indices in `COSMETIC_SKIP_DAYS..len` with a rain amount each.
    pub fn cosmetic_rain(&mut self, len: usize) -> Vec<(usize, f64)> {
        // ---
        if len <= COSMETIC_SKIP_DAYS {
            return Vec::new();
        }
        let span = len - COSMETIC_SKIP_DAYS;
        let wanted = self.rng.gen_range(2..=3).min(span);

        let mut picks: Vec<usize> = index::sample(&mut self.rng, span, wanted)
            .into_iter()
            .map(|i| i + COSMETIC_SKIP_DAYS)
            .collect();
        picks.sort_unstable();

        picks
            .into_iter()
            .map(|i| {
                let mm = round1(self.rng.gen_range(COSMETIC_RAIN_MM.0..=COSMETIC_RAIN_MM.1));
                (i, mm)
            })
            .collect()
    }
}

pub fn estimated(label: &str) -> String {
    format!("{}{}", label, ESTIMATED_SUFFIX)
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// 64-bit FNV-1a; stable across builds and platforms, unlike `DefaultHasher`.
fn fnv1a(s: &str) -> u64 {
    // ---
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(PRIME))
}
