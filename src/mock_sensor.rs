//! Background producer of plausible sensor readings.
//!
//! Stands in for the serial-attached sensor when none is present: a bounded
//! random walk over temperature, humidity and pressure with the occasional
//! light shower, written to the `readings` table once per interval.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db;
use crate::models::Reading;

// ---

const TEMP_RANGE_C: (f64, f64) = (20.0, 35.0);
const HUMIDITY_RANGE: (f64, f64) = (40.0, 90.0);
const PRESSURE_RANGE_HPA: (f64, f64) = (1000.0, 1020.0);

const TEMP_STEP_C: f64 = 0.5;
const HUMIDITY_STEP: f64 = 2.0;
const PRESSURE_STEP_HPA: f64 = 0.5;

/// Showers only start above this humidity.
const RAIN_HUMIDITY: f64 = 70.0;
const RAIN_CHANCE: f64 = 0.05;
const RAIN_MM: (f64, f64) = (0.1, 2.0);

/// Random-walk state carried between ticks.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            temp: 25.0,
            humidity: 60.0,
            pressure: 1013.0,
        }
    }
}

impl RandomWalk {
    // ---
    /// Advance one tick and produce the reading stamped at `now`.
    pub fn step<R: Rng>(&mut self, rng: &mut R, now: DateTime<Utc>) -> Reading {
        // ---
        self.temp = walk(rng, self.temp, TEMP_STEP_C, TEMP_RANGE_C);
        self.humidity = walk(rng, self.humidity, HUMIDITY_STEP, HUMIDITY_RANGE);
        self.pressure = walk(rng, self.pressure, PRESSURE_STEP_HPA, PRESSURE_RANGE_HPA);

        let rainfall = if self.humidity > RAIN_HUMIDITY && rng.gen::<f64>() < RAIN_CHANCE {
            round_to(rng.gen_range(RAIN_MM.0..=RAIN_MM.1), 100.0)
        } else {
            0.0
        };

        Reading {
            timestamp: now,
            temperature_c: round_to(self.temp, 10.0),
            humidity_perc: round_to(self.humidity, 10.0),
            pressure_hpa: round_to(self.pressure, 10.0),
            rainfall_mm: rainfall,
            status: if rainfall > 0.0 { "Wet" } else { "Dry" }.to_string(),
        }
    }
}

/// Spawn the producer loop. Insert failures are logged and the loop keeps going.
pub fn spawn(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut rng = ChaCha8Rng::from_entropy();
        let mut walk = RandomWalk::default();
        let mut first = true;

        info!("Mock sensor producer started, one reading every {:?}", interval);

        loop {
            let reading = walk.step(&mut rng, Utc::now());
            match db::insert_reading(&pool, &reading).await {
                Ok(()) => {
                    if first {
                        info!("Mock sensor wrote its first reading");
                        first = false;
                    }
                    debug!(
                        "Mock reading: {:.1}°C {:.1}% {:.1} hPa {:.2} mm",
                        reading.temperature_c,
                        reading.humidity_perc,
                        reading.pressure_hpa,
                        reading.rainfall_mm
                    );
                }
                Err(e) => {
                    warn!("Mock sensor insert failed: {} (retry in {:?})", e, interval);
                }
            }

            tokio::time::sleep(interval).await;
        }
    })
}

fn walk<R: Rng>(rng: &mut R, value: f64, step: f64, (lo, hi): (f64, f64)) -> f64 {
    (value + rng.gen_range(-step..=step)).clamp(lo, hi)
}

fn round_to(x: f64, scale: f64) -> f64 {
    (x * scale).round() / scale
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_walk_stays_in_bounds() {
        // ---
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut state = RandomWalk::default();

        for _ in 0..5_000 {
            let r = state.step(&mut rng, now());

            assert!((20.0..=35.0).contains(&r.temperature_c));
            assert!((40.0..=90.0).contains(&r.humidity_perc));
            assert!((1000.0..=1020.0).contains(&r.pressure_hpa));
            assert!(r.rainfall_mm == 0.0 || (0.1..=2.0).contains(&r.rainfall_mm));
            let expected = if r.rainfall_mm > 0.0 { "Wet" } else { "Dry" };
            assert_eq!(r.status, expected);
        }
    }

    #[test]
    fn test_steps_are_small() {
        // ---
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = RandomWalk::default();
        let mut prev = state.step(&mut rng, now());

        for _ in 0..500 {
            let next = state.step(&mut rng, now());
            assert!((next.temperature_c - prev.temperature_c).abs() <= 0.5 + 0.1);
            assert!((next.humidity_perc - prev.humidity_perc).abs() <= 2.0 + 0.1);
            prev = next;
        }
    }

    #[test]
    fn test_no_rain_when_dry_air() {
        // ---
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut state = RandomWalk {
            temp: 25.0,
            humidity: 40.0,
            pressure: 1013.0,
        };

        // Humidity can drift at most 2 per tick, so 10 ticks stay under 70
        for _ in 0..10 {
            assert_eq!(state.step(&mut rng, now()).rainfall_mm, 0.0);
        }
    }
}
