//! The `current` snapshot and the per-source snapshots behind it.
//!
//! Canonical precedence, applied field by field through [`first_present`]:
//!
//! - temp, humidity, pressure, rainfall, condition, wind, updated: sensor, then API
//! - feels_like: sensor, then API, then the resolved temp
//! - sunrise, sunset: merged `daily[0]`, then API forecast day 0

use crate::models::{ApiCurrent, ApiDailyForecast, DailyEntry, Reading, WeatherSnapshot};
use crate::resolve::first_present;

// ---

pub fn sensor_snapshot(reading: &Reading) -> WeatherSnapshot {
    // ---
    WeatherSnapshot {
        temp: Some(reading.temperature_c),
        feels_like: None,
        humidity: Some(reading.humidity_perc),
        pressure: Some(reading.pressure_hpa),
        wind: None,
        rainfall: reading.rainfall_mm.max(0.0),
        condition: non_empty(&reading.status).unwrap_or("Unknown").to_string(),
        sunrise: None,
        sunset: None,
        updated: Some(reading.timestamp),
    }
}

pub fn api_snapshot(current: &ApiCurrent, today: Option<&ApiDailyForecast>) -> WeatherSnapshot {
    // ---
    WeatherSnapshot {
        temp: current.temperature_c,
        feels_like: current.feelslike_c,
        humidity: current.humidity,
        pressure: current.pressure_hpa,
        wind: current.wind_kph,
        rainfall: current.rainfall_mm,
        condition: current.condition.clone(),
        sunrise: today.and_then(|d| d.sunrise.clone()),
        sunset: today.and_then(|d| d.sunset.clone()),
        updated: None,
    }
}

/// Combine the two snapshots into `current`.
pub fn unify(
    sensor: Option<&WeatherSnapshot>,
    api: Option<&WeatherSnapshot>,
    daily: &[DailyEntry],
    api_today: Option<&ApiDailyForecast>,
) -> WeatherSnapshot {
    // ---
    let temp = first_present([sensor.and_then(|s| s.temp), api.and_then(|a| a.temp)]);
    let feels_like = first_present([
        sensor.and_then(|s| s.feels_like),
        api.and_then(|a| a.feels_like),
        temp,
    ]);

    let first_day = daily.first();
    let sunrise = first_present([
        first_day.and_then(|d| d.sunrise.clone()),
        api_today.and_then(|d| d.sunrise.clone()),
    ]);
    let sunset = first_present([
        first_day.and_then(|d| d.sunset.clone()),
        api_today.and_then(|d| d.sunset.clone()),
    ]);

    WeatherSnapshot {
        temp,
        feels_like,
        humidity: first_present([sensor.and_then(|s| s.humidity), api.and_then(|a| a.humidity)]),
        pressure: first_present([sensor.and_then(|s| s.pressure), api.and_then(|a| a.pressure)]),
        wind: first_present([sensor.and_then(|s| s.wind), api.and_then(|a| a.wind)]),
        rainfall: first_present([sensor.map(|s| s.rainfall), api.map(|a| a.rainfall)])
            .unwrap_or(0.0),
        condition: first_present([
            sensor.map(|s| s.condition.clone()),
            api.map(|a| a.condition.clone()),
        ])
        .unwrap_or_else(|| "Unknown".to_string()),
        sunrise,
        sunset,
        updated: first_present([sensor.and_then(|s| s.updated), api.and_then(|a| a.updated)]),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading() -> Reading {
        // ---
        Reading {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            temperature_c: 28.4,
            humidity_perc: 61.0,
            pressure_hpa: 1011.0,
            rainfall_mm: 0.0,
            status: "Dry".to_string(),
        }
    }

    fn api_current() -> ApiCurrent {
        // ---
        ApiCurrent {
            temperature_c: Some(29.0),
            feelslike_c: None,
            humidity: Some(70.0),
            pressure_hpa: Some(1008.0),
            wind_kph: Some(12.0),
            rainfall_mm: 0.4,
            condition: "Haze".to_string(),
        }
    }

    #[test]
    fn test_sensor_wins_and_api_fills_wind() {
        // ---
        let sensor = sensor_snapshot(&reading());
        let api = api_snapshot(&api_current(), None);

        let current = unify(Some(&sensor), Some(&api), &[], None);

        assert_eq!(current.temp, Some(28.4));
        assert_eq!(current.humidity, Some(61.0));
        assert_eq!(current.wind, Some(12.0));
        assert_eq!(current.feels_like, Some(28.4));
        assert_eq!(current.rainfall, 0.0);
        assert_eq!(current.condition, "Dry");
    }

    #[test]
    fn test_api_feels_like_backfills_sensor() {
        // ---
        let sensor = sensor_snapshot(&reading());
        let mut api_now = api_current();
        api_now.feelslike_c = Some(33.0);
        let api = api_snapshot(&api_now, None);

        let current = unify(Some(&sensor), Some(&api), &[], None);
        assert_eq!(current.feels_like, Some(33.0));
    }

    #[test]
    fn test_api_only() {
        // ---
        let api = api_snapshot(&api_current(), None);
        let current = unify(None, Some(&api), &[], None);

        assert_eq!(current.temp, Some(29.0));
        assert_eq!(current.feels_like, Some(29.0));
        assert_eq!(current.rainfall, 0.4);
        assert_eq!(current.condition, "Haze");
        assert!(current.updated.is_none());
    }

    #[test]
    fn test_no_sources() {
        // ---
        let current = unify(None, None, &[], None);
        assert_eq!(current.temp, None);
        assert_eq!(current.condition, "Unknown");
        assert_eq!(current.rainfall, 0.0);
    }

    #[test]
    fn test_blank_sensor_status_is_unknown() {
        // ---
        let mut r = reading();
        r.status = "  ".to_string();
        assert_eq!(sensor_snapshot(&r).condition, "Unknown");
    }
}
