//! Natural-language summary and recommendations for a reconciled response.
//!
//! A fixed rule table, no state:
//!
//! | input                 | band            | summary fragment           | recommendation        |
//! |-----------------------|-----------------|----------------------------|-----------------------|
//! | temp                  | ≥35 … <5 °C     | "Very hot at 36°C" …       |                       |
//! | humidity              | >80             | "Very humid at 85%"        | "💧 Stay hydrated"    |
//! | humidity              | >60             | "Moderately humid at 65%"  |                       |
//! | humidity              | <30             | "Dry air at 25%"           | "🧴 Use moisturizer"  |
//! | rainfall              | >10 / >2 / >0   | "Heavy/Moderate/Light rain"| umbrella for >2 mm    |
//! | condition             | rain or drizzle | "Rainy conditions"         | "🌂 Bring umbrella"   |
//! | next 2 days rain prob | >60 %           |                            | "🌂 Rain likely soon" |
//! | pressure              | <1000 / >1020   | "Low pressure system"/"High pressure" | "⛈️ Storms possible" on low |
//! | tomorrow high vs temp | ±3 °C           | "Warming/Cooling trend"    |                       |
//!
//! The summary joins the first three fragments; at most three
//! recommendations are returned.

use crate::models::{DailyEntry, Insights, SensorStatus, WeatherSnapshot};

// ---

const MAX_FRAGMENTS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 3;

const VERY_HUMID: f64 = 80.0;
const HUMID: f64 = 60.0;
const DRY_AIR: f64 = 30.0;

const HEAVY_RAIN_MM: f64 = 10.0;
const MODERATE_RAIN_MM: f64 = 2.0;
const LIKELY_RAIN_PERC: f64 = 60.0;
const RAIN_OUTLOOK_DAYS: usize = 2;

const LOW_PRESSURE_HPA: f64 = 1000.0;
const HIGH_PRESSURE_HPA: f64 = 1020.0;

const TREND_DELTA_C: f64 = 3.0;

const EMPTY_SUMMARY: &str = "Weather data is being collected.";

/// Build the insights for one reconciled response.
///
/// `forecast` is the merged daily list; entry 0 is today, entry 1 tomorrow.
pub fn summarize(
    current: &WeatherSnapshot,
    forecast: &[DailyEntry],
    status: SensorStatus,
) -> Insights {
    // ---
    let mut fragments: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();

    if let Some(temp) = current.temp {
        fragments.push(temperature_band(temp));
    }

    if let Some(humidity) = current.humidity {
        if humidity > VERY_HUMID {
            fragments.push(format!("Very humid at {:.0}%", humidity));
            recommendations.push("💧 Stay hydrated".to_string());
        } else if humidity > HUMID {
            fragments.push(format!("Moderately humid at {:.0}%", humidity));
        } else if humidity < DRY_AIR {
            fragments.push(format!("Dry air at {:.0}%", humidity));
            recommendations.push("🧴 Use moisturizer".to_string());
        }
    }

    let (rain_fragment, rain_rec) = rain_outlook(current, forecast);
    fragments.extend(rain_fragment);
    recommendations.extend(rain_rec);

    if let Some(pressure) = current.pressure {
        if pressure < LOW_PRESSURE_HPA {
            fragments.push("Low pressure system".to_string());
            recommendations.push("⛈️ Storms possible".to_string());
        } else if pressure > HIGH_PRESSURE_HPA {
            fragments.push("High pressure".to_string());
        }
    }

    let tomorrow_high = forecast.get(1).and_then(|d| d.temp_high_c);
    if let (Some(temp), Some(high)) = (current.temp, tomorrow_high) {
        let diff = high - temp;
        if diff > TREND_DELTA_C {
            fragments.push("Warming trend ahead".to_string());
        } else if diff < -TREND_DELTA_C {
            fragments.push("Cooling trend expected".to_string());
        }
    }

    let summary = if fragments.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        fragments.truncate(MAX_FRAGMENTS);
        format!("{}.", fragments.join(". "))
    };
    recommendations.truncate(MAX_RECOMMENDATIONS);

    let status_emoji = match status {
        SensorStatus::Connected => "🟢",
        SensorStatus::Disconnected => "🔴",
    };

    Insights {
        summary,
        recommendations,
        status_emoji: status_emoji.to_string(),
        status_text: status.as_str().to_string(),
    }
}

fn temperature_band(temp: f64) -> String {
    // ---
    let label = match temp {
        t if t >= 35.0 => "Very hot at",
        t if t >= 30.0 => "Hot weather at",
        t if t >= 25.0 => "Warm at",
        t if t >= 20.0 => "Pleasant",
        t if t >= 15.0 => "Mild at",
        t if t >= 10.0 => "Cool at",
        t if t >= 5.0 => "Cold at",
        _ => "Very cold at",
    };
    format!("{} {:.0}°C", label, temp)
}

/// Current rain first, then the condition text, then the short-range outlook.
fn rain_outlook(
    current: &WeatherSnapshot,
    forecast: &[DailyEntry],
) -> (Option<String>, Option<String>) {
    // ---
    let mm = current.rainfall;
    let (mut fragment, mut rec) = if mm > HEAVY_RAIN_MM {
        (
            Some(format!("Heavy rain ({:.1}mm)", mm)),
            Some("🌂 Umbrella essential"),
        )
    } else if mm > MODERATE_RAIN_MM {
        (
            Some(format!("Moderate rain ({:.1}mm)", mm)),
            Some("🌂 Bring umbrella"),
        )
    } else if mm > 0.0 {
        (Some(format!("Light rain ({:.1}mm)", mm)), None)
    } else {
        (None, None)
    };

    let condition = current.condition.to_lowercase();
    if condition.contains("rain") || condition.contains("drizzle") {
        fragment.get_or_insert_with(|| "Rainy conditions".to_string());
        rec.get_or_insert("🌂 Bring umbrella");
    }

    if rec.is_none() {
        let rain_soon = forecast
            .iter()
            .take(RAIN_OUTLOOK_DAYS)
            .any(|d| d.rain_prob_perc.is_some_and(|p| p > LIKELY_RAIN_PERC));
        if rain_soon {
            rec = Some("🌂 Rain likely soon");
        }
    }

    (fragment, rec.map(str::to_string))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    use crate::models::{DaySource, DEFAULT_PRESSURE_HPA};

    fn snapshot(temp: f64, humidity: f64, pressure: f64) -> WeatherSnapshot {
        // ---
        WeatherSnapshot {
            temp: Some(temp),
            humidity: Some(humidity),
            pressure: Some(pressure),
            condition: "Clear".to_string(),
            ..Default::default()
        }
    }

    fn day(offset: u32, high: f64, rain_prob: Option<f64>) -> DailyEntry {
        // ---
        DailyEntry {
            day: NaiveDate::from_ymd_opt(2024, 1, 1 + offset).unwrap(),
            temp_high_c: Some(high),
            temp_low_c: Some(high - 8.0),
            rain_prob_perc: rain_prob,
            condition: "Sunny".to_string(),
            sunrise: None,
            sunset: None,
            humidity: None,
            rainfall: 0.0,
            pressure: DEFAULT_PRESSURE_HPA,
            hourly: Vec::new(),
            source: DaySource::Api,
        }
    }

    #[test]
    fn test_temperature_bands() {
        // ---
        assert_eq!(temperature_band(36.2), "Very hot at 36°C");
        assert_eq!(temperature_band(35.0), "Very hot at 35°C");
        assert_eq!(temperature_band(28.4), "Warm at 28°C");
        assert_eq!(temperature_band(21.0), "Pleasant 21°C");
        assert_eq!(temperature_band(0.0), "Very cold at 0°C");
        assert_eq!(temperature_band(-4.0), "Very cold at -4°C");
    }

    #[test]
    fn test_summary_joins_first_three_fragments() {
        // ---
        let current = snapshot(36.0, 85.0, 995.0);
        let insights = summarize(&current, &[], SensorStatus::Connected);

        assert_eq!(
            insights.summary,
            "Very hot at 36°C. Very humid at 85%. Low pressure system."
        );
        assert_eq!(
            insights.recommendations,
            vec!["💧 Stay hydrated", "⛈️ Storms possible"]
        );
        assert_eq!(insights.status_emoji, "🟢");
        assert_eq!(insights.status_text, "Connected");
    }

    #[test]
    fn test_recommendations_capped_at_three() {
        // ---
        let mut current = snapshot(22.0, 90.0, 990.0);
        current.rainfall = 12.0;
        let insights = summarize(&current, &[], SensorStatus::Disconnected);

        assert_eq!(
            insights.recommendations,
            vec![
                "💧 Stay hydrated",
                "🌂 Umbrella essential",
                "⛈️ Storms possible"
            ]
        );
        assert!(insights.summary.contains("Heavy rain (12.0mm)"));
        assert_eq!(insights.status_emoji, "🔴");
        assert_eq!(insights.status_text, "Disconnected");
    }

    #[test]
    fn test_rain_condition_without_measured_rain() {
        // ---
        let mut current = snapshot(22.0, 50.0, 1010.0);
        current.condition = "Light Drizzle".to_string();
        let insights = summarize(&current, &[], SensorStatus::Connected);

        assert_eq!(insights.summary, "Pleasant 22°C. Rainy conditions.");
        assert_eq!(insights.recommendations, vec!["🌂 Bring umbrella"]);
    }

    #[test]
    fn test_light_rain_has_no_umbrella_unless_outlook_wet() {
        // ---
        let mut current = snapshot(22.0, 50.0, 1010.0);
        current.rainfall = 0.5;

        let dry = summarize(&current, &[day(0, 22.0, Some(10.0))], SensorStatus::Connected);
        assert!(dry.summary.contains("Light rain (0.5mm)"));
        assert!(dry.recommendations.is_empty());

        let wet_outlook = [day(0, 22.0, Some(10.0)), day(1, 22.0, Some(75.0))];
        let wet = summarize(&current, &wet_outlook, SensorStatus::Connected);
        assert_eq!(wet.recommendations, vec!["🌂 Rain likely soon"]);
    }

    #[test]
    fn test_outlook_ignores_days_past_tomorrow() {
        // ---
        let current = snapshot(22.0, 50.0, 1010.0);
        let forecast = [
            day(0, 22.0, None),
            day(1, 22.0, Some(20.0)),
            day(2, 22.0, Some(95.0)),
        ];
        let insights = summarize(&current, &forecast, SensorStatus::Connected);
        assert!(insights.recommendations.is_empty());
    }

    #[test]
    fn test_trend_against_tomorrow() {
        // ---
        let current = snapshot(22.0, 50.0, 1010.0);

        let warming = summarize(&current, &[day(0, 22.0, None), day(1, 26.0, None)], SensorStatus::Connected);
        assert_eq!(warming.summary, "Pleasant 22°C. Warming trend ahead.");

        let cooling = summarize(&current, &[day(0, 22.0, None), day(1, 18.0, None)], SensorStatus::Connected);
        assert_eq!(cooling.summary, "Pleasant 22°C. Cooling trend expected.");

        let flat = summarize(&current, &[day(0, 22.0, None), day(1, 24.0, None)], SensorStatus::Connected);
        assert_eq!(flat.summary, "Pleasant 22°C.");
    }

    #[test]
    fn test_empty_inputs() {
        // ---
        let insights = summarize(&WeatherSnapshot::default(), &[], SensorStatus::Disconnected);

        assert_eq!(insights.summary, EMPTY_SUMMARY);
        assert!(insights.recommendations.is_empty());
    }
}
