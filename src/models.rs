//! Data models shared by the sources, the reconciler and the routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Fallback pressure (hPa) for days without hourly pressure data.
pub const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

/// Fixed length of every forecast/chart series.
pub const FORECAST_LEN: usize = 7;

/// One timestamped sample from the local sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_perc: f64,
    pub pressure_hpa: f64,
    pub rainfall_mm: f64,
    pub status: String,
}

/// Current conditions reported by the weather API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCurrent {
    // ---
    pub temperature_c: Option<f64>,
    pub feelslike_c: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_kph: Option<f64>,
    pub rainfall_mm: f64,
    pub condition: String,
}

/// One hourly point inside an API forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    // ---
    pub time_epoch: i64,
    pub temp_c: Option<f64>,
    pub pressure_mb: Option<f64>,
    pub humidity: Option<f64>,
    pub condition: String,
}

/// One day of the weather API forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDailyForecast {
    // ---
    pub day: NaiveDate,
    pub temp_high_c: Option<f64>,
    pub temp_low_c: Option<f64>,
    pub rain_prob_perc: Option<f64>,
    pub condition: String,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub humidity: Option<f64>,
    pub rainfall: f64,
    pub hourly: Vec<HourlyPoint>,
}

/// One day predicted by the regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlForecastEntry {
    // ---
    pub day: NaiveDate,
    pub temp_high_c: f64,
    pub temp_low_c: f64,
    pub rain_prob_perc: Option<f64>,
    pub condition: String,
}

/// Where a merged daily entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaySource {
    Api,
    Ml,
    Synthetic,
}

/// One entry of the reconciled 7-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    // ---
    pub day: NaiveDate,
    pub temp_high_c: Option<f64>,
    pub temp_low_c: Option<f64>,
    pub rain_prob_perc: Option<f64>,
    pub condition: String,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub humidity: Option<f64>,
    pub rainfall: f64,
    pub pressure: f64,
    pub hourly: Vec<HourlyPoint>,
    pub source: DaySource,
}

impl DailyEntry {
    /// True when the entry was fabricated by extrapolation.
    pub fn is_synthetic(&self) -> bool {
        self.source == DaySource::Synthetic
    }
}

impl From<ApiDailyForecast> for DailyEntry {
    fn from(d: ApiDailyForecast) -> Self {
        // ---
        let pressures: Vec<f64> = d.hourly.iter().filter_map(|h| h.pressure_mb).collect();
        let pressure = if pressures.is_empty() {
            DEFAULT_PRESSURE_HPA
        } else {
            pressures.iter().sum::<f64>() / pressures.len() as f64
        };

        DailyEntry {
            day: d.day,
            temp_high_c: d.temp_high_c,
            temp_low_c: d.temp_low_c,
            rain_prob_perc: d.rain_prob_perc,
            condition: d.condition,
            sunrise: d.sunrise,
            sunset: d.sunset,
            humidity: d.humidity,
            rainfall: d.rainfall.max(0.0),
            pressure,
            hourly: d.hourly,
            source: DaySource::Api,
        }
    }
}

impl From<&MlForecastEntry> for DailyEntry {
    fn from(m: &MlForecastEntry) -> Self {
        // ---
        DailyEntry {
            day: m.day,
            temp_high_c: Some(m.temp_high_c),
            temp_low_c: Some(m.temp_low_c),
            rain_prob_perc: m.rain_prob_perc,
            condition: m.condition.clone(),
            sunrise: None,
            sunset: None,
            humidity: None,
            rainfall: 0.0,
            pressure: DEFAULT_PRESSURE_HPA,
            hourly: Vec::new(),
            source: DaySource::Ml,
        }
    }
}

/// Unified view of "now", built from the sensor and/or the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    // ---
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind: Option<f64>,
    pub rainfall: f64,
    pub condition: String,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

/// Whether a fresh sensor reading backed this response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorStatus {
    Connected,
    Disconnected,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Connected => "Connected",
            SensorStatus::Disconnected => "Disconnected",
        }
    }
}

/// Fixed-shape parallel arrays consumed by the dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    // ---
    pub labels: Vec<NaiveDate>,
    #[serde(rename = "AI")]
    pub ai: Vec<Option<f64>>,
    #[serde(rename = "API_high")]
    pub api_high: Vec<Option<f64>>,
    #[serde(rename = "API_low")]
    pub api_low: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
    pub pressure: Vec<Option<f64>>,
    pub rainfall: Vec<f64>,
}

/// One point of the hourly sparkline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySparkPoint {
    // ---
    pub time: i64,
    pub temp: Option<f64>,
    pub pressure: Option<f64>,
}

/// Response of `GET /api/combined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledOutput {
    // ---
    pub current: WeatherSnapshot,
    pub sensor_data: Option<WeatherSnapshot>,
    pub api_data: Option<WeatherSnapshot>,
    pub daily: Vec<DailyEntry>,
    pub sensor_status: SensorStatus,
    pub city: String,
    pub chart: Chart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_forecast: Option<Vec<HourlySparkPoint>>,
}

/// Per-day aggregate over persisted readings.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DailyTrend {
    // ---
    pub date: NaiveDate,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub total_rainfall: Option<f64>,
}

/// Output of the insights generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    // ---
    pub summary: String,
    pub recommendations: Vec<String>,
    pub status_emoji: String,
    pub status_text: String,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn hourly(epoch: i64, pressure: Option<f64>) -> HourlyPoint {
        // ---
        HourlyPoint {
            time_epoch: epoch,
            temp_c: Some(20.0),
            pressure_mb: pressure,
            humidity: Some(50.0),
            condition: "Clear".to_string(),
        }
    }

    fn api_day(hourly: Vec<HourlyPoint>) -> ApiDailyForecast {
        // ---
        ApiDailyForecast {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            temp_high_c: Some(30.0),
            temp_low_c: Some(22.0),
            rain_prob_perc: Some(10.0),
            condition: "Sunny".to_string(),
            sunrise: Some("06:12 AM".to_string()),
            sunset: Some("05:01 PM".to_string()),
            humidity: Some(55.0),
            rainfall: 0.0,
            hourly,
        }
    }

    #[test]
    fn test_api_day_pressure_is_hourly_mean() {
        // ---
        let day = api_day(vec![
            hourly(1, Some(1010.0)),
            hourly(2, Some(1014.0)),
            hourly(3, None),
        ]);
        let entry = DailyEntry::from(day);

        assert_eq!(entry.pressure, 1012.0);
        assert_eq!(entry.source, DaySource::Api);
        assert_eq!(entry.hourly.len(), 3);
    }

    #[test]
    fn test_api_day_without_hourly_uses_default_pressure() {
        // ---
        let entry = DailyEntry::from(api_day(Vec::new()));
        assert_eq!(entry.pressure, DEFAULT_PRESSURE_HPA);
        assert!(!entry.is_synthetic());
    }

    #[test]
    fn test_ml_entry_conversion() {
        // ---
        let ml = MlForecastEntry {
            day: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            temp_high_c: 31.0,
            temp_low_c: 28.0,
            rain_prob_perc: None,
            condition: "ML Prediction".to_string(),
        };
        let entry = DailyEntry::from(&ml);

        assert_eq!(entry.source, DaySource::Ml);
        assert_eq!(entry.temp_high_c, Some(31.0));
        assert_eq!(entry.temp_low_c, Some(28.0));
        assert_eq!(entry.rainfall, 0.0);
        assert!(entry.sunrise.is_none());
    }

    #[test]
    fn test_chart_serializes_dashboard_keys() {
        // ---
        let chart = Chart {
            labels: vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()],
            ai: vec![Some(30.5)],
            api_high: vec![None],
            api_low: vec![Some(20.0)],
            humidity: vec![None],
            pressure: vec![Some(1012.0)],
            rainfall: vec![0.0],
        };
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["labels"][0], "2024-01-01");
        assert_eq!(json["AI"][0], 30.5);
        assert!(json["API_high"][0].is_null());
        assert_eq!(json["API_low"][0], 20.0);
    }

    #[test]
    fn test_sensor_status_serialization() {
        // ---
        assert_eq!(
            serde_json::to_value(SensorStatus::Connected).unwrap(),
            "Connected"
        );
        assert_eq!(SensorStatus::Disconnected.as_str(), "Disconnected");
    }
}
