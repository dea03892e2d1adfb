//! Weather API source: current conditions and the multi-day forecast.
//!
//! Both calls sit behind a [`TtlCache`]; a failed refresh serves the last
//! good payload. Upstream JSON is parsed loosely (field aliases, condition as
//! object or string) so small schema drifts do not blank the dashboard.

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{Clock, TtlCache};
use crate::models::{ApiCurrent, ApiDailyForecast, HourlyPoint};
use crate::resolve::{condition_text, first_number, first_string};

// ---

static NULL: Value = Value::Null;

pub struct WeatherApiSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    forecast_days: u32,
    city: RwLock<String>,
    current: TtlCache<ApiCurrent>,
    forecast: TtlCache<Vec<ApiDailyForecast>>,
}

/// Settings needed to build a [`WeatherApiSource`].
pub struct WeatherApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub city: String,
    pub forecast_days: u32,
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

impl WeatherApiSource {
    // ---
    pub fn new(settings: WeatherApiSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        // ---
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build weather API HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url,
            api_key: settings.api_key,
            forecast_days: settings.forecast_days,
            city: RwLock::new(settings.city),
            current: TtlCache::new(settings.cache_ttl, clock.clone()),
            forecast: TtlCache::new(settings.cache_ttl, clock),
        })
    }

    pub fn city(&self) -> String {
        self.city.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Switch the active location and drop both cached payloads.
    pub fn set_city(&self, city: &str) {
        // ---
        {
            let mut active = self.city.write().unwrap_or_else(|e| e.into_inner());
            *active = city.to_string();
        }
        self.current.invalidate();
        self.forecast.invalidate();
        info!("Active city set to '{}', API cache invalidated", city);
    }

    /// Current conditions, or `None` if never fetched successfully.
    pub async fn current(&self) -> Option<ApiCurrent> {
        // ---
        let key = self.api_key.as_deref()?;
        let url = format!("{}/current.json", self.base_url);
        let city = self.city();
        let (url, city) = (&url, &city);

        self.current
            .get_or_refresh("WeatherAPI current", || async move {
                let body = self.fetch_json(url, key, city, None).await?;
                parse_current(&body).ok_or_else(|| anyhow!("unexpected current.json payload"))
            })
            .await
    }

    /// Ordered daily forecast, or `None` if never fetched successfully.
    pub async fn forecast_7day(&self) -> Option<Vec<ApiDailyForecast>> {
        // ---
        let key = self.api_key.as_deref()?;
        let url = format!("{}/forecast.json", self.base_url);
        let city = self.city();
        let (url, city) = (&url, &city);
        let days = self.forecast_days;

        self.forecast
            .get_or_refresh("WeatherAPI forecast", || async move {
                let body = self.fetch_json(url, key, city, Some(days)).await?;
                parse_forecast(&body).ok_or_else(|| anyhow!("unexpected forecast.json payload"))
            })
            .await
    }

    async fn fetch_json(&self, url: &str, key: &str, city: &str, days: Option<u32>) -> Result<Value> {
        // ---
        let mut query = vec![
            ("key", key.to_string()),
            ("q", city.to_string()),
            ("aqi", "no".to_string()),
        ];
        if let Some(days) = days {
            query.push(("days", days.to_string()));
        }

        debug!("Fetching {} for '{}'", url, city);
        let response = self.client.get(url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("WeatherAPI returned HTTP {}: {}", status, body);
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Parse `current.json`. Also accepts an already-flattened `current` object.
pub fn parse_current(body: &Value) -> Option<ApiCurrent> {
    // ---
    let c = body.get("current").filter(|v| v.is_object())?;

    let parsed = ApiCurrent {
        temperature_c: first_number(c, &["temperature_c", "temp_c"]),
        feelslike_c: first_number(c, &["feelslike_c", "feels_like_c"]),
        humidity: first_number(c, &["humidity", "humidity_perc"]),
        pressure_hpa: first_number(c, &["pressure_hpa", "pressure_mb"]),
        wind_kph: first_number(c, &["wind_kph", "wind_speed_kph"]),
        rainfall_mm: first_number(c, &["rainfall_mm", "precip_mm"])
            .unwrap_or(0.0)
            .max(0.0),
        condition: condition_text(c.get("condition")),
    };

    if parsed.temperature_c.is_none() && parsed.humidity.is_none() && parsed.pressure_hpa.is_none() {
        warn!("WeatherAPI current payload has no usable readings");
        return None;
    }
    Some(parsed)
}

/// Parse `forecast.json` into ordered day entries.
///
/// Days with an unparseable date are skipped; a payload without a
/// `forecast.forecastday` array is rejected.
pub fn parse_forecast(body: &Value) -> Option<Vec<ApiDailyForecast>> {
    // ---
    let days = body
        .get("forecast")
        .and_then(|f| f.get("forecastday"))
        .and_then(Value::as_array)?;

    let mut out: Vec<ApiDailyForecast> = days.iter().filter_map(parse_forecast_day).collect();
    out.sort_by_key(|d| d.day);
    out.dedup_by_key(|d| d.day);
    Some(out)
}

fn parse_forecast_day(d: &Value) -> Option<ApiDailyForecast> {
    // ---
    let date = first_string(d, &["date", "day"])?;
    let day = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(day) => day,
        Err(e) => {
            warn!("Skipping forecast day with bad date '{}': {}", date, e);
            return None;
        }
    };

    let summary = d.get("day").filter(|v| v.is_object()).unwrap_or(&NULL);
    let astro = d.get("astro").unwrap_or(&NULL);

    let hourly = d
        .get("hour")
        .and_then(Value::as_array)
        .map(|hours| hours.iter().filter_map(parse_hour).collect())
        .unwrap_or_default();

    Some(ApiDailyForecast {
        day,
        temp_high_c: first_number(summary, &["maxtemp_c", "temp_high_c"]),
        temp_low_c: first_number(summary, &["mintemp_c", "temp_low_c"]),
        rain_prob_perc: first_number(summary, &["daily_chance_of_rain", "rain_prob_perc"]),
        condition: condition_text(summary.get("condition")),
        sunrise: first_string(astro, &["sunrise"]),
        sunset: first_string(astro, &["sunset"]),
        humidity: first_number(summary, &["avghumidity", "humidity"]),
        rainfall: first_number(summary, &["totalprecip_mm", "rainfall"])
            .unwrap_or(0.0)
            .max(0.0),
        hourly,
    })
}

fn parse_hour(h: &Value) -> Option<HourlyPoint> {
    // ---
    let time_epoch = h.get("time_epoch").and_then(Value::as_i64)?;
    Some(HourlyPoint {
        time_epoch,
        temp_c: first_number(h, &["temp_c", "temperature_c"]),
        pressure_mb: first_number(h, &["pressure_mb", "pressure_hpa"]),
        humidity: first_number(h, &["humidity"]),
        condition: condition_text(h.get("condition")),
    })
}
