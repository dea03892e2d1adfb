//! Upstream feeds consumed by the reconciler.
//!
//! Each source hides its own failure modes and hands back an absent or empty
//! value instead of an error, so callers never branch on source errors.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::cache::SystemClock;
use crate::Config;

mod ml;
mod sensor;
mod weather_api;

pub use ml::MlForecastSource;
pub use sensor::SensorSource;
pub use weather_api::WeatherApiSource;
use weather_api::WeatherApiSettings;

#[cfg(test)]
pub(crate) use sensor::keep_if_fresh;

// ---

/// The three feeds, built once at startup and shared by every request.
#[derive(Clone)]
pub struct Sources {
    pub sensor: SensorSource,
    pub weather: Arc<WeatherApiSource>,
    pub ml: MlForecastSource,
}

impl Sources {
    // ---
    pub fn from_config(pool: PgPool, config: &Config) -> Result<Self> {
        // ---
        let sensor = SensorSource::new(pool, config.sensor_freshness, config.db_timeout);

        let weather = WeatherApiSource::new(
            WeatherApiSettings {
                base_url: config.weather_api_url.clone(),
                api_key: config.weather_api_key.clone(),
                city: config.city.clone(),
                forecast_days: config.forecast_days,
                cache_ttl: config.api_cache_ttl,
                timeout: config.api_timeout,
            },
            Arc::new(SystemClock),
        )?;

        let ml = MlForecastSource::new(
            sensor.clone(),
            config.ml_model_path.clone(),
            config.ml_timeout,
        );

        Ok(Self {
            sensor,
            weather: Arc::new(weather),
            ml,
        })
    }
}
