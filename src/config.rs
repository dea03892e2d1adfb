//! Configuration loader for the `weatherstack-aggregator` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Sources, the reconciler and the routes receive the
//! values they need from [`Config`] instead of reading `env::var` themselves.
//!
use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional duration (whole seconds) environment variable.
macro_rules! parse_env_secs {
    ($var_name:expr, $default:expr) => {
        Duration::from_secs(
            env::var($var_name)
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
                .unwrap_or($default),
        )
    };
}

/// Parse an optional boolean environment variable (`true/false/1/0/yes/no`).
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
            None => $default,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => return Err(anyhow!("Invalid {}: {}", $var_name, other)),
        }
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading. The active city starts out as
/// `city` but can be changed at runtime through the weather source.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Upper bound for a single sensor or history query.
    pub db_timeout: Duration,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// WeatherAPI key. The API source is disabled when absent.
    pub weather_api_key: Option<String>,

    /// WeatherAPI base URL (no trailing slash).
    pub weather_api_url: String,

    /// Initial city used for API queries.
    pub city: String,

    /// How long a successful API response is served from cache.
    pub api_cache_ttl: Duration,

    /// HTTP timeout for upstream API calls.
    pub api_timeout: Duration,

    /// Number of forecast days requested upstream.
    pub forecast_days: u32,

    /// Maximum age of a sensor reading before it counts as disconnected.
    pub sensor_freshness: Duration,

    /// Path of the exported regression model.
    pub ml_model_path: PathBuf,

    /// Upper bound for model load plus inference.
    pub ml_timeout: Duration,

    /// Window (days) of historical aggregates used for trend charts.
    pub history_days: u32,

    /// Enables synthetic extrapolation and cosmetic chart rain.
    pub synthetic_fill: bool,

    /// Starts the mock sensor producer.
    pub mock_sensor: bool,

    /// Period of the mock sensor producer.
    pub mock_sensor_interval: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `DB_TIMEOUT_SECS` – per-query bound (default: 3)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `WEATHERAPI_KEY` – API key (default: unset, API source disabled)
/// - `WEATHERAPI_BASE_URL` – (default: `http://api.weatherapi.com/v1`)
/// - `CITY_NAME` – initial location (default: `Kolkata`)
/// - `API_CACHE_TTL_SECS` – (default: 300)
/// - `API_TIMEOUT_SECS` – (default: 10)
/// - `FORECAST_DAYS` – (default: 7)
/// - `SENSOR_FRESHNESS_SECS` – (default: 12)
/// - `ML_MODEL_PATH` – (default: `db/trained_weather_model.json`)
/// - `ML_TIMEOUT_SECS` – (default: 5)
/// - `HISTORY_DAYS` – (default: 7)
/// - `SYNTHETIC_FILL` – (default: true)
/// - `MOCK_SENSOR` – (default: false)
/// - `MOCK_SENSOR_INTERVAL_SECS` – (default: 5)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let db_timeout = parse_env_secs!("DB_TIMEOUT_SECS", 3);

    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    let weather_api_key = env::var("WEATHERAPI_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let weather_api_url = env::var("WEATHERAPI_BASE_URL")
        .unwrap_or_else(|_| "http://api.weatherapi.com/v1".to_string())
        .trim_end_matches('/')
        .to_string();
    let city = env::var("CITY_NAME").unwrap_or_else(|_| "Kolkata".to_string());

    let api_cache_ttl = parse_env_secs!("API_CACHE_TTL_SECS", 300);
    let api_timeout = parse_env_secs!("API_TIMEOUT_SECS", 10);
    let forecast_days = parse_env_u32!("FORECAST_DAYS", 7);
    let sensor_freshness = parse_env_secs!("SENSOR_FRESHNESS_SECS", 12);

    let ml_model_path = PathBuf::from(
        env::var("ML_MODEL_PATH").unwrap_or_else(|_| "db/trained_weather_model.json".to_string()),
    );
    let ml_timeout = parse_env_secs!("ML_TIMEOUT_SECS", 5);

    let history_days = parse_env_u32!("HISTORY_DAYS", 7);
    let synthetic_fill = parse_env_bool!("SYNTHETIC_FILL", true);
    let mock_sensor = parse_env_bool!("MOCK_SENSOR", false);
    let mock_sensor_interval = parse_env_secs!("MOCK_SENSOR_INTERVAL_SECS", 5);

    Ok(Config {
        db_url,
        db_pool_max,
        db_timeout,
        bind_addr,
        weather_api_key,
        weather_api_url,
        city,
        api_cache_ttl,
        api_timeout,
        forecast_days,
        sensor_freshness,
        ml_model_path,
        ml_timeout,
        history_days,
        synthetic_fill,
        mock_sensor,
        mock_sensor_interval,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and the API key while showing all other
    /// configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        let api_key = match &self.weather_api_key {
            Some(_) => "****",
            None => "<unset, API source disabled>",
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL          : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX           : {}", self.db_pool_max);
        tracing::info!("  DB_TIMEOUT_SECS       : {}", self.db_timeout.as_secs());
        tracing::info!("  BIND_ADDR             : {}", self.bind_addr);
        tracing::info!("  WEATHERAPI_KEY        : {}", api_key);
        tracing::info!("  WEATHERAPI_BASE_URL   : {}", self.weather_api_url);
        tracing::info!("  CITY_NAME             : {}", self.city);
        tracing::info!("  API_CACHE_TTL_SECS    : {}", self.api_cache_ttl.as_secs());
        tracing::info!("  API_TIMEOUT_SECS      : {}", self.api_timeout.as_secs());
        tracing::info!("  FORECAST_DAYS         : {}", self.forecast_days);
        tracing::info!("  SENSOR_FRESHNESS_SECS : {}", self.sensor_freshness.as_secs());
        tracing::info!("  ML_MODEL_PATH         : {}", self.ml_model_path.display());
        tracing::info!("  ML_TIMEOUT_SECS       : {}", self.ml_timeout.as_secs());
        tracing::info!("  HISTORY_DAYS          : {}", self.history_days);
        tracing::info!("  SYNTHETIC_FILL        : {}", self.synthetic_fill);
        tracing::info!("  MOCK_SENSOR           : {}", self.mock_sensor);
        tracing::info!("  MOCK_SENSOR_INTERVAL  : {}", self.mock_sensor_interval.as_secs());
    }
}

/// Replace the password portion of a connection URL with `****`.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // "postgres://user@host" has its only colon in the scheme
            if db_url[colon_pos..].starts_with("://") {
                return db_url.to_string();
            }
            return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
        }
    }
    db_url.to_string()
}
