//! Queries against the persistence collaborator.
//!
//! Thin wrappers over `sqlx`; callers decide how to degrade on error.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ApiDailyForecast, DailyTrend, Reading};

// ---

/// Most recent sensor row, if any.
pub async fn latest_reading(pool: &PgPool) -> Result<Option<Reading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Reading>(
        r#"
        SELECT timestamp_utc AS timestamp,
               temperature_c, humidity_perc, pressure_hpa, rainfall_mm, status
        FROM readings
        ORDER BY timestamp_utc DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

pub async fn insert_reading(pool: &PgPool, reading: &Reading) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO readings (
            timestamp_utc, temperature_c, humidity_perc,
            pressure_hpa, rainfall_mm, status
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(reading.timestamp)
    .bind(reading.temperature_c)
    .bind(reading.humidity_perc)
    .bind(reading.pressure_hpa)
    .bind(reading.rainfall_mm)
    .bind(&reading.status)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store a forecast as one batch (one row per day) and return the batch id.
pub async fn insert_forecast_batch(
    pool: &PgPool,
    source: &str,
    created_at: DateTime<Utc>,
    forecast: &[ApiDailyForecast],
    summary: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    // ---
    let batch_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    for (idx, day) in forecast.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO forecasts (
                batch_id, created_at, source, day_index, day_date,
                temp_high_c, temp_low_c, rain_prob_perc, condition, summary
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(batch_id)
        .bind(created_at)
        .bind(source)
        .bind(idx as i32 + 1)
        .bind(day.day)
        .bind(day.temp_high_c)
        .bind(day.temp_low_c)
        .bind(day.rain_prob_perc)
        .bind(&day.condition)
        .bind(summary)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(batch_id)
}

/// Per-day averages over the last `days` days of readings, oldest first.
pub async fn daily_trends(pool: &PgPool, days: u32) -> Result<Vec<DailyTrend>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, DailyTrend>(
        r#"
        SELECT
            (timestamp_utc AT TIME ZONE 'UTC')::date AS date,
            AVG(temperature_c)  AS avg_temp,
            AVG(humidity_perc)  AS avg_humidity,
            AVG(pressure_hpa)   AS avg_pressure,
            SUM(rainfall_mm)    AS total_rainfall
        FROM readings
        WHERE timestamp_utc >= NOW() - make_interval(days => $1)
        GROUP BY 1
        ORDER BY 1 ASC
        "#,
    )
    .bind(days as i32)
    .fetch_all(pool)
    .await
}
