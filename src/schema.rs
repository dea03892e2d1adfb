//! Database schema management for `weatherstack-aggregator`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings` table written by the sensor producer and the
/// `forecasts` table written by the API sync action. Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per sensor sample
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id             BIGSERIAL PRIMARY KEY,
            timestamp_utc  TIMESTAMPTZ      NOT NULL,
            temperature_c  DOUBLE PRECISION NOT NULL,
            humidity_perc  DOUBLE PRECISION NOT NULL,
            pressure_hpa   DOUBLE PRECISION NOT NULL,
            rainfall_mm    DOUBLE PRECISION NOT NULL DEFAULT 0,
            status         TEXT             NOT NULL DEFAULT 'Unknown'
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Persisted forecast batches, one row per day
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS forecasts (
            id              BIGSERIAL PRIMARY KEY,
            batch_id        UUID             NOT NULL,
            created_at      TIMESTAMPTZ      NOT NULL,
            source          TEXT             NOT NULL,
            day_index       INTEGER          NOT NULL,
            day_date        DATE             NOT NULL,
            temp_high_c     DOUBLE PRECISION,
            temp_low_c      DOUBLE PRECISION,
            rain_prob_perc  DOUBLE PRECISION,
            condition       TEXT,
            summary         TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // "Latest reading" and trend windows both scan by time
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_timestamp_utc
            ON readings (timestamp_utc DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_forecasts_source_created
            ON forecasts (source, created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
