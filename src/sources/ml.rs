//! Forecast source backed by a pretrained regression model.
//!
//! The model is an offline-trained export (JSON) holding its feature order
//! and either linear weights or a forest of regression trees. Inference feeds
//! it one row per day offset 1..=7, built from the latest reading with only
//! `dayofyear` moving forward; every other feature is carried forward from
//! that reading unchanged. This is a known approximation of the trained
//! feature set, kept as-is.
//!
//! The contract is "degrade to empty": a missing or stale reading, an
//! unreadable model or a timeout all yield an empty forecast. The model is
//! parsed once and shared by every request.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Timelike};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::models::{MlForecastEntry, Reading, FORECAST_LEN};
use crate::sources::sensor::SensorSource;

// ---

/// Offset between the predicted high and the reported low.
pub const LOW_OFFSET_C: f64 = 3.0;

/// Condition label attached to every model-derived day.
pub const ML_CONDITION: &str = "ML Prediction";

/// One node of an exported regression tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn predict(&self, row: &[f64]) -> f64 {
        // ---
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    node = if x <= *threshold { left } else { right };
                }
            }
        }
    }

    fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split {
                feature, left, right, ..
            } => [Some(*feature), left.max_feature(), right.max_feature()]
                .into_iter()
                .flatten()
                .max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear {
        features: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        features: Vec<String>,
        trees: Vec<TreeNode>,
    },
}

impl RegressionModel {
    // ---
    pub fn features(&self) -> &[String] {
        match self {
            RegressionModel::Linear { features, .. } | RegressionModel::Forest { features, .. } => {
                features
            }
        }
    }

    /// Parse and sanity-check an exported model.
    pub fn from_json(raw: &str) -> Result<Self> {
        // ---
        let model: RegressionModel = serde_json::from_str(raw).context("Invalid model JSON")?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        // ---
        if self.features().is_empty() {
            bail!("model declares no features");
        }
        match self {
            RegressionModel::Linear {
                features,
                coefficients,
                ..
            } => {
                if coefficients.len() != features.len() {
                    bail!(
                        "model has {} coefficients for {} features",
                        coefficients.len(),
                        features.len()
                    );
                }
            }
            RegressionModel::Forest { features, trees } => {
                if trees.is_empty() {
                    bail!("forest model has no trees");
                }
                if let Some(max) = trees.iter().filter_map(TreeNode::max_feature).max() {
                    if max >= features.len() {
                        bail!("tree splits on feature {} but only {} exist", max, features.len());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        // ---
        match self {
            RegressionModel::Linear {
                intercept,
                coefficients,
                ..
            } => intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>(),
            RegressionModel::Forest { trees, .. } => {
                trees.iter().map(|t| t.predict(row)).sum::<f64>() / trees.len() as f64
            }
        }
    }
}

/// Value of one named model feature for "latest reading + `offset` days".
///
/// Only `dayofyear` depends on the offset. Rolling means carry the current
/// value, differences are zero, unknown names are zero.
pub fn feature_value(name: &str, reading: &Reading, offset: u32) -> f64 {
    // ---
    match name {
        "dayofyear" => (reading.timestamp.ordinal() + offset) as f64,
        "hour_of_day" | "hour" => reading.timestamp.hour() as f64,
        "temperature_c" | "temperature" | "temp_roll_3" | "temp_roll_6" => reading.temperature_c,
        "humidity_perc" | "humidity" => reading.humidity_perc,
        "pressure_hpa" | "pressure" | "pressure_roll_3" => reading.pressure_hpa,
        "rainfall_mm" | "rainfall" | "rain_roll_3" => reading.rainfall_mm,
        "pressure_diff_1" => 0.0,
        other => {
            debug!("Model feature '{}' has no source, using 0", other);
            0.0
        }
    }
}

/// Run the model once per day offset 1..=7.
pub fn predict_week(model: &RegressionModel, latest: &Reading) -> Vec<MlForecastEntry> {
    // ---
    let base_day = latest.timestamp.date_naive();

    (1..=FORECAST_LEN as u32)
        .filter_map(|offset| {
            let row: Vec<f64> = model
                .features()
                .iter()
                .map(|f| feature_value(f, latest, offset))
                .collect();
            let high = model.predict(&row);
            if !high.is_finite() {
                warn!("Model produced non-finite prediction for offset {}", offset);
                return None;
            }
            let day = base_day.checked_add_days(chrono::Days::new(offset as u64))?;

            Some(MlForecastEntry {
                day,
                temp_high_c: high,
                temp_low_c: high - LOW_OFFSET_C,
                rain_prob_perc: None,
                condition: ML_CONDITION.to_string(),
            })
        })
        .collect()
}

/// Model loaded from disk on first use and shared afterwards.
///
/// A failed load leaves the cell empty, so the next request tries again.
/// Replacing the file on disk takes effect after a restart.
#[derive(Clone)]
pub struct ModelCache {
    path: PathBuf,
    cell: Arc<OnceCell<Arc<RegressionModel>>>,
}

impl ModelCache {
    // ---
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub async fn get(&self) -> Result<Arc<RegressionModel>> {
        // ---
        self.cell
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let model = tokio::task::spawn_blocking(move || load_model(&path)).await??;
                info!("Loaded ML model from {}", self.path.display());
                Ok::<_, anyhow::Error>(Arc::new(model))
            })
            .await
            .cloned()
    }
}

#[derive(Clone)]
pub struct MlForecastSource {
    sensor: SensorSource,
    model: ModelCache,
    timeout: Duration,
}

impl MlForecastSource {
    // ---
    pub fn new(sensor: SensorSource, model_path: PathBuf, timeout: Duration) -> Self {
        Self {
            sensor,
            model: ModelCache::new(model_path),
            timeout,
        }
    }

    /// Seven model-derived days, or an empty list on any failure.
    ///
    /// A stale reading counts as no reading: predictions made from it would
    /// land on days that are already over.
    pub async fn forecast(&self) -> Vec<MlForecastEntry> {
        // ---
        let Some(latest) = self.sensor.latest().await else {
            debug!("No fresh reading available for ML forecast");
            return Vec::new();
        };

        let job = async {
            let model = self.model.get().await?;
            let forecast =
                tokio::task::spawn_blocking(move || predict_week(&model, &latest)).await?;
            Ok::<_, anyhow::Error>(forecast)
        };

        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(forecast)) => forecast,
            Ok(Err(e)) => {
                warn!("ML forecast unavailable: {:#}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("ML inference timed out after {:?}", self.timeout);
                Vec::new()
            }
        }
    }
}

fn load_model(path: &Path) -> Result<RegressionModel> {
    // ---
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read model at {}", path.display()))?;
    RegressionModel::from_json(&raw)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn latest() -> Reading {
        // ---
        Reading {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap(),
            temperature_c: 25.0,
            humidity_perc: 60.0,
            pressure_hpa: 1010.0,
            rainfall_mm: 0.5,
            status: "Dry".to_string(),
        }
    }

    fn linear_model() -> RegressionModel {
        // ---
        RegressionModel::from_json(
            r#"{
                "kind": "linear",
                "features": ["temperature_c", "dayofyear"],
                "intercept": 1.0,
                "coefficients": [1.0, 0.1]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_only_dayofyear_varies() {
        // ---
        let r = latest();
        assert_eq!(feature_value("dayofyear", &r, 1), 11.0);
        assert_eq!(feature_value("dayofyear", &r, 7), 17.0);
        assert_eq!(feature_value("humidity_perc", &r, 1), feature_value("humidity_perc", &r, 7));
        assert_eq!(feature_value("temp_roll_6", &r, 3), 25.0);
        assert_eq!(feature_value("hour_of_day", &r, 3), 14.0);
        assert_eq!(feature_value("pressure_diff_1", &r, 3), 0.0);
        assert_eq!(feature_value("mystery", &r, 3), 0.0);
    }

    #[test]
    fn test_predict_week_linear() {
        // ---
        let forecast = predict_week(&linear_model(), &latest());

        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].day, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(forecast[6].day, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());

        // 1 + 25 + 0.1 * 11
        assert!((forecast[0].temp_high_c - 27.1).abs() < 1e-9);
        assert!((forecast[0].temp_low_c - 24.1).abs() < 1e-9);
        assert!(forecast.iter().all(|d| d.rain_prob_perc.is_none()));
        assert!(forecast.iter().all(|d| d.condition == ML_CONDITION));
    }

    #[test]
    fn test_forest_averages_trees() {
        // ---
        let model = RegressionModel::from_json(
            r#"{
                "kind": "forest",
                "features": ["humidity_perc", "dayofyear"],
                "trees": [
                    { "feature": 0, "threshold": 50.0,
                      "left": { "value": 10.0 }, "right": { "value": 30.0 } },
                    { "feature": 1, "threshold": 12.5,
                      "left": { "value": 20.0 }, "right": { "value": 40.0 } }
                ]
            }"#,
        )
        .unwrap();
        let forecast = predict_week(&model, &latest());

        // humidity 60 -> 30; dayofyear 11, 12 -> 20 then 13.. -> 40
        assert_eq!(forecast[0].temp_high_c, 25.0);
        assert_eq!(forecast[1].temp_high_c, 25.0);
        assert_eq!(forecast[2].temp_high_c, 35.0);
    }

    #[test]
    fn test_invalid_models_are_rejected() {
        // ---
        assert!(RegressionModel::from_json("not json").is_err());
        assert!(RegressionModel::from_json(
            r#"{ "kind": "linear", "features": ["dayofyear"], "intercept": 0, "coefficients": [] }"#
        )
        .is_err());
        assert!(RegressionModel::from_json(
            r#"{ "kind": "forest", "features": ["dayofyear"],
                 "trees": [ { "feature": 3, "threshold": 1, "left": { "value": 1 }, "right": { "value": 2 } } ] }"#
        )
        .is_err());
    }

    fn temp_model_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, std::process::id()))
    }

    const LINEAR_JSON: &str = r#"{
        "kind": "linear",
        "features": ["temperature_c"],
        "intercept": 0.0,
        "coefficients": [1.0]
    }"#;

    #[tokio::test]
    async fn test_model_is_loaded_once() {
        // ---
        let path = temp_model_path("model-cache-once");
        std::fs::write(&path, LINEAR_JSON).unwrap();
        let cache = ModelCache::new(path.clone());

        let first = cache.get().await.unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = cache.clone().get().await.unwrap();

        // Served from memory after the file is gone
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.features().len(), 1);
        assert_eq!(second.features()[0], "temperature_c");
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        // ---
        let path = temp_model_path("model-cache-retry");
        let _ = std::fs::remove_file(&path);
        let cache = ModelCache::new(path.clone());

        assert!(cache.get().await.is_err());

        std::fs::write(&path, LINEAR_JSON).unwrap();
        let model = cache.get().await;
        std::fs::remove_file(&path).unwrap();
        assert!(model.is_ok());
    }

    #[test]
    fn test_missing_model_file_is_an_error() {
        // ---
        assert!(load_model(Path::new("/nonexistent/model.json")).is_err());
    }
}
