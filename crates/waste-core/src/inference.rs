//! Single-point volume inference.
//!
//! The trained sequence model and its two fitted scalers are external
//! collaborators. They sit behind the [`SequenceModel`] and [`Scaler`]
//! traits; [`LinearModel`] and [`MinMaxScaler`] are JSON-backed
//! implementations so a parameter export can be evaluated without the
//! training stack.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DashboardError, Result};

// ── Features ──────────────────────────────────────────────────────────────────

/// Inputs of one inference step, in model column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Monday = 0 … Sunday = 6.
    pub day_of_week: u32,
    pub month: u32,
    pub day_of_year: u32,
    pub is_holiday: bool,
    pub trend_value: f64,
}

impl FeatureVector {
    /// Derive the calendar features from `date`.
    pub fn from_date(date: NaiveDate, is_holiday: bool, trend_value: f64) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            month: date.month(),
            day_of_year: date.ordinal(),
            is_holiday,
            trend_value,
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            f64::from(self.day_of_week),
            f64::from(self.month),
            f64::from(self.day_of_year),
            if self.is_holiday { 1.0 } else { 0.0 },
            self.trend_value,
        ]
    }
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// A fitted feature or target transform.
pub trait Scaler {
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>>;
    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>>;
}

/// A trained model evaluated for exactly one step.
pub trait SequenceModel {
    /// Predict the scaled target from one scaled feature row.
    fn predict_step(&self, features: &[f64]) -> Result<f64>;
}

// ── MinMaxScaler ──────────────────────────────────────────────────────────────

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Per-column min-max scaling into `feature_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

impl MinMaxScaler {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let scaler: Self = load_json(path)?;
        if scaler.data_min.len() != scaler.data_max.len() {
            return Err(DashboardError::LengthMismatch {
                left: scaler.data_min.len(),
                right: scaler.data_max.len(),
            });
        }
        Ok(scaler)
    }

    /// Multiplier for column `i`; a constant column scales by 1.
    fn scale(&self, i: usize) -> f64 {
        let span = self.data_max[i] - self.data_min[i];
        let (lo, hi) = self.feature_range;
        if span == 0.0 {
            1.0
        } else {
            (hi - lo) / span
        }
    }

    fn check_width(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.data_min.len() {
            return Err(DashboardError::Inference(format!(
                "scaler expects {} columns, got {}",
                self.data_min.len(),
                values.len()
            )));
        }
        Ok(())
    }
}

impl Scaler for MinMaxScaler {
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values)?;
        let lo = self.feature_range.0;
        Ok(values
            .iter()
            .enumerate()
            .map(|(i, v)| (v - self.data_min[i]) * self.scale(i) + lo)
            .collect())
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values)?;
        let lo = self.feature_range.0;
        Ok(values
            .iter()
            .enumerate()
            .map(|(i, v)| (v - lo) / self.scale(i) + self.data_min[i])
            .collect())
    }
}

// ── LinearModel ───────────────────────────────────────────────────────────────

/// Single dense output layer: `weights · x + bias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl LinearModel {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

impl SequenceModel for LinearModel {
    fn predict_step(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(DashboardError::Inference(format!(
                "model expects {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        Ok(self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias)
    }
}

// ── Forecaster ────────────────────────────────────────────────────────────────

/// Scale → model → inverse-scale, for a single feature row.
pub struct Forecaster<M, F, T> {
    model: M,
    feature_scaler: F,
    target_scaler: T,
}

impl<M, F, T> Forecaster<M, F, T>
where
    M: SequenceModel,
    F: Scaler,
    T: Scaler,
{
    pub fn new(model: M, feature_scaler: F, target_scaler: T) -> Self {
        Self {
            model,
            feature_scaler,
            target_scaler,
        }
    }

    /// Estimate the daily waste volume for one set of features.
    pub fn predict_one(&self, features: &FeatureVector) -> Result<f64> {
        let scaled = self.feature_scaler.transform(&features.to_array())?;
        let raw = self.model.predict_step(&scaled)?;
        let estimate = self
            .target_scaler
            .inverse_transform(&[raw])?
            .first()
            .copied()
            .ok_or_else(|| DashboardError::Inference("target scaler returned no value".into()))?;
        debug!(?features, raw, estimate, "single-step inference");
        Ok(estimate)
    }
}

impl Forecaster<LinearModel, MinMaxScaler, MinMaxScaler> {
    /// Load a JSON model export and its two scalers.
    pub fn from_files(model: &Path, feature_scaler: &Path, target_scaler: &Path) -> Result<Self> {
        Ok(Self::new(
            LinearModel::from_json_file(model)?,
            MinMaxScaler::from_json_file(feature_scaler)?,
            MinMaxScaler::from_json_file(target_scaler)?,
        ))
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
