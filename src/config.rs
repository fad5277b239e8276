//! Classification configuration.
//!
//! Every policy constant of the pipeline lives here with its default, so a
//! run is fully described by a [`RegimeConfig`]. Configs round-trip through
//! TOML files.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::regime::{CalibrationWindow, RegimeError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] RegimeError),
}

/// Quantiles used to derive the volatility buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Quantile giving the LOW/MEDIUM boundary.
    pub low_quantile: f64,
    /// Quantile giving the MEDIUM/HIGH boundary.
    pub high_quantile: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            low_quantile: 0.33,
            high_quantile: 0.66,
        }
    }
}

/// Weights and saturation points of the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Weight of the trend-strength sub-score.
    pub trend_weight: f64,
    /// Weight of the volatility-centrality sub-score.
    pub volatility_weight: f64,
    /// Weight of the regime-duration sub-score.
    pub duration_weight: f64,
    /// Absolute trend distance at which trend strength saturates (5%).
    pub trend_saturation: f64,
    /// Confirmed-regime run length at which duration saturates (days).
    pub duration_saturation: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            trend_weight: 0.4,
            volatility_weight: 0.3,
            duration_weight: 0.3,
            trend_saturation: 0.05,
            duration_saturation: 20,
        }
    }
}

/// Full configuration of a classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// First date of the calibration window (inclusive).
    pub calibration_start: NaiveDate,
    /// Last date of the calibration window (inclusive).
    pub calibration_end: NaiveDate,
    /// Majority-vote window for volatility states.
    pub smoothing_window: usize,
    /// Consecutive raw observations needed to confirm a regime change.
    pub min_days: usize,
    pub calibration: CalibrationConfig,
    pub confidence: ConfidenceConfig,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            calibration_start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            calibration_end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default(),
            smoothing_window: 5,
            min_days: 3,
            calibration: CalibrationConfig::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl RegimeConfig {
    /// Default config with a different calibration window.
    pub fn with_calibration(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            calibration_start: start,
            calibration_end: end,
            ..Self::default()
        }
    }

    pub fn calibration_window(&self) -> CalibrationWindow {
        CalibrationWindow::new(self.calibration_start, self.calibration_end)
    }

    /// Check every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), RegimeError> {
        let invalid = |msg: String| Err(RegimeError::InvalidConfiguration(msg));

        if self.smoothing_window == 0 {
            return invalid("smoothing_window must be at least 1".to_string());
        }
        if self.min_days == 0 {
            return invalid("min_days must be at least 1".to_string());
        }
        if self.calibration_start > self.calibration_end {
            return invalid(format!(
                "calibration_start {} is after calibration_end {}",
                self.calibration_start, self.calibration_end
            ));
        }

        let q = &self.calibration;
        if !(0.0..=1.0).contains(&q.low_quantile)
            || !(0.0..=1.0).contains(&q.high_quantile)
            || q.low_quantile >= q.high_quantile
        {
            return invalid(format!(
                "quantiles must satisfy 0 <= low < high <= 1, got {} and {}",
                q.low_quantile, q.high_quantile
            ));
        }

        let c = &self.confidence;
        let weights = [c.trend_weight, c.volatility_weight, c.duration_weight];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return invalid(format!("confidence weights must lie in [0, 1], got {:?}", weights));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return invalid(format!("confidence weights must sum to 1, got {}", total));
        }
        if !(c.trend_saturation > 0.0 && c.trend_saturation.is_finite()) {
            return invalid(format!(
                "trend_saturation must be positive, got {}",
                c.trend_saturation
            ));
        }
        if c.duration_saturation == 0 {
            return invalid("duration_saturation must be at least 1".to_string());
        }

        Ok(())
    }

    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: RegimeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
