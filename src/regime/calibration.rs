//! Volatility threshold calibration.
//!
//! Bucket boundaries are the low/high quantiles of volatility inside the
//! calibration window and stay fixed for the whole series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CalibrationConfig;
use crate::data::FeatureRecord;

use super::error::{RegimeError, RegimeResult};

/// Calibrated volatility bucket boundaries. `low < high` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityThresholds {
    pub low: f64,
    pub high: f64,
    pub mid: f64,
}

impl VolatilityThresholds {
    /// Build thresholds, rejecting a degenerate (or inverted) pair.
    pub fn new(low: f64, high: f64) -> RegimeResult<Self> {
        if !(low.is_finite() && high.is_finite()) {
            return Err(RegimeError::Calibration(format!(
                "non-finite thresholds low={} high={}",
                low, high
            )));
        }
        if low >= high {
            return Err(RegimeError::Calibration(format!(
                "degenerate volatility distribution: low={} high={}",
                low, high
            )));
        }
        Ok(Self {
            low,
            high,
            mid: (low + high) / 2.0,
        })
    }

    /// Width of the medium bucket.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Inclusive date range used for calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalibrationWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Records falling inside the window. Assumes `series` is date-ordered.
    pub fn slice<'a>(&self, series: &'a [FeatureRecord]) -> &'a [FeatureRecord] {
        let first = series.partition_point(|r| r.date < self.start);
        let last = series.partition_point(|r| r.date <= self.end);
        &series[first..last.max(first)]
    }
}

/// Derive volatility thresholds from the calibration window of `series`.
pub fn calibrate(
    series: &[FeatureRecord],
    window: &CalibrationWindow,
    config: &CalibrationConfig,
) -> RegimeResult<VolatilityThresholds> {
    if window.start > window.end {
        return Err(RegimeError::InsufficientData(format!(
            "calibration window start {} is after end {}",
            window.start, window.end
        )));
    }

    let empty = || {
        RegimeError::InsufficientData(format!(
            "no observations in calibration window {}..={}",
            window.start, window.end
        ))
    };

    let mut vols: Vec<f64> = window.slice(series).iter().map(|r| r.volatility).collect();
    vols.sort_by(|a, b| a.total_cmp(b));

    let low = quantile_sorted(&vols, config.low_quantile).ok_or_else(empty)?;
    let high = quantile_sorted(&vols, config.high_quantile).ok_or_else(empty)?;
    let thresholds = VolatilityThresholds::new(low, high)?;

    info!(
        "Calibrated volatility thresholds on {} observations: low={:.4} high={:.4} mid={:.4}",
        vols.len(),
        thresholds.low,
        thresholds.high,
        thresholds.mid
    );

    Ok(thresholds)
}

/// Linear-interpolation quantile of an ascending slice, `None` when empty.
///
/// Position `(n - 1) * q`, interpolating between neighbouring order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let q = q.clamp(0.0, 1.0);
    let pos = last as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
