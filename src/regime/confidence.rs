//! Confidence scoring.
//!
//! Confidence blends three sub-scores, each clamped to `[0, 1]`:
//! - trend: distance from the moving average, saturating at `trend_saturation`
//! - volatility: closeness to the calibrated midpoint, zero at one bucket width away
//! - duration: run length of the confirmed regime, saturating at `duration_saturation`

use serde::{Deserialize, Serialize};

use crate::config::ConfidenceConfig;

use super::calibration::VolatilityThresholds;
use super::error::{RegimeError, RegimeResult};
use super::persistence::run_lengths;

/// Sub-scores and composite confidence for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub trend: f64,
    pub volatility: f64,
    pub duration: f64,
    pub composite: f64,
}

/// Scores regime confidence against fixed calibrated thresholds.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
    thresholds: VolatilityThresholds,
}

impl ConfidenceScorer {
    /// Create a new scorer.
    pub fn new(config: ConfidenceConfig, thresholds: VolatilityThresholds) -> Self {
        Self { config, thresholds }
    }

    /// Trend strength: absolute trend distance over the saturation point.
    pub fn trend_score(&self, trend_distance: f64) -> f64 {
        (trend_distance.abs() / self.config.trend_saturation).clamp(0.0, 1.0)
    }

    /// Volatility centrality: 1 at the midpoint, 0 one bucket width away.
    pub fn volatility_score(&self, volatility: f64) -> f64 {
        let t = &self.thresholds;
        (1.0 - (volatility - t.mid).abs() / t.width()).clamp(0.0, 1.0)
    }

    /// Regime duration: run length over the saturation point.
    pub fn duration_score(&self, run_length: usize) -> f64 {
        (run_length as f64 / self.config.duration_saturation as f64).clamp(0.0, 1.0)
    }

    /// Score a single date given the run length of its confirmed regime.
    pub fn score(&self, trend_distance: f64, volatility: f64, run_length: usize) -> ConfidenceScore {
        let trend = self.trend_score(trend_distance);
        let vol = self.volatility_score(volatility);
        let duration = self.duration_score(run_length);
        let c = &self.config;
        let composite =
            c.trend_weight * trend + c.volatility_weight * vol + c.duration_weight * duration;

        ConfidenceScore {
            trend,
            volatility: vol,
            duration,
            composite: composite.clamp(0.0, 1.0),
        }
    }

    /// Score a whole series. `regimes` is the confirmed regime sequence.
    pub fn score_series<R: PartialEq>(
        &self,
        trend_distances: &[f64],
        volatilities: &[f64],
        regimes: &[R],
    ) -> RegimeResult<Vec<ConfidenceScore>> {
        for (field, len) in [
            ("trend_distances", trend_distances.len()),
            ("volatilities", volatilities.len()),
        ] {
            if len != regimes.len() {
                return Err(RegimeError::LengthMismatch {
                    field,
                    expected: regimes.len(),
                    got: len,
                });
            }
        }

        Ok(run_lengths(regimes)
            .into_iter()
            .zip(trend_distances.iter().zip(volatilities))
            .map(|(run, (&td, &vol))| self.score(td, vol, run))
            .collect())
    }
}
