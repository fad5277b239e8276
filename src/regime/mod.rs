//! Market regime classification module.
//!
//! Labels each trading day with a trend x volatility regime:
//! - Risk On: price above its moving average, low volatility
//! - Risk On Fragile: price above its moving average, medium volatility
//! - Risk Off: price below its moving average, high volatility
//! - Risk Off Transition: price below its moving average, volatility not high
//! - Transition: anything else
//!
//! Volatility buckets come from quantiles over a calibration window; the
//! volatility state is smoothed by majority vote and the regime is confirmed
//! only after it persists for `min_days`.

pub mod calibration;
pub mod classifier;
pub mod confidence;
pub mod error;
pub mod persistence;
pub mod smoothing;
pub mod states;
pub mod stats;
pub mod table;

pub use calibration::{calibrate, quantile_sorted, CalibrationWindow, VolatilityThresholds};
pub use classifier::{combine, trend_state, vol_state, RegimeClassifier};
pub use confidence::{ConfidenceScore, ConfidenceScorer};
pub use error::{RegimeError, RegimeResult};
pub use persistence::{confirm_persistence, run_lengths};
pub use smoothing::majority_smooth;
pub use states::{Categorical, Regime, TrendState, VolState};
pub use stats::{RegimeEpisode, RegimeStats};
pub use table::{RegimeRecord, RegimeTable};
