pub mod config;
pub mod data;
pub mod regime;
pub mod sweep;
pub mod validation;

// Re-export commonly used types
pub use config::{CalibrationConfig, ConfidenceConfig, ConfigError, RegimeConfig};
pub use data::{FeatureBuilder, FeatureRecord, PriceLoader, PricePoint};
pub use regime::{
    Regime, RegimeClassifier, RegimeError, RegimeRecord, RegimeStats, RegimeTable, TrendState,
    VolState, VolatilityThresholds,
};
pub use sweep::{SensitivitySweep, SweepGrid, SweepPoint};
pub use validation::{PriceSeriesValidator, SeriesIntegrityReport, ValidationError};
