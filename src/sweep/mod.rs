//! Sensitivity sweep over smoothing and confirmation parameters.

pub mod sensitivity;

pub use sensitivity::{SensitivitySweep, SweepGrid, SweepParams, SweepPoint};
