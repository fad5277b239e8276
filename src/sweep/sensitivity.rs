//! Parameter sensitivity sweep.
//!
//! Runs the full classification for every (smoothing window, min days) pair
//! of a grid and summarizes how the labels react. Runs are independent and
//! execute in parallel; each single run stays sequential over the series.
//! Nothing is ranked or selected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RegimeConfig;
use crate::data::FeatureRecord;
use crate::regime::{Regime, RegimeClassifier, RegimeResult, RegimeTable};

/// Parameter values to sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepGrid {
    /// Majority-vote window values.
    pub smoothing_windows: Vec<usize>,
    /// Confirmation length values.
    pub min_days: Vec<usize>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            smoothing_windows: vec![1, 3, 5, 10],
            min_days: vec![1, 3, 5],
        }
    }
}

impl SweepGrid {
    /// Calculate total number of parameter combinations.
    pub fn total_combinations(&self) -> usize {
        self.smoothing_windows.len() * self.min_days.len()
    }

    /// All combinations, smoothing window major.
    pub fn combinations(&self) -> Vec<SweepParams> {
        let mut combos = Vec::with_capacity(self.total_combinations());
        for &smoothing_window in &self.smoothing_windows {
            for &min_days in &self.min_days {
                combos.push(SweepParams {
                    smoothing_window,
                    min_days,
                });
            }
        }
        combos
    }
}

/// A single parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepParams {
    pub smoothing_window: usize,
    pub min_days: usize,
}

impl SweepParams {
    /// Apply this parameter set to a classifier config.
    pub fn apply_to_config(&self, config: &mut RegimeConfig) {
        config.smoothing_window = self.smoothing_window;
        config.min_days = self.min_days;
    }

    pub fn key(&self) -> String {
        format!("w{}_d{}", self.smoothing_window, self.min_days)
    }
}

/// Summary of one classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub params: SweepParams,
    pub regime_changes: usize,
    pub avg_confidence: f64,
    pub avg_episode_days: f64,
    pub regime_days: HashMap<Regime, usize>,
}

impl SweepPoint {
    fn from_table(params: SweepParams, table: &RegimeTable) -> Self {
        let records = table.records();
        let episodes = table.episodes();

        let mut regime_days: HashMap<Regime, usize> = HashMap::new();
        for record in records {
            *regime_days.entry(record.regime).or_insert(0) += 1;
        }

        let avg_confidence = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.confidence).sum::<f64>() / records.len() as f64
        };
        let avg_episode_days = if episodes.is_empty() {
            0.0
        } else {
            records.len() as f64 / episodes.len() as f64
        };

        Self {
            params,
            regime_changes: table.regime_changes(),
            avg_confidence,
            avg_episode_days,
            regime_days,
        }
    }
}

/// Sensitivity sweep over a base configuration.
pub struct SensitivitySweep {
    base_config: RegimeConfig,
    grid: SweepGrid,
}

impl SensitivitySweep {
    pub fn new(base_config: RegimeConfig) -> Self {
        Self {
            base_config,
            grid: SweepGrid::default(),
        }
    }

    /// Set parameter grid.
    pub fn with_grid(mut self, grid: SweepGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    /// Run every combination. Results follow grid order.
    pub fn run(&self, series: &[FeatureRecord]) -> RegimeResult<Vec<SweepPoint>> {
        self.run_with_progress(series, || {})
    }

    /// Run every combination, calling `on_done` after each finished run.
    pub fn run_with_progress<F>(&self, series: &[FeatureRecord], on_done: F) -> RegimeResult<Vec<SweepPoint>>
    where
        F: Fn() + Sync,
    {
        let combos = self.grid.combinations();
        let total = combos.len();
        info!("Sweeping {} parameter combinations over {} records", total, series.len());

        let progress = AtomicUsize::new(0);

        let points = combos
            .par_iter()
            .map(|params| {
                let mut config = self.base_config.clone();
                params.apply_to_config(&mut config);

                let table = RegimeClassifier::new(config)?.classify(series)?;
                let point = SweepPoint::from_table(*params, &table);

                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if done % (total / 10).max(1) == 0 || done == total {
                    info!(
                        "  {:.0}% ({}/{} combinations)",
                        done as f64 / total as f64 * 100.0,
                        done,
                        total
                    );
                }
                on_done();

                Ok(point)
            })
            .collect::<RegimeResult<Vec<_>>>()?;

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::RegimeError;
    use chrono::{Duration, NaiveDate};

    /// Volatility oscillates so labels flip often without smoothing.
    fn series() -> Vec<FeatureRecord> {
        let base = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        (0..300)
            .map(|i| {
                let price = 100.0 + (i as f64 / 7.0).sin() * 5.0;
                let volatility = 0.15 + 0.08 * ((i * 7919) % 13) as f64 / 13.0;
                FeatureRecord {
                    date: base + Duration::days(i),
                    price,
                    ret: 0.0,
                    volatility,
                    moving_average: 100.0,
                    trend_distance: (price - 100.0) / 100.0,
                }
            })
            .collect()
    }

    fn base_config() -> RegimeConfig {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        RegimeConfig::with_calibration(start, start + Duration::days(199))
    }

    #[test]
    fn test_default_grid() {
        let grid = SweepGrid::default();
        assert_eq!(grid.total_combinations(), 12);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 12);
        assert_eq!(combos[0], SweepParams { smoothing_window: 1, min_days: 1 });
        assert_eq!(combos[1].key(), "w1_d3");
    }

    #[test]
    fn test_apply_to_config() {
        let mut config = RegimeConfig::default();
        SweepParams { smoothing_window: 9, min_days: 4 }.apply_to_config(&mut config);
        assert_eq!(config.smoothing_window, 9);
        assert_eq!(config.min_days, 4);
    }

    #[test]
    fn test_sweep_results_follow_grid_order() {
        let sweep = SensitivitySweep::new(base_config());
        let points = sweep.run(&series()).unwrap();
        let params: Vec<SweepParams> = points.iter().map(|p| p.params).collect();
        assert_eq!(params, sweep.grid().combinations());

        for p in &points {
            assert_eq!(p.regime_days.values().sum::<usize>(), 300);
            assert!((0.0..=1.0).contains(&p.avg_confidence));
        }
    }

    #[test]
    fn test_more_persistence_fewer_changes() {
        let grid = SweepGrid {
            smoothing_windows: vec![1],
            min_days: vec![1, 10],
        };
        let points = SensitivitySweep::new(base_config())
            .with_grid(grid)
            .run(&series())
            .unwrap();
        assert!(points[1].regime_changes <= points[0].regime_changes);
        assert!(points[1].avg_episode_days >= points[0].avg_episode_days);
    }

    #[test]
    fn test_progress_callback_counts_runs() {
        let calls = AtomicUsize::new(0);
        let grid = SweepGrid {
            smoothing_windows: vec![3, 5],
            min_days: vec![2, 3],
        };
        SensitivitySweep::new(base_config())
            .with_grid(grid)
            .run_with_progress(&series(), || {
                calls.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_invalid_grid_value_fails() {
        let grid = SweepGrid {
            smoothing_windows: vec![0],
            min_days: vec![3],
        };
        let err = SensitivitySweep::new(base_config())
            .with_grid(grid)
            .run(&series())
            .unwrap_err();
        assert!(matches!(err, RegimeError::InvalidConfiguration(_)));
    }
}
