//! Market regime classifier.
//!
//! Combines a trend state (price versus its long moving average) with a
//! smoothed volatility bucket into a regime label, confirms the label
//! against short-lived flips, and scores confidence.
//!
//! Data flows one way:
//! calibrate -> classify states -> smooth volatility -> combine -> confirm -> score.

use tracing::{debug, info};

use crate::config::RegimeConfig;
use crate::data::FeatureRecord;

use super::calibration::{calibrate, VolatilityThresholds};
use super::confidence::ConfidenceScorer;
use super::error::{RegimeError, RegimeResult};
use super::persistence::confirm_persistence;
use super::smoothing::majority_smooth;
use super::states::{Regime, TrendState, VolState};
use super::table::{RegimeRecord, RegimeTable};

/// Trend direction from price versus moving average.
pub fn trend_state(price: f64, moving_average: f64) -> TrendState {
    if price > moving_average {
        TrendState::Up
    } else if price < moving_average {
        TrendState::Down
    } else {
        TrendState::Neutral
    }
}

/// Volatility bucket: `(-inf, low]` LOW, `(low, high]` MEDIUM, `(high, inf)` HIGH.
pub fn vol_state(volatility: f64, thresholds: &VolatilityThresholds) -> VolState {
    if volatility <= thresholds.low {
        VolState::Low
    } else if volatility <= thresholds.high {
        VolState::Medium
    } else {
        VolState::High
    }
}

/// Map trend and (smoothed) volatility to a raw regime. First match wins.
pub fn combine(trend: TrendState, vol: VolState) -> Regime {
    match (trend, vol) {
        (TrendState::Up, VolState::Low) => Regime::RiskOn,
        (TrendState::Up, VolState::Medium) => Regime::RiskOnFragile,
        (TrendState::Down, VolState::High) => Regime::RiskOff,
        (TrendState::Down, _) => Regime::RiskOffTransition,
        _ => Regime::Transition,
    }
}

/// Whole-series regime classifier.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    /// Create a classifier, rejecting an invalid configuration.
    pub fn new(config: RegimeConfig) -> RegimeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration this classifier runs with.
    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// Derive volatility thresholds from the calibration window.
    pub fn calibrate(&self, series: &[FeatureRecord]) -> RegimeResult<VolatilityThresholds> {
        check_series(series)?;
        calibrate(
            series,
            &self.config.calibration_window(),
            &self.config.calibration,
        )
    }

    /// Classify every record of a date-ordered feature series.
    pub fn classify(&self, series: &[FeatureRecord]) -> RegimeResult<RegimeTable> {
        check_series(series)?;

        let window = self.config.calibration_window();
        let post_calibration = series.iter().filter(|r| r.date > window.end).count();
        if post_calibration == 0 {
            return Err(RegimeError::InsufficientData(format!(
                "no observations after calibration end {} (series ends {})",
                window.end,
                series[series.len() - 1].date
            )));
        }

        let thresholds = calibrate(series, &window, &self.config.calibration)?;

        let trend: Vec<TrendState> = series
            .iter()
            .map(|r| trend_state(r.price, r.moving_average))
            .collect();
        let vol_raw: Vec<VolState> = series
            .iter()
            .map(|r| vol_state(r.volatility, &thresholds))
            .collect();

        let vol = majority_smooth(&vol_raw, self.config.smoothing_window)?;
        let regime_raw: Vec<Regime> = trend
            .iter()
            .zip(&vol)
            .map(|(&t, &v)| combine(t, v))
            .collect();
        let regime = confirm_persistence(&regime_raw, self.config.min_days)?;

        debug!(
            "Smoothed {} volatility states (window {}), {} raw vs {} confirmed regime changes",
            vol.len(),
            self.config.smoothing_window,
            count_changes(&regime_raw),
            count_changes(&regime)
        );

        let scorer = ConfidenceScorer::new(self.config.confidence.clone(), thresholds);
        let trend_distances: Vec<f64> = series.iter().map(|r| r.trend_distance).collect();
        let volatilities: Vec<f64> = series.iter().map(|r| r.volatility).collect();
        let scores = scorer.score_series(&trend_distances, &volatilities, &regime)?;

        let records: Vec<RegimeRecord> = series
            .iter()
            .enumerate()
            .map(|(i, r)| RegimeRecord {
                date: r.date,
                price: r.price,
                ret: r.ret,
                volatility: r.volatility,
                moving_average: r.moving_average,
                trend_distance: r.trend_distance,
                trend_state: trend[i],
                vol_state_raw: vol_raw[i],
                vol_state: vol[i],
                regime_raw: regime_raw[i],
                regime: regime[i],
                confidence: scores[i].composite,
                trend_score: scores[i].trend,
                vol_score: scores[i].volatility,
                duration_score: scores[i].duration,
            })
            .collect();

        info!(
            "Classified {} records from {} to {}",
            records.len(),
            series[0].date,
            series[series.len() - 1].date
        );

        Ok(RegimeTable::new(thresholds, records))
    }
}

/// Reject empty, unordered, or non-finite input.
fn check_series(series: &[FeatureRecord]) -> RegimeResult<()> {
    if series.is_empty() {
        return Err(RegimeError::InsufficientData(
            "feature series is empty".to_string(),
        ));
    }

    for (index, record) in series.iter().enumerate() {
        if let Some(field) = record.non_finite_field() {
            return Err(RegimeError::InvalidFeature {
                date: record.date,
                field,
            });
        }
        if index > 0 && record.date <= series[index - 1].date {
            return Err(RegimeError::Unordered {
                index,
                date: record.date,
            });
        }
    }

    Ok(())
}

fn count_changes<T: PartialEq>(values: &[T]) -> usize {
    values.windows(2).filter(|w| w[0] != w[1]).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::states::Categorical;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn record(i: usize, price: f64, ma: f64, vol: f64) -> FeatureRecord {
        FeatureRecord {
            date: base_date() + Duration::days(i as i64),
            price,
            ret: 0.001,
            volatility: vol,
            moving_average: ma,
            trend_distance: (price - ma) / ma,
        }
    }

    /// 100-day downtrend with volatility spread over 0.10..0.30, followed by
    /// a 60-day steady rise with low volatility.
    fn scenario() -> Vec<FeatureRecord> {
        let mut series: Vec<FeatureRecord> = (0..100)
            .map(|i| record(i, 100.0, 105.0, 0.10 + 0.002 * i as f64))
            .collect();
        for j in 0..60 {
            let price = 110.0 + j as f64;
            let ma = 100.0 + 0.5 * j as f64;
            series.push(record(100 + j, price, ma, 0.16));
        }
        series
    }

    fn scenario_config() -> RegimeConfig {
        RegimeConfig::with_calibration(base_date(), base_date() + Duration::days(99))
    }

    #[test]
    fn test_trend_state() {
        assert_eq!(trend_state(101.0, 100.0), TrendState::Up);
        assert_eq!(trend_state(99.0, 100.0), TrendState::Down);
        assert_eq!(trend_state(100.0, 100.0), TrendState::Neutral);
    }

    #[test]
    fn test_vol_state_boundaries() {
        let t = VolatilityThresholds::new(0.15, 0.25).unwrap();
        assert_eq!(vol_state(0.10, &t), VolState::Low);
        assert_eq!(vol_state(0.15, &t), VolState::Low);
        assert_eq!(vol_state(0.20, &t), VolState::Medium);
        assert_eq!(vol_state(0.25, &t), VolState::Medium);
        assert_eq!(vol_state(0.30, &t), VolState::High);
        assert_eq!(vol_state(0.0, &t), VolState::Low);
    }

    #[test]
    fn test_calibrated_thresholds_bucket_edges() {
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        let t = classifier.calibrate(&scenario()).unwrap();

        // Same calibration segment, then volatility exactly on each edge
        let mut series: Vec<FeatureRecord> = scenario().into_iter().take(100).collect();
        let edges = [t.low, t.high, t.high + 1e-9];
        for (j, &vol) in edges.iter().enumerate() {
            series.push(record(100 + j, 110.0, 100.0, vol));
        }

        let table = classifier.classify(&series).unwrap();
        assert_eq!(table.thresholds(), &t);

        let tail = table.tail(3);
        assert_eq!(tail[0].vol_state_raw, VolState::Low);
        assert_eq!(tail[1].vol_state_raw, VolState::Medium);
        assert_eq!(tail[2].vol_state_raw, VolState::High);
    }

    #[test]
    fn test_combine_precedence() {
        use Regime::*;
        use TrendState::*;
        use VolState::*;

        assert_eq!(combine(Up, Low), RiskOn);
        assert_eq!(combine(Up, Medium), RiskOnFragile);
        assert_eq!(combine(Up, High), Transition);
        assert_eq!(combine(Down, High), RiskOff);
        assert_eq!(combine(Down, Medium), RiskOffTransition);
        assert_eq!(combine(Down, Low), RiskOffTransition);
        assert_eq!(combine(Neutral, Low), Transition);
        assert_eq!(combine(Neutral, Medium), Transition);
        assert_eq!(combine(Neutral, High), Transition);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RegimeConfig::default();
        config.min_days = 0;
        assert!(matches!(
            RegimeClassifier::new(config),
            Err(RegimeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_series_rejected() {
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        assert!(matches!(
            classifier.classify(&[]),
            Err(RegimeError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_series_ending_in_calibration_rejected() {
        let series = scenario();
        let config = RegimeConfig::with_calibration(base_date(), base_date() + Duration::days(500));
        let classifier = RegimeClassifier::new(config).unwrap();
        assert!(matches!(
            classifier.classify(&series),
            Err(RegimeError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_calibration_window_outside_series_rejected() {
        let series = scenario();
        let config = RegimeConfig::with_calibration(
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2000, 12, 31).unwrap(),
        );
        let classifier = RegimeClassifier::new(config).unwrap();
        assert!(matches!(
            classifier.classify(&series),
            Err(RegimeError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_degenerate_calibration_rejected() {
        let series: Vec<FeatureRecord> = (0..50).map(|i| record(i, 101.0, 100.0, 0.2)).collect();
        let config = RegimeConfig::with_calibration(base_date(), base_date() + Duration::days(30));
        let classifier = RegimeClassifier::new(config).unwrap();
        assert!(matches!(
            classifier.classify(&series),
            Err(RegimeError::Calibration(_))
        ));
    }

    #[test]
    fn test_unordered_series_rejected() {
        let mut series = scenario();
        series.swap(10, 11);
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        assert!(matches!(
            classifier.classify(&series),
            Err(RegimeError::Unordered { index: 11, .. })
        ));
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let mut series = scenario();
        series[120].volatility = f64::NAN;
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        assert!(matches!(
            classifier.classify(&series),
            Err(RegimeError::InvalidFeature { field: "volatility", .. })
        ));
    }

    #[test]
    fn test_rising_low_vol_scenario() {
        let series = scenario();
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        let table = classifier.classify(&series).unwrap();
        assert_eq!(table.len(), series.len());

        let t = table.thresholds();
        assert!(0.16 <= t.low && t.low < t.high);

        let rising = &table.records()[100..];
        assert!(rising.iter().all(|r| r.trend_state == TrendState::Up));
        assert!(rising.iter().all(|r| r.vol_state_raw == VolState::Low));

        // Smoothing needs three LOW votes out of five to overturn the HIGH tail
        assert_eq!(rising[0].vol_state, VolState::High);
        assert_eq!(rising[1].vol_state, VolState::High);
        assert!(rising[2..].iter().all(|r| r.vol_state == VolState::Low));

        assert_eq!(rising[0].regime_raw, Regime::Transition);
        assert!(rising[2..].iter().all(|r| r.regime_raw == Regime::RiskOn));

        // The two TRANSITION days never confirm; RISK_ON confirms on its third day
        assert!(rising[..4].iter().all(|r| r.regime == Regime::RiskOff));
        assert!(rising[4..].iter().all(|r| r.regime == Regime::RiskOn));

        // Confidence grows with duration, then levels off
        let conf: Vec<f64> = rising[4..].iter().map(|r| r.confidence).collect();
        assert!(conf.windows(2).all(|w| w[1] >= w[0]));
        assert!(conf[conf.len() - 1] > conf[0]);
        assert_relative_eq!(rising[59].duration_score, 1.0);
        assert_relative_eq!(rising[59].trend_score, 1.0);
        assert_relative_eq!(
            rising[59].confidence,
            0.4 + 0.3 * rising[59].vol_score + 0.3,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_confidence_bounds_and_closed_labels() {
        let series = scenario();
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        let table = classifier.classify(&series).unwrap();
        for r in table.records() {
            assert!((0.0..=1.0).contains(&r.confidence));
            assert!(TrendState::ALL.contains(&r.trend_state));
            assert!(VolState::ALL.contains(&r.vol_state_raw));
            assert!(VolState::ALL.contains(&r.vol_state));
            assert!(Regime::ALL.contains(&r.regime_raw));
            assert!(Regime::ALL.contains(&r.regime));
        }
    }

    #[test]
    fn test_deterministic() {
        let series = scenario();
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        let a = classifier.classify(&series).unwrap();
        let b = classifier.classify(&series).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_no_look_ahead() {
        let series = scenario();
        let classifier = RegimeClassifier::new(scenario_config()).unwrap();
        let full = classifier.classify(&series).unwrap();

        for n in [101, 102, 105, 110, 130, 159] {
            let prefix = classifier.classify(&series[..n]).unwrap();
            assert_eq!(prefix.records(), &full.records()[..n]);
        }
    }

    #[test]
    fn test_smoothing_window_one_skips_smoothing() {
        let series = scenario();
        let mut config = scenario_config();
        config.smoothing_window = 1;
        let table = RegimeClassifier::new(config)
            .unwrap()
            .classify(&series)
            .unwrap();
        assert!(table
            .records()
            .iter()
            .all(|r| r.vol_state == r.vol_state_raw));
    }
}
