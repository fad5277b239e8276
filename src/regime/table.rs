//! Classified output table.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calibration::VolatilityThresholds;
use super::states::{Regime, TrendState, VolState};
use super::stats::{episodes, regime_stats, RegimeEpisode, RegimeStats};

/// Features plus classification for a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRecord {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(rename = "return")]
    pub ret: f64,
    pub volatility: f64,
    pub moving_average: f64,
    pub trend_distance: f64,

    pub trend_state: TrendState,
    pub vol_state_raw: VolState,
    /// Majority-vote smoothed volatility state
    pub vol_state: VolState,
    pub regime_raw: Regime,
    /// Persistence-confirmed regime
    pub regime: Regime,

    pub confidence: f64,
    pub trend_score: f64,
    pub vol_score: f64,
    pub duration_score: f64,
}

/// Date-ordered result of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTable {
    thresholds: VolatilityThresholds,
    records: Vec<RegimeRecord>,
}

impl RegimeTable {
    pub(crate) fn new(thresholds: VolatilityThresholds, records: Vec<RegimeRecord>) -> Self {
        Self {
            thresholds,
            records,
        }
    }

    /// Thresholds calibrated for this run.
    pub fn thresholds(&self) -> &VolatilityThresholds {
        &self.thresholds
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[RegimeRecord] {
        &self.records
    }

    /// Number of classified dates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent classification.
    pub fn latest(&self) -> Option<&RegimeRecord> {
        self.records.last()
    }

    /// Last `n` records (fewer if the table is shorter).
    pub fn tail(&self, n: usize) -> &[RegimeRecord] {
        &self.records[self.records.len().saturating_sub(n)..]
    }

    /// Record for a given date.
    pub fn get(&self, date: NaiveDate) -> Option<&RegimeRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Number of confirmed regime changes.
    pub fn regime_changes(&self) -> usize {
        self.records
            .windows(2)
            .filter(|w| w[0].regime != w[1].regime)
            .count()
    }

    /// Maximal runs of a single confirmed regime.
    pub fn episodes(&self) -> Vec<RegimeEpisode> {
        episodes(&self.records)
    }

    /// Per-regime statistics over the confirmed labels.
    pub fn stats(&self) -> HashMap<Regime, RegimeStats> {
        regime_stats(&self.records)
    }

    /// Consume the table, keeping the records.
    pub fn into_records(self) -> Vec<RegimeRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegimeConfig;
    use crate::data::FeatureRecord;
    use crate::regime::RegimeClassifier;
    use chrono::Duration;

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
    }

    /// 40 daily records, the first 30 used for calibration.
    fn table() -> RegimeTable {
        let series: Vec<FeatureRecord> = (0..40)
            .map(|i| {
                let price = 100.0 + i as f64;
                FeatureRecord {
                    date: base_date() + Duration::days(i),
                    price,
                    ret: 0.01,
                    volatility: 0.1 + 0.01 * (i % 10) as f64,
                    moving_average: 110.0,
                    trend_distance: (price - 110.0) / 110.0,
                }
            })
            .collect();
        let config = RegimeConfig::with_calibration(base_date(), base_date() + Duration::days(29));
        RegimeClassifier::new(config)
            .unwrap()
            .classify(&series)
            .unwrap()
    }

    #[test]
    fn test_get_by_date() {
        let table = table();
        let day = base_date() + Duration::days(12);
        let record = table.get(day).unwrap();
        assert_eq!(record.date, day);
        assert_eq!(record.price, 112.0);

        assert!(table.get(base_date() - Duration::days(1)).is_none());
        assert!(table.get(base_date() + Duration::days(40)).is_none());
    }

    #[test]
    fn test_tail_and_latest() {
        let table = table();
        let last = base_date() + Duration::days(39);

        let tail = table.tail(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[2].date, last);
        assert_eq!(tail[0].date, last - Duration::days(2));

        assert_eq!(table.tail(100).len(), 40);
        assert!(table.tail(0).is_empty());

        assert_eq!(table.latest().unwrap().date, last);
    }

    #[test]
    fn test_into_records_keeps_order() {
        let table = table();
        let len = table.len();
        let records = table.into_records();
        assert_eq!(records.len(), len);
        assert!(records.windows(2).all(|w| w[0].date < w[1].date));
    }
}
