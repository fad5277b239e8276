//! Regime statistics and episodes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::states::Regime;
use super::table::RegimeRecord;

/// Statistics for a regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    pub regime: Regime,
    pub days: usize,
    pub pct_of_total: f64,
    pub avg_volatility: f64,
    pub avg_return: f64,
    pub avg_confidence: f64,
    pub episodes: usize,
}

impl RegimeStats {
    fn empty(regime: Regime) -> Self {
        Self {
            regime,
            days: 0,
            pct_of_total: 0.0,
            avg_volatility: 0.0,
            avg_return: 0.0,
            avg_confidence: 0.0,
            episodes: 0,
        }
    }
}

/// A maximal run of one confirmed regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeEpisode {
    pub regime: Regime,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Trading days in the episode.
    pub days: usize,
}

pub(crate) fn episodes(records: &[RegimeRecord]) -> Vec<RegimeEpisode> {
    let mut out: Vec<RegimeEpisode> = Vec::new();

    for record in records {
        match out.last_mut() {
            Some(ep) if ep.regime == record.regime => {
                ep.end = record.date;
                ep.days += 1;
            }
            _ => out.push(RegimeEpisode {
                regime: record.regime,
                start: record.date,
                end: record.date,
                days: 1,
            }),
        }
    }

    out
}

pub(crate) fn regime_stats(records: &[RegimeRecord]) -> HashMap<Regime, RegimeStats> {
    let mut stats: HashMap<Regime, RegimeStats> = HashMap::new();
    let total_days = records.len();

    for record in records {
        let entry = stats
            .entry(record.regime)
            .or_insert_with(|| RegimeStats::empty(record.regime));
        entry.days += 1;
        entry.avg_volatility += record.volatility;
        entry.avg_return += record.ret;
        entry.avg_confidence += record.confidence;
    }

    for ep in episodes(records) {
        if let Some(entry) = stats.get_mut(&ep.regime) {
            entry.episodes += 1;
        }
    }

    // Sums to means
    for entry in stats.values_mut() {
        let days = entry.days as f64;
        entry.pct_of_total = days / total_days as f64 * 100.0;
        entry.avg_volatility /= days;
        entry.avg_return /= days;
        entry.avg_confidence /= days;
    }

    stats
}
