//! Closed label sets produced by the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A finite, ordered alphabet of categorical states.
///
/// `ALL` lists every member in index order; `index` must agree with it.
pub trait Categorical: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(&self) -> usize;
}

/// Price position relative to the long moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Up,
    Down,
    Neutral,
}

impl TrendState {
    /// Label as written to output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl Categorical for TrendState {
    const ALL: &'static [Self] = &[Self::Up, Self::Down, Self::Neutral];

    fn index(&self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Neutral => 2,
        }
    }
}

/// Volatility bucket. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolState {
    Low,
    Medium,
    High,
}

impl VolState {
    /// Label as written to output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl Categorical for VolState {
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];

    fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Market regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    /// Uptrend, calm volatility.
    RiskOn,
    /// Uptrend, elevated volatility.
    RiskOnFragile,
    /// Downtrend, high volatility.
    RiskOff,
    /// Downtrend, volatility not (yet) high.
    RiskOffTransition,
    /// Everything else: uptrend with high volatility, or no trend.
    Transition,
}

impl Regime {
    /// Label as written to output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskOn => "RISK_ON",
            Self::RiskOnFragile => "RISK_ON_FRAGILE",
            Self::RiskOff => "RISK_OFF",
            Self::RiskOffTransition => "RISK_OFF_TRANSITION",
            Self::Transition => "TRANSITION",
        }
    }

    /// Description of the regime.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RiskOn => "Uptrend with low volatility",
            Self::RiskOnFragile => "Uptrend with medium volatility",
            Self::RiskOff => "Downtrend with high volatility",
            Self::RiskOffTransition => "Downtrend, volatility not yet high",
            Self::Transition => "No clear trend or uptrend under stress",
        }
    }
}

impl Categorical for Regime {
    const ALL: &'static [Self] = &[
        Self::RiskOn,
        Self::RiskOnFragile,
        Self::RiskOff,
        Self::RiskOffTransition,
        Self::Transition,
    ];

    fn index(&self) -> usize {
        match self {
            Self::RiskOn => 0,
            Self::RiskOnFragile => 1,
            Self::RiskOff => 2,
            Self::RiskOffTransition => 3,
            Self::Transition => 4,
        }
    }
}

macro_rules! impl_display {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(TrendState, VolState, Regime);
