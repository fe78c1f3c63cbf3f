use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    #[default]
    Neutral,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Uptrend => write!(f, "uptrend"),
            TrendDirection::Downtrend => write!(f, "downtrend"),
            TrendDirection::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutKind {
    BreakoutUp,
    BreakoutDown,
}

/// Price stretched beyond the breakout threshold away from the window SMA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakout {
    #[serde(rename = "type")]
    pub kind: BreakoutKind,
    /// Absolute relative distance from the SMA.
    pub strength: f64,
    pub current_price: f64,
    pub sma: f64,
}

/// Basic trend statistics over the whole window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub symbol: String,
    pub direction: TrendDirection,
    /// Absolute regression slope relative to the current price.
    pub strength: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    /// Standard deviation relative to the mean, in percent.
    pub volatility: f64,
    pub sma: f64,
    pub current_price: f64,
    pub start_price: f64,
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakout: Option<Breakout>,
    pub timestamp: i64,
}
