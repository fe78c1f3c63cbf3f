use serde::{Deserialize, Serialize};

/// Simple moving averages over the last 10, last 20 and all window samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmaSet {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

/// Fast (12) and slow (26) exponential moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaPair {
    pub fast: f64,
    pub slow: f64,
}

impl EmaPair {
    pub fn spread(&self) -> f64 {
        self.fast - self.slow
    }
}

/// Position of the MACD and signal lines relative to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroCross {
    /// Both lines above the threshold, MACD leading.
    pub bullish: bool,
    /// Both lines below the negative threshold, MACD leading.
    pub bearish: bool,
    /// MACD above zero while the signal line is still below.
    pub crossing_up: bool,
    /// MACD below zero while the signal line is still above.
    pub crossing_down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdSnapshot {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    /// Histogram minus the previous sample's histogram. Zero when there is no previous value.
    pub histogram_delta: f64,
    pub zero_cross: ZeroCross,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Band width as a percentage of the middle band.
    pub bandwidth_pct: f64,
    pub squeeze: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdjSnapshot {
    pub k: f64,
    pub d: f64,
    pub j: f64,
    pub overbought: bool,
    pub oversold: bool,
    pub bullish_cross: bool,
    pub bearish_cross: bool,
}

/// Every indicator computed for one tick. Absent values mean "unavailable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    pub timestamp: i64,
    pub data_points: usize,
    pub sma: SmaSet,
    pub ema: EmaPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdj: Option<KdjSnapshot>,
    /// Current price divided by the long SMA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_momentum_ratio: Option<f64>,
}
