use serde::{Deserialize, Serialize};
use std::fmt;

use super::IndicatorSnapshot;

/// Recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
            SignalAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Confidence tier, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Conviction,
}

impl Confidence {
    /// HIGH and CONVICTION are strong enough to open a trade.
    pub fn is_tradeable(&self) -> bool {
        matches!(self, Confidence::High | Confidence::Conviction)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
            Confidence::Conviction => write!(f, "CONVICTION"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    #[default]
    Regular,
    TurningPoint,
}

/// Which conditions supported one side of a turning-point evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurningPointFlags {
    pub macd_divergence: bool,
    pub macd_zero_cross: bool,
    /// Recovery off the local low (bottom) or decline off the local high (top).
    pub price_move: bool,
    pub histogram_reversal: bool,
    /// Top side only.
    pub bollinger_upper: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingIndicators {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<TurningPointFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<TurningPointFlags>,
}

/// Bottom/top formation scores for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurningPointResult {
    pub potential_bottom: bool,
    pub potential_top: bool,
    /// Sum of fired condition weights, 0-100.
    pub bottom_confidence: u32,
    pub top_confidence: u32,
    /// Fired condition names, bottom side first.
    pub reasons: Vec<String>,
    pub supporting_indicators: SupportingIndicators,
}

/// Condition flags evaluated by the regular classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalConditions {
    pub long_momentum: bool,
    pub ema_bullish: bool,
    pub macd_bullish: bool,
    pub rsi_not_overbought: bool,
    pub short_momentum: bool,
    pub ema_bearish: bool,
    pub macd_bearish: bool,
    pub rsi_not_oversold: bool,
    pub potential_bottom: bool,
    pub potential_top: bool,
}

/// A graded trading signal with the indicators it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    pub symbol: String,
    #[serde(rename = "signal")]
    pub action: SignalAction,
    pub confidence: Confidence,
    pub signal_type: SignalType,
    pub reasons: Vec<String>,
    pub conditions: SignalConditions,
    pub technicals: IndicatorSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turning_points: Option<TurningPointResult>,
}

impl TradingSignal {
    pub fn price(&self) -> f64 {
        self.technicals.current_price
    }

    pub fn timestamp(&self) -> i64 {
        self.technicals.timestamp
    }

    /// Non-HOLD with HIGH or CONVICTION confidence.
    pub fn is_actionable(&self) -> bool {
        self.action != SignalAction::Hold && self.confidence.is_tradeable()
    }

    /// Short label such as `BUY (HIGH)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.action, self.confidence)
    }
}
