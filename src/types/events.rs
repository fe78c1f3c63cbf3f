use serde::{Deserialize, Serialize};

use super::{SignalAction, Trade, TradingSignal, TrendAnalysis, TrendDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Overbought,
    Oversold,
}

/// Everything the engine reports to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Signal computed for a tick. `alert` is set when it is actionable and
    /// outside the per-symbol alert cooldown.
    Signal { signal: TradingSignal, alert: bool },
    TradeOpened { trade: Trade },
    TradeUpdated { trade: Trade },
    TradeClosed { trade: Trade },
    /// Turning-point signal held back until price confirms it.
    TurningPointPending {
        symbol: String,
        action: SignalAction,
        price: f64,
        timestamp: i64,
    },
    TrendChanged {
        analysis: TrendAnalysis,
        previous: TrendDirection,
    },
    RsiAlert {
        symbol: String,
        zone: RsiZone,
        rsi: f64,
        price: f64,
        timestamp: i64,
    },
    /// Tick-to-tick move beyond the price change threshold. `change_percent`
    /// is signed.
    PriceMove {
        symbol: String,
        previous: f64,
        price: f64,
        change_percent: f64,
        timestamp: i64,
    },
}

impl EngineEvent {
    pub fn symbol(&self) -> &str {
        match self {
            EngineEvent::Signal { signal, .. } => &signal.symbol,
            EngineEvent::TradeOpened { trade }
            | EngineEvent::TradeUpdated { trade }
            | EngineEvent::TradeClosed { trade } => &trade.symbol,
            EngineEvent::TurningPointPending { symbol, .. } => symbol,
            EngineEvent::TrendChanged { analysis, .. } => &analysis.symbol,
            EngineEvent::RsiAlert { symbol, .. } | EngineEvent::PriceMove { symbol, .. } => symbol,
        }
    }
}
