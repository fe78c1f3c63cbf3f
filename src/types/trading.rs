use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Confidence, SignalAction, SignalType, TurningPointResult};

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// Direction implied by a signal. HOLD has none.
    pub fn from_action(action: SignalAction) -> Option<Self> {
        match action {
            SignalAction::Buy => Some(TradeDirection::Long),
            SignalAction::Sell => Some(TradeDirection::Short),
            SignalAction::Hold => None,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "LONG"),
            TradeDirection::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
        }
    }
}

/// Frozen exit details of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExit {
    pub price: f64,
    pub time: i64,
    pub reason: ExitReason,
    /// Final PnL at the exit price.
    pub profit: f64,
}

/// A simulated position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub position_size: f64,
    pub leverage: f64,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
    pub entry_time: i64,
    pub status: TradeStatus,
    pub current_price: f64,
    /// Running PnL at `current_price`.
    pub current_profit: f64,
    pub profit_percentage: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub signal_confidence: Confidence,
    #[serde(default)]
    pub signal_type: SignalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turning_point: Option<TurningPointResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<TradeExit>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Direction-adjusted PnL if the position were valued at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        let moved = match self.direction {
            TradeDirection::Long => price - self.entry_price,
            TradeDirection::Short => self.entry_price - price,
        };
        moved / self.entry_price * self.position_size * self.leverage
    }

    /// Final PnL, or zero while the trade is still open.
    pub fn realized_profit(&self) -> f64 {
        self.exit.map(|e| e.profit).unwrap_or(0.0)
    }
}

/// Aggregate trade statistics for one symbol or for all symbols.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    /// Cumulative final PnL. May be negative.
    pub total_profit: f64,
    /// Winning share of closed trades, in percent.
    pub win_rate: f64,
    pub active_trades: u64,
    pub max_concurrent_trades: u64,
}

impl TradeStats {
    pub fn record_open(&mut self) {
        self.active_trades += 1;
        self.max_concurrent_trades = self.max_concurrent_trades.max(self.active_trades);
    }

    /// Count a closed trade. A trade wins only with strictly positive PnL.
    pub fn record_close(&mut self, profit: f64) {
        self.active_trades = self.active_trades.saturating_sub(1);
        self.record_closed_history(profit);
    }

    /// Count a closed trade that was never open in this session.
    pub fn record_closed_history(&mut self, profit: f64) {
        self.total_trades += 1;
        if profit > 0.0 {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
        self.total_profit += profit;
        self.win_rate = self.winning_trades as f64 / self.total_trades as f64 * 100.0;
    }
}

/// Per-symbol section of a trade report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolReport {
    pub stats: TradeStats,
    pub active_trades: usize,
    /// Latest signal label, e.g. `BUY (HIGH)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_signal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReport {
    pub timestamp: i64,
    pub global_stats: TradeStats,
    pub symbols: BTreeMap<String, SymbolReport>,
}
