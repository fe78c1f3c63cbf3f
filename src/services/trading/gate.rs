//! Trade admission.
//!
//! A symbol may hold one open trade at a time, and consecutive trades on a
//! symbol are spaced by a minimum interval. Turning-point entries can also be
//! held back until recent prices confirm the reversal.

use std::collections::VecDeque;
use std::fmt;

use super::manager::SymbolLedger;
use crate::config::{TradingConfig, TurningPointTradingConfig};
use crate::types::{Confidence, SignalAction, TurningPointResult};

/// Prices remembered per symbol for confirmation.
pub const CONFIRMATION_HISTORY: usize = 10;

/// Why a trade was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OpenTrade,
    Cooldown { remaining_ms: i64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OpenTrade => write!(f, "symbol already has an open trade"),
            Rejection::Cooldown { remaining_ms } => {
                write!(f, "trade cooldown active for another {}s", remaining_ms / 1000)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionGate {
    min_interval_ms: i64,
}

impl AdmissionGate {
    pub fn new(min_interval_ms: i64) -> Self {
        Self { min_interval_ms }
    }

    pub fn from_config(config: &TradingConfig) -> Self {
        Self::new(config.min_signal_interval)
    }

    /// Admit when the symbol has no open trade and the interval since its last
    /// trade has fully elapsed.
    pub fn check(&self, ledger: &SymbolLedger, now: i64) -> Result<(), Rejection> {
        if ledger.has_open_trade() {
            return Err(Rejection::OpenTrade);
        }
        if let Some(last) = ledger.last_trade_time {
            let elapsed = now - last;
            if elapsed < self.min_interval_ms {
                return Err(Rejection::Cooldown {
                    remaining_ms: self.min_interval_ms - elapsed,
                });
            }
        }
        Ok(())
    }
}

/// A turning-point signal waiting for price confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub action: SignalAction,
    pub confidence: Confidence,
    pub turning_point: Option<TurningPointResult>,
    pub since: i64,
    /// Ticks evaluated since the entry was parked.
    pub waited: usize,
}

/// Per-symbol confirmation state.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationTracker {
    prices: VecDeque<f64>,
    pending: Option<PendingEntry>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consecutive samples needed to confirm `action`.
    pub fn candles_for(config: &TurningPointTradingConfig, action: SignalAction) -> usize {
        match action {
            SignalAction::Buy => config.bottom_confirmation_candles,
            SignalAction::Sell => config.top_confirmation_candles,
            SignalAction::Hold => 0,
        }
    }

    pub fn record(&mut self, price: f64) {
        self.prices.push_back(price);
        while self.prices.len() > CONFIRMATION_HISTORY {
            self.prices.pop_front();
        }
    }

    /// The last `candles` recorded prices are strictly increasing (BUY) or
    /// strictly decreasing (SELL).
    pub fn is_confirmed(&self, action: SignalAction, candles: usize) -> bool {
        if action == SignalAction::Hold || self.prices.len() < candles {
            return false;
        }
        let recent: Vec<f64> = self.prices.iter().skip(self.prices.len() - candles).copied().collect();
        recent.windows(2).all(|pair| match action {
            SignalAction::Buy => pair[1] > pair[0],
            SignalAction::Sell => pair[1] < pair[0],
            SignalAction::Hold => false,
        })
    }

    /// Record `price` and test confirmation.
    pub fn check(&mut self, price: f64, action: SignalAction, candles: usize) -> bool {
        self.record(price);
        self.is_confirmed(action, candles)
    }

    pub fn pending(&self) -> Option<&PendingEntry> {
        self.pending.as_ref()
    }

    pub fn pending_mut(&mut self) -> Option<&mut PendingEntry> {
        self.pending.as_mut()
    }

    pub fn park(&mut self, entry: PendingEntry) {
        self.pending = Some(entry);
    }

    pub fn take_pending(&mut self) -> Option<PendingEntry> {
        self.pending.take()
    }

    pub fn recorded(&self) -> usize {
        self.prices.len()
    }
}
