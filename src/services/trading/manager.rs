//! Position lifecycle management.
//!
//! Opens simulated trades from signals, marks them to market on every tick,
//! closes them at take-profit or stop-loss, and keeps trade statistics.

use tracing::{debug, info};

use crate::config::TradingConfig;
use crate::types::{
    Confidence, ExitReason, SignalType, Trade, TradeDirection, TradeExit, TradeStats, TradeStatus,
    TurningPointResult,
};

/// Trade state owned by one symbol.
#[derive(Debug, Clone, Default)]
pub struct SymbolLedger {
    pub active: Vec<Trade>,
    pub stats: TradeStats,
    /// Entry time of the most recent trade on this symbol.
    pub last_trade_time: Option<i64>,
}

impl SymbolLedger {
    pub fn has_open_trade(&self) -> bool {
        self.active.iter().any(Trade::is_open)
    }
}

/// Parameters for opening a trade.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub confidence: Confidence,
    pub signal_type: SignalType,
    pub turning_point: Option<TurningPointResult>,
    pub timestamp: i64,
}

/// Exit triggered by a price update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitTrigger {
    pub reason: ExitReason,
    /// The crossed take-profit or stop-loss level.
    pub price: f64,
}

/// Lifecycle change produced by a price update.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeUpdate {
    Marked(Trade),
    Closed(Trade),
}

/// Owns the trade id counter, global statistics and closed-trade history.
#[derive(Debug)]
pub struct PositionManager {
    config: TradingConfig,
    counter: u64,
    global: TradeStats,
    history: Vec<Trade>,
}

impl PositionManager {
    pub fn new(config: TradingConfig) -> Self {
        Self {
            config,
            counter: 0,
            global: TradeStats::default(),
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// Replace the trading configuration. Open trades keep their levels.
    pub fn set_config(&mut self, config: TradingConfig) {
        self.config = config;
    }

    pub fn global_stats(&self) -> &TradeStats {
        &self.global
    }

    /// All closed trades, oldest first, including any loaded history.
    pub fn history(&self) -> &[Trade] {
        &self.history
    }

    /// Seed history from a previous session and rebuild global statistics.
    pub fn load_history(&mut self, trades: Vec<Trade>) {
        for trade in &trades {
            self.global.record_closed_history(trade.realized_profit());
        }
        info!(
            "Loaded {} historical trades, win rate {:.2}%",
            trades.len(),
            self.global.win_rate
        );
        self.history.extend(trades);
    }

    fn next_id(&mut self, timestamp: i64) -> String {
        self.counter += 1;
        format!("TRADE_{}_{}", timestamp, self.counter)
    }

    /// Take-profit and stop-loss levels for an entry.
    ///
    /// Turning-point entries tighten the stop-loss ratio and widen the
    /// take-profit ratio by the configured factors.
    pub fn exit_levels(&self, direction: TradeDirection, entry_price: f64, signal_type: SignalType) -> (f64, f64) {
        let tp_config = &self.config.turning_point_trading;
        let (tp_ratio, sl_ratio) = match signal_type {
            SignalType::TurningPoint => (
                self.config.take_profit_ratio * tp_config.take_profit_widening,
                self.config.stop_loss_ratio * tp_config.stop_loss_tightening,
            ),
            SignalType::Regular => (self.config.take_profit_ratio, self.config.stop_loss_ratio),
        };

        match direction {
            TradeDirection::Long => (entry_price * (1.0 + tp_ratio), entry_price * (1.0 - sl_ratio)),
            TradeDirection::Short => (entry_price * (1.0 - tp_ratio), entry_price * (1.0 + sl_ratio)),
        }
    }

    /// Open a trade and register it with the symbol's ledger.
    ///
    /// Admission (one open trade per symbol, cooldown) is checked by the caller.
    pub fn open(&mut self, ledger: &mut SymbolLedger, request: OpenRequest) -> Trade {
        let (take_profit_price, stop_loss_price) =
            self.exit_levels(request.direction, request.entry_price, request.signal_type);

        let trade = Trade {
            id: self.next_id(request.timestamp),
            symbol: request.symbol,
            direction: request.direction,
            entry_price: request.entry_price,
            position_size: self.config.default_position_size,
            leverage: self.config.default_leverage,
            take_profit_price,
            stop_loss_price,
            entry_time: request.timestamp,
            status: TradeStatus::Open,
            current_price: request.entry_price,
            current_profit: 0.0,
            profit_percentage: 0.0,
            max_profit: 0.0,
            max_loss: 0.0,
            signal_confidence: request.confidence,
            signal_type: request.signal_type,
            turning_point: request.turning_point,
            exit: None,
        };

        ledger.active.push(trade.clone());
        ledger.last_trade_time = Some(request.timestamp);
        ledger.stats.record_open();
        self.global.record_open();

        info!(
            "Opened {} {} @ {:.6} (TP {:.6}, SL {:.6}, {:?})",
            trade.symbol,
            trade.direction,
            trade.entry_price,
            trade.take_profit_price,
            trade.stop_loss_price,
            trade.signal_type
        );
        trade
    }

    /// Mark a trade to market and report whether it must close.
    ///
    /// Take-profit is checked before stop-loss.
    pub fn mark(trade: &mut Trade, price: f64) -> Option<ExitTrigger> {
        trade.current_price = price;
        trade.current_profit = trade.pnl_at(price);
        trade.profit_percentage = trade.current_profit / trade.position_size * 100.0;
        trade.max_profit = trade.max_profit.max(trade.current_profit);
        trade.max_loss = trade.max_loss.min(trade.current_profit);

        let (take_profit, stop_loss) = match trade.direction {
            TradeDirection::Long => (price >= trade.take_profit_price, price <= trade.stop_loss_price),
            TradeDirection::Short => (price <= trade.take_profit_price, price >= trade.stop_loss_price),
        };

        if take_profit {
            Some(ExitTrigger {
                reason: ExitReason::TakeProfit,
                price: trade.take_profit_price,
            })
        } else if stop_loss {
            Some(ExitTrigger {
                reason: ExitReason::StopLoss,
                price: trade.stop_loss_price,
            })
        } else {
            None
        }
    }

    /// Freeze a trade at its exit. Closing an already closed trade is a no-op.
    pub fn close(trade: &mut Trade, trigger: ExitTrigger, time: i64) {
        if !trade.is_open() {
            return;
        }
        trade.status = TradeStatus::Closed;
        trade.exit = Some(TradeExit {
            price: trigger.price,
            time,
            reason: trigger.reason,
            profit: trade.pnl_at(trigger.price),
        });
    }

    /// Re-evaluate every open trade of a symbol at `price`.
    pub fn on_price(&mut self, ledger: &mut SymbolLedger, price: f64, timestamp: i64) -> Vec<TradeUpdate> {
        let mut updates = Vec::with_capacity(ledger.active.len());
        let mut still_open = Vec::with_capacity(ledger.active.len());

        for mut trade in ledger.active.drain(..) {
            match Self::mark(&mut trade, price) {
                Some(trigger) => {
                    Self::close(&mut trade, trigger, timestamp);
                    let profit = trade.realized_profit();
                    ledger.stats.record_close(profit);
                    self.global.record_close(profit);
                    info!(
                        "Closed {} {} at {:.6} ({}), PnL {:.2} ({:.2}%), symbol win rate {:.2}%",
                        trade.symbol,
                        trade.direction,
                        trigger.price,
                        trigger.reason,
                        profit,
                        profit / trade.position_size * 100.0,
                        ledger.stats.win_rate
                    );
                    self.history.push(trade.clone());
                    updates.push(TradeUpdate::Closed(trade));
                }
                None => {
                    debug!(
                        "{} {} marked at {:.6}, PnL {:.4}",
                        trade.symbol, trade.id, price, trade.current_profit
                    );
                    updates.push(TradeUpdate::Marked(trade.clone()));
                    still_open.push(trade);
                }
            }
        }

        ledger.active = still_open;
        updates
    }
}
