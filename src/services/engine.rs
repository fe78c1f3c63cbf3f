//! Per-tick orchestration.
//!
//! One call to [`TrendEngine::push_sample`] runs a full tick for one symbol:
//! window update, open-trade re-evaluation, price-move alert, trend analysis
//! and alerts, indicator snapshot, turning point scoring, signal generation,
//! admission and opening. Ticks are synchronous and never fail; stages that lack data are
//! skipped for that tick.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::AppError;
use crate::services::signals::indicators::MacdTracker;
use crate::services::signals::{
    Cooldown, SignalGenerator, SnapshotBuilder, TrendAnalyzer, TurningPointDetector,
};
use crate::services::trading::gate::CONFIRMATION_HISTORY;
use crate::services::trading::{
    AdmissionGate, ConfirmationTracker, OpenRequest, PendingEntry, PositionManager, SymbolLedger,
    TradeUpdate,
};
use crate::services::window::{RetentionPolicy, RollingWindow};
use crate::types::{
    Confidence, EngineEvent, PriceSample, SignalType, SymbolReport, Trade,
    TradeDirection, TradeReport, TradeStats, TradingSignal, TrendAnalysis, TrendDirection,
    TurningPointResult,
};

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub symbol: String,
    pub trend: Option<TrendAnalysis>,
    pub signal: Option<TradingSignal>,
    /// The signal is actionable and outside the alert cooldown.
    pub signal_alert: bool,
    /// Trade lifecycle and alert events, in the order they happened.
    pub events: Vec<EngineEvent>,
}

impl TickOutcome {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            trend: None,
            signal: None,
            signal_alert: false,
            events: Vec::new(),
        }
    }

    pub fn opened(&self) -> Option<&Trade> {
        self.events.iter().find_map(|event| match event {
            EngineEvent::TradeOpened { trade } => Some(trade),
            _ => None,
        })
    }

    pub fn closed(&self) -> impl Iterator<Item = &Trade> {
        self.events.iter().filter_map(|event| match event {
            EngineEvent::TradeClosed { trade } => Some(trade),
            _ => None,
        })
    }

    /// Flatten into a single event list, the signal first.
    pub fn into_events(self) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(self.events.len() + 1);
        if let Some(signal) = self.signal {
            events.push(EngineEvent::Signal {
                signal,
                alert: self.signal_alert,
            });
        }
        events.extend(self.events);
        events
    }
}

/// State owned by one symbol.
#[derive(Debug, Default)]
pub struct SymbolState {
    pub window: RollingWindow,
    pub macd: MacdTracker,
    pub ledger: SymbolLedger,
    pub confirmation: ConfirmationTracker,
    /// Direction of the last trend-change alert.
    pub trend_state: TrendDirection,
    pub rsi_alerts: Cooldown,
    pub price_alerts: Cooldown,
    pub signal_alerts: Cooldown,
    pub current_signal: Option<TradingSignal>,
    pub previous_signal: Option<TradingSignal>,
}

/// Components derived from the configuration.
struct Pipeline {
    policy: RetentionPolicy,
    trend: TrendAnalyzer,
    snapshots: SnapshotBuilder,
    detector: TurningPointDetector,
    generator: SignalGenerator,
    gate: AdmissionGate,
}

impl Pipeline {
    fn new(config: &EngineConfig) -> Self {
        let trend = &config.trend_analysis;
        Self {
            policy: RetentionPolicy::from_config(trend),
            trend: TrendAnalyzer::new(trend),
            snapshots: SnapshotBuilder::new(trend),
            detector: TurningPointDetector::new(),
            generator: SignalGenerator::from_config(trend),
            gate: AdmissionGate::from_config(&config.trading),
        }
    }
}

/// Entry parameters taken from a signal or a confirmed pending entry.
struct Entry {
    direction: TradeDirection,
    confidence: Confidence,
    signal_type: SignalType,
    turning_point: Option<TurningPointResult>,
}

impl Entry {
    fn from_signal(signal: &TradingSignal) -> Option<Self> {
        Some(Self {
            direction: TradeDirection::from_action(signal.action)?,
            confidence: signal.confidence,
            signal_type: signal.signal_type,
            turning_point: signal.turning_points.clone(),
        })
    }

    fn from_pending(pending: PendingEntry) -> Option<Self> {
        Some(Self {
            direction: TradeDirection::from_action(pending.action)?,
            confidence: pending.confidence,
            signal_type: SignalType::TurningPoint,
            turning_point: pending.turning_point,
        })
    }
}

/// Single-writer engine over all symbols.
pub struct TrendEngine {
    config: Arc<EngineConfig>,
    pipeline: Pipeline,
    symbols: HashMap<String, SymbolState>,
    positions: PositionManager,
}

impl TrendEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_config(Arc::new(config))
    }

    /// Build an engine over `config`. An invalid config is logged and used
    /// as-is; window and snapshot bounds are clamped to the MACD minimum.
    pub fn with_config(config: Arc<EngineConfig>) -> Self {
        warn_invalid(&config);
        Self {
            pipeline: Pipeline::new(&config),
            positions: PositionManager::new(config.trading.clone()),
            symbols: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Swap the whole configuration. Takes effect from the next tick; open
    /// trades keep their levels.
    pub fn set_config(&mut self, config: Arc<EngineConfig>) {
        warn_invalid(&config);
        self.pipeline = Pipeline::new(&config);
        self.positions.set_config(config.trading.clone());
        self.config = config;
        info!("Engine configuration updated");
    }

    pub fn load_history(&mut self, trades: Vec<Trade>) {
        self.positions.load_history(trades);
    }

    /// All closed trades, including loaded history.
    pub fn history(&self) -> &[Trade] {
        self.positions.history()
    }

    pub fn global_stats(&self) -> &TradeStats {
        self.positions.global_stats()
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolState> {
        self.symbols.get(symbol)
    }

    pub fn active_trades(&self) -> impl Iterator<Item = &Trade> {
        self.symbols.values().flat_map(|state| state.ledger.active.iter())
    }

    /// Global and per-symbol statistics.
    pub fn report(&self, timestamp: i64) -> TradeReport {
        let symbols: BTreeMap<String, SymbolReport> = self
            .symbols
            .iter()
            .map(|(symbol, state)| {
                let report = SymbolReport {
                    stats: state.ledger.stats.clone(),
                    active_trades: state.ledger.active.len(),
                    current_signal: state.current_signal.as_ref().map(TradingSignal::label),
                };
                (symbol.clone(), report)
            })
            .collect();

        TradeReport {
            timestamp,
            global_stats: self.positions.global_stats().clone(),
            symbols,
        }
    }

    /// Run one tick for `symbol`.
    pub fn push_sample(&mut self, symbol: &str, price: f64, timestamp: i64) -> TickOutcome {
        let Self {
            config,
            pipeline,
            symbols,
            positions,
        } = self;
        let sample = PriceSample::new(price, timestamp);
        let state = symbols.entry(symbol.to_string()).or_default();
        let mut outcome = TickOutcome::new(symbol);
        let previous_price = state.window.last_price();

        let pruned = state.window.push(sample, &pipeline.policy);
        if pruned.removed() > 0 {
            debug!(
                "Pruned {} window: removed {} ({} expired), {} samples left",
                symbol,
                pruned.removed(),
                pruned.expired,
                state.window.len()
            );
        }
        state.macd.update(price);

        for update in positions.on_price(&mut state.ledger, price, timestamp) {
            outcome.events.push(match update {
                TradeUpdate::Marked(trade) => EngineEvent::TradeUpdated { trade },
                TradeUpdate::Closed(trade) => EngineEvent::TradeClosed { trade },
            });
        }

        if let Some(previous) = previous_price {
            price_alert(config, state, symbol, previous, sample, &mut outcome.events);
        }

        let analysis = match pipeline.trend.analyze(symbol, &state.window) {
            Ok(analysis) => analysis,
            Err(e) => {
                log_skipped(symbol, &e);
                return outcome;
            }
        };
        trend_alerts(config, pipeline, state, &analysis, &mut outcome.events);
        outcome.trend = Some(analysis);

        let snapshot = match pipeline.snapshots.build(&state.window, &state.macd) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_skipped(symbol, &e);
                return outcome;
            }
        };
        let prices = state.window.prices();
        let turning_points = pipeline.detector.detect(&snapshot, &prices);
        let signal = pipeline.generator.generate(symbol, snapshot, turning_points);

        outcome.signal_alert = signal.is_actionable()
            && state
                .signal_alerts
                .try_fire(timestamp, config.trend_analysis.signal_alert_cooldown);
        if outcome.signal_alert {
            info!(
                "{} signal {} [{:?}] @ {}: {}",
                symbol,
                signal.label(),
                signal.signal_type,
                price,
                signal.reasons.join(", ")
            );
        }

        if let Some(entry) = entry_candidate(config, state, &signal, sample, &mut outcome.events) {
            match pipeline.gate.check(&state.ledger, timestamp) {
                Ok(()) => {
                    let trade = positions.open(
                        &mut state.ledger,
                        OpenRequest {
                            symbol: symbol.to_string(),
                            direction: entry.direction,
                            entry_price: price,
                            confidence: entry.confidence,
                            signal_type: entry.signal_type,
                            turning_point: entry.turning_point,
                            timestamp,
                        },
                    );
                    outcome.events.push(EngineEvent::TradeOpened { trade });
                }
                Err(rejection) => debug!("{} entry skipped: {}", symbol, rejection),
            }
        }

        state.previous_signal = state.current_signal.replace(signal.clone());
        outcome.signal = Some(signal);
        outcome
    }
}

fn warn_invalid(config: &EngineConfig) {
    if let Err(e) = config.validate() {
        warn!("Engine running with invalid configuration: {}", e);
    }
}

fn log_skipped(symbol: &str, error: &AppError) {
    if error.is_data_insufficient() {
        debug!("{}: {}", symbol, error);
    } else {
        warn!("{}: analysis skipped: {}", symbol, error);
    }
}

/// Alert on a tick-to-tick move of at least `PRICE_CHANGE_THRESHOLD`.
fn price_alert(
    config: &EngineConfig,
    state: &mut SymbolState,
    symbol: &str,
    previous: f64,
    sample: PriceSample,
    events: &mut Vec<EngineEvent>,
) {
    if previous <= 0.0 {
        return;
    }
    let change = (sample.price - previous) / previous;
    if change.abs() < config.price_change_threshold {
        return;
    }
    if !state
        .price_alerts
        .try_fire(sample.timestamp, config.price_alert_cooldown)
    {
        debug!("{} price move alert cooling down", symbol);
        return;
    }

    info!(
        "{} price moved {:+.2}% ({} -> {})",
        symbol,
        change * 100.0,
        previous,
        sample.price
    );
    events.push(EngineEvent::PriceMove {
        symbol: symbol.to_string(),
        previous,
        price: sample.price,
        change_percent: change * 100.0,
        timestamp: sample.timestamp,
    });
}

fn trend_alerts(
    config: &EngineConfig,
    pipeline: &Pipeline,
    state: &mut SymbolState,
    analysis: &TrendAnalysis,
    events: &mut Vec<EngineEvent>,
) {
    if pipeline.trend.should_alert_trend_change(state.trend_state, analysis) {
        let previous = state.trend_state;
        state.trend_state = analysis.direction;
        info!(
            "{} trend changed {} -> {} ({:.2}%)",
            analysis.symbol, previous, analysis.direction, analysis.price_change_percent
        );
        events.push(EngineEvent::TrendChanged {
            analysis: analysis.clone(),
            previous,
        });
    }

    let zone = analysis.rsi.and_then(|rsi| pipeline.trend.rsi_zone(rsi).map(|zone| (rsi, zone)));
    if let Some((rsi, zone)) = zone {
        if state
            .rsi_alerts
            .try_fire(analysis.timestamp, config.trend_analysis.rsi_alert_cooldown)
        {
            events.push(EngineEvent::RsiAlert {
                symbol: analysis.symbol.clone(),
                zone,
                rsi,
                price: analysis.current_price,
                timestamp: analysis.timestamp,
            });
        }
    }
}

/// Decide whether this tick should try to open a trade.
///
/// Actionable signals enter directly, except turning-point signals when
/// confirmation is required: those are parked until the recent prices move in
/// the signal's direction. A parked entry is re-checked on later ticks and
/// dropped after [`CONFIRMATION_HISTORY`] ticks or when a regular actionable
/// signal arrives.
fn entry_candidate(
    config: &EngineConfig,
    state: &mut SymbolState,
    signal: &TradingSignal,
    sample: PriceSample,
    events: &mut Vec<EngineEvent>,
) -> Option<Entry> {
    let tp_config = &config.trading.turning_point_trading;
    let tracker = &mut state.confirmation;

    if signal.is_actionable() {
        if signal.signal_type != SignalType::TurningPoint || !tp_config.require_confirmation {
            if tracker.take_pending().is_some() {
                debug!("{} pending turning point superseded", signal.symbol);
            }
            return Entry::from_signal(signal);
        }

        let candles = ConfirmationTracker::candles_for(tp_config, signal.action);
        if tracker.check(sample.price, signal.action, candles) {
            tracker.take_pending();
            return Entry::from_signal(signal);
        }

        let already_parked = tracker.pending().map(|p| p.action) == Some(signal.action);
        if already_parked {
            if let Some(pending) = tracker.pending_mut() {
                pending.waited += 1;
            }
            return None;
        }

        tracker.park(PendingEntry {
            action: signal.action,
            confidence: signal.confidence,
            turning_point: signal.turning_points.clone(),
            since: sample.timestamp,
            waited: 0,
        });
        debug!("{} turning point {} awaiting confirmation", signal.symbol, signal.action);
        events.push(EngineEvent::TurningPointPending {
            symbol: signal.symbol.clone(),
            action: signal.action,
            price: sample.price,
            timestamp: sample.timestamp,
        });
        return None;
    }

    let (action, waited) = match tracker.pending_mut() {
        Some(pending) => {
            pending.waited += 1;
            (pending.action, pending.waited)
        }
        None => return None,
    };

    let candles = ConfirmationTracker::candles_for(tp_config, action);
    if tracker.check(sample.price, action, candles) {
        return tracker.take_pending().and_then(Entry::from_pending);
    }
    if waited >= CONFIRMATION_HISTORY {
        tracker.take_pending();
        debug!("{} pending turning point {} expired", signal.symbol, action);
    }
    None
}

impl Default for TrendEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
