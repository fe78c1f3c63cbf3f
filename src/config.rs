//! Engine configuration.
//!
//! The layout mirrors the JSON configuration file used by the price monitor
//! (`TREND_ANALYSIS` / `TRADING` sections with SCREAMING_SNAKE_CASE keys), so an
//! existing file can be loaded as-is. Keys the engine does not use (coin lists,
//! push settings, endpoints) are ignored. Every field has a default.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "TRENDWATCH_CONFIG";

/// Top-level engine configuration. Swapped as a whole at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct EngineConfig {
    /// Relative tick-to-tick move that raises a price alert.
    pub price_change_threshold: f64,
    /// Milliseconds between price alerts for one symbol.
    pub price_alert_cooldown: i64,
    pub trend_analysis: TrendConfig,
    pub trading: TradingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_change_threshold: 0.04,
            price_alert_cooldown: 120_000,
            trend_analysis: TrendConfig::default(),
            trading: TradingConfig::default(),
        }
    }
}

/// Window, RSI and alerting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct TrendConfig {
    /// Analysis window in minutes. Samples are retained for 1.5x this span.
    pub time_window: u64,
    /// Minimum samples before basic trend analysis runs.
    pub min_data_points: usize,
    pub trend_threshold: f64,
    /// Recognized but unused; volatility filtering uses a fixed 5% ceiling.
    pub volatility_threshold: f64,
    pub breakout_threshold: f64,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Milliseconds between RSI zone alerts for one symbol.
    pub rsi_alert_cooldown: i64,
    /// Milliseconds between actionable signal alerts for one symbol.
    pub signal_alert_cooldown: i64,
    pub enhanced_trend: EnhancedTrendConfig,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            time_window: 30,
            min_data_points: 8,
            trend_threshold: 0.015,
            volatility_threshold: 0.03,
            breakout_threshold: 0.025,
            rsi_period: 14,
            rsi_overbought: 80.0,
            rsi_oversold: 20.0,
            rsi_alert_cooldown: 300_000,
            signal_alert_cooldown: 180_000,
            enhanced_trend: EnhancedTrendConfig::default(),
        }
    }
}

impl TrendConfig {
    /// Retention span in milliseconds (1.5x the analysis window).
    pub fn retention_ms(&self) -> i64 {
        (self.time_window as f64 * 60_000.0 * 1.5) as i64
    }
}

/// How the MACD signal line and histogram delta are maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacdSignalMode {
    /// Per-symbol EMA state updated once per sample.
    #[default]
    Incremental,
    /// Signal line re-derived from the window on every tick (averaged sub-window MACD).
    Windowed,
}

/// Indicator thresholds used by the signal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct EnhancedTrendConfig {
    pub long_momentum_threshold: f64,
    pub macd_hist_weak: f64,
    pub macd_hist_strong: f64,
    pub min_data_points_for_macd: usize,
    pub macd_signal_mode: MacdSignalMode,
    #[serde(rename = "MCAD_TURNING_POINT", alias = "MACD_TURNING_POINT")]
    pub turning_point: TurningPointConfig,
    pub bollinger_bands: BollingerConfig,
    pub kdj: KdjConfig,
}

impl Default for EnhancedTrendConfig {
    fn default() -> Self {
        Self {
            long_momentum_threshold: 0.02,
            macd_hist_weak: 0.0,
            macd_hist_strong: 0.001,
            min_data_points_for_macd: 26,
            macd_signal_mode: MacdSignalMode::Incremental,
            turning_point: TurningPointConfig::default(),
            bollinger_bands: BollingerConfig::default(),
            kdj: KdjConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct TurningPointConfig {
    pub zero_cross_threshold: f64,
    pub divergence_lookback: usize,
    /// Recognized but unused.
    pub histogram_reversal_ratio: f64,
    pub confirmation_candles: usize,
}

impl Default for TurningPointConfig {
    fn default() -> Self {
        Self {
            zero_cross_threshold: 0.0005,
            divergence_lookback: 5,
            histogram_reversal_ratio: 0.3,
            confirmation_candles: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct BollingerConfig {
    pub period: usize,
    pub std_dev: f64,
    pub band_squeeze_threshold: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
            band_squeeze_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct KdjConfig {
    pub period: usize,
    pub slow_k: usize,
    pub slow_d: usize,
    /// Use recursive K/D smoothing instead of K = RSV, D = K.
    pub recursive: bool,
}

impl Default for KdjConfig {
    fn default() -> Self {
        Self {
            period: 9,
            slow_k: 3,
            slow_d: 3,
            recursive: false,
        }
    }
}

/// Simulated trading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct TradingConfig {
    pub default_position_size: f64,
    pub default_leverage: f64,
    pub take_profit_ratio: f64,
    pub stop_loss_ratio: f64,
    /// Recognized but unused; the admission gate allows one open trade per symbol.
    pub max_trades_per_coin: usize,
    /// Minimum milliseconds between two trades on the same symbol.
    pub min_signal_interval: i64,
    pub trade_log_file: String,
    pub turning_point_trading: TurningPointTradingConfig,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            default_position_size: 100.0,
            default_leverage: 1.0,
            take_profit_ratio: 0.02,
            stop_loss_ratio: 0.01,
            max_trades_per_coin: 3,
            min_signal_interval: 180_000,
            trade_log_file: "trading_log.json".to_string(),
            turning_point_trading: TurningPointTradingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct TurningPointTradingConfig {
    pub bottom_confirmation_candles: usize,
    pub top_confirmation_candles: usize,
    /// Recognized but unused.
    pub reentry_allowance: f64,
    /// Multiplier applied to the stop-loss ratio for turning-point entries.
    pub stop_loss_tightening: f64,
    /// Multiplier applied to the take-profit ratio for turning-point entries.
    pub take_profit_widening: f64,
    /// Hold turning-point signals until price confirms the reversal.
    pub require_confirmation: bool,
}

impl Default for TurningPointTradingConfig {
    fn default() -> Self {
        Self {
            bottom_confirmation_candles: 2,
            top_confirmation_candles: 1,
            reentry_allowance: 0.005,
            stop_loss_tightening: 0.5,
            take_profit_widening: 1.5,
            require_confirmation: false,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing keys fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load configuration from the environment.
    ///
    /// Reads the file named by `TRENDWATCH_CONFIG` when set, then applies
    /// `TRENDWATCH_*` overrides for the trading knobs.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        let trading = &mut self.trading;
        if let Some(v) = parsed(lookup("TRENDWATCH_POSITION_SIZE")) {
            trading.default_position_size = v;
        }
        if let Some(v) = parsed(lookup("TRENDWATCH_LEVERAGE")) {
            trading.default_leverage = v;
        }
        if let Some(v) = parsed(lookup("TRENDWATCH_TAKE_PROFIT_RATIO")) {
            trading.take_profit_ratio = v;
        }
        if let Some(v) = parsed(lookup("TRENDWATCH_STOP_LOSS_RATIO")) {
            trading.stop_loss_ratio = v;
        }
        if let Some(v) = parsed(lookup("TRENDWATCH_MIN_SIGNAL_INTERVAL_MS")) {
            trading.min_signal_interval = v;
        }
        if let Some(v) = parsed(lookup("TRENDWATCH_REQUIRE_CONFIRMATION")) {
            trading.turning_point_trading.require_confirmation = v;
        }
        if let Some(path) = lookup("TRENDWATCH_TRADE_LOG") {
            trading.trade_log_file = path;
        }
    }

    /// Reject values that would make indicators or trade levels meaningless.
    pub fn validate(&self) -> Result<()> {
        let trend = &self.trend_analysis;
        let enhanced = &trend.enhanced_trend;
        let trading = &self.trading;
        let tp_trading = &trading.turning_point_trading;

        let checks: [(bool, &str); 15] = [
            (
                self.price_change_threshold > 0.0 && self.price_alert_cooldown >= 0,
                "PRICE_CHANGE_THRESHOLD must be positive and PRICE_ALERT_COOLDOWN not negative",
            ),
            (trend.time_window > 0, "TIME_WINDOW must be positive"),
            (trend.min_data_points > 1, "MIN_DATA_POINTS must be at least 2"),
            (trend.rsi_period > 0, "RSI_PERIOD must be positive"),
            (
                trend.rsi_oversold < trend.rsi_overbought,
                "RSI_OVERSOLD must be below RSI_OVERBOUGHT",
            ),
            (
                enhanced.min_data_points_for_macd >= 26,
                "MIN_DATA_POINTS_FOR_MACD must be at least 26",
            ),
            (
                enhanced.turning_point.divergence_lookback > 0,
                "DIVERGENCE_LOOKBACK must be positive",
            ),
            (
                enhanced.bollinger_bands.period > 0 && enhanced.bollinger_bands.std_dev > 0.0,
                "BOLLINGER_BANDS period and STD_DEV must be positive",
            ),
            (
                enhanced.kdj.period > 0 && enhanced.kdj.slow_k > 0 && enhanced.kdj.slow_d > 0,
                "KDJ periods must be positive",
            ),
            (
                trading.default_position_size > 0.0,
                "DEFAULT_POSITION_SIZE must be positive",
            ),
            (trading.default_leverage > 0.0, "DEFAULT_LEVERAGE must be positive"),
            (
                trading.take_profit_ratio > 0.0 && trading.stop_loss_ratio > 0.0,
                "TAKE_PROFIT_RATIO and STOP_LOSS_RATIO must be positive",
            ),
            (trading.min_signal_interval >= 0, "MIN_SIGNAL_INTERVAL must not be negative"),
            (
                tp_trading.stop_loss_tightening > 0.0 && tp_trading.stop_loss_tightening <= 1.0,
                "STOP_LOSS_TIGHTENING must be in (0, 1]",
            ),
            (
                tp_trading.take_profit_widening >= 1.0,
                "TAKE_PROFIT_WIDENING must be at least 1",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(AppError::Config(message.to_string())),
            None => Ok(()),
        }
    }
}
