//! Indicator snapshot assembly.
//!
//! A snapshot is a pure function of the window contents and the symbol's MACD
//! tracker state: building it twice without new samples gives identical output.

use crate::config::{MacdSignalMode, TrendConfig};
use crate::error::{AppError, Result};
use crate::services::signals::indicators::{
    macd::{FAST_PERIOD, SLOW_PERIOD},
    BollingerBands, Ema, Indicator, Kdj, Macd, MacdTracker, Rsi, Sma,
};
use crate::services::window::RollingWindow;
use crate::types::{EmaPair, IndicatorSnapshot, SmaSet};

const SMA_SHORT: usize = 10;
const SMA_MEDIUM: usize = 20;

/// Builds [`IndicatorSnapshot`]s from a window.
pub struct SnapshotBuilder {
    min_points: usize,
    rsi_period: usize,
    macd_mode: MacdSignalMode,
    macd: Macd,
    bollinger: BollingerBands,
    kdj: Kdj,
}

impl SnapshotBuilder {
    pub fn new(config: &TrendConfig) -> Self {
        let enhanced = &config.enhanced_trend;
        Self {
            min_points: enhanced.min_data_points_for_macd.max(SLOW_PERIOD),
            rsi_period: config.rsi_period,
            macd_mode: enhanced.macd_signal_mode,
            macd: Macd::from_config(&enhanced.turning_point),
            bollinger: BollingerBands::from_config(&enhanced.bollinger_bands),
            kdj: Kdj::from_config(&enhanced.kdj),
        }
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn macd(&self) -> &Macd {
        &self.macd
    }

    /// Compute every indicator for the newest sample in `window`.
    pub fn build(&self, window: &RollingWindow, tracker: &MacdTracker) -> Result<IndicatorSnapshot> {
        if window.len() < self.min_points {
            return Err(AppError::DataInsufficient {
                stage: "indicator snapshot",
                required: self.min_points,
                available: window.len(),
            });
        }

        let latest = *window
            .latest()
            .ok_or_else(|| AppError::Internal("window empty after length check".to_string()))?;
        let prices = window.prices();
        let current_price = latest.price;

        let sma = SmaSet {
            short: Sma::trailing(&prices, SMA_SHORT).unwrap_or(current_price),
            medium: Sma::trailing(&prices, SMA_MEDIUM).unwrap_or(current_price),
            long: Sma::mean(&prices).unwrap_or(current_price),
        };

        let insufficient = |required| AppError::DataInsufficient {
            stage: "ema",
            required,
            available: prices.len(),
        };
        let ema = EmaPair {
            fast: Ema::calculate_ema(&prices, FAST_PERIOD).ok_or_else(|| insufficient(FAST_PERIOD))?,
            slow: Ema::calculate_ema(&prices, SLOW_PERIOD).ok_or_else(|| insufficient(SLOW_PERIOD))?,
        };

        let macd_point = match self.macd_mode {
            MacdSignalMode::Incremental => tracker.latest(),
            MacdSignalMode::Windowed => self.macd.windowed(&prices),
        };
        let macd = macd_point.map(|point| self.macd.snapshot(point, &prices));

        let long_momentum_ratio = if sma.long != 0.0 {
            Some(current_price / sma.long)
        } else {
            None
        };

        Ok(IndicatorSnapshot {
            current_price,
            timestamp: latest.timestamp,
            data_points: prices.len(),
            sma,
            ema,
            macd,
            rsi: Rsi::from_deltas(window.deltas(), self.rsi_period),
            bollinger: self.bollinger.calculate(&prices),
            kdj: self.kdj.calculate(&prices),
            long_momentum_ratio,
        })
    }
}
