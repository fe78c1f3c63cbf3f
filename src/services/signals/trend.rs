//! Basic trend analysis over the whole window, plus the filters that decide
//! when a trend change or RSI extreme is worth alerting on.

use crate::config::TrendConfig;
use crate::error::{AppError, Result};
use crate::services::signals::indicators::{BollingerBands, Rsi, Sma};
use crate::services::window::RollingWindow;
use crate::types::{Breakout, BreakoutKind, RsiZone, TrendAnalysis, TrendDirection};

/// Trend-change alerts need this many times the minimum sample count.
const ALERT_DATA_FACTOR: f64 = 1.5;
const ALERT_MIN_STRENGTH: f64 = 0.008;
const ALERT_MIN_CHANGE_PCT: f64 = 1.5;
const ALERT_MAX_VOLATILITY: f64 = 5.0;
const ALERT_RSI_LOW: f64 = 25.0;
const ALERT_RSI_HIGH: f64 = 75.0;

pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: &TrendConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Direction, strength, volatility and breakout for the window.
    pub fn analyze(&self, symbol: &str, window: &RollingWindow) -> Result<TrendAnalysis> {
        let min_points = self.config.min_data_points;
        if window.len() < min_points.max(2) {
            return Err(AppError::DataInsufficient {
                stage: "trend analysis",
                required: min_points,
                available: window.len(),
            });
        }

        let prices = window.prices();
        let (first, last) = match (window.first(), window.latest()) {
            (Some(first), Some(last)) => (first.price, last.price),
            _ => return Err(AppError::Internal("empty window".to_string())),
        };
        if first == 0.0 || last == 0.0 {
            return Err(AppError::Computation("zero price in window".to_string()));
        }

        let price_change = last - first;
        let change_ratio = price_change / first;

        let sma = Sma::mean(&prices).ok_or_else(|| AppError::Internal("empty window".to_string()))?;
        if sma == 0.0 {
            return Err(AppError::Computation("zero window mean".to_string()));
        }
        let volatility = BollingerBands::std_dev(&prices, sma) / sma;
        let strength = Self::regression_slope(&prices) / last;

        let direction = if change_ratio > self.config.trend_threshold {
            TrendDirection::Uptrend
        } else if change_ratio < -self.config.trend_threshold {
            TrendDirection::Downtrend
        } else {
            TrendDirection::Neutral
        };

        Ok(TrendAnalysis {
            symbol: symbol.to_string(),
            direction,
            strength: strength.abs(),
            price_change,
            price_change_percent: change_ratio * 100.0,
            volatility: volatility * 100.0,
            sma,
            current_price: last,
            start_price: first,
            data_points: prices.len(),
            rsi: Rsi::from_deltas(window.deltas(), self.config.rsi_period),
            breakout: self.breakout(last, sma),
            timestamp: window.latest().map(|s| s.timestamp).unwrap_or_default(),
        })
    }

    /// Least-squares slope of price against sample index.
    fn regression_slope(prices: &[f64]) -> f64 {
        let n = prices.len() as f64;
        let (sum_x, sum_y, sum_xy, sum_xx) = prices.iter().enumerate().fold(
            (0.0, 0.0, 0.0, 0.0),
            |(sx, sy, sxy, sxx), (i, y)| {
                let x = i as f64;
                (sx + x, sy + y, sxy + x * y, sxx + x * x)
            },
        );
        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator == 0.0 {
            return 0.0;
        }
        (n * sum_xy - sum_x * sum_y) / denominator
    }

    fn breakout(&self, price: f64, sma: f64) -> Option<Breakout> {
        let distance = (price - sma) / sma;
        if distance.abs() <= self.config.breakout_threshold {
            return None;
        }
        Some(Breakout {
            kind: if distance > 0.0 {
                BreakoutKind::BreakoutUp
            } else {
                BreakoutKind::BreakoutDown
            },
            strength: distance.abs(),
            current_price: price,
            sma,
        })
    }

    /// Whether a direction change away from `previous` should be reported.
    pub fn should_alert_trend_change(&self, previous: TrendDirection, analysis: &TrendAnalysis) -> bool {
        if analysis.direction == previous || analysis.direction == TrendDirection::Neutral {
            return false;
        }
        if (analysis.data_points as f64) < self.config.min_data_points as f64 * ALERT_DATA_FACTOR {
            return false;
        }
        if analysis.strength < ALERT_MIN_STRENGTH {
            return false;
        }
        if analysis.price_change_percent.abs() < ALERT_MIN_CHANGE_PCT {
            return false;
        }
        if analysis.volatility > ALERT_MAX_VOLATILITY {
            return false;
        }
        match analysis.rsi {
            Some(rsi) => (ALERT_RSI_LOW..=ALERT_RSI_HIGH).contains(&rsi),
            None => true,
        }
    }

    /// Overbought/oversold zone for an RSI reading.
    pub fn rsi_zone(&self, rsi: f64) -> Option<RsiZone> {
        if rsi >= self.config.rsi_overbought {
            Some(RsiZone::Overbought)
        } else if rsi <= self.config.rsi_oversold {
            Some(RsiZone::Oversold)
        } else {
            None
        }
    }
}

/// Per-symbol rate limiter keyed on sample timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    last: Option<i64>,
}

impl Cooldown {
    /// Fire if `interval_ms` has elapsed since the last firing, recording `now`.
    pub fn try_fire(&mut self, now: i64, interval_ms: i64) -> bool {
        if let Some(last) = self.last {
            if now - last < interval_ms {
                return false;
            }
        }
        self.last = Some(now);
        true
    }

    pub fn last(&self) -> Option<i64> {
        self.last
    }
}
