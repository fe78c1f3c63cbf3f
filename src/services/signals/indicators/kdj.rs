//! KDJ stochastic oscillator.

use super::Indicator;
use crate::config::KdjConfig;
use crate::types::KdjSnapshot;

const OVERBOUGHT: f64 = 80.0;
const OVERSOLD: f64 = 20.0;
/// Minimum K/D separation for a cross to count.
const CROSS_MARGIN: f64 = 5.0;
const RECURSIVE_SEED: f64 = 50.0;

/// KDJ indicator over closing prices.
///
/// RSV = (close - lowest) / (highest - lowest) * 100 over `period` samples.
/// The default form is simplified: K = RSV, D = K, J = 3K - 2D. With
/// `recursive` set, K and D are smoothed across the series:
/// K_t = ((slow_k - 1) * K_{t-1} + RSV_t) / slow_k, D likewise over K with
/// `slow_d`, both seeded at 50. Only closes are available, so highs and lows
/// are taken from the same series.
pub struct Kdj {
    period: usize,
    slow_k: usize,
    slow_d: usize,
    recursive: bool,
}

impl Default for Kdj {
    fn default() -> Self {
        Self::from_config(&KdjConfig::default())
    }
}

impl Kdj {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            slow_k: 3,
            slow_d: 3,
            recursive: false,
        }
    }

    pub fn from_config(config: &KdjConfig) -> Self {
        Self {
            period: config.period,
            slow_k: config.slow_k.max(1),
            slow_d: config.slow_d.max(1),
            recursive: config.recursive,
        }
    }

    /// RSV of the last value within `values`. `None` on a flat range.
    fn rsv(values: &[f64]) -> Option<f64> {
        let close = *values.last()?;
        let highest = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = values.iter().copied().fold(f64::INFINITY, f64::min);
        if highest == lowest {
            return None;
        }
        Some((close - lowest) / (highest - lowest) * 100.0)
    }

    fn smoothed(&self, series: &[f64]) -> (f64, f64) {
        let (slow_k, slow_d) = (self.slow_k as f64, self.slow_d as f64);
        let mut k = RECURSIVE_SEED;
        let mut d = RECURSIVE_SEED;
        for window in series.windows(self.period) {
            // flat ranges carry the previous values forward
            if let Some(rsv) = Self::rsv(window) {
                k = ((slow_k - 1.0) * k + rsv) / slow_k;
                d = ((slow_d - 1.0) * d + k) / slow_d;
            }
        }
        (k, d)
    }
}

impl Indicator for Kdj {
    type Output = KdjSnapshot;

    fn id(&self) -> &str {
        "kdj"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, series: &[f64]) -> Option<KdjSnapshot> {
        if self.period == 0 || series.len() < self.period {
            return None;
        }

        let rsv = Self::rsv(&series[series.len() - self.period..])?;
        let (k, d) = if self.recursive {
            self.smoothed(series)
        } else {
            (rsv, rsv)
        };
        let j = 3.0 * k - 2.0 * d;

        Some(KdjSnapshot {
            k,
            d,
            j,
            overbought: k > OVERBOUGHT,
            oversold: k < OVERSOLD,
            bullish_cross: k > d && k - d > CROSS_MARGIN,
            bearish_cross: k < d && d - k > CROSS_MARGIN,
        })
    }
}
