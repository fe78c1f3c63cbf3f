//! Relative Strength Index (RSI) indicator.

use super::Indicator;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses
/// over the trailing `period` price deltas. Averages are plain sums divided by the
/// period (no Wilder smoothing). Values range from 0-100:
/// - At or above the overbought threshold: market may be overheated
/// - At or below the oversold threshold: market may be oversold
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// RSI from a delta series. `None` below `period` deltas.
    pub fn from_deltas(deltas: &[f64], period: usize) -> Option<f64> {
        if period == 0 || deltas.len() < period {
            return None;
        }

        let recent = &deltas[deltas.len() - period..];
        let (gains, losses) = recent.iter().fold((0.0, 0.0), |(g, l), change| {
            if *change > 0.0 {
                (g + change, l)
            } else {
                (g, l + change.abs())
            }
        });

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, series: &[f64]) -> Option<f64> {
        Self::from_deltas(series, self.period)
    }
}
