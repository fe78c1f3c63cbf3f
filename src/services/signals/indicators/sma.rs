//! Simple Moving Average (SMA) indicator.

use super::Indicator;

/// Arithmetic mean of the last `period` values.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Mean of all values. `None` on empty input.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Mean of the trailing `period` values, or of all values if fewer exist.
    pub fn trailing(values: &[f64], period: usize) -> Option<f64> {
        let start = values.len().saturating_sub(period);
        Self::mean(&values[start..])
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn id(&self) -> &str {
        "sma"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, series: &[f64]) -> Option<f64> {
        if self.period == 0 || series.len() < self.period {
            return None;
        }
        Self::trailing(series, self.period)
    }
}
