//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA seeded with the SMA of the first `period` values.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// EMA over the whole series. `None` below `period` values.
    pub fn calculate_ema(values: &[f64], period: usize) -> Option<f64> {
        let mut state = EmaState::new(period);
        values.iter().fold(None, |_, v| state.update(*v))
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &str {
        "ema"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, series: &[f64]) -> Option<f64> {
        Self::calculate_ema(series, self.period)
    }
}

/// Incrementally maintained EMA.
///
/// Feeding a series value by value yields the same result as
/// [`Ema::calculate_ema`] over that series.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaState {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Add one value. Returns the EMA once `period` values have been seen.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        self.seen += 1;
        self.value = match self.value {
            Some(ema) => Some((x - ema) * self.multiplier + ema),
            None => {
                self.seed_sum += x;
                if self.seen == self.period {
                    Some(self.seed_sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Mean of the values seen so far while still seeding.
    pub fn seed_mean(&self) -> Option<f64> {
        if self.seen == 0 {
            return None;
        }
        Some(self.seed_sum / self.seen.min(self.period) as f64)
    }

    pub fn seen(&self) -> usize {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_series_unavailable() {
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0], 3), None);
    }

    #[test]
    fn test_seed_is_sma() {
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0, 3.0], 3), Some(2.0));
    }

    #[test]
    fn test_iteration() {
        // seed 2.0, multiplier 0.5: (6 - 2) * 0.5 + 2 = 4
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0, 3.0, 6.0], 3), Some(4.0));
    }

    #[test]
    fn test_state_matches_batch() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let mut state = EmaState::new(12);
        for v in &values {
            state.update(*v);
        }
        assert_eq!(state.value(), Ema::calculate_ema(&values, 12));
    }

    #[test]
    fn test_seed_mean_while_seeding() {
        let mut state = EmaState::new(9);
        state.update(1.0);
        state.update(3.0);
        assert_eq!(state.value(), None);
        assert_eq!(state.seed_mean(), Some(2.0));
    }
}
