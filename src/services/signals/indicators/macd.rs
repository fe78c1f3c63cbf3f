//! MACD (Moving Average Convergence Divergence) indicator.

use super::{Ema, EmaState, Indicator, Sma};
use crate::config::TurningPointConfig;
use crate::types::{MacdSnapshot, ZeroCross};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// Core MACD values for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub histogram_delta: f64,
}

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = smoothed MACD line
/// - Histogram = MACD Line - Signal Line
///
/// Two ways of producing the signal line exist. [`MacdTracker`] keeps a true
/// EMA(9) of the line, updated once per sample. [`Macd::windowed`] re-derives
/// everything from the current window: the signal is the mean of the MACD line
/// over up to nine consecutive 26-sample sub-windows taken from the start of
/// the window, and the histogram delta comes from re-running the computation
/// without the newest sample.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    zero_cross_threshold: f64,
    divergence_lookback: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self::from_config(&TurningPointConfig::default())
    }
}

impl Macd {
    pub fn from_config(config: &TurningPointConfig) -> Self {
        Self {
            fast_period: FAST_PERIOD,
            slow_period: SLOW_PERIOD,
            signal_period: SIGNAL_PERIOD,
            zero_cross_threshold: config.zero_cross_threshold,
            divergence_lookback: config.divergence_lookback,
        }
    }

    /// MACD line over the whole series.
    pub fn line(&self, prices: &[f64]) -> Option<f64> {
        let fast = Ema::calculate_ema(prices, self.fast_period)?;
        let slow = Ema::calculate_ema(prices, self.slow_period)?;
        Some(fast - slow)
    }

    /// (line, signal, histogram) using the sub-window signal approximation.
    fn windowed_core(&self, prices: &[f64]) -> Option<(f64, f64, f64)> {
        let line = self.line(prices)?;

        let sub_lines: Vec<f64> = (0..self.signal_period)
            .take_while(|offset| prices.len() - offset >= self.slow_period)
            .filter_map(|offset| self.line(&prices[offset..offset + self.slow_period]))
            .collect();
        let signal = Sma::mean(&sub_lines).unwrap_or(line * 0.9);

        Some((line, signal, line - signal))
    }

    /// Recompute-from-window MACD. `None` below the slow period.
    pub fn windowed(&self, prices: &[f64]) -> Option<MacdPoint> {
        let (line, signal, histogram) = self.windowed_core(prices)?;

        let previous = &prices[..prices.len() - 1];
        let histogram_delta = if previous.len() < self.slow_period {
            0.0
        } else {
            self.windowed_core(previous)
                .map(|(_, _, prev)| histogram - prev)
                .unwrap_or(0.0)
        };

        Some(MacdPoint {
            line,
            signal,
            histogram,
            histogram_delta,
        })
    }

    pub fn zero_cross(&self, line: f64, signal: f64) -> ZeroCross {
        let threshold = self.zero_cross_threshold;
        ZeroCross {
            bullish: line > threshold && signal > threshold && line > signal,
            bearish: line < -threshold && signal < -threshold && line < signal,
            crossing_up: line > 0.0 && signal < 0.0 && line > signal,
            crossing_down: line < 0.0 && signal > 0.0 && line < signal,
        }
    }

    /// Newest price below the low of the first half of the lookback range
    /// while the MACD line is still positive.
    pub fn bullish_divergence(&self, prices: &[f64], line: f64) -> bool {
        match self.divergence_range(prices) {
            Some((reference, current)) => {
                let lowest = reference.iter().copied().fold(f64::INFINITY, f64::min);
                current < lowest && line > 0.0
            }
            None => false,
        }
    }

    /// Newest price above the high of the first half of the lookback range
    /// while the MACD line is still negative.
    pub fn bearish_divergence(&self, prices: &[f64], line: f64) -> bool {
        match self.divergence_range(prices) {
            Some((reference, current)) => {
                let highest = reference.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                current > highest && line < 0.0
            }
            None => false,
        }
    }

    fn divergence_range<'a>(&self, prices: &'a [f64]) -> Option<(&'a [f64], f64)> {
        let lookback = self.divergence_lookback;
        if lookback == 0 || prices.len() < lookback * 2 {
            return None;
        }
        let recent = &prices[prices.len() - lookback * 2..];
        Some((&recent[..lookback], *recent.last()?))
    }

    /// Attach zero-cross and divergence flags to a MACD point.
    pub fn snapshot(&self, point: MacdPoint, prices: &[f64]) -> MacdSnapshot {
        MacdSnapshot {
            line: point.line,
            signal: point.signal,
            histogram: point.histogram,
            histogram_delta: point.histogram_delta,
            zero_cross: self.zero_cross(point.line, point.signal),
            bullish_divergence: self.bullish_divergence(prices, point.line),
            bearish_divergence: self.bearish_divergence(prices, point.line),
        }
    }
}

impl Indicator for Macd {
    type Output = MacdSnapshot;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        self.slow_period
    }

    fn calculate(&self, series: &[f64]) -> Option<MacdSnapshot> {
        let point = self.windowed(series)?;
        Some(self.snapshot(point, series))
    }
}

/// Incrementally maintained MACD for one symbol.
///
/// Carries EMA(12), EMA(26) and an EMA(9) signal line of the MACD line. Until
/// nine MACD values exist the signal is their mean, which is also the seed of
/// the signal EMA.
#[derive(Debug, Clone)]
pub struct MacdTracker {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    latest: Option<MacdPoint>,
}

impl Default for MacdTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MacdTracker {
    pub fn new() -> Self {
        Self::with_periods(FAST_PERIOD, SLOW_PERIOD, SIGNAL_PERIOD)
    }

    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
            latest: None,
        }
    }

    /// Feed one price. Returns the new point once the slow EMA is seeded.
    pub fn update(&mut self, price: f64) -> Option<MacdPoint> {
        let fast = self.fast.update(price);
        let slow = self.slow.update(price);
        let line = fast? - slow?;

        let signal = self
            .signal
            .update(line)
            .or_else(|| self.signal.seed_mean())
            .unwrap_or(line);
        let histogram = line - signal;
        let histogram_delta = self
            .latest
            .map(|previous| histogram - previous.histogram)
            .unwrap_or(0.0);

        let point = MacdPoint {
            line,
            signal,
            histogram,
            histogram_delta,
        };
        self.latest = Some(point);
        Some(point)
    }

    pub fn latest(&self) -> Option<MacdPoint> {
        self.latest
    }

    /// Prices fed so far.
    pub fn samples_seen(&self) -> usize {
        self.slow.seen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_line_requires_slow_period() {
        let macd = Macd::default();
        assert!(macd.line(&rising(25)).is_none());
        assert!(macd.line(&rising(26)).is_some());
    }

    #[test]
    fn test_tracker_first_point() {
        let mut tracker = MacdTracker::new();
        let prices = rising(26);
        let points: Vec<Option<MacdPoint>> = prices.iter().map(|p| tracker.update(*p)).collect();

        assert!(points[..25].iter().all(Option::is_none));
        let first = points[25].unwrap();
        // a single MACD value is its own signal
        assert_eq!(first.signal, first.line);
        assert_eq!(first.histogram, 0.0);
        assert_eq!(first.histogram_delta, 0.0);
        assert_eq!(Some(first.line), Macd::default().line(&prices));
    }

    #[test]
    fn test_tracker_line_matches_batch() {
        let prices: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.3).cos() * 4.0).collect();
        let mut tracker = MacdTracker::new();
        for p in &prices {
            tracker.update(*p);
        }
        let latest = tracker.latest().unwrap();
        assert_eq!(Some(latest.line), Macd::default().line(&prices));
        assert_eq!(tracker.samples_seen(), 60);
    }

    #[test]
    fn test_tracker_histogram_delta() {
        let prices: Vec<f64> = (0..40).map(|i| 10.0 + (i as f64 * 0.5).sin()).collect();
        let mut tracker = MacdTracker::new();
        let mut previous: Option<MacdPoint> = None;
        for p in &prices {
            if let Some(point) = tracker.update(*p) {
                if let Some(prev) = previous {
                    assert_eq!(point.histogram_delta, point.histogram - prev.histogram);
                }
                previous = Some(point);
            }
        }
    }

    #[test]
    fn test_windowed_constant_series_is_flat() {
        let point = Macd::default().windowed(&[42.0; 40]).unwrap();
        assert_eq!(point.line, 0.0);
        assert_eq!(point.signal, 0.0);
        assert_eq!(point.histogram, 0.0);
        assert_eq!(point.histogram_delta, 0.0);
    }

    #[test]
    fn test_windowed_delta_zero_at_minimum() {
        let point = Macd::default().windowed(&rising(26)).unwrap();
        assert_eq!(point.histogram_delta, 0.0);
    }

    #[test]
    fn test_zero_cross_flags() {
        let macd = Macd::default();

        let bullish = macd.zero_cross(0.01, 0.005);
        assert!(bullish.bullish && !bullish.crossing_up);

        let crossing = macd.zero_cross(0.002, -0.001);
        assert!(crossing.crossing_up && !crossing.bullish);

        let down = macd.zero_cross(-0.002, 0.001);
        assert!(down.crossing_down && !down.bearish);

        let inside = macd.zero_cross(0.0004, 0.0001);
        assert_eq!(inside, ZeroCross::default());
    }

    #[test]
    fn test_divergence() {
        let macd = Macd::default();
        let mut prices = vec![10.0, 9.5, 9.8, 9.7, 9.6, 9.9, 9.8, 9.7, 9.6];
        prices.push(9.4);

        assert!(macd.bullish_divergence(&prices, 0.1));
        assert!(!macd.bullish_divergence(&prices, -0.1));
        assert!(!macd.bearish_divergence(&prices, -0.1));
        assert!(!macd.bullish_divergence(&prices[..9], 0.1));
    }
}
