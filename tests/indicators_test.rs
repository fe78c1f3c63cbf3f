//! Tests for the technical indicators and the rolling window
//!
//! Tests cover:
//! - SMA / EMA seeding and incremental equivalence
//! - RSI over price deltas
//! - MACD tracker and windowed recomputation
//! - Bollinger Bands and KDJ
//! - Window retention and delta bookkeeping

use trendwatch::config::TrendConfig;
use trendwatch::services::signals::indicators::*;
use trendwatch::services::window::{RetentionPolicy, RollingWindow};
use trendwatch::types::*;

fn rising(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

// =============================================================================
// SMA / EMA Tests
// =============================================================================

mod moving_average_tests {
    use super::*;

    #[test]
    fn test_sma_mean_and_trailing() {
        assert_eq!(Sma::mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(Sma::trailing(&[1.0, 2.0, 3.0, 4.0, 5.0], 2), Some(4.5));
        assert_eq!(Sma::mean(&[0.0; 0]), None);
        assert_eq!(Sma::trailing(&[1.0], 2), Some(1.0));
    }

    #[test]
    fn test_sma_indicator_trait() {
        let sma = Sma::new(3);
        assert_eq!(sma.min_periods(), 3);
        assert_eq!(sma.calculate(&[1.0, 2.0, 3.0, 6.0]), Some(11.0 / 3.0));
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        // seed = mean(1, 2, 3) = 2, then (4 - 2) * 0.5 + 2
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0, 3.0], 3), Some(2.0));
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0, 3.0, 4.0], 3), Some(3.0));
        assert_eq!(Ema::calculate_ema(&[1.0, 2.0], 3), None);
    }

    #[test]
    fn test_ema_state_matches_batch() {
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let mut state = EmaState::new(12);
        for price in &prices {
            state.update(*price);
        }
        let batch = Ema::calculate_ema(&prices, 12).unwrap();
        assert!((state.value().unwrap() - batch).abs() < 1e-12);
        assert_eq!(state.seen(), 40);
    }
}

// =============================================================================
// RSI Tests
// =============================================================================

mod rsi_tests {
    use super::*;

    #[test]
    fn test_rsi_needs_period_deltas() {
        assert!(Rsi::from_deltas(&[1.0; 13], 14).is_none());
        assert!(Rsi::from_deltas(&[1.0; 14], 14).is_some());
    }

    #[test]
    fn test_rsi_only_gains_is_100() {
        assert_eq!(Rsi::from_deltas(&[0.5; 20], 14), Some(100.0));
    }

    #[test]
    fn test_rsi_balanced_is_50() {
        let deltas: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rsi = Rsi::from_deltas(&deltas, 14).unwrap();
        assert!((rsi - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_uses_trailing_deltas_only() {
        let mut deltas = vec![-5.0; 10];
        deltas.extend([1.0; 14]);
        assert_eq!(Rsi::from_deltas(&deltas, 14), Some(100.0));
    }
}

// =============================================================================
// MACD Tests
// =============================================================================

mod macd_tests {
    use super::*;

    #[test]
    fn test_tracker_starts_at_slow_period() {
        let mut tracker = MacdTracker::new();
        for price in rising(25) {
            assert!(tracker.update(price).is_none());
        }
        let first = tracker.update(125.0).unwrap();
        // signal equals the only line value seen so far
        assert!((first.histogram).abs() < 1e-12);
        assert_eq!(first.histogram_delta, 0.0);
        assert_eq!(tracker.samples_seen(), 26);
    }

    #[test]
    fn test_tracker_line_matches_batch_line() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 / 4.0).cos() * 5.0).collect();
        let mut tracker = MacdTracker::new();
        for price in &prices {
            tracker.update(*price);
        }
        let batch = Macd::default().line(&prices).unwrap();
        assert!((tracker.latest().unwrap().line - batch).abs() < 1e-9);
    }

    #[test]
    fn test_windowed_requires_slow_period() {
        let macd = Macd::default();
        assert!(macd.windowed(&rising(25)).is_none());
        let point = macd.windowed(&rising(26)).unwrap();
        assert_eq!(point.histogram_delta, 0.0);
    }

    #[test]
    fn test_constant_series_is_flat() {
        let point = Macd::default().windowed(&[42.0; 40]).unwrap();
        assert!(point.line.abs() < 1e-12);
        assert!(point.signal.abs() < 1e-12);
        assert!(point.histogram.abs() < 1e-12);
    }

    #[test]
    fn test_uptrend_line_is_positive() {
        let point = Macd::default().windowed(&rising(40)).unwrap();
        assert!(point.line > 0.0);
    }

    #[test]
    fn test_zero_cross_flags() {
        let macd = Macd::default();
        let bullish = macd.zero_cross(0.01, 0.005);
        assert!(bullish.bullish && !bullish.bearish);

        let crossing = macd.zero_cross(0.001, -0.001);
        assert!(crossing.crossing_up && !crossing.crossing_down);

        let below_threshold = macd.zero_cross(0.0004, 0.0001);
        assert!(!below_threshold.bullish);
    }

    #[test]
    fn test_divergence() {
        let macd = Macd::default();
        let falling = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 9.0];
        assert!(macd.bullish_divergence(&falling, 0.1));
        assert!(!macd.bullish_divergence(&falling, -0.1));

        let climbing = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 11.0];
        assert!(macd.bearish_divergence(&climbing, -0.1));
        assert!(!macd.bearish_divergence(&climbing[..9], -0.1));
    }
}

// =============================================================================
// Bollinger / KDJ Tests
// =============================================================================

mod band_tests {
    use super::*;

    #[test]
    fn test_bollinger_flat_series() {
        let bands = BollingerBands::default().calculate(&[10.0; 20]).unwrap();
        assert_eq!(bands.upper, 10.0);
        assert_eq!(bands.lower, 10.0);
        assert_eq!(bands.bandwidth_pct, 0.0);
        assert!(bands.squeeze);
    }

    #[test]
    fn test_bollinger_symmetric_bands() {
        let prices: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 9.0 } else { 11.0 }).collect();
        let bands = BollingerBands::default().calculate(&prices).unwrap();
        // population std dev of +/-1 around 10 is 1
        assert!((bands.middle - 10.0).abs() < 1e-12);
        assert!((bands.upper - 12.0).abs() < 1e-12);
        assert!((bands.lower - 8.0).abs() < 1e-12);
        assert!(!bands.squeeze);
    }

    #[test]
    fn test_bollinger_unavailable_on_zero_mean() {
        assert!(BollingerBands::default().calculate(&[0.0; 20]).is_none());
    }

    #[test]
    fn test_kdj_on_rising_series() {
        let kdj = Kdj::default().calculate(&rising(12)).unwrap();
        assert_eq!(kdj.k, 100.0);
        assert_eq!(kdj.j, 100.0);
        assert!(kdj.overbought);
        assert!(!kdj.oversold);
    }

    #[test]
    fn test_recursive_kdj_is_smoothed() {
        let config = trendwatch::config::KdjConfig {
            recursive: true,
            ..Default::default()
        };
        let kdj = Kdj::from_config(&config).calculate(&rising(9)).unwrap();
        // one window: K = (2 * 50 + 100) / 3
        assert!((kdj.k - 200.0 / 3.0).abs() < 1e-9);
        assert!(kdj.k > kdj.d);
    }
}

// =============================================================================
// Rolling Window Tests
// =============================================================================

mod window_tests {
    use super::*;

    #[test]
    fn test_retention_from_config() {
        let policy = RetentionPolicy::from_config(&TrendConfig::default());
        assert_eq!(policy.retention_ms, 2_700_000);
    }

    #[test]
    fn test_expired_samples_are_pruned() {
        let policy = RetentionPolicy::default();
        let mut window = RollingWindow::new();
        window.push(PriceSample::new(1.0, 0), &policy);
        window.push(PriceSample::new(2.0, 1_000), &policy);

        let outcome = window.push(PriceSample::new(3.0, policy.retention_ms + 500), &policy);
        assert_eq!(outcome.expired, 1);
        assert_eq!(window.prices(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_deltas_follow_samples() {
        let policy = RetentionPolicy::default();
        let mut window = RollingWindow::new();
        for (i, price) in [10.0, 12.0, 11.0].iter().enumerate() {
            window.push(PriceSample::new(*price, i as i64), &policy);
        }
        assert_eq!(window.deltas(), &[2.0, -1.0]);
        assert_eq!(window.latest().map(|s| s.price), Some(11.0));
        assert_eq!(window.first().map(|s| s.price), Some(10.0));
    }
}
