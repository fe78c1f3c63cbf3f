//! Tests for signal generation
//!
//! Tests cover:
//! - Turning point scoring
//! - Turning point override of the regular classifier
//! - Regular condition grading
//! - Trend analysis and snapshot assembly over a window

use trendwatch::config::TrendConfig;
use trendwatch::services::signals::indicators::MacdTracker;
use trendwatch::services::signals::turning_point::{
    BULLISH_DIVERGENCE, PRICE_DECLINE, ZERO_CROSS_UP,
};
use trendwatch::services::signals::{
    SignalGenerator, SnapshotBuilder, TrendAnalyzer, TurningPointDetector,
};
use trendwatch::services::window::{RetentionPolicy, RollingWindow};
use trendwatch::types::*;

fn macd(histogram: f64) -> MacdSnapshot {
    MacdSnapshot {
        line: 0.0,
        signal: -histogram,
        histogram,
        histogram_delta: 0.0,
        zero_cross: ZeroCross::default(),
        bullish_divergence: false,
        bearish_divergence: false,
    }
}

/// Snapshot at `price` with the given EMA pair, momentum ratio, MACD and RSI.
fn snapshot(
    price: f64,
    ema: (f64, f64),
    momentum: f64,
    macd: Option<MacdSnapshot>,
    rsi: Option<f64>,
) -> IndicatorSnapshot {
    IndicatorSnapshot {
        current_price: price,
        timestamp: 1_700_000_000_000,
        data_points: 30,
        sma: SmaSet {
            short: price,
            medium: price,
            long: price / momentum,
        },
        ema: EmaPair {
            fast: ema.0,
            slow: ema.1,
        },
        macd,
        rsi,
        bollinger: None,
        kdj: None,
        long_momentum_ratio: Some(momentum),
    }
}

fn neutral_snapshot() -> IndicatorSnapshot {
    snapshot(100.0, (100.0, 100.0), 1.0, Some(macd(0.0)), Some(50.0))
}

fn generator() -> SignalGenerator {
    SignalGenerator::from_config(&TrendConfig::default())
}

fn window(prices: &[f64]) -> (RollingWindow, MacdTracker) {
    let policy = RetentionPolicy::default();
    let mut window = RollingWindow::new();
    let mut tracker = MacdTracker::new();
    for (i, price) in prices.iter().enumerate() {
        window.push(PriceSample::new(*price, i as i64 * 10_000), &policy);
        tracker.update(*price);
    }
    (window, tracker)
}

// =============================================================================
// Turning Point Tests
// =============================================================================

mod turning_point_tests {
    use super::*;

    #[test]
    fn test_bottom_from_divergence_and_zero_cross() {
        let mut macd = macd(0.0);
        macd.bullish_divergence = true;
        macd.zero_cross.crossing_up = true;
        let snap = snapshot(100.0, (100.0, 100.0), 1.0, Some(macd), None);

        let result = TurningPointDetector::new().detect(&snap, &[100.0; 12]).unwrap();
        assert!(result.potential_bottom);
        assert!(!result.potential_top);
        assert_eq!(result.bottom_confidence, 55);
        assert_eq!(result.top_confidence, 0);
        assert_eq!(result.reasons, vec![BULLISH_DIVERGENCE, ZERO_CROSS_UP]);

        let flags = result.supporting_indicators.bottom.unwrap();
        assert!(flags.macd_divergence && flags.macd_zero_cross);
        assert!(result.supporting_indicators.top.is_none());
    }

    #[test]
    fn test_single_condition_is_not_enough() {
        let mut macd = macd(0.0);
        macd.bullish_divergence = true;
        let snap = snapshot(100.0, (100.0, 100.0), 1.0, Some(macd), None);

        let result = TurningPointDetector::new().detect(&snap, &[100.0; 12]).unwrap();
        assert!(!result.potential_bottom);
        assert_eq!(result.bottom_confidence, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_top_from_decline_and_histogram_reversal() {
        let mut macd = macd(0.002);
        macd.histogram_delta = -0.001;
        let snap = snapshot(95.0, (100.0, 100.0), 1.0, Some(macd), None);
        let mut prices = vec![100.0; 11];
        prices.push(95.0);

        let result = TurningPointDetector::new().detect(&snap, &prices).unwrap();
        assert!(result.potential_top);
        assert_eq!(result.top_confidence, 35);
        assert_eq!(result.reasons[0], PRICE_DECLINE);
    }

    #[test]
    fn test_unavailable_without_macd() {
        let snap = snapshot(100.0, (100.0, 100.0), 1.0, None, None);
        assert!(TurningPointDetector::new().detect(&snap, &[100.0; 12]).is_none());
    }
}

// =============================================================================
// Signal Generator Tests
// =============================================================================

mod generator_tests {
    use super::*;

    fn bottom(confidence: u32) -> TurningPointResult {
        TurningPointResult {
            potential_bottom: true,
            bottom_confidence: confidence,
            reasons: vec![BULLISH_DIVERGENCE.to_string(), ZERO_CROSS_UP.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_bottom_override_conviction() {
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(bottom(75)));
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, Confidence::Conviction);
        assert_eq!(signal.signal_type, SignalType::TurningPoint);
        assert_eq!(signal.reasons[0], "Bottom turning point (confidence: 75)");
        assert_eq!(signal.reasons.len(), 3);
        assert!(signal.is_actionable());
    }

    #[test]
    fn test_bottom_override_high() {
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(bottom(55)));
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, Confidence::High);
    }

    #[test]
    fn test_override_needs_more_than_fifty() {
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(bottom(50)));
        assert_eq!(signal.signal_type, SignalType::Regular);
        assert!(signal.conditions.potential_bottom);
    }

    #[test]
    fn test_bottom_takes_precedence_over_top() {
        let both = TurningPointResult {
            potential_top: true,
            top_confidence: 80,
            ..bottom(55)
        };
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(both));
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, Confidence::High);
    }

    #[test]
    fn test_top_override() {
        let top = TurningPointResult {
            potential_top: true,
            top_confidence: 60,
            ..Default::default()
        };
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(top));
        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.confidence, Confidence::High);
        assert_eq!(signal.reasons[0], "Top turning point (confidence: 60)");
    }

    #[test]
    fn test_regular_buy_conviction() {
        let snap = snapshot(106.0, (105.0, 100.0), 1.05, Some(macd(0.002)), Some(60.0));
        let signal = generator().generate("ETHUSDT", snap, None);

        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, Confidence::Conviction);
        assert_eq!(signal.signal_type, SignalType::Regular);
        assert!(signal.conditions.long_momentum);
        assert!(signal.conditions.ema_bullish);
        assert!(signal.conditions.macd_bullish);
        assert!(signal.conditions.rsi_not_overbought);
        assert_eq!(signal.label(), "BUY (CONVICTION)");
    }

    #[test]
    fn test_regular_sell_high() {
        let snap = snapshot(94.0, (95.0, 100.0), 0.97, Some(macd(-0.0005)), Some(40.0));
        let signal = generator().generate("ETHUSDT", snap, None);

        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.confidence, Confidence::High);
        assert!(signal.conditions.short_momentum);
        assert!(signal.conditions.ema_bearish);
        assert!(signal.conditions.macd_bearish);
        assert!(signal.conditions.rsi_not_oversold);
    }

    #[test]
    fn test_ema_alignment_requires_price_above_fast() {
        let snap = snapshot(104.0, (105.0, 100.0), 1.0, None, None);
        let signal = generator().generate("ETHUSDT", snap, None);
        assert!(!signal.conditions.ema_bullish);
    }

    #[test]
    fn test_unavailable_inputs_disable_conditions() {
        let snap = snapshot(106.0, (105.0, 100.0), 1.05, None, None);
        let signal = generator().generate("ETHUSDT", snap, None);

        assert!(!signal.conditions.macd_bullish && !signal.conditions.macd_bearish);
        assert!(!signal.conditions.rsi_not_overbought && !signal.conditions.rsi_not_oversold);
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, Confidence::Medium);
        assert!(!signal.is_actionable());
    }

    #[test]
    fn test_signal_serializes_action_as_signal() {
        let signal = generator().generate("BTCUSDT", neutral_snapshot(), Some(bottom(75)));
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["signal"], "BUY");
        assert_eq!(json["confidence"], "CONVICTION");
        assert_eq!(json["signalType"], "TURNING_POINT");
        assert_eq!(json["turningPoints"]["bottomConfidence"], 75);
    }
}

// =============================================================================
// Window Analysis Tests
// =============================================================================

mod analysis_tests {
    use super::*;

    #[test]
    fn test_trend_analysis_downtrend() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let (window, _) = window(&prices);
        let analysis = TrendAnalyzer::new(&TrendConfig::default())
            .analyze("SOLUSDT", &window)
            .unwrap();

        assert_eq!(analysis.direction, TrendDirection::Downtrend);
        assert_eq!(analysis.start_price, 100.0);
        assert_eq!(analysis.current_price, 81.0);
        assert!(analysis.price_change < 0.0);
        // only losses in the trailing deltas
        assert_eq!(analysis.rsi, Some(0.0));
    }

    #[test]
    fn test_snapshot_requires_macd_minimum() {
        let (window, tracker) = window(&[100.0; 25]);
        let err = SnapshotBuilder::new(&TrendConfig::default())
            .build(&window, &tracker)
            .unwrap_err();
        assert!(err.is_data_insufficient());
    }

    #[test]
    fn test_snapshot_is_repeatable() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 / 3.0).sin() * 4.0).collect();
        let (window, tracker) = window(&prices);
        let builder = SnapshotBuilder::new(&TrendConfig::default());

        let first = builder.build(&window, &tracker).unwrap();
        let second = builder.build(&window, &tracker).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.data_points, 40);
        assert_eq!(first.current_price, *prices.last().unwrap());
        assert!(first.macd.is_some());
        assert!(first.rsi.is_some());
        assert!(first.bollinger.is_some());
    }

    #[test]
    fn test_windowed_macd_mode() {
        let mut config = TrendConfig::default();
        config.enhanced_trend.macd_signal_mode = trendwatch::config::MacdSignalMode::Windowed;
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let (window, tracker) = window(&prices);

        let snap = SnapshotBuilder::new(&config).build(&window, &tracker).unwrap();
        let incremental = SnapshotBuilder::new(&TrendConfig::default())
            .build(&window, &tracker)
            .unwrap();

        let (windowed, tracked) = (snap.macd.unwrap(), incremental.macd.unwrap());
        assert!((windowed.line - tracked.line).abs() < 1e-9);
    }
}
