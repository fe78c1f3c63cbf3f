//! Trading signal generation.
//!
//! Turning points take priority: a bottom or top scored above 50 overrides the
//! regular classifier. Otherwise four bullish and four bearish conditions are
//! counted and graded into MEDIUM, HIGH or CONVICTION, falling back to HOLD.

use crate::config::TrendConfig;
use crate::types::{
    Confidence, IndicatorSnapshot, SignalAction, SignalConditions, SignalType, TradingSignal,
    TurningPointResult,
};

/// Turning-point confidence that must be exceeded to override.
const TURNING_POINT_OVERRIDE: u32 = 50;
/// Turning-point confidence above which the override is CONVICTION.
const TURNING_POINT_CONVICTION: u32 = 70;
/// EMA spread, relative to price, below which the market may be neutral.
const NEUTRAL_EMA_SPREAD: f64 = 0.01;
const NEUTRAL_RSI_LOW: f64 = 40.0;
const NEUTRAL_RSI_HIGH: f64 = 60.0;

/// Thresholds used by the regular classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub long_momentum: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_hist_weak: f64,
    pub macd_hist_strong: f64,
}

impl SignalThresholds {
    pub fn from_config(config: &TrendConfig) -> Self {
        Self {
            long_momentum: config.enhanced_trend.long_momentum_threshold,
            rsi_overbought: config.rsi_overbought,
            rsi_oversold: config.rsi_oversold,
            macd_hist_weak: config.enhanced_trend.macd_hist_weak,
            macd_hist_strong: config.enhanced_trend.macd_hist_strong,
        }
    }
}

/// Stateless signal classifier.
pub struct SignalGenerator {
    thresholds: SignalThresholds,
}

impl SignalGenerator {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &TrendConfig) -> Self {
        Self::new(SignalThresholds::from_config(config))
    }

    /// Evaluate the regular condition set. Unavailable inputs fail every
    /// condition that depends on them.
    pub fn conditions(
        &self,
        snapshot: &IndicatorSnapshot,
        turning_points: Option<&TurningPointResult>,
    ) -> SignalConditions {
        let t = &self.thresholds;
        let price = snapshot.current_price;
        let ema = snapshot.ema;
        let momentum = snapshot.long_momentum_ratio;
        let histogram = snapshot.macd.map(|m| m.histogram);

        SignalConditions {
            long_momentum: momentum.map_or(false, |r| r > 1.0 + t.long_momentum),
            ema_bullish: ema.fast > ema.slow && price > ema.fast,
            macd_bullish: histogram.map_or(false, |h| h >= t.macd_hist_weak),
            rsi_not_overbought: snapshot.rsi.map_or(false, |r| r < t.rsi_overbought),
            short_momentum: momentum.map_or(false, |r| r < 1.0 - t.long_momentum),
            ema_bearish: ema.fast < ema.slow && price < ema.fast,
            macd_bearish: histogram.map_or(false, |h| h <= t.macd_hist_weak),
            rsi_not_oversold: snapshot.rsi.map_or(false, |r| r > t.rsi_oversold),
            potential_bottom: turning_points.map_or(false, |tp| tp.potential_bottom),
            potential_top: turning_points.map_or(false, |tp| tp.potential_top),
        }
    }

    /// Produce the signal for one tick.
    pub fn generate(
        &self,
        symbol: &str,
        snapshot: IndicatorSnapshot,
        turning_points: Option<TurningPointResult>,
    ) -> TradingSignal {
        let conditions = self.conditions(&snapshot, turning_points.as_ref());

        let (action, confidence, signal_type, reasons) =
            match Self::turning_point_override(&conditions, turning_points.as_ref()) {
                Some((action, confidence, reasons)) => {
                    (action, confidence, SignalType::TurningPoint, reasons)
                }
                None => {
                    let (action, confidence, reasons) = self.classify(&snapshot, &conditions);
                    (action, confidence, SignalType::Regular, reasons)
                }
            };

        TradingSignal {
            symbol: symbol.to_string(),
            action,
            confidence,
            signal_type,
            reasons,
            conditions,
            technicals: snapshot,
            turning_points,
        }
    }

    fn turning_point_override(
        conditions: &SignalConditions,
        turning_points: Option<&TurningPointResult>,
    ) -> Option<(SignalAction, Confidence, Vec<String>)> {
        let tp = turning_points?;

        let grade = |score: u32| {
            if score > TURNING_POINT_CONVICTION {
                Confidence::Conviction
            } else {
                Confidence::High
            }
        };
        let reasons = |label: String| {
            let mut reasons = vec![label];
            reasons.extend(tp.reasons.iter().cloned());
            reasons
        };

        if conditions.potential_bottom && tp.bottom_confidence > TURNING_POINT_OVERRIDE {
            return Some((
                SignalAction::Buy,
                grade(tp.bottom_confidence),
                reasons(format!("Bottom turning point (confidence: {})", tp.bottom_confidence)),
            ));
        }
        if conditions.potential_top && tp.top_confidence > TURNING_POINT_OVERRIDE {
            return Some((
                SignalAction::Sell,
                grade(tp.top_confidence),
                reasons(format!("Top turning point (confidence: {})", tp.top_confidence)),
            ));
        }
        None
    }

    fn classify(
        &self,
        snapshot: &IndicatorSnapshot,
        c: &SignalConditions,
    ) -> (SignalAction, Confidence, Vec<String>) {
        let t = &self.thresholds;
        let histogram = snapshot.macd.map(|m| m.histogram);
        let momentum = snapshot.long_momentum_ratio;

        let bullish = [c.long_momentum, c.ema_bullish, c.macd_bullish, c.rsi_not_overbought]
            .iter()
            .filter(|hit| **hit)
            .count();
        let bearish = [c.short_momentum, c.ema_bearish, c.macd_bearish, c.rsi_not_oversold]
            .iter()
            .filter(|hit| **hit)
            .count();

        let strong_bullish_macd = histogram.map_or(false, |h| h >= t.macd_hist_strong);
        let strong_bearish_macd = histogram.map_or(false, |h| h <= -t.macd_hist_strong);
        let very_bullish_momentum = momentum.map_or(false, |r| r > 1.0 + t.long_momentum * 2.0);
        let very_bearish_momentum = momentum.map_or(false, |r| r < 1.0 - t.long_momentum * 2.0);

        let very_strong_bullish = bullish >= 3 && (strong_bullish_macd || very_bullish_momentum);
        let very_strong_bearish = bearish >= 3 && (strong_bearish_macd || very_bearish_momentum);

        let reasons = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        if very_strong_bullish {
            (
                SignalAction::Buy,
                Confidence::Conviction,
                reasons(&[
                    "Strong bullish momentum",
                    "EMA bullish alignment",
                    "MACD bullish",
                    "RSI healthy",
                ]),
            )
        } else if bullish >= 3 {
            (
                SignalAction::Buy,
                Confidence::High,
                reasons(&["Clear bullish momentum", "EMA supports upside", "MACD strengthening"]),
            )
        } else if bullish >= 2 {
            (
                SignalAction::Buy,
                Confidence::Medium,
                reasons(&["Early bullish signal", "Indicators lean bullish"]),
            )
        } else if very_strong_bearish {
            (
                SignalAction::Sell,
                Confidence::Conviction,
                reasons(&[
                    "Strong bearish momentum",
                    "EMA bearish alignment",
                    "MACD bearish",
                    "RSI healthy",
                ]),
            )
        } else if bearish >= 3 {
            (
                SignalAction::Sell,
                Confidence::High,
                reasons(&["Clear bearish momentum", "EMA supports downside", "MACD weakening"]),
            )
        } else if bearish >= 2 {
            (
                SignalAction::Sell,
                Confidence::Medium,
                reasons(&["Early bearish signal", "Indicators lean bearish"]),
            )
        } else if self.is_neutral_market(snapshot) {
            (
                SignalAction::Hold,
                Confidence::Medium,
                reasons(&["Range-bound market", "No clear trend", "Waiting for breakout"]),
            )
        } else {
            (
                SignalAction::Hold,
                Confidence::Low,
                reasons(&["Conflicting signals", "Needs more confirmation"]),
            )
        }
    }

    /// Momentum near 1, tight EMAs, small histogram and mid-range RSI.
    fn is_neutral_market(&self, snapshot: &IndicatorSnapshot) -> bool {
        let t = &self.thresholds;
        let (Some(ratio), Some(macd), Some(rsi)) =
            (snapshot.long_momentum_ratio, snapshot.macd, snapshot.rsi)
        else {
            return false;
        };
        if snapshot.current_price == 0.0 {
            return false;
        }

        (ratio - 1.0).abs() < t.long_momentum * 0.5
            && snapshot.ema.spread().abs() / snapshot.current_price < NEUTRAL_EMA_SPREAD
            && macd.histogram.abs() < t.macd_hist_strong * 0.5
            && (NEUTRAL_RSI_LOW..=NEUTRAL_RSI_HIGH).contains(&rsi)
    }
}
