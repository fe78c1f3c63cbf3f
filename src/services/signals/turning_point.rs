//! Turning point detection.
//!
//! Scores bottom and top formations as weighted condition votes. A side fires
//! only when at least two of its conditions hold; its confidence is the sum of
//! the fired weights.

use crate::types::{IndicatorSnapshot, TurningPointFlags, TurningPointResult};

/// Minimum window length for detection.
pub const MIN_HISTORY: usize = 10;
const RECENT_SAMPLES: usize = 5;
/// Percent move off the recent extreme that counts as recovery or decline.
const PRICE_MOVE_PCT: f64 = 2.0;
const MIN_CONDITIONS: usize = 2;

pub const WEIGHT_DIVERGENCE: u32 = 30;
pub const WEIGHT_ZERO_CROSS: u32 = 25;
pub const WEIGHT_PRICE_MOVE: u32 = 20;
pub const WEIGHT_HISTOGRAM_REVERSAL: u32 = 15;
pub const WEIGHT_BOLLINGER_UPPER: u32 = 10;

pub const BULLISH_DIVERGENCE: &str = "MACD bullish divergence";
pub const ZERO_CROSS_UP: &str = "MACD zero-line cross up";
pub const PRICE_RECOVERY: &str = "Price recovery";
pub const HISTOGRAM_REVERSAL: &str = "MACD histogram reversal";
pub const BEARISH_DIVERGENCE: &str = "MACD bearish divergence";
pub const ZERO_CROSS_DOWN: &str = "MACD zero-line cross down";
pub const PRICE_DECLINE: &str = "Price decline";
pub const BOLLINGER_UPPER: &str = "Bollinger upper band pressure";

/// Result of evaluating one side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SideScore {
    found: bool,
    confidence: u32,
    reasons: Vec<String>,
    flags: TurningPointFlags,
}

impl SideScore {
    fn from_conditions(conditions: &[(bool, &str, u32)], flags: TurningPointFlags) -> Self {
        let fired: Vec<&(bool, &str, u32)> = conditions.iter().filter(|(hit, _, _)| *hit).collect();
        if fired.len() < MIN_CONDITIONS {
            return Self {
                flags,
                ..Self::default()
            };
        }
        Self {
            found: true,
            confidence: fired.iter().map(|(_, _, weight)| weight).sum(),
            reasons: fired.iter().map(|(_, name, _)| name.to_string()).collect(),
            flags,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TurningPointDetector;

impl TurningPointDetector {
    pub fn new() -> Self {
        Self
    }

    /// Score the newest sample. `None` when MACD is unavailable or the window is
    /// shorter than [`MIN_HISTORY`].
    pub fn detect(&self, snapshot: &IndicatorSnapshot, prices: &[f64]) -> Option<TurningPointResult> {
        if prices.len() < MIN_HISTORY || snapshot.macd.is_none() {
            return None;
        }

        let bottom = self.bottom(snapshot, prices)?;
        let top = self.top(snapshot, prices)?;

        let mut result = TurningPointResult::default();
        if bottom.found {
            result.potential_bottom = true;
            result.bottom_confidence = bottom.confidence;
            result.reasons.extend(bottom.reasons);
            result.supporting_indicators.bottom = Some(bottom.flags);
        }
        if top.found {
            result.potential_top = true;
            result.top_confidence = top.confidence;
            result.reasons.extend(top.reasons);
            result.supporting_indicators.top = Some(top.flags);
        }
        Some(result)
    }

    fn recent(prices: &[f64]) -> &[f64] {
        &prices[prices.len().saturating_sub(RECENT_SAMPLES)..]
    }

    /// Percent move of `current` from `reference`, unavailable for a
    /// non-positive reference.
    fn move_pct(current: f64, reference: f64) -> Option<f64> {
        (reference > 0.0 && reference.is_finite()).then(|| (current - reference) / reference * 100.0)
    }

    fn bottom(&self, snapshot: &IndicatorSnapshot, prices: &[f64]) -> Option<SideScore> {
        let macd = snapshot.macd.as_ref()?;
        let current = snapshot.current_price;

        let lowest = Self::recent(prices).iter().copied().fold(f64::INFINITY, f64::min);
        let recovery_pct = Self::move_pct(current, lowest);

        let flags = TurningPointFlags {
            macd_divergence: macd.bullish_divergence,
            macd_zero_cross: macd.zero_cross.crossing_up,
            price_move: recovery_pct.map_or(false, |pct| pct > PRICE_MOVE_PCT),
            histogram_reversal: macd.histogram_delta > 0.0 && macd.histogram < 0.0,
            bollinger_upper: false,
        };

        Some(SideScore::from_conditions(
            &[
                (flags.macd_divergence, BULLISH_DIVERGENCE, WEIGHT_DIVERGENCE),
                (flags.macd_zero_cross, ZERO_CROSS_UP, WEIGHT_ZERO_CROSS),
                (flags.price_move, PRICE_RECOVERY, WEIGHT_PRICE_MOVE),
                (flags.histogram_reversal, HISTOGRAM_REVERSAL, WEIGHT_HISTOGRAM_REVERSAL),
            ],
            flags,
        ))
    }

    fn top(&self, snapshot: &IndicatorSnapshot, prices: &[f64]) -> Option<SideScore> {
        let macd = snapshot.macd.as_ref()?;
        let current = snapshot.current_price;

        let highest = Self::recent(prices).iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let decline_pct = Self::move_pct(current, highest);

        let flags = TurningPointFlags {
            macd_divergence: macd.bearish_divergence,
            macd_zero_cross: macd.zero_cross.crossing_down,
            price_move: decline_pct.map_or(false, |pct| pct < -PRICE_MOVE_PCT),
            histogram_reversal: macd.histogram_delta < 0.0 && macd.histogram > 0.0,
            bollinger_upper: snapshot
                .bollinger
                .map(|bands| current >= bands.upper)
                .unwrap_or(false),
        };

        Some(SideScore::from_conditions(
            &[
                (flags.macd_divergence, BEARISH_DIVERGENCE, WEIGHT_DIVERGENCE),
                (flags.macd_zero_cross, ZERO_CROSS_DOWN, WEIGHT_ZERO_CROSS),
                (flags.price_move, PRICE_DECLINE, WEIGHT_PRICE_MOVE),
                (flags.histogram_reversal, HISTOGRAM_REVERSAL, WEIGHT_HISTOGRAM_REVERSAL),
                (flags.bollinger_upper, BOLLINGER_UPPER, WEIGHT_BOLLINGER_UPPER),
            ],
            flags,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BollingerSnapshot, EmaPair, MacdSnapshot, SmaSet, ZeroCross};

    fn snapshot(price: f64, macd: Option<MacdSnapshot>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            current_price: price,
            timestamp: 0,
            data_points: 30,
            sma: SmaSet {
                short: price,
                medium: price,
                long: price,
            },
            ema: EmaPair {
                fast: price,
                slow: price,
            },
            macd,
            rsi: None,
            bollinger: None,
            kdj: None,
            long_momentum_ratio: Some(1.0),
        }
    }

    fn macd(histogram: f64, histogram_delta: f64) -> MacdSnapshot {
        MacdSnapshot {
            line: -0.1,
            signal: -0.1 - histogram,
            histogram,
            histogram_delta,
            zero_cross: ZeroCross::default(),
            bullish_divergence: false,
            bearish_divergence: false,
        }
    }

    #[test]
    fn test_requires_macd_and_history() {
        let detector = TurningPointDetector::new();
        let prices = vec![100.0; 12];
        assert!(detector.detect(&snapshot(100.0, None), &prices).is_none());
        assert!(detector
            .detect(&snapshot(100.0, Some(macd(0.0, 0.0))), &prices[..9])
            .is_none());
    }

    #[test]
    fn test_single_condition_does_not_fire() {
        let detector = TurningPointDetector::new();
        let mut prices = vec![100.0; 10];
        prices.push(103.0);
        let result = detector
            .detect(&snapshot(103.0, Some(macd(0.0, 0.0))), &prices)
            .unwrap();
        assert!(!result.potential_bottom);
        assert_eq!(result.bottom_confidence, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_recovery_and_histogram_reversal_fire_bottom() {
        let detector = TurningPointDetector::new();
        let mut prices = vec![100.0; 10];
        prices.extend([95.0, 96.0, 97.5]);
        let result = detector
            .detect(&snapshot(97.5, Some(macd(-0.2, 0.05))), &prices)
            .unwrap();

        assert!(result.potential_bottom);
        assert_eq!(result.bottom_confidence, 35);
        assert_eq!(result.reasons, vec![PRICE_RECOVERY, HISTOGRAM_REVERSAL]);
        let flags = result.supporting_indicators.bottom.unwrap();
        assert!(flags.price_move && flags.histogram_reversal && !flags.macd_divergence);
    }

    #[test]
    fn test_top_with_bollinger_pressure() {
        let detector = TurningPointDetector::new();
        let prices = vec![100.0; 12];
        let mut snap = snapshot(100.0, Some(macd(0.3, -0.1)));
        snap.bollinger = Some(BollingerSnapshot {
            upper: 99.0,
            middle: 95.0,
            lower: 91.0,
            bandwidth_pct: 8.4,
            squeeze: true,
        });

        let result = detector.detect(&snap, &prices).unwrap();
        assert!(result.potential_top);
        assert_eq!(result.top_confidence, 25);
        assert_eq!(result.reasons, vec![HISTOGRAM_REVERSAL, BOLLINGER_UPPER]);
    }

    #[test]
    fn test_both_sides_reason_order() {
        let detector = TurningPointDetector::new();
        let mut m = macd(0.0, 0.0);
        m.bullish_divergence = true;
        m.bearish_divergence = true;
        m.zero_cross.crossing_up = true;
        m.zero_cross.crossing_down = true;
        let prices = vec![100.0; 12];

        let result = detector.detect(&snapshot(100.0, Some(m)), &prices).unwrap();
        assert!(result.potential_bottom && result.potential_top);
        assert_eq!(result.bottom_confidence, 55);
        assert_eq!(result.top_confidence, 55);
        assert_eq!(
            result.reasons,
            vec![BULLISH_DIVERGENCE, ZERO_CROSS_UP, BEARISH_DIVERGENCE, ZERO_CROSS_DOWN]
        );
    }

    #[test]
    fn test_zero_price_in_history_is_not_a_recovery() {
        let detector = TurningPointDetector::new();
        let mut prices = vec![100.0; 10];
        prices.extend([0.0, 100.0]);
        let result = detector
            .detect(&snapshot(100.0, Some(macd(-0.2, 0.05))), &prices)
            .unwrap();

        assert!(!result.potential_bottom);
        assert_eq!(result.bottom_confidence, 0);
        assert!(result.reasons.is_empty());
        assert_eq!(TurningPointDetector::move_pct(100.0, 0.0), None);
    }

    #[test]
    fn test_non_positive_high_disables_decline() {
        let detector = TurningPointDetector::new();
        let prices = vec![0.0; 12];
        let result = detector
            .detect(&snapshot(0.0, Some(macd(0.3, -0.1))), &prices)
            .unwrap();
        assert!(!result.potential_top);
        assert_eq!(TurningPointDetector::move_pct(-1.0, -2.0), None);
    }
}
