//! Per-symbol rolling price window.
//!
//! Holds the ordered samples used for analysis plus the trailing price deltas
//! consumed by RSI. Pruning is driven by sample timestamps, relative to the
//! newest sample, so replays behave the same as live feeds.

use crate::config::TrendConfig;
use crate::services::signals::indicators::macd::SLOW_PERIOD;
use crate::types::PriceSample;

/// Retention bounds derived from the trend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Samples at or older than `newest - retention_ms` are dropped.
    pub retention_ms: i64,
    /// Count above which the window is cut back to `retain_samples`.
    pub max_samples: usize,
    pub retain_samples: usize,
    /// Number of trailing deltas kept (the RSI period).
    pub max_deltas: usize,
}

impl RetentionPolicy {
    /// Bounds never drop below what one MACD snapshot needs, and the newest
    /// sample always survives its own push.
    pub fn from_config(config: &TrendConfig) -> Self {
        let min_points = config.enhanced_trend.min_data_points_for_macd.max(SLOW_PERIOD);
        Self {
            retention_ms: config.retention_ms().max(1),
            max_samples: min_points * 4,
            retain_samples: min_points * 3,
            max_deltas: config.rsi_period,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&TrendConfig::default())
    }
}

/// Samples removed by one push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneOutcome {
    pub expired: usize,
    pub trimmed: usize,
}

impl PruneOutcome {
    pub fn removed(&self) -> usize {
        self.expired + self.trimmed
    }
}

#[derive(Debug, Clone, Default)]
pub struct RollingWindow {
    samples: Vec<PriceSample>,
    deltas: Vec<f64>,
    last_price: Option<f64>,
}

impl RollingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, record its delta against the previous price, and prune.
    pub fn push(&mut self, sample: PriceSample, policy: &RetentionPolicy) -> PruneOutcome {
        if let Some(previous) = self.last_price {
            self.deltas.push(sample.price - previous);
            if self.deltas.len() > policy.max_deltas {
                let excess = self.deltas.len() - policy.max_deltas;
                self.deltas.drain(..excess);
            }
        }
        self.last_price = Some(sample.price);
        self.samples.push(sample);
        self.prune(sample.timestamp, policy)
    }

    fn prune(&mut self, now: i64, policy: &RetentionPolicy) -> PruneOutcome {
        let cutoff = now - policy.retention_ms;
        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp > cutoff);
        let expired = before - self.samples.len();

        let mut trimmed = 0;
        if self.samples.len() > policy.max_samples {
            trimmed = self.samples.len() - policy.retain_samples;
            self.samples.drain(..trimmed);
        }

        PruneOutcome { expired, trimmed }
    }

    /// Price of the most recent push, even if that sample has since expired.
    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn prices(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    /// Trailing price deltas, oldest first.
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
