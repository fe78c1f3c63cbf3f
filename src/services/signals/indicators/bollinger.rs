//! Bollinger Bands indicator.

use super::{Indicator, Sma};
use crate::config::BollingerConfig;
use crate::types::BollingerSnapshot;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(period)
/// - Upper band: SMA + k * StdDev
/// - Lower band: SMA - k * StdDev
///
/// A squeeze is flagged when the relative band width `2k * StdDev / middle`
/// drops below the configured threshold.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
    squeeze_threshold: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::from_config(&BollingerConfig::default())
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64, squeeze_threshold: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
            squeeze_threshold,
        }
    }

    pub fn from_config(config: &BollingerConfig) -> Self {
        Self::new(config.period, config.std_dev, config.band_squeeze_threshold)
    }

    /// Population standard deviation around `mean`.
    pub fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerSnapshot;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, series: &[f64]) -> Option<BollingerSnapshot> {
        if self.period == 0 || series.len() < self.period {
            return None;
        }

        let recent = &series[series.len() - self.period..];
        let middle = Sma::mean(recent)?;
        if middle == 0.0 {
            return None;
        }

        let std = Self::std_dev(recent, middle);
        let half_width = std * self.std_dev_multiplier;
        let relative_width = half_width * 2.0 / middle;

        Some(BollingerSnapshot {
            upper: middle + half_width,
            middle,
            lower: middle - half_width,
            bandwidth_pct: relative_width * 100.0,
            squeeze: relative_width < self.squeeze_threshold,
        })
    }
}
