//! Technical indicator implementations.
//!
//! Every indicator is a pure function of the series it is given and returns
//! `None` when the series is too short or the computation is degenerate.

pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::{Ema, EmaState};
pub use kdj::Kdj;
pub use macd::{Macd, MacdPoint, MacdTracker};
pub use rsi::Rsi;
pub use sma::Sma;

/// Common shape of the window indicators.
pub trait Indicator {
    type Output;

    /// Short identifier used in logs.
    fn id(&self) -> &str;

    /// Minimum series length for `calculate` to return a value.
    fn min_periods(&self) -> usize;

    /// Compute from an ordered series, oldest first. RSI takes price deltas,
    /// everything else takes prices.
    fn calculate(&self, series: &[f64]) -> Option<Self::Output>;
}
