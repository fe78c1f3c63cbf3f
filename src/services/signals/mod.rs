//! Indicator snapshots, turning point detection and signal generation.

pub mod generator;
pub mod indicators;
pub mod snapshot;
pub mod trend;
pub mod turning_point;

pub use generator::{SignalGenerator, SignalThresholds};
pub use snapshot::SnapshotBuilder;
pub use trend::{Cooldown, TrendAnalyzer};
pub use turning_point::TurningPointDetector;
