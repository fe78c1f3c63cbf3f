pub mod engine;
pub mod runner;
pub mod signals;
pub mod trading;
pub mod window;

pub use engine::{SymbolState, TickOutcome, TrendEngine};
pub use runner::{EngineHandle, EngineRunner};
pub use signals::{SignalGenerator, SnapshotBuilder, TrendAnalyzer, TurningPointDetector};
pub use trading::{AdmissionGate, ConfirmationTracker, PositionManager, TradeLog};
pub use window::{RetentionPolicy, RollingWindow};
