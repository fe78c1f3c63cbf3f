//! Simulated trading: position lifecycle, admission and persistence.

pub mod gate;
pub mod log;
pub mod manager;

pub use gate::{AdmissionGate, ConfirmationTracker, PendingEntry, Rejection};
pub use log::TradeLog;
pub use manager::{ExitTrigger, OpenRequest, PositionManager, SymbolLedger, TradeUpdate};
