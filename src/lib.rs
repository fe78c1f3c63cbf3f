//! Trendwatch - technical indicator and trading signal engine
//!
//! Feed timestamped prices per symbol into a [`services::TrendEngine`] (or the
//! async [`services::EngineRunner`]) and receive indicator snapshots, graded
//! BUY/SELL/HOLD signals and simulated trade lifecycle events.

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::AppError;
pub use services::{EngineHandle, EngineRunner, TickOutcome, TrendEngine};
pub use types::*;
