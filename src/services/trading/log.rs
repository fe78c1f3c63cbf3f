//! Closed-trade persistence.
//!
//! The log is a single JSON array of closed trades. Every save rewrites the
//! whole file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{Trade, TradeStats};

#[derive(Debug, Clone)]
pub struct TradeLog {
    path: PathBuf,
}

impl TradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored history. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<Trade>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No trade log at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let trades: Vec<Trade> = serde_json::from_str(&content)?;
        info!("Loaded {} trades from {}", trades.len(), self.path.display());
        Ok(trades)
    }

    /// Overwrite the log with `trades`.
    pub fn save(&self, trades: &[Trade]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(trades)?;
        fs::write(&self.path, json)?;
        debug!("Saved {} trades to {}", trades.len(), self.path.display());
        Ok(())
    }

    /// Aggregate statistics over a stored history.
    pub fn summarize(trades: &[Trade]) -> TradeStats {
        let mut stats = TradeStats::default();
        for trade in trades {
            stats.record_closed_history(trade.realized_profit());
        }
        stats
    }
}
