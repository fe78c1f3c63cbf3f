use serde::{Deserialize, Serialize};

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    pub price: f64,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: i64) -> Self {
        Self { price, timestamp }
    }

    /// Sample stamped with the current wall-clock time.
    pub fn now(price: f64) -> Self {
        Self::new(price, chrono::Utc::now().timestamp_millis())
    }
}

/// A feed record addressed to one symbol, as read by the replay binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSample {
    pub symbol: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SymbolSample {
    /// Resolve to a sample, stamping missing timestamps with the current time.
    pub fn to_sample(&self) -> PriceSample {
        match self.timestamp {
            Some(ts) => PriceSample::new(self.price, ts),
            None => PriceSample::now(self.price),
        }
    }
}
