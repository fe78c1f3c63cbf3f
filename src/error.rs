use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    /// Not enough samples in the window for the requested stage.
    #[error("Insufficient data for {stage}: need {required}, have {available}")]
    DataInsufficient {
        stage: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the error only means "wait for more samples".
    pub fn is_data_insufficient(&self) -> bool {
        matches!(self, AppError::DataInsufficient { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
