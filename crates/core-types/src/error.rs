// In crates/core-types/src/error.rs

use thiserror::Error;

/// The error kinds surfaced by the backtesting core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad window sizes, non-positive capital, malformed bar sequences.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fewer bars than the long window. Callers downgrade this to a warning.
    #[error("Insufficient data: {bars} bars available, {required} required")]
    InsufficientData { bars: usize, required: usize },

    /// The price data provider failed. The message is propagated unchanged.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
