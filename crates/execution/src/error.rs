// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),
}

impl From<Error> for core_types::Error {
    fn from(err: Error) -> Self {
        core_types::Error::InvalidParameter(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
