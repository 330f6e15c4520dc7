//! Error types for Linux i2c-dev operations

use thiserror::Error;

/// Linux i2c-dev specific errors
#[derive(Debug, Error)]
pub enum LinuxI2cError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to query adapter functionality
    #[error("Failed to query adapter functionality: {0}")]
    FuncsFailed(#[source] std::io::Error),

    /// Adapter cannot do byte-data transfers
    #[error("{path} does not support SMBus read/write byte data")]
    Unsupported { path: String },

    /// Failed to set the adapter timeout
    #[error("Failed to set adapter timeout to {timeout_ms} ms: {source}")]
    SetTimeoutFailed {
        timeout_ms: u64,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set the adapter retry count
    #[error("Failed to disable adapter retries: {0}")]
    SetRetriesFailed(#[source] std::io::Error),
}

/// Result type for Linux i2c-dev operations
pub type Result<T> = std::result::Result<T, LinuxI2cError>;
