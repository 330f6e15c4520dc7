//! Error types for the i2c-tools transport

use thiserror::Error;

/// i2c-tools transport errors
#[derive(Debug, Error)]
pub enum I2cToolsError {
    /// A tool could not be started
    #[error("Cannot run {tool}: {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for i2c-tools operations
pub type Result<T> = std::result::Result<T, I2cToolsError>;
