//! CLI error type and exit codes

use rspd_core::error::{Error as CoreError, Recovery};
use thiserror::Error;

/// Exit code for fatal I/O errors without a usable transport status
pub const EXIT_FATAL_IO: u8 = 2;

/// Exit code for a command line clap rejected or answered itself
///
/// Help and version output are successful runs; every other parse failure
/// is a usage error, kept apart from the fatal I/O codes.
pub fn parse_exit_code(err: &clap::Error) -> u8 {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Everything that can end a command early
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed or inconsistent arguments
    #[error("{0}")]
    Usage(String),

    /// The environment or input is not fit for the operation
    #[error("{0}")]
    Precondition(String),

    /// Input failed validation
    #[error("{0}")]
    Validation(String),

    /// Local file I/O failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Error from the protocol core, including fatal bus errors
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CliError {
    /// Wrap an I/O error with what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code
    ///
    /// Fatal bus errors use the transport's completion status when it is
    /// distinguishable from the generic failure code, and 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Core(CoreError::FatalIo { cause, .. }) => match cause.status() {
                Some(code) if code > 1 && code <= u8::MAX as i32 => code as u8,
                _ => EXIT_FATAL_IO,
            },
            _ => 1,
        }
    }

    /// Recovery outcome, for fatal bus errors
    pub fn recovery(&self) -> Option<Recovery> {
        match self {
            Self::Core(CoreError::FatalIo { recovery, .. }) => Some(*recovery),
            _ => None,
        }
    }
}
