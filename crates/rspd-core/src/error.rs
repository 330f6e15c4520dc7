//! Error types for rspd-core
//!
//! All errors are `Copy` and `no_std` compatible. A failed bus transaction
//! is a [`BusError`]; once it has passed through page recovery it becomes
//! [`Error::FatalIo`], which always ends the current operation.

use core::fmt;

pub use crate::bus::BusError;
pub use crate::range::RangeError;

/// Outcome of the page recovery attempted after a bus failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The hub was never moved off page 0, so nothing was attempted
    NotAttempted,
    /// Page 0 was reselected successfully
    Restored,
    /// Reselecting page 0 failed as well
    Failed(BusError),
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttempted => write!(f, "page recovery not attempted"),
            Self::Restored => write!(f, "page 0 restored"),
            Self::Failed(e) => write!(f, "page 0 NOT restored ({})", e),
        }
    }
}

/// Core error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus transaction failed and the operation was aborted
    FatalIo {
        /// The transaction failure that ended the operation
        cause: BusError,
        /// What happened when trying to put the hub back on page 0
        recovery: Recovery,
    },

    /// Chip address outside 0x50..=0x57
    InvalidChipAddress(u8),
    /// Bus number above 99
    InvalidBus(u32),
    /// Page number outside 0..=7
    InvalidPage(u8),
    /// Block number outside 0..=15
    InvalidBlock(u8),
    /// Block range with first > last
    InvalidBlockRange {
        /// First block requested
        first: u8,
        /// Last block requested
        last: u8,
    },
    /// Image buffer is not exactly 1024 bytes
    ImageSize(usize),
    /// Malformed or overlapping address range specification
    Range(RangeError),
}

impl Error {
    /// Whether the hub was left on a known page after a fatal I/O error
    ///
    /// Returns false for every other error kind.
    pub fn recovered(&self) -> bool {
        matches!(
            self,
            Self::FatalIo {
                recovery: Recovery::Restored,
                ..
            }
        )
    }

    /// Whether this error came from the bus
    pub fn is_fatal_io(&self) -> bool {
        matches!(self, Self::FatalIo { .. })
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FatalIo { cause, recovery } => {
                write!(f, "SPD I/O error: {}; {}", cause, recovery)
            }
            Self::InvalidChipAddress(a) => {
                write!(f, "chip address {:#04x} outside 0x50..0x57", a)
            }
            Self::InvalidBus(b) => write!(f, "bus number {} outside 0..99", b),
            Self::InvalidPage(p) => write!(f, "page {} outside 0..7", p),
            Self::InvalidBlock(b) => write!(f, "block {} outside 0..15", b),
            Self::InvalidBlockRange { first, last } => {
                write!(f, "block range {}..{} is reversed", first, last)
            }
            Self::ImageSize(len) => {
                write!(f, "SPD dump must be exactly 1024 bytes ({})", len)
            }
            Self::Range(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

#[cfg(feature = "std")]
impl std::error::Error for RangeError {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
