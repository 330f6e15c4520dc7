//! Bus transport trait
//!
//! A transport performs single-byte SMBus "read byte data" and "write byte
//! data" transactions against one host bus. It is opened for a specific bus
//! number, so transactions only name the chip and register.
//!
//! Implementations must:
//!
//! - give up on a transaction after [`TRANSACTION_TIMEOUT_SECS`] and report
//!   [`BusError::Timeout`]
//! - never retry a failed transaction
//! - block in [`SmbusMaster::delay_ms`] for at least the requested time
//!
//! The post-write settle delay is not the transport's job; the protocol layer
//! (see [`crate::protocol::write_register`]) inserts it after every write.
//!
//! [`TRANSACTION_TIMEOUT_SECS`]: crate::regs::TRANSACTION_TIMEOUT_SECS

use core::fmt;

use crate::types::ChipAddress;

/// A single failed bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No completion within the transaction deadline
    Timeout,
    /// The transaction completed but its result could not be interpreted
    Malformed,
    /// The transaction could not be issued at all
    Unavailable,
    /// Non-zero completion status (tool exit code or errno)
    Status(i32),
}

impl BusError {
    /// Low-level completion status, if the transport reported one
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "transaction timed out"),
            Self::Malformed => write!(f, "malformed transaction result"),
            Self::Unavailable => write!(f, "transaction could not be issued"),
            Self::Status(code) => write!(f, "transaction failed with status {}", code),
        }
    }
}

/// SMBus master bound to one host bus
pub trait SmbusMaster {
    /// Read one byte from `reg` of `chip`
    fn read_byte_data(&mut self, chip: ChipAddress, reg: u8) -> Result<u8, BusError>;

    /// Write one byte to `reg` of `chip`
    fn write_byte_data(&mut self, chip: ChipAddress, reg: u8, value: u8) -> Result<(), BusError>;

    /// Block for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32);
}
