//! rspd-core - Core library for DDR5 SPD EEPROM access
//!
//! This crate implements the protocol layer for reading, writing and
//! write-protecting the 1024-byte SPD EEPROM found on DDR5 memory modules.
//! It is `no_std` compatible and knows nothing about how bytes actually move
//! over the wire: every transaction goes through the [`bus::SmbusMaster`]
//! trait, implemented by the transport crates.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the error types
//!
//! # Example
//!
//! ```ignore
//! use rspd_core::eeprom::{self, NoProgress};
//! use rspd_core::ChipAddress;
//!
//! fn dump<M: rspd_core::bus::SmbusMaster>(master: &mut M) -> rspd_core::Result<()> {
//!     let chip = ChipAddress::new(0x51)?;
//!     let image = eeprom::read(master, chip, &mut NoProgress)?;
//!     println!("Main CRC: {:?}", image.check_sections()[0]);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod eeprom;
pub mod error;
pub mod page;
pub mod protocol;
pub mod range;
pub mod recovery;
pub mod regs;
pub mod rswp;
pub mod spd;
#[cfg(test)]
mod testbus;
mod types;

pub use error::{Error, Recovery, Result};
pub use types::{Address, Block, BusNumber, ChipAddress, DeviceRef, Page};
