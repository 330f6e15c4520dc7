//! Register-level protocol helpers
//!
//! These are the only functions that talk to a [`SmbusMaster`]. Everything
//! above them (paging, RSWP, image transfer) is built on `read_register` and
//! `write_register`.

use crate::bus::{BusError, SmbusMaster};
use crate::regs;
use crate::types::ChipAddress;

/// Read a hub register
pub fn read_register<M: SmbusMaster + ?Sized>(
    master: &mut M,
    chip: ChipAddress,
    reg: u8,
) -> Result<u8, BusError> {
    let value = master.read_byte_data(chip, reg)?;
    log::trace!("spd {}: reg {:#04x} -> {:#04x}", chip, reg, value);
    Ok(value)
}

/// Write a hub register and wait for the EEPROM to commit it
///
/// The settle delay is applied whether or not the write succeeded: a write
/// that failed on the host side may still have reached the EEPROM.
pub fn write_register<M: SmbusMaster + ?Sized>(
    master: &mut M,
    chip: ChipAddress,
    reg: u8,
    value: u8,
) -> Result<(), BusError> {
    log::trace!("spd {}: reg {:#04x} <- {:#04x}", chip, reg, value);
    let result = master.write_byte_data(chip, reg, value);
    master.delay_ms(regs::SETTLE_MS);
    result
}
