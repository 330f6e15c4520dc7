//! rspd-linux-i2c - Linux i2c-dev transport
//!
//! This crate drives the host SMBus controller directly through the
//! `/dev/i2c-N` character device, one `I2C_SMBUS` ioctl per transaction.
//!
//! # Example
//!
//! ```no_run
//! use rspd_linux_i2c::LinuxI2c;
//! use rspd_core::bus::SmbusMaster;
//! use rspd_core::{BusNumber, ChipAddress};
//!
//! let mut i2c = LinuxI2c::open_bus(BusNumber::new(0)?)?;
//! let page = i2c.read_byte_data(ChipAddress::new(0x50)?, 0x0b)?;
//! println!("MR11: {:#04x}", page);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with rspd CLI
//!
//! ```bash
//! # Default: /dev/i2c-<bus>
//! rspd read --bus 0 --dimm 0x50 -p linux-i2c
//!
//! # Shorter transaction timeout, in seconds
//! rspd rswp status --bus 0 --dimm 0x51 -p linux-i2c:timeout=2
//!
//! # Talk to a hub claimed by the spd5118 driver
//! rspd read --bus 0 --dimm 0x50 -p linux-i2c:force=1
//! ```
//!
//! # System Requirements
//!
//! - `i2c-dev` kernel module loaded
//! - The SMBus controller driver for the platform (e.g. `i2c-i801`,
//!   `i2c-piix4`)
//! - Read/write access to `/dev/i2c-N`

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxI2c, LinuxI2cConfig};
pub use error::{LinuxI2cError, Result};

use rspd_core::BusNumber;

/// Open an i2c-dev adapter and return a boxed SmbusMaster
///
/// This is a convenience function for use in the CLI programmer dispatch.
///
/// # Example Options
///
/// - `dev=/dev/i2c-3` - Optional: device path (default: `/dev/i2c-<bus>`)
/// - `timeout=10` - Optional: transaction timeout in seconds (1-10)
/// - `force=1` - Optional: address hubs claimed by a kernel driver
pub fn open_linux_i2c(
    bus: BusNumber,
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn rspd_core::bus::SmbusMaster>, Box<dyn std::error::Error>> {
    let config = parse_options(bus, options)?;
    let i2c = LinuxI2c::open(&config)?;
    Ok(Box::new(i2c))
}
