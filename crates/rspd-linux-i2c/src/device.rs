//! Linux i2c-dev SMBus master
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `SmbusMaster` trait using the kernel's `I2C_SMBUS` ioctl on
//! `/dev/i2c-N`.

use crate::error::{LinuxI2cError, Result};

use rspd_core::bus::{BusError, SmbusMaster};
use rspd_core::regs;
use rspd_core::{BusNumber, ChipAddress};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use nix::errno::Errno;

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

    const I2C_RETRIES: u16 = 0x0701;
    const I2C_TIMEOUT: u16 = 0x0702;
    const I2C_SLAVE: u16 = 0x0703;
    const I2C_SLAVE_FORCE: u16 = 0x0706;
    const I2C_FUNCS: u16 = 0x0705;
    const I2C_SMBUS: u16 = 0x0720;

    /// Adapter can do SMBus read byte data
    pub const I2C_FUNC_SMBUS_READ_BYTE_DATA: libc::c_ulong = 0x0008_0000;
    /// Adapter can do SMBus write byte data
    pub const I2C_FUNC_SMBUS_WRITE_BYTE_DATA: libc::c_ulong = 0x0010_0000;

    pub const I2C_SMBUS_READ: u8 = 1;
    pub const I2C_SMBUS_WRITE: u8 = 0;
    pub const I2C_SMBUS_BYTE_DATA: u32 = 2;

    /// `union i2c_smbus_data`: byte, word, or a block of up to 32 bytes
    /// plus length and PEC
    #[repr(C)]
    pub union I2cSmbusData {
        pub byte: u8,
        pub word: u16,
        pub block: [u8; 34],
    }

    /// `struct i2c_smbus_ioctl_data`
    #[repr(C)]
    pub struct I2cSmbusIoctlData {
        pub read_write: u8,
        pub command: u8,
        pub size: u32,
        pub data: *mut I2cSmbusData,
    }

    ioctl_write_int_bad!(i2c_retries, I2C_RETRIES);
    ioctl_write_int_bad!(i2c_timeout, I2C_TIMEOUT);
    ioctl_write_int_bad!(i2c_slave, I2C_SLAVE);
    ioctl_write_int_bad!(i2c_slave_force, I2C_SLAVE_FORCE);
    ioctl_read_bad!(i2c_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, I2cSmbusIoctlData);
}

/// Configuration for opening an i2c-dev adapter
#[derive(Debug, Clone)]
pub struct LinuxI2cConfig {
    /// Device path (e.g., "/dev/i2c-0")
    pub device: String,
    /// Per-transaction timeout (default: 10 s)
    pub timeout: Duration,
    /// Address the hub even when a kernel driver has claimed it
    pub force: bool,
}

impl LinuxI2cConfig {
    /// Configuration for `/dev/i2c-<bus>`
    pub fn new(bus: BusNumber) -> Self {
        Self {
            device: format!("/dev/i2c-{}", bus),
            timeout: Duration::from_secs(regs::TRANSACTION_TIMEOUT_SECS),
            force: false,
        }
    }
}

/// SMBus master on a Linux i2c-dev adapter
pub struct LinuxI2c {
    file: File,
    force: bool,
    /// Chip the adapter is currently addressed to
    current: Option<ChipAddress>,
}

impl LinuxI2c {
    /// Open and configure an adapter
    ///
    /// Kernel-side retries are disabled: a failed transaction must surface
    /// immediately.
    pub fn open(config: &LinuxI2cConfig) -> Result<Self> {
        log::debug!("linux_i2c: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;
        let fd = file.as_raw_fd();

        let mut funcs: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_funcs(fd, &mut funcs)
                .map_err(|e| LinuxI2cError::FuncsFailed(errno_to_io(e)))?;
        }
        let needed = ioctl::I2C_FUNC_SMBUS_READ_BYTE_DATA | ioctl::I2C_FUNC_SMBUS_WRITE_BYTE_DATA;
        if funcs & needed != needed {
            return Err(LinuxI2cError::Unsupported {
                path: config.device.clone(),
            });
        }

        // The adapter timeout is in units of 10 ms
        let timeout_ms = config.timeout.as_millis() as u64;
        let ticks = (timeout_ms / 10).max(1) as libc::c_int;
        unsafe {
            ioctl::i2c_timeout(fd, ticks).map_err(|e| LinuxI2cError::SetTimeoutFailed {
                timeout_ms,
                source: errno_to_io(e),
            })?;
            ioctl::i2c_retries(fd, 0)
                .map_err(|e| LinuxI2cError::SetRetriesFailed(errno_to_io(e)))?;
        }

        log::info!(
            "linux_i2c: Opened {} (timeout={} ms{})",
            config.device,
            timeout_ms,
            if config.force { ", forced" } else { "" }
        );

        Ok(Self {
            file,
            force: config.force,
            current: None,
        })
    }

    /// Open `/dev/i2c-<bus>` with default settings
    pub fn open_bus(bus: BusNumber) -> Result<Self> {
        Self::open(&LinuxI2cConfig::new(bus))
    }

    fn address(&mut self, chip: ChipAddress) -> std::result::Result<(), BusError> {
        if self.current == Some(chip) {
            return Ok(());
        }
        let fd = self.file.as_raw_fd();
        let addr = chip.get() as libc::c_int;
        let result = unsafe {
            if self.force {
                ioctl::i2c_slave_force(fd, addr)
            } else {
                ioctl::i2c_slave(fd, addr)
            }
        };
        match result {
            Ok(_) => {
                self.current = Some(chip);
                Ok(())
            }
            Err(Errno::EBUSY) => {
                log::error!(
                    "linux_i2c: {} is claimed by a kernel driver (use force=1 or unbind it)",
                    chip
                );
                Err(BusError::Unavailable)
            }
            Err(e) => {
                log::error!("linux_i2c: Cannot address {}: {}", chip, e);
                Err(BusError::Unavailable)
            }
        }
    }

    fn smbus_access(
        &mut self,
        chip: ChipAddress,
        read_write: u8,
        command: u8,
        data: &mut ioctl::I2cSmbusData,
    ) -> std::result::Result<(), BusError> {
        self.address(chip)?;
        let args = ioctl::I2cSmbusIoctlData {
            read_write,
            command,
            size: ioctl::I2C_SMBUS_BYTE_DATA,
            data,
        };
        unsafe { ioctl::i2c_smbus(self.file.as_raw_fd(), &args) }
            .map(|_| ())
            .map_err(errno_to_bus)
    }
}

impl SmbusMaster for LinuxI2c {
    fn read_byte_data(&mut self, chip: ChipAddress, reg: u8) -> std::result::Result<u8, BusError> {
        let mut data = ioctl::I2cSmbusData { block: [0; 34] };
        self.smbus_access(chip, ioctl::I2C_SMBUS_READ, reg, &mut data)?;
        // SAFETY: every field of the union is plain bytes
        Ok(unsafe { data.byte })
    }

    fn write_byte_data(
        &mut self,
        chip: ChipAddress,
        reg: u8,
        value: u8,
    ) -> std::result::Result<(), BusError> {
        let mut data = ioctl::I2cSmbusData { block: [0; 34] };
        data.byte = value;
        self.smbus_access(chip, ioctl::I2C_SMBUS_WRITE, reg, &mut data)
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e as i32)
}

/// Classify a failed `I2C_SMBUS` ioctl
fn errno_to_bus(e: Errno) -> BusError {
    match e {
        Errno::ETIMEDOUT => BusError::Timeout,
        Errno::EPROTO | Errno::EBADMSG => BusError::Malformed,
        other => BusError::Status(other as i32),
    }
}

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(
    bus: BusNumber,
    options: &[(&str, &str)],
) -> std::result::Result<LinuxI2cConfig, String> {
    let mut config = LinuxI2cConfig::new(bus);

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "timeout" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout value: {}", value))?;
                if secs == 0 || secs > regs::TRANSACTION_TIMEOUT_SECS {
                    return Err(format!(
                        "Invalid timeout: {} (must be 1-{} seconds)",
                        secs,
                        regs::TRANSACTION_TIMEOUT_SECS
                    ));
                }
                config.timeout = Duration::from_secs(secs);
            }
            "force" => {
                config.force = match *value {
                    "1" | "yes" | "true" => true,
                    "0" | "no" | "false" => false,
                    _ => return Err(format!("Invalid force value: {}", value)),
                };
            }
            _ => {
                log::warn!("linux_i2c: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> BusNumber {
        BusNumber::new(3).unwrap()
    }

    #[test]
    fn test_default_device_follows_bus() {
        let config = parse_options(bus(), &[]).unwrap();
        assert_eq!(config.device, "/dev/i2c-3");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.force);
    }

    #[test]
    fn test_options() {
        let config = parse_options(
            bus(),
            &[("dev", "/dev/i2c-12"), ("timeout", "2"), ("force", "yes")],
        )
        .unwrap();
        assert_eq!(config.device, "/dev/i2c-12");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert!(config.force);
    }

    #[test]
    fn test_timeout_cannot_exceed_deadline() {
        assert!(parse_options(bus(), &[("timeout", "11")]).is_err());
        assert!(parse_options(bus(), &[("timeout", "0")]).is_err());
        assert!(parse_options(bus(), &[("timeout", "abc")]).is_err());
    }

    #[test]
    fn test_errno_classification() {
        assert_eq!(errno_to_bus(Errno::ETIMEDOUT), BusError::Timeout);
        assert_eq!(errno_to_bus(Errno::EPROTO), BusError::Malformed);
        assert_eq!(errno_to_bus(Errno::ENXIO), BusError::Status(libc::ENXIO));
    }

    #[test]
    fn test_ioctl_data_layout() {
        assert_eq!(std::mem::size_of::<ioctl::I2cSmbusData>(), 34);
    }
}
