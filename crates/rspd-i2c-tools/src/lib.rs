//! rspd-i2c-tools - i2c-tools process transport
//!
//! This crate performs every SMBus transaction by running `i2cget` or
//! `i2cset` from the i2c-tools package and parsing their output. It is
//! slower than the i2c-dev transport but works wherever the tools do.
//!
//! # Usage with rspd CLI
//!
//! ```bash
//! rspd read --bus 0 --dimm 0x50 -p i2c-tools
//!
//! # Tools outside PATH
//! rspd read --bus 0 --dimm 0x50 -p i2c-tools:i2cget=/opt/bin/i2cget,i2cset=/opt/bin/i2cset
//! ```

pub mod error;
pub mod tools;

pub use error::{I2cToolsError, Result};
pub use tools::{parse_byte, run_tool, I2cTools, I2cToolsConfig};

use rspd_core::BusNumber;
use std::time::Duration;

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(
    bus: BusNumber,
    options: &[(&str, &str)],
) -> std::result::Result<I2cToolsConfig, String> {
    let mut config = I2cToolsConfig::new(bus);

    for (key, value) in options {
        match *key {
            "i2cget" => config.i2cget = value.to_string(),
            "i2cset" => config.i2cset = value.to_string(),
            "timeout" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout value: {}", value))?;
                if secs == 0 || secs > rspd_core::regs::TRANSACTION_TIMEOUT_SECS {
                    return Err(format!("Invalid timeout: {} (must be 1-10 seconds)", secs));
                }
                config.timeout = Duration::from_secs(secs);
            }
            _ => {
                log::warn!("i2c_tools: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// Open the i2c-tools transport and return a boxed SmbusMaster
///
/// # Example Options
///
/// - `i2cget=/path/to/i2cget` - Optional: tool location (default: from PATH)
/// - `i2cset=/path/to/i2cset` - Optional: tool location (default: from PATH)
/// - `timeout=10` - Optional: deadline per invocation in seconds (1-10)
pub fn open_i2c_tools(
    bus: BusNumber,
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn rspd_core::bus::SmbusMaster>, Box<dyn std::error::Error>> {
    let config = parse_options(bus, options)?;
    Ok(Box::new(I2cTools::open(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let bus = BusNumber::new(0).unwrap();
        let config = parse_options(bus, &[("i2cget", "/opt/i2cget"), ("timeout", "3")]).unwrap();
        assert_eq!(config.i2cget, "/opt/i2cget");
        assert_eq!(config.i2cset, "i2cset");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(parse_options(bus, &[("timeout", "30")]).is_err());
    }
}
