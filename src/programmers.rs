//! Programmer registration and dispatch
//!
//! A programmer is the transport that carries SMBus transactions to the
//! hub. Which ones exist depends on the features enabled at compile time.

use crate::error::CliError;
use rspd_core::bus::SmbusMaster;
use rspd_core::DeviceRef;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Whether this programmer talks to real hardware
    pub hardware: bool,
}

impl ProgrammerInfo {
    fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "linux-i2c")]
    programmers.push(ProgrammerInfo {
        name: "linux-i2c",
        aliases: &["linux_i2c", "i2c-dev"],
        description: "Linux i2c-dev interface (dev=/dev/i2c-N,timeout=<s>,force=1)",
        hardware: true,
    });

    #[cfg(feature = "i2c-tools")]
    programmers.push(ProgrammerInfo {
        name: "i2c-tools",
        aliases: &["i2c_tools"],
        description: "i2cget/i2cset from i2c-tools (i2cget=<path>,i2cset=<path>,timeout=<s>)",
        hardware: true,
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory SPD5 hub emulator for testing (image=<file>,protect=<hex>)",
        hardware: false,
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:10} - {}\n", p.name, p.description));
    }
    help
}

/// Look up a programmer by name or alias
pub fn find_programmer(name: &str) -> Option<ProgrammerInfo> {
    available_programmers().into_iter().find(|p| p.matches(name))
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> Result<(&str, Vec<(&str, &str)>), CliError> {
    let Some((name, opts)) = s.split_once(':') else {
        return Ok((s, Vec::new()));
    };

    let mut options = Vec::new();
    for opt in opts.split(',').filter(|o| !o.is_empty()) {
        let (key, value) = opt.split_once('=').ok_or_else(|| {
            CliError::Usage(format!(
                "Invalid programmer option '{}' (expected key=value)",
                opt
            ))
        })?;
        options.push((key.trim(), value.trim()));
    }
    Ok((name, options))
}

/// Whether the named programmer needs the host preflight checks
pub fn needs_host_checks(programmer: &str) -> bool {
    parse_programmer_string(programmer)
        .ok()
        .and_then(|(name, _)| find_programmer(name))
        .map(|p| p.hardware)
        .unwrap_or(true)
}

/// Open the programmer for `device`
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
    device: DeviceRef,
) -> Result<Box<dyn SmbusMaster>, CliError> {
    let (name, options) = parse_programmer_string(programmer)?;

    let info = find_programmer(name).ok_or_else(|| unknown_programmer_error(name))?;

    match info.name {
        #[cfg(feature = "linux-i2c")]
        "linux-i2c" => {
            log::info!("Opening Linux i2c-dev programmer on bus {}...", device.bus);
            rspd_linux_i2c::open_linux_i2c(device.bus, &options).map_err(|e| {
                CliError::Precondition(format!(
                    "Failed to open i2c bus {}: {}\n\
                     Make sure the i2c-dev kernel module is loaded\n\
                     and that you have read/write access to the device.",
                    device.bus, e
                ))
            })
        }

        #[cfg(feature = "i2c-tools")]
        "i2c-tools" => {
            log::info!("Opening i2c-tools programmer on bus {}...", device.bus);
            rspd_i2c_tools::open_i2c_tools(device.bus, &options).map_err(|e| {
                CliError::Precondition(format!(
                    "Failed to set up i2c-tools: {}\n\
                     Make sure the i2c-tools package is installed.",
                    e
                ))
            })
        }

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(device, &options),

        _ => Err(unknown_programmer_error(name)),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    device: DeviceRef,
    options: &[(&str, &str)],
) -> Result<Box<dyn SmbusMaster>, CliError> {
    use rspd_core::spd::SpdImage;
    use rspd_dummy::{DummyConfig, DummySpd};

    let mut config = DummyConfig {
        chip: device.chip,
        ..DummyConfig::default()
    };

    for (key, value) in options {
        match *key {
            "image" => {
                let data = std::fs::read(value)
                    .map_err(|e| CliError::io(format!("Failed to read {}", value), e))?;
                config.image = SpdImage::from_slice(&data)?;
            }
            "protect" => {
                let hex = value.strip_prefix("0x").unwrap_or(value);
                config.protected = u16::from_str_radix(hex, 16).map_err(|_| {
                    CliError::Usage(format!("Invalid protect bitmap: {}", value))
                })?;
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    log::info!(
        "Using dummy programmer: emulated hub at {} (RSWP {:#06x})",
        config.chip,
        config.protected
    );
    Ok(Box::new(DummySpd::new(config)))
}

fn unknown_programmer_error(name: &str) -> CliError {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'rspd list-programmers' for more details");
    CliError::Usage(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        let (name, options) = parse_programmer_string("linux-i2c").unwrap();
        assert_eq!(name, "linux-i2c");
        assert!(options.is_empty());

        let (name, options) =
            parse_programmer_string("i2c-tools:i2cget=/opt/i2cget,timeout=2").unwrap();
        assert_eq!(name, "i2c-tools");
        assert_eq!(options, vec![("i2cget", "/opt/i2cget"), ("timeout", "2")]);

        assert!(parse_programmer_string("dummy:image").is_err());
    }

    #[test]
    fn test_unknown_programmer() {
        let device = DeviceRef::new(
            rspd_core::BusNumber::new(0).unwrap(),
            rspd_core::ChipAddress::FIRST,
        );
        let err = open_programmer("ch341a", device).err().unwrap();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("Unknown programmer: ch341a"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_is_not_hardware() {
        assert!(!needs_host_checks("dummy"));
        assert!(!needs_host_checks("dummy:protect=0x3"));
        assert!(needs_host_checks("nonexistent"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_with_protection() {
        let device = DeviceRef::new(
            rspd_core::BusNumber::new(1).unwrap(),
            rspd_core::ChipAddress::new(0x52).unwrap(),
        );
        let mut master = open_programmer("dummy:protect=0x8001", device).unwrap();
        let map = rspd_core::rswp::get_all(master.as_mut(), device.chip).unwrap();
        assert_eq!(map.bits(), 0x8001);
    }
}
