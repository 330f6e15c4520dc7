//! CLI argument parsing

use clap::{Parser, Subcommand};
use rspd_core::{BusNumber, ChipAddress, DeviceRef};
use std::path::PathBuf;

/// Programmer used when none is given
#[cfg(feature = "linux-i2c")]
pub const DEFAULT_PROGRAMMER: &str = "linux-i2c";
/// Programmer used when none is given
#[cfg(all(not(feature = "linux-i2c"), feature = "i2c-tools"))]
pub const DEFAULT_PROGRAMMER: &str = "i2c-tools";
/// Programmer used when none is given
#[cfg(all(not(feature = "linux-i2c"), not(feature = "i2c-tools")))]
pub const DEFAULT_PROGRAMMER: &str = "dummy";

/// Parse a decimal bus number (0..=99)
fn parse_bus(s: &str) -> Result<BusNumber, String> {
    let bus: u32 = s
        .parse()
        .map_err(|e| format!("Invalid bus number: {}", e))?;
    BusNumber::new(bus).map_err(|e| e.to_string())
}

/// Parse a `0x`-prefixed hub address (0x50..=0x57)
fn parse_dimm(s: &str) -> Result<ChipAddress, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| "Hexadecimal argument must be preceded with \"0x\"".to_string())?;
    let addr = u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?;
    ChipAddress::new(addr).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "rspd")]
#[command(author, version, about = "DDR5 SPD EEPROM tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Answer "yes" to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Programmer to use, optionally with options (e.g. i2c-tools, dummy:image=clean.spd)
    #[arg(
        short,
        long,
        global = true,
        env = "RSPD_PROGRAMMER",
        default_value = DEFAULT_PROGRAMMER
    )]
    pub programmer: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Module selection shared across bus commands
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Bus number, e.g. 0 for /dev/i2c-0
    #[arg(short, long, value_parser = parse_bus)]
    pub bus: BusNumber,

    /// DIMM hub address on the bus (0x50..0x57)
    #[arg(short, long, value_parser = parse_dimm)]
    pub dimm: ChipAddress,
}

impl DeviceArgs {
    // Unused by the man page generator, which shares this module
    #[allow(dead_code)]
    pub fn device(&self) -> DeviceRef {
        DeviceRef::new(self.bus, self.dimm)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the SPD EEPROM to a file
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Output file path (default: ./dimm<address>.spd)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a clean SPD dump to the EEPROM
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// SPD dump in raw binary format (1024 bytes)
        #[arg(short, long)]
        file: PathBuf,

        /// Address ranges to write, e.g. "0-511,0x280-0x2bf" (default: everything)
        #[arg(long)]
        range: Option<String>,
    },

    /// Reversible Software Write Protection operations
    #[command(subcommand)]
    Rswp(RswpCommands),

    /// Show module information and check CRCs of an SPD dump
    Info {
        /// SPD dump in raw binary format (1024 bytes)
        #[arg(short, long)]
        file: PathBuf,

        /// Recalculate every CRC and write the fixed dump instead
        #[arg(long)]
        fix_crc: bool,

        /// Where to write the fixed dump (default: stdout)
        #[arg(short, long, requires = "fix_crc")]
        output: Option<PathBuf>,
    },

    /// List supported programmers
    ListProgrammers,
}

/// RSWP subcommands
#[derive(Subcommand)]
pub enum RswpCommands {
    /// Show the protection status of every block
    Status {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Protect a range of blocks (cannot be undone from the host)
    Set {
        #[command(flatten)]
        device: DeviceArgs,

        /// First block to protect (0..15)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
        first: u8,

        /// Last block to protect (0..15)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
        last: u8,
    },
}
