//! CLI command implementations
//!
//! Bus commands share the same preamble: host checks (skipped for the
//! emulator), a warning banner and a confirmation prompt. Nothing is sent
//! over SMBus before the user agrees.

mod info;
mod list;
mod read;
mod rswp;
mod write;

pub use info::run_info;
pub use list::list_programmers;
pub use read::run_read;
pub use rswp::{run_rswp_set, run_rswp_status};
pub use write::run_write;

use crate::confirm::Confirm;
use crate::error::CliError;
use crate::precheck;
use crate::programmers;
use rspd_core::bus::SmbusMaster;
use rspd_core::DeviceRef;

/// Options shared by every bus command
pub struct Session<'a> {
    /// Programmer string as given on the command line
    pub programmer: &'a str,
    /// Confirmation policy
    pub confirm: Confirm,
}

impl Session<'_> {
    /// Run the host checks unless the programmer is an emulator
    pub fn preflight(&self) -> Result<(), CliError> {
        if !programmers::needs_host_checks(self.programmer) {
            log::debug!("Skipping host checks for {}", self.programmer);
            return Ok(());
        }
        precheck::check_root()?;
        precheck::check_ddr5()
    }

    /// Print the warning banner and ask to continue
    ///
    /// Returns false if the user declined, after telling them nothing was done.
    pub fn confirm_access(&self, device: DeviceRef, access: &str) -> Result<bool, CliError> {
        println!(
            "WARNING! Improper use of this tool can result in data corruption over SMBus and hardware failure.\n"
        );
        println!(
            "Will now {} bus {}, chip address {}, byte-by-byte.\n",
            access, device.bus, device.chip
        );
        let go = self.confirm.ask("Continue?")?;
        println!();
        if !go {
            print_declined();
        }
        Ok(go)
    }

    /// Open the programmer for `device`
    pub fn open(&self, device: DeviceRef) -> Result<Box<dyn SmbusMaster>, CliError> {
        programmers::open_programmer(self.programmer, device)
    }
}

fn print_declined() {
    println!("Exiting without performing any operations on SMBus.");
}
