//! rspd - DDR5 SPD EEPROM tool
//!
//! Reads, writes and write-protects the SPD EEPROM of DDR5 memory modules
//! through the host SMBus controller, and inspects SPD dumps offline.
//!
//! # Architecture
//!
//! All protocol logic (page switching, recovery, write protection, CRCs)
//! lives in `rspd-core`. The binary picks a transport ("programmer"), runs
//! the host checks, asks for confirmation and reports the outcome. A fatal
//! bus error always ends the process with a nonzero status and says whether
//! the hub was put back on page 0.

mod cli;
mod commands;
mod confirm;
mod error;
mod precheck;
mod programmers;
mod progress;

use clap::Parser;
use cli::{Cli, Commands, RswpCommands};
use commands::Session;
use confirm::Confirm;
use error::CliError;
use rspd_core::Recovery;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(error::parse_exit_code(&e));
        }
    };

    // RUST_LOG, when set, takes precedence over -v
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .parse_default_env()
        .init();

    let session = Session {
        programmer: &cli.programmer,
        confirm: Confirm::new(cli.yes),
    };

    let result = match &cli.command {
        Commands::Read { device, output } => {
            commands::run_read(&session, device.device(), output.as_deref())
        }
        Commands::Write {
            device,
            file,
            range,
        } => commands::run_write(&session, device.device(), file, range.as_deref()),
        Commands::Rswp(RswpCommands::Status { device }) => {
            commands::run_rswp_status(&session, device.device())
        }
        Commands::Rswp(RswpCommands::Set {
            device,
            first,
            last,
        }) => commands::run_rswp_set(&session, device.device(), *first, *last),
        Commands::Info {
            file,
            fix_crc,
            output,
        } => commands::run_info(file, *fix_crc, output.as_deref()),
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Log level for the number of `-v` flags
fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn report_error(e: &CliError) {
    let Some(recovery) = e.recovery() else {
        eprintln!("Error: {}", e);
        return;
    };

    log::error!("{}", e);
    eprintln!();
    eprintln!("An I/O error occurred while communicating with SPD!");
    if !matches!(recovery, Recovery::Restored) {
        eprintln!("SPD EEPROM page is NOT restored to first!");
    }
    eprintln!("You MUST reboot the system immediately to avoid further data corruption!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Info);
        assert_eq!(log_level(1), log::LevelFilter::Debug);
        assert_eq!(log_level(2), log::LevelFilter::Trace);
        assert_eq!(log_level(5), log::LevelFilter::Trace);
    }

    fn parse_code(args: &[&str]) -> Option<u8> {
        Cli::try_parse_from(args)
            .err()
            .map(|e| error::parse_exit_code(&e))
    }

    #[test]
    fn test_bad_arguments_exit_with_usage_code() {
        assert_eq!(parse_code(&["rspd", "read", "-b", "0", "-d", "51"]), Some(1));
        assert_eq!(parse_code(&["rspd", "read", "-b", "100", "-d", "0x50"]), Some(1));
        assert_eq!(
            parse_code(&["rspd", "rswp", "set", "-b", "0", "-d", "0x50", "--first", "0", "--last", "16"]),
            Some(1)
        );
        assert_eq!(parse_code(&["rspd"]), Some(1));
        assert_eq!(parse_code(&["rspd", "bogus"]), Some(1));
    }

    #[test]
    fn test_help_and_version_succeed() {
        assert_eq!(parse_code(&["rspd", "--help"]), Some(0));
        assert_eq!(parse_code(&["rspd", "read", "--help"]), Some(0));
        assert_eq!(parse_code(&["rspd", "--version"]), Some(0));
        assert_eq!(parse_code(&["rspd", "-p", "dummy", "list-programmers"]), None);
    }
}
