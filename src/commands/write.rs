//! Write command implementation

use super::Session;
use crate::error::CliError;
use crate::progress::IndicatifProgress;
use rspd_core::eeprom;
use rspd_core::range::RangeSet;
use rspd_core::spd::SpdImage;
use rspd_core::{regs, DeviceRef};
use std::path::Path;

/// Load a dump file, which must hold exactly one EEPROM image
pub fn load_dump(path: &Path) -> Result<SpdImage, CliError> {
    let data = std::fs::read(path)
        .map_err(|e| CliError::io(format!("Failed to read {}", path.display()), e))?;
    if data.len() != regs::EEPROM_SIZE {
        return Err(CliError::Precondition(format!(
            "SPD dump must be exactly {} bytes. ({})",
            regs::EEPROM_SIZE,
            data.len()
        )));
    }
    Ok(SpdImage::from_slice(&data)?)
}

/// Parse the `--range` argument; no argument means the whole EEPROM
pub fn parse_range(range: Option<&str>) -> Result<RangeSet, CliError> {
    match range {
        None => Ok(RangeSet::full()),
        Some(spec) => RangeSet::parse(spec).map_err(|e| CliError::Validation(e.to_string())),
    }
}

/// Run the write command
pub fn run_write(
    session: &Session<'_>,
    device: DeviceRef,
    input: &Path,
    range: Option<&str>,
) -> Result<(), CliError> {
    let ranges = parse_range(range)?;
    session.preflight()?;
    let image = load_dump(input)?;

    if !image.checksums_valid() {
        log::warn!(
            "{} has CRC mismatches, check it with 'rspd info' first",
            input.display()
        );
    }
    if !ranges.is_full() {
        log::info!("Writing {} bytes in ranges {}", ranges.len(), ranges);
    }

    if !session.confirm_access(device, "write to")? {
        return Ok(());
    }

    let mut master = session.open(device)?;
    let mut progress = IndicatifProgress::new("Write");
    let stats = eeprom::write(master.as_mut(), device.chip, &image, &ranges, &mut progress)?;

    println!();
    if !progress.skipped_blocks().is_empty() {
        let blocks: Vec<String> = progress
            .skipped_blocks()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "Skipped {} bytes in write protected blocks {}.",
            stats.skipped,
            blocks.join(", ")
        );
    }
    println!(
        "Successfully flashed \"{}\" to DIMM {}.",
        input.display(),
        device.chip
    );
    Ok(())
}
