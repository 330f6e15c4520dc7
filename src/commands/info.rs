//! Info command implementation

use super::write::load_dump;
use crate::error::CliError;
use chrono::{Datelike, Duration, NaiveDate};
use rspd_core::spd::{ManufacturingDate, SectionKind, SpdImage};
use std::io::Write;
use std::path::Path;

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Monday of week `week` of `year`, weeks starting on the year's first Monday
fn week_monday(year: i32, week: u8) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let to_monday = (7 - jan1.weekday().num_days_from_monday()) % 7;
    let first_monday = jan1 + Duration::days(to_monday as i64);
    Some(first_monday + Duration::weeks(week as i64 - 1))
}

/// Calendar date shown next to the production week
pub fn production_date(date: ManufacturingDate) -> String {
    if !date.has_valid_week() {
        return "?".into();
    }
    week_monday(date.year as i32, date.week)
        .map(|d| d.format("%-d %b").to_string())
        .unwrap_or_else(|| "?".into())
}

/// Render the report for a DDR5 image
///
/// Returns the lines to print and whether every checksum matched.
pub fn render(image: &SpdImage) -> (Vec<String>, bool) {
    let mut lines = Vec::new();

    if let Some(info) = image.manufacturing() {
        let date = info.date();
        lines.push(format!("Manufacturer: {}", hex_string(&info.manufacturer_id)));
        lines.push(format!(
            "Produced: {}/{} ({})",
            date.week,
            date.year,
            production_date(date)
        ));
        lines.push(format!("S/N: {}", hex_string(&info.serial)));
        let part = info
            .part_number()
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(&info.part_number).trim().to_string());
        lines.push(format!("P/N: {}", part));
    }

    let mut all_valid = true;
    for check in image.check_sections() {
        all_valid &= check.is_valid();
        let indent = match check.section.kind {
            SectionKind::Base => "",
            SectionKind::Xmp(_) | SectionKind::Expo => "  ",
        };
        lines.push(format!(
            "{}{} CRC: {:#x} ({:#x})",
            indent, check.section.kind, check.stored, check.computed
        ));
    }

    (lines, all_valid)
}

/// Run the info command
pub fn run_info(file: &Path, fix_crc: bool, output: Option<&Path>) -> Result<(), CliError> {
    let mut image = load_dump(file)?;
    if !image.is_ddr5() {
        return Err(CliError::Precondition(
            "SPD dump doesn't appear to be from DDR5 memory.".into(),
        ));
    }

    if fix_crc {
        let changed = image.fix_checksums();
        log::info!("Recalculated CRCs, {} section(s) changed", changed);
        return write_fixed(&image, output);
    }

    let (lines, all_valid) = render(&image);
    for line in lines {
        println!("{}", line);
    }
    if !all_valid {
        log::warn!("{}: stored and computed CRCs differ", file.display());
        eprintln!("\nWARNING: CRC mismatch!");
    }
    Ok(())
}

fn write_fixed(image: &SpdImage, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            std::fs::write(path, image.as_bytes())
                .map_err(|e| CliError::io(format!("Failed to write {}", path.display()), e))?;
            println!("Fixed SPD dump written to: \"{}\".", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(image.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| CliError::io("Failed to write to stdout", e))?;
        }
    }
    Ok(())
}
