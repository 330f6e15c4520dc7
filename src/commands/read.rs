//! Read command implementation

use super::Session;
use crate::error::CliError;
use crate::progress::IndicatifProgress;
use rspd_core::eeprom;
use rspd_core::DeviceRef;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Dump file name used when no output is given
pub fn default_output(device: DeviceRef) -> PathBuf {
    PathBuf::from(format!("./dimm{}.spd", device.chip.get()))
}

/// Destination of a dump, written only once the read succeeded
///
/// The image goes to a hidden temporary file next to the destination and is
/// renamed over it on [`commit`](Self::commit). Dropping an uncommitted
/// output removes the temporary file and leaves any existing dump untouched.
pub struct PendingOutput {
    path: PathBuf,
    temp: PathBuf,
    file: Option<File>,
}

impl PendingOutput {
    /// Check that `path` can be written, without modifying it
    pub fn prepare(path: &Path) -> Result<Self, CliError> {
        let unwritable = |e: std::io::Error| {
            CliError::Precondition(format!(
                "Could not open file \"{}\" for writing: {}",
                path.display(),
                e
            ))
        };

        let name = path.file_name().ok_or_else(|| {
            CliError::Precondition(format!("\"{}\" is not a file name", path.display()))
        })?;
        let mut temp_name = std::ffi::OsString::from(".");
        temp_name.push(name);
        temp_name.push(".part");
        let temp = path.with_file_name(temp_name);

        if path.exists() {
            OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(unwritable)?;
        }
        let file = File::create(&temp).map_err(unwritable)?;

        Ok(Self {
            path: path.to_path_buf(),
            temp,
            file: Some(file),
        })
    }

    /// Final location of the dump
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` and move it into place
    pub fn commit(mut self, data: &[u8]) -> Result<(), CliError> {
        let io_err = |e| CliError::io(format!("Failed to write {}", self.path.display()), e);
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)
                .and_then(|_| file.sync_all())
                .map_err(io_err)?;
        }
        std::fs::rename(&self.temp, &self.path).map_err(io_err)?;
        self.file = None;
        Ok(())
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}

/// Run the read command
pub fn run_read(
    session: &Session<'_>,
    device: DeviceRef,
    output: Option<&Path>,
) -> Result<(), CliError> {
    session.preflight()?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(device));

    // Fail on an unwritable destination before touching the bus
    let pending = PendingOutput::prepare(&output)?;

    if !session.confirm_access(device, "read from")? {
        return Ok(());
    }

    let mut master = session.open(device)?;
    let mut progress = IndicatifProgress::new("Read");
    let image = eeprom::read(master.as_mut(), device.chip, &mut progress)?;

    pending.commit(image.as_bytes())?;

    println!();
    println!(
        "SPD EEPROM contents from DIMM {} written to: \"{}\".",
        device.chip,
        output.display()
    );
    if !image.is_ddr5() {
        log::warn!(
            "Memory type byte is {:#04x}, this does not look like a DDR5 SPD",
            image.dram_type()
        );
    }
    Ok(())
}
