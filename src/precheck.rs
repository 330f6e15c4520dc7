//! Host checks run before touching a real bus

use crate::error::CliError;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How long `dmidecode` may run
const DMIDECODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fail unless running as root
pub fn check_root() -> Result<(), CliError> {
    // SAFETY: geteuid has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err(CliError::Precondition(
            "This program must be run as root!".into(),
        ));
    }
    Ok(())
}

/// Fail unless the firmware tables report DDR5 memory
pub fn check_ddr5() -> Result<(), CliError> {
    let text = run_dmidecode()?;
    if !dmi_reports_ddr5(&text) {
        return Err(CliError::Precondition(
            "The system doesn't appear to have DDR5 memory installed.".into(),
        ));
    }
    log::debug!("dmidecode reports DDR5 memory");
    Ok(())
}

/// Whether `dmidecode --type 17` output lists a DDR5 memory device
pub fn dmi_reports_ddr5(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            return false;
        };
        key.trim_end().ends_with("Type") && value.trim().eq_ignore_ascii_case("DDR5")
    })
}

fn run_dmidecode() -> Result<String, CliError> {
    run_captured("dmidecode", &["--type", "17"], DMIDECODE_TIMEOUT)
}

/// Run `program` within `timeout` and return its stdout
///
/// Stdout is read on a separate thread while the child runs, so output
/// larger than the pipe buffer cannot stall it.
fn run_captured(program: &str, args: &[&str], timeout: Duration) -> Result<String, CliError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| CliError::io(format!("Failed to run {}", program), e))?;

    let reader = child.stdout.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CliError::Precondition(format!(
                    "{} did not finish in time",
                    program
                )));
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(10)),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CliError::io(format!("Failed to wait for {}", program), e));
            }
        }
    };

    if !status.success() {
        return Err(CliError::Precondition(format!(
            "{} failed ({})",
            program, status
        )));
    }
    let out = reader.and_then(|r| r.join().ok()).unwrap_or_default();
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDR5_TABLE: &str = "\
Handle 0x0040, DMI type 17, 92 bytes
Memory Device
\tTotal Width: 64 bits
\tSize: 16 GB
\tForm Factor: DIMM
\tLocator: DIMM 0
\tType: DDR5
\tType Detail: Synchronous Unbuffered (Unregistered)
\tSpeed: 4800 MT/s
";

    #[test]
    fn test_detects_ddr5() {
        assert!(dmi_reports_ddr5(DDR5_TABLE));
    }

    #[test]
    fn test_rejects_ddr4() {
        let ddr4 = DDR5_TABLE.replace("DDR5", "DDR4");
        assert!(!dmi_reports_ddr5(&ddr4));
    }

    #[test]
    fn test_large_output_is_drained() {
        // About 144 KiB of filler before the memory device, over twice a pipe buffer
        let script = "for i in $(seq 1 4000); do \
                      echo 'Handle 0x0040, DMI type 17, 92 bytes'; done; \
                      printf '\\tType: DDR5\\n'";
        let start = Instant::now();
        let text = run_captured("sh", &["-c", script], Duration::from_secs(5)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(text.len() > 128 * 1024);
        assert!(dmi_reports_ddr5(&text));
    }

    #[test]
    fn test_deadline_and_failure() {
        let err = run_captured("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.to_string(), "sleep did not finish in time");
        assert!(run_captured("sh", &["-c", "exit 3"], Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_ignores_other_fields() {
        assert!(!dmi_reports_ddr5("\tPart Number: DDR5\n\tType: Unknown\n"));
        assert!(!dmi_reports_ddr5(""));
    }
}
