//! SMBus master backed by `i2cget` and `i2cset`
//!
//! Each transaction runs one child process. The child gets the transaction
//! deadline to finish; if it does not, it is killed and the transaction is
//! reported as timed out.

use crate::error::{I2cToolsError, Result};

use rspd_core::bus::{BusError, SmbusMaster};
use rspd_core::regs;
use rspd_core::{BusNumber, ChipAddress};

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How often a running child is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Configuration for the i2c-tools transport
#[derive(Debug, Clone)]
pub struct I2cToolsConfig {
    /// Bus passed to the tools
    pub bus: BusNumber,
    /// Path or name of `i2cget`
    pub i2cget: String,
    /// Path or name of `i2cset`
    pub i2cset: String,
    /// Deadline for one tool invocation (default: 10 s)
    pub timeout: Duration,
}

impl I2cToolsConfig {
    /// Default configuration for `bus`, tools looked up in `PATH`
    pub fn new(bus: BusNumber) -> Self {
        Self {
            bus,
            i2cget: "i2cget".into(),
            i2cset: "i2cset".into(),
            timeout: Duration::from_secs(regs::TRANSACTION_TIMEOUT_SECS),
        }
    }
}

/// SMBus master that shells out to i2c-tools
#[derive(Debug)]
pub struct I2cTools {
    config: I2cToolsConfig,
}

impl I2cTools {
    /// Check that both tools can be started
    pub fn open(config: I2cToolsConfig) -> Result<Self> {
        for tool in [&config.i2cget, &config.i2cset] {
            let status = Command::new(tool)
                .arg("-V")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|e| I2cToolsError::ToolNotFound {
                    tool: tool.clone(),
                    source: e,
                })?;
            log::debug!("i2c_tools: {} -V exited with {}", tool, status);
        }
        log::info!(
            "i2c_tools: Using {} / {} on bus {} (timeout={} s)",
            config.i2cget,
            config.i2cset,
            config.bus,
            config.timeout.as_secs()
        );
        Ok(Self { config })
    }
}

impl SmbusMaster for I2cTools {
    fn read_byte_data(&mut self, chip: ChipAddress, reg: u8) -> std::result::Result<u8, BusError> {
        let args = get_args(self.config.bus, chip, reg);
        let out = run_tool(&self.config.i2cget, &args, self.config.timeout)?;
        parse_byte(&out).ok_or_else(|| {
            log::error!(
                "i2c_tools: unexpected i2cget output {:?}",
                String::from_utf8_lossy(&out)
            );
            BusError::Malformed
        })
    }

    fn write_byte_data(
        &mut self,
        chip: ChipAddress,
        reg: u8,
        value: u8,
    ) -> std::result::Result<(), BusError> {
        let args = set_args(self.config.bus, chip, reg, value);
        run_tool(&self.config.i2cset, &args, self.config.timeout).map(|_| ())
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Arguments for `i2cget`
pub fn get_args(bus: BusNumber, chip: ChipAddress, reg: u8) -> [String; 4] {
    [
        "-y".into(),
        bus.get().to_string(),
        format!("{:#04x}", chip.get()),
        format!("{:#04x}", reg),
    ]
}

/// Arguments for `i2cset`
pub fn set_args(bus: BusNumber, chip: ChipAddress, reg: u8, value: u8) -> [String; 5] {
    [
        "-y".into(),
        bus.get().to_string(),
        format!("{:#04x}", chip.get()),
        format!("{:#04x}", reg),
        format!("{:#04x}", value),
    ]
}

/// Parse the `0xNN` line printed by `i2cget`
pub fn parse_byte(out: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(out).ok()?.trim();
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    u8::from_str_radix(hex, 16).ok()
}

/// Read a child pipe to the end on its own thread
///
/// The child blocks once a pipe buffer fills, so output has to be consumed
/// while waiting for it to exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|r| r.join().ok()).unwrap_or_default()
}

/// Run `tool` to completion within `timeout`, returning its stdout
pub fn run_tool(
    tool: &str,
    args: &[String],
    timeout: Duration,
) -> std::result::Result<Vec<u8>, BusError> {
    log::trace!("i2c_tools: {} {}", tool, args.join(" "));

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            log::error!("i2c_tools: cannot start {}: {}", tool, e);
            BusError::Unavailable
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                log::error!("i2c_tools: {} did not finish in {:?}", tool, timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(BusError::Timeout);
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::error!("i2c_tools: waiting for {} failed: {}", tool, e);
                let _ = child.kill();
                let _ = child.wait();
                return Err(BusError::Unavailable);
            }
        }
    };

    let out = collect(stdout);
    if status.success() {
        return Ok(out);
    }

    let err = collect(stderr);
    log::debug!(
        "i2c_tools: {} stderr: {}",
        tool,
        String::from_utf8_lossy(&err).trim()
    );
    match status.code() {
        Some(code) => Err(BusError::Status(code)),
        // Killed by a signal
        None => Err(BusError::Unavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> BusNumber {
        BusNumber::new(1).unwrap()
    }

    fn chip() -> ChipAddress {
        ChipAddress::new(0x51).unwrap()
    }

    #[test]
    fn test_arguments() {
        assert_eq!(get_args(bus(), chip(), 0x0b), ["-y", "1", "0x51", "0x0b"]);
        assert_eq!(
            set_args(bus(), chip(), 0x85, 0x07),
            ["-y", "1", "0x51", "0x85", "0x07"]
        );
    }

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte(b"0x5a\n"), Some(0x5a));
        assert_eq!(parse_byte(b"0X00"), Some(0));
        assert_eq!(parse_byte(b"5a"), None);
        assert_eq!(parse_byte(b"0x"), None);
        assert_eq!(parse_byte(b"0x100"), None);
        assert_eq!(parse_byte(b"Error: Read failed\n"), None);
    }

    #[test]
    fn test_run_tool_collects_stdout() {
        let out = run_tool("echo", &["0x42".into()], Duration::from_secs(5)).unwrap();
        assert_eq!(parse_byte(&out), Some(0x42));
    }

    #[test]
    fn test_run_tool_reports_exit_status() {
        let err = run_tool("sh", &["-c".into(), "exit 3".into()], Duration::from_secs(5));
        assert_eq!(err, Err(BusError::Status(3)));
    }

    #[test]
    fn test_run_tool_deadline() {
        let start = Instant::now();
        let err = run_tool("sleep", &["5".into()], Duration::from_millis(100));
        assert_eq!(err, Err(BusError::Timeout));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_tool_output_larger_than_pipe_buffer() {
        let script = "head -c 200000 /dev/zero; echo 0x42".to_string();
        let out = run_tool("sh", &["-c".into(), script], Duration::from_secs(5)).unwrap();
        assert_eq!(out.len(), 200_000 + 5);
        assert_eq!(parse_byte(&out[200_000..]), Some(0x42));
    }

    #[test]
    fn test_missing_tool() {
        let err = run_tool("rspd-no-such-tool", &[], Duration::from_secs(1));
        assert_eq!(err, Err(BusError::Unavailable));
    }
}
