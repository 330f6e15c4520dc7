//! Reversible Software Write Protection commands

use super::{print_declined, Session};
use crate::error::CliError;
use rspd_core::rswp::{self, BlockRange, RswpMap, SetOutcome};
use rspd_core::{Block, DeviceRef};

/// One line of the status table
fn status_line(block: Block, protected: bool) -> String {
    format!(
        "Block {:>3} RSWP status: {}",
        format!("#{}", block.get()),
        if protected { "protected" } else { "writable" }
    )
}

/// Render the protection status of every block
pub fn render_status(map: RswpMap) -> Vec<String> {
    Block::all()
        .map(|block| status_line(block, map.is_protected(block)))
        .collect()
}

/// Describe what setting one block did
pub fn describe_outcome(block: Block, outcome: SetOutcome) -> String {
    let label = format!("#{}", block.get());
    match outcome {
        SetOutcome::AlreadyProtected => {
            format!("Block {:>3} is already protected", label)
        }
        SetOutcome::Protected { register, old, new } => format!(
            "Setting RSWP bit for block {:>3} (register {:#04x}, {:#04x} -> {:#04x})",
            label, register, old, new
        ),
    }
}

/// Run `rswp status`
pub fn run_rswp_status(session: &Session<'_>, device: DeviceRef) -> Result<(), CliError> {
    session.preflight()?;
    if !session.confirm_access(device, "read from")? {
        return Ok(());
    }

    let mut master = session.open(device)?;
    let map = rswp::get_all(master.as_mut(), device.chip)?;

    println!("RSWP status for blocks #0..15 on DIMM {}:", device.chip);
    for line in render_status(map) {
        println!("{}", line);
    }
    Ok(())
}

/// Run `rswp set`
pub fn run_rswp_set(
    session: &Session<'_>,
    device: DeviceRef,
    first: u8,
    last: u8,
) -> Result<(), CliError> {
    let range = BlockRange::new(first, last).map_err(|e| CliError::Validation(e.to_string()))?;
    session.preflight()?;

    if !session.confirm_access(device, "read/write from/to")? {
        return Ok(());
    }

    println!("DANGER!!! RSWP status bit cannot be cleared through mainboard SMBus controller!");
    println!(
        "If you set protection bit for the wrong data block or on the wrong DIMM, you will need a dedicated hardware DDR5 RAM programmer device to remove it!"
    );
    println!(
        "Likewise, setting protection bit on the part of SPD EEPROM contents which is corrupted will leave the RAM module in a permanently broken state!"
    );
    println!();
    println!(
        "To avoid setting RSWP on the wrong RAM module, boot your system with a single perfectly working RAM stick with its SPD ROM contents in ideal state (preferably with proper unique serial number). Make sure the SPD ROM passes all CRC checks. If in doubt, make a dump using `rspd read` and run it through `rspd info`."
    );
    println!();
    println!("Setting RSWP bit for blocks {} on DIMM {}.", range, device.chip);
    println!();
    if !session.confirm.ask("Really continue?")? {
        println!();
        print_declined();
        return Ok(());
    }
    println!();

    println!("Last call. Are you *absolutely* sure?");
    println!();
    println!("Setting RSWP bit for blocks {} on DIMM {}.", range, device.chip);
    println!();
    if !session.confirm.ask("REALLY continue?")? {
        println!();
        print_declined();
        return Ok(());
    }
    println!();

    let mut master = session.open(device)?;
    rswp::set_blocks(master.as_mut(), device.chip, &range, |block, outcome| {
        println!("{}", describe_outcome(block, outcome));
    })?;

    println!();
    println!("RSWP is now set for blocks {} on DIMM {}.", range, device.chip);
    println!();
    println!(
        "This protection can only be removed using a dedicated hardware DDR5 RAM programmer device."
    );
    println!("You have been warned.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_status() {
        let lines = render_status(RswpMap::from_bits(0b1000_0000_0000_0010));
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], "Block  #0 RSWP status: writable");
        assert_eq!(lines[1], "Block  #1 RSWP status: protected");
        assert_eq!(lines[15], "Block #15 RSWP status: protected");
    }

    #[test]
    fn test_describe_outcome() {
        let block = Block::new(9).unwrap();
        assert_eq!(
            describe_outcome(
                block,
                SetOutcome::Protected {
                    register: 0x0d,
                    old: 0x00,
                    new: 0x02
                }
            ),
            "Setting RSWP bit for block  #9 (register 0x0d, 0x00 -> 0x02)"
        );
        assert_eq!(
            describe_outcome(block, SetOutcome::AlreadyProtected),
            "Block  #9 is already protected"
        );
    }
}
