//! rspd-dummy - In-memory SPD5 hub emulator for testing
//!
//! This crate provides a dummy SMBus master with one emulated DDR5 module
//! behind it. The emulated hub has a 1024-byte EEPROM behind a 128-byte page
//! window, a page select register and two RSWP registers whose bits can be
//! set but never cleared. Writes into a protected block are dropped, the same
//! way the real hub ignores them.
//!
//! Every transaction is logged, and failures can be injected at any point,
//! which makes the emulator suitable for exercising the recovery paths of
//! `rspd-core` without real hardware.

use rspd_core::bus::{BusError, SmbusMaster};
use rspd_core::regs;
use rspd_core::rswp::RswpMap;
use rspd_core::spd::SpdImage;
use rspd_core::{Address, Block, ChipAddress};

/// Status reported for transactions to a chip address nobody answers at
/// (ENXIO, as the kernel reports a missing device)
pub const NO_DEVICE_STATUS: i32 = 6;

/// Configuration for the emulated module
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Address the hub answers at
    pub chip: ChipAddress,
    /// Initial EEPROM contents
    pub image: SpdImage,
    /// Initial RSWP bitmap (bit n = block n)
    pub protected: u16,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            chip: ChipAddress::FIRST,
            image: SpdImage::zeroed(),
            protected: 0,
        }
    }
}

/// Direction of a logged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Read byte data
    Read,
    /// Write byte data
    Write,
}

/// One logged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Read or write
    pub direction: Direction,
    /// Target chip address
    pub chip: u8,
    /// Register addressed
    pub reg: u8,
    /// Value read or written (0 for failed reads)
    pub value: u8,
    /// Injected failure, if the transaction failed
    pub error: Option<BusError>,
}

impl Transaction {
    /// Whether this is a write of `value` to `reg`
    pub fn is_write(&self, reg: u8, value: u8) -> bool {
        self.direction == Direction::Write && self.reg == reg && self.value == value
    }

    /// Whether this is a write to an EEPROM data register
    pub fn is_data_write(&self) -> bool {
        self.direction == Direction::Write && self.reg >= regs::DATA_BASE
    }
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    at: usize,
    error: BusError,
    sticky: bool,
}

/// Dummy SPD hub
///
/// Emulates one DDR5 module's SPD5 hub in memory.
pub struct DummySpd {
    chip: ChipAddress,
    eeprom: SpdImage,
    page: u8,
    rswp: u16,
    log: Vec<Transaction>,
    faults: Vec<Fault>,
    blocked_writes: usize,
    elapsed_ms: u64,
}

impl DummySpd {
    /// Create an emulated module with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            chip: config.chip,
            eeprom: config.image,
            page: 0,
            rswp: config.protected,
            log: Vec::new(),
            faults: Vec::new(),
            blocked_writes: 0,
            elapsed_ms: 0,
        }
    }

    /// Create an emulated module at 0x50 holding `image`
    pub fn with_image(image: SpdImage) -> Self {
        Self::new(DummyConfig {
            image,
            ..DummyConfig::default()
        })
    }

    /// Current EEPROM contents
    pub fn image(&self) -> &SpdImage {
        &self.eeprom
    }

    /// Page currently selected in the hub
    pub fn page(&self) -> u8 {
        self.page
    }

    /// Current RSWP bitmap
    pub fn rswp(&self) -> RswpMap {
        RswpMap::from_bits(self.rswp)
    }

    /// Every transaction issued so far, failed ones included
    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    /// Forget logged transactions
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Data writes dropped because their block is protected
    pub fn blocked_writes(&self) -> usize {
        self.blocked_writes
    }

    /// Total time spent in `delay_ms`
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Make transaction number `n` (0-based, counted from now over the whole
    /// log) fail once with `error`
    pub fn fail_transaction(&mut self, n: usize, error: BusError) {
        self.faults.push(Fault {
            at: n,
            error,
            sticky: false,
        });
    }

    /// Make transaction number `n` and every later one fail with `error`
    pub fn fail_from(&mut self, n: usize, error: BusError) {
        self.faults.push(Fault {
            at: n,
            error,
            sticky: true,
        });
    }

    fn injected_fault(&self) -> Option<BusError> {
        let index = self.log.len();
        self.faults
            .iter()
            .find(|f| f.at == index || (f.sticky && index >= f.at))
            .map(|f| f.error)
    }

    fn check_chip(&self, chip: ChipAddress) -> Option<BusError> {
        (chip != self.chip).then_some(BusError::Status(NO_DEVICE_STATUS))
    }

    fn data_address(&self, reg: u8) -> Option<Address> {
        let offset = (reg & !regs::DATA_BASE) as u16;
        Address::new(self.page as u16 * regs::PAGE_SIZE as u16 + offset)
    }

    fn read_hub(&self, reg: u8) -> u8 {
        match reg {
            regs::PAGE_SELECT => self.page,
            regs::RSWP_LOW => self.rswp as u8,
            regs::RSWP_HIGH => (self.rswp >> 8) as u8,
            r if r >= regs::DATA_BASE => self.data_address(r).map_or(0, |a| self.eeprom.get(a)),
            _ => 0,
        }
    }

    fn write_hub(&mut self, reg: u8, value: u8) {
        match reg {
            regs::PAGE_SELECT => {
                self.page = value & (regs::PAGE_COUNT as u8 - 1);
                log::trace!("dummy: page {}", self.page);
            }
            regs::RSWP_LOW | regs::RSWP_HIGH => {
                let shift = if reg == regs::RSWP_HIGH { 8 } else { 0 };
                let requested = (value as u16) << shift;
                let mask = 0xffu16 << shift;
                if (self.rswp & mask) & !requested != 0 {
                    log::debug!("dummy: ignoring attempt to clear RSWP bits");
                }
                self.rswp |= requested;
            }
            r if r >= regs::DATA_BASE => {
                let Some(addr) = self.data_address(r) else {
                    return;
                };
                if self.rswp().is_protected(addr.block()) {
                    log::debug!("dummy: write to protected address {} dropped", addr);
                    self.blocked_writes += 1;
                    return;
                }
                self.eeprom.set(addr, value);
            }
            _ => {}
        }
    }

    /// Whether `block` is write protected
    pub fn is_protected(&self, block: Block) -> bool {
        self.rswp().is_protected(block)
    }
}

impl SmbusMaster for DummySpd {
    fn read_byte_data(&mut self, chip: ChipAddress, reg: u8) -> Result<u8, BusError> {
        let error = self.injected_fault().or_else(|| self.check_chip(chip));
        let value = if error.is_none() { self.read_hub(reg) } else { 0 };
        self.log.push(Transaction {
            direction: Direction::Read,
            chip: chip.get(),
            reg,
            value,
            error,
        });
        match error {
            Some(e) => Err(e),
            None => Ok(value),
        }
    }

    fn write_byte_data(&mut self, chip: ChipAddress, reg: u8, value: u8) -> Result<(), BusError> {
        let error = self.injected_fault().or_else(|| self.check_chip(chip));
        if error.is_none() {
            self.write_hub(reg, value);
        }
        self.log.push(Transaction {
            direction: Direction::Write,
            chip: chip.get(),
            reg,
            value,
            error,
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        // Time is only accounted, never slept
        self.elapsed_ms += ms as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rspd_core::eeprom::{self, NoProgress};
    use rspd_core::range::RangeSet;
    use rspd_core::rswp::{self, BlockRange, SetOutcome};
    use rspd_core::{Error, Recovery};

    fn pattern() -> SpdImage {
        let mut image = SpdImage::zeroed();
        for (i, b) in image.as_bytes_mut().iter_mut().enumerate() {
            *b = (i as u8) ^ (i >> 8) as u8;
        }
        image
    }

    fn chip() -> ChipAddress {
        ChipAddress::FIRST
    }

    fn block(n: u8) -> Block {
        Block::new(n).unwrap()
    }

    #[test]
    fn test_read_round_trip() {
        let mut spd = DummySpd::with_image(pattern());
        let image = eeprom::read(&mut spd, chip(), &mut NoProgress).unwrap();
        assert_eq!(image, pattern());
        assert_eq!(spd.page(), 0);
        assert!(spd.log().last().unwrap().is_write(regs::PAGE_SELECT, 0));
    }

    #[test]
    fn test_write_then_read_back() {
        let mut spd = DummySpd::new(DummyConfig::default());
        eeprom::write(&mut spd, chip(), &pattern(), &RangeSet::full(), &mut NoProgress).unwrap();
        assert_eq!(spd.image(), &pattern());

        // One write per address, each address exactly once
        let mut seen = [0u8; regs::EEPROM_SIZE];
        let mut page = 0usize;
        for t in spd.log() {
            if t.is_write(regs::PAGE_SELECT, t.value) {
                page = t.value as usize;
            } else if t.is_data_write() {
                seen[page * regs::PAGE_SIZE + (t.reg & 0x7f) as usize] += 1;
            }
        }
        assert!(seen.iter().all(|n| *n == 1));

        // Every write is followed by the settle delay
        let writes = spd.log().iter().filter(|t| t.direction == Direction::Write).count();
        assert_eq!(spd.elapsed_ms(), writes as u64 * regs::SETTLE_MS as u64);
    }

    #[test]
    fn test_write_skips_protected_blocks() {
        let mut spd = DummySpd::new(DummyConfig {
            protected: 0b0000_0100_0000_0011,
            ..DummyConfig::default()
        });
        let stats =
            eeprom::write(&mut spd, chip(), &pattern(), &RangeSet::full(), &mut NoProgress)
                .unwrap();

        assert_eq!(stats.skipped, 3 * regs::BLOCK_SIZE);
        assert_eq!(stats.transferred, regs::EEPROM_SIZE - 3 * regs::BLOCK_SIZE);
        // Nothing reached the hub for protected blocks
        assert_eq!(spd.blocked_writes(), 0);
        assert_eq!(
            spd.log().iter().filter(|t| t.is_data_write()).count(),
            stats.transferred
        );
        // Page 0 is all protected, so the first select is page 1
        let first_select = spd
            .log()
            .iter()
            .find(|t| t.direction == Direction::Write && t.reg == regs::PAGE_SELECT)
            .unwrap();
        assert_eq!(first_select.value, 1);

        let image = spd.image().as_bytes();
        assert!(image[..128].iter().all(|b| *b == 0));
        assert!(image[640..704].iter().all(|b| *b == 0));
        assert_eq!(&image[128..640], &pattern().as_bytes()[128..640]);
        assert_eq!(spd.page(), 0);
    }

    #[test]
    fn test_ranged_write() {
        let mut spd = DummySpd::new(DummyConfig::default());
        let ranges = RangeSet::parse("0x0-0x3,700").unwrap();
        eeprom::write(&mut spd, chip(), &pattern(), &ranges, &mut NoProgress).unwrap();
        let image = spd.image().as_bytes();
        assert_eq!(&image[..4], &pattern().as_bytes()[..4]);
        assert_eq!(image[4], 0);
        assert_eq!(image[700], pattern().as_bytes()[700]);
        assert_eq!(image[699], 0);
        assert_eq!(spd.log().iter().filter(|t| t.is_data_write()).count(), 5);
    }

    #[test]
    fn test_recovery_escalation() {
        let mut spd = DummySpd::new(DummyConfig::default());
        let ranges = RangeSet::parse("700-705").unwrap();
        // RSWP low, RSWP high, select page 5, write 700, then 701 fails
        spd.fail_transaction(4, BusError::Timeout);

        let err = eeprom::write(&mut spd, chip(), &pattern(), &ranges, &mut NoProgress)
            .unwrap_err();
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Timeout,
                recovery: Recovery::Restored
            }
        );
        assert!(err.recovered());
        // Exactly one transaction after the failure, selecting page 0
        assert_eq!(spd.log().len(), 6);
        assert!(spd.log()[5].is_write(regs::PAGE_SELECT, 0));
        assert_eq!(spd.page(), 0);
        assert_eq!(spd.image().as_bytes()[701], 0);
    }

    #[test]
    fn test_failed_recovery_reported() {
        let mut spd = DummySpd::with_image(pattern());
        // Everything from the first read of page 2 on fails
        spd.fail_from(2 * 129 + 1, BusError::Status(121));

        let err = eeprom::read(&mut spd, chip(), &mut NoProgress).unwrap_err();
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Status(121),
                recovery: Recovery::Failed(BusError::Status(121))
            }
        );
        assert!(!err.recovered());
        assert_eq!(spd.page(), 2);
        assert_eq!(spd.log().len(), 2 * 129 + 3);
    }

    #[test]
    fn test_failure_on_first_page_ends_with_page_select() {
        let mut spd = DummySpd::with_image(pattern());
        spd.fail_transaction(5, BusError::Malformed);

        let err = eeprom::read(&mut spd, chip(), &mut NoProgress).unwrap_err();
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Malformed,
                recovery: Recovery::NotAttempted
            }
        );
        assert!(spd.log().last().unwrap().is_write(regs::PAGE_SELECT, 0));
    }

    #[test]
    fn test_rswp_set_is_idempotent_and_permanent() {
        let mut spd = DummySpd::new(DummyConfig::default());

        let outcome = rswp::set_block(&mut spd, chip(), block(9)).unwrap();
        assert!(matches!(outcome, SetOutcome::Protected { .. }));
        let outcome = rswp::set_block(&mut spd, chip(), block(9)).unwrap();
        assert_eq!(outcome, SetOutcome::AlreadyProtected);
        let writes = spd.log().iter().filter(|t| t.direction == Direction::Write).count();
        assert_eq!(writes, 1);

        // Clearing through the bus has no effect
        spd.write_byte_data(chip(), regs::RSWP_HIGH, 0).unwrap();
        assert!(rswp::get_block(&mut spd, chip(), block(9)).unwrap());
        assert!(!rswp::get_block(&mut spd, chip(), block(8)).unwrap());
    }

    #[test]
    fn test_rswp_range_then_write() {
        let mut spd = DummySpd::new(DummyConfig::default());
        let range = BlockRange::new(2, 3).unwrap();
        rswp::set_blocks(&mut spd, chip(), &range, |_, _| {}).unwrap();
        let map = rswp::get_all(&mut spd, chip()).unwrap();
        assert_eq!(map.bits(), 0b1100);

        eeprom::write(&mut spd, chip(), &pattern(), &RangeSet::full(), &mut NoProgress).unwrap();
        assert!(spd.image().as_bytes()[128..256].iter().all(|b| *b == 0));
        assert_eq!(spd.image().as_bytes()[256], pattern().as_bytes()[256]);
    }

    #[test]
    fn test_hub_drops_protected_writes() {
        let mut spd = DummySpd::new(DummyConfig {
            protected: 1,
            ..DummyConfig::default()
        });
        spd.write_byte_data(chip(), regs::DATA_BASE | 5, 0xaa).unwrap();
        assert_eq!(spd.blocked_writes(), 1);
        assert_eq!(spd.image().as_bytes()[5], 0);
    }

    #[test]
    fn test_absent_chip() {
        let mut spd = DummySpd::new(DummyConfig::default());
        let other = ChipAddress::new(0x51).unwrap();
        let err = rswp::get_all(&mut spd, other).unwrap_err();
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Status(NO_DEVICE_STATUS),
                recovery: Recovery::NotAttempted
            }
        );
    }
}
