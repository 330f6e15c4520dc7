//! Reversible Software Write Protection (RSWP)
//!
//! The hub keeps one protection bit per 64-byte block in two registers:
//! blocks 0..7 in [`RSWP_LOW`] and blocks 8..15 in [`RSWP_HIGH`]. A set bit
//! makes the hub ignore writes to that block.
//!
//! Despite the name, a set bit cannot be cleared through the host SMBus
//! controller; clearing requires a dedicated programmer driving the high
//! voltage pin. This module therefore only ever sets bits, and treats the
//! bitmap as monotonic.
//!
//! [`RSWP_LOW`]: crate::regs::RSWP_LOW
//! [`RSWP_HIGH`]: crate::regs::RSWP_HIGH

use core::fmt;
use core::ops::RangeInclusive;

use crate::bus::SmbusMaster;
use crate::error::{Error, Result};
use crate::protocol;
use crate::recovery::{guarded, RecoveryContext};
use crate::regs;
use crate::types::{Block, ChipAddress};

/// Register holding the protection bit for `block`
pub const fn register_for(block: Block) -> u8 {
    if block.get() >= 8 {
        regs::RSWP_HIGH
    } else {
        regs::RSWP_LOW
    }
}

/// Bit index of `block` within its register
pub const fn bit_for(block: Block) -> u8 {
    block.get() % 8
}

/// Snapshot of all 16 protection bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RswpMap(u16);

impl RswpMap {
    /// Build from raw bits (bit n = block n)
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Build from the two hub registers
    pub const fn from_registers(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }

    /// Raw bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether writes to `block` are ignored by the hub
    pub const fn is_protected(self, block: Block) -> bool {
        self.0 & (1 << block.get()) != 0
    }

    /// Whether no block is protected
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Per-block flags, indexed by block number
    pub fn to_flags(self) -> [bool; regs::BLOCK_COUNT] {
        let mut flags = [false; regs::BLOCK_COUNT];
        for block in Block::all() {
            flags[block.index()] = self.is_protected(block);
        }
        flags
    }

    /// Iterate over protected blocks in ascending order
    pub fn protected_blocks(self) -> impl Iterator<Item = Block> {
        Block::all().filter(move |b| self.is_protected(*b))
    }
}

/// An inclusive range of blocks to protect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    first: Block,
    last: Block,
}

impl BlockRange {
    /// Validate `first..=last` (both 0..=15, first <= last)
    pub fn new(first: u8, last: u8) -> Result<Self> {
        let first = Block::try_from(first)?;
        let last = Block::try_from(last)?;
        if first > last {
            return Err(Error::InvalidBlockRange {
                first: first.get(),
                last: last.get(),
            });
        }
        Ok(Self { first, last })
    }

    /// First block
    pub const fn first(&self) -> Block {
        self.first
    }

    /// Last block
    pub const fn last(&self) -> Block {
        self.last
    }

    /// Blocks in ascending order
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        let range: RangeInclusive<u8> = self.first.get()..=self.last.get();
        range.filter_map(Block::new)
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}..{}", self.first.get(), self.last.get())
    }
}

/// What [`set_block`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The bit was already set; nothing was written
    AlreadyProtected,
    /// The bit was set by this call
    Protected {
        /// Register that was written
        register: u8,
        /// Register value before
        old: u8,
        /// Register value written
        new: u8,
    },
}

fn read_rswp<M: SmbusMaster + ?Sized>(
    master: &mut M,
    ctx: &mut RecoveryContext,
    reg: u8,
) -> Result<u8> {
    let chip = ctx.chip();
    guarded(master, ctx, |m| protocol::read_register(m, chip, reg))
}

/// Read the protection status of one block
pub fn get_block<M: SmbusMaster + ?Sized>(
    master: &mut M,
    chip: ChipAddress,
    block: Block,
) -> Result<bool> {
    let mut ctx = RecoveryContext::new(chip);
    let value = read_rswp(master, &mut ctx, register_for(block))?;
    Ok((value >> bit_for(block)) & 1 != 0)
}

/// Read both protection registers
pub fn get_all<M: SmbusMaster + ?Sized>(master: &mut M, chip: ChipAddress) -> Result<RswpMap> {
    let mut ctx = RecoveryContext::new(chip);
    get_all_in(master, &mut ctx)
}

/// [`get_all`] as part of a larger operation sharing its recovery context
pub fn get_all_in<M: SmbusMaster + ?Sized>(
    master: &mut M,
    ctx: &mut RecoveryContext,
) -> Result<RswpMap> {
    let low = read_rswp(master, ctx, regs::RSWP_LOW)?;
    let high = read_rswp(master, ctx, regs::RSWP_HIGH)?;
    let map = RswpMap::from_registers(low, high);
    log::debug!("spd {}: RSWP bitmap {:#06x}", ctx.chip(), map.bits());
    Ok(map)
}

/// Protect one block
///
/// Reads the current register first and only writes when the bit is clear,
/// so protecting an already protected block issues no write at all.
///
/// This cannot be undone from the host.
pub fn set_block<M: SmbusMaster + ?Sized>(
    master: &mut M,
    chip: ChipAddress,
    block: Block,
) -> Result<SetOutcome> {
    let mut ctx = RecoveryContext::new(chip);
    let register = register_for(block);
    let old = read_rswp(master, &mut ctx, register)?;
    let mask = 1u8 << bit_for(block);
    if old & mask != 0 {
        log::debug!("spd {}: block {} already protected", chip, block);
        return Ok(SetOutcome::AlreadyProtected);
    }

    let new = old | mask;
    log::debug!(
        "spd {}: setting RSWP bit for block #{} (register {:#04x}, {:#04x} -> {:#04x})",
        chip,
        block.get(),
        register,
        old,
        new
    );
    guarded(master, &mut ctx, |m| {
        protocol::write_register(m, chip, register, new)
    })?;
    Ok(SetOutcome::Protected { register, old, new })
}

/// Protect every block in `range`, lowest first
///
/// Stops at the first failure; blocks before it stay protected. `on_block`
/// is called after each block with its outcome.
pub fn set_blocks<M, F>(
    master: &mut M,
    chip: ChipAddress,
    range: &BlockRange,
    mut on_block: F,
) -> Result<()>
where
    M: SmbusMaster + ?Sized,
    F: FnMut(Block, SetOutcome),
{
    for block in range.blocks() {
        let outcome = set_block(master, chip, block)?;
        on_block(block, outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusError;
    use crate::error::Recovery;
    use crate::testbus::{Op, TestBus};

    fn chip() -> ChipAddress {
        ChipAddress::new(0x52).unwrap()
    }

    fn block(n: u8) -> Block {
        Block::new(n).unwrap()
    }

    #[test]
    fn test_register_mapping() {
        assert_eq!(register_for(block(0)), regs::RSWP_LOW);
        assert_eq!(register_for(block(7)), regs::RSWP_LOW);
        assert_eq!(register_for(block(8)), regs::RSWP_HIGH);
        assert_eq!(bit_for(block(10)), 2);
    }

    #[test]
    fn test_map_from_registers() {
        let map = RswpMap::from_registers(0b0000_0011, 0b1000_0000);
        assert!(map.is_protected(block(0)));
        assert!(map.is_protected(block(1)));
        assert!(!map.is_protected(block(2)));
        assert!(map.is_protected(block(15)));
        let flags = map.to_flags();
        assert_eq!(flags.iter().filter(|f| **f).count(), 3);
        assert_eq!(map.protected_blocks().map(|b| b.get()).max(), Some(15));
    }

    #[test]
    fn test_get_block_reads_one_register() {
        let mut bus = TestBus::new();
        bus.set_register(regs::RSWP_HIGH, 0b0000_0100);
        assert!(get_block(&mut bus, chip(), block(10)).unwrap());
        assert!(!get_block(&mut bus, chip(), block(9)).unwrap());
        assert_eq!(bus.ops(), &[Op::Read(regs::RSWP_HIGH), Op::Read(regs::RSWP_HIGH)]);
    }

    #[test]
    fn test_get_all_reads_both_registers_once() {
        let mut bus = TestBus::new();
        bus.set_register(regs::RSWP_LOW, 0x01);
        bus.set_register(regs::RSWP_HIGH, 0x01);
        let map = get_all(&mut bus, chip()).unwrap();
        assert_eq!(map.bits(), 0x0101);
        assert_eq!(bus.ops().len(), 2);
    }

    #[test]
    fn test_set_block_is_idempotent() {
        let mut bus = TestBus::new();
        bus.set_register(regs::RSWP_LOW, 0b0000_0001);

        let first = set_block(&mut bus, chip(), block(3)).unwrap();
        assert_eq!(
            first,
            SetOutcome::Protected {
                register: regs::RSWP_LOW,
                old: 0b0000_0001,
                new: 0b0000_1001
            }
        );
        let second = set_block(&mut bus, chip(), block(3)).unwrap();
        assert_eq!(second, SetOutcome::AlreadyProtected);

        assert_eq!(bus.writes(), 1);
        assert_eq!(bus.register(regs::RSWP_LOW), 0b0000_1001);
    }

    #[test]
    fn test_set_blocks_range() {
        let mut bus = TestBus::new();
        let range = BlockRange::new(6, 9).unwrap();
        let mut seen = 0;
        set_blocks(&mut bus, chip(), &range, |_, _| seen += 1).unwrap();
        assert_eq!(seen, 4);
        assert_eq!(bus.register(regs::RSWP_LOW), 0b1100_0000);
        assert_eq!(bus.register(regs::RSWP_HIGH), 0b0000_0011);
    }

    #[test]
    fn test_block_range_validation() {
        assert!(BlockRange::new(0, 15).is_ok());
        assert_eq!(
            BlockRange::new(5, 4),
            Err(Error::InvalidBlockRange { first: 5, last: 4 })
        );
        assert_eq!(BlockRange::new(0, 16), Err(Error::InvalidBlock(16)));
    }

    #[test]
    fn test_failed_read_aborts_without_write() {
        let mut bus = TestBus::new();
        bus.fail_at(0, BusError::Timeout);
        let err = set_block(&mut bus, chip(), block(0)).unwrap_err();
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Timeout,
                recovery: Recovery::NotAttempted
            }
        );
        assert_eq!(bus.writes(), 0);
    }
}
