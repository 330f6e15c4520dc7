//! SPD5 hub register map and EEPROM geometry
//!
//! The SPD5 hub exposes the EEPROM through a 128-byte window in its
//! register space. Which 128 bytes of the 1024-byte EEPROM are visible is
//! chosen by the page select register.

/// Total EEPROM size in bytes
pub const EEPROM_SIZE: usize = 1024;

/// Size of one page (the window visible through the data registers)
pub const PAGE_SIZE: usize = 128;

/// Number of pages in the EEPROM
pub const PAGE_COUNT: usize = EEPROM_SIZE / PAGE_SIZE;

/// Size of one write protection block
pub const BLOCK_SIZE: usize = 64;

/// Number of write protection blocks
pub const BLOCK_COUNT: usize = EEPROM_SIZE / BLOCK_SIZE;

/// Active page select register (MR11)
pub const PAGE_SELECT: u8 = 0x0b;

/// RSWP bitmap for blocks 0..7 (MR12)
pub const RSWP_LOW: u8 = 0x0c;

/// RSWP bitmap for blocks 8..15 (MR13)
pub const RSWP_HIGH: u8 = 0x0d;

/// First data register; the page offset is OR'ed into the low 7 bits
pub const DATA_BASE: u8 = 0x80;

/// Time the EEPROM needs to commit a write before it accepts the next
/// transaction, in milliseconds
pub const SETTLE_MS: u32 = 100;

/// Deadline for a single bus transaction, in seconds
pub const TRANSACTION_TIMEOUT_SECS: u64 = 10;

/// Lowest valid SPD hub address on the bus
pub const CHIP_ADDRESS_FIRST: u8 = 0x50;

/// Highest valid SPD hub address on the bus
pub const CHIP_ADDRESS_LAST: u8 = 0x57;

/// Highest accepted bus number
pub const BUS_NUMBER_MAX: u8 = 99;
