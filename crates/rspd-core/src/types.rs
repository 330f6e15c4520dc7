//! Addressing types
//!
//! Each of these newtypes can only hold an in-range value, so the address
//! translation in the read and write paths can never produce a page or
//! block number the hardware does not have.

use core::fmt;

use crate::error::{Error, Result};
use crate::regs;

/// 7-bit SMBus address of an SPD5 hub (0x50..=0x57)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChipAddress(u8);

impl ChipAddress {
    /// Hub of the module in the first slot
    pub const FIRST: Self = Self(regs::CHIP_ADDRESS_FIRST);

    /// Validate a raw 7-bit address
    pub fn new(addr: u8) -> Result<Self> {
        if (regs::CHIP_ADDRESS_FIRST..=regs::CHIP_ADDRESS_LAST).contains(&addr) {
            Ok(Self(addr))
        } else {
            Err(Error::InvalidChipAddress(addr))
        }
    }

    /// Raw 7-bit address
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Host SMBus number (the N in `/dev/i2c-N`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusNumber(u8);

impl BusNumber {
    /// Validate a bus number (0..=99)
    pub fn new(bus: u32) -> Result<Self> {
        if bus <= regs::BUS_NUMBER_MAX as u32 {
            Ok(Self(bus as u8))
        } else {
            Err(Error::InvalidBus(bus))
        }
    }

    /// Raw bus number
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical memory module: a hub address on a specific bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    /// Bus the module sits on
    pub bus: BusNumber,
    /// Address of the module's SPD5 hub
    pub chip: ChipAddress,
}

impl DeviceRef {
    /// Create a device reference
    pub const fn new(bus: BusNumber, chip: ChipAddress) -> Self {
        Self { bus, chip }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DIMM {} on bus {}", self.chip, self.bus)
    }
}

/// A 128-byte EEPROM page (0..=7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page(u8);

impl Page {
    /// The page the hub must be left on after every operation
    pub const FIRST: Page = Page(0);

    /// Create a page number, `None` if out of range
    pub const fn new(n: u8) -> Option<Self> {
        if (n as usize) < regs::PAGE_COUNT {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Raw page number, as written to the page select register
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Iterate over all pages in ascending order
    pub fn all() -> impl Iterator<Item = Page> {
        (0..regs::PAGE_COUNT as u8).map(Page)
    }
}

impl TryFrom<u8> for Page {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        Page::new(n).ok_or(Error::InvalidPage(n))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 64-byte write protection block (0..=15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block(u8);

impl Block {
    /// Create a block number, `None` if out of range
    pub const fn new(n: u8) -> Option<Self> {
        if (n as usize) < regs::BLOCK_COUNT {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Raw block number
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Index into a 16-entry table
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all blocks in ascending order
    pub fn all() -> impl Iterator<Item = Block> {
        (0..regs::BLOCK_COUNT as u8).map(Block)
    }

    /// First EEPROM address covered by this block
    pub const fn start(self) -> Address {
        Address(self.0 as u16 * regs::BLOCK_SIZE as u16)
    }
}

impl TryFrom<u8> for Block {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        Block::new(n).ok_or(Error::InvalidBlock(n))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A logical EEPROM byte address (0..=1023)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u16);

impl Address {
    /// Create an address, `None` if beyond the EEPROM
    pub const fn new(addr: u16) -> Option<Self> {
        if (addr as usize) < regs::EEPROM_SIZE {
            Some(Self(addr))
        } else {
            None
        }
    }

    /// Raw address
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Index into an image buffer
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Page holding this address
    pub const fn page(self) -> Page {
        Page((self.0 as usize / regs::PAGE_SIZE) as u8)
    }

    /// Offset within the page
    pub const fn offset(self) -> u8 {
        (self.0 as usize % regs::PAGE_SIZE) as u8
    }

    /// Write protection block holding this address
    pub const fn block(self) -> Block {
        Block((self.0 as usize / regs::BLOCK_SIZE) as u8)
    }

    /// Hub register that exposes this byte once its page is selected
    pub const fn data_register(self) -> u8 {
        regs::DATA_BASE | self.offset()
    }

    /// Whether this address starts a new page
    pub const fn is_page_start(self) -> bool {
        self.offset() == 0
    }

    /// Iterate over every EEPROM address in ascending order
    pub fn all() -> impl Iterator<Item = Address> {
        (0..regs::EEPROM_SIZE as u16).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_translation() {
        let addr = Address::new(700).unwrap();
        assert_eq!(addr.block().get(), 10);
        assert_eq!(addr.page().get(), 5);
        assert_eq!(addr.offset(), 60);
        assert_eq!(addr.data_register(), 0x80 | 60);
    }

    #[test]
    fn test_page_boundaries() {
        assert!(Address::new(0).unwrap().is_page_start());
        assert!(Address::new(128).unwrap().is_page_start());
        assert!(!Address::new(129).unwrap().is_page_start());
        assert_eq!(Address::new(1023).unwrap().page().get(), 7);
        assert_eq!(Address::new(1023).unwrap().data_register(), 0xff);
        assert!(Address::new(1024).is_none());
    }

    #[test]
    fn test_page_and_block_limits() {
        assert!(Page::new(7).is_some());
        assert!(Page::new(8).is_none());
        assert_eq!(Page::try_from(8), Err(Error::InvalidPage(8)));
        assert!(Block::new(15).is_some());
        assert_eq!(Block::try_from(16), Err(Error::InvalidBlock(16)));
        assert_eq!(Block::new(3).unwrap().start().get(), 192);
        assert_eq!(Page::all().count(), 8);
        assert_eq!(Block::all().count(), 16);
    }

    #[test]
    fn test_chip_address_and_bus() {
        assert!(ChipAddress::new(0x4f).is_err());
        assert!(ChipAddress::new(0x58).is_err());
        assert_eq!(ChipAddress::new(0x51).unwrap().get(), 0x51);
        assert!(BusNumber::new(99).is_ok());
        assert_eq!(BusNumber::new(100), Err(Error::InvalidBus(100)));
    }
}
