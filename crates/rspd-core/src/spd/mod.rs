//! SPD image handling
//!
//! An [`SpdImage`] is a complete 1024-byte EEPROM image, either read from a
//! module or loaded from a dump file. This module also decodes the parts of
//! the image the tools report on: the memory type byte, the checksummed
//! sections and the manufacturing block.

pub mod crc;
mod info;
mod sections;

pub use info::{bcd, ManufacturingDate, ManufacturingInfo, MANUFACTURING_OFFSET};
pub use sections::*;

use heapless::Vec;

use crate::error::{Error, Result};
use crate::regs;
use crate::types::Address;

/// Offset of the DRAM device type byte
pub const DRAM_TYPE_OFFSET: usize = 2;

/// DRAM device type byte value for DDR5 SDRAM
pub const DRAM_TYPE_DDR5: u8 = 0x12;

/// Stored and recomputed checksum of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCheck {
    /// The section checked
    pub section: Section,
    /// Checksum found in the image
    pub stored: u16,
    /// Checksum computed over the section contents
    pub computed: u16,
}

impl SectionCheck {
    /// Whether the stored checksum is correct
    pub fn is_valid(&self) -> bool {
        self.stored == self.computed
    }
}

/// A complete 1024-byte SPD EEPROM image
#[derive(Clone, PartialEq, Eq)]
pub struct SpdImage {
    data: [u8; regs::EEPROM_SIZE],
}

impl SpdImage {
    /// An image of all zeroes
    pub const fn zeroed() -> Self {
        Self {
            data: [0; regs::EEPROM_SIZE],
        }
    }

    /// Wrap a raw image
    pub const fn new(data: [u8; regs::EEPROM_SIZE]) -> Self {
        Self { data }
    }

    /// Copy a dump; anything but exactly 1024 bytes is rejected
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let data: [u8; regs::EEPROM_SIZE] =
            data.try_into().map_err(|_| Error::ImageSize(data.len()))?;
        Ok(Self { data })
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; regs::EEPROM_SIZE] {
        &self.data
    }

    /// Mutable raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8; regs::EEPROM_SIZE] {
        &mut self.data
    }

    /// Byte at `addr`
    pub fn get(&self, addr: Address) -> u8 {
        self.data[addr.index()]
    }

    /// Set the byte at `addr`
    pub fn set(&mut self, addr: Address, value: u8) {
        self.data[addr.index()] = value;
    }

    /// DRAM device type byte
    pub fn dram_type(&self) -> u8 {
        self.data[DRAM_TYPE_OFFSET]
    }

    /// Whether the image describes a DDR5 module
    pub fn is_ddr5(&self) -> bool {
        self.dram_type() == DRAM_TYPE_DDR5
    }

    /// Manufacturing block
    pub fn manufacturing(&self) -> Option<&ManufacturingInfo> {
        ManufacturingInfo::from_image(&self.data)
    }

    /// Checksummed sections present in this image
    pub fn sections(&self) -> Vec<Section, MAX_SECTIONS> {
        present_sections(&self.data)
    }

    /// Compare stored and computed checksums of every present section
    pub fn check_sections(&self) -> Vec<SectionCheck, MAX_SECTIONS> {
        self.sections()
            .into_iter()
            .map(|section| SectionCheck {
                section,
                stored: crc::read(&self.data, section.start, section.len),
                computed: crc::compute(&self.data, section.start, section.end()),
            })
            .collect()
    }

    /// Whether every present section has a correct checksum
    pub fn checksums_valid(&self) -> bool {
        self.check_sections().iter().all(SectionCheck::is_valid)
    }

    /// Recompute and store the checksum of every present section
    ///
    /// Returns the number of sections whose checksum changed.
    pub fn fix_checksums(&mut self) -> usize {
        let mut changed = 0;
        for section in self.sections() {
            let computed = crc::compute(&self.data, section.start, section.end());
            if crc::read(&self.data, section.start, section.len) != computed {
                changed += 1;
            }
            crc::patch(&mut self.data, section.start, section.len, computed);
        }
        changed
    }
}

impl Default for SpdImage {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl core::fmt::Debug for SpdImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpdImage")
            .field("dram_type", &self.dram_type())
            .field("sections", &self.sections().len())
            .finish()
    }
}

impl AsRef<[u8]> for SpdImage {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
