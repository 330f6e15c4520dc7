//! SPD section checksums
//!
//! Every checksummed SPD section ends with a little-endian CRC-16 computed
//! over the rest of the section. The algorithm is the CCITT polynomial
//! 0x1021 with a zero initial value and no reflection (catalogued as
//! CRC-16/XMODEM).

use crc::{Crc, CRC_16_XMODEM};

/// Checksum algorithm used by the SPD EEPROM
pub const SPD_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC-16 of a byte slice
pub fn checksum(bytes: &[u8]) -> u16 {
    SPD_CRC.checksum(bytes)
}

/// Checksum of the section `[start, end)`, excluding its two trailing
/// checksum bytes
pub fn compute(bytes: &[u8], start: usize, end: usize) -> u16 {
    checksum(&bytes[start..end - 2])
}

/// Stored checksum of the section starting at `start` with length `len`
pub fn read(bytes: &[u8], start: usize, len: usize) -> u16 {
    let slot = start + len - 2;
    u16::from_le_bytes([bytes[slot], bytes[slot + 1]])
}

/// Store `crc` in the section's checksum slot
pub fn patch(bytes: &mut [u8], start: usize, len: usize, crc: u16) {
    let slot = start + len - 2;
    bytes[slot..slot + 2].copy_from_slice(&crc.to_le_bytes());
}
