//! Module manufacturing information (bytes 512..551)

use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Offset of the module manufacturing block
pub const MANUFACTURING_OFFSET: usize = 512;

/// Raw layout of the manufacturing block
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ManufacturingInfo {
    /// JEP-106 manufacturer id (continuation code, manufacturer code)
    pub manufacturer_id: [u8; 2],
    /// Manufacturing location, vendor specific
    pub location: u8,
    /// Manufacturing year, BCD, years since 2000
    pub year_bcd: u8,
    /// Manufacturing week, BCD
    pub week_bcd: u8,
    /// Module serial number
    pub serial: [u8; 4],
    /// Module part number, ASCII padded with spaces
    pub part_number: [u8; 30],
}

/// Decoded manufacturing date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturingDate {
    /// Full year
    pub year: u16,
    /// Week of the year as stored (1..=52 when valid)
    pub week: u8,
}

impl ManufacturingDate {
    /// Whether the week number is usable for a calendar date
    pub fn has_valid_week(&self) -> bool {
        (1..=52).contains(&self.week)
    }
}

/// Decode a packed BCD byte
pub const fn bcd(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0f)
}

impl ManufacturingInfo {
    /// View the manufacturing block of a full SPD image
    pub fn from_image(data: &[u8]) -> Option<&Self> {
        let block = data.get(MANUFACTURING_OFFSET..)?;
        Self::ref_from_prefix(block).ok().map(|(info, _)| info)
    }

    /// Manufacturing date
    pub fn date(&self) -> ManufacturingDate {
        ManufacturingDate {
            year: 2000 + bcd(self.year_bcd) as u16,
            week: bcd(self.week_bcd),
        }
    }

    /// Part number with padding removed, if it is valid UTF-8
    pub fn part_number(&self) -> Option<&str> {
        core::str::from_utf8(&self.part_number)
            .ok()
            .map(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(core::mem::size_of::<ManufacturingInfo>(), 39);
    }

    #[test]
    fn test_decode() {
        let mut data = [0u8; 1024];
        data[512] = 0x80;
        data[513] = 0xce;
        data[515] = 0x23;
        data[516] = 0x14;
        data[517..521].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let pn = b"M321R8GA0BB0-CQK             ";
        data[521..521 + pn.len()].copy_from_slice(pn);

        let info = ManufacturingInfo::from_image(&data).unwrap();
        assert_eq!(info.manufacturer_id, [0x80, 0xce]);
        assert_eq!(
            info.date(),
            ManufacturingDate {
                year: 2023,
                week: 14
            }
        );
        assert!(info.date().has_valid_week());
        assert_eq!(info.serial, [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(info.part_number(), Some("M321R8GA0BB0-CQK"));
    }

    #[test]
    fn test_bcd() {
        assert_eq!(bcd(0x52), 52);
        assert_eq!(bcd(0x09), 9);
        let date = ManufacturingDate { year: 2000, week: 0 };
        assert!(!date.has_valid_week());
    }
}
