//! Checksummed SPD sections
//!
//! The base configuration (bytes 0..512) is always present. XMP 3.0 profiles
//! and the EXPO block only exist on some modules and are detected by their
//! magic bytes.

use core::fmt;

use heapless::Vec;

/// Base configuration section: bytes 0..512
pub const BASE_LEN: usize = 512;

/// Start of the XMP 3.0 header
pub const XMP_OFFSET: usize = 640;
/// Length of the XMP 3.0 header and of each profile
pub const XMP_PROFILE_LEN: usize = 64;
/// XMP 3.0 header magic
pub const XMP_MAGIC: [u8; 2] = [0x0c, 0x4a];
/// First byte of a present XMP profile
pub const XMP_PROFILE_PRESENT: u8 = 0x30;
/// Highest XMP profile number
pub const XMP_PROFILE_COUNT: u8 = 5;

/// Start of the EXPO block
pub const EXPO_OFFSET: usize = 832;
/// Length of the EXPO block
pub const EXPO_LEN: usize = 128;
/// EXPO block magic
pub const EXPO_MAGIC: &[u8; 4] = b"EXPO";

/// Most sections an image can contain (base, five XMP profiles, EXPO)
pub const MAX_SECTIONS: usize = 7;

/// Kind of checksummed section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Base configuration and module parameters
    Base,
    /// XMP 3.0 profile 1..=5
    Xmp(u8),
    /// AMD EXPO block
    Expo,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "Main"),
            Self::Xmp(n) => write!(f, "XMP profile #{}", n),
            Self::Expo => write!(f, "EXPO"),
        }
    }
}

/// A checksummed byte range whose last two bytes hold its CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// What the section holds
    pub kind: SectionKind,
    /// First byte
    pub start: usize,
    /// Length including the checksum slot
    pub len: usize,
}

impl Section {
    /// The base configuration section
    pub const fn base() -> Self {
        Self {
            kind: SectionKind::Base,
            start: 0,
            len: BASE_LEN,
        }
    }

    /// XMP profile `n` (1..=5)
    pub const fn xmp_profile(n: u8) -> Self {
        Self {
            kind: SectionKind::Xmp(n),
            start: XMP_OFFSET + n as usize * XMP_PROFILE_LEN,
            len: XMP_PROFILE_LEN,
        }
    }

    /// The EXPO block
    pub const fn expo() -> Self {
        Self {
            kind: SectionKind::Expo,
            start: EXPO_OFFSET,
            len: EXPO_LEN,
        }
    }

    /// One past the last byte
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Whether the XMP 3.0 header magic is present
pub fn xmp_present(data: &[u8]) -> bool {
    data[XMP_OFFSET..XMP_OFFSET + 2] == XMP_MAGIC
}

/// Whether XMP profile `n` (1..=5) is present
pub fn xmp_profile_present(data: &[u8], n: u8) -> bool {
    data[Section::xmp_profile(n).start] == XMP_PROFILE_PRESENT
}

/// Whether the EXPO magic is present
pub fn expo_present(data: &[u8]) -> bool {
    &data[EXPO_OFFSET..EXPO_OFFSET + 4] == EXPO_MAGIC
}

/// Every section present in `data`, in address order of discovery:
/// base, XMP profiles 1..5, EXPO
pub fn present_sections(data: &[u8]) -> Vec<Section, MAX_SECTIONS> {
    let mut sections = Vec::new();
    // Never more than MAX_SECTIONS pushes below
    let _ = sections.push(Section::base());
    if xmp_present(data) {
        for n in 1..=XMP_PROFILE_COUNT {
            if xmp_profile_present(data, n) {
                let _ = sections.push(Section::xmp_profile(n));
            }
        }
    }
    if expo_present(data) {
        let _ = sections.push(Section::expo());
    }
    sections
}
