//! Address range sets for partial writes
//!
//! A range specification is a comma-separated list of `a` or `a-b` tokens,
//! decimal or `0x`-prefixed hex, e.g. `0-0x7f,384,640-703`. Ranges are
//! inclusive, sorted on parse, and must not overlap or touch: each range has
//! to start after the previous one ends. An empty specification selects the
//! whole EEPROM.

use core::fmt;

use heapless::Vec;

use crate::regs;
use crate::types::Address;

/// Most disjoint ranges 1024 addresses can hold
pub const MAX_RANGES: usize = regs::EEPROM_SIZE / 2;

/// Range specification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// A token between commas was empty
    EmptyToken,
    /// A bound is not a decimal or `0x` hex number
    InvalidNumber,
    /// A bound is beyond the last EEPROM address
    OutOfBounds(u32),
    /// `first` is greater than `last`
    Reversed {
        /// First address of the range
        first: u16,
        /// Last address of the range
        last: u16,
    },
    /// A range starts within or at the end of the previous one
    Overlap {
        /// The earlier range
        previous: AddressRange,
        /// The range that collides with it
        next: AddressRange,
    },
    /// More ranges than can possibly be disjoint
    TooMany,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToken => write!(f, "empty range token"),
            Self::InvalidNumber => write!(f, "invalid number in range"),
            Self::OutOfBounds(v) => write!(f, "address {} is beyond 1023", v),
            Self::Reversed { first, last } => {
                write!(f, "range {}-{} ends before it starts", first, last)
            }
            Self::Overlap { previous, next } => {
                write!(f, "range {} overlaps or touches range {}", next, previous)
            }
            Self::TooMany => write!(f, "too many ranges"),
        }
    }
}

/// An inclusive address range `[first, last]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    first: u16,
    last: u16,
}

impl AddressRange {
    /// Create a range, checking `first <= last <= 1023`
    pub fn new(first: u16, last: u16) -> Result<Self, RangeError> {
        let max = (regs::EEPROM_SIZE - 1) as u16;
        if first > max {
            return Err(RangeError::OutOfBounds(first as u32));
        }
        if last > max {
            return Err(RangeError::OutOfBounds(last as u32));
        }
        if first > last {
            return Err(RangeError::Reversed { first, last });
        }
        Ok(Self { first, last })
    }

    /// The whole EEPROM
    pub const fn full() -> Self {
        Self {
            first: 0,
            last: (regs::EEPROM_SIZE - 1) as u16,
        }
    }

    /// First address
    pub const fn first(&self) -> u16 {
        self.first
    }

    /// Last address (inclusive)
    pub const fn last(&self) -> u16 {
        self.last
    }

    /// Number of addresses in the range
    pub const fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// Always false; a range holds at least one address
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `addr` falls inside the range
    pub const fn contains(&self, addr: u16) -> bool {
        addr >= self.first && addr <= self.last
    }

    /// Addresses in ascending order
    pub fn addresses(&self) -> impl Iterator<Item = Address> {
        (self.first..=self.last).filter_map(Address::new)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Sorted, pairwise disjoint address ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<AddressRange, MAX_RANGES>,
}

impl RangeSet {
    /// The single range covering the whole EEPROM
    pub fn full() -> Self {
        let mut ranges = Vec::new();
        // Capacity is far above one
        let _ = ranges.push(AddressRange::full());
        Self { ranges }
    }

    /// Parse a range specification; empty selects the whole EEPROM
    pub fn parse(spec: &str) -> Result<Self, RangeError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::full());
        }

        let mut ranges: Vec<AddressRange, MAX_RANGES> = Vec::new();
        for token in spec.split(',') {
            let range = parse_token(token.trim())?;
            ranges.push(range).map_err(|_| RangeError::TooMany)?;
        }
        Self::from_ranges(ranges)
    }

    /// Sort and validate a list of ranges
    pub fn from_ranges(
        mut ranges: Vec<AddressRange, MAX_RANGES>,
    ) -> Result<Self, RangeError> {
        ranges.sort_unstable_by_key(|r| r.first);
        for pair in ranges.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next.first <= previous.last {
                return Err(RangeError::Overlap { previous, next });
            }
        }
        Ok(Self { ranges })
    }

    /// The ranges, ascending
    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }

    /// Total number of addresses selected
    pub fn len(&self) -> usize {
        self.ranges.iter().map(AddressRange::len).sum()
    }

    /// Whether no address is selected
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether the set covers every EEPROM address
    pub fn is_full(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0] == AddressRange::full()
    }

    /// Whether `addr` is selected
    pub fn contains(&self, addr: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(addr))
    }

    /// All selected addresses in ascending order
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.ranges.iter().flat_map(AddressRange::addresses)
    }
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

fn parse_token(token: &str) -> Result<AddressRange, RangeError> {
    if token.is_empty() {
        return Err(RangeError::EmptyToken);
    }
    match token.split_once('-') {
        Some((first, last)) => {
            AddressRange::new(parse_bound(first.trim())?, parse_bound(last.trim())?)
        }
        None => {
            let addr = parse_bound(token)?;
            AddressRange::new(addr, addr)
        }
    }
}

/// Parse a decimal or `0x` hex address
fn parse_bound(s: &str) -> Result<u16, RangeError> {
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    }
    .map_err(|_| RangeError::InvalidNumber)?;

    if value as usize >= regs::EEPROM_SIZE {
        return Err(RangeError::OutOfBounds(value));
    }
    Ok(value as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    fn bounds(set: &RangeSet) -> std::vec::Vec<(u16, u16)> {
        set.ranges().iter().map(|r| (r.first(), r.last())).collect()
    }

    #[test]
    fn test_empty_is_full() {
        let set = RangeSet::parse("").unwrap();
        assert_eq!(bounds(&set), [(0, 1023)]);
        assert!(set.is_full());
        assert_eq!(set.len(), 1024);
        assert!(RangeSet::parse("  ").unwrap().is_full());
    }

    #[test]
    fn test_adjacent_ranges_accepted() {
        let set = RangeSet::parse("0-9,10-20").unwrap();
        assert_eq!(bounds(&set), [(0, 9), (10, 20)]);
        assert_eq!(set.len(), 21);
    }

    #[test]
    fn test_touching_ranges_rejected() {
        let err = RangeSet::parse("0-9,9-20").unwrap_err();
        assert!(matches!(err, RangeError::Overlap { .. }));
    }

    #[test]
    fn test_single_addresses() {
        let set = RangeSet::parse("5,7-8").unwrap();
        assert_eq!(bounds(&set), [(5, 5), (7, 8)]);
        assert!(set.contains(5));
        assert!(!set.contains(6));
        assert_eq!(set.to_string(), "5,7-8");
    }

    #[test]
    fn test_hex_and_sorting() {
        let set = RangeSet::parse("0x280-0x2bf, 0-0x1ff").unwrap();
        assert_eq!(bounds(&set), [(0, 511), (640, 703)]);
        let addrs: std::vec::Vec<u16> = set.addresses().map(|a| a.get()).collect();
        assert_eq!(addrs.len(), 576);
        assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_specs() {
        assert_eq!(RangeSet::parse("1,,2"), Err(RangeError::EmptyToken));
        assert_eq!(RangeSet::parse("abc"), Err(RangeError::InvalidNumber));
        assert_eq!(RangeSet::parse("0x"), Err(RangeError::InvalidNumber));
        assert_eq!(RangeSet::parse("1000-1024"), Err(RangeError::OutOfBounds(1024)));
        assert_eq!(
            RangeSet::parse("20-10"),
            Err(RangeError::Reversed { first: 20, last: 10 })
        );
        assert!(matches!(
            RangeSet::parse("0-100,50"),
            Err(RangeError::Overlap { .. })
        ));
    }
}
