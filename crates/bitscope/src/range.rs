//! Half-open bit ranges over the global bit address space of a buffer.
//!
//! Bits are numbered from zero at the start of the buffer, eight per byte,
//! most-significant bit first. A [`BitRange`] covers `[start, end)`; the end
//! bit itself is never part of the range. Ranges are plain `Copy` values and
//! every operation is pure, so ranges can be compared and cached freely.
use std::fmt;

/// Error returned when a [`BitRange`] cannot be constructed.
///
/// These indicate malformed node extents coming out of a parser and are
/// never clamped into a valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// `start` is greater than `end`.
    Reversed { start: u64, end: u64 },
    /// One of the endpoints is negative.
    Negative { start: i64, end: i64 },
    /// `start + size` (or `byte * 8`) does not fit in the address space.
    Overflow { start: u64, size: u64 },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Reversed { start, end } => {
                write!(f, "invalid bit range: start {} > end {}", start, end)
            }
            RangeError::Negative { start, end } => {
                write!(f, "invalid bit range: negative endpoint in [{}, {})", start, end)
            }
            RangeError::Overflow { start, size } => {
                write!(
                    f,
                    "invalid bit range: start {} + size {} overflows the address space",
                    start, size
                )
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// Half-open interval `[start, end)` of bit positions.
///
/// Equality is structural: two ranges are equal iff both endpoints match.
/// A degenerate range (`start == end`) has a count of zero and contains
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitRange {
    start: u64,
    end: u64,
}

impl BitRange {
    /// Create a range from its endpoints. Fails if `start > end`.
    pub fn new(start: u64, end: u64) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a range from a start bit and a length in bits, the way syntax
    /// nodes describe their extent.
    pub fn from_extent(start: u64, size: u64) -> Result<Self, RangeError> {
        let end = start
            .checked_add(size)
            .ok_or(RangeError::Overflow { start, size })?;
        Ok(Self { start, end })
    }

    /// The eight bits of byte `byte_pos`: `[byte_pos * 8, byte_pos * 8 + 8)`.
    pub fn byte(byte_pos: u64) -> Result<Self, RangeError> {
        let overflow = RangeError::Overflow {
            start: byte_pos,
            size: 8,
        };
        let start = byte_pos.checked_mul(8).ok_or(overflow)?;
        let end = start.checked_add(8).ok_or(overflow)?;
        Ok(Self { start, end })
    }

    /// First bit of the range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last bit of the range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bits covered.
    pub fn count(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `true` iff `start <= bit < end`.
    pub fn contains(&self, bit: u64) -> bool {
        self.start <= bit && bit < self.end
    }

    /// Intersection of two ranges.
    ///
    /// Disjoint ranges intersect to the degenerate range anchored at the
    /// larger of the two starts, so the result is the same whichever side
    /// the call is made from.
    pub fn intersect(&self, other: &BitRange) -> BitRange {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            BitRange { start, end: start }
        } else {
            BitRange { start, end }
        }
    }

    /// `true` when the two ranges share at least one bit.
    pub fn overlaps(&self, other: &BitRange) -> bool {
        self.intersect(other).count() > 0
    }

    /// Inclusive `(first, last)` byte indices touched by the range, or `None`
    /// for a degenerate range.
    pub fn byte_span(&self) -> Option<(u64, u64)> {
        if self.is_empty() {
            return None;
        }
        Some((self.start / 8, (self.end - 1) / 8))
    }
}

impl TryFrom<(i64, i64)> for BitRange {
    type Error = RangeError;

    fn try_from((start, end): (i64, i64)) -> Result<Self, Self::Error> {
        if start < 0 || end < 0 {
            return Err(RangeError::Negative { start, end });
        }
        BitRange::new(start as u64, end as u64)
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
