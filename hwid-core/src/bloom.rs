//! 64-bit single-checksum bloom values
//!
//! A bloom value is not a multi-hash filter: one 32-bit checksum of the input
//! is cut into 6-bit chunks and every chunk marks one of 64 bit positions.
//! At most six bits are set per input. Values from several inputs are merged
//! with a bitwise union and compared filter-to-filter with [`BloomValue::contains`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::constants::bloom::{CHUNK_BITS, CHUNK_MASK, MAX_INPUT_LEN, MIN_INPUT_LEN};

/// A 64-bit probabilistic membership filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloomValue(u64);

impl BloomValue {
    /// The filter with no bits set
    pub const EMPTY: Self = Self(0);

    /// Wrap a raw 64-bit value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Encode a byte buffer
    ///
    /// Buffers outside `1..=512` bytes yield [`BloomValue::EMPTY`].
    pub fn encode(buffer: &[u8]) -> Self {
        if !(MIN_INPUT_LEN..=MAX_INPUT_LEN).contains(&buffer.len()) {
            return Self::EMPTY;
        }

        let mut checksum = checksum(buffer);
        let mut value = 0u64;

        while checksum != 0 {
            value |= 1u64 << (checksum & CHUNK_MASK);
            checksum >>= CHUNK_BITS;
        }

        Self(value)
    }

    /// Encode the UTF-8 bytes of a string
    pub fn encode_str(s: &str) -> Self {
        Self::encode(s.as_bytes())
    }

    /// Number of set bits, in `0..=64`
    pub const fn weight(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bitwise union of two filters
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self` contains `other` when every bit of `other` is set in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for BloomValue {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for BloomValue {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl FromIterator<BloomValue> for BloomValue {
    fn from_iter<I: IntoIterator<Item = BloomValue>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::union)
    }
}

/// Formats as 16 uppercase hex digits
impl fmt::Display for BloomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl fmt::UpperHex for BloomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl From<u64> for BloomValue {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<BloomValue> for u64 {
    fn from(value: BloomValue) -> Self {
        value.0
    }
}

/// 32-bit checksum feeding the bloom encoder
fn checksum(buffer: &[u8]) -> u32 {
    crc32c::crc32c(buffer)
}

// ============================================================================
// Tests
// ============================================================================
