//! Fixed-width 8-bit words.
//!
//! A `Byte` is the unit carried by the bus and held by every register and
//! memory cell. Bits are stored most-significant first, the same order they
//! are printed in.

use crate::binary::Bit;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// An 8-bit word.
///
/// Serialized as its bit string (`"00000101"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Byte {
    /// Bits stored from most significant (index 0) to least significant (index 7)
    bits: [Bit; 8],
}

impl Byte {
    /// Number of bits in a Byte.
    pub const WIDTH: usize = 8;

    /// Create a new Byte with all zeros.
    #[inline]
    pub const fn zero() -> Self {
        Self { bits: [Bit::Zero; 8] }
    }

    /// Get the underlying bit array (MSB first).
    #[inline]
    pub const fn bits(&self) -> &[Bit; 8] {
        &self.bits
    }

    #[inline]
    pub fn bits_mut(&mut self) -> &mut [Bit; 8] {
        &mut self.bits
    }

    /// Get a single bit by index (0 = MSB).
    #[inline]
    pub const fn get(&self, index: usize) -> Bit {
        self.bits[index]
    }

    /// Set a single bit by index (0 = MSB).
    #[inline]
    pub fn set(&mut self, index: usize, bit: Bit) {
        self.bits[index] = bit;
    }

    /// Create from an unsigned integer.
    pub const fn from_u8(value: u8) -> Self {
        let mut bits = [Bit::Zero; 8];
        let mut i = 0;
        while i < 8 {
            bits[i] = Bit::from_bool(value & (0x80 >> i) != 0);
            i += 1;
        }
        Self { bits }
    }

    /// Unsigned integer read of the bits.
    pub const fn to_u8(&self) -> u8 {
        let mut value = 0u8;
        let mut i = 0;
        while i < 8 {
            value = (value << 1) | self.bits[i].to_u8();
            i += 1;
        }
        value
    }

    /// Build from a high and a low nibble; only the low 4 bits of each are used.
    pub const fn from_nibbles(high: u8, low: u8) -> Self {
        Self::from_u8(((high & 0x0F) << 4) | (low & 0x0F))
    }

    /// The 4 most-significant bits as an integer.
    #[inline]
    pub const fn high_nibble(&self) -> u8 {
        self.to_u8() >> 4
    }

    /// The 4 least-significant bits as an integer.
    #[inline]
    pub const fn low_nibble(&self) -> u8 {
        self.to_u8() & 0x0F
    }

    /// Keep only the `width` least-significant bits, clearing the rest.
    pub fn low_bits(&self, width: usize) -> Self {
        let mut result = *self;
        let cut = Self::WIDTH.saturating_sub(width);
        for bit in &mut result.bits[..cut] {
            *bit = Bit::Zero;
        }
        result
    }

    /// One's complement: invert every bit.
    pub fn complement(&self) -> Self {
        let mut bits = self.bits;
        for bit in &mut bits {
            *bit = bit.not();
        }
        Self { bits }
    }

    /// Check if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|b| !b.is_set())
    }

    /// Parse from a bit string such as `"00000101"` or `"0b00000101"`.
    ///
    /// Underscores are ignored so `"0000_0101"` is accepted too.
    pub fn parse(s: &str) -> Result<Self, ParseByteError> {
        let s = s.trim();
        let s = s.strip_prefix("0b").unwrap_or(s);
        let digits: Vec<char> = s.chars().filter(|c| *c != '_').collect();

        if digits.len() != Self::WIDTH {
            return Err(ParseByteError::WrongLength { expected: Self::WIDTH, got: digits.len() });
        }

        let mut bits = [Bit::Zero; 8];
        for (i, c) in digits.into_iter().enumerate() {
            bits[i] = Bit::from_char(c).ok_or(ParseByteError::InvalidChar(c))?;
        }

        Ok(Self { bits })
    }
}

impl fmt::Debug for Byte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Byte({} = {})", self, self.to_u8())
    }
}

impl fmt::Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl std::ops::Not for Byte {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.complement()
    }
}

impl From<u8> for Byte {
    fn from(value: u8) -> Self {
        Byte::from_u8(value)
    }
}

impl From<Byte> for u8 {
    fn from(byte: Byte) -> Self {
        byte.to_u8()
    }
}

impl From<Byte> for String {
    fn from(byte: Byte) -> Self {
        byte.to_string()
    }
}

impl TryFrom<String> for Byte {
    type Error = ParseByteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Byte::parse(&value)
    }
}

impl std::str::FromStr for Byte {
    type Err = ParseByteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Byte::parse(s)
    }
}

/// Errors from parsing a bit string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseByteError {
    #[error("expected {expected} bits, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("invalid bit character: '{0}' (expected 0 or 1)")]
    InvalidChar(char),
}
