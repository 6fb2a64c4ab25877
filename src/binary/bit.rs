//! A single binary digit.
//!
//! Every line in the machine (bus lines, register cells, control pins,
//! flags) carries one of these.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single binary digit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bit {
    /// Low (0)
    #[default]
    Zero = 0,
    /// High (1)
    One = 1,
}

impl Bit {
    /// Both bit values in order: 0, 1
    pub const ALL: [Bit; 2] = [Bit::Zero, Bit::One];

    /// Create a bit from a boolean.
    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        if value { Bit::One } else { Bit::Zero }
    }

    /// Parse a `'0'`/`'1'` character.
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        }
    }

    /// Convert to integer value.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }

    /// Returns true if this bit is high.
    #[inline]
    pub const fn is_set(self) -> bool {
        matches!(self, Bit::One)
    }

    /// Invert the bit.
    #[inline]
    pub const fn not(self) -> Self {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }

    #[inline]
    pub const fn and(self, other: Self) -> Self {
        Bit::from_bool(self.is_set() && other.is_set())
    }

    #[inline]
    pub const fn or(self, other: Self) -> Self {
        Bit::from_bool(self.is_set() || other.is_set())
    }

    #[inline]
    pub const fn xor(self, other: Self) -> Self {
        Bit::from_bool(self.is_set() != other.is_set())
    }

    /// Full adder: adds three bits (a, b, c_in), returns (sum, carry_out).
    ///
    /// `sum = a ^ b ^ c`, `carry = ((a ^ b) & c) | (a & b)`.
    #[inline]
    pub const fn full_add(self, other: Self, carry_in: Self) -> (Self, Self) {
        let half = self.xor(other);
        let sum = half.xor(carry_in);
        let carry_out = half.and(carry_in).or(self.and(other));
        (sum, carry_out)
    }

    /// Toggle in place, returning the new value.
    #[inline]
    pub fn toggle(&mut self) -> Self {
        *self = self.not();
        *self
    }
}

impl fmt::Debug for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        Bit::from_bool(value)
    }
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        bit.is_set()
    }
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> Self {
        bit.to_u8()
    }
}
