//! Bit-serial arithmetic on bytes.
//!
//! These are the gate-level algorithms the ALU and program counter are
//! built from: a ripple-carry adder working from the least significant bit
//! leftward, and a ripple toggle counter.

use crate::binary::{Bit, Byte};

/// Add two bytes with an incoming carry, returning (result, carry_out).
///
/// Bits are processed least significant first; each column feeds its carry
/// into the column on its left.
pub fn ripple_add(a: &Byte, b: &Byte, carry_in: Bit) -> (Byte, Bit) {
    let mut result = Byte::zero();
    let mut carry = carry_in;

    for i in (0..Byte::WIDTH).rev() {
        let (sum, carry_out) = a.get(i).full_add(b.get(i), carry);
        result.set(i, sum);
        carry = carry_out;
    }

    (result, carry)
}

/// Two's-complement subtraction (a - b) via add-with-carry of the one's complement.
///
/// The returned carry is the adder's carry out: 1 when no borrow occurred.
#[inline]
pub fn ripple_subtract(a: &Byte, b: &Byte) -> (Byte, Bit) {
    ripple_add(a, &b.complement(), Bit::One)
}

/// Increment in place by toggling bits from the least significant end.
///
/// A bit that toggles to 1 absorbs the carry and stops the ripple; a bit that
/// toggles to 0 passes it on. All ones wraps to all zeros.
pub fn ripple_increment(value: &mut Byte) {
    for bit in value.bits_mut().iter_mut().rev() {
        if bit.toggle().is_set() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_basic() {
        let (result, carry) = ripple_add(&Byte::from_u8(3), &Byte::from_u8(2), Bit::Zero);
        assert_eq!(result.to_u8(), 5);
        assert_eq!(carry, Bit::Zero);
    }

    #[test]
    fn test_add_carry_out() {
        let (result, carry) = ripple_add(&Byte::from_u8(200), &Byte::from_u8(100), Bit::Zero);
        assert_eq!(result.to_u8(), 44);
        assert_eq!(carry, Bit::One);
    }

    #[test]
    fn test_add_carry_in() {
        let (result, carry) = ripple_add(&Byte::from_u8(0xFF), &Byte::zero(), Bit::One);
        assert!(result.is_zero());
        assert_eq!(carry, Bit::One);
    }

    #[test]
    fn test_subtract_borrow() {
        // 2 - 3 wraps to 0xFF with no carry out (a borrow happened)
        let (result, carry) = ripple_subtract(&Byte::from_u8(2), &Byte::from_u8(3));
        assert_eq!(result.to_u8(), 0xFF);
        assert_eq!(carry, Bit::Zero);
    }

    #[test]
    fn test_subtract_no_borrow() {
        let (result, carry) = ripple_subtract(&Byte::from_u8(3), &Byte::from_u8(2));
        assert_eq!(result.to_u8(), 1);
        assert_eq!(carry, Bit::One);
    }

    #[test]
    fn test_increment() {
        let mut value = Byte::from_u8(0b0000_0111);
        ripple_increment(&mut value);
        assert_eq!(value.to_u8(), 0b0000_1000);
    }

    #[test]
    fn test_increment_wraps() {
        let mut value = Byte::from_u8(0xFF);
        ripple_increment(&mut value);
        assert!(value.is_zero());
    }
}
