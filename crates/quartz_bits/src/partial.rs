//! Three-valued (0/1/x) bit vectors for known-bits analysis.
//!
//! A [`PartialBitString`] pairs a value with a known-mask of the same
//! width. Bit `i` reads as 1 when `known[i] && value[i]`, as 0 when
//! `known[i] && !value[i]`, and as unknown otherwise. Value bits at
//! unknown positions are canonically zero, so derived equality ignores
//! unknown payloads.

use crate::bitstring::BitString;
use crate::error::BitsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A bit vector whose bits are 0, 1, or unknown.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialBitString {
    known: BitString,
    value: BitString,
}

impl PartialBitString {
    /// Creates a partial bit string from a known-mask and a value.
    ///
    /// # Panics
    ///
    /// Panics if the widths differ.
    pub fn new(known: BitString, value: BitString) -> Self {
        assert_eq!(
            known.width(),
            value.width(),
            "known mask and value must have the same width, but got {} and {}",
            known.width(),
            value.width()
        );
        let value = &value & &known;
        Self { known, value }
    }

    /// Creates a fully-known partial bit string.
    pub fn from_bits(value: &BitString) -> Self {
        Self {
            known: !&BitString::new(value.width()),
            value: value.clone(),
        }
    }

    /// Creates a fully-unknown partial bit string of the given width.
    pub fn unknown(width: usize) -> Self {
        Self {
            known: BitString::new(width),
            value: BitString::new(width),
        }
    }

    /// Parses a string of `0`, `1`, and `x` digits (MSB first).
    pub fn parse(string: &str) -> Result<Self, BitsError> {
        let width = string.chars().count();
        let mut known = BitString::new(width);
        let mut value = BitString::new(width);
        for (it, chr) in string.chars().enumerate() {
            let index = width - it - 1;
            match chr {
                '0' => known.set(index, true),
                '1' => {
                    known.set(index, true);
                    value.set(index, true);
                }
                'x' | 'X' => {}
                found => return Err(BitsError::InvalidDigit { found }),
            }
        }
        Ok(Self { known, value })
    }

    /// Returns the width in bits.
    pub fn width(&self) -> usize {
        self.known.width()
    }

    /// Returns the known-mask.
    pub fn known(&self) -> &BitString {
        &self.known
    }

    /// Returns the value (zero at unknown positions).
    pub fn value(&self) -> &BitString {
        &self.value
    }

    /// Returns true if every bit is known.
    pub fn is_fully_known(&self) -> bool {
        self.known.is_all_ones()
    }

    /// Returns the bit at the given index, or `None` if it is unknown.
    pub fn bit(&self, index: usize) -> Option<bool> {
        self.known.at(index).then(|| self.value.at(index))
    }

    fn known_ones(&self) -> BitString {
        &self.known & &self.value
    }

    fn known_zeros(&self) -> BitString {
        &self.known & &!&self.value
    }

    /// Lifts an exact binary `BitString` operation, producing a
    /// fully-unknown result unless both operands are fully known.
    fn exact2(
        &self,
        other: &Self,
        width: usize,
        exact: impl FnOnce(&BitString, &BitString) -> BitString,
    ) -> Self {
        if self.is_fully_known() && other.is_fully_known() {
            Self::from_bits(&exact(&self.value, &other.value))
        } else {
            Self::unknown(width)
        }
    }

    /// Wrapping addition; unknown unless both operands are fully known.
    pub fn add(&self, other: &Self) -> Self {
        self.exact2(other, self.width(), |a, b| a + b)
    }

    /// Wrapping subtraction; unknown unless both operands are fully known.
    pub fn sub(&self, other: &Self) -> Self {
        self.exact2(other, self.width(), |a, b| a - b)
    }

    /// Full-width unsigned multiplication; unknown unless both operands are
    /// fully known.
    pub fn mul_u(&self, other: &Self) -> Self {
        self.exact2(other, self.width() + other.width(), |a, b| a.mul_u(b))
    }

    /// Left shift by a bit-string amount; unknown unless both operands are
    /// fully known.
    pub fn shl_bits(&self, amount: &Self) -> Self {
        self.exact2(amount, self.width(), |a, b| a.shl_bits(b))
    }

    /// Logical right shift; unknown unless both operands are fully known.
    pub fn shr_u_bits(&self, amount: &Self) -> Self {
        self.exact2(amount, self.width(), |a, b| a.shr_u_bits(b))
    }

    /// Arithmetic right shift; unknown unless both operands are fully known.
    pub fn shr_s_bits(&self, amount: &Self) -> Self {
        self.exact2(amount, self.width(), |a, b| a.shr_s_bits(b))
    }

    /// Concatenation with `self` as the high bits; exact per bit.
    pub fn concat(&self, low: &Self) -> Self {
        Self {
            known: self.known.concat(&low.known),
            value: self.value.concat(&low.value),
        }
    }

    /// Extracts bits `[offset, offset + width)`; exact per bit.
    pub fn slice_width(&self, offset: usize, width: usize) -> Result<Self, BitsError> {
        Ok(Self {
            known: self.known.slice_width(offset, width)?,
            value: self.value.slice_width(offset, width)?,
        })
    }

    fn compare(
        &self,
        other: &Self,
        exact: impl FnOnce(&BitString, &BitString) -> bool,
    ) -> Self {
        if self.is_fully_known() && other.is_fully_known() {
            Self::from_bits(&BitString::from_bool(exact(&self.value, &other.value)))
        } else {
            Self::unknown(1)
        }
    }

    /// Equality test producing a width-1 partial.
    pub fn eq_bits(&self, other: &Self) -> Self {
        self.compare(other, |a, b| a == b)
    }

    /// Unsigned less-than producing a width-1 partial.
    pub fn lt_u(&self, other: &Self) -> Self {
        self.compare(other, BitString::lt_u)
    }

    /// Unsigned less-or-equal producing a width-1 partial.
    pub fn le_u(&self, other: &Self) -> Self {
        self.compare(other, BitString::le_u)
    }

    /// Signed less-than producing a width-1 partial.
    pub fn lt_s(&self, other: &Self) -> Self {
        self.compare(other, BitString::lt_s)
    }

    /// Signed less-or-equal producing a width-1 partial.
    pub fn le_s(&self, other: &Self) -> Self {
        self.compare(other, BitString::le_s)
    }

    /// Selects between two branches on a single-bit condition. A condition
    /// that is not fully known merges the branches.
    pub fn select(&self, then: &Self, otherwise: &Self) -> Self {
        if self.is_fully_known() {
            if self.value.as_bool() {
                then.clone()
            } else {
                otherwise.clone()
            }
        } else {
            then.merge(otherwise)
        }
    }

    /// Bit-wise agreement: known only where both operands are known and
    /// agree.
    pub fn merge(&self, other: &Self) -> Self {
        let known = &(&self.known & &other.known) & &!&(&self.value ^ &other.value);
        let value = &self.value & &known;
        Self { known, value }
    }
}

impl BitAnd for &PartialBitString {
    type Output = PartialBitString;

    fn bitand(self, other: Self) -> PartialBitString {
        // Kleene AND: a known zero forces the result regardless of the
        // other side.
        let zeros = &self.known_zeros() | &other.known_zeros();
        let ones = &self.known_ones() & &other.known_ones();
        PartialBitString {
            known: &zeros | &ones,
            value: ones,
        }
    }
}

impl BitOr for &PartialBitString {
    type Output = PartialBitString;

    fn bitor(self, other: Self) -> PartialBitString {
        let ones = &self.known_ones() | &other.known_ones();
        let zeros = &self.known_zeros() & &other.known_zeros();
        PartialBitString {
            known: &zeros | &ones,
            value: ones,
        }
    }
}

impl BitXor for &PartialBitString {
    type Output = PartialBitString;

    fn bitxor(self, other: Self) -> PartialBitString {
        let known = &self.known & &other.known;
        let value = &(&self.value ^ &other.value) & &known;
        PartialBitString { known, value }
    }
}

impl Not for &PartialBitString {
    type Output = PartialBitString;

    fn not(self) -> PartialBitString {
        let value = &!&self.value & &self.known;
        PartialBitString {
            known: self.known.clone(),
            value,
        }
    }
}

impl fmt::Display for PartialBitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b", self.width())?;
        for it in (0..self.width()).rev() {
            let chr = match self.bit(it) {
                Some(true) => '1',
                Some(false) => '0',
                None => 'x',
            };
            write!(f, "{chr}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PartialBitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartialBitString({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(s: &str) -> PartialBitString {
        PartialBitString::parse(s).unwrap()
    }

    fn bits(s: &str) -> BitString {
        BitString::parse(s).unwrap()
    }

    #[test]
    fn parse_and_display() {
        let p = partial("10x1");
        assert_eq!(format!("{p}"), "4'b10x1");
        assert_eq!(p.bit(0), Some(true));
        assert_eq!(p.bit(1), None);
        assert_eq!(p.bit(3), Some(true));
    }

    #[test]
    fn parse_rejects_bad_digit() {
        assert!(PartialBitString::parse("0z").is_err());
    }

    #[test]
    fn equality_ignores_unknown_payload() {
        let a = PartialBitString::new(bits("10"), bits("01"));
        let b = PartialBitString::new(bits("10"), bits("11"));
        // Bit 0 is unknown in both; the differing payload must not matter.
        assert_eq!(a, b);
    }

    #[test]
    fn kleene_and() {
        let a = partial("01x0x");
        let b = partial("0x1xx");
        assert_eq!(&a & &b, partial("0xx0x"));
        // 0 ∧ x = 0 even when the other side is unknown.
        assert_eq!(&partial("0") & &partial("x"), partial("0"));
        assert_eq!(&partial("1") & &partial("x"), partial("x"));
    }

    #[test]
    fn kleene_or() {
        assert_eq!(&partial("1") | &partial("x"), partial("1"));
        assert_eq!(&partial("0") | &partial("x"), partial("x"));
        assert_eq!(&partial("10x") | &partial("0xx"), partial("1xx"));
    }

    #[test]
    fn kleene_xor_and_not() {
        assert_eq!(&partial("1x01") ^ &partial("110x"), partial("0x0x"));
        assert_eq!(!&partial("10x"), partial("01x"));
    }

    #[test]
    fn fully_known_ops_are_exact() {
        let a = partial("0101");
        let b = partial("0011");
        assert_eq!(a.add(&b), partial("1000"));
        assert_eq!(a.sub(&b), partial("0010"));
        assert_eq!(a.lt_u(&b).bit(0), Some(false));
        assert_eq!(a.eq_bits(&a).bit(0), Some(true));
    }

    #[test]
    fn any_unknown_poisons_arithmetic() {
        let a = partial("010x");
        let b = partial("0011");
        assert_eq!(a.add(&b), PartialBitString::unknown(4));
        assert_eq!(a.lt_u(&b), PartialBitString::unknown(1));
        assert_eq!(a.shl_bits(&b), PartialBitString::unknown(4));
    }

    #[test]
    fn mul_width_grows() {
        let a = partial("11");
        let b = partial("11");
        assert_eq!(a.mul_u(&b), partial("1001"));
        assert_eq!(partial("1x").mul_u(&b).width(), 4);
    }

    #[test]
    fn concat_and_slice_are_bitwise() {
        let a = partial("1x");
        let b = partial("0x1");
        let joined = a.concat(&b);
        assert_eq!(joined, partial("1x0x1"));
        assert_eq!(joined.slice_width(0, 3).unwrap(), b);
        assert_eq!(joined.slice_width(3, 2).unwrap(), a);
    }

    #[test]
    fn select_known_condition() {
        let t = partial("11");
        let e = partial("00");
        assert_eq!(partial("1").select(&t, &e), t);
        assert_eq!(partial("0").select(&t, &e), e);
    }

    #[test]
    fn select_unknown_condition_merges() {
        let t = partial("110");
        let e = partial("100");
        assert_eq!(partial("x").select(&t, &e), partial("1x0"));
    }

    #[test]
    fn merge_agreement() {
        let a = partial("1x10");
        let b = partial("1011");
        assert_eq!(a.merge(&b), partial("1x1x"));
    }

    #[test]
    fn matches_bitstring_when_fully_known() {
        for _ in 0..32 {
            let a = BitString::random(9);
            let b = BitString::random(9);
            let pa = PartialBitString::from_bits(&a);
            let pb = PartialBitString::from_bits(&b);
            assert_eq!(*(&pa & &pb).value(), &a & &b);
            assert_eq!(*(&pa | &pb).value(), &a | &b);
            assert_eq!(*(&pa ^ &pb).value(), &a ^ &b);
            assert_eq!(*pa.add(&pb).value(), &a + &b);
            assert_eq!(*pa.sub(&pb).value(), &a - &b);
            assert_eq!(pa.lt_u(&pb).bit(0), Some(a.lt_u(&b)));
            assert_eq!(pa.lt_s(&pb).bit(0), Some(a.lt_s(&b)));
            assert_eq!(pa.le_u(&pb).bit(0), Some(a.le_u(&b)));
            assert_eq!(pa.le_s(&pb).bit(0), Some(a.le_s(&b)));
        }
    }

    #[test]
    fn serde_roundtrip() {
        let p = partial("10x");
        let json = serde_json::to_string(&p).unwrap();
        let back: PartialBitString = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
