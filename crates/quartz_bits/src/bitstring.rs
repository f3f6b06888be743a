//! Fixed-width arbitrary-precision bit vectors.
//!
//! A [`BitString`] stores its bits little-endian in packed 64-bit words.
//! Widths up to 128 bits are held inline without allocating. Every
//! operation keeps the excess bits of the top word zeroed, so structural
//! equality and hashing can work directly on the packed representation.

use crate::error::BitsError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Not, Sub};

type Word = u64;
const WORD_WIDTH: usize = 64;

/// A fixed-width bit vector with wraparound arithmetic.
///
/// Bit 0 is the least significant bit. All arithmetic is performed modulo
/// `2^width`; binary operators require both operands to have the same width
/// and panic otherwise.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    width: usize,
    data: SmallVec<[Word; 2]>,
}

fn word_count(width: usize) -> usize {
    width.div_ceil(WORD_WIDTH)
}

impl BitString {
    /// Creates an all-zero bit string of the given width.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            data: smallvec![0; word_count(width)],
        }
    }

    /// Parses a binary string like `"0101"` into a bit string.
    ///
    /// The leftmost character is the most significant bit; the width equals
    /// the string length.
    pub fn parse(string: &str) -> Result<Self, BitsError> {
        let mut result = Self::new(string.len());
        for (it, chr) in string.chars().enumerate() {
            let value = match chr {
                '0' => false,
                '1' => true,
                found => return Err(BitsError::InvalidDigit { found }),
            };
            result.set(string.len() - it - 1, value);
        }
        Ok(result)
    }

    /// Creates a single-bit bit string from a boolean.
    pub fn from_bool(value: bool) -> Self {
        let mut result = Self::new(1);
        result.set(0, value);
        result
    }

    /// Creates a 64-bit wide bit string from an unsigned integer.
    pub fn from_u64(value: u64) -> Self {
        Self {
            width: 64,
            data: smallvec![value],
        }
    }

    /// Creates a bit string of the given width from the low bits of `value`.
    pub fn from_uint(value: u64, width: usize) -> Self {
        let mut result = Self::new(width);
        if !result.data.is_empty() {
            result.data[0] = value;
            result.mask_top();
        }
        result
    }

    /// Parses digits in a power-of-two base (`log2` bits per digit,
    /// `log2 ∈ 1..=4`). The width is `digits.len() * log2`.
    pub fn from_base_log2(log2: usize, digits: &str) -> Result<Self, BitsError> {
        assert!((1..=4).contains(&log2), "unsupported digit size {log2}");
        let count = digits.chars().count();
        let mut result = Self::new(count * log2);
        for (it, chr) in digits.chars().enumerate() {
            let digit = chr
                .to_digit(16)
                .filter(|&d| d < (1 << log2))
                .ok_or(BitsError::InvalidDigit { found: chr })? as u64;
            let offset = (count - it - 1) * log2;
            for bit in 0..log2 {
                result.set(offset + bit, digit & (1 << bit) != 0);
            }
        }
        Ok(result)
    }

    /// Parses a binary digit string (one bit per digit).
    pub fn from_bin(digits: &str) -> Result<Self, BitsError> {
        Self::from_base_log2(1, digits)
    }

    /// Parses an octal digit string (three bits per digit).
    pub fn from_oct(digits: &str) -> Result<Self, BitsError> {
        Self::from_base_log2(3, digits)
    }

    /// Parses a hexadecimal digit string (four bits per digit).
    pub fn from_hex(digits: &str) -> Result<Self, BitsError> {
        Self::from_base_log2(4, digits)
    }

    /// Creates a bit string of the given width with the value 1.
    pub fn one(width: usize) -> Self {
        let mut result = Self::new(width);
        if width > 0 {
            result.set(0, true);
        }
        result
    }

    /// Creates a bit string with ones at every position `>= from_bit` and
    /// zeros below.
    pub fn upper(width: usize, from_bit: usize) -> Self {
        let mut result = Self::new(width);
        for it in from_bit..width {
            result.set(it, true);
        }
        result
    }

    /// Creates a uniformly random bit string of the given width.
    pub fn random(width: usize) -> Self {
        let mut rng = rand::thread_rng();
        let mut result = Self::new(width);
        for word in result.data.iter_mut() {
            *word = rng.gen();
        }
        result.mask_top();
        result
    }

    /// Returns the width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn at(&self, index: usize) -> bool {
        assert!(
            index < self.width,
            "index {index} out of bounds for BitString of width {}",
            self.width
        );
        self.data[index / WORD_WIDTH] & (1 << (index % WORD_WIDTH)) != 0
    }

    /// Returns the bit at the given index, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.width).then(|| self.at(index))
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for BitString of width {}",
            self.width
        );
        if value {
            self.data[index / WORD_WIDTH] |= 1 << (index % WORD_WIDTH);
        } else {
            self.data[index / WORD_WIDTH] &= !(1 << (index % WORD_WIDTH));
        }
    }

    fn mask_top(&mut self) {
        let rem = self.width % WORD_WIDTH;
        if rem != 0 {
            if let Some(top) = self.data.last_mut() {
                *top &= (1 << rem) - 1;
            }
        }
    }

    fn assert_same_width(&self, other: &Self, what: &str) {
        assert_eq!(
            self.width, other.width,
            "BitStrings must have the same width in {what}, but got {} and {}",
            self.width, other.width
        );
    }

    /// Adds with an incoming carry; shared by `+`, `-`, and the interval
    /// arithmetic.
    fn add_carry(&self, other: &Self, mut carry: bool) -> Self {
        self.assert_same_width(other, "addition");
        let mut result = Self::new(self.width);
        for it in 0..self.data.len() {
            let sum = u128::from(self.data[it]) + u128::from(other.data[it]) + u128::from(carry);
            result.data[it] = sum as Word;
            carry = sum > Word::MAX as u128;
        }
        result.mask_top();
        result
    }

    /// Unsigned multiplication producing the full `w1 + w2`-wide product.
    pub fn mul_u(&self, other: &Self) -> Self {
        let mut result = Self::new(self.width + other.width);
        for (i, &a) in self.data.iter().enumerate() {
            let mut carry: u128 = 0;
            for (j, &b) in other.data.iter().enumerate() {
                if i + j >= result.data.len() {
                    break;
                }
                let product =
                    u128::from(a) * u128::from(b) + u128::from(result.data[i + j]) + carry;
                result.data[i + j] = product as Word;
                carry = product >> WORD_WIDTH;
            }
            let mut k = i + other.data.len();
            while carry != 0 && k < result.data.len() {
                let sum = u128::from(result.data[k]) + carry;
                result.data[k] = sum as Word;
                carry = sum >> WORD_WIDTH;
                k += 1;
            }
        }
        result.mask_top();
        result
    }

    /// Shifts left by a scalar amount, filling with zeros.
    pub fn shl(&self, amount: usize) -> Self {
        let mut result = Self::new(self.width);
        if amount >= self.width {
            return result;
        }
        let word_shift = amount / WORD_WIDTH;
        let bit_shift = amount % WORD_WIDTH;
        for it in (word_shift..self.data.len()).rev() {
            let mut word = self.data[it - word_shift] << bit_shift;
            if bit_shift != 0 && it > word_shift {
                word |= self.data[it - word_shift - 1] >> (WORD_WIDTH - bit_shift);
            }
            result.data[it] = word;
        }
        result.mask_top();
        result
    }

    /// Shifts right by a scalar amount, filling with zeros.
    pub fn shr_u(&self, amount: usize) -> Self {
        let mut result = Self::new(self.width);
        if amount >= self.width {
            return result;
        }
        let word_shift = amount / WORD_WIDTH;
        let bit_shift = amount % WORD_WIDTH;
        for it in 0..self.data.len() - word_shift {
            let mut word = self.data[it + word_shift] >> bit_shift;
            if bit_shift != 0 && it + word_shift + 1 < self.data.len() {
                word |= self.data[it + word_shift + 1] << (WORD_WIDTH - bit_shift);
            }
            result.data[it] = word;
        }
        result
    }

    /// Shifts right by a scalar amount, filling with the sign bit.
    pub fn shr_s(&self, amount: usize) -> Self {
        if self.width == 0 {
            return self.clone();
        }
        let sign = self.at(self.width - 1);
        if amount >= self.width {
            return if sign {
                !&Self::new(self.width)
            } else {
                Self::new(self.width)
            };
        }
        let mut result = self.shr_u(amount);
        if sign {
            for it in self.width - amount..self.width {
                result.set(it, true);
            }
        }
        result
    }

    /// Decodes a shift amount, saturating to `width` when the amount does
    /// not fit into the width of the shifted value.
    fn shift_amount(&self, amount: &Self) -> usize {
        if amount.data.iter().skip(1).any(|&word| word != 0) {
            return self.width;
        }
        let low = amount.as_u64();
        if low > self.width as u64 {
            self.width
        } else {
            low as usize
        }
    }

    /// Shifts left by a bit-string amount (decoded as an unsigned integer).
    pub fn shl_bits(&self, amount: &Self) -> Self {
        self.shl(self.shift_amount(amount))
    }

    /// Logical right shift by a bit-string amount.
    pub fn shr_u_bits(&self, amount: &Self) -> Self {
        self.shr_u(self.shift_amount(amount))
    }

    /// Arithmetic right shift by a bit-string amount.
    pub fn shr_s_bits(&self, amount: &Self) -> Self {
        self.shr_s(self.shift_amount(amount))
    }

    /// Extends to a larger width, filling the new high bits with zeros.
    ///
    /// # Panics
    ///
    /// Panics if `width < self.width()`.
    pub fn zero_extend(&self, width: usize) -> Self {
        assert!(
            width >= self.width,
            "cannot zero-extend from width {} to {width}",
            self.width
        );
        let mut result = Self::new(width);
        result.data[..self.data.len()].copy_from_slice(&self.data);
        result
    }

    /// Truncates to a smaller width, discarding high bits.
    ///
    /// # Panics
    ///
    /// Panics if `width > self.width()`.
    pub fn truncate(&self, width: usize) -> Self {
        assert!(
            width <= self.width,
            "cannot truncate from width {} to {width}",
            self.width
        );
        let mut result = Self::new(width);
        let words = result.data.len();
        result.data.copy_from_slice(&self.data[..words]);
        result.mask_top();
        result
    }

    /// Resizes to an arbitrary width: zero-extends when growing, truncates
    /// when shrinking.
    pub fn resize_u(&self, width: usize) -> Self {
        if width >= self.width {
            self.zero_extend(width)
        } else {
            self.truncate(width)
        }
    }

    /// Concatenates `self` (high bits) with `low` (low bits), producing a
    /// bit string of width `self.width() + low.width()`.
    pub fn concat(&self, low: &Self) -> Self {
        let mut result = low.zero_extend(self.width + low.width);
        let shifted = self.zero_extend(self.width + low.width).shl(low.width);
        for it in 0..result.data.len() {
            result.data[it] |= shifted.data[it];
        }
        result
    }

    /// Extracts bits `[offset, offset + width)`.
    pub fn slice_width(&self, offset: usize, width: usize) -> Result<Self, BitsError> {
        if offset + width > self.width {
            return Err(BitsError::SliceOutOfBounds {
                offset,
                width,
                len: self.width,
            });
        }
        Ok(self.shr_u(offset).truncate(width))
    }

    /// Reverses the order of `group`-bit chunks.
    ///
    /// # Panics
    ///
    /// Panics if the width is not a multiple of `group`.
    pub fn reverse_words(&self, group: usize) -> Self {
        assert!(
            group > 0 && self.width % group == 0,
            "width {} is not a multiple of group size {group}",
            self.width
        );
        let count = self.width / group;
        let mut result = Self::new(self.width);
        for chunk in 0..count {
            for bit in 0..group {
                let value = self.at(chunk * group + bit);
                result.set((count - chunk - 1) * group + bit, value);
            }
        }
        result
    }

    /// Unsigned less-than comparison.
    pub fn lt_u(&self, other: &Self) -> bool {
        self.assert_same_width(other, "comparison");
        for it in (0..self.data.len()).rev() {
            if self.data[it] != other.data[it] {
                return self.data[it] < other.data[it];
            }
        }
        false
    }

    /// Unsigned less-or-equal comparison.
    pub fn le_u(&self, other: &Self) -> bool {
        !other.lt_u(self)
    }

    /// Flips the most significant bit; signed comparison reduces to
    /// unsigned comparison of the flipped operands.
    fn flip_sign(&self) -> Self {
        let mut result = self.clone();
        if self.width > 0 {
            result.set(self.width - 1, !self.at(self.width - 1));
        }
        result
    }

    /// Signed less-than comparison.
    pub fn lt_s(&self, other: &Self) -> bool {
        self.flip_sign().lt_u(&other.flip_sign())
    }

    /// Signed less-or-equal comparison.
    pub fn le_s(&self, other: &Self) -> bool {
        !other.lt_s(self)
    }

    /// Returns the unsigned smaller of the two operands.
    pub fn min_u(&self, other: &Self) -> Self {
        if self.lt_u(other) {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// Returns the unsigned larger of the two operands.
    pub fn max_u(&self, other: &Self) -> Self {
        if self.lt_u(other) {
            other.clone()
        } else {
            self.clone()
        }
    }

    /// Returns true if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&word| word == 0)
    }

    /// Returns true if every bit is one.
    pub fn is_all_ones(&self) -> bool {
        (0..self.width).all(|it| self.at(it))
    }

    /// Returns true if the value equals the given unsigned integer.
    pub fn is_uint(&self, value: u64) -> bool {
        if self.data.iter().skip(1).any(|&word| word != 0) {
            return false;
        }
        if self.width < 64 && self.width > 0 && value >> self.width != 0 {
            return false;
        }
        if self.width == 0 {
            return value == 0;
        }
        self.data[0] == value
    }

    /// Counts the set bits.
    pub fn popcount(&self) -> usize {
        self.data.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Returns true if exactly one bit is set.
    pub fn is_one_hot(&self) -> bool {
        self.popcount() == 1
    }

    /// Index of the most significant set bit, or `None` for zero.
    pub fn floor_log2(&self) -> Option<usize> {
        (0..self.width).rev().find(|&it| self.at(it))
    }

    /// Smallest `k` with `value <= 2^k`, or `None` for zero.
    pub fn ceil_log2(&self) -> Option<usize> {
        let floor = self.floor_log2()?;
        if self.popcount() == 1 {
            Some(floor)
        } else {
            Some(floor + 1)
        }
    }

    /// Lowest index holding the given bit value, or `width` if absent.
    pub fn find_bit(&self, value: bool) -> usize {
        (0..self.width)
            .find(|&it| self.at(it) == value)
            .unwrap_or(self.width)
    }

    /// Highest index holding the given bit value, or `width` if absent.
    pub fn rfind_bit(&self, value: bool) -> usize {
        (0..self.width)
            .rev()
            .find(|&it| self.at(it) == value)
            .unwrap_or(self.width)
    }

    /// Decodes the low 64 bits, zero-extending shorter values.
    pub fn as_u64(&self) -> u64 {
        self.data.first().copied().unwrap_or(0)
    }

    /// Decodes a single-bit value as a boolean.
    ///
    /// # Panics
    ///
    /// Panics if the width is not 1.
    pub fn as_bool(&self) -> bool {
        assert_eq!(self.width, 1, "as_bool requires width 1, got {}", self.width);
        self.at(0)
    }

    /// Uses a single-bit value as a condition: returns `then` when set,
    /// `otherwise` when clear.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not one bit wide or the branches differ in width.
    pub fn select(&self, then: &Self, otherwise: &Self) -> Self {
        then.assert_same_width(otherwise, "select");
        if self.as_bool() {
            then.clone()
        } else {
            otherwise.clone()
        }
    }

    /// Writes the value in the densest base whose digit size divides the
    /// width (`'h`, then `'o`, then `'b`).
    pub fn write_short(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let log2 = if self.width % 4 == 0 && self.width > 0 {
            4
        } else if self.width % 3 == 0 && self.width > 0 {
            3
        } else {
            1
        };
        let base_char = match log2 {
            4 => 'h',
            3 => 'o',
            _ => 'b',
        };
        write!(out, "{}'{}", self.width, base_char)?;
        if self.width == 0 {
            return Ok(());
        }
        for chunk in (0..self.width / log2).rev() {
            let mut digit = 0u32;
            for bit in (0..log2).rev() {
                digit = digit << 1 | u32::from(self.at(chunk * log2 + bit));
            }
            write!(out, "{}", char::from_digit(digit, 16).unwrap())?;
        }
        Ok(())
    }
}

impl BitAnd for &BitString {
    type Output = BitString;

    fn bitand(self, other: Self) -> BitString {
        self.assert_same_width(other, "AND");
        let mut result = BitString::new(self.width);
        for it in 0..self.data.len() {
            result.data[it] = self.data[it] & other.data[it];
        }
        result
    }
}

impl BitOr for &BitString {
    type Output = BitString;

    fn bitor(self, other: Self) -> BitString {
        self.assert_same_width(other, "OR");
        let mut result = BitString::new(self.width);
        for it in 0..self.data.len() {
            result.data[it] = self.data[it] | other.data[it];
        }
        result
    }
}

impl BitXor for &BitString {
    type Output = BitString;

    fn bitxor(self, other: Self) -> BitString {
        self.assert_same_width(other, "XOR");
        let mut result = BitString::new(self.width);
        for it in 0..self.data.len() {
            result.data[it] = self.data[it] ^ other.data[it];
        }
        result
    }
}

impl Not for &BitString {
    type Output = BitString;

    fn not(self) -> BitString {
        let mut result = BitString::new(self.width);
        for it in 0..self.data.len() {
            result.data[it] = !self.data[it];
        }
        result.mask_top();
        result
    }
}

impl Add for &BitString {
    type Output = BitString;

    fn add(self, other: Self) -> BitString {
        self.add_carry(other, false)
    }
}

impl Sub for &BitString {
    type Output = BitString;

    fn sub(self, other: Self) -> BitString {
        self.add_carry(&!other, true)
    }
}

impl Mul for &BitString {
    type Output = BitString;

    fn mul(self, other: Self) -> BitString {
        self.assert_same_width(other, "multiplication");
        self.mul_u(other).truncate(self.width)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b", self.width)?;
        for it in (0..self.width).rev() {
            write!(f, "{}", if self.at(it) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> BitString {
        BitString::parse(s).unwrap()
    }

    #[test]
    fn new_is_zero() {
        let b = BitString::new(100);
        assert_eq!(b.width(), 100);
        assert!(b.is_zero());
    }

    #[test]
    fn parse_msb_first() {
        let b = bits("1010");
        assert!(b.at(3));
        assert!(!b.at(2));
        assert!(b.at(1));
        assert!(!b.at(0));
    }

    #[test]
    fn parse_rejects_bad_digit() {
        assert_eq!(
            BitString::parse("10a1"),
            Err(BitsError::InvalidDigit { found: 'a' })
        );
    }

    #[test]
    fn from_uint_masks() {
        let b = BitString::from_uint(0xff, 4);
        assert_eq!(b, bits("1111"));
    }

    #[test]
    fn from_hex_and_back() {
        let b = BitString::from_hex("a5").unwrap();
        assert_eq!(b.width(), 8);
        assert_eq!(b, bits("10100101"));
    }

    #[test]
    fn from_oct() {
        let b = BitString::from_oct("17").unwrap();
        assert_eq!(b.width(), 6);
        assert_eq!(b, bits("001111"));
    }

    #[test]
    fn from_base_rejects_large_digit() {
        assert!(BitString::from_oct("8").is_err());
    }

    #[test]
    fn one_and_upper() {
        assert_eq!(BitString::one(4), bits("0001"));
        assert_eq!(BitString::upper(6, 2), bits("111100"));
        assert_eq!(BitString::upper(4, 0), bits("1111"));
    }

    #[test]
    fn at_panics_out_of_range() {
        let b = BitString::new(4);
        assert!(std::panic::catch_unwind(|| b.at(4)).is_err());
        assert_eq!(b.get(4), None);
        assert_eq!(b.get(3), Some(false));
    }

    #[test]
    fn bitwise_ops() {
        let a = bits("1100");
        let b = bits("1010");
        assert_eq!(&a & &b, bits("1000"));
        assert_eq!(&a | &b, bits("1110"));
        assert_eq!(&a ^ &b, bits("0110"));
        assert_eq!(!&a, bits("0011"));
    }

    #[test]
    fn not_keeps_canonical_top_word() {
        let a = BitString::new(3);
        let inverted = !&a;
        assert!(inverted.is_all_ones());
        assert_eq!(inverted, bits("111"));
    }

    #[test]
    fn add_wraps() {
        let a = bits("1111");
        let b = bits("0001");
        assert_eq!(&a + &b, bits("0000"));
    }

    #[test]
    fn add_carries_across_words() {
        let a = BitString::from_u64(u64::MAX).zero_extend(65);
        let b = BitString::one(65);
        let sum = &a + &b;
        assert!(sum.at(64));
        assert_eq!(sum.truncate(64), BitString::new(64));
    }

    #[test]
    fn sub_is_twos_complement() {
        let a = bits("0101");
        let b = bits("0110");
        assert_eq!(&a - &b, bits("1111"));
        assert_eq!(&a - &a, bits("0000"));
    }

    #[test]
    fn neg_identity() {
        // a + ~a + 1 == 0
        let a = BitString::random(67);
        let zero = BitString::new(67);
        let neg = &!&a + &BitString::one(67);
        assert_eq!(&a + &neg, zero);
    }

    #[test]
    fn mul_u_full_width() {
        let a = BitString::from_uint(12, 8);
        let b = BitString::from_uint(10, 8);
        let product = a.mul_u(&b);
        assert_eq!(product.width(), 16);
        assert_eq!(product.as_u64(), 120);
    }

    #[test]
    fn mul_u_wide() {
        let a = BitString::from_u64(u64::MAX);
        let product = a.mul_u(&a);
        assert_eq!(product.width(), 128);
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        assert!(product.at(0));
        assert!(!product.at(64));
        assert!(product.at(127));
    }

    #[test]
    fn mul_operator_truncates() {
        let a = BitString::from_uint(12, 4);
        let b = BitString::from_uint(10, 4);
        assert_eq!((&a * &b).as_u64(), 120 % 16);
    }

    #[test]
    fn shifts_scalar() {
        let a = bits("0110");
        assert_eq!(a.shl(1), bits("1100"));
        assert_eq!(a.shr_u(1), bits("0011"));
        assert_eq!(a.shl(4), bits("0000"));
        assert_eq!(a.shr_u(17), bits("0000"));
    }

    #[test]
    fn shl_across_words() {
        let a = BitString::one(100);
        let shifted = a.shl(70);
        assert!(shifted.at(70));
        assert_eq!(shifted.popcount(), 1);
    }

    #[test]
    fn shr_s_sign_fill() {
        let a = bits("1010");
        assert_eq!(a.shr_s(1), bits("1101"));
        assert_eq!(a.shr_s(9), bits("1111"));
        let b = bits("0100");
        assert_eq!(b.shr_s(1), bits("0010"));
        assert_eq!(b.shr_s(9), bits("0000"));
    }

    #[test]
    fn shift_by_bits_saturates() {
        let a = bits("1010");
        let huge = BitString::upper(80, 70);
        assert_eq!(a.shr_u_bits(&huge), bits("0000"));
        assert_eq!(a.shl_bits(&BitString::from_uint(1, 4)), bits("0100"));
        assert_eq!(a.shr_s_bits(&huge), bits("1111"));
    }

    #[test]
    fn extend_truncate_roundtrip() {
        let a = bits("1011");
        assert_eq!(a.zero_extend(8).truncate(4), a);
        assert_eq!(a.resize_u(2), bits("11"));
        assert_eq!(a.resize_u(6), bits("001011"));
    }

    #[test]
    fn concat_high_low() {
        let high = bits("10");
        let low = bits("0111");
        let joined = high.concat(&low);
        assert_eq!(joined, bits("100111"));
        assert_eq!(joined.slice_width(0, 4).unwrap(), low);
        assert_eq!(joined.slice_width(4, 2).unwrap(), high);
    }

    #[test]
    fn slice_out_of_bounds() {
        let a = bits("1011");
        assert!(matches!(
            a.slice_width(2, 3),
            Err(BitsError::SliceOutOfBounds { .. })
        ));
    }

    #[test]
    fn reverse_words_nibbles() {
        let a = BitString::from_hex("0123456789abcdef").unwrap();
        let expected = BitString::from_hex("fedcba9876543210").unwrap();
        assert_eq!(a.reverse_words(4), expected);
    }

    #[test]
    fn unsigned_compare() {
        let a = bits("0100");
        let b = bits("1000");
        assert!(a.lt_u(&b));
        assert!(!b.lt_u(&a));
        assert!(a.le_u(&a));
        assert_eq!(a.min_u(&b), a);
        assert_eq!(a.max_u(&b), b);
    }

    #[test]
    fn signed_compare() {
        let minus_one = bits("1111");
        let one = bits("0001");
        assert!(minus_one.lt_s(&one));
        assert!(!one.lt_s(&minus_one));
        assert!(minus_one.le_s(&minus_one));
        assert!(one.lt_u(&minus_one));
    }

    #[test]
    fn predicates() {
        assert!(bits("0000").is_zero());
        assert!(bits("1111").is_all_ones());
        assert!(bits("0101").is_uint(5));
        assert!(!bits("0101").is_uint(6));
        assert!(!bits("001").is_uint(9));
        assert_eq!(bits("0110").popcount(), 2);
        assert!(bits("0100").is_one_hot());
        assert!(!bits("0110").is_one_hot());
    }

    #[test]
    fn logarithms() {
        assert_eq!(bits("0000").floor_log2(), None);
        assert_eq!(bits("0100").floor_log2(), Some(2));
        assert_eq!(bits("0101").floor_log2(), Some(2));
        assert_eq!(bits("0100").ceil_log2(), Some(2));
        assert_eq!(bits("0101").ceil_log2(), Some(3));
    }

    #[test]
    fn find_bits() {
        let a = bits("0110");
        assert_eq!(a.find_bit(true), 1);
        assert_eq!(a.find_bit(false), 0);
        assert_eq!(a.rfind_bit(true), 2);
        assert_eq!(bits("0000").find_bit(true), 4);
        assert_eq!(bits("1111").rfind_bit(false), 4);
    }

    #[test]
    fn decoders() {
        assert_eq!(bits("101").as_u64(), 5);
        assert!(bits("1").as_bool());
        let cond = BitString::from_bool(true);
        assert_eq!(cond.select(&bits("10"), &bits("01")), bits("10"));
        let cond = BitString::from_bool(false);
        assert_eq!(cond.select(&bits("10"), &bits("01")), bits("01"));
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", bits("0101")), "4'b0101");
        let mut short = String::new();
        bits("11110000").write_short(&mut short).unwrap();
        assert_eq!(short, "8'hf0");
        let mut short = String::new();
        bits("111100").write_short(&mut short).unwrap();
        assert_eq!(short, "6'o74");
        let mut short = String::new();
        bits("10100").write_short(&mut short).unwrap();
        assert_eq!(short, "5'b10100");
    }

    #[test]
    fn equality_and_hash_respect_width() {
        use std::collections::HashSet;
        let a = bits("0101");
        let b = bits("00101");
        assert_ne!(a, b);
        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(bits("0101"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn random_has_requested_width() {
        let r = BitString::random(130);
        assert_eq!(r.width(), 130);
        // Canonical form: bits beyond the width are zero.
        assert_eq!(r, r.clone());
    }

    #[test]
    fn serde_roundtrip() {
        let b = bits("10110");
        let json = serde_json::to_string(&b).unwrap();
        let back: BitString = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
