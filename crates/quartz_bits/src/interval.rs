//! Wrap-aware intervals over the ring `Z/2^n` for range analysis.
//!
//! An [`Interval`] `[min, max]` denotes `{x : x ∈ [min, max]}` where the
//! range may wrap through zero: when `max <u min` it contains
//! `{x : min ≤u x} ∪ {x : x ≤u max}`. The canonical full interval is
//! `[0, 2^n − 1]`; any interval covering the whole ring is normalized to
//! it at construction.

use crate::bitstring::BitString;
use crate::partial::PartialBitString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// A three-valued boolean, the result of comparing intervals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truth {
    /// The comparison holds for no pair of members.
    False,
    /// The comparison holds for every pair of members.
    True,
    /// The comparison holds for some pairs and not others.
    Unknown,
}

impl Truth {
    /// Lifts a concrete boolean.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }

    /// Three-valued negation.
    pub fn negate(self) -> Self {
        match self {
            Truth::False => Truth::True,
            Truth::True => Truth::False,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

/// A closed, possibly wrapping interval on `Z/2^n`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    min: BitString,
    max: BitString,
}

impl Interval {
    /// Creates the interval `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if the endpoint widths differ.
    pub fn new(min: BitString, max: BitString) -> Self {
        assert_eq!(
            min.width(),
            max.width(),
            "interval endpoints must have the same width, but got {} and {}",
            min.width(),
            max.width()
        );
        let interval = Self { min, max };
        if interval.len().is_all_ones() {
            Self::full(interval.width())
        } else {
            interval
        }
    }

    /// Creates the singleton interval containing exactly `value`.
    pub fn constant(value: &BitString) -> Self {
        Self {
            min: value.clone(),
            max: value.clone(),
        }
    }

    /// Creates the full interval `[0, 2^n − 1]`.
    pub fn full(width: usize) -> Self {
        Self {
            min: BitString::new(width),
            max: !&BitString::new(width),
        }
    }

    /// Returns the width in bits.
    pub fn width(&self) -> usize {
        self.min.width()
    }

    /// Returns the lower endpoint.
    pub fn min(&self) -> &BitString {
        &self.min
    }

    /// Returns the upper endpoint.
    pub fn max(&self) -> &BitString {
        &self.max
    }

    /// The member count minus one, as a `BitString` of the same width.
    pub fn len(&self) -> BitString {
        &self.max - &self.min
    }

    /// Returns true if the interval covers the whole ring.
    pub fn is_full(&self) -> bool {
        self.len().is_all_ones()
    }

    /// Returns true if the interval is a single value.
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }

    fn wraps(&self) -> bool {
        self.max.lt_u(&self.min)
    }

    /// Returns true if `value` is a member.
    pub fn contains(&self, value: &BitString) -> bool {
        (value - &self.min).le_u(&self.len())
    }

    /// Returns true if every member of `other` is a member of `self`.
    pub fn contains_interval(&self, other: &Self) -> bool {
        let width = self.width() + 1;
        let offset = &other.min - &self.min;
        if !offset.le_u(&self.len()) {
            return false;
        }
        let reach = &offset.zero_extend(width) + &other.len().zero_extend(width);
        reach.le_u(&self.len().zero_extend(width))
    }

    /// The hull anchored at `self.min` that spans out to the farther of the
    /// two upper endpoints.
    fn hull_from(&self, other: &Self) -> Self {
        let to_self_max = self.len();
        let to_other_max = &other.max - &self.min;
        let max = if to_other_max.lt_u(&to_self_max) {
            self.max.clone()
        } else {
            other.max.clone()
        };
        Self::new(self.min.clone(), max)
    }

    /// Smallest wrap-aware interval containing both operands, chosen as the
    /// shorter of the two candidate hulls anchored at each interval's `min`.
    pub fn merge(&self, other: &Self) -> Self {
        if self.contains_interval(other) {
            return self.clone();
        }
        if other.contains_interval(self) {
            return other.clone();
        }
        let ours = self.hull_from(other);
        let theirs = other.hull_from(self);
        match (
            ours.contains_interval(other),
            theirs.contains_interval(self),
        ) {
            (true, true) => {
                if ours.len().le_u(&theirs.len()) {
                    ours
                } else {
                    theirs
                }
            }
            (true, false) => ours,
            (false, true) => theirs,
            (false, false) => Self::full(self.width()),
        }
    }

    /// Interval addition: endpoints are lifted into a wider flattened
    /// domain, added, and truncated back; covering the whole ring yields
    /// the full interval.
    pub fn add(&self, other: &Self) -> Self {
        let width = self.width();
        let ext = width + 4;
        let total = &self.len().zero_extend(ext) + &other.len().zero_extend(ext);
        if !total.shr_u(width).is_zero() {
            return Self::full(width);
        }
        let min = &self.min + &other.min;
        let max = &min + &total.truncate(width);
        Self::new(min, max)
    }

    /// Interval subtraction as `a + !b + 1`.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&!other)
            .add(&Self::constant(&BitString::one(self.width())))
    }

    /// Selects between two branches given a single-bit condition interval.
    pub fn select(cond: &Self, then: &Self, otherwise: &Self) -> Self {
        let zero = BitString::from_bool(false);
        let one = BitString::from_bool(true);
        match (cond.contains(&one), cond.contains(&zero)) {
            (true, false) => then.clone(),
            (false, true) => otherwise.clone(),
            _ => then.merge(otherwise),
        }
    }

    fn intersects(&self, other: &Self) -> bool {
        self.contains(&other.min) || other.contains(&self.min)
    }

    /// Equality of members.
    pub fn eq_bits(&self, other: &Self) -> Truth {
        if self.is_constant() && other.is_constant() {
            Truth::from_bool(self.min == other.min)
        } else if !self.intersects(other) {
            Truth::False
        } else {
            Truth::Unknown
        }
    }

    /// The unsigned lower and upper bounds of the member set. A wrapping
    /// interval contains both 0 and `2^n − 1`.
    fn unsigned_bounds(&self) -> (BitString, BitString) {
        if self.wraps() {
            let zero = BitString::new(self.width());
            (zero.clone(), !&zero)
        } else {
            (self.min.clone(), self.max.clone())
        }
    }

    /// Unsigned less-than of members.
    pub fn lt_u(&self, other: &Self) -> Truth {
        let (self_lo, self_hi) = self.unsigned_bounds();
        let (other_lo, other_hi) = other.unsigned_bounds();
        if self_hi.lt_u(&other_lo) {
            Truth::True
        } else if other_hi.le_u(&self_lo) {
            Truth::False
        } else {
            Truth::Unknown
        }
    }

    /// Unsigned less-or-equal of members.
    pub fn le_u(&self, other: &Self) -> Truth {
        let (self_lo, self_hi) = self.unsigned_bounds();
        let (other_lo, other_hi) = other.unsigned_bounds();
        if self_hi.le_u(&other_lo) {
            Truth::True
        } else if other_hi.lt_u(&self_lo) {
            Truth::False
        } else {
            Truth::Unknown
        }
    }

    /// Rotation by `2^(n−1)`: maps signed order onto unsigned order.
    fn rotate_half(&self) -> Self {
        let width = self.width();
        if width == 0 {
            return self.clone();
        }
        let mut half = BitString::new(width);
        half.set(width - 1, true);
        Self {
            min: &self.min + &half,
            max: &self.max + &half,
        }
    }

    /// Signed less-than of members.
    pub fn lt_s(&self, other: &Self) -> Truth {
        self.rotate_half().lt_u(&other.rotate_half())
    }

    /// Signed less-or-equal of members.
    pub fn le_s(&self, other: &Self) -> Truth {
        self.rotate_half().le_u(&other.rotate_half())
    }

    fn linear_partial(low: &BitString, high: &BitString) -> PartialBitString {
        let width = low.width();
        match (low ^ high).floor_log2() {
            None => PartialBitString::from_bits(low),
            Some(top) => {
                let known = BitString::upper(width, top + 1);
                let value = low & &known;
                PartialBitString::new(known, value)
            }
        }
    }

    /// The known bits at positions where every member agrees.
    pub fn as_partial(&self) -> PartialBitString {
        let width = self.width();
        if self.is_full() {
            return PartialBitString::unknown(width);
        }
        if self.wraps() {
            let zero = BitString::new(width);
            let high_half = Self::linear_partial(&self.min, &!&zero);
            let low_half = Self::linear_partial(&zero, &self.max);
            high_half.merge(&low_half)
        } else {
            Self::linear_partial(&self.min, &self.max)
        }
    }

    /// Smallest interval containing every value matching the partial.
    pub fn from_partial(partial: &PartialBitString) -> Self {
        let min = partial.value().clone();
        let max = partial.value() | &!partial.known();
        Self::new(min, max)
    }

    /// Bitwise AND through the partial domain (precision loss accepted).
    pub fn and(&self, other: &Self) -> Self {
        Self::from_partial(&(&self.as_partial() & &other.as_partial()))
    }

    /// Bitwise OR through the partial domain (precision loss accepted).
    pub fn or(&self, other: &Self) -> Self {
        Self::from_partial(&(&self.as_partial() | &other.as_partial()))
    }

    /// Bitwise XOR through the partial domain (precision loss accepted).
    pub fn xor(&self, other: &Self) -> Self {
        Self::from_partial(&(&self.as_partial() ^ &other.as_partial()))
    }

    /// Full-width multiplication through the partial domain.
    pub fn mul_u(&self, other: &Self) -> Self {
        Self::from_partial(&self.as_partial().mul_u(&other.as_partial()))
    }

    /// Left shift through the partial domain.
    pub fn shl_bits(&self, amount: &Self) -> Self {
        Self::from_partial(&self.as_partial().shl_bits(&amount.as_partial()))
    }

    /// Logical right shift through the partial domain.
    pub fn shr_u_bits(&self, amount: &Self) -> Self {
        Self::from_partial(&self.as_partial().shr_u_bits(&amount.as_partial()))
    }

    /// Arithmetic right shift through the partial domain.
    pub fn shr_s_bits(&self, amount: &Self) -> Self {
        Self::from_partial(&self.as_partial().shr_s_bits(&amount.as_partial()))
    }
}

impl Not for &Interval {
    type Output = Interval;

    fn not(self) -> Interval {
        // Complement reverses unsigned order, so the endpoints swap.
        Interval::new(!&self.max, !&self.min)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interval({}, {})", self.min, self.max)
    }
}
