//! Bit-width-precise value algebra for the Quartz hardware library.
//!
//! This crate provides the three value domains every other Quartz crate is
//! built on:
//!
//! - **[`BitString`]** is a fixed-width arbitrary-precision bit vector
//!   with the full bitwise, arithmetic, shift, compare, concat, slice,
//!   and decoding algebra. All arithmetic wraps modulo `2^width`.
//! - **[`PartialBitString`]** pairs a `BitString` with a known-mask,
//!   giving a three-valued (0/1/x) vector used for known-bits analysis
//!   and pattern matching.
//! - **[`Interval`]** is an unsigned-wrap-aware closed interval over the
//!   ring `Z/2^n` used for range analysis.

#![warn(missing_docs)]

pub mod bitstring;
pub mod error;
pub mod interval;
pub mod partial;

pub use bitstring::BitString;
pub use error::BitsError;
pub use interval::{Interval, Truth};
pub use partial::PartialBitString;
