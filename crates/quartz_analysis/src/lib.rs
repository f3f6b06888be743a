//! Compile-time analyses over Quartz value graphs.
//!
//! Three abstract domains, all sound over-approximations of the runtime
//! values the simulator would produce:
//!
//! - **[`KnownBits`]** computes per-bit 0/1/x facts in the
//!   [`PartialBitString`](quartz_bits::PartialBitString) domain.
//! - **[`Ranges`]** computes wrap-aware value ranges in the
//!   [`Interval`](quartz_bits::Interval) domain.
//! - **[`AffineValue`]** recovers linear combinations
//!   `Σ factor·value + constant` from add/sub/shift chains, for cheap
//!   structural equality.

#![warn(missing_docs)]

pub mod affine;
pub mod known_bits;
pub mod ranges;

pub use affine::AffineValue;
pub use known_bits::KnownBits;
pub use ranges::Ranges;
