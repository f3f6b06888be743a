//! Shared support code for the Quartz conformance suite.
//!
//! The integration tests under `tests/` exercise the toolchain end to
//! end; the [`sat`] module provides the tiny decision procedure they use
//! to check exported CNF formulas without an external solver.

#![warn(missing_docs)]

pub mod sat;
