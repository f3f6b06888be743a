//! CNF export for SAT-based equivalence and property checking.
//!
//! [`Cnf`] is a pool of variables and a flat clause store with the
//! canonical Tseitin relations for AND/OR/XOR/EQ/NOT/SELECT gates, plus a
//! functional layer that allocates the defined variable for you.
//! [`CnfBuilder`] walks a flattened (one-bit) Quartz value graph and emits
//! one literal per node. [`Cnf::simplify`] performs unit propagation and
//! pure-literal elimination, and DIMACS text I/O connects to external SAT
//! solvers.

#![warn(missing_docs)]

pub mod builder;
pub mod cnf;
pub mod error;
pub mod simplify;

pub use builder::CnfBuilder;
pub use cnf::{Cnf, Literal};
pub use error::ProofError;
