//! QuartzIR — the value-graph intermediate representation for synchronous
//! digital circuits.
//!
//! A [`Module`] owns every node of a circuit graph in a dense
//! [`Arena`](arena::Arena) indexed by opaque [`ValueId`]s. Pure nodes
//! (constants and operator applications) are hash-consed, so structural
//! equality is ID equality. Operator construction performs constant folding
//! and a table of local peephole rewrites before interning; mark-and-sweep
//! garbage collection compacts the arena starting from the module outputs.
//!
//! # Architecture
//!
//! - **[`arena`]** provides dense, ID-indexed storage for IR nodes.
//! - **[`value`]** defines the [`Value`] sum type and the width-typing rules.
//! - **[`fold`]** evaluates operators over concrete [`BitString`]s, shared
//!   by constant folding and the simulator.
//! - **[`module`]** owns the graph and enforces its invariants.

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod fold;
pub mod ids;
pub mod module;
pub mod rewrite;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use error::IrError;
pub use ids::{MemoryId, ValueId};
pub use module::{GcMap, Memory, MemoryWrite, Module, Output};
pub use value::{OpKind, Value};

pub use quartz_bits::BitString;
