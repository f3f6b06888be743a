//! Line-oriented text format for Quartz modules.
//!
//! One statement per line, with an optional leading `id = ` defining an
//! integer handle for later statements to reference:
//!
//! ```text
//! 0 = input "clock" 1
//! 1 = reg 4'b0000 "counter"
//! 2 = constant 4'b0001
//! 3 = Add 1 2
//! next 1 0 3
//! output "counter" 1
//! ```
//!
//! Strings escape bytes outside printable ASCII as `\xHH`; bit-string
//! literals are `W'b`, `W'o`, or `W'h` digits; `#` starts a line comment.
//! [`read_module`] and [`write_module`] round-trip a module up to
//! structural equivalence.

#![warn(missing_docs)]

pub mod printer;
pub mod reader;

pub use printer::{write_module, write_module_string};
pub use reader::{read_module, read_module_named};

/// Errors raised by the text IR reader.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("parse error on line {line}: {message}")]
pub struct ParseError {
    /// One-based source line.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
