//! Error types for IR construction.

use crate::value::OpKind;

/// Errors raised while building or mutating the IR graph.
///
/// Constructors fail eagerly, keeping the module invariants global: a
/// module that hands out a `ValueId` has already type-checked it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IrError {
    /// An operator was applied to the wrong number of arguments.
    #[error("operator {kind:?} expects {expected} arguments, got {found}")]
    WrongArity {
        /// The operator.
        kind: OpKind,
        /// The required argument count.
        expected: usize,
        /// The argument count supplied.
        found: usize,
    },

    /// Operand or port widths disagree.
    #[error("width mismatch: {context}")]
    WidthMismatch {
        /// Human-readable description of the mismatch.
        context: String,
    },

    /// The width argument of a `Slice` must be a constant.
    #[error("slice width operand must be a constant")]
    SliceWidthNotConstant,
}

impl IrError {
    pub(crate) fn width_mismatch(context: impl Into<String>) -> Self {
        Self::WidthMismatch {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_arity_display() {
        let e = IrError::WrongArity {
            kind: OpKind::Not,
            expected: 1,
            found: 2,
        };
        assert_eq!(e.to_string(), "operator Not expects 1 arguments, got 2");
    }

    #[test]
    fn width_mismatch_display() {
        let e = IrError::width_mismatch("And operands are 4 and 8 bits");
        assert_eq!(e.to_string(), "width mismatch: And operands are 4 and 8 bits");
    }
}
