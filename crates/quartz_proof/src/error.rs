//! Error types for CNF construction and parsing.

use quartz_ir::OpKind;

/// Errors raised while building or reading CNF formulas.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProofError {
    /// The builder reached an operator that is not a one-bit gate; the
    /// caller must flatten the graph first.
    #[error("operator {kind} is not a gate; flatten the value first")]
    OpNotAGate {
        /// The offending operator.
        kind: OpKind,
    },

    /// The builder reached an input, register, or memory read that was not
    /// introduced with [`CnfBuilder::free`](crate::CnfBuilder::free).
    #[error("leaf value must be freed before building")]
    UnboundLeaf,

    /// A required bit pattern has the wrong width.
    #[error("required pattern is {found} bits wide, value is {expected}")]
    RequireWidth {
        /// The value width.
        expected: usize,
        /// The pattern width.
        found: usize,
    },

    /// DIMACS text was malformed.
    #[error("DIMACS parse error on line {line}: {message}")]
    DimacsParse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_not_a_gate_display() {
        let e = ProofError::OpNotAGate { kind: OpKind::Add };
        assert_eq!(e.to_string(), "operator Add is not a gate; flatten the value first");
    }

    #[test]
    fn dimacs_parse_display() {
        let e = ProofError::DimacsParse {
            line: 3,
            message: "expected literal".into(),
        };
        assert_eq!(e.to_string(), "DIMACS parse error on line 3: expected literal");
    }
}
