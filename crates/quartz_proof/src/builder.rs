//! Tseitin construction over flattened Quartz value graphs.

use crate::cnf::{Cnf, Literal};
use crate::error::ProofError;
use quartz_bits::BitString;
use quartz_ir::{Module, OpKind, Value, ValueId};
use std::collections::HashMap;

/// Builds a [`Cnf`] from a flattened (one-bit-wide) value graph, one
/// literal per bit.
///
/// Inputs and registers are introduced as free variables by the caller via
/// [`free`](CnfBuilder::free); `Unknown` nodes become free variables
/// automatically (a don't-care is simply unconstrained). Any operator
/// outside the gate set, including multi-bit arithmetic that survived
/// flattening, is rejected with [`ProofError::OpNotAGate`].
pub struct CnfBuilder<'m> {
    module: &'m Module,
    cnf: Cnf,
    values: HashMap<ValueId, Vec<Literal>>,
}

impl<'m> CnfBuilder<'m> {
    /// Creates an empty builder over the given module.
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            cnf: Cnf::new(),
            values: HashMap::new(),
        }
    }

    /// The formula built so far.
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Consumes the builder, returning the formula.
    pub fn into_cnf(self) -> Cnf {
        self.cnf
    }

    /// Introduces a value as fresh, unconstrained variables (one per bit).
    pub fn free(&mut self, value: ValueId) -> &[Literal] {
        let width = self.module.width(value);
        let literals: Vec<Literal> = (0..width).map(|_| self.cnf.var()).collect();
        self.values.entry(value).or_insert(literals)
    }

    /// The literals of a built value, LSB first.
    ///
    /// # Panics
    ///
    /// Panics if the value has not been built or freed.
    pub fn literals(&self, value: ValueId) -> &[Literal] {
        &self.values[&value]
    }

    /// Emits the Tseitin clauses for a value and its transitive arguments.
    pub fn build(&mut self, value: ValueId) -> Result<(), ProofError> {
        if self.values.contains_key(&value) {
            return Ok(());
        }

        let literals = match self.module.value(value).clone() {
            Value::Constant(constant) => {
                let mut literals = Vec::with_capacity(constant.value.width());
                for index in 0..constant.value.width() {
                    literals.push(self.cnf.f_const(constant.value.at(index)));
                }
                literals
            }
            Value::Unknown(unknown) => (0..unknown.width).map(|_| self.cnf.var()).collect(),
            Value::Op(op) => {
                for &arg in &op.args {
                    self.build(arg)?;
                }
                let args: Vec<Vec<Literal>> = op
                    .args
                    .iter()
                    .map(|arg| self.values[arg].clone())
                    .collect();
                match op.kind {
                    OpKind::And => self.elementwise(op.width, &args, Cnf::f_and),
                    OpKind::Or => self.elementwise(op.width, &args, Cnf::f_or),
                    OpKind::Xor => self.elementwise(op.width, &args, Cnf::f_xor),
                    OpKind::Not => args[0].iter().map(|&a| self.cnf.f_not(a)).collect(),
                    OpKind::Eq if args[0].len() == 1 => {
                        vec![self.cnf.f_eq(args[0][0], args[1][0])]
                    }
                    OpKind::Select => {
                        let cond = args[0][0];
                        args[1]
                            .iter()
                            .zip(&args[2])
                            .map(|(&a, &b)| self.cnf.f_select(cond, a, b))
                            .collect()
                    }
                    kind => return Err(ProofError::OpNotAGate { kind }),
                }
            }
            Value::Input(_) | Value::Reg(_) | Value::MemoryRead(_) => {
                return Err(ProofError::UnboundLeaf)
            }
        };

        self.values.insert(value, literals);
        Ok(())
    }

    fn elementwise(
        &mut self,
        width: usize,
        args: &[Vec<Literal>],
        gate: impl Fn(&mut Cnf, Literal, Literal) -> Literal,
    ) -> Vec<Literal> {
        (0..width)
            .map(|index| gate(&mut self.cnf, args[0][index], args[1][index]))
            .collect()
    }

    /// Constrains a built value to a concrete bit pattern via unit clauses.
    pub fn require(&mut self, value: ValueId, pattern: &BitString) -> Result<(), ProofError> {
        let width = self.module.width(value);
        if pattern.width() != width {
            return Err(ProofError::RequireWidth {
                expected: width,
                found: pattern.width(),
            });
        }
        self.build(value)?;
        let literals = self.values[&value].clone();
        for (index, literal) in literals.into_iter().enumerate() {
            if pattern.at(index) {
                self.cnf.add_clause(&[literal]);
            } else {
                self.cnf.add_clause(&[!literal]);
            }
        }
        Ok(())
    }
}
