//! Affine decomposition of add/sub/shift chains.
//!
//! An [`AffineValue`] represents `Σ factor·value + constant` over opaque
//! graph nodes. Recovering this form from the graph makes structural
//! identities like `(a + b) − b = a` decidable without SAT: two affine
//! values with equal factor maps are equal iff their constants are equal.

use quartz_bits::BitString;
use quartz_ir::{IrError, Module, OpKind, Value, ValueId};
use std::collections::{BTreeMap, HashMap};

/// A linear combination of graph nodes with a constant term.
///
/// All factors and the constant share one width; multiplication by a
/// factor truncates back to that width, matching the wraparound semantics
/// of the underlying operators.
#[derive(Clone, PartialEq, Eq)]
pub struct AffineValue {
    factors: BTreeMap<ValueId, BitString>,
    constant: BitString,
}

impl AffineValue {
    /// The constant `value`.
    pub fn constant(value: BitString) -> Self {
        Self {
            factors: BTreeMap::new(),
            constant: value,
        }
    }

    /// The single term `factor · value`.
    pub fn term(value: ValueId, factor: BitString) -> Self {
        let mut factors = BTreeMap::new();
        let constant = BitString::new(factor.width());
        if !factor.is_zero() {
            factors.insert(value, factor);
        }
        Self { factors, constant }
    }

    /// The width shared by the constant and every factor.
    pub fn width(&self) -> usize {
        self.constant.width()
    }

    /// True if no opaque terms remain.
    pub fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    /// The constant term.
    pub fn constant_term(&self) -> &BitString {
        &self.constant
    }

    /// Recovers the affine form of a node: `Add` and `Sub` distribute,
    /// `Shl` by a constant becomes a factor, constants fold, and anything
    /// else is an opaque term with factor one.
    pub fn build(module: &Module, value: ValueId) -> Self {
        let mut cache = HashMap::new();
        Self::build_cached(module, value, &mut cache)
    }

    fn build_cached(
        module: &Module,
        value: ValueId,
        cache: &mut HashMap<ValueId, AffineValue>,
    ) -> Self {
        if let Some(known) = cache.get(&value) {
            return known.clone();
        }
        let width = module.width(value);
        let mut result = Self::term(value, BitString::one(width));
        match module.value(value) {
            Value::Constant(constant) => result = Self::constant(constant.value.clone()),
            Value::Op(op) => match op.kind {
                OpKind::Add => {
                    let left = Self::build_cached(module, op.args[0], cache);
                    let right = Self::build_cached(module, op.args[1], cache);
                    result = left.add(&right);
                }
                OpKind::Sub => {
                    let left = Self::build_cached(module, op.args[0], cache);
                    let right = Self::build_cached(module, op.args[1], cache);
                    result = left.sub(&right);
                }
                OpKind::Shl => {
                    if let Some(amount) = module.constant_of(op.args[1]) {
                        let factor = BitString::one(width).shl_bits(amount);
                        let base = Self::build_cached(module, op.args[0], cache);
                        result = base.scale(&factor);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        cache.insert(value, result.clone());
        result
    }

    fn combine(&self, other: &Self, add: bool) -> Self {
        let mut result = self.clone();
        result.constant = if add {
            &self.constant + &other.constant
        } else {
            &self.constant - &other.constant
        };
        for (&value, factor) in &other.factors {
            let zero = BitString::new(self.width());
            let current = result.factors.get(&value).unwrap_or(&zero);
            let merged = if add {
                current + factor
            } else {
                current - factor
            };
            if merged.is_zero() {
                result.factors.remove(&value);
            } else {
                result.factors.insert(value, merged);
            }
        }
        result
    }

    /// Sum of two affine values; cancelling terms disappear.
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, true)
    }

    /// Difference of two affine values; cancelling terms disappear.
    pub fn sub(&self, other: &Self) -> Self {
        self.combine(other, false)
    }

    /// Multiplies every factor and the constant by a scalar, truncating
    /// back to the shared width.
    ///
    /// # Panics
    ///
    /// Panics if the scalar width differs.
    pub fn scale(&self, scalar: &BitString) -> Self {
        assert_eq!(
            self.width(),
            scalar.width(),
            "scalar width must match the affine width"
        );
        if scalar.is_zero() {
            return Self::constant(BitString::new(self.width()));
        }
        let width = self.width();
        let mut result = Self::constant(self.constant.mul_u(scalar).truncate(width));
        for (&value, factor) in &self.factors {
            let scaled = factor.mul_u(scalar).truncate(width);
            if !scaled.is_zero() {
                result.factors.insert(value, scaled);
            }
        }
        result
    }

    /// Decides equality when the opaque parts match: `Some(answer)` if
    /// both sides have identical factor maps, `None` otherwise.
    pub fn static_equal(&self, other: &Self) -> Option<bool> {
        if self.factors == other.factors {
            Some(self.constant == other.constant)
        } else {
            None
        }
    }

    /// Rebuilds the affine value as graph nodes.
    pub fn rebuild(&self, module: &mut Module) -> Result<ValueId, IrError> {
        let width = self.width();
        let mut result = module.constant(self.constant.clone());
        for (&value, factor) in &self.factors {
            let term = if factor == &BitString::one(width) {
                value
            } else {
                let scalar = module.constant(factor.clone());
                let product = module.op(OpKind::Mul, &[value, scalar])?;
                let zero = module.constant(BitString::from_u64(0));
                let take = module.constant(BitString::from_u64(width as u64));
                module.op(OpKind::Slice, &[product, zero, take])?
            };
            result = module.op(OpKind::Add, &[result, term])?;
        }
        Ok(result)
    }
}

impl std::fmt::Debug for AffineValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AffineValue({}", self.constant)?;
        for (value, factor) in &self.factors {
            write!(f, " + {factor}·{value:?}")?;
        }
        write!(f, ")")
    }
}
