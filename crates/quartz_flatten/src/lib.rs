//! Bit-level flattening of Quartz modules.
//!
//! A [`Flattening`] produces, for every value in the graph, an ordered
//! list of one-bit replacement values built from only `And`, `Or`, `Xor`,
//! and `Not` (one-bit `Select`s are expanded into AND/OR/NOT). Arithmetic
//! becomes ripple adders, compares become MSB-first scans, shifts become
//! log-shifters, and multiplication becomes a shift-and-add accumulator.
//! The result is the input form the CNF builder consumes.
//!
//! `Input`, `Reg`, and memory-read leaves carry no gate structure of their
//! own: the caller registers their bit lists up front with
//! [`define`](Flattening::define), typically from
//! [`split`](Flattening::split).

#![warn(missing_docs)]

use quartz_bits::BitString;
use quartz_ir::{IrError, Module, OpKind, Value, ValueId};
use std::collections::HashMap;

/// Errors raised during flattening.
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// An `Input`, `Reg`, or memory read was reached without a prior
    /// [`Flattening::define`].
    #[error("leaf value must be defined before flattening")]
    UndefinedLeaf,

    /// Rebuilding a value in the module failed.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Per-value lists of one-bit replacement values.
pub struct Flattening<'m> {
    module: &'m mut Module,
    values: HashMap<ValueId, Vec<ValueId>>,
}

impl<'m> Flattening<'m> {
    /// Creates an empty flattening over the given module.
    pub fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            values: HashMap::new(),
        }
    }

    /// Gives back the module borrow.
    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    /// Registers the bit list of a leaf (or overrides any value).
    ///
    /// # Panics
    ///
    /// Panics if the list length does not match the value's width.
    pub fn define(&mut self, value: ValueId, bits: Vec<ValueId>) {
        assert_eq!(
            bits.len(),
            self.module.width(value),
            "bit list length must match the value width"
        );
        self.values.insert(value, bits);
    }

    /// The flattened bits of a value, LSB first.
    ///
    /// # Panics
    ///
    /// Panics if the value has not been flattened or defined.
    pub fn bits(&self, value: ValueId) -> &[ValueId] {
        &self.values[&value]
    }

    /// Builds the `w` one-bit slices of a value, for seeding leaves.
    pub fn split(&mut self, value: ValueId) -> Result<Vec<ValueId>, FlattenError> {
        let width = self.module.width(value);
        let mut bits = Vec::with_capacity(width);
        for index in 0..width {
            let offset = self.module.constant(BitString::from_u64(index as u64));
            let one = self.module.constant(BitString::from_u64(1));
            bits.push(self.module.op(OpKind::Slice, &[value, offset, one])?);
        }
        Ok(bits)
    }

    /// Concatenates one-bit values back into a single value, low to high.
    pub fn join(&mut self, bits: &[ValueId]) -> Result<ValueId, FlattenError> {
        let mut value = bits[0];
        for &bit in &bits[1..] {
            value = self.module.op(OpKind::Concat, &[bit, value])?;
        }
        Ok(value)
    }

    fn constant_bit(&mut self, value: bool) -> ValueId {
        self.module.constant(BitString::from_bool(value))
    }

    /// `(cond ? a : b)` on single bits, expressed with AND/OR/NOT.
    fn select_bit(&mut self, cond: ValueId, a: ValueId, b: ValueId) -> Result<ValueId, IrError> {
        let taken = self.module.op(OpKind::And, &[cond, a])?;
        let inverted = self.module.op(OpKind::Not, &[cond])?;
        let skipped = self.module.op(OpKind::And, &[inverted, b])?;
        self.module.op(OpKind::Or, &[taken, skipped])
    }

    fn select_bits(
        &mut self,
        cond: ValueId,
        a: &[ValueId],
        b: &[ValueId],
    ) -> Result<Vec<ValueId>, IrError> {
        let mut bits = Vec::with_capacity(a.len());
        for (&a_bit, &b_bit) in a.iter().zip(b) {
            bits.push(self.select_bit(cond, a_bit, b_bit)?);
        }
        Ok(bits)
    }

    /// Ripple-carry addition; subtraction feeds `!b` and a carry-in of one.
    fn add_sub(
        &mut self,
        a: &[ValueId],
        b: &[ValueId],
        is_sub: bool,
    ) -> Result<Vec<ValueId>, IrError> {
        let mut sum = Vec::with_capacity(a.len());
        let mut carry = self.constant_bit(is_sub);
        for (&a_bit, &b_orig) in a.iter().zip(b) {
            let b_bit = if is_sub {
                self.module.op(OpKind::Not, &[b_orig])?
            } else {
                b_orig
            };
            let half = self.module.op(OpKind::Xor, &[a_bit, b_bit])?;
            sum.push(self.module.op(OpKind::Xor, &[half, carry])?);
            let carry_a = self.module.op(OpKind::And, &[carry, a_bit])?;
            let carry_b = self.module.op(OpKind::And, &[carry, b_bit])?;
            let carry_ab = self.module.op(OpKind::And, &[a_bit, b_bit])?;
            let either = self.module.op(OpKind::Or, &[carry_a, carry_b])?;
            carry = self.module.op(OpKind::Or, &[either, carry_ab])?;
        }
        Ok(sum)
    }

    /// Log-shifter right shift; the fill bit is the operand's MSB when
    /// signed, zero otherwise.
    fn shr(
        &mut self,
        a: &[ValueId],
        amount: &[ValueId],
        is_signed: bool,
    ) -> Result<Vec<ValueId>, IrError> {
        let mut result = a.to_vec();
        for (it, &amount_bit) in amount.iter().enumerate() {
            for it2 in 0..result.len() {
                let shift_index = (1usize.checked_shl(it as u32))
                    .and_then(|step| it2.checked_add(step))
                    .filter(|&index| index < result.len());
                let shifted = match shift_index {
                    Some(index) => result[index],
                    None if is_signed => *a.last().expect("shift of zero-width value"),
                    None => self.constant_bit(false),
                };
                result[it2] = self.select_bit(amount_bit, shifted, result[it2])?;
            }
        }
        Ok(result)
    }

    /// Log-shifter left shift, filling with zeros.
    fn shl(&mut self, a: &[ValueId], amount: &[ValueId]) -> Result<Vec<ValueId>, IrError> {
        let mut result = a.to_vec();
        for (it, &amount_bit) in amount.iter().enumerate() {
            for it2 in (0..result.len()).rev() {
                let source_index = (1usize.checked_shl(it as u32))
                    .and_then(|step| it2.checked_sub(step));
                let shifted = match source_index {
                    Some(index) => result[index],
                    None => self.constant_bit(false),
                };
                result[it2] = self.select_bit(amount_bit, shifted, result[it2])?;
            }
        }
        Ok(result)
    }

    /// Shift-and-add accumulator of width `w(a) + w(b)`.
    fn mul(&mut self, a: &[ValueId], b: &[ValueId]) -> Result<Vec<ValueId>, IrError> {
        let width = a.len() + b.len();
        let zero = self.constant_bit(false);
        let mut result = vec![zero; width];
        for (shift, &b_bit) in b.iter().enumerate() {
            let mut shifted_a = vec![zero; shift];
            shifted_a.extend_from_slice(a);
            shifted_a.resize(width, zero);
            let added = self.add_sub(&result, &shifted_a, false)?;
            result = self.select_bits(b_bit, &added, &result)?;
        }
        Ok(result)
    }

    /// OR of bitwise XORs, inverted: one bit telling whether `a == b`.
    fn eq(&mut self, a: &[ValueId], b: &[ValueId]) -> Result<ValueId, IrError> {
        let mut is_not_eq = self.constant_bit(false);
        for (&a_bit, &b_bit) in a.iter().zip(b) {
            let differs = self.module.op(OpKind::Xor, &[a_bit, b_bit])?;
            is_not_eq = self.module.op(OpKind::Or, &[is_not_eq, differs])?;
        }
        self.module.op(OpKind::Not, &[is_not_eq])
    }

    /// MSB-first scan: the first differing bit position decides.
    fn lt_u(&mut self, a: &[ValueId], b: &[ValueId]) -> Result<ValueId, IrError> {
        let mut result = self.constant_bit(false);
        let mut inactive = self.constant_bit(false);
        for (&a_bit, &b_bit) in a.iter().zip(b).rev() {
            let not_a = self.module.op(OpKind::Not, &[a_bit])?;
            let here = self.module.op(OpKind::And, &[not_a, b_bit])?;
            let active = self.module.op(OpKind::Not, &[inactive])?;
            let decides = self.module.op(OpKind::And, &[active, here])?;
            result = self.module.op(OpKind::Or, &[result, decides])?;
            let differs = self.module.op(OpKind::Xor, &[a_bit, b_bit])?;
            inactive = self.module.op(OpKind::Or, &[inactive, differs])?;
        }
        Ok(result)
    }

    /// Differing signs decide directly; equal signs defer to unsigned.
    fn lt_s(&mut self, a: &[ValueId], b: &[ValueId]) -> Result<ValueId, IrError> {
        let a_sign = *a.last().expect("signed compare of zero-width value");
        let b_sign = *b.last().expect("signed compare of zero-width value");
        let signs_differ = self.module.op(OpKind::Xor, &[a_sign, b_sign])?;
        let not_b_sign = self.module.op(OpKind::Not, &[b_sign])?;
        let negative_a = self.module.op(OpKind::And, &[a_sign, not_b_sign])?;
        let unsigned = self.lt_u(a, b)?;
        self.select_bit(signs_differ, negative_a, unsigned)
    }

    /// Flattens a value and everything it depends on.
    ///
    /// After this returns, [`bits`](Flattening::bits) yields `w(value)`
    /// one-bit values for `value` and every transitive argument.
    pub fn flatten(&mut self, value: ValueId) -> Result<(), FlattenError> {
        if self.values.contains_key(&value) {
            return Ok(());
        }

        let bits = match self.module.value(value).clone() {
            Value::Constant(constant) => {
                let mut bits = Vec::with_capacity(constant.value.width());
                for index in 0..constant.value.width() {
                    let bit = constant.value.at(index);
                    bits.push(self.constant_bit(bit));
                }
                bits
            }
            Value::Unknown(unknown) => {
                let mut bits = Vec::with_capacity(unknown.width);
                for _ in 0..unknown.width {
                    bits.push(self.module.unknown(1));
                }
                bits
            }
            Value::Op(op) => {
                for &arg in &op.args {
                    self.flatten(arg)?;
                }
                let args: Vec<Vec<ValueId>> = op
                    .args
                    .iter()
                    .map(|arg| self.values[arg].clone())
                    .collect();
                let arg = |index: usize| args[index].clone();
                match op.kind {
                    OpKind::And | OpKind::Or | OpKind::Xor => {
                        let (a, b) = (arg(0), arg(1));
                        let mut bits = Vec::with_capacity(op.width);
                        for (&a_bit, &b_bit) in a.iter().zip(&b) {
                            bits.push(self.module.op(op.kind, &[a_bit, b_bit])?);
                        }
                        bits
                    }
                    OpKind::Not => {
                        let a = arg(0);
                        let mut bits = Vec::with_capacity(op.width);
                        for &a_bit in &a {
                            bits.push(self.module.op(OpKind::Not, &[a_bit])?);
                        }
                        bits
                    }
                    OpKind::Add => self.add_sub(&arg(0), &arg(1), false)?,
                    OpKind::Sub => self.add_sub(&arg(0), &arg(1), true)?,
                    OpKind::Mul => self.mul(&arg(0), &arg(1))?,
                    OpKind::Eq => vec![self.eq(&arg(0), &arg(1))?],
                    OpKind::LtU => vec![self.lt_u(&arg(0), &arg(1))?],
                    OpKind::LtS => vec![self.lt_s(&arg(0), &arg(1))?],
                    OpKind::LeU => {
                        let less = self.lt_u(&arg(0), &arg(1))?;
                        let equal = self.eq(&arg(0), &arg(1))?;
                        vec![self.module.op(OpKind::Or, &[less, equal])?]
                    }
                    OpKind::LeS => {
                        let less = self.lt_s(&arg(0), &arg(1))?;
                        let equal = self.eq(&arg(0), &arg(1))?;
                        vec![self.module.op(OpKind::Or, &[less, equal])?]
                    }
                    OpKind::Concat => {
                        let mut bits = arg(1);
                        bits.extend(arg(0));
                        bits
                    }
                    OpKind::Slice => {
                        let shifted = self.shr(&arg(0), &arg(1), false)?;
                        let mut bits: Vec<ValueId> =
                            shifted.into_iter().take(op.width).collect();
                        while bits.len() < op.width {
                            bits.push(self.constant_bit(false));
                        }
                        bits
                    }
                    OpKind::Shl => self.shl(&arg(0), &arg(1))?,
                    OpKind::ShrU => self.shr(&arg(0), &arg(1), false)?,
                    OpKind::ShrS => self.shr(&arg(0), &arg(1), true)?,
                    OpKind::Select => {
                        let cond = arg(0)[0];
                        self.select_bits(cond, &arg(1), &arg(2))?
                    }
                }
            }
            Value::Input(_) | Value::Reg(_) | Value::MemoryRead(_) => {
                return Err(FlattenError::UndefinedLeaf)
            }
        };

        self.values.insert(value, bits);
        Ok(())
    }
}
