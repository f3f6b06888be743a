//! Known-bits analysis in the three-valued bit-vector domain.

use quartz_bits::{BitString, PartialBitString};
use quartz_ir::{Module, OpKind, Value, ValueId};
use std::collections::HashMap;

/// Propagates [`PartialBitString`] facts through a module's value graph.
///
/// Leaves default to fully unknown; [`define`](KnownBits::define) narrows
/// an input, register, or any other node before querying. Every transfer
/// function is a sound over-approximation: a bit is reported 0 or 1 only
/// if it has that value under every assignment consistent with the
/// defined facts.
pub struct KnownBits<'m> {
    module: &'m Module,
    values: HashMap<ValueId, PartialBitString>,
}

impl<'m> KnownBits<'m> {
    /// Creates an analysis with no facts defined.
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            values: HashMap::new(),
        }
    }

    /// Pins a node to a known (or partially known) value.
    ///
    /// # Panics
    ///
    /// Panics if the widths differ.
    pub fn define(&mut self, value: ValueId, partial: PartialBitString) {
        assert_eq!(
            partial.width(),
            self.module.width(value),
            "fact width must match the value width"
        );
        self.values.insert(value, partial);
    }

    /// Shifts a partial right by a fully-known amount and resizes, with
    /// the zero-fill entering as *known* zeros.
    fn shift_take(partial: &PartialBitString, amount: &BitString, width: usize) -> PartialBitString {
        let unknown_mask = !partial.known();
        let moved_unknowns = unknown_mask.shr_u_bits(amount).resize_u(width);
        let value = partial.value().shr_u_bits(amount).resize_u(width);
        PartialBitString::new(!&moved_unknowns, value)
    }

    /// The known bits of a node, computing and memoizing the whole cone.
    pub fn lower(&mut self, value: ValueId) -> PartialBitString {
        if let Some(known) = self.values.get(&value) {
            return known.clone();
        }
        let result = match self.module.value(value).clone() {
            Value::Constant(constant) => PartialBitString::from_bits(&constant.value),
            Value::Input(input) => PartialBitString::unknown(input.width),
            Value::Unknown(unknown) => PartialBitString::unknown(unknown.width),
            Value::Reg(reg) => PartialBitString::unknown(reg.width),
            Value::MemoryRead(read) => PartialBitString::unknown(read.width),
            Value::Op(op) => {
                let args: Vec<PartialBitString> =
                    op.args.iter().map(|&arg| self.lower(arg)).collect();
                match op.kind {
                    OpKind::And => &args[0] & &args[1],
                    OpKind::Or => &args[0] | &args[1],
                    OpKind::Xor => &args[0] ^ &args[1],
                    OpKind::Not => !&args[0],
                    OpKind::Add => args[0].add(&args[1]),
                    OpKind::Sub => args[0].sub(&args[1]),
                    OpKind::Mul => args[0].mul_u(&args[1]),
                    OpKind::Eq => args[0].eq_bits(&args[1]),
                    OpKind::LtU => args[0].lt_u(&args[1]),
                    OpKind::LtS => args[0].lt_s(&args[1]),
                    OpKind::LeU => args[0].le_u(&args[1]),
                    OpKind::LeS => args[0].le_s(&args[1]),
                    OpKind::Concat => args[0].concat(&args[1]),
                    OpKind::Slice => {
                        if args[1].is_fully_known() {
                            Self::shift_take(&args[0], args[1].value(), op.width)
                        } else {
                            PartialBitString::unknown(op.width)
                        }
                    }
                    OpKind::Shl => args[0].shl_bits(&args[1]),
                    OpKind::ShrU => args[0].shr_u_bits(&args[1]),
                    OpKind::ShrS => args[0].shr_s_bits(&args[1]),
                    OpKind::Select => args[0].select(&args[1], &args[2]),
                }
            }
        };
        self.values.insert(value, result.clone());
        result
    }

    /// Lowers every output, returning `(name, facts)` pairs.
    pub fn outputs(&mut self) -> Vec<(String, PartialBitString)> {
        let outputs: Vec<_> = self
            .module
            .outputs()
            .iter()
            .map(|output| (output.name.clone(), output.value))
            .collect();
        outputs
            .into_iter()
            .map(|(name, value)| (name, self.lower(value)))
            .collect()
    }
}
