//! Range analysis in the wrap-aware interval domain.

use quartz_bits::{BitString, Interval, Truth};
use quartz_ir::{Module, OpKind, Value, ValueId};
use std::collections::HashMap;

/// Propagates [`Interval`] facts through a module's value graph.
///
/// Leaves default to the full interval; narrow them with
/// [`define`](Ranges::define). Bitwise operators and shifts go through the
/// partial-bits domain, which loses precision but stays sound.
pub struct Ranges<'m> {
    module: &'m Module,
    values: HashMap<ValueId, Interval>,
}

impl<'m> Ranges<'m> {
    /// Creates an analysis with no facts defined.
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            values: HashMap::new(),
        }
    }

    /// Pins a node to a range.
    ///
    /// # Panics
    ///
    /// Panics if the widths differ.
    pub fn define(&mut self, value: ValueId, interval: Interval) {
        assert_eq!(
            interval.width(),
            self.module.width(value),
            "fact width must match the value width"
        );
        self.values.insert(value, interval);
    }

    fn truth_interval(truth: Truth) -> Interval {
        match truth {
            Truth::True => Interval::constant(&BitString::from_bool(true)),
            Truth::False => Interval::constant(&BitString::from_bool(false)),
            Truth::Unknown => Interval::full(1),
        }
    }

    /// The range of a node, computing and memoizing the whole cone.
    pub fn lower(&mut self, value: ValueId) -> Interval {
        if let Some(interval) = self.values.get(&value) {
            return interval.clone();
        }
        let result = match self.module.value(value).clone() {
            Value::Constant(constant) => Interval::constant(&constant.value),
            Value::Input(input) => Interval::full(input.width),
            Value::Unknown(unknown) => Interval::full(unknown.width),
            Value::Reg(reg) => Interval::full(reg.width),
            Value::MemoryRead(read) => Interval::full(read.width),
            Value::Op(op) => {
                let args: Vec<Interval> = op.args.iter().map(|&arg| self.lower(arg)).collect();
                match op.kind {
                    OpKind::And => args[0].and(&args[1]),
                    OpKind::Or => args[0].or(&args[1]),
                    OpKind::Xor => args[0].xor(&args[1]),
                    OpKind::Not => !&args[0],
                    OpKind::Add => args[0].add(&args[1]),
                    OpKind::Sub => args[0].sub(&args[1]),
                    OpKind::Mul => args[0].mul_u(&args[1]),
                    OpKind::Eq => Self::truth_interval(args[0].eq_bits(&args[1])),
                    OpKind::LtU => Self::truth_interval(args[0].lt_u(&args[1])),
                    OpKind::LtS => Self::truth_interval(args[0].lt_s(&args[1])),
                    OpKind::LeU => Self::truth_interval(args[0].le_u(&args[1])),
                    OpKind::LeS => Self::truth_interval(args[0].le_s(&args[1])),
                    OpKind::Concat => {
                        // Exact through the partial domain: concat is
                        // bitwise.
                        Interval::from_partial(
                            &args[0].as_partial().concat(&args[1].as_partial()),
                        )
                    }
                    OpKind::Slice => {
                        if args[1].is_constant() {
                            let partial = args[0].as_partial();
                            let unknowns = !partial.known();
                            let moved =
                                unknowns.shr_u_bits(args[1].min()).resize_u(op.width);
                            let value =
                                partial.value().shr_u_bits(args[1].min()).resize_u(op.width);
                            Interval::from_partial(&quartz_bits::PartialBitString::new(
                                !&moved, value,
                            ))
                        } else {
                            Interval::full(op.width)
                        }
                    }
                    OpKind::Shl => args[0].shl_bits(&args[1]),
                    OpKind::ShrU => args[0].shr_u_bits(&args[1]),
                    OpKind::ShrS => args[0].shr_s_bits(&args[1]),
                    OpKind::Select => Interval::select(&args[0], &args[1], &args[2]),
                }
            }
        };
        self.values.insert(value, result.clone());
        result
    }

    /// Lowers every output, returning `(name, range)` pairs.
    pub fn outputs(&mut self) -> Vec<(String, Interval)> {
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
