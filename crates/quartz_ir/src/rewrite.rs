//! Local peephole rewrites applied during operator construction.
//!
//! `Module::op` consults this table after constant folding and before
//! hash-consing; the first matching rewrite wins. Rewrites construct their
//! replacements back through `Module::op`, so they compose (a slice of a
//! concat that lands on another slice keeps simplifying).
//!
//! Commutative canonicalization guarantees that a lone constant operand of
//! a commutative operator sits on the left, which is what the
//! constant-matching arms below rely on.

use crate::error::IrError;
use crate::ids::ValueId;
use crate::module::Module;
use crate::value::{OpArgs, OpKind, Value};
use quartz_bits::BitString;

fn op_parts(module: &Module, id: ValueId) -> Option<(OpKind, OpArgs)> {
    match module.value(id) {
        Value::Op(op) => Some((op.kind, op.args.clone())),
        _ => None,
    }
}

fn const_u64(module: &Module, id: ValueId) -> Option<u64> {
    module.constant_of(id).map(BitString::as_u64)
}

fn is_const_zero(module: &Module, id: ValueId) -> bool {
    module.constant_of(id).is_some_and(BitString::is_zero)
}

fn is_const_ones(module: &Module, id: ValueId) -> bool {
    module.constant_of(id).is_some_and(BitString::is_all_ones)
}

/// Applies the first matching peephole rewrite, or returns `None` to let
/// the caller hash-cons the operator as-is.
pub(crate) fn peephole(
    module: &mut Module,
    kind: OpKind,
    args: &[ValueId],
) -> Result<Option<ValueId>, IrError> {
    let width = |module: &Module, id: ValueId| module.width(id);
    let rewritten = match kind {
        OpKind::And => {
            if args[0] == args[1] {
                Some(args[0])
            } else if is_const_zero(module, args[0]) {
                Some(args[0])
            } else if is_const_ones(module, args[0]) {
                Some(args[1])
            } else {
                None
            }
        }
        OpKind::Or => {
            if args[0] == args[1] {
                Some(args[0])
            } else if is_const_zero(module, args[0]) {
                Some(args[1])
            } else if is_const_ones(module, args[0]) {
                Some(args[0])
            } else {
                None
            }
        }
        OpKind::Xor => {
            if args[0] == args[1] {
                let zero = BitString::new(width(module, args[0]));
                Some(module.constant(zero))
            } else if is_const_zero(module, args[0]) {
                Some(args[1])
            } else if is_const_ones(module, args[0]) {
                Some(module.op(OpKind::Not, &[args[1]])?)
            } else {
                None
            }
        }
        OpKind::Not => match op_parts(module, args[0]) {
            Some((OpKind::Not, inner)) => Some(inner[0]),
            _ => None,
        },
        OpKind::Add => {
            if is_const_zero(module, args[0]) {
                Some(args[1])
            } else {
                None
            }
        }
        OpKind::Sub => {
            if args[0] == args[1] {
                let zero = BitString::new(width(module, args[0]));
                Some(module.constant(zero))
            } else if is_const_zero(module, args[1]) {
                Some(args[0])
            } else {
                None
            }
        }
        OpKind::Eq => {
            if args[0] == args[1] {
                Some(module.constant(BitString::from_bool(true)))
            } else if width(module, args[1]) == 1 && is_const_zero(module, args[0]) {
                Some(module.op(OpKind::Not, &[args[1]])?)
            } else if width(module, args[1]) == 1 && is_const_ones(module, args[0]) {
                Some(args[1])
            } else {
                None
            }
        }
        OpKind::LtU => {
            if args[0] == args[1] || is_const_zero(module, args[1]) {
                Some(module.constant(BitString::from_bool(false)))
            } else {
                None
            }
        }
        OpKind::LtS => {
            if args[0] == args[1] {
                Some(module.constant(BitString::from_bool(false)))
            } else {
                None
            }
        }
        OpKind::LeU => {
            if args[0] == args[1] || is_const_zero(module, args[0]) {
                Some(module.constant(BitString::from_bool(true)))
            } else {
                None
            }
        }
        OpKind::LeS => {
            if args[0] == args[1] {
                Some(module.constant(BitString::from_bool(true)))
            } else {
                None
            }
        }
        OpKind::Shl | OpKind::ShrU => {
            if is_const_zero(module, args[1]) || is_const_zero(module, args[0]) {
                Some(args[0])
            } else {
                None
            }
        }
        OpKind::ShrS => {
            if is_const_zero(module, args[1]) || is_const_ones(module, args[0]) {
                Some(args[0])
            } else {
                None
            }
        }
        OpKind::Select => {
            if let Some(cond) = module.constant_of(args[0]) {
                Some(if cond.at(0) { args[1] } else { args[2] })
            } else if args[1] == args[2] {
                Some(args[1])
            } else {
                None
            }
        }
        OpKind::Concat => rewrite_concat(module, args)?,
        OpKind::Slice => rewrite_slice(module, args)?,
        OpKind::Mul => None,
    };
    Ok(rewritten)
}

/// `Concat(Slice(s, o1, w1), Slice(s, o0, w0))` with `o0 + w0 = o1` is one
/// contiguous window of `s`.
fn rewrite_concat(module: &mut Module, args: &[ValueId]) -> Result<Option<ValueId>, IrError> {
    let Some((OpKind::Slice, high)) = op_parts(module, args[0]) else {
        return Ok(None);
    };
    let Some((OpKind::Slice, low)) = op_parts(module, args[1]) else {
        return Ok(None);
    };
    if high[0] != low[0] {
        return Ok(None);
    }
    let (Some(high_offset), Some(low_offset)) =
        (const_u64(module, high[1]), const_u64(module, low[1]))
    else {
        return Ok(None);
    };
    let high_width = module.width(args[0]) as u64;
    let low_width = module.width(args[1]) as u64;
    if low_offset + low_width != high_offset {
        return Ok(None);
    }
    let merged_width = module.constant(BitString::from_u64(low_width + high_width));
    Ok(Some(module.op(OpKind::Slice, &[low[0], low[1], merged_width])?))
}

fn rewrite_slice(module: &mut Module, args: &[ValueId]) -> Result<Option<ValueId>, IrError> {
    let source = args[0];
    let result_width = const_u64(module, args[2]).expect("slice width checked by caller") as usize;
    let offset = const_u64(module, args[1]);

    if offset == Some(0) && result_width == module.width(source) {
        return Ok(Some(source));
    }

    if let Some(offset) = offset {
        match op_parts(module, source) {
            // A window that lies entirely within one side of a concat only
            // needs that side.
            Some((OpKind::Concat, parts)) => {
                let low_width = module.width(parts[1]) as u64;
                if offset + result_width as u64 <= low_width {
                    return Ok(Some(module.op(OpKind::Slice, &[parts[1], args[1], args[2]])?));
                }
                if offset >= low_width {
                    let shifted = module.constant(BitString::from_u64(offset - low_width));
                    return Ok(Some(
                        module.op(OpKind::Slice, &[parts[0], shifted, args[2]])?,
                    ));
                }
            }
            // A slice of a slice reads from the original source at the
            // summed offset.
            Some((OpKind::Slice, parts)) => {
                if let Some(inner_offset) = const_u64(module, parts[1]) {
                    let summed = module.constant(BitString::from_u64(inner_offset + offset));
                    return Ok(Some(
                        module.op(OpKind::Slice, &[parts[0], summed, args[2]])?,
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}
