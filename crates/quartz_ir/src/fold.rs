//! Concrete evaluation of operators over `BitString`s.
//!
//! This is the single definition of operator semantics on concrete values.
//! `Module::op` uses it for constant folding and the simulator uses it for
//! the per-node evaluation step, so the two can never disagree.

use crate::value::OpKind;
use quartz_bits::BitString;

/// Evaluates one operator application over concrete argument values.
///
/// Widths must already satisfy the typing rules for `kind`; the `BitString`
/// operators assert them. A `Slice` decodes its offset as a shift amount
/// and its (constant) width from argument 2, matching the shift-then-take
/// lowering the flattener produces.
pub fn eval_op(kind: OpKind, args: &[BitString]) -> BitString {
    match kind {
        OpKind::And => &args[0] & &args[1],
        OpKind::Or => &args[0] | &args[1],
        OpKind::Xor => &args[0] ^ &args[1],
        OpKind::Not => !&args[0],
        OpKind::Add => &args[0] + &args[1],
        OpKind::Sub => &args[0] - &args[1],
        OpKind::Mul => args[0].mul_u(&args[1]),
        OpKind::Eq => BitString::from_bool(args[0] == args[1]),
        OpKind::LtU => BitString::from_bool(args[0].lt_u(&args[1])),
        OpKind::LtS => BitString::from_bool(args[0].lt_s(&args[1])),
        OpKind::LeU => BitString::from_bool(args[0].le_u(&args[1])),
        OpKind::LeS => BitString::from_bool(args[0].le_s(&args[1])),
        OpKind::Concat => args[0].concat(&args[1]),
        OpKind::Slice => args[0]
            .shr_u_bits(&args[1])
            .resize_u(args[2].as_u64() as usize),
        OpKind::Shl => args[0].shl_bits(&args[1]),
        OpKind::ShrU => args[0].shr_u_bits(&args[1]),
        OpKind::ShrS => args[0].shr_s_bits(&args[1]),
        OpKind::Select => args[0].select(&args[1], &args[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> BitString {
        BitString::parse(s).unwrap()
    }

    #[test]
    fn bitwise_and_arith() {
        assert_eq!(eval_op(OpKind::And, &[bits("1100"), bits("1010")]), bits("1000"));
        assert_eq!(eval_op(OpKind::Add, &[bits("1111"), bits("0001")]), bits("0000"));
        assert_eq!(eval_op(OpKind::Sub, &[bits("0000"), bits("0001")]), bits("1111"));
    }

    #[test]
    fn mul_widens() {
        let product = eval_op(
            OpKind::Mul,
            &[BitString::from_uint(7, 4), BitString::from_uint(9, 4)],
        );
        assert_eq!(product.width(), 8);
        assert_eq!(product.as_u64(), 63);
    }

    #[test]
    fn compares() {
        assert_eq!(eval_op(OpKind::Eq, &[bits("01"), bits("01")]), bits("1"));
        assert_eq!(eval_op(OpKind::LtU, &[bits("01"), bits("10")]), bits("1"));
        assert_eq!(eval_op(OpKind::LtS, &[bits("11"), bits("01")]), bits("1"));
        assert_eq!(eval_op(OpKind::LeU, &[bits("10"), bits("10")]), bits("1"));
        assert_eq!(eval_op(OpKind::LeS, &[bits("01"), bits("11")]), bits("0"));
    }

    #[test]
    fn concat_and_slice() {
        let joined = eval_op(OpKind::Concat, &[bits("10"), bits("0111")]);
        assert_eq!(joined, bits("100111"));
        let sliced = eval_op(
            OpKind::Slice,
            &[joined, BitString::from_uint(4, 8), BitString::from_uint(2, 8)],
        );
        assert_eq!(sliced, bits("10"));
    }

    #[test]
    fn slice_past_end_pads_with_zeros() {
        // Shift-then-take semantics: a window reaching past the value reads
        // zeros, the same as the flattened shifter network.
        let sliced = eval_op(
            OpKind::Slice,
            &[bits("1011"), BitString::from_uint(3, 8), BitString::from_uint(3, 8)],
        );
        assert_eq!(sliced, bits("001"));
    }

    #[test]
    fn shifts() {
        let amount = BitString::from_uint(2, 4);
        assert_eq!(eval_op(OpKind::Shl, &[bits("0011"), amount.clone()]), bits("1100"));
        assert_eq!(eval_op(OpKind::ShrU, &[bits("1100"), amount.clone()]), bits("0011"));
        assert_eq!(eval_op(OpKind::ShrS, &[bits("1100"), amount]), bits("1111"));
    }

    #[test]
    fn select_picks_branch() {
        assert_eq!(
            eval_op(OpKind::Select, &[bits("1"), bits("1010"), bits("0101")]),
            bits("1010")
        );
        assert_eq!(
            eval_op(OpKind::Select, &[bits("0"), bits("1010"), bits("0101")]),
            bits("0101")
        );
    }
}
