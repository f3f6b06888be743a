//! Peephole folding scenarios and rewrite soundness against simulation.

use quartz_bits::BitString;
use quartz_ir::{Module, OpKind, Value, ValueId};
use quartz_sim::Simulation;
use rand::Rng;

fn bits(s: &str) -> BitString {
    BitString::parse(s).unwrap()
}

#[test]
fn folding_scenarios() {
    let mut module = Module::new("fold");
    let x = module.input("x", 8);
    let zero = module.constant(BitString::new(8));
    assert_eq!(module.op(OpKind::And, &[x, zero]).unwrap(), zero);
    assert_eq!(module.op(OpKind::Xor, &[x, x]).unwrap(), zero);

    let source = module.input("s", 8);
    let high = {
        let offset = module.constant(BitString::from_u64(4));
        let width = module.constant(BitString::from_u64(2));
        module.op(OpKind::Slice, &[source, offset, width]).unwrap()
    };
    let low = {
        let offset = module.constant(BitString::from_u64(0));
        let width = module.constant(BitString::from_u64(4));
        module.op(OpKind::Slice, &[source, offset, width]).unwrap()
    };
    let joined = module.op(OpKind::Concat, &[high, low]).unwrap();
    match module.value(joined) {
        Value::Op(op) => {
            assert_eq!(op.kind, OpKind::Slice);
            assert_eq!(op.args[0], source);
            assert_eq!(op.width, 6);
            assert_eq!(module.constant_of(op.args[1]).unwrap().as_u64(), 0);
        }
        other => panic!("expected a merged slice, got {other:?}"),
    }
}

/// Cross-checks every binary rewrite against a rewrite-free evaluation:
/// `op(k, [x, c])` built through the module must simulate identically to
/// computing `k` directly on the concrete values.
#[test]
fn rewrites_preserve_simulation_semantics() {
    let width = 5;
    let special = [
        BitString::new(width),
        !&BitString::new(width),
        BitString::one(width),
        BitString::upper(width, 2),
    ];
    let kinds = [
        OpKind::And,
        OpKind::Or,
        OpKind::Xor,
        OpKind::Add,
        OpKind::Sub,
        OpKind::Eq,
        OpKind::LtU,
        OpKind::LtS,
        OpKind::LeU,
        OpKind::LeS,
        OpKind::Shl,
        OpKind::ShrU,
        OpKind::ShrS,
    ];

    let mut rng = rand::thread_rng();
    for kind in kinds {
        for constant in &special {
            for constant_side in [0, 1] {
                // Build op(x, c) (or op(c, x)) through the simplifying
                // constructor.
                let mut module = Module::new("check");
                let x = module.input("x", width);
                let pinned = module.constant(constant.clone());
                let args: [ValueId; 2] = if constant_side == 0 {
                    [pinned, x]
                } else {
                    [x, pinned]
                };
                let built = module.op(kind, &args).unwrap();
                module.output("out", built);

                let mut sim = Simulation::new(&module);
                for _ in 0..8 {
                    let x_value = if rng.gen_bool(0.3) {
                        special[rng.gen_range(0..special.len())].clone()
                    } else {
                        BitString::random(width)
                    };
                    let concrete: [BitString; 2] = if constant_side == 0 {
                        [constant.clone(), x_value.clone()]
                    } else {
                        [x_value.clone(), constant.clone()]
                    };
                    let expected = quartz_ir::fold::eval_op(kind, &concrete);
                    let outputs = sim.update(std::slice::from_ref(&x_value)).unwrap();
                    assert_eq!(
                        outputs[0], expected,
                        "{kind} with constant {constant} on side {constant_side}, x = {x_value}"
                    );
                }
            }
        }
    }
}

/// Same-argument rewrites checked the same way.
#[test]
fn same_argument_rewrites_preserve_semantics() {
    let width = 4;
    let kinds = [
        (OpKind::And, None),
        (OpKind::Or, None),
        (OpKind::Xor, None),
        (OpKind::Sub, None),
        (OpKind::Eq, Some(true)),
        (OpKind::LtU, Some(false)),
        (OpKind::LtS, Some(false)),
        (OpKind::LeU, Some(true)),
        (OpKind::LeS, Some(true)),
    ];
    for (kind, expected_bool) in kinds {
        let mut module = Module::new("check");
        let x = module.input("x", width);
        let built = module.op(kind, &[x, x]).unwrap();
        module.output("out", built);
        let mut sim = Simulation::new(&module);
        for _ in 0..8 {
            let x_value = BitString::random(width);
            let expected = match expected_bool {
                Some(value) => BitString::from_bool(value),
                None => quartz_ir::fold::eval_op(kind, &[x_value.clone(), x_value.clone()]),
            };
            let outputs = sim.update(std::slice::from_ref(&x_value)).unwrap();
            assert_eq!(outputs[0], expected, "{kind} on identical arguments");
        }
    }
}

#[test]
fn select_rewrites_preserve_semantics() {
    let mut module = Module::new("check");
    let cond = module.input("cond", 1);
    let x = module.input("x", 4);
    let same = module.op(OpKind::Select, &[cond, x, x]).unwrap();
    assert_eq!(same, x);

    let t = module.constant(bits("1100"));
    let e = module.constant(bits("0011"));
    let one = module.constant(bits("1"));
    let zero = module.constant(bits("0"));
    assert_eq!(module.op(OpKind::Select, &[one, t, e]).unwrap(), t);
    assert_eq!(module.op(OpKind::Select, &[zero, t, e]).unwrap(), e);
}

#[test]
fn slice_of_slice_and_concat_rewrites_agree_with_simulation() {
    let mut module = Module::new("check");
    let source = module.input("s", 8);
    let high = module.input("h", 4);

    let slice = |module: &mut Module, value, offset, width| {
        let offset = module.constant(BitString::from_u64(offset));
        let width = module.constant(BitString::from_u64(width));
        module.op(OpKind::Slice, &[value, offset, width]).unwrap()
    };

    let outer = slice(&mut module, source, 2, 5);
    let inner = slice(&mut module, outer, 1, 3);
    module.output("nested", inner);

    let joined = module.op(OpKind::Concat, &[high, source]).unwrap();
    let in_low = slice(&mut module, joined, 3, 4);
    let in_high = slice(&mut module, joined, 9, 2);
    module.output("in_low", in_low);
    module.output("in_high", in_high);

    let mut sim = Simulation::new(&module);
    for _ in 0..16 {
        let s = BitString::random(8);
        let h = BitString::random(4);
        let outputs = sim.update(&[s.clone(), h.clone()]).unwrap();
        assert_eq!(outputs[0], s.slice_width(3, 3).unwrap());
        assert_eq!(outputs[1], s.slice_width(3, 4).unwrap());
        assert_eq!(outputs[2], h.slice_width(1, 2).unwrap());
    }
}
