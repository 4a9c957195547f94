use proptest::prelude::*;

use tessel_ir::test::property::generators::{arb_dims_and_literal, arb_f32_literal, arb_padding_config};
use tessel_ir::{
    BinaryOp, ComputationBuilder, DType, Literal, Module, Op, PaddingConfig, PaddingDim, Shape, Window, scalar_reducer,
};

use crate::test::helpers::evaluate;
use crate::{NeverBitcast, SimplifierConfig, simplify_to_fixpoint};

fn arb_negative_pad() -> impl Strategy<Value = (Vec<usize>, Literal, PaddingConfig)> {
    arb_dims_and_literal(3, 4).prop_flat_map(|(dims, literal)| {
        (Just(dims.clone()), Just(literal), arb_padding_config(dims))
    })
}

proptest! {
    #[test]
    fn negative_padding_becomes_slices((dims, input, config) in arb_negative_pad()) {
        let mut b = ComputationBuilder::new("pad");
        let x = b.parameter(0, Shape::array(DType::Float32, dims)).unwrap();
        let value = b.constant(Literal::r0(-1.0f32)).unwrap();
        let root = b.pad(x, value, config).unwrap();
        let mut module = Module::new("pad");
        let entry = module.add_entry_computation(b.build(root).unwrap());
        let before = evaluate(&module, std::slice::from_ref(&input));

        simplify_to_fixpoint(&mut module, SimplifierConfig::default(), NeverBitcast).unwrap();
        for instr in module[entry].instructions() {
            if let Op::Pad { config } = instr.op() {
                prop_assert!(!config.has_negative_edge(), "{}", module[entry]);
            }
        }
        prop_assert_eq!(evaluate(&module, std::slice::from_ref(&input)), before);
    }

    #[test]
    fn folded_padding_reduces_the_same_windows(
        (n, input) in (1usize..=5).prop_flat_map(|n| (Just(n), arb_f32_literal(vec![n]))),
        low in 0i64..=2,
        high in 0i64..=2,
        size in 1usize..=3,
        stride in 1usize..=2,
        take_max in any::<bool>(),
    ) {
        let padded = n + (low + high) as usize;
        prop_assume!(size <= padded);

        let (op, init) = if take_max { (BinaryOp::Maximum, -1000.0f32) } else { (BinaryOp::Add, 0.0) };
        let mut module = Module::new("windows");
        let reducer = module.add_embedded_computation(scalar_reducer("reducer", DType::Float32, op).unwrap());

        let mut b = ComputationBuilder::new("windows");
        let x = b.parameter(0, Shape::array(DType::Float32, [n])).unwrap();
        let init = b.constant(Literal::r0(init)).unwrap();
        let pad = b.pad(x, init, PaddingConfig::new([PaddingDim::edge(low, high)])).unwrap();
        let mut window = Window::of_sizes([size]);
        window.dimensions[0].stride = stride;
        let root = b.reduce_window(pad, init, window, reducer).unwrap();
        let entry = module.add_entry_computation(b.build(root).unwrap());
        let before = evaluate(&module, std::slice::from_ref(&input));

        simplify_to_fixpoint(&mut module, SimplifierConfig::default(), NeverBitcast).unwrap();
        let root = module[entry].root_instruction().unwrap();
        prop_assert!(matches!(module[entry][root.operand(0)].op(), Op::Parameter(0)));
        prop_assert_eq!(evaluate(&module, std::slice::from_ref(&input)), before);
    }
}
