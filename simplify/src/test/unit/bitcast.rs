use smallvec::smallvec;

use tessel_ir::{ComputationBuilder, DType, Literal, Op, OpKey, Shape};

use crate::test::helpers::*;
use crate::{AlwaysBitcast, NeverBitcast};

fn row_major(dims: &[usize]) -> Shape {
    Shape::row_major(DType::Float32, dims.iter().copied())
}

fn column_major(dims: &[usize]) -> Shape {
    Shape::with_layout(DType::Float32, dims.iter().copied(), (0..dims.len()).collect::<Vec<_>>()).unwrap()
}

/// `reshape(p0)` with explicit shapes, bypassing the layout-free builder inference.
fn reshape_graph(from: Shape, to: Shape) -> (tessel_ir::Module, tessel_ir::ComputationId, tessel_ir::InstrId) {
    let mut b = ComputationBuilder::new("reshape");
    let p = b.parameter(0, from).unwrap();
    let root = b.add_instruction(Op::Reshape, to, &[p]).unwrap();
    let (module, entry) = module_of(b, root);
    (module, entry, p)
}

fn transpose_graph(from: Shape, to: Shape) -> (tessel_ir::Module, tessel_ir::ComputationId, tessel_ir::InstrId) {
    let mut b = ComputationBuilder::new("transpose");
    let p = b.parameter(0, from).unwrap();
    let root = b.add_instruction(Op::Transpose { permutation: smallvec![1, 0] }, to, &[p]).unwrap();
    let (module, entry) = module_of(b, root);
    (module, entry, p)
}

#[test]
fn test_row_major_flatten_becomes_bitcast() {
    let (mut module, entry, p) = reshape_graph(row_major(&[2, 3]), row_major(&[6]));
    let input = [Literal::r2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]])];
    let before = evaluate(&module, &input);

    assert!(sweep(&sensitive(AlwaysBitcast), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Bitcast, [Pat::Is(p)]));
    let root = root_of(&module, entry);
    assert_eq!(module[entry][root].shape(), &row_major(&[6]));
    assert_eq!(evaluate(&module, &input), before);
}

#[test]
fn test_oracle_veto_keeps_reshape() {
    let (mut module, entry, _) = reshape_graph(row_major(&[2, 3]), row_major(&[6]));

    assert!(!sweep(&sensitive(NeverBitcast), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Reshape, [Pat::Parameter(0)]));
}

#[test]
fn test_closure_oracle_is_consulted() {
    let (mut module, entry, _) = reshape_graph(row_major(&[2, 3]), row_major(&[6]));
    let same_rank_only = |from: &Shape, to: &Shape| from.rank() == to.rank();

    assert!(!sweep(&sensitive(same_rank_only), &mut module, entry));
}

#[test]
fn test_reshape_moving_elements_is_kept() {
    let (mut module, entry, _) = reshape_graph(column_major(&[2, 3]), row_major(&[6]));

    assert!(!sweep(&sensitive(AlwaysBitcast), &mut module, entry));
}

#[test]
fn test_reshape_bitcast_needs_layout_sensitivity() {
    let (mut module, entry, _) = reshape_graph(row_major(&[2, 3]), row_major(&[6]));
    let simplifier = crate::AlgebraicSimplifier::new(crate::SimplifierConfig::default(), AlwaysBitcast);

    sweep(&simplifier, &mut module, entry);
    assert_root_matches(&module, entry, node(OpKey::Reshape, [Pat::Parameter(0)]));
}

#[test]
fn test_transpose_into_swapped_layout_becomes_bitcast() {
    let (mut module, entry, p) = transpose_graph(row_major(&[2, 3]), column_major(&[3, 2]));
    let input = [Literal::r2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]])];
    let before = evaluate(&module, &input);

    assert!(sweep(&sensitive(AlwaysBitcast), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Bitcast, [Pat::Is(p)]));
    assert_eq!(evaluate(&module, &input), before);
}

#[test]
fn test_transpose_into_same_layout_is_kept() {
    let (mut module, entry, _) = transpose_graph(row_major(&[2, 3]), row_major(&[3, 2]));

    assert!(!sweep(&sensitive(AlwaysBitcast), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Transpose, [Pat::Parameter(0)]));
}
