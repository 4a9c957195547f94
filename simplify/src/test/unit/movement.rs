use tessel_ir::{BinaryOp, ComputationBuilder, ConstValue, DType, Literal, Op, OpKey, Shape, UnaryOp};

use crate::NeverBitcast;
use crate::test::helpers::*;

fn f32s(dims: &[usize]) -> Shape {
    Shape::array(DType::Float32, dims.iter().copied())
}

/// `f32` literal counting up from 1 in row-major order.
fn iota(dims: &[usize]) -> Literal {
    let mut next = 0.0;
    Literal::from_fn(DType::Float32, dims, |_| {
        next += 1.0;
        ConstValue::Float(next)
    })
}

// ============================================================================
// Reshape
// ============================================================================

#[test]
fn test_reshape_of_reshape() {
    let mut b = ComputationBuilder::new("reshape_reshape");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let flat = b.reshape(x, &[6]).unwrap();
    let root = b.reshape(flat, &[3, 2]).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Reshape, [Pat::Is(x)]));
    let root = root_of(&module, entry);
    assert_eq!(module[entry][root].shape().dims(), &[3, 2]);
    assert!(!module[entry].contains(flat));
}

#[test]
fn test_reshape_of_broadcast_keeping_dims() {
    let mut b = ComputationBuilder::new("reshape_broadcast");
    let x = b.parameter(0, f32s(&[3])).unwrap();
    let wide = b.broadcast(x, &[2, 3], &[1]).unwrap();
    let root = b.reshape(wide, &[2, 1, 3]).unwrap();
    let (mut module, entry) = module_of(b, root);
    let input = [Literal::r1(&[1.0f32, 2.0, 3.0])];
    let before = evaluate(&module, &input);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Broadcast, [Pat::Is(x)]));
    let root = root_of(&module, entry);
    let Op::Broadcast { dimensions } = module[entry][root].op() else { unreachable!() };
    assert_eq!(dimensions.as_slice(), &[2]);
    assert_eq!(evaluate(&module, &input), before);
}

#[test]
fn test_reshape_merging_broadcast_dims_is_kept() {
    let mut b = ComputationBuilder::new("reshape_broadcast");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let wide = b.broadcast(x, &[2, 3, 4], &[0, 1]).unwrap();
    let root = b.reshape(wide, &[6, 4]).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(!sweep(&insensitive(), &mut module, entry));
    assert_eq!(root_of(&module, entry), root);
}

#[test]
fn test_transforms_of_scalar_broadcast() {
    let mut b = ComputationBuilder::new("scalar_broadcast");
    let s = b.constant(Literal::r0(3.0f32)).unwrap();
    let filled = b.broadcast(s, &[4, 6], &[]).unwrap();
    let sliced = b.slice(filled, &[0, 0], &[2, 6], &[1, 2]).unwrap();
    let transposed = b.transpose(sliced, &[1, 0]).unwrap();
    let root = b.reshape(transposed, &[6]).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Broadcast, [Pat::Is(s)]));
    assert_eq!(module[entry].instruction_count(), 2);
    assert_eq!(evaluate(&module, &[]), Literal::r1(&[3.0f32; 6]));
}

// ============================================================================
// Transpose
// ============================================================================

#[test]
fn test_inverse_transposes_cancel() {
    let mut b = ComputationBuilder::new("transpose_transpose");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let t = b.transpose(x, &[1, 0]).unwrap();
    let root = b.transpose(t, &[1, 0]).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_eq!(root_of(&module, entry), x);
    assert_eq!(module[entry].instruction_count(), 1);
}

#[test]
fn test_transposes_compose() {
    let mut b = ComputationBuilder::new("transpose_transpose");
    let x = b.parameter(0, f32s(&[2, 3, 4])).unwrap();
    let t = b.transpose(x, &[1, 0, 2]).unwrap();
    let root = b.transpose(t, &[0, 2, 1]).unwrap();
    let (mut module, entry) = module_of(b, root);
    let input = [iota(&[2, 3, 4])];
    let before = evaluate(&module, &input);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Transpose, [Pat::Is(x)]));
    let root = root_of(&module, entry);
    let Op::Transpose { permutation } = module[entry][root].op() else { unreachable!() };
    assert_eq!(permutation.as_slice(), &[1, 2, 0]);
    assert_eq!(module[entry][root].shape().dims(), &[3, 4, 2]);
    assert_eq!(evaluate(&module, &input), before);
}

// ============================================================================
// Broadcast
// ============================================================================

#[test]
fn test_broadcast_adding_degenerate_dim_is_reshape() {
    let mut b = ComputationBuilder::new("broadcast_reshape");
    let x = b.parameter(0, f32s(&[3])).unwrap();
    let root = b.broadcast(x, &[1, 3], &[1]).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Reshape, [Pat::Is(x)]));
}

#[test]
fn test_permuting_broadcast_is_transpose() {
    let mut b = ComputationBuilder::new("broadcast_transpose");
    let x = b.parameter(0, f32s(&[2, 3, 4])).unwrap();
    let root = b.broadcast(x, &[3, 4, 2], &[2, 0, 1]).unwrap();
    let (mut module, entry) = module_of(b, root);
    let input = [iota(&[2, 3, 4])];
    let before = evaluate(&module, &input);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Transpose, [Pat::Is(x)]));
    let root = root_of(&module, entry);
    let Op::Transpose { permutation } = module[entry][root].op() else { unreachable!() };
    assert_eq!(permutation.as_slice(), &[1, 2, 0]);
    assert_eq!(evaluate(&module, &input), before);
}

#[test]
fn test_broadcast_of_degenerate_reshape() {
    let mut b = ComputationBuilder::new("broadcast_of_reshape");
    let x = b.parameter(0, f32s(&[3])).unwrap();
    let row = b.reshape(x, &[1, 3]).unwrap();
    let root = b.broadcast(row, &[2, 1, 3], &[1, 2]).unwrap();
    let (mut module, entry) = module_of(b, root);
    let input = [Literal::r1(&[4.0f32, 5.0, 6.0])];
    let before = evaluate(&module, &input);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Broadcast, [Pat::Is(x)]));
    let root = root_of(&module, entry);
    let Op::Broadcast { dimensions } = module[entry][root].op() else { unreachable!() };
    assert_eq!(dimensions.as_slice(), &[2]);
    assert_eq!(evaluate(&module, &input), before);
}

// ============================================================================
// Reshape sinking
// ============================================================================

#[test]
fn test_reshape_sinks_below_unary() {
    let mut b = ComputationBuilder::new("sink");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let r = b.reshape(x, &[2, 1, 3]).unwrap();
    let root = b.negate(r).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(&module, entry, node(OpKey::Reshape, [unary(UnaryOp::Negate, Pat::Is(x))]));
    let root = root_of(&module, entry);
    assert_eq!(module[entry][root].shape().dims(), &[2, 1, 3]);
}

#[test]
fn test_reshape_sinks_below_scalar_multiply() {
    let mut b = ComputationBuilder::new("sink");
    let x = b.parameter(0, f32s(&[1, 4])).unwrap();
    let r = b.reshape(x, &[4]).unwrap();
    let two = b.constant(Literal::r0(2.0f32)).unwrap();
    let root = b.multiply(r, two).unwrap();
    let (mut module, entry) = module_of(b, root);
    let input = [Literal::r2(&[[1.0f32, 2.0, 3.0, 4.0]])];
    let before = evaluate(&module, &input);

    assert!(sweep(&insensitive(), &mut module, entry));
    assert_root_matches(
        &module,
        entry,
        node(OpKey::Reshape, [binary(BinaryOp::Multiply, Pat::Is(x), Pat::Is(two))]),
    );
    assert_eq!(evaluate(&module, &input), before);
}

#[test]
fn test_reshape_kept_for_array_operand() {
    let mut b = ComputationBuilder::new("no_sink");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let y = b.parameter(1, f32s(&[2, 1, 3])).unwrap();
    let r = b.reshape(x, &[2, 1, 3]).unwrap();
    let root = b.add(r, y).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(!sweep(&insensitive(), &mut module, entry));
}

#[test]
fn test_reshape_kept_when_layout_sensitive() {
    let mut b = ComputationBuilder::new("no_sink");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let r = b.reshape(x, &[2, 1, 3]).unwrap();
    let root = b.negate(r).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(!sweep(&sensitive(NeverBitcast), &mut module, entry));
}

#[test]
fn test_regrouping_reshape_is_not_sunk() {
    let mut b = ComputationBuilder::new("no_sink");
    let x = b.parameter(0, f32s(&[2, 3])).unwrap();
    let r = b.reshape(x, &[3, 2]).unwrap();
    let root = b.negate(r).unwrap();
    let (mut module, entry) = module_of(b, root);

    assert!(!sweep(&insensitive(), &mut module, entry));
}
