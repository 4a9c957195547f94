use tessel_dtype::DType;

use crate::builder::ComputationBuilder;
use crate::computation::Computation;
use crate::error::Error;
use crate::literal::Literal;
use crate::module::Module;
use crate::op::{Op, OpKey};
use crate::shape::Shape;
use crate::types::BinaryOp;

fn f32(dims: &[usize]) -> Shape {
    Shape::array(DType::Float32, dims.iter().copied())
}

#[test]
fn test_users_track_operands() {
    let mut b = ComputationBuilder::new("users");
    let x = b.parameter(0, f32(&[4])).unwrap();
    let sum = b.add(x, x).unwrap();
    let computation = b.build(sum).unwrap();

    // Repeated operands register a single user edge.
    assert_eq!(computation[x].users(), &[sum]);
    assert_eq!(computation[sum].operands(), &[x, x]);
    computation.verify().unwrap();
}

#[test]
fn test_replace_instruction_removes_dead_operands() {
    let mut b = ComputationBuilder::new("add_zero");
    let x = b.parameter(0, f32(&[2, 3])).unwrap();
    let zero = b.constant(Literal::r0(0.0f32)).unwrap();
    let sum = b.add(x, zero).unwrap();
    let mut computation = b.build(sum).unwrap();

    computation.replace_instruction(sum, x).unwrap();

    assert_eq!(computation.root(), Some(x));
    assert!(!computation.contains(sum));
    assert!(!computation.contains(zero));
    assert_eq!(computation.instruction_count(), 1);
    computation.verify().unwrap();
}

#[test]
fn test_replace_instruction_rejects_incompatible_shape() {
    let mut b = ComputationBuilder::new("mismatch");
    let x = b.parameter(0, f32(&[2, 3])).unwrap();
    let y = b.parameter(1, f32(&[3, 2])).unwrap();
    let neg = b.negate(x).unwrap();
    let mut computation = b.build(neg).unwrap();

    let result = computation.replace_instruction(neg, y);
    assert!(matches!(result, Err(Error::ReplacementShapeMismatch { .. })));
    assert!(computation.contains(neg));
}

#[test]
fn test_parameters_and_root_are_never_dead() {
    let mut b = ComputationBuilder::new("keep");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let unused = b.parameter(1, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let mut computation = b.build(neg).unwrap();

    assert!(computation.is_dead(unused));
    assert!(!computation.remove_if_dead(unused).unwrap());
    assert!(!computation.remove_if_dead(neg).unwrap());
    assert!(!computation.is_dead(neg));
}

#[test]
fn test_remove_live_instruction_fails() {
    let mut b = ComputationBuilder::new("live");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let abs = b.abs(neg).unwrap();
    let mut computation = b.build(abs).unwrap();

    assert!(matches!(computation.remove_instruction(neg), Err(Error::InstructionLive { .. })));
    assert!(matches!(computation.remove_instruction(abs), Err(Error::InstructionLive { .. })));
}

#[test]
fn test_replace_operand_keeps_edges_in_sync() {
    let mut b = ComputationBuilder::new("operand");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let y = b.parameter(1, f32(&[2])).unwrap();
    let sum = b.add(x, x).unwrap();
    let mut computation = b.build(sum).unwrap();

    computation.replace_operand(sum, 1, y).unwrap();
    assert_eq!(computation[sum].operands(), &[x, y]);
    assert_eq!(computation[x].users(), &[sum]);
    assert_eq!(computation[y].users(), &[sum]);

    computation.replace_operand(sum, 0, y).unwrap();
    assert!(computation[x].users().is_empty());
    computation.verify().unwrap();
}

#[test]
fn test_handles_are_not_reused() {
    let mut b = ComputationBuilder::new("handles");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let abs = b.abs(neg).unwrap();
    let mut computation = b.build(abs).unwrap();

    computation.replace_instruction(abs, neg).unwrap();
    let before = computation.next_id();
    let exp = computation.add_instruction(Op::Unary(crate::UnaryOp::Exp), f32(&[2]), [neg]).unwrap();
    assert_ne!(exp, abs);
    assert_eq!(computation.added_since(before).collect::<Vec<_>>(), vec![exp]);
    assert!(computation.get(abs).is_none());
}

#[test]
fn test_post_order_visits_operands_first() {
    let mut b = ComputationBuilder::new("order");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let exp = b.exp(x).unwrap();
    let sum = b.add(neg, exp).unwrap();
    let computation = b.build(sum).unwrap();

    let order = computation.post_order();
    let position = |id| order.iter().position(|&o| o == id).unwrap();
    assert_eq!(order.len(), 4);
    assert!(position(x) < position(neg));
    assert!(position(x) < position(exp));
    assert_eq!(*order.last().unwrap(), sum);
}

#[test]
fn test_verify_detects_wrong_declared_shape() {
    let mut computation = Computation::new("bad");
    let x = computation.add_instruction(Op::Parameter(0), f32(&[2, 3]), []).unwrap();
    let sum = computation.add_instruction(Op::Binary(BinaryOp::Add), f32(&[3, 2]), [x, x]).unwrap();
    computation.set_root(sum).unwrap();
    assert!(matches!(computation.verify(), Err(Error::VerifyShapeMismatch { .. })));
}

#[test]
fn test_unknown_operand_is_rejected() {
    let mut b = ComputationBuilder::new("a");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let abs = b.abs(neg).unwrap();
    let mut computation = b.build(abs).unwrap();
    computation.replace_instruction(abs, neg).unwrap();

    let result = computation.add_instruction(Op::Copy, f32(&[2]), [abs]);
    assert!(matches!(result, Err(Error::UnknownInstruction { .. })));
}

#[test]
fn test_instruction_names() {
    let mut b = ComputationBuilder::new("names");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let neg = b.negate(x).unwrap();
    let computation = b.build(neg).unwrap();
    assert_eq!(computation[x].name(), "parameter.0");
    assert_eq!(computation[neg].name(), "negate.1");
    assert_eq!(computation[neg].key(), OpKey::Unary(crate::UnaryOp::Negate));
}

#[test]
fn test_module_handles_are_stable() {
    let mut module = Module::new("m");
    let reducer = module.add_embedded_computation(crate::scalar_reducer("add", DType::Float32, BinaryOp::Add).unwrap());
    let mut b = ComputationBuilder::new("entry");
    let x = b.parameter(0, f32(&[2])).unwrap();
    let entry = module.add_entry_computation(b.build(x).unwrap());

    let snapshot = module.computation_ids();
    module.add_embedded_computation(Computation::new("late"));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(module.computation_count(), 3);
    assert_eq!(module[reducer].name(), "add");
    assert_eq!(module.entry(), Some(entry));
    assert_eq!(module.entry_computation().map(Computation::name), Some("entry"));
}

#[test]
fn test_display_dump() {
    let mut b = ComputationBuilder::new("add_zero");
    let x = b.parameter(0, f32(&[2, 3])).unwrap();
    let zero = b.constant(Literal::r0(0.0f32)).unwrap();
    let sum = b.add(x, zero).unwrap();
    let computation = b.build(sum).unwrap();

    let expected = "computation add_zero {\n  %0 = f32[2,3] parameter(0)\n  %1 = f32[] constant(0.0)\n  ROOT %2 = f32[2,3] add(%0, %1)\n}";
    assert_eq!(computation.to_string(), expected);
}
