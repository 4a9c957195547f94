//! Graph construction and structural assertions for simplifier tests.

use tessel_ir::{
    BinaryOp, Computation, ComputationBuilder, ComputationId, Evaluator, InstrId, Literal, Module, OpKey, UnaryOp,
};

use crate::{AlgebraicSimplifier, BitcastOracle, NeverBitcast, Pass, SimplifierConfig};

/// Module holding the computation built from `b` as its entry.
pub fn module_of(b: ComputationBuilder, root: InstrId) -> (Module, ComputationId) {
    let mut module = Module::new("test");
    let entry = module.add_entry_computation(b.build(root).unwrap());
    (module, entry)
}

pub fn insensitive() -> AlgebraicSimplifier {
    AlgebraicSimplifier::new(SimplifierConfig::default(), NeverBitcast)
}

pub fn sensitive(oracle: impl BitcastOracle + 'static) -> AlgebraicSimplifier {
    AlgebraicSimplifier::new(SimplifierConfig::builder().layout_sensitive(true).build(), oracle)
}

/// One sweep over the entry computation.
pub fn sweep(simplifier: &AlgebraicSimplifier, module: &mut Module, entry: ComputationId) -> bool {
    simplifier.run_on_computation(module, entry).unwrap()
}

pub fn root_of(module: &Module, entry: ComputationId) -> InstrId {
    module[entry].root().unwrap()
}

pub fn evaluate(module: &Module, arguments: &[Literal]) -> Literal {
    Evaluator::new(module).evaluate_entry(arguments).unwrap()
}

// ============================================================================
// Structural patterns
// ============================================================================

/// Expected shape of a subgraph.
#[derive(Debug, Clone)]
pub enum Pat {
    Any,
    Is(InstrId),
    Parameter(usize),
    Constant,
    Node(OpKey, Vec<Pat>),
}

pub fn node(key: OpKey, operands: impl IntoIterator<Item = Pat>) -> Pat {
    Pat::Node(key, operands.into_iter().collect())
}

pub fn unary(op: UnaryOp, operand: Pat) -> Pat {
    node(OpKey::Unary(op), [operand])
}

pub fn binary(op: BinaryOp, lhs: Pat, rhs: Pat) -> Pat {
    node(OpKey::Binary(op), [lhs, rhs])
}

pub fn matches(computation: &Computation, id: InstrId, pat: &Pat) -> bool {
    let Some(instr) = computation.get(id) else {
        return false;
    };
    match pat {
        Pat::Any => true,
        Pat::Is(expected) => id == *expected,
        Pat::Parameter(n) => instr.op() == &tessel_ir::Op::Parameter(*n),
        Pat::Constant => instr.is_constant(),
        Pat::Node(key, operands) => {
            instr.key() == *key
                && instr.operand_count() == operands.len()
                && instr.operands().iter().zip(operands).all(|(&o, p)| matches(computation, o, p))
        }
    }
}

#[track_caller]
pub fn assert_root_matches(module: &Module, entry: ComputationId, pat: Pat) {
    let computation = &module[entry];
    let root = root_of(module, entry);
    assert!(matches(computation, root, &pat), "root does not match {pat:?}\n{computation}");
}
