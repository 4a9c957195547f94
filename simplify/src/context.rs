//! Mutable view of the computation a rule is rewriting.
//!
//! Rules read the graph through [`RewriteContext`] and create instructions
//! through its shape-inferring constructors. Intermediate instructions get
//! inferred (layout-free) shapes; the instruction that replaces the visited
//! one is created with the visited instruction's own shape so layouts survive.

use smallvec::SmallVec;
use tracing::debug;

use tessel_ir::shape_inference as infer;
use tessel_ir::{BinaryOp, Computation, ComputationId, InstrId, Instruction, Literal, Module, Op, Shape, UnaryOp};

use crate::config::SimplifierConfig;
use crate::error::Result;
use crate::oracle::BitcastOracle;

pub struct RewriteContext<'a> {
    module: &'a mut Module,
    computation: ComputationId,
    config: &'a SimplifierConfig,
    oracle: &'a dyn BitcastOracle,
}

impl<'a> RewriteContext<'a> {
    pub fn new(
        module: &'a mut Module,
        computation: ComputationId,
        config: &'a SimplifierConfig,
        oracle: &'a dyn BitcastOracle,
    ) -> Self {
        Self { module, computation, config, oracle }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &SimplifierConfig {
        self.config
    }

    pub fn layout_sensitive(&self) -> bool {
        self.config.layout_sensitive
    }

    pub fn computation(&self) -> &Computation {
        &self.module[self.computation]
    }

    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.computation()[id]
    }

    pub fn op(&self, id: InstrId) -> &Op {
        self.instr(id).op()
    }

    pub fn shape(&self, id: InstrId) -> &Shape {
        self.instr(id).shape()
    }

    pub fn operand(&self, id: InstrId, index: usize) -> InstrId {
        self.instr(id).operand(index)
    }

    pub fn literal(&self, id: InstrId) -> Option<&Literal> {
        self.op(id).literal()
    }

    /// Shape equality under the configured layout sensitivity.
    pub fn same_shape(&self, a: &Shape, b: &Shape) -> bool {
        a.equal_under(b, self.config.layout_sensitive)
    }

    pub fn valid_bitcast(&self, from: &Shape, to: &Shape) -> bool {
        self.oracle.is_valid_bitcast(from, to)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn computation_mut(&mut self) -> Result<&mut Computation> {
        Ok(self.module.computation_mut(self.computation)?)
    }

    pub fn add(&mut self, op: Op, shape: Shape, operands: &[InstrId]) -> Result<InstrId> {
        let operands = operands.iter().copied();
        Ok(self.computation_mut()?.add_instruction(op, shape, operands)?)
    }

    pub fn add_embedded_computation(&mut self, computation: Computation) -> ComputationId {
        self.module.add_embedded_computation(computation)
    }

    pub fn constant(&mut self, literal: Literal) -> Result<InstrId> {
        let shape = literal.shape().clone();
        self.add(Op::Constant(literal), shape, &[])
    }

    pub fn unary(&mut self, op: UnaryOp, operand: InstrId) -> Result<InstrId> {
        let shape = infer::unary(op, self.shape(operand))?;
        self.add(Op::Unary(op), shape, &[operand])
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: InstrId, rhs: InstrId) -> Result<InstrId> {
        let shape = infer::binary(op, self.shape(lhs), self.shape(rhs))?;
        self.add(Op::Binary(op), shape, &[lhs, rhs])
    }

    pub fn reshape(&mut self, operand: InstrId, shape: Shape) -> Result<InstrId> {
        infer::reshape(self.shape(operand), shape.dims())?;
        self.add(Op::Reshape, shape, &[operand])
    }

    pub fn transpose(&mut self, operand: InstrId, permutation: &[usize], shape: Shape) -> Result<InstrId> {
        infer::transpose(self.shape(operand), permutation)?;
        self.add(Op::Transpose { permutation: SmallVec::from_slice(permutation) }, shape, &[operand])
    }

    pub fn broadcast(&mut self, operand: InstrId, shape: Shape, dimensions: &[usize]) -> Result<InstrId> {
        infer::broadcast(self.shape(operand), shape.dims(), dimensions)?;
        self.add(Op::Broadcast { dimensions: SmallVec::from_slice(dimensions) }, shape, &[operand])
    }

    pub fn bitcast(&mut self, operand: InstrId, shape: Shape) -> Result<InstrId> {
        self.add(Op::Bitcast, shape, &[operand])
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Replace `old` with `new` and drop whatever became dead.
    ///
    /// # Panics
    ///
    /// When the shapes differ under the configured layout sensitivity: a rule
    /// produced a non-equivalent replacement.
    pub fn replace(&mut self, old: InstrId, new: InstrId) -> Result<()> {
        let old_shape = self.shape(old);
        let new_shape = self.shape(new);
        assert!(
            self.same_shape(old_shape, new_shape),
            "rewrite of {old} changes its shape: {old_shape} -> {new_shape}"
        );
        debug!(old = %old, new = %new, "replacing instruction");
        self.computation_mut()?.replace_instruction(old, new)?;
        Ok(())
    }
}
