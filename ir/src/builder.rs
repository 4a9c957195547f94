//! Shape-inferring construction of computations.
//!
//! ```
//! use tessel_ir::{ComputationBuilder, Literal, Shape, DType};
//!
//! let mut b = ComputationBuilder::new("add_zero");
//! let x = b.parameter(0, Shape::array(DType::Float32, [2, 3])).unwrap();
//! let zero = b.constant(Literal::r0(0.0f32)).unwrap();
//! let sum = b.add(x, zero).unwrap();
//! let computation = b.build(sum).unwrap();
//! assert_eq!(computation.instruction_count(), 3);
//! ```

use smallvec::SmallVec;

use tessel_dtype::DType;

use crate::computation::Computation;
use crate::error::*;
use crate::instruction::InstrId;
use crate::literal::Literal;
use crate::module::ComputationId;
use crate::op::Op;
use crate::shape::Shape;
use crate::shape_inference as infer;
use crate::types::{BinaryOp, UnaryOp};
use crate::window::{ConvolutionDimensionNumbers, PaddingConfig, Window};

#[derive(Debug)]
pub struct ComputationBuilder {
    computation: Computation,
}

macro_rules! binary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(pub fn $name(&mut self, lhs: InstrId, rhs: InstrId) -> Result<InstrId> {
            self.binary(BinaryOp::$op, lhs, rhs)
        })*
    };
}

macro_rules! unary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(pub fn $name(&mut self, operand: InstrId) -> Result<InstrId> {
            self.unary(UnaryOp::$op, operand)
        })*
    };
}

impl ComputationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { computation: Computation::new(name) }
    }

    pub fn computation(&self) -> &Computation {
        &self.computation
    }

    pub fn shape_of(&self, id: InstrId) -> Result<&Shape> {
        Ok(self.computation.instruction(id)?.shape())
    }

    /// Add an instruction with an explicit result shape.
    pub fn add_instruction(&mut self, op: Op, shape: Shape, operands: &[InstrId]) -> Result<InstrId> {
        self.computation.add_instruction(op, shape, operands.iter().copied())
    }

    /// Finish with `root` as the root instruction.
    pub fn build(mut self, root: InstrId) -> Result<Computation> {
        self.computation.set_root(root)?;
        Ok(self.computation)
    }

    fn shape(&self, id: InstrId) -> Result<Shape> {
        self.shape_of(id).cloned()
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    pub fn parameter(&mut self, number: usize, shape: Shape) -> Result<InstrId> {
        self.add_instruction(Op::Parameter(number), shape, &[])
    }

    pub fn constant(&mut self, literal: Literal) -> Result<InstrId> {
        let shape = literal.shape().clone();
        self.add_instruction(Op::Constant(literal), shape, &[])
    }

    // =========================================================================
    // Element-wise
    // =========================================================================

    pub fn unary(&mut self, op: UnaryOp, operand: InstrId) -> Result<InstrId> {
        let shape = infer::unary(op, &self.shape(operand)?)?;
        self.add_instruction(Op::Unary(op), shape, &[operand])
    }

    unary_builders! {
        negate => Negate,
        abs => Abs,
        exp => Exp,
        log => Log,
        sqrt => Sqrt,
        tanh => Tanh,
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: InstrId, rhs: InstrId) -> Result<InstrId> {
        let shape = infer::binary(op, &self.shape(lhs)?, &self.shape(rhs)?)?;
        self.add_instruction(Op::Binary(op), shape, &[lhs, rhs])
    }

    binary_builders! {
        add => Add,
        subtract => Subtract,
        multiply => Multiply,
        divide => Divide,
        power => Power,
        maximum => Maximum,
        minimum => Minimum,
    }

    pub fn clamp(&mut self, lo: InstrId, operand: InstrId, hi: InstrId) -> Result<InstrId> {
        let shape = infer::clamp(&self.shape(lo)?, &self.shape(operand)?, &self.shape(hi)?)?;
        self.add_instruction(Op::Clamp, shape, &[lo, operand, hi])
    }

    pub fn select(&mut self, pred: InstrId, on_true: InstrId, on_false: InstrId) -> Result<InstrId> {
        let shape = infer::select(&self.shape(pred)?, &self.shape(on_true)?, &self.shape(on_false)?)?;
        self.add_instruction(Op::Select, shape, &[pred, on_true, on_false])
    }

    pub fn convert(&mut self, operand: InstrId, dtype: DType) -> Result<InstrId> {
        let shape = infer::convert(&self.shape(operand)?, dtype)?;
        self.add_instruction(Op::Convert, shape, &[operand])
    }

    /// Copy keeping the operand's shape and layout.
    pub fn copy(&mut self, operand: InstrId) -> Result<InstrId> {
        let shape = self.shape(operand)?;
        self.add_instruction(Op::Copy, shape, &[operand])
    }

    /// Copy into a new physical layout.
    pub fn copy_with_layout(&mut self, operand: InstrId, minor_to_major: &[usize]) -> Result<InstrId> {
        let shape = self.shape(operand)?.relayout(minor_to_major.iter().copied())?;
        self.add_instruction(Op::Copy, shape, &[operand])
    }

    pub fn bitcast(&mut self, operand: InstrId, shape: Shape) -> Result<InstrId> {
        self.add_instruction(Op::Bitcast, shape, &[operand])
    }

    // =========================================================================
    // Shape transforms
    // =========================================================================

    pub fn reshape(&mut self, operand: InstrId, dims: &[usize]) -> Result<InstrId> {
        let shape = infer::reshape(&self.shape(operand)?, dims)?;
        self.add_instruction(Op::Reshape, shape, &[operand])
    }

    pub fn transpose(&mut self, operand: InstrId, permutation: &[usize]) -> Result<InstrId> {
        let shape = infer::transpose(&self.shape(operand)?, permutation)?;
        self.add_instruction(Op::Transpose { permutation: SmallVec::from_slice(permutation) }, shape, &[operand])
    }

    pub fn broadcast(&mut self, operand: InstrId, target: &[usize], dimensions: &[usize]) -> Result<InstrId> {
        let shape = infer::broadcast(&self.shape(operand)?, target, dimensions)?;
        self.add_instruction(Op::Broadcast { dimensions: SmallVec::from_slice(dimensions) }, shape, &[operand])
    }

    pub fn slice(&mut self, operand: InstrId, starts: &[usize], limits: &[usize], strides: &[usize]) -> Result<InstrId> {
        let shape = infer::slice(&self.shape(operand)?, starts, limits, strides)?;
        let op = Op::Slice {
            starts: SmallVec::from_slice(starts),
            limits: SmallVec::from_slice(limits),
            strides: SmallVec::from_slice(strides),
        };
        self.add_instruction(op, shape, &[operand])
    }

    pub fn concatenate(&mut self, operands: &[InstrId], dimension: usize) -> Result<InstrId> {
        let shapes = operands.iter().map(|&id| self.shape(id)).collect::<Result<Vec<_>>>()?;
        let shape = infer::concatenate(&shapes.iter().collect::<Vec<_>>(), dimension)?;
        self.add_instruction(Op::Concatenate { dimension }, shape, operands)
    }

    pub fn pad(&mut self, operand: InstrId, padding_value: InstrId, config: PaddingConfig) -> Result<InstrId> {
        let shape = infer::pad(&self.shape(operand)?, &self.shape(padding_value)?, &config)?;
        self.add_instruction(Op::Pad { config }, shape, &[operand, padding_value])
    }

    pub fn reverse(&mut self, operand: InstrId, dimensions: &[usize]) -> Result<InstrId> {
        let shape = infer::reverse(&self.shape(operand)?, dimensions)?;
        self.add_instruction(Op::Reverse { dimensions: SmallVec::from_slice(dimensions) }, shape, &[operand])
    }

    // =========================================================================
    // Tuples
    // =========================================================================

    pub fn tuple(&mut self, elements: &[InstrId]) -> Result<InstrId> {
        let shapes = elements.iter().map(|&id| self.shape(id)).collect::<Result<Vec<_>>>()?;
        let shape = infer::tuple(&shapes.iter().collect::<Vec<_>>());
        self.add_instruction(Op::Tuple, shape, elements)
    }

    pub fn get_tuple_element(&mut self, operand: InstrId, index: usize) -> Result<InstrId> {
        let shape = infer::get_tuple_element(&self.shape(operand)?, index)?;
        self.add_instruction(Op::GetTupleElement { index }, shape, &[operand])
    }

    // =========================================================================
    // Contractions and reductions
    // =========================================================================

    pub fn dot(&mut self, lhs: InstrId, rhs: InstrId) -> Result<InstrId> {
        let shape = infer::dot(&self.shape(lhs)?, &self.shape(rhs)?)?;
        self.add_instruction(Op::Dot, shape, &[lhs, rhs])
    }

    pub fn convolution(
        &mut self,
        input: InstrId,
        kernel: InstrId,
        window: Window,
        dimension_numbers: ConvolutionDimensionNumbers,
    ) -> Result<InstrId> {
        let shape = infer::convolution(&self.shape(input)?, &self.shape(kernel)?, &window, &dimension_numbers)?;
        self.add_instruction(Op::Convolution { window, dimension_numbers }, shape, &[input, kernel])
    }

    pub fn reduce(
        &mut self,
        operand: InstrId,
        init: InstrId,
        dimensions: &[usize],
        reducer: ComputationId,
    ) -> Result<InstrId> {
        let shape = infer::reduce(&self.shape(operand)?, &self.shape(init)?, dimensions)?;
        let op = Op::Reduce { dimensions: SmallVec::from_slice(dimensions), reducer };
        self.add_instruction(op, shape, &[operand, init])
    }

    pub fn reduce_window(
        &mut self,
        operand: InstrId,
        init: InstrId,
        window: Window,
        reducer: ComputationId,
    ) -> Result<InstrId> {
        let shape = infer::reduce_window(&self.shape(operand)?, &self.shape(init)?, &window)?;
        self.add_instruction(Op::ReduceWindow { window, reducer }, shape, &[operand, init])
    }

    /// Call `target`; the result shape is the callee's root shape.
    pub fn call(&mut self, target: ComputationId, result: Shape, arguments: &[InstrId]) -> Result<InstrId> {
        self.add_instruction(Op::Call { target }, result, arguments)
    }
}

/// Two-parameter scalar computation `op(p0, p1)`, the usual reducer body.
pub fn scalar_reducer(name: impl Into<String>, dtype: DType, op: BinaryOp) -> Result<Computation> {
    let mut b = ComputationBuilder::new(name);
    let lhs = b.parameter(0, Shape::scalar(dtype))?;
    let rhs = b.parameter(1, Shape::scalar(dtype))?;
    let root = b.binary(op, lhs, rhs)?;
    b.build(root)
}
