use snafu::Snafu;
use tessel_dtype::DType;

use crate::{ComputationId, InstrId, shape::Shape};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // =========================================================================
    // Shapes and literals
    // =========================================================================
    /// Layout is not a permutation of the shape's dimensions.
    #[snafu(display("invalid layout {minor_to_major:?}: expected permutation of 0..{rank}"))]
    InvalidLayout { minor_to_major: Vec<usize>, rank: usize },

    /// Tuple element type where an array element type is required.
    #[snafu(display("tuple element type is not valid here"))]
    TupleElementType,

    /// Literal value count does not match its dimensions.
    #[snafu(display("literal size mismatch: dimensions hold {expected} elements, got {actual} values"))]
    LiteralSizeMismatch { expected: usize, actual: usize },

    // =========================================================================
    // Shape inference
    // =========================================================================
    /// DType mismatch between operands.
    #[snafu(display("dtype mismatch: cannot combine {lhs} and {rhs}"))]
    DTypeMismatch { lhs: DType, rhs: DType },

    /// Element-wise operands are neither scalars nor of equal dimensions.
    #[snafu(display("element-wise operands have incompatible shapes {lhs} and {rhs}"))]
    ElementwiseShapeMismatch { lhs: Box<Shape>, rhs: Box<Shape> },

    /// Reshape size mismatch.
    #[snafu(display("reshape size mismatch: input size {input_size} != output size {output_size}"))]
    ReshapeSizeMismatch { input_size: usize, output_size: usize },

    /// Transpose has invalid permutation.
    #[snafu(display("invalid permutation {permutation:?}: expected permutation of 0..{expected_dims}"))]
    InvalidPermutation { permutation: Vec<usize>, expected_dims: usize },

    /// Broadcast dimension mapping is malformed.
    #[snafu(display("invalid broadcast of {operand} to {target} with dimensions {dimensions:?}"))]
    InvalidBroadcast { operand: Box<Shape>, target: Box<Shape>, dimensions: Vec<usize> },

    /// Slice bounds violation.
    #[snafu(display(
        "slice bounds violation: dimension {dim} has range [{start}, {limit}) stride {stride} but size is {size}"
    ))]
    SliceBounds { dim: usize, start: usize, limit: usize, stride: usize, size: usize },

    /// Concatenate operands disagree outside the concatenation dimension.
    #[snafu(display("cannot concatenate {lhs} and {rhs} along dimension {dimension}"))]
    ConcatenateMismatch { lhs: Box<Shape>, rhs: Box<Shape>, dimension: usize },

    /// Pad dimension count mismatch.
    #[snafu(display("pad dimension mismatch: padding has {padding_dims} dimensions but shape has {shape_dims}"))]
    PadDimensionMismatch { padding_dims: usize, shape_dims: usize },

    /// Negative padding removes more elements than the dimension holds.
    #[snafu(display("pad of dimension {dim} produces a negative size"))]
    PadNegativeSize { dim: usize },

    /// Dot operands do not contract.
    #[snafu(display("dot operands {lhs} and {rhs} do not contract"))]
    DotShapeMismatch { lhs: Box<Shape>, rhs: Box<Shape> },

    /// Dimension index outside the operand's rank.
    #[snafu(display("dimension {dim} out of range for rank {rank}"))]
    DimensionOutOfRange { dim: usize, rank: usize },

    /// Window rank differs from the operand rank.
    #[snafu(display("window rank {window_rank} does not match operand rank {rank}"))]
    WindowRankMismatch { window_rank: usize, rank: usize },

    /// Window does not fit the (padded, dilated) operand.
    #[snafu(display("window does not fit dimension {dim}"))]
    WindowTooLarge { dim: usize },

    /// Tuple index out of range.
    #[snafu(display("tuple index {index} out of range for tuple of {size} elements"))]
    TupleIndexOutOfRange { index: usize, size: usize },

    /// Operation expects a tuple operand.
    #[snafu(display("expected tuple operand, got {shape}"))]
    NotATuple { shape: Box<Shape> },

    /// Wrong number of operands for an operation.
    #[snafu(display("{op} expects {expected} operands, got {actual}"))]
    OperandCount { op: &'static str, expected: usize, actual: usize },

    // =========================================================================
    // Graph
    // =========================================================================
    /// Instruction handle does not refer to a live instruction.
    #[snafu(display("unknown instruction {id}"))]
    UnknownInstruction { id: InstrId },

    /// Computation handle does not refer to a computation of this module.
    #[snafu(display("unknown computation {id}"))]
    UnknownComputation { id: ComputationId },

    /// Computation has no root instruction.
    #[snafu(display("computation {name} has no root"))]
    MissingRoot { name: String },

    /// Removal of an instruction that still has users or is the root.
    #[snafu(display("instruction {id} is still live"))]
    InstructionLive { id: InstrId },

    /// Replacement whose shape is incompatible with the replaced instruction.
    #[snafu(display("cannot replace {old} ({old_shape}) with {new} ({new_shape}): incompatible shapes"))]
    ReplacementShapeMismatch { old: InstrId, new: InstrId, old_shape: Box<Shape>, new_shape: Box<Shape> },

    /// Declared shape differs from the shape its operands imply.
    #[snafu(display("instruction {id} declares {declared} but its operands imply {inferred}"))]
    VerifyShapeMismatch { id: InstrId, declared: Box<Shape>, inferred: Box<Shape> },

    /// Use/def edges are out of sync.
    #[snafu(display("instruction {id} has inconsistent users"))]
    VerifyUsers { id: InstrId },

    // =========================================================================
    // Evaluation
    // =========================================================================
    /// Argument count or shape does not match the computation's parameters.
    #[snafu(display("parameter {index} expects {expected}, got {actual}"))]
    ArgumentMismatch { index: usize, expected: Box<Shape>, actual: Box<Shape> },

    /// Missing argument for a parameter.
    #[snafu(display("no argument supplied for parameter {index}"))]
    MissingArgument { index: usize },

    /// Integer division by zero.
    #[snafu(display("division by zero"))]
    DivisionByZero,

    /// Operation the reference evaluator does not implement.
    #[snafu(display("evaluation of {op} is not supported"))]
    UnsupportedEvaluation { op: &'static str },
}
