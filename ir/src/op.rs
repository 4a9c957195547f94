//! Operation kinds and their payloads.
//!
//! [`Op`] is a closed enum: every pass that dispatches on the kind of an
//! instruction matches it exhaustively, so adding a variant is a compile error
//! at every such site. Operands are not stored here; they live on the
//! [`Instruction`](crate::Instruction) as arena handles.

use std::fmt;

use smallvec::SmallVec;

use crate::ComputationId;
use crate::literal::Literal;
use crate::types::{BinaryOp, UnaryOp};
use crate::window::{ConvolutionDimensionNumbers, PaddingConfig, Window};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Computation input number `n`.
    Parameter(usize),
    Constant(Literal),

    Unary(UnaryOp),
    Binary(BinaryOp),
    /// `clamp(lo, x, hi) = min(max(x, lo), hi)`.
    Clamp,
    /// `select(pred, on_true, on_false)`.
    Select,

    /// Element type conversion.
    Convert,
    /// Materialized copy; changes the layout when the result shape says so.
    Copy,
    /// Reinterpretation of the operand's bytes under the result shape.
    Bitcast,

    Reshape,
    Transpose {
        permutation: SmallVec<[usize; 4]>,
    },
    /// Operand dimension `i` maps to result dimension `dimensions[i]`.
    Broadcast {
        dimensions: SmallVec<[usize; 4]>,
    },
    Slice {
        starts: SmallVec<[usize; 4]>,
        limits: SmallVec<[usize; 4]>,
        strides: SmallVec<[usize; 4]>,
    },
    Concatenate {
        dimension: usize,
    },
    /// Operands: `[operand, padding_value]`.
    Pad {
        config: PaddingConfig,
    },
    Reverse {
        dimensions: SmallVec<[usize; 4]>,
    },

    Tuple,
    GetTupleElement {
        index: usize,
    },

    /// Contracts the last dimension of the lhs with the first dimension of the rhs.
    Dot,
    /// Operands: `[input, kernel]`.
    Convolution {
        window: Window,
        dimension_numbers: ConvolutionDimensionNumbers,
    },
    /// Operands: `[operand, init_value]`.
    Reduce {
        dimensions: SmallVec<[usize; 4]>,
        reducer: ComputationId,
    },
    /// Operands: `[operand, init_value]`.
    ReduceWindow {
        window: Window,
        reducer: ComputationId,
    },
    Call {
        target: ComputationId,
    },
}

/// Payload-free dispatch key of an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKey {
    Parameter,
    Constant,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Clamp,
    Select,
    Convert,
    Copy,
    Bitcast,
    Reshape,
    Transpose,
    Broadcast,
    Slice,
    Concatenate,
    Pad,
    Reverse,
    Tuple,
    GetTupleElement,
    Dot,
    Convolution,
    Reduce,
    ReduceWindow,
    Call,
}

impl Op {
    pub fn key(&self) -> OpKey {
        match self {
            Op::Parameter(_) => OpKey::Parameter,
            Op::Constant(_) => OpKey::Constant,
            Op::Unary(op) => OpKey::Unary(*op),
            Op::Binary(op) => OpKey::Binary(*op),
            Op::Clamp => OpKey::Clamp,
            Op::Select => OpKey::Select,
            Op::Convert => OpKey::Convert,
            Op::Copy => OpKey::Copy,
            Op::Bitcast => OpKey::Bitcast,
            Op::Reshape => OpKey::Reshape,
            Op::Transpose { .. } => OpKey::Transpose,
            Op::Broadcast { .. } => OpKey::Broadcast,
            Op::Slice { .. } => OpKey::Slice,
            Op::Concatenate { .. } => OpKey::Concatenate,
            Op::Pad { .. } => OpKey::Pad,
            Op::Reverse { .. } => OpKey::Reverse,
            Op::Tuple => OpKey::Tuple,
            Op::GetTupleElement { .. } => OpKey::GetTupleElement,
            Op::Dot => OpKey::Dot,
            Op::Convolution { .. } => OpKey::Convolution,
            Op::Reduce { .. } => OpKey::Reduce,
            Op::ReduceWindow { .. } => OpKey::ReduceWindow,
            Op::Call { .. } => OpKey::Call,
        }
    }

    /// Ops computing each output element from the same-index elements of their operands.
    pub fn is_elementwise(&self) -> bool {
        match self {
            Op::Unary(_) | Op::Binary(_) | Op::Clamp | Op::Select | Op::Convert | Op::Copy => true,
            Op::Parameter(_)
            | Op::Constant(_)
            | Op::Bitcast
            | Op::Reshape
            | Op::Transpose { .. }
            | Op::Broadcast { .. }
            | Op::Slice { .. }
            | Op::Concatenate { .. }
            | Op::Pad { .. }
            | Op::Reverse { .. }
            | Op::Tuple
            | Op::GetTupleElement { .. }
            | Op::Dot
            | Op::Convolution { .. }
            | Op::Reduce { .. }
            | Op::ReduceWindow { .. }
            | Op::Call { .. } => false,
        }
    }

    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Op::Constant(literal) => Some(literal),
            _ => None,
        }
    }

    /// Lowercase name used in dumps (`add`, `reshape`, `get-tuple-element`).
    pub fn name(&self) -> &'static str {
        self.key().name()
    }
}

impl OpKey {
    pub fn name(&self) -> &'static str {
        match self {
            OpKey::Parameter => "parameter",
            OpKey::Constant => "constant",
            OpKey::Unary(op) => (*op).into(),
            OpKey::Binary(op) => (*op).into(),
            OpKey::Clamp => "clamp",
            OpKey::Select => "select",
            OpKey::Convert => "convert",
            OpKey::Copy => "copy",
            OpKey::Bitcast => "bitcast",
            OpKey::Reshape => "reshape",
            OpKey::Transpose => "transpose",
            OpKey::Broadcast => "broadcast",
            OpKey::Slice => "slice",
            OpKey::Concatenate => "concatenate",
            OpKey::Pad => "pad",
            OpKey::Reverse => "reverse",
            OpKey::Tuple => "tuple",
            OpKey::GetTupleElement => "get-tuple-element",
            OpKey::Dot => "dot",
            OpKey::Convolution => "convolution",
            OpKey::Reduce => "reduce",
            OpKey::ReduceWindow => "reduce-window",
            OpKey::Call => "call",
        }
    }
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
