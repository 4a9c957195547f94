//! Tensor dataflow IR for the Tessel simplifier.
//!
//! This crate defines the graph the algebraic simplifier rewrites: typed
//! instructions over multi-dimensional arrays, grouped into computations and
//! modules, together with the shape and layout reasoning rewrites rely on.
//!
//! # Module Organization
//!
//! - [`types`] - Scalar values and element-wise operator tags
//! - [`shape`] - Shapes and physical layouts
//! - [`shape_util`] - Permutation, reshape and bitcast analysis
//! - [`shape_inference`] - Result shapes of operations
//! - [`window`] - Window, padding and convolution descriptors
//! - [`literal`] - Constant arrays
//! - [`op`] - Operation enum defining all IR operations
//! - [`instruction`], [`computation`], [`module`] - The instruction arena and its owners
//! - [`builder`] - Shape-inferring construction
//! - [`eval`] - Reference evaluator over literals
//! - [`error`] - Error types and result handling

pub mod builder;
pub mod computation;
pub mod display;
pub mod error;
pub mod eval;
pub mod instruction;
pub mod literal;
pub mod module;
pub mod op;
pub mod shape;
pub mod shape_inference;
pub mod shape_util;
pub mod types;
pub mod verify;
pub mod window;


pub use builder::{ComputationBuilder, scalar_reducer};
pub use computation::Computation;
pub use error::{Error, Result};
pub use eval::Evaluator;
pub use instruction::{InstrId, Instruction, Operands};
pub use literal::{Literal, NativeScalar};
pub use module::{ComputationId, Module};
pub use op::{Op, OpKey};
pub use shape::{Dims, Layout, Shape};
pub use types::{BinaryOp, ConstValue, UnaryOp};
pub use window::{ConvolutionDimensionNumbers, PaddingConfig, PaddingDim, Window, WindowDimension};

// Re-export external types for convenience
pub use tessel_dtype::DType;
