//! Reference evaluator over literals.
//!
//! Interprets a computation instruction by instruction in post order. It is
//! deliberately naive (no fusion, no buffer reuse) and exists so tests can
//! check that a rewritten computation produces the same values as the
//! original. Layouts only matter for [`Op::Bitcast`], which reinterprets the
//! operand's physical element order under the result layout; every other op is
//! evaluated on logical (row-major) indices.

pub mod scalar;

use std::collections::HashMap;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tracing::trace;

use tessel_dtype::DType;

use crate::computation::Computation;
use crate::error::*;
use crate::instruction::{InstrId, Instruction};
use crate::literal::Literal;
use crate::module::{ComputationId, Module};
use crate::op::Op;
use crate::shape::Shape;
use crate::shape_util::{self, DimVec};
use crate::types::{BinaryOp, ConstValue, UnaryOp};
use crate::window::{ConvolutionDimensionNumbers, PaddingConfig, Window};

pub use scalar::{eval_binary_op, eval_unary_op};

/// Evaluates computations of one module.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'m> {
    module: &'m Module,
}

impl<'m> Evaluator<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    /// Evaluate the entry computation.
    pub fn evaluate_entry(&self, arguments: &[Literal]) -> Result<Literal> {
        let entry = self.module.entry().context(MissingRootSnafu { name: self.module.name().to_string() })?;
        self.evaluate(entry, arguments)
    }

    pub fn evaluate(&self, id: ComputationId, arguments: &[Literal]) -> Result<Literal> {
        self.evaluate_computation(self.module.computation(id)?, arguments)
    }

    /// Evaluate `computation`, which may or may not be registered in the module.
    pub fn evaluate_computation(&self, computation: &Computation, arguments: &[Literal]) -> Result<Literal> {
        let root = computation.root().context(MissingRootSnafu { name: computation.name().to_string() })?;
        let mut values: HashMap<InstrId, Literal> = HashMap::new();
        for id in computation.post_order() {
            let instr = computation.instruction(id)?;
            let value = {
                let operands = instr
                    .operands()
                    .iter()
                    .map(|o| values.get(o).context(UnknownInstructionSnafu { id: *o }))
                    .collect::<Result<SmallVec<[&Literal; 4]>>>()?;
                self.evaluate_instruction(computation, instr, &operands, arguments)?
            };
            trace!(instr = %id, op = instr.op().name(), "evaluated");
            values.insert(id, value);
        }
        values.remove(&root).context(UnknownInstructionSnafu { id: root })
    }

    fn evaluate_instruction(
        &self,
        computation: &Computation,
        instr: &Instruction,
        operands: &[&Literal],
        arguments: &[Literal],
    ) -> Result<Literal> {
        let shape = instr.shape();
        match instr.op() {
            Op::Parameter(index) => {
                let argument = arguments.get(*index).context(MissingArgumentSnafu { index: *index })?;
                ensure!(
                    argument.shape().compatible(shape),
                    ArgumentMismatchSnafu {
                        index: *index,
                        expected: Box::new(shape.clone()),
                        actual: Box::new(argument.shape().clone())
                    }
                );
                Ok(argument.clone())
            }
            Op::Constant(literal) => Ok(literal.clone()),
            Op::Unary(op) => unary(*op, shape, operands[0]),
            Op::Binary(op) => binary(*op, shape, operands[0], operands[1]),
            Op::Clamp => {
                let operand_dtype = operands[1].dtype();
                elementwise(shape, operands, |v| {
                    let raised = binary_value(BinaryOp::Maximum, operand_dtype, v[1], v[0])?;
                    binary_value(BinaryOp::Minimum, operand_dtype, raised, v[2])
                })
            }
            Op::Select => elementwise(shape, operands, |v| {
                Ok(if matches!(v[0], ConstValue::Bool(true)) { v[1] } else { v[2] })
            }),
            Op::Convert => operands[0].convert(shape.dtype()),
            Op::Copy | Op::Reshape => operands[0].reshape(shape.dims()),
            Op::Bitcast => {
                let operand_shape = computation.instruction(instr.operand(0))?.shape();
                bitcast(operand_shape, shape, operands[0])
            }
            Op::Transpose { permutation } => Ok(transpose(shape, operands[0], permutation)),
            Op::Broadcast { dimensions } => Ok(broadcast(shape, operands[0], dimensions)),
            Op::Slice { starts, strides, .. } => Ok(slice(shape, operands[0], starts, strides)),
            Op::Concatenate { dimension } => Ok(concatenate(shape, operands, *dimension)),
            Op::Pad { config } => pad(shape, operands[0], operands[1], config),
            Op::Reverse { dimensions } => Ok(reverse(shape, operands[0], dimensions)),
            Op::Tuple => Ok(Literal::tuple(operands.iter().map(|l| (*l).clone()).collect())),
            Op::GetTupleElement { index } => operands[0]
                .tuple_elements()
                .get(*index)
                .cloned()
                .context(TupleIndexOutOfRangeSnafu { index: *index, size: operands[0].tuple_elements().len() }),
            Op::Dot => dot(shape, operands[0], operands[1]),
            Op::Convolution { window, dimension_numbers } => {
                convolution(shape, operands[0], operands[1], window, dimension_numbers)
            }
            Op::Reduce { dimensions, reducer } => self.reduce(shape, operands[0], operands[1], dimensions, *reducer),
            Op::ReduceWindow { window, reducer } => {
                self.reduce_window(shape, operands[0], operands[1], window, *reducer)
            }
            Op::Call { target } => {
                let arguments: Vec<Literal> = operands.iter().map(|l| (*l).clone()).collect();
                self.evaluate(*target, &arguments)
            }
        }
    }

    fn apply_reducer(&self, reducer: ComputationId, dtype: DType, acc: ConstValue, v: ConstValue) -> Result<ConstValue> {
        let result = self.evaluate(reducer, &[Literal::scalar(dtype, acc), Literal::scalar(dtype, v)])?;
        result.scalar_value().context(UnsupportedEvaluationSnafu { op: "reduce" })
    }

    fn reduce(
        &self,
        shape: &Shape,
        operand: &Literal,
        init: &Literal,
        dimensions: &[usize],
        reducer: ComputationId,
    ) -> Result<Literal> {
        let init = init.scalar_value().context(UnsupportedEvaluationSnafu { op: "reduce" })?;
        let mut acc = vec![init; shape.element_count()];
        let kept: DimVec = (0..operand.dims().len()).filter(|d| !dimensions.contains(d)).collect();
        let mut failure = None;
        shape_util::for_each_index(operand.dims(), |index| {
            if failure.is_some() {
                return;
            }
            let out: DimVec = kept.iter().map(|&d| index[d]).collect();
            let slot = shape_util::row_major_linear_index(shape.dims(), &out);
            let v = operand.values()[shape_util::row_major_linear_index(operand.dims(), index)];
            match self.apply_reducer(reducer, shape.dtype(), acc[slot], v) {
                Ok(next) => acc[slot] = next,
                Err(e) => failure = Some(e),
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        Literal::from_values(shape.dtype(), shape.dims().iter().copied(), acc)
    }

    fn reduce_window(
        &self,
        shape: &Shape,
        operand: &Literal,
        init: &Literal,
        window: &Window,
        reducer: ComputationId,
    ) -> Result<Literal> {
        let init = init.scalar_value().context(UnsupportedEvaluationSnafu { op: "reduce-window" })?;
        let window_sizes: DimVec = window.dimensions.iter().map(|d| d.size).collect();
        let mut values = Vec::with_capacity(shape.element_count());
        let mut failure = None;
        shape_util::for_each_index(shape.dims(), |out| {
            let mut acc = init;
            shape_util::for_each_index(&window_sizes, |offset| {
                if failure.is_some() {
                    return;
                }
                let Some(index) = windowed_source_index(window, operand.dims(), out, offset) else { return };
                let v = operand.values()[shape_util::row_major_linear_index(operand.dims(), &index)];
                match self.apply_reducer(reducer, shape.dtype(), acc, v) {
                    Ok(next) => acc = next,
                    Err(e) => failure = Some(e),
                }
            });
            values.push(acc);
        });
        if let Some(e) = failure {
            return Err(e);
        }
        Literal::from_values(shape.dtype(), shape.dims().iter().copied(), values)
    }
}

/// Operand index a window element reads, `None` when it falls in padding or a base-dilation hole.
fn windowed_source_index(window: &Window, dims: &[usize], out: &[usize], offset: &[usize]) -> Option<DimVec> {
    window
        .dimensions
        .iter()
        .zip(dims)
        .zip(out.iter().zip(offset))
        .map(|((wd, &size), (&o, &k))| {
            let pos = (o * wd.stride + k * wd.window_dilation) as i64 - wd.padding_low;
            if pos < 0 || pos % wd.base_dilation as i64 != 0 {
                return None;
            }
            let index = (pos / wd.base_dilation as i64) as usize;
            (index < size).then_some(index)
        })
        .collect()
}

// ============================================================================
// Element-wise
// ============================================================================

/// Map `f` over same-index elements; scalar operands broadcast.
fn elementwise(
    shape: &Shape,
    operands: &[&Literal],
    f: impl Fn(&[ConstValue]) -> Result<ConstValue>,
) -> Result<Literal> {
    let mut values = Vec::with_capacity(shape.element_count());
    let mut args: SmallVec<[ConstValue; 4]> = SmallVec::new();
    for i in 0..shape.element_count() {
        args.clear();
        for operand in operands {
            let v = if operand.shape().is_scalar() { operand.values()[0] } else { operand.values()[i] };
            args.push(v);
        }
        values.push(f(&args)?);
    }
    Literal::from_values(shape.dtype(), shape.dims().iter().copied(), values)
}

fn unary_value(op: UnaryOp, dtype: DType, v: ConstValue) -> Result<ConstValue> {
    let v = v.cast(dtype).unwrap_or(v);
    eval_unary_op(op, v).context(UnsupportedEvaluationSnafu { op: <&'static str>::from(op) })
}

fn binary_value(op: BinaryOp, dtype: DType, a: ConstValue, b: ConstValue) -> Result<ConstValue> {
    let a = a.cast(dtype).unwrap_or(a);
    let b = b.cast(dtype).unwrap_or(b);
    if matches!(op, BinaryOp::Divide | BinaryOp::Remainder) && scalar::is_integer_zero(b) {
        return DivisionByZeroSnafu.fail();
    }
    eval_binary_op(op, a, b).context(UnsupportedEvaluationSnafu { op: <&'static str>::from(op) })
}

fn unary(op: UnaryOp, shape: &Shape, operand: &Literal) -> Result<Literal> {
    let dtype = operand.dtype();
    elementwise(shape, &[operand], |v| unary_value(op, dtype, v[0]))
}

fn binary(op: BinaryOp, shape: &Shape, lhs: &Literal, rhs: &Literal) -> Result<Literal> {
    let dtype = lhs.dtype();
    elementwise(shape, &[lhs, rhs], |v| binary_value(op, dtype, v[0], v[1]))
}

// ============================================================================
// Data movement
// ============================================================================

/// Build the result by mapping each result index to the operand index it reads.
fn gather(shape: &Shape, operand: &Literal, mut source: impl FnMut(&[usize]) -> DimVec) -> Literal {
    Literal::from_fn(shape.dtype(), shape.dims(), |out| {
        let index = source(out);
        operand.values()[shape_util::row_major_linear_index(operand.dims(), &index)]
    })
}

fn bitcast(from: &Shape, to: &Shape, operand: &Literal) -> Result<Literal> {
    ensure!(
        from.element_count() == to.element_count(),
        ReshapeSizeMismatchSnafu { input_size: from.element_count(), output_size: to.element_count() }
    );
    ensure!(from.dtype() == to.dtype(), DTypeMismatchSnafu { lhs: from.dtype(), rhs: to.dtype() });
    let mut physical = vec![ConstValue::zero(from.dtype()); from.element_count()];
    shape_util::for_each_index(from.dims(), |index| {
        let v = operand.values()[shape_util::row_major_linear_index(from.dims(), index)];
        physical[shape_util::physical_linear_index(from, index)] = v;
    });
    Ok(Literal::from_fn(to.dtype(), to.dims(), |index| physical[shape_util::physical_linear_index(to, index)]))
}

fn transpose(shape: &Shape, operand: &Literal, permutation: &[usize]) -> Literal {
    gather(shape, operand, |out| {
        let mut index: DimVec = SmallVec::from_elem(0, out.len());
        for (i, &p) in permutation.iter().enumerate() {
            index[p] = out[i];
        }
        index
    })
}

fn broadcast(shape: &Shape, operand: &Literal, dimensions: &[usize]) -> Literal {
    gather(shape, operand, |out| dimensions.iter().map(|&d| out[d]).collect())
}

fn slice(shape: &Shape, operand: &Literal, starts: &[usize], strides: &[usize]) -> Literal {
    gather(shape, operand, |out| out.iter().zip(starts.iter().zip(strides)).map(|(&o, (&s, &st))| s + o * st).collect())
}

fn reverse(shape: &Shape, operand: &Literal, dimensions: &[usize]) -> Literal {
    gather(shape, operand, |out| {
        out.iter()
            .enumerate()
            .map(|(d, &o)| if dimensions.contains(&d) { operand.dims()[d] - 1 - o } else { o })
            .collect()
    })
}

fn concatenate(shape: &Shape, operands: &[&Literal], dimension: usize) -> Literal {
    Literal::from_fn(shape.dtype(), shape.dims(), |out| {
        let mut index: DimVec = out.iter().copied().collect();
        for operand in operands {
            let extent = operand.dims()[dimension];
            if index[dimension] < extent {
                return operand.values()[shape_util::row_major_linear_index(operand.dims(), &index)];
            }
            index[dimension] -= extent;
        }
        ConstValue::zero(shape.dtype())
    })
}

fn pad(shape: &Shape, operand: &Literal, padding_value: &Literal, config: &PaddingConfig) -> Result<Literal> {
    let fill = padding_value.scalar_value().context(UnsupportedEvaluationSnafu { op: "pad" })?;
    let mut values = vec![fill; shape.element_count()];
    shape_util::for_each_index(operand.dims(), |index| {
        let target = index
            .iter()
            .zip(&config.dimensions)
            .zip(shape.dims())
            .map(|((&i, p), &size)| {
                let pos = p.low + (i * (p.interior + 1)) as i64;
                (pos >= 0 && (pos as usize) < size).then_some(pos as usize)
            })
            .collect::<Option<DimVec>>();
        if let Some(target) = target {
            values[shape_util::row_major_linear_index(shape.dims(), &target)] =
                operand.values()[shape_util::row_major_linear_index(operand.dims(), index)];
        }
    });
    Literal::from_values(shape.dtype(), shape.dims().iter().copied(), values)
}

// ============================================================================
// Contractions
// ============================================================================

fn dot(shape: &Shape, lhs: &Literal, rhs: &Literal) -> Result<Literal> {
    let dtype = lhs.dtype();
    let contracted = *lhs.dims().last().context(UnsupportedEvaluationSnafu { op: "dot" })?;
    let rows = if lhs.dims().len() == 2 { lhs.dims()[0] } else { 1 };
    let cols = if rhs.dims().len() == 2 { rhs.dims()[1] } else { 1 };
    let mut values = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = ConstValue::zero(dtype);
            for k in 0..contracted {
                let a = lhs.values()[r * contracted + k];
                let b = rhs.values()[k * cols + c];
                let product = binary_value(BinaryOp::Multiply, dtype, a, b)?;
                acc = binary_value(BinaryOp::Add, dtype, acc, product)?;
            }
            values.push(acc);
        }
    }
    Literal::from_values(shape.dtype(), shape.dims().iter().copied(), values)
}

fn convolution(
    shape: &Shape,
    input: &Literal,
    kernel: &Literal,
    window: &Window,
    dnums: &ConvolutionDimensionNumbers,
) -> Result<Literal> {
    let dtype = input.dtype();
    let input_features = input.dims()[dnums.feature_dimension];
    let kernel_spatial: DimVec = dnums.kernel_spatial_dimensions.iter().map(|&d| kernel.dims()[d]).collect();
    let spatial_dims: DimVec = dnums.spatial_dimensions.iter().map(|&d| input.dims()[d]).collect();

    let mut values = Vec::with_capacity(shape.element_count());
    let mut failure = None;
    shape_util::for_each_index(shape.dims(), |out| {
        let mut acc = ConstValue::zero(dtype);
        let out_spatial: DimVec = dnums.spatial_dimensions.iter().map(|&d| out[d]).collect();
        shape_util::for_each_index(&kernel_spatial, |k| {
            let Some(source) = windowed_source_index(window, &spatial_dims, &out_spatial, k) else { return };
            for c in 0..input_features {
                let mut in_index: DimVec = SmallVec::from_elem(0, input.dims().len());
                in_index[dnums.batch_dimension] = out[dnums.batch_dimension];
                in_index[dnums.feature_dimension] = c;
                let mut k_index: DimVec = SmallVec::from_elem(0, kernel.dims().len());
                k_index[dnums.kernel_input_feature_dimension] = c;
                k_index[dnums.kernel_output_feature_dimension] = out[dnums.feature_dimension];
                for (i, (&in_dim, &k_dim)) in
                    dnums.spatial_dimensions.iter().zip(&dnums.kernel_spatial_dimensions).enumerate()
                {
                    in_index[in_dim] = source[i];
                    k_index[k_dim] = k[i];
                }
                let a = input.values()[shape_util::row_major_linear_index(input.dims(), &in_index)];
                let b = kernel.values()[shape_util::row_major_linear_index(kernel.dims(), &k_index)];
                let step = binary_value(BinaryOp::Multiply, dtype, a, b)
                    .and_then(|p| binary_value(BinaryOp::Add, dtype, acc, p));
                match step {
                    Ok(next) => acc = next,
                    Err(e) => failure = Some(e),
                }
            }
        });
        values.push(acc);
    });
    if let Some(e) = failure {
        return Err(e);
    }
    Literal::from_values(shape.dtype(), shape.dims().iter().copied(), values)
}
