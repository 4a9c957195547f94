//! Result shapes of operations given their operand shapes.
//!
//! Inferred shapes carry no layout; callers that need one attach it
//! explicitly.

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use tessel_dtype::DType;

use crate::error::*;
use crate::shape::{Dims, Shape};
use crate::shape_util::{is_permutation, permute_dims};
use crate::types::{BinaryOp, UnaryOp};
use crate::window::{ConvolutionDimensionNumbers, PaddingConfig, Window, WindowDimension};

fn ensure_array(shape: &Shape) -> Result<()> {
    ensure!(shape.is_array(), TupleElementTypeSnafu);
    Ok(())
}

/// Dimensions shared by element-wise operands: scalars broadcast implicitly.
fn elementwise_dims(lhs: &Shape, rhs: &Shape) -> Result<Dims> {
    if lhs.is_scalar() {
        return Ok(rhs.dims().iter().copied().collect());
    }
    if rhs.is_scalar() || lhs.same_dims(rhs) {
        return Ok(lhs.dims().iter().copied().collect());
    }
    ElementwiseShapeMismatchSnafu { lhs: Box::new(lhs.clone()), rhs: Box::new(rhs.clone()) }.fail()
}

pub fn unary(_op: UnaryOp, operand: &Shape) -> Result<Shape> {
    ensure_array(operand)?;
    Ok(operand.without_layout())
}

pub fn binary(op: BinaryOp, lhs: &Shape, rhs: &Shape) -> Result<Shape> {
    ensure_array(lhs)?;
    ensure_array(rhs)?;
    ensure!(lhs.dtype() == rhs.dtype(), DTypeMismatchSnafu { lhs: lhs.dtype(), rhs: rhs.dtype() });
    let dims = elementwise_dims(lhs, rhs)?;
    let dtype = if op.is_comparison() { DType::Bool } else { lhs.dtype() };
    Ok(Shape::array(dtype, dims))
}

/// `clamp(lo, operand, hi)`; bounds may be scalars.
pub fn clamp(lo: &Shape, operand: &Shape, hi: &Shape) -> Result<Shape> {
    let with_lo = binary(BinaryOp::Maximum, operand, lo)?;
    binary(BinaryOp::Minimum, &with_lo, hi)
}

pub fn select(pred: &Shape, on_true: &Shape, on_false: &Shape) -> Result<Shape> {
    ensure!(pred.dtype() == DType::Bool, DTypeMismatchSnafu { lhs: pred.dtype(), rhs: DType::Bool });
    let branches = binary(BinaryOp::Add, on_true, on_false)?;
    let dims = elementwise_dims(&branches, &pred.with_dtype(branches.dtype()))?;
    Ok(Shape::array(branches.dtype(), dims))
}

pub fn convert(operand: &Shape, dtype: DType) -> Result<Shape> {
    ensure_array(operand)?;
    ensure!(dtype.is_array_element(), TupleElementTypeSnafu);
    Ok(operand.without_layout().with_dtype(dtype))
}

pub fn reshape(operand: &Shape, dims: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    let output_size = dims.iter().product::<usize>();
    ensure!(
        operand.element_count() == output_size,
        ReshapeSizeMismatchSnafu { input_size: operand.element_count(), output_size }
    );
    Ok(Shape::array(operand.dtype(), dims.iter().copied()))
}

pub fn transpose(operand: &Shape, permutation: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    ensure!(
        is_permutation(permutation, operand.rank()),
        InvalidPermutationSnafu { permutation: permutation.to_vec(), expected_dims: operand.rank() }
    );
    Ok(Shape::array(operand.dtype(), permute_dims(operand.dims(), permutation)))
}

/// Broadcast `operand` into `target` dimensions; operand dimension `i` becomes result dimension `dimensions[i]`.
pub fn broadcast(operand: &Shape, target: &[usize], dimensions: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    let result = Shape::array(operand.dtype(), target.iter().copied());
    let invalid = || InvalidBroadcastSnafu {
        operand: Box::new(operand.clone()),
        target: Box::new(result.clone()),
        dimensions: dimensions.to_vec(),
    };
    ensure!(dimensions.len() == operand.rank(), invalid());
    let mut seen: SmallVec<[bool; 8]> = SmallVec::from_elem(false, target.len());
    for (i, &d) in dimensions.iter().enumerate() {
        ensure!(d < target.len() && !seen[d] && target[d] == operand.dim(i), invalid());
        seen[d] = true;
    }
    Ok(result)
}

pub fn slice(operand: &Shape, starts: &[usize], limits: &[usize], strides: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    let rank = operand.rank();
    ensure!(
        starts.len() == rank && limits.len() == rank && strides.len() == rank,
        DimensionOutOfRangeSnafu { dim: starts.len().max(limits.len()).max(strides.len()), rank }
    );
    let mut dims = Dims::new();
    for dim in 0..rank {
        let (start, limit, stride) = (starts[dim], limits[dim], strides[dim]);
        ensure!(
            stride > 0 && start <= limit && limit <= operand.dim(dim),
            SliceBoundsSnafu { dim, start, limit, stride, size: operand.dim(dim) }
        );
        dims.push((limit - start).div_ceil(stride));
    }
    Ok(Shape::array(operand.dtype(), dims))
}

pub fn concatenate(operands: &[&Shape], dimension: usize) -> Result<Shape> {
    let first = *operands.first().context(OperandCountSnafu { op: "concatenate", expected: 1usize, actual: 0usize })?;
    ensure_array(first)?;
    ensure!(dimension < first.rank(), DimensionOutOfRangeSnafu { dim: dimension, rank: first.rank() });
    let mut dims: Dims = first.dims().iter().copied().collect();
    for &shape in &operands[1..] {
        let mismatch = || ConcatenateMismatchSnafu {
            lhs: Box::new(first.clone()),
            rhs: Box::new(shape.clone()),
            dimension,
        };
        ensure!(shape.is_array() && shape.dtype() == first.dtype() && shape.rank() == first.rank(), mismatch());
        for d in 0..first.rank() {
            ensure!(d == dimension || shape.dim(d) == first.dim(d), mismatch());
        }
        dims[dimension] += shape.dim(dimension);
    }
    Ok(Shape::array(first.dtype(), dims))
}

pub fn pad(operand: &Shape, padding_value: &Shape, config: &PaddingConfig) -> Result<Shape> {
    ensure_array(operand)?;
    ensure!(padding_value.is_scalar(), ElementwiseShapeMismatchSnafu {
        lhs: Box::new(operand.clone()),
        rhs: Box::new(padding_value.clone())
    });
    ensure!(
        padding_value.dtype() == operand.dtype(),
        DTypeMismatchSnafu { lhs: operand.dtype(), rhs: padding_value.dtype() }
    );
    ensure!(
        config.rank() == operand.rank(),
        PadDimensionMismatchSnafu { padding_dims: config.rank(), shape_dims: operand.rank() }
    );
    let dims = operand
        .dims()
        .iter()
        .zip(&config.dimensions)
        .enumerate()
        .map(|(dim, (&size, padding))| padding.padded_size(size).context(PadNegativeSizeSnafu { dim }))
        .collect::<Result<Dims>>()?;
    Ok(Shape::array(operand.dtype(), dims))
}

pub fn reverse(operand: &Shape, dimensions: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    for &dim in dimensions {
        ensure!(dim < operand.rank(), DimensionOutOfRangeSnafu { dim, rank: operand.rank() });
    }
    Ok(operand.without_layout())
}

pub fn tuple(elements: &[&Shape]) -> Shape {
    Shape::tuple(elements.iter().map(|s| (*s).clone()))
}

pub fn get_tuple_element(operand: &Shape, index: usize) -> Result<Shape> {
    ensure!(operand.is_tuple(), NotATupleSnafu { shape: Box::new(operand.clone()) });
    operand
        .tuple_element(index)
        .cloned()
        .context(TupleIndexOutOfRangeSnafu { index, size: operand.tuple_shapes().len() })
}

/// Contract the last lhs dimension with the first rhs dimension; ranks 1 and 2 only.
pub fn dot(lhs: &Shape, rhs: &Shape) -> Result<Shape> {
    ensure_array(lhs)?;
    ensure_array(rhs)?;
    ensure!(lhs.dtype() == rhs.dtype(), DTypeMismatchSnafu { lhs: lhs.dtype(), rhs: rhs.dtype() });
    let mismatch = || DotShapeMismatchSnafu { lhs: Box::new(lhs.clone()), rhs: Box::new(rhs.clone()) };
    ensure!((1..=2).contains(&lhs.rank()) && (1..=2).contains(&rhs.rank()), mismatch());
    ensure!(lhs.dim(lhs.rank() - 1) == rhs.dim(0), mismatch());
    let mut dims = Dims::new();
    dims.extend(lhs.dims()[..lhs.rank() - 1].iter().copied());
    dims.extend(rhs.dims()[1..].iter().copied());
    Ok(Shape::array(lhs.dtype(), dims))
}

/// Number of window positions along one dimension, `None` if the window does not fit.
pub fn windowed_output_size(size: usize, window: &WindowDimension) -> Option<usize> {
    let dilated_base = if size == 0 { 0 } else { (size - 1) * window.base_dilation + 1 };
    let padded = dilated_base as i64 + window.padding_low + window.padding_high;
    let extent = window.dilated_size() as i64;
    if window.stride == 0 || padded < extent {
        return None;
    }
    Some(((padded - extent) as usize) / window.stride + 1)
}

pub fn reduce(operand: &Shape, init: &Shape, dimensions: &[usize]) -> Result<Shape> {
    ensure_array(operand)?;
    ensure!(init.is_scalar(), ElementwiseShapeMismatchSnafu {
        lhs: Box::new(operand.clone()),
        rhs: Box::new(init.clone())
    });
    for &dim in dimensions {
        ensure!(dim < operand.rank(), DimensionOutOfRangeSnafu { dim, rank: operand.rank() });
    }
    let dims: Dims =
        operand.dims().iter().enumerate().filter(|(i, _)| !dimensions.contains(i)).map(|(_, &d)| d).collect();
    Ok(Shape::array(init.dtype(), dims))
}

pub fn reduce_window(operand: &Shape, init: &Shape, window: &Window) -> Result<Shape> {
    ensure_array(operand)?;
    ensure!(init.is_scalar(), ElementwiseShapeMismatchSnafu {
        lhs: Box::new(operand.clone()),
        rhs: Box::new(init.clone())
    });
    ensure!(window.rank() == operand.rank(), WindowRankMismatchSnafu { window_rank: window.rank(), rank: operand.rank() });
    let dims = operand
        .dims()
        .iter()
        .zip(&window.dimensions)
        .enumerate()
        .map(|(dim, (&size, wd))| windowed_output_size(size, wd).context(WindowTooLargeSnafu { dim }))
        .collect::<Result<Dims>>()?;
    Ok(Shape::array(init.dtype(), dims))
}

/// Output shape of a convolution; the output uses the input's batch/feature/spatial numbering.
pub fn convolution(
    input: &Shape,
    kernel: &Shape,
    window: &Window,
    dnums: &ConvolutionDimensionNumbers,
) -> Result<Shape> {
    ensure_array(input)?;
    ensure_array(kernel)?;
    ensure!(input.dtype() == kernel.dtype(), DTypeMismatchSnafu { lhs: input.dtype(), rhs: kernel.dtype() });
    let spatial = dnums.spatial_dimensions.len();
    ensure!(window.rank() == spatial, WindowRankMismatchSnafu { window_rank: window.rank(), rank: spatial });
    ensure!(input.rank() == spatial + 2 && kernel.rank() == spatial + 2, DimensionOutOfRangeSnafu {
        dim: spatial + 2,
        rank: input.rank()
    });
    ensure!(
        input.dim(dnums.feature_dimension) == kernel.dim(dnums.kernel_input_feature_dimension),
        DotShapeMismatchSnafu { lhs: Box::new(input.clone()), rhs: Box::new(kernel.clone()) }
    );

    let mut dims: Dims = SmallVec::from_elem(0, input.rank());
    dims[dnums.batch_dimension] = input.dim(dnums.batch_dimension);
    dims[dnums.feature_dimension] = kernel.dim(dnums.kernel_output_feature_dimension);
    for (i, (&in_dim, &k_dim)) in dnums.spatial_dimensions.iter().zip(&dnums.kernel_spatial_dimensions).enumerate() {
        let wd = &window.dimensions[i];
        ensure!(wd.size == kernel.dim(k_dim), WindowTooLargeSnafu { dim: in_dim });
        dims[in_dim] = windowed_output_size(input.dim(in_dim), wd).context(WindowTooLargeSnafu { dim: in_dim })?;
    }
    Ok(Shape::array(input.dtype(), dims))
}
