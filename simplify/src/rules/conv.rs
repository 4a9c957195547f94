//! Convolutions that are matrix multiplies in disguise.
//!
//! A convolution with a 1x1 kernel, no stride, no padding and no base
//! dilation multiplies each input position's feature vector by the same
//! `[Cin, Cout]` matrix. When the layouts already store the input as row-major
//! `[W, Cin]`, the kernel as row-major `[Cin, Cout]` and the output as
//! row-major `[W, Cout]`, the convolution is
//!
//! ```text
//! bitcast(dot(bitcast(input -> [W, Cin]), bitcast(kernel -> [Cin, Cout])) -> output)
//! ```
//!
//! where `W` is the product of the input's non-feature dimensions.

use tracing::trace;

use tessel_ir::{InstrId, Op, Shape};

use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

pub fn convolution_to_dot(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !ctx.layout_sensitive() || !ctx.config().enable_conv_to_dot {
        return Ok(NoMatch);
    }
    let Op::Convolution { window, dimension_numbers: dnums } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let (input, kernel) = (ctx.operand(id, 0), ctx.operand(id, 1));
    let (input_shape, kernel_shape, output_shape) = (ctx.shape(input), ctx.shape(kernel), ctx.shape(id));

    if dnums.kernel_spatial_dimensions.iter().any(|&d| kernel_shape.dim(d) != 1) {
        return Ok(NoMatch);
    }
    // Window dilation is irrelevant for a window of one element.
    if window.has_stride() || window.has_padding() || window.has_base_dilation() {
        return Ok(NoMatch);
    }

    let input_layout = input_shape.effective_layout();
    if input_layout != output_shape.effective_layout() || input_layout.minor(0) != dnums.feature_dimension {
        return Ok(NoMatch);
    }
    let kernel_layout = kernel_shape.effective_layout();
    let (Some(in_position), Some(out_position)) = (
        kernel_layout.position_of(dnums.kernel_input_feature_dimension),
        kernel_layout.position_of(dnums.kernel_output_feature_dimension),
    ) else {
        return Ok(NoMatch);
    };
    if in_position < out_position {
        return Ok(NoMatch);
    }

    let input_channels = input_shape.dim(dnums.feature_dimension);
    let output_channels = kernel_shape.dim(dnums.kernel_output_feature_dimension);
    let width: usize =
        (0..input_shape.rank()).filter(|&d| d != dnums.feature_dimension).map(|d| input_shape.dim(d)).product();

    let lhs_shape = Shape::row_major(input_shape.dtype(), [width, input_channels]);
    let rhs_shape = Shape::row_major(kernel_shape.dtype(), [input_channels, output_channels]);
    let dot_shape = Shape::row_major(output_shape.dtype(), [width, output_channels]);
    if !ctx.valid_bitcast(input_shape, &lhs_shape)
        || !ctx.valid_bitcast(kernel_shape, &rhs_shape)
        || !ctx.valid_bitcast(&dot_shape, output_shape)
    {
        return Ok(NoMatch);
    }

    trace!(convolution = %id, width, input_channels, output_channels, "convolution is a matrix multiply");
    let output_shape = output_shape.clone();
    let lhs = ctx.bitcast(input, lhs_shape)?;
    let rhs = ctx.bitcast(kernel, rhs_shape)?;
    let dot = ctx.add(Op::Dot, dot_shape, &[lhs, rhs])?;
    Ok(Rewritten(ctx.bitcast(dot, output_shape)?))
}
