//! Pad handling: no-op removal, negative padding and folding into reduce-window.

use itertools::Itertools;
use smallvec::SmallVec;
use tracing::trace;

use tessel_ir::shape_inference as infer;
use tessel_ir::{InstrId, Op, PaddingDim, Window};

use super::helpers::replace_if_same_shape;
use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

pub fn pad_noop(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    match ctx.op(id) {
        Op::Pad { config } if config.is_noop() => Ok(replace_if_same_shape(ctx, id, ctx.operand(id, 0))),
        _ => Ok(NoMatch),
    }
}

/// Split a pad with negative edges into a non-negative pad and a slice.
///
/// The new pad clamps every negative edge to zero and keeps the original
/// layout; the slice then trims `-low` elements from the front and `-high`
/// from the back of each such dimension.
pub fn negative_pad_to_slice(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Pad { config } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    if !config.has_negative_edge() {
        return Ok(NoMatch);
    }
    let original = config.clone();
    let mut clamped = original.clone();
    for dim in &mut clamped.dimensions {
        dim.low = dim.low.max(0);
        dim.high = dim.high.max(0);
    }

    let (operand, padding_value) = (ctx.operand(id, 0), ctx.operand(id, 1));
    let mut padded_shape = infer::pad(ctx.shape(operand), ctx.shape(padding_value), &clamped)?;
    if let Some(layout) = ctx.shape(id).layout() {
        padded_shape = padded_shape.relayout(layout.minor_to_major().iter().copied())?;
    }

    let starts: SmallVec<[usize; 4]> = original.dimensions.iter().map(|d| (-d.low).max(0) as usize).collect();
    let limits: SmallVec<[usize; 4]> = original
        .dimensions
        .iter()
        .zip_eq(padded_shape.dims())
        .map(|(d, &size)| (size as i64 + d.high.min(0)) as usize)
        .collect();
    let strides: SmallVec<[usize; 4]> = SmallVec::from_elem(1, starts.len());
    infer::slice(&padded_shape, &starts, &limits, &strides)?;

    trace!(pad = %id, starts = ?starts, limits = ?limits, "splitting negative padding");
    let padded = ctx.add(Op::Pad { config: clamped }, padded_shape, &[operand, padding_value])?;
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.add(Op::Slice { starts, limits, strides }, shape, &[padded])?))
}

/// `reduce_window(pad(X, v), init)` with `v` equal to `init` folds the edge
/// padding into the window.
///
/// Declines on interior padding, negative edges, and base dilation along a
/// padded dimension.
pub fn fold_pad_into_reduce_window(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::ReduceWindow { window, reducer } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let (operand, init) = (ctx.operand(id, 0), ctx.operand(id, 1));
    let Op::Pad { config } = ctx.op(operand) else {
        return Ok(NoMatch);
    };
    if config.has_interior() || config.has_negative_edge() || config.rank() != window.rank() {
        return Ok(NoMatch);
    }

    let padding_value = ctx.operand(operand, 1);
    if padding_value != init {
        let (Some(pad_literal), Some(init_literal)) = (ctx.literal(padding_value), ctx.literal(init)) else {
            return Ok(NoMatch);
        };
        if pad_literal != init_literal {
            return Ok(NoMatch);
        }
    }

    let padded = |d: &PaddingDim| d.low != 0 || d.high != 0;
    if config.dimensions.iter().zip_eq(&window.dimensions).any(|(p, w)| padded(p) && w.base_dilation != 1) {
        return Ok(NoMatch);
    }

    let folded = Window::new(config.dimensions.iter().zip_eq(&window.dimensions).map(|(p, w)| {
        let mut w = w.clone();
        w.padding_low += p.low;
        w.padding_high += p.high;
        w
    }));
    let reducer = *reducer;
    let source = ctx.operand(operand, 0);
    infer::reduce_window(ctx.shape(source), ctx.shape(init), &folded)?;

    trace!(reduce_window = %id, pad = %operand, "folding pad into reduce-window");
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.add(Op::ReduceWindow { window: folded, reducer }, shape, &[source, init])?))
}
