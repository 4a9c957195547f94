//! Dot strength reduction for small floating-point contractions.

use smallvec::smallvec;
use tracing::trace;

use tessel_ir::shape_inference as infer;
use tessel_ir::{BinaryOp, InstrId, Op, scalar_reducer};

use super::helpers::zero_like;
use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

/// Operands of a dot eligible for strength reduction: enabled, floating
/// point, and every shape of rank at most 2.
fn eligible(ctx: &RewriteContext<'_>, id: InstrId) -> Option<(InstrId, InstrId)> {
    if !ctx.config().enable_dot_strength_reduction || !ctx.shape(id).dtype().is_float() {
        return None;
    }
    let (lhs, rhs) = (ctx.operand(id, 0), ctx.operand(id, 1));
    [id, lhs, rhs].iter().all(|&i| ctx.shape(i).rank() <= 2).then_some((lhs, rhs))
}

/// A dot over zero elements is a broadcast zero.
pub fn dot_zero_elements(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Some((lhs, rhs)) = eligible(ctx, id) else {
        return Ok(NoMatch);
    };
    if ![id, lhs, rhs].iter().any(|&i| ctx.shape(i).has_zero_elements()) {
        return Ok(NoMatch);
    }
    let zero = zero_like(ctx, id);
    let zero = ctx.constant(zero)?;
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.broadcast(zero, shape, &[])?))
}

fn rank2_transpose_operand(ctx: &RewriteContext<'_>, id: InstrId) -> Option<InstrId> {
    match ctx.op(id) {
        Op::Transpose { permutation } if permutation.as_slice() == [1, 0] => Some(ctx.operand(id, 0)),
        _ => None,
    }
}

/// `dot(transpose(A), transpose(B)) → transpose(dot(B, A))`.
pub fn dot_of_transposes(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Some((lhs, rhs)) = eligible(ctx, id) else {
        return Ok(NoMatch);
    };
    let (Some(a), Some(b)) = (rank2_transpose_operand(ctx, lhs), rank2_transpose_operand(ctx, rhs)) else {
        return Ok(NoMatch);
    };
    let swapped_shape = infer::dot(ctx.shape(b), ctx.shape(a))?;
    let swapped = ctx.add(Op::Dot, swapped_shape, &[b, a])?;
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.transpose(swapped, &[1, 0], shape)?))
}

/// `dot(a[K], b[K]) → reduce(a * b, {0}, 0, add)`.
///
/// The add reducer is a fresh computation appended to the module.
pub fn vector_dot_to_reduce(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Some((lhs, rhs)) = eligible(ctx, id) else {
        return Ok(NoMatch);
    };
    if ctx.shape(lhs).rank() != 1 || ctx.shape(rhs).rank() != 1 {
        return Ok(NoMatch);
    }

    let dtype = ctx.shape(id).dtype();
    let reducer = ctx.add_embedded_computation(scalar_reducer("add_reducer", dtype, BinaryOp::Add)?);
    trace!(dot = %id, reducer = %reducer, "reducing vector dot");

    let product = ctx.binary(BinaryOp::Multiply, lhs, rhs)?;
    let zero = zero_like(ctx, id);
    let zero = ctx.constant(zero)?;
    let reduced_shape = infer::reduce(ctx.shape(product), ctx.shape(zero), &[0])?;
    let reduced = ctx.add(Op::Reduce { dimensions: smallvec![0], reducer }, reduced_shape, &[product, zero])?;
    if ctx.same_shape(ctx.shape(reduced), ctx.shape(id)) {
        return Ok(Rewritten(reduced));
    }
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.reshape(reduced, shape)?))
}
