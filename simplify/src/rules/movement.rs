//! Fusion of reshape, transpose, broadcast and slice chains.
//!
//! Data movement between two shape transforms is collapsed into one
//! transform where the index mapping allows it. Broadcasts of scalars absorb
//! any transform applied after them.

use smallvec::SmallVec;
use tracing::trace;

use tessel_ir::shape_util::{
    compose_permutations, dimensions_unmodified_by_reshape, inserted_or_deleted_1_sized_dimensions, inverse_permutation,
};
use tessel_ir::{InstrId, Op, Shape};

use super::helpers::scalar_broadcast_operand;
use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

/// `T(broadcast(s)) → broadcast(s)` with the shape of `T`.
fn rebroadcast_scalar(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Some(scalar) = scalar_broadcast_operand(ctx, ctx.operand(id, 0)) else {
        return Ok(NoMatch);
    };
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.broadcast(scalar, shape, &[])?))
}

// =========================================================================
// Reshape
// =========================================================================

/// `reshape(reshape(X)) → reshape(X)`.
pub fn reshape_of_reshape(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    if !matches!(ctx.op(operand), Op::Reshape) {
        return Ok(NoMatch);
    }
    let source = ctx.operand(operand, 0);
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.reshape(source, shape)?))
}

pub fn reshape_of_scalar_broadcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    rebroadcast_scalar(ctx, id)
}

/// `reshape(broadcast(X)) → broadcast(X)` when the reshape leaves every
/// broadcast target dimension intact.
pub fn reshape_of_broadcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    let Op::Broadcast { dimensions } = ctx.op(operand) else {
        return Ok(NoMatch);
    };
    let unmodified = dimensions_unmodified_by_reshape(ctx.shape(operand).dims(), ctx.shape(id).dims());
    let mapped: Option<SmallVec<[usize; 4]>> = dimensions
        .iter()
        .map(|&dim| unmodified.iter().find(|(input, _)| *input == dim).map(|&(_, output)| output))
        .collect();
    let Some(mapped) = mapped else {
        return Ok(NoMatch);
    };

    let source = ctx.operand(operand, 0);
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.broadcast(source, shape, &mapped)?))
}

/// Move a reshape that only inserts or deletes degenerate dimensions below
/// its effectively unary element-wise users.
///
/// `f(reshape(X), s...)` becomes `reshape(f(X, s...))` for every user `f` that
/// is element-wise (other than copy) and whose remaining operands are scalars.
/// Users are rewired here, so the result is [`Rewired`] rather than a replacement.
pub fn sink_reshape(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if ctx.layout_sensitive() {
        return Ok(NoMatch);
    }
    let source = ctx.operand(id, 0);
    if inserted_or_deleted_1_sized_dimensions(ctx.shape(source).dims(), ctx.shape(id).dims()).is_none() {
        return Ok(NoMatch);
    }

    let mut rewired = false;
    for user in ctx.instr(id).users().to_vec() {
        let Some(instr) = ctx.computation().get(user) else {
            continue;
        };
        let op = instr.op();
        if !op.is_elementwise() || matches!(op, Op::Copy) {
            continue;
        }
        if !instr.operands().iter().all(|&o| o == id || ctx.shape(o).is_scalar()) {
            continue;
        }

        let operands: Vec<InstrId> = instr.operands().iter().map(|&o| if o == id { source } else { o }).collect();
        let op = op.clone();
        let user_shape = ctx.shape(user).clone();
        let sunk_shape = Shape::array(user_shape.dtype(), ctx.shape(source).dims().iter().copied());

        trace!(reshape = %id, user = %user, "sinking reshape below user");
        let sunk = ctx.add(op, sunk_shape, &operands)?;
        let reshaped = ctx.reshape(sunk, user_shape)?;
        ctx.replace(user, reshaped)?;
        rewired = true;
    }
    Ok(if rewired { Rewired } else { NoMatch })
}

// =========================================================================
// Transpose and slice
// =========================================================================

/// `transpose(transpose(X, p1), p2) → transpose(X, p1 ∘ p2)`.
pub fn transpose_of_transpose(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    let (Op::Transpose { permutation: outer }, Op::Transpose { permutation: inner }) = (ctx.op(id), ctx.op(operand))
    else {
        return Ok(NoMatch);
    };
    let permutation = compose_permutations(inner, outer);
    let source = ctx.operand(operand, 0);
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.transpose(source, &permutation, shape)?))
}

pub fn transpose_of_scalar_broadcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    rebroadcast_scalar(ctx, id)
}

pub fn slice_of_scalar_broadcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    rebroadcast_scalar(ctx, id)
}

// =========================================================================
// Broadcast
// =========================================================================

/// A broadcast that adds no elements and keeps dimension order is a reshape.
pub fn broadcast_to_reshape(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Broadcast { dimensions } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operand = ctx.operand(id, 0);
    if !dimensions.is_sorted() || ctx.shape(id).element_count() != ctx.shape(operand).element_count() {
        return Ok(NoMatch);
    }
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.reshape(operand, shape)?))
}

/// A broadcast that adds no elements and no dimensions is a transpose.
pub fn broadcast_to_transpose(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Broadcast { dimensions } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operand = ctx.operand(id, 0);
    let (shape, operand_shape) = (ctx.shape(id), ctx.shape(operand));
    if shape.rank() != operand_shape.rank() || shape.element_count() != operand_shape.element_count() {
        return Ok(NoMatch);
    }
    let permutation = inverse_permutation(dimensions);
    let shape = shape.clone();
    Ok(Rewritten(ctx.transpose(operand, &permutation, shape)?))
}

/// `broadcast(reshape(X))` where the reshape only inserts degenerate
/// dimensions broadcasts `X` directly.
pub fn broadcast_of_reshape(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Broadcast { dimensions } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operand = ctx.operand(id, 0);
    if !matches!(ctx.op(operand), Op::Reshape) {
        return Ok(NoMatch);
    }
    let source = ctx.operand(operand, 0);
    let Some((deleted, inserted)) =
        inserted_or_deleted_1_sized_dimensions(ctx.shape(source).dims(), ctx.shape(operand).dims())
    else {
        return Ok(NoMatch);
    };
    if !deleted.is_empty() {
        return Ok(NoMatch);
    }

    let remaining: SmallVec<[usize; 4]> =
        dimensions.iter().enumerate().filter(|(i, _)| !inserted.contains(i)).map(|(_, &d)| d).collect();
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.broadcast(source, shape, &remaining)?))
}
