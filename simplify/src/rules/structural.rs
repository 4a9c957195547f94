//! No-op elimination and structural collapses.

use tessel_ir::shape_inference as infer;
use tessel_ir::shape_util::is_identity_permutation;
use tessel_ir::{InstrId, Op, PaddingConfig, PaddingDim};

use super::helpers::{replace_if_same_shape, scalar_broadcast_operand};
use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

// =========================================================================
// Copy, convert, reverse
// =========================================================================

/// `copy(copy(A)) → copy(A)` with the outer shape. Only meaningful when layouts matter.
pub fn copy_of_copy(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !ctx.layout_sensitive() {
        return Ok(NoMatch);
    }
    let operand = ctx.operand(id, 0);
    if !matches!(ctx.op(operand), Op::Copy) {
        return Ok(NoMatch);
    }
    let source = ctx.operand(operand, 0);
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.add(Op::Copy, shape, &[source])?))
}

pub fn copy_noop(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    Ok(replace_if_same_shape(ctx, id, ctx.operand(id, 0)))
}

pub fn convert_noop(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    if ctx.shape(operand).dtype() != ctx.shape(id).dtype() {
        return Ok(NoMatch);
    }
    Ok(replace_if_same_shape(ctx, id, operand))
}

/// Reversing only dimensions of size 0 or 1 changes nothing.
pub fn reverse_degenerate(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Reverse { dimensions } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operand = ctx.operand(id, 0);
    let shape = ctx.shape(operand);
    if dimensions.iter().any(|&d| shape.dim(d) > 1) {
        return Ok(NoMatch);
    }
    Ok(replace_if_same_shape(ctx, id, operand))
}

pub fn get_tuple_element_of_tuple(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::GetTupleElement { index } = *ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operand = ctx.operand(id, 0);
    if !matches!(ctx.op(operand), Op::Tuple) {
        return Ok(NoMatch);
    }
    Ok(replace_if_same_shape(ctx, id, ctx.operand(operand, index)))
}

// =========================================================================
// Identity shape transforms
// =========================================================================

pub fn reshape_noop(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    Ok(replace_if_same_shape(ctx, id, ctx.operand(id, 0)))
}

pub fn slice_noop(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    Ok(replace_if_same_shape(ctx, id, ctx.operand(id, 0)))
}

pub fn transpose_identity(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    match ctx.op(id) {
        Op::Transpose { permutation } if is_identity_permutation(permutation) => {
            Ok(replace_if_same_shape(ctx, id, ctx.operand(id, 0)))
        }
        _ => Ok(NoMatch),
    }
}

// =========================================================================
// Concatenate
// =========================================================================

pub fn concatenate_single(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let instr = ctx.instr(id);
    if instr.operand_count() != 1 {
        return Ok(NoMatch);
    }
    Ok(replace_if_same_shape(ctx, id, instr.operand(0)))
}

/// Drop zero-element operands.
///
/// With none left the concatenate collapses to its first operand, with one
/// left it becomes that operand; otherwise a narrower concatenate replaces it.
pub fn concatenate_drop_empty(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operands = ctx.instr(id).operands().to_vec();
    let nonempty: Vec<InstrId> = operands.iter().copied().filter(|&o| !ctx.shape(o).has_zero_elements()).collect();
    if nonempty.len() == operands.len() {
        return Ok(NoMatch);
    }

    match nonempty.as_slice() {
        [] => Ok(replace_if_same_shape(ctx, id, operands[0])),
        [only] => Ok(replace_if_same_shape(ctx, id, *only)),
        _ => {
            let op = ctx.op(id).clone();
            let shape = ctx.shape(id).clone();
            Ok(Rewritten(ctx.add(op, shape, &nonempty)?))
        }
    }
}

/// `concat(broadcast(s), X) → pad(X, s)` and the mirrored form, padding by the
/// broadcast's extent along the concatenation dimension.
pub fn concatenate_broadcast_to_pad(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let Op::Concatenate { dimension } = *ctx.op(id) else {
        return Ok(NoMatch);
    };
    let operands = ctx.instr(id).operands().to_vec();
    let [first, second] = operands[..] else {
        return Ok(NoMatch);
    };

    for (side, broadcast, other) in [(0, first, second), (1, second, first)] {
        let Some(scalar) = scalar_broadcast_operand(ctx, broadcast) else {
            continue;
        };
        let extent = ctx.shape(broadcast).dim(dimension) as i64;
        let rank = ctx.shape(id).rank();
        let config = PaddingConfig::new((0..rank).map(|d| match (d == dimension, side) {
            (true, 0) => PaddingDim::edge(extent, 0),
            (true, _) => PaddingDim::edge(0, extent),
            (false, _) => PaddingDim::default(),
        }));
        infer::pad(ctx.shape(other), ctx.shape(scalar), &config)?;
        let shape = ctx.shape(id).clone();
        return Ok(Rewritten(ctx.add(Op::Pad { config }, shape, &[other, scalar])?));
    }
    Ok(NoMatch)
}
