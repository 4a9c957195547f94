//! Reshapes and transposes that only relabel memory become bitcasts.
//!
//! Applies in layout-sensitive mode only, and only when both the layout
//! analysis and the injected oracle agree.

use tessel_ir::shape_util::{reshape_is_bitcast, transpose_is_bitcast};
use tessel_ir::{InstrId, Op};

use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

fn to_bitcast(ctx: &mut RewriteContext<'_>, id: InstrId, physically_equal: bool) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    if !physically_equal || !ctx.valid_bitcast(ctx.shape(operand), ctx.shape(id)) {
        return Ok(NoMatch);
    }
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.bitcast(operand, shape)?))
}

pub fn reshape_to_bitcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !ctx.layout_sensitive() {
        return Ok(NoMatch);
    }
    let equal = reshape_is_bitcast(ctx.shape(ctx.operand(id, 0)), ctx.shape(id));
    to_bitcast(ctx, id, equal)
}

pub fn transpose_to_bitcast(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !ctx.layout_sensitive() {
        return Ok(NoMatch);
    }
    let Op::Transpose { permutation } = ctx.op(id) else {
        return Ok(NoMatch);
    };
    let equal = transpose_is_bitcast(ctx.shape(ctx.operand(id, 0)), ctx.shape(id), permutation);
    to_bitcast(ctx, id, equal)
}
