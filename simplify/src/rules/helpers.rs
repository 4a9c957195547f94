//! Matchers shared by several rules.

use tessel_ir::{BinaryOp, ConstValue, InstrId, Literal, Op, UnaryOp};

use crate::catalog::RewriteResult;
use crate::context::RewriteContext;

/// Whether `id` is a constant whose every element equals `value`, possibly broadcast.
pub fn is_all(ctx: &RewriteContext<'_>, id: InstrId, value: i64) -> bool {
    match ctx.op(id) {
        Op::Constant(literal) => literal.is_all_int(value),
        Op::Broadcast { .. } => is_all(ctx, ctx.operand(id, 0), value),
        _ => false,
    }
}

/// Whether `id` is a scalar constant or a broadcast of one.
pub fn is_scalar_constant_or_broadcast(ctx: &RewriteContext<'_>, id: InstrId) -> bool {
    let is_scalar_constant = |id: InstrId| ctx.op(id).literal().is_some() && ctx.shape(id).is_scalar();
    match ctx.op(id) {
        Op::Constant(_) => is_scalar_constant(id),
        Op::Broadcast { .. } => is_scalar_constant(ctx.operand(id, 0)),
        _ => false,
    }
}

/// Value of a scalar constant, looking through a broadcast.
pub fn scalar_constant_value(ctx: &RewriteContext<'_>, id: InstrId) -> Option<ConstValue> {
    match ctx.op(id) {
        Op::Constant(literal) => literal.scalar_value(),
        Op::Broadcast { .. } => scalar_constant_value(ctx, ctx.operand(id, 0)),
        _ => None,
    }
}

/// Operand of a broadcast whose operand is a scalar.
pub fn scalar_broadcast_operand(ctx: &RewriteContext<'_>, id: InstrId) -> Option<InstrId> {
    match ctx.op(id) {
        Op::Broadcast { .. } if ctx.shape(ctx.operand(id, 0)).is_scalar() => Some(ctx.operand(id, 0)),
        _ => None,
    }
}

/// Operands of `id` if it is the given binary operation.
pub fn as_binary(ctx: &RewriteContext<'_>, id: InstrId, op: BinaryOp) -> Option<(InstrId, InstrId)> {
    match ctx.op(id) {
        Op::Binary(actual) if *actual == op => Some((ctx.operand(id, 0), ctx.operand(id, 1))),
        _ => None,
    }
}

/// Operand of `id` if it is the given unary operation.
pub fn as_unary(ctx: &RewriteContext<'_>, id: InstrId, op: UnaryOp) -> Option<InstrId> {
    match ctx.op(id) {
        Op::Unary(actual) if *actual == op => Some(ctx.operand(id, 0)),
        _ => None,
    }
}

/// `Rewritten(candidate)` when it can stand in for `id` unchanged.
pub fn replace_if_same_shape(ctx: &RewriteContext<'_>, id: InstrId, candidate: InstrId) -> RewriteResult {
    if ctx.same_shape(ctx.shape(id), ctx.shape(candidate)) {
        RewriteResult::Rewritten(candidate)
    } else {
        RewriteResult::NoMatch
    }
}

/// Scalar `1` of the element type of `id`.
pub fn one_like(ctx: &RewriteContext<'_>, id: InstrId) -> Literal {
    Literal::one(ctx.shape(id).dtype())
}

/// Scalar `0` of the element type of `id`.
pub fn zero_like(ctx: &RewriteContext<'_>, id: InstrId) -> Literal {
    Literal::zero(ctx.shape(id).dtype())
}
