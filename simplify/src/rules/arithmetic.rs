//! Algebraic identities over element-wise arithmetic.
//!
//! "0" and "1" stand for constants whose every element has that value,
//! possibly broadcast. Replacements built here take the shape of the
//! instruction they replace; intermediate values use inferred shapes.

use std::cmp::Ordering;

use tracing::trace;

use tessel_ir::shape_inference as infer;
use tessel_ir::{BinaryOp, InstrId, Op, UnaryOp};

use super::helpers::{
    as_binary, as_unary, is_all, is_scalar_constant_or_broadcast, one_like, replace_if_same_shape, scalar_constant_value,
};
use crate::catalog::RewriteResult::{self, *};
use crate::context::RewriteContext;
use crate::error::Result;

fn operands(ctx: &RewriteContext<'_>, id: InstrId) -> (InstrId, InstrId) {
    (ctx.operand(id, 0), ctx.operand(id, 1))
}

/// Division identities hold for real division, not for integer truncation.
fn is_float(ctx: &RewriteContext<'_>, id: InstrId) -> bool {
    ctx.shape(id).dtype().is_float()
}

/// New binary instruction carrying the shape of `original`.
fn binary_like(
    ctx: &mut RewriteContext<'_>,
    original: InstrId,
    op: BinaryOp,
    lhs: InstrId,
    rhs: InstrId,
) -> Result<InstrId> {
    let shape = ctx.shape(original).clone();
    ctx.add(Op::Binary(op), shape, &[lhs, rhs])
}

/// New unary instruction carrying the shape of `original`.
fn unary_like(ctx: &mut RewriteContext<'_>, original: InstrId, op: UnaryOp, operand: InstrId) -> Result<InstrId> {
    let shape = ctx.shape(original).clone();
    ctx.add(Op::Unary(op), shape, &[operand])
}

// =========================================================================
// Add, subtract, multiply
// =========================================================================

/// `A + 0 → A`, `0 + A → A`.
pub fn add_zero(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    if is_all(ctx, rhs, 0) && ctx.same_shape(ctx.shape(id), ctx.shape(lhs)) {
        return Ok(Rewritten(lhs));
    }
    if is_all(ctx, lhs, 0) {
        return Ok(replace_if_same_shape(ctx, id, rhs));
    }
    Ok(NoMatch)
}

/// `A - 0 → A`.
pub fn subtract_zero(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    if is_all(ctx, rhs, 0) {
        return Ok(replace_if_same_shape(ctx, id, lhs));
    }
    Ok(NoMatch)
}

/// `A * 1 → A`, `1 * A → A`.
pub fn multiply_one(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    if is_all(ctx, rhs, 1) && ctx.same_shape(ctx.shape(id), ctx.shape(lhs)) {
        return Ok(Rewritten(lhs));
    }
    if is_all(ctx, lhs, 1) {
        return Ok(replace_if_same_shape(ctx, id, rhs));
    }
    Ok(NoMatch)
}

/// `exp(A) * exp(B) → exp(A + B)`.
pub fn exp_times_exp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    let (Some(a), Some(b)) = (as_unary(ctx, lhs, UnaryOp::Exp), as_unary(ctx, rhs, UnaryOp::Exp)) else {
        return Ok(NoMatch);
    };
    let sum = ctx.binary(BinaryOp::Add, a, b)?;
    Ok(Rewritten(unary_like(ctx, id, UnaryOp::Exp, sum)?))
}

// =========================================================================
// Divide
// =========================================================================

/// `A / 1 → A`.
pub fn divide_one(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    if is_all(ctx, rhs, 1) {
        return Ok(replace_if_same_shape(ctx, id, lhs));
    }
    Ok(NoMatch)
}

/// `exp(A) / exp(B) → exp(A - B)`.
pub fn exp_over_exp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    let (Some(a), Some(b)) = (as_unary(ctx, lhs, UnaryOp::Exp), as_unary(ctx, rhs, UnaryOp::Exp)) else {
        return Ok(NoMatch);
    };
    let difference = ctx.binary(BinaryOp::Subtract, a, b)?;
    Ok(Rewritten(unary_like(ctx, id, UnaryOp::Exp, difference)?))
}

/// `A / exp(B) → A * exp(-B)`.
pub fn divide_by_exp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (a, rhs) = operands(ctx, id);
    let Some(b) = as_unary(ctx, rhs, UnaryOp::Exp) else {
        return Ok(NoMatch);
    };
    let negated = ctx.unary(UnaryOp::Negate, b)?;
    let exp = ctx.unary(UnaryOp::Exp, negated)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Multiply, a, exp)?))
}

/// `A / pow(B, C) → A * pow(B, -C)`.
pub fn divide_by_power(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !is_float(ctx, id) {
        return Ok(NoMatch);
    }
    let (a, rhs) = operands(ctx, id);
    let Some((b, c)) = as_binary(ctx, rhs, BinaryOp::Power) else {
        return Ok(NoMatch);
    };
    let negated = ctx.unary(UnaryOp::Negate, c)?;
    let power = ctx.binary(BinaryOp::Power, b, negated)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Multiply, a, power)?))
}

/// `(A / B) / (C / D) → (A * D) / (B * C)`.
pub fn divide_divide(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !is_float(ctx, id) {
        return Ok(NoMatch);
    }
    let (lhs, rhs) = operands(ctx, id);
    let (Some((a, b)), Some((c, d))) = (as_binary(ctx, lhs, BinaryOp::Divide), as_binary(ctx, rhs, BinaryOp::Divide))
    else {
        return Ok(NoMatch);
    };
    let numerator = ctx.binary(BinaryOp::Multiply, a, d)?;
    let denominator = ctx.binary(BinaryOp::Multiply, b, c)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Divide, numerator, denominator)?))
}

/// `(A / B) / C → A / (B * C)`.
pub fn divide_of_divide(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !is_float(ctx, id) {
        return Ok(NoMatch);
    }
    let (lhs, c) = operands(ctx, id);
    let Some((a, b)) = as_binary(ctx, lhs, BinaryOp::Divide) else {
        return Ok(NoMatch);
    };
    let denominator = ctx.binary(BinaryOp::Multiply, b, c)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Divide, a, denominator)?))
}

/// `A / (B / C) → (A * C) / B`.
pub fn divide_by_divide(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !is_float(ctx, id) {
        return Ok(NoMatch);
    }
    let (a, rhs) = operands(ctx, id);
    let Some((b, c)) = as_binary(ctx, rhs, BinaryOp::Divide) else {
        return Ok(NoMatch);
    };
    let numerator = ctx.binary(BinaryOp::Multiply, a, c)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Divide, numerator, b)?))
}

// =========================================================================
// Power
// =========================================================================

/// `A ^ 0 → 1`, broadcast to the result shape unless it is a scalar.
pub fn power_zero(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (_, rhs) = operands(ctx, id);
    if !is_all(ctx, rhs, 0) {
        return Ok(NoMatch);
    }
    let one = one_like(ctx, id);
    let one = ctx.constant(one)?;
    let shape = ctx.shape(id).clone();
    if shape.is_scalar() {
        return Ok(Rewritten(one));
    }
    Ok(Rewritten(ctx.broadcast(one, shape, &[])?))
}

/// `A ^ 1 → A`.
pub fn power_one(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, rhs) = operands(ctx, id);
    if is_all(ctx, rhs, 1) {
        return Ok(replace_if_same_shape(ctx, id, lhs));
    }
    Ok(NoMatch)
}

/// `pow(exp(A), B) → exp(A * B)`.
pub fn power_of_exp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (lhs, b) = operands(ctx, id);
    let Some(a) = as_unary(ctx, lhs, UnaryOp::Exp) else {
        return Ok(NoMatch);
    };
    let product = ctx.binary(BinaryOp::Multiply, a, b)?;
    Ok(Rewritten(unary_like(ctx, id, UnaryOp::Exp, product)?))
}

/// `A ^ 2 → A * A`.
pub fn power_two(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let (a, rhs) = operands(ctx, id);
    // A scalar base raised by an array exponent would shrink to a scalar.
    if !is_all(ctx, rhs, 2) || !ctx.shape(a).same_dims(ctx.shape(id)) {
        return Ok(NoMatch);
    }
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Multiply, a, a)?))
}

/// `A ^ -1 → 1 / A`.
pub fn power_minus_one(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    if !is_float(ctx, id) {
        return Ok(NoMatch);
    }
    let (a, rhs) = operands(ctx, id);
    if !is_all(ctx, rhs, -1) || !ctx.shape(a).same_dims(ctx.shape(id)) {
        return Ok(NoMatch);
    }
    let one = one_like(ctx, id);
    let one = ctx.constant(one)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Divide, one, a)?))
}

// =========================================================================
// Log
// =========================================================================

/// `log(exp(A)) → A`.
pub fn log_of_exp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    match as_unary(ctx, operand, UnaryOp::Exp) {
        Some(a) => Ok(replace_if_same_shape(ctx, id, a)),
        None => Ok(NoMatch),
    }
}

/// `log(pow(A, B)) → log(A) * B`.
pub fn log_of_power(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    let operand = ctx.operand(id, 0);
    let Some((a, b)) = as_binary(ctx, operand, BinaryOp::Power) else {
        return Ok(NoMatch);
    };
    let log = ctx.unary(UnaryOp::Log, a)?;
    Ok(Rewritten(binary_like(ctx, id, BinaryOp::Multiply, log, b)?))
}

// =========================================================================
// Clamp canonicalization
// =========================================================================

/// First operand of a binary `id` satisfying `pred`, paired with the other operand.
fn match_operand(
    ctx: &RewriteContext<'_>,
    id: InstrId,
    pred: impl Fn(&RewriteContext<'_>, InstrId) -> bool,
) -> Option<(InstrId, InstrId)> {
    let (lhs, rhs) = operands(ctx, id);
    if pred(ctx, lhs) {
        Some((lhs, rhs))
    } else if pred(ctx, rhs) {
        Some((rhs, lhs))
    } else {
        None
    }
}

/// Rewrite `outer(inner(A, inner_bound), outer_bound)` into a clamp.
///
/// `max_outer` selects which of the bounds becomes the lower one.
fn to_clamp(ctx: &mut RewriteContext<'_>, id: InstrId, inner_op: BinaryOp, max_outer: bool) -> Result<RewriteResult> {
    let inner_matches = match_operand(ctx, id, |ctx, o| matches!(ctx.op(o), Op::Binary(op) if *op == inner_op));
    let Some((inner, outer_bound)) = inner_matches else {
        return Ok(NoMatch);
    };
    if !is_scalar_constant_or_broadcast(ctx, outer_bound) {
        return Ok(NoMatch);
    }
    let Some((inner_bound, a)) = match_operand(ctx, inner, is_scalar_constant_or_broadcast) else {
        return Ok(NoMatch);
    };
    if !ctx.shape(inner_bound).compatible(ctx.shape(outer_bound)) {
        return Ok(NoMatch);
    }

    let (lo, hi) = if max_outer { (outer_bound, inner_bound) } else { (inner_bound, outer_bound) };
    // With `lo > hi` the outer bound alone decides the result, which a clamp would not reproduce.
    let (Some(lo_value), Some(hi_value)) = (scalar_constant_value(ctx, lo), scalar_constant_value(ctx, hi)) else {
        return Ok(NoMatch);
    };
    if matches!(lo_value.as_f64().partial_cmp(&hi_value.as_f64()), None | Some(Ordering::Greater)) {
        return Ok(NoMatch);
    }
    infer::clamp(ctx.shape(lo), ctx.shape(a), ctx.shape(hi))?;
    trace!(lo = %lo, operand = %a, hi = %hi, "forming clamp");
    let shape = ctx.shape(id).clone();
    Ok(Rewritten(ctx.add(Op::Clamp, shape, &[lo, a, hi])?))
}

/// `max(min(A, x), y) → clamp(y, A, x)`.
pub fn max_of_min_to_clamp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    to_clamp(ctx, id, BinaryOp::Minimum, true)
}

/// `min(max(A, x), y) → clamp(x, A, y)`.
pub fn min_of_max_to_clamp(ctx: &mut RewriteContext<'_>, id: InstrId) -> Result<RewriteResult> {
    to_clamp(ctx, id, BinaryOp::Maximum, false)
}
