//! Element-level arithmetic on `ConstValue`.
//!
//! Operands are expected to share a storage family (both `Int`, both `Float`,
//! ...); the evaluator casts them to the instruction's element type first.
//! Results come back in the widest storage of the family and are narrowed by
//! the caller.
//!
//! Floats follow IEEE 754, integers wrap, and integer division or remainder by
//! zero yields `None`. A family an operation does not list also yields `None`.

use crate::types::{BinaryOp, ConstValue, UnaryOp};

/// Apply a per-family body to one value, keeping its family.
macro_rules! each_family {
    ($v:expr, |$x:ident| { $($family:ident => $body:expr),+ $(,)? }) => {
        match $v {
            $(ConstValue::$family($x) => Some(ConstValue::$family($body)),)+
            #[allow(unreachable_patterns)]
            _ => None,
        }
    };
}

/// Apply a per-family body to a pair of values of the same family.
macro_rules! same_family {
    ($a:expr, $b:expr, |$x:ident, $y:ident| { $($family:ident => $body:expr),+ $(,)? }) => {
        match ($a, $b) {
            $((ConstValue::$family($x), ConstValue::$family($y)) => Some(ConstValue::$family($body)),)+
            _ => None,
        }
    };
}

pub fn eval_unary_op(op: UnaryOp, v: ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Negate => each_family!(v, |x| { Int => x.wrapping_neg(), UInt => x.wrapping_neg(), Float => -x }),
        UnaryOp::Abs => each_family!(v, |x| { Int => x.wrapping_abs(), UInt => x, Float => x.abs() }),
        UnaryOp::Sign => each_family!(v, |x| {
            Int => x.signum(),
            UInt => u64::from(x != 0),
            // Signed zeros and NaN are their own sign.
            Float => if x == 0.0 || x.is_nan() { x } else { x.signum() },
        }),
        UnaryOp::Exp => each_family!(v, |x| { Float => x.exp() }),
        UnaryOp::Log => each_family!(v, |x| { Float => x.ln() }),
        UnaryOp::Sqrt => each_family!(v, |x| { Float => x.sqrt() }),
        UnaryOp::Tanh => each_family!(v, |x| { Float => x.tanh() }),
        UnaryOp::Floor => each_family!(v, |x| { Int => x, UInt => x, Float => x.floor() }),
        UnaryOp::Ceil => each_family!(v, |x| { Int => x, UInt => x, Float => x.ceil() }),
        UnaryOp::Not => each_family!(v, |x| { Bool => !x, Int => !x, UInt => !x }),
    }
}

/// Arithmetic keeps the operand family, comparisons return `Bool`.
pub fn eval_binary_op(op: BinaryOp, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match op {
        BinaryOp::Add => same_family!(a, b, |x, y| {
            Int => x.wrapping_add(y),
            UInt => x.wrapping_add(y),
            Float => x + y,
            Bool => x | y,
        }),
        BinaryOp::Subtract => same_family!(a, b, |x, y| {
            Int => x.wrapping_sub(y),
            UInt => x.wrapping_sub(y),
            Float => x - y,
        }),
        BinaryOp::Multiply => same_family!(a, b, |x, y| {
            Int => x.wrapping_mul(y),
            UInt => x.wrapping_mul(y),
            Float => x * y,
            Bool => x & y,
        }),
        BinaryOp::Divide => same_family!(a, b, |x, y| {
            Int => x.wrapping_div(nonzero(y)?),
            UInt => x / nonzero(y)?,
            Float => x / y,
        }),
        BinaryOp::Remainder => same_family!(a, b, |x, y| {
            Int => x.wrapping_rem(nonzero(y)?),
            UInt => x % nonzero(y)?,
            Float => x % y,
        }),
        BinaryOp::Power => same_family!(a, b, |x, y| {
            Int => int_pow(x, y),
            UInt => x.wrapping_pow(exponent(y)),
            Float => x.powf(y),
        }),
        BinaryOp::Maximum => same_family!(a, b, |x, y| {
            Int => x.max(y),
            UInt => x.max(y),
            Float => if x.is_nan() || y.is_nan() { f64::NAN } else { x.max(y) },
            Bool => x | y,
        }),
        BinaryOp::Minimum => same_family!(a, b, |x, y| {
            Int => x.min(y),
            UInt => x.min(y),
            Float => if x.is_nan() || y.is_nan() { f64::NAN } else { x.min(y) },
            Bool => x & y,
        }),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, a, b),
        BinaryOp::And => same_family!(a, b, |x, y| { Int => x & y, UInt => x & y, Bool => x & y }),
        BinaryOp::Or => same_family!(a, b, |x, y| { Int => x | y, UInt => x | y, Bool => x | y }),
    }
}

/// Whether `v` is an integer zero, i.e. `Divide`/`Remainder` would trap.
pub fn is_integer_zero(v: ConstValue) -> bool {
    matches!(v, ConstValue::Int(0) | ConstValue::UInt(0))
}

fn nonzero<T: PartialEq + Default>(v: T) -> Option<T> {
    (v != T::default()).then_some(v)
}

fn exponent<T: TryInto<u32>>(y: T) -> u32 {
    TryInto::<u32>::try_into(y).unwrap_or(u32::MAX)
}

/// Integer power; negative exponents truncate toward zero like `1 / x^-y`.
fn int_pow(x: i64, y: i64) -> i64 {
    match (x, y) {
        (_, 0..) => x.wrapping_pow(exponent(y)),
        (1, _) => 1,
        (-1, _) if y % 2 == 0 => 1,
        (-1, _) => -1,
        _ => 0,
    }
}

fn compare(op: BinaryOp, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    let ordering = match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => x.partial_cmp(&y),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => x.partial_cmp(&y),
        (ConstValue::Float(x), ConstValue::Float(y)) => x.partial_cmp(&y),
        (ConstValue::Bool(x), ConstValue::Bool(y)) => x.partial_cmp(&y),
        _ => return None,
    };
    // Unordered (NaN) operands compare false except under `Ne`.
    let Some(ordering) = ordering else { return Some(ConstValue::Bool(op == BinaryOp::Ne)) };
    Some(ConstValue::Bool(match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Ne => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => return None,
    }))
}
