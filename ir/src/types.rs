//! Scalar values and operator tags shared by the IR.
//!
//! `ConstValue` is the element storage of literals; `UnaryOp` and `BinaryOp`
//! name the element-wise arithmetic the instruction set exposes.

use tessel_dtype::DType;

/// One element of a literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl ConstValue {
    /// Additive identity of `dtype`; `Tuple` falls back to `Int(0)`.
    pub fn zero(dtype: DType) -> Self {
        Self::Bool(false).cast(dtype).unwrap_or(Self::Int(0))
    }

    pub fn one(dtype: DType) -> Self {
        Self::Bool(true).cast(dtype).unwrap_or(Self::Int(1))
    }

    /// Cast to `dtype` with C-style truncation and wrap-around.
    ///
    /// Returns `None` for `DType::Tuple`.
    pub fn cast(&self, dtype: DType) -> Option<Self> {
        use DType::*;
        Some(match (dtype, *self) {
            (Tuple, _) => return None,
            (Bool, v) => Self::Bool(v.is_nonzero()),
            (Float32, v) => Self::Float(v.as_f64() as f32 as f64),
            (Float16 | BFloat16 | Float64, v) => Self::Float(v.as_f64()),
            (_, Self::Float(v)) => saturate_to_int(v, dtype),
            (_, Self::Int(v)) => wrap_to_int(v as u64, dtype),
            (_, Self::UInt(v)) => wrap_to_int(v, dtype),
            (_, Self::Bool(v)) => wrap_to_int(u64::from(v), dtype),
        })
    }

    fn is_nonzero(&self) -> bool {
        match *self {
            ConstValue::Int(v) => v != 0,
            ConstValue::UInt(v) => v != 0,
            ConstValue::Float(v) => v != 0.0,
            ConstValue::Bool(v) => v,
        }
    }

    /// Value as `f64`, used for numeric comparison across families.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ConstValue::Int(v) => v as f64,
            ConstValue::UInt(v) => v as f64,
            ConstValue::Float(v) => v,
            ConstValue::Bool(v) => v as u8 as f64,
        }
    }

    /// Whether this element numerically equals the integer `value`.
    pub fn equals_int(&self, value: i64) -> bool {
        match *self {
            ConstValue::Int(v) => v == value,
            ConstValue::UInt(v) => value >= 0 && v == value as u64,
            ConstValue::Float(v) => v == value as f64,
            ConstValue::Bool(v) => (value == 0 && !v) || (value == 1 && v),
        }
    }
}

/// Keep the low bits of `bits` that fit the integer `dtype`, sign-extending signed types.
fn wrap_to_int(bits: u64, dtype: DType) -> ConstValue {
    let shift = 64 - 8 * dtype.bytes() as u32;
    let kept = (bits << shift) >> shift;
    if dtype.is_signed() { ConstValue::Int(((kept << shift) as i64) >> shift) } else { ConstValue::UInt(kept) }
}

/// Float to integer `dtype` the way `as` converts: truncate, saturate, NaN to zero.
fn saturate_to_int(v: f64, dtype: DType) -> ConstValue {
    let width = 8 * dtype.bytes() as u32;
    if dtype.is_signed() {
        let max = (1i128 << (width - 1)) - 1;
        ConstValue::Int((v as i128).clamp(-max - 1, max) as i64)
    } else {
        let max = (1u128 << width) - 1;
        ConstValue::UInt((v as u128).min(max) as u64)
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Element-wise unary operations. All preserve the operand's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumIter, strum::EnumCount, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum UnaryOp {
    Negate,
    Abs,
    Sign,
    Exp,
    Log,
    Sqrt,
    Tanh,
    Floor,
    Ceil,
    Not,
}

/// Element-wise binary operations.
///
/// Arithmetic operations keep the operand element type; comparisons produce `Bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumIter, strum::EnumCount, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Maximum,
    Minimum,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}
