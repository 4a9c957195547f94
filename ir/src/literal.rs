//! Immutable constant values.
//!
//! A [`Literal`] is a dense row-major array of [`ConstValue`]s with an element
//! type and dimensions, or a tuple of literals. Values are normalized on
//! construction: every element is cast to the literal's element type.

use std::fmt;

use snafu::ensure;

use tessel_dtype::{DType, HasDType};

use crate::error::*;
use crate::shape::Shape;
use crate::shape_util;
use crate::types::ConstValue;

/// Rust scalar types that can seed a literal.
pub trait NativeScalar: HasDType + Copy {
    fn to_const(self) -> ConstValue;
}

macro_rules! impl_native_scalar {
    ($($ty:ty => $variant:ident as $storage:ty),* $(,)?) => {
        $(impl NativeScalar for $ty {
            fn to_const(self) -> ConstValue {
                ConstValue::$variant(self as $storage)
            }
        })*
    };
}

impl_native_scalar! {
    i8 => Int as i64, i16 => Int as i64, i32 => Int as i64, i64 => Int as i64,
    u8 => UInt as u64, u16 => UInt as u64, u32 => UInt as u64, u64 => UInt as u64,
    f32 => Float as f64, f64 => Float as f64,
}

impl NativeScalar for bool {
    fn to_const(self) -> ConstValue {
        ConstValue::Bool(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    shape: Shape,
    values: Vec<ConstValue>,
    elements: Vec<Literal>,
}

impl Literal {
    /// Array literal from row-major `values`.
    pub fn from_values(dtype: DType, dims: impl IntoIterator<Item = usize>, values: Vec<ConstValue>) -> Result<Self> {
        let shape = Shape::array(dtype, dims);
        ensure!(dtype.is_array_element(), TupleElementTypeSnafu);
        ensure!(
            shape.element_count() == values.len(),
            LiteralSizeMismatchSnafu { expected: shape.element_count(), actual: values.len() }
        );
        let values = values.into_iter().map(|v| v.cast(dtype).unwrap_or(v)).collect();
        Ok(Self { shape, values, elements: Vec::new() })
    }

    /// Array literal whose element at each index is `f(index)`.
    pub fn from_fn(dtype: DType, dims: &[usize], mut f: impl FnMut(&[usize]) -> ConstValue) -> Self {
        let mut values = Vec::with_capacity(dims.iter().product());
        shape_util::for_each_index(dims, |index| {
            let v = f(index);
            values.push(v.cast(dtype).unwrap_or(v));
        });
        Self { shape: Shape::array(dtype, dims.iter().copied()), values, elements: Vec::new() }
    }

    /// Array literal with every element equal to `value`.
    pub fn filled(dtype: DType, dims: &[usize], value: ConstValue) -> Self {
        Self::from_fn(dtype, dims, |_| value)
    }

    pub fn scalar(dtype: DType, value: ConstValue) -> Self {
        Self::filled(dtype, &[], value)
    }

    pub fn zero(dtype: DType) -> Self {
        Self::scalar(dtype, ConstValue::zero(dtype))
    }

    pub fn one(dtype: DType) -> Self {
        Self::scalar(dtype, ConstValue::one(dtype))
    }

    pub fn r0<T: NativeScalar>(value: T) -> Self {
        Self::scalar(T::DTYPE, value.to_const())
    }

    pub fn r1<T: NativeScalar>(values: &[T]) -> Self {
        Self::from_fn(T::DTYPE, &[values.len()], |i| values[i[0]].to_const())
    }

    /// Rank-2 literal from equally sized rows.
    pub fn r2<T: NativeScalar, const N: usize>(rows: &[[T; N]]) -> Self {
        Self::from_fn(T::DTYPE, &[rows.len(), N], |i| rows[i[0]][i[1]].to_const())
    }

    pub fn tuple(elements: Vec<Literal>) -> Self {
        let shape = Shape::tuple(elements.iter().map(|e| e.shape.clone()));
        Self { shape, values: Vec::new(), elements }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.shape.dtype()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn values(&self) -> &[ConstValue] {
        &self.values
    }

    pub fn tuple_elements(&self) -> &[Literal] {
        &self.elements
    }

    pub fn element_count(&self) -> usize {
        self.values.len()
    }

    /// Element at a multi-index, `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<ConstValue> {
        if index.len() != self.shape.rank() || index.iter().zip(self.dims()).any(|(i, d)| i >= d) {
            return None;
        }
        self.values.get(shape_util::row_major_linear_index(self.dims(), index)).copied()
    }

    /// The only element of a one-element array literal.
    pub fn scalar_value(&self) -> Option<ConstValue> {
        match self.values.as_slice() {
            [v] if self.shape.is_array() => Some(*v),
            _ => None,
        }
    }

    /// Whether every element satisfies `pred`. False for tuples and empty literals.
    pub fn is_all(&self, pred: impl Fn(ConstValue) -> bool) -> bool {
        self.shape.is_array() && !self.values.is_empty() && self.values.iter().all(|&v| pred(v))
    }

    /// Whether every element numerically equals `value`.
    pub fn is_all_int(&self, value: i64) -> bool {
        self.is_all(|v| v.equals_int(value))
    }

    pub fn is_all_zero(&self) -> bool {
        self.is_all_int(0)
    }

    pub fn is_all_one(&self) -> bool {
        self.is_all_int(1)
    }

    /// Same values under new dimensions with equal element count.
    pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
        let expected = dims.iter().product::<usize>();
        ensure!(
            expected == self.values.len(),
            ReshapeSizeMismatchSnafu { input_size: self.values.len(), output_size: expected }
        );
        Ok(Self { shape: self.shape.with_dims(dims.iter().copied()), values: self.values.clone(), elements: Vec::new() })
    }

    /// Element-wise cast to `dtype`.
    pub fn convert(&self, dtype: DType) -> Result<Self> {
        ensure!(dtype.is_array_element() && self.shape.is_array(), TupleElementTypeSnafu);
        let values = self.values.iter().map(|v| v.cast(dtype).unwrap_or(*v)).collect();
        Ok(Self { shape: self.shape.with_dtype(dtype), values, elements: Vec::new() })
    }

    /// Compare shapes exactly and values within `tolerance` (absolute, scaled by magnitude).
    pub fn approx_eq(&self, other: &Literal, tolerance: f64) -> bool {
        if !self.shape.compatible(&other.shape) {
            return false;
        }
        if self.shape.is_tuple() {
            return self.elements.iter().zip(&other.elements).all(|(a, b)| a.approx_eq(b, tolerance));
        }
        self.values.iter().zip(&other.values).all(|(a, b)| {
            let (a, b) = (a.as_f64(), b.as_f64());
            (a.is_nan() && b.is_nan()) || a == b || (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_tuple() {
            write!(f, "(")?;
            for (i, e) in self.elements.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{e}")?;
            }
            return write!(f, ")");
        }
        if let Some(v) = self.scalar_value()
            && self.shape.is_scalar()
        {
            return write!(f, "{v}");
        }
        write!(f, "{{")?;
        for (i, v) in self.values.iter().enumerate().take(8) {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        if self.values.len() > 8 {
            write!(f, ", ...")?;
        }
        write!(f, "}}")
    }
}
