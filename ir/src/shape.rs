//! Shapes and physical layouts.
//!
//! A [`Shape`] is an element type plus an ordered list of dimension sizes and,
//! optionally, a [`Layout`]: the permutation of dimension indices listed from
//! most-minor (fastest varying in memory) to most-major. Shapes without a layout
//! behave as if they carried the default row-major layout `{rank-1, ..., 0}`.
//!
//! Tuple shapes use `DType::Tuple` and carry their element shapes instead of
//! dimensions.
//!
//! Two notions of equality exist:
//! - [`Shape::compatible`]: same element type and dimensions, layouts ignored;
//! - [`Shape::equal`]: additionally requires equal effective layouts.
//!
//! [`Shape::equal_under`] picks between them based on the layout sensitivity of
//! the caller.

use std::fmt;

use smallvec::SmallVec;
use snafu::ensure;

use tessel_dtype::DType;

use crate::error::*;

/// Dimension sizes. Inline capacity covers ranks up to 4 without allocating.
pub type Dims = SmallVec<[usize; 4]>;

/// Physical ordering of a shape's dimensions, most-minor first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    minor_to_major: SmallVec<[usize; 4]>,
}

impl Layout {
    /// Build a layout, validating that `minor_to_major` is a permutation of `0..rank`.
    pub fn new(minor_to_major: impl IntoIterator<Item = usize>, rank: usize) -> Result<Self> {
        let minor_to_major: SmallVec<[usize; 4]> = minor_to_major.into_iter().collect();
        ensure!(
            crate::shape_util::is_permutation(&minor_to_major, rank),
            InvalidLayoutSnafu { minor_to_major: minor_to_major.to_vec(), rank }
        );
        Ok(Self { minor_to_major })
    }

    /// Row-major layout: dimension 0 is most major.
    pub fn row_major(rank: usize) -> Self {
        Self { minor_to_major: (0..rank).rev().collect() }
    }

    /// Column-major layout: dimension 0 is most minor.
    pub fn column_major(rank: usize) -> Self {
        Self { minor_to_major: (0..rank).collect() }
    }

    pub fn minor_to_major(&self) -> &[usize] {
        &self.minor_to_major
    }

    /// The `i`-th most minor dimension.
    pub fn minor(&self, i: usize) -> usize {
        self.minor_to_major[i]
    }

    /// Position of `dim` in the minor-to-major order (0 = most minor).
    pub fn position_of(&self, dim: usize) -> Option<usize> {
        self.minor_to_major.iter().position(|&d| d == dim)
    }

    pub fn rank(&self) -> usize {
        self.minor_to_major.len()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, d) in self.minor_to_major.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "}}")
    }
}

/// Element type, dimensions and optional layout of an instruction's result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dtype: DType,
    dims: Dims,
    layout: Option<Layout>,
    tuple_shapes: Vec<Shape>,
}

impl Shape {
    /// Array shape without an explicit layout.
    pub fn array(dtype: DType, dims: impl IntoIterator<Item = usize>) -> Self {
        Self { dtype, dims: dims.into_iter().collect(), layout: None, tuple_shapes: Vec::new() }
    }

    pub fn scalar(dtype: DType) -> Self {
        Self::array(dtype, [])
    }

    /// Array shape with an explicit minor-to-major layout.
    pub fn with_layout(
        dtype: DType,
        dims: impl IntoIterator<Item = usize>,
        minor_to_major: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        let dims: Dims = dims.into_iter().collect();
        let layout = Layout::new(minor_to_major, dims.len())?;
        Ok(Self { dtype, dims, layout: Some(layout), tuple_shapes: Vec::new() })
    }

    /// Array shape carrying an explicit row-major layout.
    pub fn row_major(dtype: DType, dims: impl IntoIterator<Item = usize>) -> Self {
        let dims: Dims = dims.into_iter().collect();
        let layout = Layout::row_major(dims.len());
        Self { dtype, dims, layout: Some(layout), tuple_shapes: Vec::new() }
    }

    pub fn tuple(elements: impl IntoIterator<Item = Shape>) -> Self {
        Self { dtype: DType::Tuple, dims: Dims::new(), layout: None, tuple_shapes: elements.into_iter().collect() }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Explicit layout, if any.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn has_layout(&self) -> bool {
        self.layout.is_some()
    }

    /// Explicit layout, or row-major when none was assigned.
    pub fn effective_layout(&self) -> Layout {
        self.layout.clone().unwrap_or_else(|| Layout::row_major(self.rank()))
    }

    pub fn is_tuple(&self) -> bool {
        self.dtype == DType::Tuple
    }

    pub fn tuple_shapes(&self) -> &[Shape] {
        &self.tuple_shapes
    }

    pub fn tuple_element(&self, index: usize) -> Option<&Shape> {
        self.tuple_shapes.get(index)
    }

    pub fn is_array(&self) -> bool {
        !self.is_tuple()
    }

    /// Rank-0 array.
    pub fn is_scalar(&self) -> bool {
        self.is_array() && self.dims.is_empty()
    }

    /// Array with exactly one element, whatever its rank.
    pub fn is_effective_scalar(&self) -> bool {
        self.is_array() && self.element_count() == 1
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn has_zero_elements(&self) -> bool {
        self.is_array() && self.dims.contains(&0)
    }

    /// Same element type and dimensions; layouts are ignored.
    pub fn compatible(&self, other: &Shape) -> bool {
        if self.is_tuple() || other.is_tuple() {
            return self.is_tuple()
                && other.is_tuple()
                && self.tuple_shapes.len() == other.tuple_shapes.len()
                && self.tuple_shapes.iter().zip(&other.tuple_shapes).all(|(a, b)| a.compatible(b));
        }
        self.dtype == other.dtype && self.dims == other.dims
    }

    /// Same element type, dimensions and effective layout.
    pub fn equal(&self, other: &Shape) -> bool {
        if self.is_tuple() || other.is_tuple() {
            return self.is_tuple()
                && other.is_tuple()
                && self.tuple_shapes.len() == other.tuple_shapes.len()
                && self.tuple_shapes.iter().zip(&other.tuple_shapes).all(|(a, b)| a.equal(b));
        }
        self.compatible(other) && self.effective_layout() == other.effective_layout()
    }

    /// `equal` when `layout_sensitive`, `compatible` otherwise.
    pub fn equal_under(&self, other: &Shape, layout_sensitive: bool) -> bool {
        if layout_sensitive { self.equal(other) } else { self.compatible(other) }
    }

    /// Same dimensions, element types may differ.
    pub fn same_dims(&self, other: &Shape) -> bool {
        self.dims == other.dims
    }

    pub fn with_dtype(&self, dtype: DType) -> Shape {
        Shape { dtype, ..self.clone() }
    }

    pub fn with_dims(&self, dims: impl IntoIterator<Item = usize>) -> Shape {
        Shape::array(self.dtype, dims)
    }

    /// Copy of this shape with the layout dropped.
    pub fn without_layout(&self) -> Shape {
        Shape { layout: None, ..self.clone() }
    }

    /// Copy of this shape with `layout`, validated against the rank.
    pub fn relayout(&self, minor_to_major: impl IntoIterator<Item = usize>) -> Result<Shape> {
        let layout = Layout::new(minor_to_major, self.rank())?;
        Ok(Shape { layout: Some(layout), ..self.clone() })
    }

    /// Dimensions of size 1.
    pub fn degenerate_dims(&self) -> impl Iterator<Item = usize> + '_ {
        self.dims.iter().enumerate().filter(|(_, d)| **d == 1).map(|(i, _)| i)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tuple() {
            write!(f, "(")?;
            for (i, s) in self.tuple_shapes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{s}")?;
            }
            return write!(f, ")");
        }
        write!(f, "{}[", self.dtype)?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")?;
        if let Some(layout) = &self.layout {
            write!(f, "{layout}")?;
        }
        Ok(())
    }
}
