//! Generators for property-based testing.
//!
//! Strategies for dimension lists, layouts, permutations, padding
//! configurations and float literals of a given shape.

use proptest::prelude::*;

use tessel_dtype::DType;

use crate::literal::Literal;
use crate::shape::Shape;
use crate::types::ConstValue;
use crate::window::{PaddingConfig, PaddingDim};

// ============================================================================
// Dimensions and layouts
// ============================================================================

/// Dimension lists of rank `1..=max_rank` with sizes `1..=max_dim`.
pub fn arb_dims(max_rank: usize, max_dim: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1..=max_dim, 1..=max_rank)
}

/// Random permutation of `0..rank`.
pub fn arb_permutation(rank: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..rank).collect::<Vec<_>>()).prop_shuffle()
}

/// `f32` array shape with a random explicit layout.
pub fn arb_shape_with_layout(max_rank: usize, max_dim: usize) -> impl Strategy<Value = Shape> {
    arb_dims(max_rank, max_dim).prop_flat_map(|dims| {
        let rank = dims.len();
        arb_permutation(rank).prop_map(move |m2m| {
            Shape::with_layout(DType::Float32, dims.clone(), m2m).expect("permutation is a valid layout")
        })
    })
}

// ============================================================================
// Padding
// ============================================================================

/// Padding config for `dims` whose edges may be negative but never empty a dimension.
pub fn arb_padding_config(dims: Vec<usize>) -> impl Strategy<Value = PaddingConfig> {
    dims.into_iter()
        .map(|size| {
            let size = size as i64;
            (-size / 2..=2i64, -size / 2..=2i64, 0usize..=1).prop_map(|(low, high, interior)| {
                PaddingDim::new(low, high, interior)
            })
        })
        .collect::<Vec<_>>()
        .prop_map(PaddingConfig::new)
}

// ============================================================================
// Literals
// ============================================================================

/// `f32` literal of the given dimensions with small integral values.
pub fn arb_f32_literal(dims: Vec<usize>) -> impl Strategy<Value = Literal> {
    let count = dims.iter().product::<usize>();
    prop::collection::vec(-8i32..=8, count).prop_map(move |values| {
        let values = values.into_iter().map(|v| ConstValue::Float(v as f64)).collect();
        Literal::from_values(DType::Float32, dims.clone(), values).expect("value count matches dims")
    })
}

/// Dimensions paired with a literal of those dimensions.
pub fn arb_dims_and_literal(max_rank: usize, max_dim: usize) -> impl Strategy<Value = (Vec<usize>, Literal)> {
    arb_dims(max_rank, max_dim).prop_flat_map(|dims| (Just(dims.clone()), arb_f32_literal(dims)))
}
