//! Permutation and reshape analysis over [`Shape`]s.
//!
//! These are the structural queries the simplifier uses to prove that a
//! reshape or transpose leaves data untouched: which dimensions a reshape
//! preserves, whether it only inserts or deletes degenerate dimensions, and
//! whether a layout change is a pure reinterpretation of the same bytes.

use smallvec::SmallVec;

use crate::shape::Shape;

/// Permutation or dimension index list.
pub type DimVec = SmallVec<[usize; 4]>;

// =========================================================================
// Permutations
// =========================================================================

/// Whether `perm` contains every index of `0..rank` exactly once.
pub fn is_permutation(perm: &[usize], rank: usize) -> bool {
    if perm.len() != rank {
        return false;
    }
    let mut seen: SmallVec<[bool; 8]> = SmallVec::from_elem(false, rank);
    for &p in perm {
        if p >= rank || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

pub fn is_identity_permutation(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}

/// `inverse[perm[i]] = i`.
pub fn inverse_permutation(perm: &[usize]) -> DimVec {
    let mut inverse: DimVec = SmallVec::from_elem(0, perm.len());
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

/// `out[i] = p1[p2[i]]`.
///
/// For `transpose(transpose(x, p1), p2)` this is the permutation of the
/// equivalent single transpose.
pub fn compose_permutations(p1: &[usize], p2: &[usize]) -> DimVec {
    debug_assert_eq!(p1.len(), p2.len());
    p2.iter().map(|&i| p1[i]).collect()
}

/// Dimensions of `transpose(x, perm)`: `out[i] = dims[perm[i]]`.
pub fn permute_dims(dims: &[usize], perm: &[usize]) -> DimVec {
    perm.iter().map(|&p| dims[p]).collect()
}

// =========================================================================
// Index arithmetic
// =========================================================================

/// Linear index of `index` in row-major order over `dims`.
pub fn row_major_linear_index(dims: &[usize], index: &[usize]) -> usize {
    dims.iter().zip(index).fold(0, |acc, (&d, &i)| acc * d + i)
}

/// Inverse of [`row_major_linear_index`].
pub fn row_major_multi_index(dims: &[usize], mut linear: usize) -> DimVec {
    let mut index: DimVec = SmallVec::from_elem(0, dims.len());
    for (slot, &d) in index.iter_mut().zip(dims).rev() {
        if d == 0 {
            continue;
        }
        *slot = linear % d;
        linear /= d;
    }
    index
}

/// Offset of `index` in memory under the shape's effective layout.
pub fn physical_linear_index(shape: &Shape, index: &[usize]) -> usize {
    let layout = shape.effective_layout();
    let mut stride = 1;
    let mut offset = 0;
    for &dim in layout.minor_to_major() {
        offset += index[dim] * stride;
        stride *= shape.dim(dim);
    }
    offset
}

/// Iterate every multi-index of `dims` in row-major order.
pub fn for_each_index(dims: &[usize], mut f: impl FnMut(&[usize])) {
    if dims.contains(&0) {
        return;
    }
    let mut index: DimVec = SmallVec::from_elem(0, dims.len());
    loop {
        f(&index);
        let mut axis = dims.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < dims[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

// =========================================================================
// Reshape analysis
// =========================================================================

/// Pairs `(input_dim, output_dim)` that a reshape from `input` to `output` keeps intact.
///
/// A reshape preserves `input_dim` as `output_dim` iff both have the same size
/// and the products of all dimensions before them agree. Returns an empty list
/// for zero-element shapes.
pub fn dimensions_unmodified_by_reshape(input: &[usize], output: &[usize]) -> Vec<(usize, usize)> {
    if input.iter().product::<usize>() == 0 {
        return Vec::new();
    }

    let mut unmodified = Vec::new();
    let (mut i, mut o) = (0, 0);
    while i < input.len() && o < output.len() {
        let mut partial_in = input[i];
        let mut partial_out = output[o];
        while partial_in != partial_out {
            if partial_in < partial_out {
                i += 1;
                let Some(&d) = input.get(i) else { return unmodified };
                partial_in *= d;
            } else {
                o += 1;
                let Some(&d) = output.get(o) else { return unmodified };
                partial_out *= d;
            }
        }
        if input[i] == output[o] {
            unmodified.push((i, o));
        }
        i += 1;
        o += 1;
    }
    unmodified
}

/// Degenerate dimensions a reshape deletes from `input` and inserts into `output`.
///
/// Returns `None` when the reshape changes any dimension of size greater than 1.
pub fn inserted_or_deleted_1_sized_dimensions(input: &[usize], output: &[usize]) -> Option<(DimVec, DimVec)> {
    let mut deleted = DimVec::new();
    let mut inserted = DimVec::new();

    let unmodified = dimensions_unmodified_by_reshape(input, output);
    let mut prior: Option<(usize, usize)> = None;
    let bounds = unmodified.iter().copied().map(Some).chain(std::iter::once(None));
    for pair in bounds {
        let (in_end, out_end) = pair.unwrap_or((input.len(), output.len()));
        let in_start = prior.map_or(0, |(p, _)| p + 1);
        let out_start = prior.map_or(0, |(_, p)| p + 1);
        for dim in in_start..in_end {
            if input[dim] > 1 {
                return None;
            }
            deleted.push(dim);
        }
        for dim in out_start..out_end {
            if output[dim] > 1 {
                return None;
            }
            inserted.push(dim);
        }
        prior = pair;
    }
    Some((deleted, inserted))
}

/// Whether a reshape from `input` to `output` preserves the physical position of every element.
///
/// Checks, in both directions, that the unit index along each non-degenerate
/// dimension lands at the same physical offset in the source and the
/// destination layout. Zero-element shapes are trivially bitcastable.
pub fn reshape_is_bitcast(input: &Shape, output: &Shape) -> bool {
    if input.dtype() != output.dtype() || input.is_tuple() || output.is_tuple() {
        return false;
    }
    if input.element_count() != output.element_count() {
        return false;
    }
    if input.element_count() == 0 {
        return true;
    }

    fn unit_indices_agree(from: &Shape, to: &Shape) -> bool {
        (0..from.rank()).filter(|&dim| from.dim(dim) > 1).all(|dim| {
            let mut unit: DimVec = SmallVec::from_elem(0, from.rank());
            unit[dim] = 1;
            let logical = row_major_linear_index(from.dims(), &unit);
            let mapped = row_major_multi_index(to.dims(), logical);
            physical_linear_index(from, &unit) == physical_linear_index(to, &mapped)
        })
    }

    unit_indices_agree(input, output) && unit_indices_agree(output, input)
}

/// Whether `transpose(input, perm)` producing `output` keeps every element in place.
///
/// Holds iff `perm ∘ output.minor_to_major == input.minor_to_major`.
pub fn transpose_is_bitcast(input: &Shape, output: &Shape, perm: &[usize]) -> bool {
    if input.dtype() != output.dtype() || input.rank() != perm.len() || output.rank() != perm.len() {
        return false;
    }
    let input_layout = input.effective_layout();
    let output_layout = output.effective_layout();
    compose_permutations(perm, output_layout.minor_to_major()).as_slice() == input_layout.minor_to_major()
}
