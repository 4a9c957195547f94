//! Target-specific bitcast admission.
//!
//! Layout analysis decides whether a reinterpretation is *possible*; the
//! oracle decides whether the target *accepts* it. Both must agree before a
//! reshape, transpose or convolution is turned into bitcasts.

use tessel_ir::Shape;

pub trait BitcastOracle {
    fn is_valid_bitcast(&self, from: &Shape, to: &Shape) -> bool;
}

/// Accepts every bitcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysBitcast;

impl BitcastOracle for AlwaysBitcast {
    fn is_valid_bitcast(&self, _from: &Shape, _to: &Shape) -> bool {
        true
    }
}

/// Refuses every bitcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverBitcast;

impl BitcastOracle for NeverBitcast {
    fn is_valid_bitcast(&self, _from: &Shape, _to: &Shape) -> bool {
        false
    }
}

impl<F> BitcastOracle for F
where
    F: Fn(&Shape, &Shape) -> bool,
{
    fn is_valid_bitcast(&self, from: &Shape, to: &Shape) -> bool {
        self(from, to)
    }
}
