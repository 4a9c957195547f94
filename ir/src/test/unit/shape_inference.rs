use tessel_dtype::DType;

use crate::error::Error;
use crate::shape::Shape;
use crate::shape_inference::*;
use crate::types::BinaryOp;
use crate::window::{ConvolutionDimensionNumbers, PaddingConfig, PaddingDim, Window, WindowDimension};

fn f32(dims: &[usize]) -> Shape {
    Shape::array(DType::Float32, dims.iter().copied())
}

#[test]
fn test_binary_scalar_broadcast() {
    assert_eq!(binary(BinaryOp::Add, &f32(&[2, 3]), &f32(&[])).unwrap(), f32(&[2, 3]));
    assert_eq!(binary(BinaryOp::Add, &f32(&[]), &f32(&[2, 3])).unwrap(), f32(&[2, 3]));
    assert!(matches!(
        binary(BinaryOp::Add, &f32(&[2, 3]), &f32(&[3, 2])),
        Err(Error::ElementwiseShapeMismatch { .. })
    ));
}

#[test]
fn test_comparison_yields_bool() {
    assert_eq!(binary(BinaryOp::Lt, &f32(&[4]), &f32(&[4])).unwrap().dtype(), DType::Bool);
}

#[test]
fn test_binary_dtype_mismatch() {
    let result = binary(BinaryOp::Add, &f32(&[4]), &Shape::array(DType::Int32, [4]));
    assert!(matches!(result, Err(Error::DTypeMismatch { lhs: DType::Float32, rhs: DType::Int32 })));
}

#[test]
fn test_reshape_size_must_match() {
    assert!(matches!(reshape(&f32(&[2, 3]), &[4]), Err(Error::ReshapeSizeMismatch { input_size: 6, output_size: 4 })));
}

#[test]
fn test_transpose() {
    assert_eq!(transpose(&f32(&[2, 3, 4]), &[2, 0, 1]).unwrap(), f32(&[4, 2, 3]));
    assert!(matches!(transpose(&f32(&[2, 3]), &[0, 0]), Err(Error::InvalidPermutation { .. })));
}

#[test]
fn test_broadcast_validation() {
    assert_eq!(broadcast(&f32(&[3]), &[2, 3], &[1]).unwrap(), f32(&[2, 3]));
    assert_eq!(broadcast(&f32(&[]), &[2, 3], &[]).unwrap(), f32(&[2, 3]));
    assert!(matches!(broadcast(&f32(&[3]), &[2, 3], &[0]), Err(Error::InvalidBroadcast { .. })));
    assert!(matches!(broadcast(&f32(&[3]), &[2, 3], &[]), Err(Error::InvalidBroadcast { .. })));
}

#[test]
fn test_slice_with_stride() {
    assert_eq!(slice(&f32(&[10]), &[1], &[10], &[3]).unwrap(), f32(&[3]));
    assert!(matches!(slice(&f32(&[4]), &[0], &[5], &[1]), Err(Error::SliceBounds { dim: 0, .. })));
}

#[test]
fn test_concatenate() {
    assert_eq!(concatenate(&[&f32(&[2, 3]), &f32(&[4, 3])], 0).unwrap(), f32(&[6, 3]));
    assert!(matches!(
        concatenate(&[&f32(&[2, 3]), &f32(&[2, 4])], 0),
        Err(Error::ConcatenateMismatch { dimension: 0, .. })
    ));
}

#[test]
fn test_pad_with_negative_and_interior() {
    let config = PaddingConfig::new([PaddingDim::new(-1, 2, 0), PaddingDim::new(1, 0, 1)]);
    assert_eq!(pad(&f32(&[5, 3]), &f32(&[]), &config).unwrap(), f32(&[6, 6]));

    let too_negative = PaddingConfig::new([PaddingDim::edge(-3, -3)]);
    assert!(matches!(pad(&f32(&[5]), &f32(&[]), &too_negative), Err(Error::PadNegativeSize { dim: 0 })));
}

#[test]
fn test_dot_ranks() {
    assert_eq!(dot(&f32(&[2, 3]), &f32(&[3, 4])).unwrap(), f32(&[2, 4]));
    assert_eq!(dot(&f32(&[3]), &f32(&[3])).unwrap(), f32(&[]));
    assert_eq!(dot(&f32(&[2, 3]), &f32(&[3])).unwrap(), f32(&[2]));
    assert!(matches!(dot(&f32(&[2, 3]), &f32(&[2, 3])), Err(Error::DotShapeMismatch { .. })));
}

#[test]
fn test_reduce_drops_dimensions() {
    assert_eq!(reduce(&f32(&[2, 3, 4]), &f32(&[]), &[0, 2]).unwrap(), f32(&[3]));
}

#[test]
fn test_reduce_window_with_padding_and_stride() {
    let window = Window::new([WindowDimension { stride: 2, padding_low: 1, padding_high: 1, ..WindowDimension::of_size(3) }]);
    // Padded size 7, window 3, stride 2: positions 0, 2, 4.
    assert_eq!(reduce_window(&f32(&[5]), &f32(&[]), &window).unwrap(), f32(&[3]));
}

#[test]
fn test_windowed_output_size_with_base_dilation() {
    let dim = WindowDimension { base_dilation: 2, ..WindowDimension::of_size(2) };
    // Dilated base: 2 * (4 - 1) + 1 = 7 elements.
    assert_eq!(windowed_output_size(4, &dim), Some(6));
    assert_eq!(windowed_output_size(1, &WindowDimension::of_size(2)), None);
}

#[test]
fn test_convolution_nhwc() {
    let dnums = ConvolutionDimensionNumbers::from_strings("NHWC", "HWIO").unwrap();
    let input = f32(&[8, 5, 5, 3]);
    let kernel = f32(&[1, 1, 3, 4]);
    let result = convolution(&input, &kernel, &Window::of_sizes([1, 1]), &dnums).unwrap();
    assert_eq!(result, f32(&[8, 5, 5, 4]));
}

#[test]
fn test_get_tuple_element() {
    let tuple = Shape::tuple([f32(&[2]), f32(&[3])]);
    assert_eq!(get_tuple_element(&tuple, 1).unwrap(), f32(&[3]));
    assert!(matches!(get_tuple_element(&tuple, 2), Err(Error::TupleIndexOutOfRange { index: 2, size: 2 })));
    assert!(matches!(get_tuple_element(&f32(&[2]), 0), Err(Error::NotATuple { .. })));
}
