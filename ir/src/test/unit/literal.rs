use tessel_dtype::DType;

use crate::error::Error;
use crate::literal::Literal;
use crate::types::ConstValue;

#[test]
fn test_values_are_cast_to_dtype() {
    let literal = Literal::from_values(DType::Int8, [2], vec![ConstValue::Int(300), ConstValue::Float(2.7)]).unwrap();
    assert_eq!(literal.values(), &[ConstValue::Int(44), ConstValue::Int(2)]);
}

#[test]
fn test_cast_wraps_integers_and_saturates_floats() {
    assert_eq!(ConstValue::Int(-1).cast(DType::UInt16), Some(ConstValue::UInt(65535)));
    assert_eq!(ConstValue::UInt(200).cast(DType::Int8), Some(ConstValue::Int(-56)));
    assert_eq!(ConstValue::Float(1e10).cast(DType::Int32), Some(ConstValue::Int(i32::MAX as i64)));
    assert_eq!(ConstValue::Float(-3.9).cast(DType::UInt8), Some(ConstValue::UInt(0)));
    assert_eq!(ConstValue::Float(f64::NAN).cast(DType::Int64), Some(ConstValue::Int(0)));
    assert_eq!(ConstValue::Bool(true).cast(DType::Float32), Some(ConstValue::Float(1.0)));
    assert_eq!(ConstValue::Float(0.5).cast(DType::Bool), Some(ConstValue::Bool(true)));
    assert_eq!(ConstValue::Int(3).cast(DType::Tuple), None);
    assert_eq!(ConstValue::one(DType::UInt32), ConstValue::UInt(1));
    assert_eq!(ConstValue::zero(DType::BFloat16), ConstValue::Float(0.0));
}

#[test]
fn test_size_mismatch() {
    let result = Literal::from_values(DType::Float32, [2, 2], vec![ConstValue::Float(1.0)]);
    assert!(matches!(result, Err(Error::LiteralSizeMismatch { expected: 4, actual: 1 })));
}

#[test]
fn test_r2_and_get() {
    let literal = Literal::r2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(literal.dims(), &[2, 3]);
    assert_eq!(literal.get(&[1, 0]), Some(ConstValue::Float(4.0)));
    assert_eq!(literal.get(&[2, 0]), None);
}

#[test]
fn test_is_all() {
    assert!(Literal::r0(0.0f32).is_all_zero());
    assert!(Literal::r2(&[[1.0f32, 1.0], [1.0, 1.0]]).is_all_one());
    assert!(!Literal::r1(&[1.0f32, 2.0]).is_all_one());
    assert!(Literal::r0(-1i32).is_all_int(-1));
    assert!(!Literal::r1::<f32>(&[]).is_all_zero());
    assert!(Literal::r0(true).is_all_one());
}

#[test]
fn test_scalar_value() {
    assert_eq!(Literal::r0(2.5f64).scalar_value(), Some(ConstValue::Float(2.5)));
    assert_eq!(Literal::r1(&[7i32]).scalar_value(), Some(ConstValue::Int(7)));
    assert_eq!(Literal::r1(&[7i32, 8]).scalar_value(), None);
}

#[test]
fn test_reshape_keeps_values() {
    let literal = Literal::r1(&[1i32, 2, 3, 4, 5, 6]).reshape(&[3, 2]).unwrap();
    assert_eq!(literal.get(&[2, 1]), Some(ConstValue::Int(6)));
    assert!(literal.reshape(&[4]).is_err());
}

#[test]
fn test_approx_eq() {
    let a = Literal::r1(&[1.0f32, 2.0]);
    let b = Literal::r1(&[1.0f32, 2.000_001]);
    assert!(a.approx_eq(&b, 1e-5));
    assert!(!a.approx_eq(&Literal::r1(&[1.0f32, 2.1]), 1e-5));
    assert!(!a.approx_eq(&Literal::r1(&[1.0f64, 2.0]), 1e-5));
}

#[test]
fn test_display() {
    assert_eq!(Literal::r0(1.0f32).to_string(), "1.0");
    assert_eq!(Literal::r1(&[1i32, 2]).to_string(), "{1, 2}");
}
