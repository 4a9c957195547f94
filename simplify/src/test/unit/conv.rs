use test_case::test_case;

use tessel_ir::shape_inference as infer;
use tessel_ir::{
    ComputationBuilder, ComputationId, ConstValue, ConvolutionDimensionNumbers, DType, Literal, Module, Op, OpKey,
    Shape, Window,
};

use crate::test::helpers::*;
use crate::{AlgebraicSimplifier, AlwaysBitcast, NeverBitcast, SimplifierConfig};

/// Size of each activation letter.
fn activation_size(letter: char) -> usize {
    match letter {
        'N' => 2,
        'H' => 3,
        'W' => 4,
        'C' => 5,
        _ => unreachable!("unknown activation letter {letter}"),
    }
}

/// Size of each kernel letter for a `k`-wide spatial window.
fn kernel_size(letter: char, k: usize) -> usize {
    match letter {
        'I' => 5,
        'O' => 6,
        'H' | 'W' => k,
        _ => unreachable!("unknown kernel letter {letter}"),
    }
}

fn ramp(dims: &[usize]) -> Literal {
    let mut next = 0.0;
    Literal::from_fn(DType::Float32, dims, |_| {
        next += 0.5;
        ConstValue::Float(next)
    })
}

struct Conv {
    module: Module,
    entry: ComputationId,
    inputs: [Literal; 2],
}

/// Physical order of the convolution's input, kernel and output.
#[derive(Debug, Clone, Copy)]
enum Order {
    RowMajor,
    ColumnMajor,
    /// Row-major operands feeding a column-major output.
    ColumnMajorOutput,
}

fn laid_out(dims: &[usize], column_major: bool) -> Shape {
    let minor_to_major: Vec<usize> =
        if column_major { (0..dims.len()).collect() } else { (0..dims.len()).rev().collect() };
    Shape::with_layout(DType::Float32, dims.iter().copied(), minor_to_major).unwrap()
}

/// A convolution with operands laid out per the two layout strings and `order`.
fn conv(activation: &str, kernel: &str, k: usize, stride: usize, order: Order) -> Conv {
    let dnums = ConvolutionDimensionNumbers::from_strings(activation, kernel).unwrap();
    let input_dims: Vec<usize> = activation.chars().map(activation_size).collect();
    let kernel_dims: Vec<usize> = kernel.chars().map(|c| kernel_size(c, k)).collect();
    let column_major = matches!(order, Order::ColumnMajor);
    let input_shape = laid_out(&input_dims, column_major);
    let kernel_shape = laid_out(&kernel_dims, column_major);

    let mut window = Window::of_sizes([k, k]);
    for dim in &mut window.dimensions {
        dim.stride = stride;
    }
    let output = infer::convolution(&input_shape, &kernel_shape, &window, &dnums).unwrap();
    let output = laid_out(output.dims(), !matches!(order, Order::RowMajor));

    let mut b = ComputationBuilder::new("conv");
    let input = b.parameter(0, input_shape).unwrap();
    let weights = b.parameter(1, kernel_shape).unwrap();
    let root = b.add_instruction(Op::Convolution { window, dimension_numbers: dnums }, output, &[input, weights]).unwrap();
    let (module, entry) = module_of(b, root);
    Conv { module, entry, inputs: [ramp(&input_dims), ramp(&kernel_dims)] }
}

fn simplify(conv: &mut Conv, simplifier: &AlgebraicSimplifier) -> bool {
    sweep(simplifier, &mut conv.module, conv.entry)
}

#[test_case("NHWC", "HWIO", Order::RowMajor ; "batch major feature minor")]
#[test_case("NWHC", "HWIO", Order::RowMajor ; "swapped spatial")]
#[test_case("WHNC", "HWIO", Order::RowMajor ; "batch between spatial and feature")]
#[test_case("NHWC", "WHIO", Order::RowMajor ; "kernel spatial swapped")]
#[test_case("NHWC", "IWOH", Order::RowMajor ; "kernel spatial interleaved")]
#[test_case("NHWC", "IWHO", Order::RowMajor ; "kernel input feature major")]
#[test_case("CHWN", "OIHW", Order::ColumnMajor ; "column major feature first")]
#[test_case("CNHW", "OWHI", Order::ColumnMajor ; "column major batch second")]
fn test_pointwise_convolution_becomes_dot(activation: &str, kernel: &str, order: Order) {
    let mut c = conv(activation, kernel, 1, 1, order);
    let original = c.module.clone();

    assert!(simplify(&mut c, &sensitive(AlwaysBitcast)));
    assert_root_matches(
        &c.module,
        c.entry,
        node(
            OpKey::Bitcast,
            [node(
                OpKey::Dot,
                [node(OpKey::Bitcast, [Pat::Parameter(0)]), node(OpKey::Bitcast, [Pat::Parameter(1)])],
            )],
        ),
    );
    let root = root_of(&c.module, c.entry);
    let dot = c.module[c.entry][root].operand(0);
    assert_eq!(c.module[c.entry][dot].shape().dims(), &[24, 6]);
    assert!(evaluate(&c.module, &c.inputs).approx_eq(&evaluate(&original, &c.inputs), 1e-5));
}

#[test_case("HWCN", "HWIO", Order::RowMajor ; "feature not minor")]
#[test_case("CHWN", "HWIO", Order::RowMajor ; "feature major")]
#[test_case("NHWC", "HWOI", Order::RowMajor ; "kernel output feature minor")]
#[test_case("NHWC", "WHOI", Order::RowMajor ; "kernel output feature minor with spatial swapped")]
#[test_case("NHWC", "OWIH", Order::RowMajor ; "kernel output feature major")]
#[test_case("NHWC", "OWHI", Order::RowMajor ; "kernel output feature outermost")]
#[test_case("NHWC", "HWIO", Order::ColumnMajor ; "column major feature major")]
#[test_case("CHWN", "IOHW", Order::ColumnMajor ; "column major kernel input feature minor")]
#[test_case("NHWC", "HWIO", Order::ColumnMajorOutput ; "output layout differs from input")]
fn test_convolution_layout_mismatch_is_kept(activation: &str, kernel: &str, order: Order) {
    let mut c = conv(activation, kernel, 1, 1, order);

    assert!(!simplify(&mut c, &sensitive(AlwaysBitcast)));
    assert_root_matches(&c.module, c.entry, node(OpKey::Convolution, [Pat::Parameter(0), Pat::Parameter(1)]));
}

#[test]
fn test_convolution_kept_when_layout_insensitive() {
    let mut c = conv("NHWC", "HWIO", 1, 1, Order::RowMajor);
    let simplifier = AlgebraicSimplifier::new(SimplifierConfig::default(), AlwaysBitcast);

    assert!(!simplify(&mut c, &simplifier));
}

#[test]
fn test_convolution_kept_when_disabled() {
    let mut c = conv("NHWC", "HWIO", 1, 1, Order::RowMajor);
    let config = SimplifierConfig::builder().layout_sensitive(true).enable_conv_to_dot(false).build();

    assert!(!simplify(&mut c, &AlgebraicSimplifier::new(config, AlwaysBitcast)));
}

#[test]
fn test_convolution_kept_when_oracle_refuses() {
    let mut c = conv("NHWC", "HWIO", 1, 1, Order::RowMajor);

    assert!(!simplify(&mut c, &sensitive(NeverBitcast)));
}

#[test]
fn test_convolution_kept_when_only_output_bitcast_refused() {
    let mut c = conv("NHWC", "HWIO", 1, 1, Order::RowMajor);
    let refuse_rank_growth = |from: &Shape, to: &Shape| from.rank() >= to.rank();

    assert!(!simplify(&mut c, &sensitive(refuse_rank_growth)));
}

#[test]
fn test_wide_kernel_is_kept() {
    let mut c = conv("NHWC", "HWIO", 3, 1, Order::RowMajor);

    assert!(!simplify(&mut c, &sensitive(AlwaysBitcast)));
}

#[test]
fn test_strided_convolution_is_kept() {
    let mut c = conv("NHWC", "HWIO", 1, 2, Order::RowMajor);

    assert!(!simplify(&mut c, &sensitive(AlwaysBitcast)));
}
