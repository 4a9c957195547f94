//! Rule catalog keyed by operation kind.
//!
//! Each kind maps to a fixed, ordered list of rules; the driver tries them in
//! order and the first match wins. The match over [`OpKey`] is exhaustive so a
//! new operation kind must be given a (possibly empty) rule list here.

use tessel_ir::{BinaryOp, InstrId, OpKey, UnaryOp};

use crate::context::RewriteContext;
use crate::error::Result;
use crate::rules::{arithmetic, bitcast, conv, dot, movement, pad, structural};

/// Outcome of trying a rule on one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteResult {
    /// Pattern did not match; nothing was created.
    NoMatch,
    /// The instruction should be replaced by the given (existing or new) instruction.
    Rewritten(InstrId),
    /// The rule rewired users of the instruction itself through [`RewriteContext::replace`].
    Rewired,
}

pub type RuleFn = fn(&mut RewriteContext<'_>, InstrId) -> Result<RewriteResult>;

/// A named rewrite.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! rules {
    ($($name:literal => $apply:path),* $(,)?) => {
        &[$(Rule { name: $name, apply: $apply }),*]
    };
}

static ADD: &[Rule] = rules! {
    "add-zero" => arithmetic::add_zero,
};

static SUBTRACT: &[Rule] = rules! {
    "subtract-zero" => arithmetic::subtract_zero,
};

static MULTIPLY: &[Rule] = rules! {
    "multiply-one" => arithmetic::multiply_one,
    "exp-times-exp" => arithmetic::exp_times_exp,
};

static DIVIDE: &[Rule] = rules! {
    "divide-one" => arithmetic::divide_one,
    "exp-over-exp" => arithmetic::exp_over_exp,
    "divide-by-exp" => arithmetic::divide_by_exp,
    "divide-by-power" => arithmetic::divide_by_power,
    "divide-divide" => arithmetic::divide_divide,
    "divide-of-divide" => arithmetic::divide_of_divide,
    "divide-by-divide" => arithmetic::divide_by_divide,
};

static POWER: &[Rule] = rules! {
    "power-zero" => arithmetic::power_zero,
    "power-one" => arithmetic::power_one,
    "power-of-exp" => arithmetic::power_of_exp,
    "power-two" => arithmetic::power_two,
    "power-minus-one" => arithmetic::power_minus_one,
};

static MAXIMUM: &[Rule] = rules! {
    "max-of-min-to-clamp" => arithmetic::max_of_min_to_clamp,
};

static MINIMUM: &[Rule] = rules! {
    "min-of-max-to-clamp" => arithmetic::min_of_max_to_clamp,
};

static LOG: &[Rule] = rules! {
    "log-of-exp" => arithmetic::log_of_exp,
    "log-of-power" => arithmetic::log_of_power,
};

static COPY: &[Rule] = rules! {
    "copy-of-copy" => structural::copy_of_copy,
    "copy-noop" => structural::copy_noop,
};

static CONVERT: &[Rule] = rules! {
    "convert-noop" => structural::convert_noop,
};

static REVERSE: &[Rule] = rules! {
    "reverse-degenerate" => structural::reverse_degenerate,
};

static GET_TUPLE_ELEMENT: &[Rule] = rules! {
    "get-tuple-element-of-tuple" => structural::get_tuple_element_of_tuple,
};

static CONCATENATE: &[Rule] = rules! {
    "concatenate-single" => structural::concatenate_single,
    "concatenate-drop-empty" => structural::concatenate_drop_empty,
    "concatenate-broadcast-to-pad" => structural::concatenate_broadcast_to_pad,
};

static SLICE: &[Rule] = rules! {
    "slice-noop" => structural::slice_noop,
    "slice-of-scalar-broadcast" => movement::slice_of_scalar_broadcast,
};

static RESHAPE: &[Rule] = rules! {
    "reshape-noop" => structural::reshape_noop,
    "reshape-of-reshape" => movement::reshape_of_reshape,
    "reshape-of-scalar-broadcast" => movement::reshape_of_scalar_broadcast,
    "reshape-of-broadcast" => movement::reshape_of_broadcast,
    "reshape-sinking" => movement::sink_reshape,
    "reshape-to-bitcast" => bitcast::reshape_to_bitcast,
};

static TRANSPOSE: &[Rule] = rules! {
    "transpose-identity" => structural::transpose_identity,
    "transpose-of-transpose" => movement::transpose_of_transpose,
    "transpose-of-scalar-broadcast" => movement::transpose_of_scalar_broadcast,
    "transpose-to-bitcast" => bitcast::transpose_to_bitcast,
};

static BROADCAST: &[Rule] = rules! {
    "broadcast-to-reshape" => movement::broadcast_to_reshape,
    "broadcast-to-transpose" => movement::broadcast_to_transpose,
    "broadcast-of-reshape" => movement::broadcast_of_reshape,
};

static PAD: &[Rule] = rules! {
    "pad-noop" => pad::pad_noop,
    "pad-negative-to-slice" => pad::negative_pad_to_slice,
};

static REDUCE_WINDOW: &[Rule] = rules! {
    "fold-pad-into-reduce-window" => pad::fold_pad_into_reduce_window,
};

static CONVOLUTION: &[Rule] = rules! {
    "convolution-to-dot" => conv::convolution_to_dot,
};

static DOT: &[Rule] = rules! {
    "dot-zero-elements" => dot::dot_zero_elements,
    "dot-of-transposes" => dot::dot_of_transposes,
    "vector-dot-to-reduce" => dot::vector_dot_to_reduce,
};

static NONE: &[Rule] = &[];

/// Rules for instructions of the given kind, in precedence order.
pub fn rules_for(key: OpKey) -> &'static [Rule] {
    match key {
        OpKey::Binary(op) => match op {
            BinaryOp::Add => ADD,
            BinaryOp::Subtract => SUBTRACT,
            BinaryOp::Multiply => MULTIPLY,
            BinaryOp::Divide => DIVIDE,
            BinaryOp::Power => POWER,
            BinaryOp::Maximum => MAXIMUM,
            BinaryOp::Minimum => MINIMUM,
            BinaryOp::Remainder
            | BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::And
            | BinaryOp::Or => NONE,
        },
        OpKey::Unary(op) => match op {
            UnaryOp::Log => LOG,
            UnaryOp::Negate
            | UnaryOp::Abs
            | UnaryOp::Sign
            | UnaryOp::Exp
            | UnaryOp::Sqrt
            | UnaryOp::Tanh
            | UnaryOp::Floor
            | UnaryOp::Ceil
            | UnaryOp::Not => NONE,
        },
        OpKey::Copy => COPY,
        OpKey::Convert => CONVERT,
        OpKey::Reverse => REVERSE,
        OpKey::GetTupleElement => GET_TUPLE_ELEMENT,
        OpKey::Concatenate => CONCATENATE,
        OpKey::Slice => SLICE,
        OpKey::Reshape => RESHAPE,
        OpKey::Transpose => TRANSPOSE,
        OpKey::Broadcast => BROADCAST,
        OpKey::Pad => PAD,
        OpKey::ReduceWindow => REDUCE_WINDOW,
        OpKey::Convolution => CONVOLUTION,
        OpKey::Dot => DOT,
        OpKey::Parameter
        | OpKey::Constant
        | OpKey::Clamp
        | OpKey::Select
        | OpKey::Bitcast
        | OpKey::Tuple
        | OpKey::Reduce
        | OpKey::Call => NONE,
    }
}
