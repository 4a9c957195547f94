//! Compact textual dumps of computations.
//!
//! ```text
//! computation add_zero {
//!   %0 = f32[2,3] parameter(0)
//!   %1 = f32[] constant(0.0)
//!   ROOT %2 = f32[2,3] add(%0, %1)
//! }
//! ```

use std::fmt::{self, Write};

use itertools::Itertools;

use crate::computation::Computation;
use crate::instruction::Instruction;
use crate::module::Module;
use crate::op::Op;

/// Payload of an op rendered as `key=value` attributes, empty when there is none.
fn attributes(op: &Op) -> String {
    match op {
        Op::Transpose { permutation } => format!("dimensions={{{}}}", permutation.iter().join(",")),
        Op::Broadcast { dimensions } | Op::Reverse { dimensions } => {
            format!("dimensions={{{}}}", dimensions.iter().join(","))
        }
        Op::Slice { starts, limits, strides } => format!(
            "slice={{{}}}",
            starts.iter().zip(limits).zip(strides).map(|((s, l), st)| format!("[{s}:{l}:{st}]")).join(",")
        ),
        Op::Concatenate { dimension } => format!("dimensions={{{dimension}}}"),
        Op::Pad { config } => format!(
            "padding={}",
            config.dimensions.iter().map(|d| format!("{}_{}_{}", d.low, d.high, d.interior)).join("x")
        ),
        Op::GetTupleElement { index } => format!("index={index}"),
        Op::Reduce { dimensions, reducer } => {
            format!("dimensions={{{}}}, to_apply={reducer}", dimensions.iter().join(","))
        }
        Op::ReduceWindow { window, reducer } => format!(
            "window={{size={}}}, to_apply={reducer}",
            window.dimensions.iter().map(|d| d.size).join("x")
        ),
        Op::Convolution { window, .. } => {
            format!("window={{size={}}}", window.dimensions.iter().map(|d| d.size).join("x"))
        }
        Op::Call { target } => format!("to_apply={target}"),
        _ => String::new(),
    }
}

fn write_instruction(f: &mut impl Write, computation: &Computation, instr: &Instruction) -> fmt::Result {
    let root = if computation.is_root(instr.id()) { "ROOT " } else { "" };
    write!(f, "  {root}{} = {} {}(", instr.id(), instr.shape(), instr.op().name())?;
    match instr.op() {
        Op::Parameter(n) => write!(f, "{n}")?,
        Op::Constant(literal) => write!(f, "{literal}")?,
        _ => write!(f, "{}", instr.operands().iter().join(", "))?,
    }
    write!(f, ")")?;
    let attributes = attributes(instr.op());
    if !attributes.is_empty() {
        write!(f, ", {attributes}")?;
    }
    writeln!(f)
}

impl fmt::Display for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "computation {} {{", self.name())?;
        for instr in self.instructions() {
            write_instruction(f, self, instr)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.name())?;
        for (id, computation) in self.computations() {
            let entry = if self.entry() == Some(id) { "ENTRY " } else { "" };
            writeln!(f, "{entry}{id} {computation}")?;
        }
        Ok(())
    }
}
