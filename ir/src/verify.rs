//! Structural and shape consistency checks.

use snafu::ensure;

use crate::computation::Computation;
use crate::error::*;
use crate::instruction::Instruction;
use crate::op::Op;
use crate::shape::Shape;
use crate::shape_inference as infer;

impl Computation {
    /// Check use/def edges and that every declared shape matches what its operands imply.
    ///
    /// Layouts are not compared: rewrites may assign any layout to results.
    pub fn verify(&self) -> Result<()> {
        self.verify_edges()?;
        for instr in self.instructions() {
            if let Some(inferred) = self.inferred_shape(instr)? {
                ensure!(
                    inferred.compatible(instr.shape()),
                    VerifyShapeMismatchSnafu {
                        id: instr.id(),
                        declared: Box::new(instr.shape().clone()),
                        inferred: Box::new(inferred)
                    }
                );
            }
        }
        Ok(())
    }

    /// Shape implied by operands, `None` for ops whose result shape is free (parameters, calls).
    fn inferred_shape(&self, instr: &Instruction) -> Result<Option<Shape>> {
        let operands = instr
            .operands()
            .iter()
            .map(|&id| self.instruction(id).map(Instruction::shape))
            .collect::<Result<Vec<_>>>()?;
        let arity = |expected: usize| -> Result<()> {
            ensure!(
                operands.len() == expected,
                OperandCountSnafu { op: instr.op().name(), expected, actual: operands.len() }
            );
            Ok(())
        };
        let declared = instr.shape();

        let shape = match instr.op() {
            Op::Parameter(_) | Op::Call { .. } => return Ok(None),
            Op::Constant(literal) => literal.shape().clone(),
            Op::Unary(op) => {
                arity(1)?;
                infer::unary(*op, operands[0])?
            }
            Op::Binary(op) => {
                arity(2)?;
                infer::binary(*op, operands[0], operands[1])?
            }
            Op::Clamp => {
                arity(3)?;
                infer::clamp(operands[0], operands[1], operands[2])?
            }
            Op::Select => {
                arity(3)?;
                infer::select(operands[0], operands[1], operands[2])?
            }
            Op::Convert => {
                arity(1)?;
                infer::convert(operands[0], declared.dtype())?
            }
            Op::Copy => {
                arity(1)?;
                operands[0].without_layout()
            }
            Op::Bitcast | Op::Reshape => {
                arity(1)?;
                infer::reshape(operands[0], declared.dims())?
            }
            Op::Transpose { permutation } => {
                arity(1)?;
                infer::transpose(operands[0], permutation)?
            }
            Op::Broadcast { dimensions } => {
                arity(1)?;
                infer::broadcast(operands[0], declared.dims(), dimensions)?
            }
            Op::Slice { starts, limits, strides } => {
                arity(1)?;
                infer::slice(operands[0], starts, limits, strides)?
            }
            Op::Concatenate { dimension } => infer::concatenate(&operands, *dimension)?,
            Op::Pad { config } => {
                arity(2)?;
                infer::pad(operands[0], operands[1], config)?
            }
            Op::Reverse { dimensions } => {
                arity(1)?;
                infer::reverse(operands[0], dimensions)?
            }
            Op::Tuple => infer::tuple(&operands),
            Op::GetTupleElement { index } => {
                arity(1)?;
                infer::get_tuple_element(operands[0], *index)?
            }
            Op::Dot => {
                arity(2)?;
                infer::dot(operands[0], operands[1])?
            }
            Op::Convolution { window, dimension_numbers } => {
                arity(2)?;
                infer::convolution(operands[0], operands[1], window, dimension_numbers)?
            }
            Op::Reduce { dimensions, .. } => {
                arity(2)?;
                infer::reduce(operands[0], operands[1], dimensions)?
            }
            Op::ReduceWindow { window, .. } => {
                arity(2)?;
                infer::reduce_window(operands[0], operands[1], window)?
            }
        };
        Ok(Some(shape))
    }
}
