use std::fmt;

use smallvec::SmallVec;

use crate::op::{Op, OpKey};
use crate::shape::Shape;

/// Stable handle of an instruction inside its computation's arena.
///
/// Handles are never reused: a removed instruction leaves a tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub(crate) u32);

impl InstrId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

pub type Operands = SmallVec<[InstrId; 2]>;

/// One node of a computation.
///
/// Operands and users are arena handles owned by the computation; users are
/// kept deduplicated and updated by every edge mutation.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub(crate) id: InstrId,
    pub(crate) name: String,
    pub(crate) op: Op,
    pub(crate) shape: Shape,
    pub(crate) operands: Operands,
    pub(crate) users: SmallVec<[InstrId; 4]>,
}

impl Instruction {
    pub fn id(&self) -> InstrId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn key(&self) -> OpKey {
        self.op.key()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn operands(&self) -> &[InstrId] {
        &self.operands
    }

    pub fn operand(&self, i: usize) -> InstrId {
        self.operands[i]
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    pub fn users(&self) -> &[InstrId] {
        &self.users
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.op, Op::Parameter(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.op, Op::Constant(_))
    }
}
