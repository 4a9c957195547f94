//! Instruction arena with use/def edges and a root.
//!
//! A [`Computation`] owns its instructions in a slot arena addressed by
//! [`InstrId`]. Slots of removed instructions become tombstones so handles held
//! elsewhere (worklists, pending rewrites) can be checked with
//! [`Computation::contains`] instead of dangling.
//!
//! Every edge mutation keeps operand lists and user lists in sync:
//! `users(x)` is the deduplicated set of instructions listing `x` among their
//! operands.

use std::ops::Index;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::instruction::{InstrId, Instruction, Operands};
use crate::op::Op;
use crate::shape::Shape;

#[derive(Debug, Clone)]
pub struct Computation {
    name: String,
    slots: Vec<Option<Instruction>>,
    /// Live instructions in insertion order.
    order: Vec<InstrId>,
    root: Option<InstrId>,
    parameters: Vec<InstrId>,
}

impl Computation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), slots: Vec::new(), order: Vec::new(), root: None, parameters: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Instruction behind `id`, or `UnknownInstruction` if it was removed.
    pub fn instruction(&self, id: InstrId) -> Result<&Instruction> {
        self.get(id).context(UnknownInstructionSnafu { id })
    }

    pub fn contains(&self, id: InstrId) -> bool {
        self.get(id).is_some()
    }

    pub fn root(&self) -> Option<InstrId> {
        self.root
    }

    /// Root instruction, or `MissingRoot`.
    pub fn root_instruction(&self) -> Result<&Instruction> {
        let id = self.root.context(MissingRootSnafu { name: self.name.clone() })?;
        self.instruction(id)
    }

    pub fn is_root(&self, id: InstrId) -> bool {
        self.root == Some(id)
    }

    /// Live instruction handles in insertion order.
    pub fn instruction_order(&self) -> &[InstrId] {
        &self.order
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.order.iter().filter_map(|&id| self.get(id))
    }

    pub fn instruction_count(&self) -> usize {
        self.order.len()
    }

    /// Handle the next added instruction will receive.
    ///
    /// Handles are allocated in increasing order, so every instruction added
    /// after this call has a handle `>= next_id()`.
    pub fn next_id(&self) -> InstrId {
        InstrId(self.slots.len() as u32)
    }

    /// Live handles allocated at or after `since`, in allocation order.
    pub fn added_since(&self, since: InstrId) -> impl Iterator<Item = InstrId> + '_ {
        (since.0..self.slots.len() as u32).map(InstrId).filter(|&id| self.contains(id))
    }

    pub fn parameters(&self) -> &[InstrId] {
        &self.parameters
    }

    pub fn parameter(&self, number: usize) -> Option<InstrId> {
        self.parameters.get(number).copied()
    }

    /// Neither the root nor used by anything.
    pub fn is_dead(&self, id: InstrId) -> bool {
        self.get(id).is_some_and(|instr| instr.users.is_empty()) && !self.is_root(id)
    }

    /// Instructions reachable from the root, operands before users.
    pub fn post_order(&self) -> Vec<InstrId> {
        let Some(root) = self.root else { return Vec::new() };
        let mut visited = vec![false; self.slots.len()];
        let mut order = Vec::with_capacity(self.order.len());
        let mut stack: Vec<(InstrId, bool)> = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;
            stack.push((id, true));
            if let Some(instr) = self.get(id) {
                for &operand in instr.operands.iter().rev() {
                    if !visited[operand.index()] {
                        stack.push((operand, false));
                    }
                }
            }
        }
        order
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a new instruction and register it as a user of its operands.
    ///
    /// Shapes are taken as given; use [`ComputationBuilder`](crate::ComputationBuilder)
    /// or [`shape_inference`](crate::shape_inference) to derive them.
    pub fn add_instruction(&mut self, op: Op, shape: Shape, operands: impl IntoIterator<Item = InstrId>) -> Result<InstrId> {
        let operands: Operands = operands.into_iter().collect();
        for &operand in &operands {
            ensure!(self.contains(operand), UnknownInstructionSnafu { id: operand });
        }

        let id = self.next_id();
        if let Op::Parameter(number) = op {
            if self.parameters.len() <= number {
                self.parameters.resize(number + 1, id);
            }
            self.parameters[number] = id;
        }

        for &operand in &operands {
            self.add_user(operand, id);
        }

        let name = format!("{}.{}", op.name(), id.0);
        self.slots.push(Some(Instruction { id, name, op, shape, operands, users: SmallVec::new() }));
        self.order.push(id);
        Ok(id)
    }

    pub fn set_root(&mut self, id: InstrId) -> Result<()> {
        ensure!(self.contains(id), UnknownInstructionSnafu { id });
        self.root = Some(id);
        Ok(())
    }

    /// Point operand `index` of `user` at `new`, keeping user lists in sync.
    pub fn replace_operand(&mut self, user: InstrId, index: usize, new: InstrId) -> Result<()> {
        ensure!(self.contains(new), UnknownInstructionSnafu { id: new });
        let instr = self.slot_mut(user)?;
        let count = instr.operands.len();
        let old = *instr
            .operands
            .get(index)
            .context(OperandCountSnafu { op: instr.op.name(), expected: index + 1, actual: count })?;
        instr.operands[index] = new;
        let still_uses_old = instr.operands.contains(&old);
        if !still_uses_old {
            self.remove_user(old, user);
        }
        self.add_user(new, user);
        Ok(())
    }

    /// Retarget every use of `old` (operand edges and the root) to `new`.
    ///
    /// `new` itself is left untouched if it happens to use `old`.
    pub fn replace_all_uses(&mut self, old: InstrId, new: InstrId) -> Result<()> {
        ensure!(self.contains(new), UnknownInstructionSnafu { id: new });
        let users: SmallVec<[InstrId; 4]> = self.instruction(old)?.users.clone();
        for user in users {
            if user == new {
                continue;
            }
            let instr = self.slot_mut(user)?;
            for operand in instr.operands.iter_mut().filter(|o| **o == old) {
                *operand = new;
            }
            self.remove_user(old, user);
            self.add_user(new, user);
        }
        if self.root == Some(old) {
            self.root = Some(new);
        }
        Ok(())
    }

    /// Replace `old` by `new` everywhere and remove `old` together with any
    /// operands left without users.
    ///
    /// The shapes must be compatible (equal element type and dimensions).
    pub fn replace_instruction(&mut self, old: InstrId, new: InstrId) -> Result<()> {
        let old_shape = self.instruction(old)?.shape.clone();
        let new_shape = self.instruction(new)?.shape.clone();
        ensure!(
            old_shape.compatible(&new_shape),
            ReplacementShapeMismatchSnafu {
                old,
                new,
                old_shape: Box::new(old_shape),
                new_shape: Box::new(new_shape)
            }
        );
        if old == new {
            return Ok(());
        }
        self.replace_all_uses(old, new)?;
        self.remove_instruction_and_unused_operands(old)?;
        Ok(())
    }

    /// Remove `id` if it has no users and is not the root. Parameters are kept.
    ///
    /// Returns whether the instruction was removed.
    pub fn remove_if_dead(&mut self, id: InstrId) -> Result<bool> {
        let instr = self.instruction(id)?;
        if !instr.users.is_empty() || self.is_root(id) || instr.is_parameter() {
            return Ok(false);
        }
        self.remove_instruction(id)?;
        Ok(true)
    }

    /// Remove a dead `id` and then every operand that becomes dead as a result.
    ///
    /// Returns the number of removed instructions.
    pub fn remove_instruction_and_unused_operands(&mut self, id: InstrId) -> Result<usize> {
        let mut removed = 0;
        let mut worklist = vec![id];
        while let Some(id) = worklist.pop() {
            let Some(instr) = self.get(id) else { continue };
            let operands = instr.operands.clone();
            if self.remove_if_dead(id)? {
                removed += 1;
                worklist.extend(operands);
            }
        }
        Ok(removed)
    }

    /// Remove a userless, non-root instruction unconditionally (parameters included).
    pub fn remove_instruction(&mut self, id: InstrId) -> Result<()> {
        let instr = self.instruction(id)?;
        ensure!(instr.users.is_empty() && !self.is_root(id), InstructionLiveSnafu { id });
        let operands = instr.operands.clone();
        for operand in operands {
            self.remove_user(operand, id);
        }
        self.slots[id.index()] = None;
        self.order.retain(|&o| o != id);
        Ok(())
    }

    /// Check that user lists mirror operand lists and the root exists.
    pub fn verify_edges(&self) -> Result<()> {
        let root = self.root.context(MissingRootSnafu { name: self.name.clone() })?;
        ensure!(self.contains(root), UnknownInstructionSnafu { id: root });
        for instr in self.instructions() {
            for &operand in &instr.operands {
                let operand_instr = self.instruction(operand)?;
                ensure!(operand_instr.users.contains(&instr.id), VerifyUsersSnafu { id: operand });
            }
            for &user in &instr.users {
                let user_instr = self.instruction(user)?;
                ensure!(user_instr.operands.contains(&instr.id), VerifyUsersSnafu { id: instr.id });
            }
            let mut users = instr.users.clone();
            users.sort_unstable();
            users.dedup();
            ensure!(users.len() == instr.users.len(), VerifyUsersSnafu { id: instr.id });
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn slot_mut(&mut self, id: InstrId) -> Result<&mut Instruction> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut).context(UnknownInstructionSnafu { id })
    }

    fn add_user(&mut self, operand: InstrId, user: InstrId) {
        if let Some(Some(instr)) = self.slots.get_mut(operand.index())
            && !instr.users.contains(&user)
        {
            instr.users.push(user);
        }
    }

    fn remove_user(&mut self, operand: InstrId, user: InstrId) {
        if let Some(Some(instr)) = self.slots.get_mut(operand.index()) {
            instr.users.retain(|u| *u != user);
        }
    }
}

impl Index<InstrId> for Computation {
    type Output = Instruction;

    /// # Panics
    ///
    /// Panics if `id` was removed or belongs to another computation.
    fn index(&self, id: InstrId) -> &Instruction {
        match self.get(id) {
            Some(instr) => instr,
            None => panic!("{id} is not a live instruction of computation {}", self.name),
        }
    }
}
