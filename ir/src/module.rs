//! Append-only arena of computations.
//!
//! Computations are never removed or reordered, so a [`ComputationId`] stays
//! valid for the module's lifetime and a snapshot of
//! [`Module::computation_ids`] can be iterated while passes add new embedded
//! computations.

use std::fmt;
use std::ops::Index;

use snafu::OptionExt;

use crate::computation::Computation;
use crate::error::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(pub(crate) u32);

impl ComputationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    computations: Vec<Computation>,
    entry: Option<ComputationId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), computations: Vec::new(), entry: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add the computation the module evaluates.
    pub fn add_entry_computation(&mut self, computation: Computation) -> ComputationId {
        let id = self.push(computation);
        self.entry = Some(id);
        id
    }

    /// Add a computation referenced by instructions (reducers, call targets).
    pub fn add_embedded_computation(&mut self, computation: Computation) -> ComputationId {
        self.push(computation)
    }

    pub fn entry(&self) -> Option<ComputationId> {
        self.entry
    }

    pub fn entry_computation(&self) -> Option<&Computation> {
        self.entry.and_then(|id| self.computations.get(id.index()))
    }

    pub fn get(&self, id: ComputationId) -> Option<&Computation> {
        self.computations.get(id.index())
    }

    pub fn computation(&self, id: ComputationId) -> Result<&Computation> {
        self.get(id).context(UnknownComputationSnafu { id })
    }

    pub fn computation_mut(&mut self, id: ComputationId) -> Result<&mut Computation> {
        self.computations.get_mut(id.index()).context(UnknownComputationSnafu { id })
    }

    /// Snapshot of every computation handle, in insertion order.
    pub fn computation_ids(&self) -> Vec<ComputationId> {
        (0..self.computations.len() as u32).map(ComputationId).collect()
    }

    pub fn computation_count(&self) -> usize {
        self.computations.len()
    }

    pub fn computations(&self) -> impl Iterator<Item = (ComputationId, &Computation)> + '_ {
        self.computations.iter().enumerate().map(|(i, c)| (ComputationId(i as u32), c))
    }

    fn push(&mut self, computation: Computation) -> ComputationId {
        let id = ComputationId(self.computations.len() as u32);
        self.computations.push(computation);
        id
    }
}

impl Index<ComputationId> for Module {
    type Output = Computation;

    /// # Panics
    ///
    /// Panics if `id` belongs to another module.
    fn index(&self, id: ComputationId) -> &Computation {
        match self.get(id) {
            Some(computation) => computation,
            None => panic!("{id} is not a computation of module {}", self.name),
        }
    }
}
