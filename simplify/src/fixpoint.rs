//! Repeat a pass until it stops changing the module.

use tracing::debug;

use tessel_ir::Module;

use crate::error::*;
use crate::pass::Pass;

pub struct Fixpoint<P> {
    pass: P,
    max_iterations: usize,
}

impl<P: Pass> Fixpoint<P> {
    pub fn new(pass: P, max_iterations: usize) -> Self {
        Self { pass, max_iterations }
    }

    pub fn pass(&self) -> &P {
        &self.pass
    }

    /// Run sweeps until one reports no change.
    ///
    /// Returns the number of sweeps that changed the module, or
    /// [`Error::FixpointNotReached`] once `max_iterations` sweeps all changed it.
    #[tracing::instrument(skip_all, fields(pass = self.pass.name()))]
    pub fn run(&self, module: &mut Module) -> Result<usize> {
        for iteration in 0..self.max_iterations {
            if !self.pass.run(module)? {
                debug!(iterations = iteration, "fixpoint reached");
                return Ok(iteration);
            }
        }
        FixpointNotReachedSnafu { pass: self.pass.name(), iterations: self.max_iterations }.fail()
    }
}
