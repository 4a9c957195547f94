use tessel_ir::{ComputationId, Module};

use crate::error::Result;

/// A graph transformation run over the computations of a module.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Transform one computation, returning whether anything changed.
    fn run_on_computation(&self, module: &mut Module, computation: ComputationId) -> Result<bool>;

    /// Run over every computation present when the call starts.
    ///
    /// Computations added while running (for example new reducers) are not
    /// visited in this call.
    #[tracing::instrument(skip_all, fields(pass = self.name(), module = module.name()))]
    fn run(&self, module: &mut Module) -> Result<bool> {
        let mut changed = false;
        for id in module.computation_ids() {
            changed |= self.run_on_computation(module, id)?;
        }
        Ok(changed)
    }
}
