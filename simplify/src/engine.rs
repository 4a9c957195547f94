//! The algebraic simplifier driver.
//!
//! One call performs a single sweep over a computation:
//!
//! 1. Snapshot the instruction order into a worklist.
//! 2. For each live, non-dead instruction, try the catalog's rules for its
//!    kind in order; the first match wins and is committed.
//! 3. Instructions created by a committed rewrite are appended to the
//!    worklist, so they are matched later in the same sweep, exactly once.
//!
//! A sweep is not a fixpoint: wrap the simplifier in [`Fixpoint`](crate::Fixpoint)
//! to converge.

use tracing::{debug, trace};

use tessel_ir::{ComputationId, InstrId, Module};

use crate::catalog::{RewriteResult, rules_for};
use crate::config::SimplifierConfig;
use crate::context::RewriteContext;
use crate::error::Result;
use crate::oracle::BitcastOracle;
use crate::pass::Pass;

/// Worklist visits allowed per instruction present at the start of a sweep.
const MAX_VISITS_PER_INSTRUCTION: usize = 64;

pub struct AlgebraicSimplifier {
    config: SimplifierConfig,
    oracle: Box<dyn BitcastOracle>,
}

impl AlgebraicSimplifier {
    pub fn new(config: SimplifierConfig, oracle: impl BitcastOracle + 'static) -> Self {
        Self { config, oracle: Box::new(oracle) }
    }

    pub fn config(&self) -> &SimplifierConfig {
        &self.config
    }

    /// Try the rules for `id` and commit the first match.
    fn simplify_instruction(&self, module: &mut Module, computation: ComputationId, id: InstrId) -> Result<bool> {
        let key = module[computation][id].key();
        let mut ctx = RewriteContext::new(module, computation, &self.config, self.oracle.as_ref());

        for rule in rules_for(key) {
            match (rule.apply)(&mut ctx, id)? {
                RewriteResult::NoMatch => continue,
                RewriteResult::Rewritten(replacement) => {
                    trace!(rule = rule.name, instr = %id, replacement = %replacement, "rule matched");
                    ctx.replace(id, replacement)?;
                    return Ok(true);
                }
                RewriteResult::Rewired => {
                    trace!(rule = rule.name, instr = %id, "rule rewired users");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Pass for AlgebraicSimplifier {
    fn name(&self) -> &'static str {
        "algebraic-simplifier"
    }

    #[tracing::instrument(skip_all, fields(computation = %computation, layout_sensitive = self.config.layout_sensitive))]
    fn run_on_computation(&self, module: &mut Module, computation: ComputationId) -> Result<bool> {
        let mut worklist = module.computation(computation)?.instruction_order().to_vec();
        let max_visits = (worklist.len() + 1) * MAX_VISITS_PER_INSTRUCTION;
        let mut changed = false;
        let mut rewrites = 0usize;
        let mut cursor = 0;

        while let Some(&id) = worklist.get(cursor) {
            cursor += 1;
            if cursor > max_visits {
                panic!(
                    "Simplifier visit limit ({}) exceeded in {}: a rule keeps creating work. Worklist size: {}",
                    max_visits,
                    computation,
                    worklist.len()
                );
            }

            let current = &module[computation];
            if !current.contains(id) || current.is_dead(id) {
                continue;
            }

            let watermark = current.next_id();
            if self.simplify_instruction(module, computation, id)? {
                changed = true;
                rewrites += 1;
                worklist.extend(module[computation].added_since(watermark));
            }
        }

        debug!(rewrites, visited = cursor, "simplifier sweep finished");
        Ok(changed)
    }
}
