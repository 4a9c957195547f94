//! Algebraic simplification of tessel computations.
//!
//! The simplifier rewrites a computation into an algebraically and
//! structurally simpler equivalent: identity operations disappear, chains of
//! shape transforms fuse, constant structure folds into neighbors, and a few
//! specialized patterns (1x1 convolutions, vector dots) are lowered to
//! cheaper forms.
//!
//! ```
//! use tessel_ir::{ComputationBuilder, DType, Literal, Module, Shape};
//! use tessel_simplify::{AlgebraicSimplifier, NeverBitcast, Pass, SimplifierConfig};
//!
//! let mut b = ComputationBuilder::new("add_zero");
//! let a = b.parameter(0, Shape::array(DType::Float32, [2, 3])).unwrap();
//! let zero = b.constant(Literal::r0(0.0f32)).unwrap();
//! let sum = b.add(a, zero).unwrap();
//!
//! let mut module = Module::new("m");
//! let entry = module.add_entry_computation(b.build(sum).unwrap());
//!
//! let simplifier = AlgebraicSimplifier::new(SimplifierConfig::default(), NeverBitcast);
//! assert!(simplifier.run(&mut module).unwrap());
//! assert_eq!(module[entry].root(), Some(a));
//! ```
//!
//! # Module Organization
//!
//! - [`engine`] - The sweep driver
//! - [`catalog`] - Rules per operation kind, in precedence order
//! - [`rules`] - The rewrites themselves
//! - [`context`] - Graph access and construction for rules
//! - [`oracle`] - Target bitcast admission
//! - [`fixpoint`] - Repeating a pass until it converges

pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fixpoint;
pub mod oracle;
pub mod pass;
pub mod rules;


pub use catalog::{RewriteResult, Rule, rules_for};
pub use config::SimplifierConfig;
pub use context::RewriteContext;
pub use engine::AlgebraicSimplifier;
pub use error::{Error, Result};
pub use fixpoint::Fixpoint;
pub use oracle::{AlwaysBitcast, BitcastOracle, NeverBitcast};
pub use pass::Pass;

/// Simplify `module` until no rule applies, using the configuration's sweep cap.
pub fn simplify_to_fixpoint(
    module: &mut tessel_ir::Module,
    config: SimplifierConfig,
    oracle: impl BitcastOracle + 'static,
) -> Result<usize> {
    let max_iterations = config.max_fixpoint_iterations;
    Fixpoint::new(AlgebraicSimplifier::new(config, oracle), max_iterations).run(module)
}
