//! Rewrite rules, grouped by the kind of reasoning they need.
//!
//! - [`arithmetic`] - Algebraic identities over element-wise arithmetic
//! - [`structural`] - No-op elimination
//! - [`movement`] - Fusion of reshape, transpose, broadcast and slice chains
//! - [`bitcast`] - Layout-preserving reshapes and transposes as bitcasts
//! - [`pad`] - Negative padding and pad folding into reduce-window
//! - [`conv`] - Convolutions that are matrix multiplies
//! - [`dot`] - Dot strength reduction
//!
//! Every rule has the signature [`RuleFn`](crate::catalog::RuleFn) and creates
//! instructions only once it has decided to match.

pub mod arithmetic;
pub mod bitcast;
pub mod conv;
pub mod dot;
pub mod helpers;
pub mod movement;
pub mod pad;
pub mod structural;
