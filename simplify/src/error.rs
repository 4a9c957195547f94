use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Graph-layer failure while building or committing a rewrite.
    #[snafu(display("ir error: {source}"), context(false))]
    Ir { source: tessel_ir::Error },

    /// A pass still reported changes after the iteration cap.
    #[snafu(display("{pass} did not reach a fixpoint within {iterations} iterations"))]
    FixpointNotReached { pass: &'static str, iterations: usize },
}
