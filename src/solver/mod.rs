//! Iterative solver interfaces.

use crate::preconditioner::Preconditioner;
use crate::utils::convergence::SolveStats;

/// Common interface for iterative linear solvers.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd;

    /// Solve A·x = b, improving `x` in place.
    ///
    /// `pc` is an optional preconditioner; `None` selects the solver's
    /// default. Returns iteration stats; soft non-convergence is reported
    /// through `SolveStats::converged`, not as an error.
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<Self::Scalar>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<Self::Scalar>, Self::Error>;
}

pub mod bicg;
pub use bicg::BiCgSolver;

pub mod power;
pub use power::{PowerIteration, PowerStats};
