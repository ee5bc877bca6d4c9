//! Convergence tracking & tolerance checks for iterative solvers.

use crate::error::LinError;
use num_traits::Float;

/// Stop-test selector for the biconjugate gradient solver.
///
/// Matches the classic four-mode convention:
/// 1. `‖r‖ / ‖b‖`
/// 2. `‖M⁻¹ r‖ / ‖M⁻¹ b‖` (preconditioned residual ratio)
/// 3. solution-increment estimate in L2
/// 4. solution-increment estimate in L∞
///
/// Modes 3 and 4 fall back to the mode-2 ratio whenever the increment
/// estimate is numerically unstable; the fallback only reports, it never
/// stops the iteration early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceTest {
    Residual,
    PreconditionedResidual,
    IncrementL2,
    IncrementLinf,
}

impl ConvergenceTest {
    /// Resolve the 1-based selector index used by the classic interface.
    pub fn from_index(index: usize) -> Result<Self, LinError> {
        match index {
            1 => Ok(ConvergenceTest::Residual),
            2 => Ok(ConvergenceTest::PreconditionedResidual),
            3 => Ok(ConvergenceTest::IncrementL2),
            4 => Ok(ConvergenceTest::IncrementLinf),
            _ => Err(LinError::InvalidArgument(format!(
                "convergence test selector out of range 1..=4: {index}"
            ))),
        }
    }

    /// The norm this test measures vectors in: L∞ for mode 4, L2 otherwise.
    pub(crate) fn norm<T: Float>(&self, x: &[T]) -> T {
        match self {
            ConvergenceTest::IncrementLinf => norm_inf(x),
            _ => norm2(x),
        }
    }
}

/// Euclidean norm of a slice.
pub fn norm2<T: Float>(x: &[T]) -> T {
    x.iter()
        .map(|v| *v * *v)
        .fold(T::zero(), |acc, v| acc + v)
        .sqrt()
}

/// L∞ norm of a slice.
pub fn norm_inf<T: Float>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, v| acc.max(v.abs()))
}

/// Stopping criteria shared by the iterative algorithms.
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

/// Outcome of an iterative solve.
///
/// `converged == false` after a successful call is the soft
/// non-convergence case: the iteration cap was reached and the caller
/// decides whether `final_residual` is acceptable.
#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
}
