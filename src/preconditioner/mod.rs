//! Preconditioners for iterative solvers.

use crate::error::LinError;

/// A preconditioner M ≈ A: `apply` computes z ≈ M⁻¹ r.
pub trait Preconditioner<T> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r.
    fn apply(&self, r: &[T], z: &mut [T]) -> Result<(), LinError>;
}

pub mod jacobi;

pub use jacobi::Jacobi;
