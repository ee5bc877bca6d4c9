// Jacobi (diagonal) preconditioner

use crate::core::traits::Diagonal;
use crate::error::LinError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Jacobi preconditioner: M⁻¹ = D⁻¹, read off the operator's diagonal.
///
/// Coordinates with a zero diagonal entry fall back to the identity
/// transform, so the preconditioner is always applicable.
pub struct Jacobi<T> {
    inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// Build from the diagonal of `a`.
    pub fn new<M: Diagonal<T> + ?Sized>(a: &M) -> Self {
        let inv_diag = a
            .diag()
            .into_iter()
            .map(|d| if d != T::zero() { T::one() / d } else { T::one() })
            .collect();
        Self { inv_diag }
    }
}

impl<T: Float> Preconditioner<T> for Jacobi<T> {
    fn apply(&self, r: &[T], z: &mut [T]) -> Result<(), LinError> {
        if r.len() != self.inv_diag.len() || z.len() != self.inv_diag.len() {
            return Err(LinError::DimensionMismatch {
                expected: (self.inv_diag.len(), 1),
                found: (r.len(), 1),
            });
        }
        for i in 0..r.len() {
            z[i] = self.inv_diag[i] * r[i];
        }
        Ok(())
    }
}
