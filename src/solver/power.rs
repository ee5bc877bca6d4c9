//! Power iteration eigensolver.
//!
//! Finds the eigenvalue of largest magnitude and its eigenvector for a
//! square operator defined only through its matrix-vector product. An
//! optional spectral shift `p` iterates on `A − pI` to widen the gap
//! between the dominant and second eigenvalue, and the un-shifted value
//! `λ + p` is returned.

use crate::core::traits::Operator;
use crate::error::LinError;
use num_traits::{Float, ToPrimitive};
use log::{debug, info, warn};

/// Dominant-eigenpair extraction with optional spectral shift.
pub struct PowerIteration<T> {
    shift: T,
    tol: T,
    max_iters: usize,
}

/// Outcome of a power iteration run.
///
/// `converged == false` means the iteration cap was reached; `eigenvalue`
/// still holds the last estimate (soft non-convergence).
#[derive(Clone, Debug)]
pub struct PowerStats<T> {
    pub eigenvalue: T,
    pub iterations: usize,
    pub converged: bool,
}

impl<T: Float + From<f64>> PowerIteration<T> {
    /// Create a solver with the given shift, tolerance, and iteration cap.
    pub fn new(shift: T, tol: T, max_iters: usize) -> Result<Self, LinError> {
        if tol <= T::zero() {
            return Err(LinError::InvalidArgument(
                "tolerance must be positive".into(),
            ));
        }
        if max_iters == 0 {
            return Err(LinError::InvalidArgument(
                "maximum iterations must be positive".into(),
            ));
        }
        Ok(Self {
            shift,
            tol,
            max_iters,
        })
    }

    /// Run the iteration. `v` holds the nonzero initial guess on entry and
    /// the (normalized) dominant eigenvector on return.
    pub fn eigen<M: Operator<T>>(&self, a: &M, v: &mut Vec<T>) -> Result<PowerStats<T>, LinError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, n),
                found: (n, a.ncols()),
            });
        }
        if v.len() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, 1),
                found: (v.len(), 1),
            });
        }

        let n_t: T = (n as f64).into();
        let tol = self.tol.max(T::epsilon() * n_t);
        let p = self.shift;

        let mut y = vec![T::zero(); n];
        let mut lambda = shifted_step(a, v, &mut y, p);

        for iter in 1..=self.max_iters {
            let last = lambda;
            lambda = shifted_step(a, v, &mut y, p);

            let eps = (lambda - last).abs();
            if iter % 10 == 0 {
                debug!(
                    "power iteration: estimate after {} iterations: {:.4e}",
                    iter,
                    (lambda + p).to_f64().unwrap_or(f64::NAN)
                );
            }

            if eps < tol {
                info!(
                    "power iteration: converged after {} iterations to {:.4e}",
                    iter,
                    (lambda + p).to_f64().unwrap_or(f64::NAN)
                );
                return Ok(PowerStats {
                    eigenvalue: lambda + p,
                    iterations: iter,
                    converged: true,
                });
            }
        }

        warn!("power iteration: reached the iteration cap without converging");
        Ok(PowerStats {
            eigenvalue: lambda + p,
            iterations: self.max_iters,
            converged: false,
        })
    }
}

/// One sweep: y = (A − pI) x, estimate = the entry of y largest in
/// magnitude (kept signed), then x ← y / estimate.
fn shifted_step<M, T>(a: &M, x: &mut Vec<T>, y: &mut Vec<T>, p: T) -> T
where
    M: Operator<T>,
    T: Float,
{
    a.matvec(x, y);

    if p != T::zero() {
        for i in 0..y.len() {
            y[i] = y[i] - p * x[i];
        }
    }

    let mut lambda = y[0];
    for i in 1..y.len() {
        if y[i].abs() > lambda.abs() {
            lambda = y[i];
        }
    }

    for i in 0..y.len() {
        x[i] = y[i] / lambda;
    }

    lambda
}

/// Run power iteration with no shift, a size-scaled default tolerance of
/// `max(1e-6, n·ε)`, and an iteration cap of `max(20, 2n)`.
pub fn eigen<M, T>(a: &M, v: &mut Vec<T>) -> Result<PowerStats<T>, LinError>
where
    M: Operator<T>,
    T: Float + From<f64>,
{
    let n = a.nrows();
    let n_t: T = (n as f64).into();
    let floor: T = 1e-6.into();
    let tol = floor.max(T::epsilon() * n_t);
    let solver = PowerIteration::new(T::zero(), tol, 20.max(2 * n))?;
    solver.eigen(a, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;
    use approx::assert_abs_diff_eq;

    // Eigenvalues 6, 3, 1 with eigenvectors e-ish directions after a
    // similarity-free diagonal-plus-coupling construction.
    fn dominant_matrix() -> Mat<f64> {
        Mat::from_fn(3, 3, |i, j| match (i, j) {
            (0, 0) => 6.0,
            (1, 1) => 3.0,
            (2, 2) => 1.0,
            (0, 1) | (1, 0) => 0.5,
            _ => 0.0,
        })
    }

    #[test]
    fn finds_dominant_eigenvalue() {
        let a = dominant_matrix();
        let mut v = vec![1.0, 1.0, 1.0];
        let stats = eigen(&a, &mut v).unwrap();
        assert!(stats.converged);
        // Largest root of the 2x2 coupled block: (9 + sqrt(10)) / 2.
        let expected = (9.0 + 10.0_f64.sqrt()) / 2.0;
        assert_abs_diff_eq!(stats.eigenvalue, expected, epsilon = 1e-4);
        // Residual check: A v ≈ λ v for the returned vector.
        use crate::core::traits::MatVec;
        let mut av = vec![0.0; 3];
        let v_owned = v.clone();
        a.matvec(&v_owned, &mut av);
        for i in 0..3 {
            assert_abs_diff_eq!(av[i], stats.eigenvalue * v[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn invariant_under_initial_rescaling() {
        let a = dominant_matrix();
        let mut v1 = vec![1.0, 1.0, 1.0];
        let mut v2 = vec![100.0, 100.0, 100.0];
        let s1 = eigen(&a, &mut v1).unwrap();
        let s2 = eigen(&a, &mut v2).unwrap();
        assert_abs_diff_eq!(s1.eigenvalue, s2.eigenvalue, epsilon = 1e-8);
    }

    #[test]
    fn shift_returns_unshifted_value() {
        let a = dominant_matrix();
        let expected = (9.0 + 10.0_f64.sqrt()) / 2.0;
        let solver = PowerIteration::new(1.0, 1e-10, 500).unwrap();
        let mut v = vec![1.0, 1.0, 1.0];
        let stats = solver.eigen(&a, &mut v).unwrap();
        assert!(stats.converged);
        assert_abs_diff_eq!(stats.eigenvalue, expected, epsilon = 1e-6);
    }

    #[test]
    fn rejects_non_square() {
        let a = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
        let mut v = vec![1.0; 3];
        assert!(eigen(&a, &mut v).is_err());
    }

    #[test]
    fn cap_exhaustion_is_soft() {
        let a = dominant_matrix();
        let solver = PowerIteration::new(0.0, 1e-300, 2).unwrap();
        let mut v = vec![1.0, 1.0, 1.0];
        let stats = solver.eigen(&a, &mut v).unwrap();
        assert!(!stats.converged);
        assert_eq!(stats.iterations, 2);
    }
}
