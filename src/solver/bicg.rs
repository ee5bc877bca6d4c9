//! Preconditioned biconjugate gradient solver.
//!
//! Solves A·x = b for a general, possibly non-symmetric operator using
//! paired primal/shadow residual and search-direction sequences, requiring
//! only matrix-vector and transpose products. No factorization of A is
//! performed, so the operator may be implicit.

use crate::core::traits::{InnerProduct, Operator};
use crate::error::LinError;
use crate::preconditioner::{Jacobi, Preconditioner};
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, ConvergenceTest, SolveStats};
use log::{debug, info, warn};
use num_traits::{Float, ToPrimitive};

/// Biconjugate gradient solver with selectable stop test.
pub struct BiCgSolver<T> {
    conv: Convergence<T>,
    test: ConvergenceTest,
}

impl<T: Float> BiCgSolver<T> {
    /// Create a solver. Fails fast on a non-positive tolerance or a zero
    /// iteration cap; out-of-range stop-test selectors are rejected by
    /// [`ConvergenceTest::from_index`].
    pub fn new(tol: T, test: ConvergenceTest, max_iters: usize) -> Result<Self, LinError> {
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
            conv: Convergence { tol, max_iters },
            test,
        })
    }
}

impl<M, T> LinearSolver<M, Vec<T>> for BiCgSolver<T>
where
    M: Operator<T>,
    T: Float + From<f64> + Send + Sync,
{
    type Error = LinError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<T>>,
        b: &Vec<T>,
        x: &mut Vec<T>,
    ) -> Result<SolveStats<T>, LinError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, n),
                found: (n, a.ncols()),
            });
        }
        if b.len() != n || x.len() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, 1),
                found: (b.len(), 1),
            });
        }

        let jacobi;
        let pc: &dyn Preconditioner<T> = match pc {
            Some(p) => p,
            None => {
                jacobi = Jacobi::new(a);
                &jacobi
            }
        };

        let ip = ();
        let test = self.test;
        let tol = self.conv.tol;
        let half: T = 0.5.into();

        let mut p = vec![T::zero(); n];
        let mut pp = vec![T::zero(); n];
        let mut r = vec![T::zero(); n];
        let mut rr = vec![T::zero(); n];
        let mut z = vec![T::zero(); n];
        let mut zz = vec![T::zero(); n];

        a.matvec(x, &mut r);
        for j in 0..n {
            r[j] = b[j] - r[j];
            rr[j] = r[j];
        }

        // znrm only participates in the increment tests (3/4).
        let bnrm;
        let mut znrm = T::zero();
        match test {
            ConvergenceTest::Residual => {
                bnrm = test.norm(b);
                pc.apply(&r, &mut z)?;
            }
            ConvergenceTest::PreconditionedResidual => {
                pc.apply(b, &mut z)?;
                bnrm = test.norm(&z);
                pc.apply(&r, &mut z)?;
            }
            ConvergenceTest::IncrementL2 | ConvergenceTest::IncrementLinf => {
                pc.apply(b, &mut z)?;
                bnrm = test.norm(&z);
                pc.apply(&r, &mut z)?;
                znrm = test.norm(&z);
            }
        }

        let mut bkden = T::one();
        let mut err = T::zero();
        let mut iterations = 0;
        let mut converged = false;

        for iter in 1..=self.conv.max_iters {
            iterations = iter;
            pc.apply(&rr, &mut zz)?;

            let bknum = ip.dot(&z, &rr);
            if iter == 1 {
                p.copy_from_slice(&z);
                pp.copy_from_slice(&zz);
            } else {
                let bk = bknum / bkden;
                for j in 0..n {
                    p[j] = bk * p[j] + z[j];
                    pp[j] = bk * pp[j] + zz[j];
                }
            }
            bkden = bknum;

            // z and zz double as the A·p / Aᵀ·pp scratch buffers until the
            // preconditioner is re-applied below.
            a.matvec(&p, &mut z);
            let akden = ip.dot(&z, &pp);
            let ak = bknum / akden;
            a.mattransvec(&pp, &mut zz);
            for j in 0..n {
                x[j] = x[j] + ak * p[j];
                r[j] = r[j] - ak * z[j];
                rr[j] = rr[j] - ak * zz[j];
            }
            pc.apply(&r, &mut z)?;

            match test {
                ConvergenceTest::Residual => {
                    err = test.norm(&r) / bnrm;
                }
                ConvergenceTest::PreconditionedResidual => {
                    err = test.norm(&z) / bnrm;
                }
                ConvergenceTest::IncrementL2 | ConvergenceTest::IncrementLinf => {
                    let zm1nrm = znrm;
                    znrm = test.norm(&z);
                    // The increment estimate needs a trustworthy change in
                    // ‖z‖ and a solution large enough to scale against;
                    // otherwise report the residual ratio and keep going.
                    if (zm1nrm - znrm).abs() > T::epsilon() * znrm {
                        let dxnrm = ak.abs() * test.norm(&p);
                        err = znrm / (zm1nrm - znrm).abs() * dxnrm;
                    } else {
                        err = znrm / bnrm;
                        continue;
                    }
                    let xnrm = test.norm(x);
                    if err <= half * xnrm {
                        err = err / xnrm;
                    } else {
                        err = znrm / bnrm;
                        continue;
                    }
                }
            }

            if iter % 10 == 0 {
                debug!(
                    "BiCG: error after {} iterations: {:.5e}",
                    iter,
                    err.to_f64().unwrap_or(f64::NAN)
                );
            }

            if err <= tol {
                info!(
                    "BiCG: converged after {} iterations with error {:.5e}",
                    iter,
                    err.to_f64().unwrap_or(f64::NAN)
                );
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "BiCG: reached the iteration cap ({}) with error {:.5e}",
                self.conv.max_iters,
                err.to_f64().unwrap_or(f64::NAN)
            );
        }

        Ok(SolveStats {
            iterations,
            final_residual: err,
            converged,
        })
    }
}

/// Solve A·x = b with the Jacobi preconditioner, the residual-ratio stop
/// test, tolerance 1e-6, and an iteration cap of `2·max(nrows, ncols)`.
pub fn solve<M, T>(a: &M, b: &Vec<T>, x: &mut Vec<T>) -> Result<SolveStats<T>, LinError>
where
    M: Operator<T>,
    T: Float + From<f64> + Send + Sync,
{
    let cap = 2 * a.nrows().max(a.ncols());
    let mut solver = BiCgSolver::new(1e-6.into(), ConvergenceTest::Residual, cap)?;
    solver.solve(a, None, b, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;
    use approx::assert_abs_diff_eq;

    fn dominant_spd() -> (Mat<f64>, Vec<f64>) {
        let a = Mat::from_fn(4, 4, |i, j| {
            if i == j {
                10.0 + i as f64
            } else {
                1.0 / (1.0 + (i as f64 - j as f64).abs())
            }
        });
        let b = vec![1.0, 2.0, 3.0, 4.0];
        (a, b)
    }

    #[test]
    fn converges_on_diagonally_dominant_spd() {
        let (a, b) = dominant_spd();
        let mut x = vec![0.0; 4];
        let stats = solve(&a, &b, &mut x).unwrap();
        assert!(stats.converged);
        assert!(stats.final_residual <= 1e-6);
        let mut ax = vec![0.0; 4];
        use crate::core::traits::MatVec;
        a.matvec(&x, &mut ax);
        for i in 0..4 {
            assert_abs_diff_eq!(ax[i], b[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn all_four_stop_tests_reach_the_same_solution() {
        let (a, b) = dominant_spd();
        let mut reference = vec![0.0; 4];
        solve(&a, &b, &mut reference).unwrap();
        for index in 1..=4 {
            let test = ConvergenceTest::from_index(index).unwrap();
            let mut solver = BiCgSolver::new(1e-9, test, 200).unwrap();
            let mut x = vec![0.0; 4];
            let stats = solver.solve(&a, None, &b, &mut x).unwrap();
            assert!(stats.converged, "mode {index} did not converge");
            for i in 0..4 {
                assert_abs_diff_eq!(x[i], reference[i], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn invalid_arguments_fail_fast() {
        assert!(BiCgSolver::<f64>::new(0.0, ConvergenceTest::Residual, 10).is_err());
        assert!(BiCgSolver::<f64>::new(-1.0, ConvergenceTest::Residual, 10).is_err());
        assert!(BiCgSolver::<f64>::new(1e-6, ConvergenceTest::Residual, 0).is_err());
    }

    #[test]
    fn iteration_cap_is_soft() {
        let (a, b) = dominant_spd();
        let mut solver = BiCgSolver::new(1e-300, ConvergenceTest::Residual, 2).unwrap();
        let mut x = vec![0.0; 4];
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert!(!stats.converged);
        assert_eq!(stats.iterations, 2);
    }

    #[test]
    fn rejects_non_square_and_mismatched_lengths() {
        let a = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
        let b = vec![1.0; 3];
        let mut x = vec![0.0; 3];
        let mut solver = BiCgSolver::new(1e-6, ConvergenceTest::Residual, 10).unwrap();
        assert!(solver.solve(&a, None, &b, &mut x).is_err());

        let a = Mat::from_fn(3, 3, |i, j| if i == j { 2.0 } else { 0.0 });
        let b_short = vec![1.0; 2];
        assert!(solver.solve(&a, None, &b_short, &mut x).is_err());
    }
}
