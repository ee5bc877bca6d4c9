//! LU decomposition with partial pivoting.
//!
//! Factors a square matrix as P·A = L·U, choosing at each step the pivot
//! row with the largest magnitude in the active column. The decomposition
//! always exists; an exactly-zero pivot marks the handle singular, and
//! `solve`/`inverse` on a singular handle fail with
//! [`LinError::SingularOperator`] rather than returning a silently wrong
//! answer.

use crate::error::LinError;
use crate::matrix::dense::copy_of;
use faer::Mat;
use num_traits::Float;

/// Immutable LU handle: packed L/U factors, pivot vector, pivot sign.
///
/// L (unit diagonal, implicit) sits below the diagonal of `lu`, U on and
/// above it. `factor` consumes its argument and reuses the storage, so no
/// aliasing of caller-owned data can be observed; `new` copies first.
pub struct Lu<T> {
    lu: Mat<T>,
    piv: Vec<usize>,
    pivsign: i8,
    singular: bool,
}

impl<T: Float> Lu<T> {
    /// Factor a copy of `a`.
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        Self::factor(copy_of(a))
    }

    /// Factor `a` in place, consuming it.
    pub fn factor(mut lu: Mat<T>) -> Result<Self, LinError> {
        let m = lu.nrows();
        let n = lu.ncols();
        if m != n {
            return Err(LinError::DimensionMismatch {
                expected: (m, m),
                found: (m, n),
            });
        }

        let mut piv: Vec<usize> = (0..n).collect();
        let mut pivsign: i8 = 1;
        let mut singular = false;

        for k in 0..n {
            // Partial pivoting: largest magnitude in the active column.
            let mut p = k;
            for i in (k + 1)..n {
                if lu[(i, k)].abs() > lu[(p, k)].abs() {
                    p = i;
                }
            }
            if p != k {
                for j in 0..n {
                    let t = lu[(p, j)];
                    lu[(p, j)] = lu[(k, j)];
                    lu[(k, j)] = t;
                }
                piv.swap(p, k);
                pivsign = -pivsign;
            }

            let pivot = lu[(k, k)];
            if pivot == T::zero() {
                singular = true;
                continue;
            }

            for i in (k + 1)..n {
                let f = lu[(i, k)] / pivot;
                lu[(i, k)] = f;
                for j in (k + 1)..n {
                    lu[(i, j)] = lu[(i, j)] - f * lu[(k, j)];
                }
            }
        }

        Ok(Self {
            lu,
            piv,
            pivsign,
            singular,
        })
    }

    /// Whether an exactly-zero pivot was hit during elimination.
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// Row permutation applied to the source matrix.
    pub fn pivots(&self) -> &[usize] {
        &self.piv
    }

    /// Determinant: pivot sign times the product of U's diagonal.
    pub fn det(&self) -> T {
        if self.singular {
            return T::zero();
        }
        let n = self.lu.ncols();
        let sign = if self.pivsign > 0 {
            T::one()
        } else {
            -T::one()
        };
        (0..n).fold(sign, |d, i| d * self.lu[(i, i)])
    }

    /// Solve A·x = b using the stored factors.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinError> {
        let n = self.lu.nrows();
        if b.len() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, 1),
                found: (b.len(), 1),
            });
        }
        if self.singular {
            return Err(LinError::SingularOperator);
        }

        let mut x = vec![T::zero(); n];
        // Forward substitution against unit-lower L with permuted b.
        for i in 0..n {
            let mut sum = b[self.piv[i]];
            for j in 0..i {
                sum = sum - self.lu[(i, j)] * x[j];
            }
            x[i] = sum;
        }
        // Back substitution against U.
        for i in (0..n).rev() {
            let mut sum = x[i];
            for j in (i + 1)..n {
                sum = sum - self.lu[(i, j)] * x[j];
            }
            x[i] = sum / self.lu[(i, i)];
        }
        Ok(x)
    }

    /// Solve A·X = B column by column (multiple right-hand sides).
    pub fn solve_mat(&self, b: &Mat<T>) -> Result<Mat<T>, LinError> {
        let n = self.lu.nrows();
        if b.nrows() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, b.ncols()),
                found: (b.nrows(), b.ncols()),
            });
        }
        let mut cols = Vec::with_capacity(b.ncols());
        for j in 0..b.ncols() {
            let rhs: Vec<T> = (0..n).map(|i| b[(i, j)]).collect();
            cols.push(self.solve(&rhs)?);
        }
        Ok(Mat::from_fn(n, b.ncols(), |i, j| cols[j][i]))
    }

    /// Matrix inverse, solving against the identity columns.
    pub fn inverse(&self) -> Result<Mat<T>, LinError> {
        let n = self.lu.nrows();
        if self.singular {
            return Err(LinError::SingularOperator);
        }
        let mut cols = Vec::with_capacity(n);
        let mut e = vec![T::zero(); n];
        for k in 0..n {
            if k > 0 {
                e[k - 1] = T::zero();
            }
            e[k] = T::one();
            cols.push(self.solve(&e)?);
        }
        Ok(Mat::from_fn(n, n, |i, j| cols[j][i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MatVec;
    use approx::assert_abs_diff_eq;

    fn a3() -> Mat<f64> {
        Mat::from_fn(3, 3, |i, j| match (i, j) {
            (0, 0) => 2.0,
            (0, 1) => 1.0,
            (0, 2) => -1.0,
            (1, 0) => -3.0,
            (1, 1) => -1.0,
            (1, 2) => 2.0,
            (2, 0) => -2.0,
            (2, 1) => 1.0,
            _ => 2.0,
        })
    }

    #[test]
    fn solve_round_trip() {
        let a = a3();
        let lu = Lu::new(&a).unwrap();
        assert!(!lu.is_singular());
        let b = vec![8.0, -11.0, -3.0];
        let x = lu.solve(&b).unwrap();
        let mut ax = vec![0.0; 3];
        a.matvec(&x, &mut ax);
        for i in 0..3 {
            assert_abs_diff_eq!(ax[i], b[i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn determinant_tracks_pivot_sign() {
        let a = Mat::from_fn(2, 2, |i, j| [[3.0, 8.0], [4.0, 6.0]][i][j]);
        let lu = Lu::new(&a).unwrap();
        assert_abs_diff_eq!(lu.det(), -14.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_round_trip_and_idempotence() {
        let a = a3();
        let lu = Lu::new(&a).unwrap();
        let inv = lu.inverse().unwrap();
        // A · A⁻¹ ≈ I
        for i in 0..3 {
            for j in 0..3 {
                let mut s = 0.0;
                for k in 0..3 {
                    s += a[(i, k)] * inv[(k, j)];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(s, expected, epsilon = 1e-12);
            }
        }
        // Two calls on the same handle are bit-identical.
        let inv2 = lu.inverse().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(inv[(i, j)].to_bits(), inv2[(i, j)].to_bits());
            }
        }
    }

    #[test]
    fn zero_pivot_sets_singular_flag_and_blocks_solve() {
        // Rank-deficient: second row is twice the first.
        let a = Mat::from_fn(2, 2, |i, j| [[1.0, 2.0], [2.0, 4.0]][i][j]);
        let lu = Lu::new(&a).unwrap();
        assert!(lu.is_singular());
        assert_eq!(lu.det(), 0.0);
        assert!(matches!(
            lu.solve(&[1.0, 1.0]),
            Err(LinError::SingularOperator)
        ));
        assert!(matches!(lu.inverse(), Err(LinError::SingularOperator)));
    }

    #[test]
    fn rejects_non_square() {
        let a = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
        assert!(Lu::new(&a).is_err());
    }

    #[test]
    fn multi_rhs_matches_single() {
        let a = a3();
        let lu = Lu::new(&a).unwrap();
        let b = Mat::from_fn(3, 2, |i, j| (i + 1) as f64 * (j + 1) as f64);
        let x = lu.solve_mat(&b).unwrap();
        for j in 0..2 {
            let rhs: Vec<f64> = (0..3).map(|i| b[(i, j)]).collect();
            let xj = lu.solve(&rhs).unwrap();
            for i in 0..3 {
                assert_abs_diff_eq!(x[(i, j)], xj[i], epsilon = 1e-14);
            }
        }
    }
}
