//! Cholesky decomposition A = L·Lᵀ for symmetric positive-definite input.
//!
//! Only the lower triangle of the source is read; symmetry of the input is
//! the caller's contract. The lower-triangular march requires every
//! diagonal pivot to stay strictly positive, and a non-positive pivot
//! fails construction with [`LinError::NotPositiveDefinite`].

use crate::error::LinError;
use crate::matrix::dense::copy_of;
use faer::Mat;
use num_traits::Float;

/// Immutable Cholesky handle holding the lower-triangular factor.
pub struct Cholesky<T> {
    l: Mat<T>,
}

impl<T: Float> Cholesky<T> {
    /// Factor a copy of `a`.
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        Self::factor(copy_of(a))
    }

    /// Factor `a` in place, consuming it. The strict upper triangle is
    /// zeroed as the march proceeds.
    pub fn factor(mut l: Mat<T>) -> Result<Self, LinError> {
        let m = l.nrows();
        let n = l.ncols();
        if m != n {
            return Err(LinError::DimensionMismatch {
                expected: (m, m),
                found: (m, n),
            });
        }

        for j in 0..n {
            let mut d = T::zero();
            for k in 0..j {
                let mut s = T::zero();
                for i in 0..k {
                    s = s + l[(k, i)] * l[(j, i)];
                }
                s = (l[(j, k)] - s) / l[(k, k)];
                l[(j, k)] = s;
                d = d + s * s;
            }
            d = l[(j, j)] - d;
            if d <= T::zero() {
                return Err(LinError::NotPositiveDefinite);
            }
            l[(j, j)] = d.sqrt();
            for k in (j + 1)..n {
                l[(j, k)] = T::zero();
            }
        }

        Ok(Self { l })
    }

    /// The lower-triangular factor.
    pub fn l(&self) -> &Mat<T> {
        &self.l
    }

    /// Determinant: product of the squared diagonal of L.
    pub fn det(&self) -> T {
        let n = self.l.ncols();
        (0..n).fold(T::one(), |d, i| d * self.l[(i, i)] * self.l[(i, i)])
    }

    /// Solve A·x = b: forward substitution on L, back substitution on Lᵀ.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinError> {
        let n = self.l.nrows();
        if b.len() != n {
            return Err(LinError::DimensionMismatch {
                expected: (n, 1),
                found: (b.len(), 1),
            });
        }

        let mut x = b.to_vec();
        for i in 0..n {
            let mut sum = x[i];
            for j in 0..i {
                sum = sum - self.l[(i, j)] * x[j];
            }
            x[i] = sum / self.l[(i, i)];
        }
        for i in (0..n).rev() {
            let mut sum = x[i];
            for j in (i + 1)..n {
                sum = sum - self.l[(j, i)] * x[j];
            }
            x[i] = sum / self.l[(i, i)];
        }
        Ok(x)
    }

    /// Solve A·X = B column by column.
    pub fn solve_mat(&self, b: &Mat<T>) -> Result<Mat<T>, LinError> {
        let n = self.l.nrows();
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

    /// Matrix inverse via identity-column solves.
    pub fn inverse(&self) -> Result<Mat<T>, LinError> {
        let n = self.l.nrows();
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
    use approx::assert_abs_diff_eq;

    fn spd3() -> Mat<f64> {
        Mat::from_fn(3, 3, |i, j| {
            [[4.0, 2.0, 2.0], [2.0, 6.0, 2.0], [2.0, 2.0, 5.0]][i][j]
        })
    }

    #[test]
    fn factor_reconstructs_source() {
        let a = spd3();
        let ch = Cholesky::new(&a).unwrap();
        let l = ch.l();
        for i in 0..3 {
            for j in 0..3 {
                let mut s = 0.0;
                for k in 0..3 {
                    s += l[(i, k)] * l[(j, k)];
                }
                assert_abs_diff_eq!(s, a[(i, j)], epsilon = 1e-12);
            }
        }
        // Strict upper triangle of L is zero.
        assert_eq!(l[(0, 1)], 0.0);
        assert_eq!(l[(0, 2)], 0.0);
        assert_eq!(l[(1, 2)], 0.0);
    }

    #[test]
    fn solve_round_trip() {
        let a = spd3();
        let ch = Cholesky::new(&a).unwrap();
        let b = vec![1.0, 2.0, 3.0];
        let x = ch.solve(&b).unwrap();
        for i in 0..3 {
            let mut s = 0.0;
            for j in 0..3 {
                s += a[(i, j)] * x[j];
            }
            assert_abs_diff_eq!(s, b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn det_matches_lu() {
        let a = spd3();
        let ch = Cholesky::new(&a).unwrap();
        let lu = crate::factor::Lu::new(&a).unwrap();
        assert_abs_diff_eq!(ch.det(), lu.det(), epsilon = 1e-10);
    }

    #[test]
    fn rejects_indefinite() {
        // Indefinite: second leading principal minor is negative.
        let a = Mat::from_fn(2, 2, |i, j| [[1.0, 2.0], [2.0, 1.0]][i][j]);
        assert!(matches!(
            Cholesky::new(&a),
            Err(LinError::NotPositiveDefinite)
        ));
        // Negative definite fails on the first pivot.
        let a = Mat::from_fn(2, 2, |i, j| [[-4.0, 0.0], [0.0, -1.0]][i][j]);
        assert!(matches!(
            Cholesky::new(&a),
            Err(LinError::NotPositiveDefinite)
        ));
    }

    #[test]
    fn rejects_non_square() {
        let a = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        assert!(Cholesky::new(&a).is_err());
    }

    #[test]
    fn inverse_round_trip() {
        let a = spd3();
        let inv = Cholesky::new(&a).unwrap().inverse().unwrap();
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
    }
}
