//! QR decomposition by Householder reflections.
//!
//! Zeroes the sub-diagonal entries column by column; the reflectors are
//! stored compactly below the diagonal of the work matrix and the diagonal
//! of R separately. Requires `m ≥ n`. A diagonal entry of R below the
//! numerical floor marks the handle singular for diagnostic purposes
//! without failing construction; `solve` on a singular handle then fails
//! with [`LinError::SingularOperator`].

use crate::error::LinError;
use crate::matrix::dense::copy_of;
use faer::Mat;
use num_traits::Float;

/// Immutable QR handle: reflectors below the diagonal of `qr`, R's
/// diagonal in `rdiag`, the rest of R on and above the diagonal.
pub struct Qr<T> {
    qr: Mat<T>,
    rdiag: Vec<T>,
    singular: bool,
}

impl<T: Float> Qr<T> {
    /// Factor a copy of `a`.
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        Self::factor(copy_of(a))
    }

    /// Factor `a` in place, consuming it.
    pub fn factor(mut qr: Mat<T>) -> Result<Self, LinError> {
        let m = qr.nrows();
        let n = qr.ncols();
        if m < n {
            return Err(LinError::DimensionMismatch {
                expected: (n, n),
                found: (m, n),
            });
        }

        let mut rdiag = vec![T::zero(); n];

        for k in 0..n {
            // 2-norm of the active column, computed with hypot to avoid
            // overflow.
            let mut nrm = T::zero();
            for i in k..m {
                nrm = nrm.hypot(qr[(i, k)]);
            }

            if nrm != T::zero() {
                // Form the Householder vector v with v[k] shifted away
                // from cancellation.
                if qr[(k, k)] < T::zero() {
                    nrm = -nrm;
                }
                for i in k..m {
                    qr[(i, k)] = qr[(i, k)] / nrm;
                }
                qr[(k, k)] = qr[(k, k)] + T::one();

                // Apply the reflector to the remaining columns.
                for j in (k + 1)..n {
                    let mut s = T::zero();
                    for i in k..m {
                        s = s + qr[(i, k)] * qr[(i, j)];
                    }
                    s = -s / qr[(k, k)];
                    for i in k..m {
                        qr[(i, j)] = qr[(i, j)] + s * qr[(i, k)];
                    }
                }
            }
            rdiag[k] = -nrm;
        }

        let singular = rdiag.iter().any(|r| r.abs() <= T::epsilon());
        Ok(Self { qr, rdiag, singular })
    }

    /// Whether any diagonal entry of R fell below the numerical floor.
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// Least-squares solve of A·x = b (`b` of length m, result length n).
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinError> {
        let m = self.qr.nrows();
        let n = self.qr.ncols();
        if b.len() != m {
            return Err(LinError::DimensionMismatch {
                expected: (m, 1),
                found: (b.len(), 1),
            });
        }
        if self.singular {
            return Err(LinError::SingularOperator);
        }

        let mut y = b.to_vec();
        self.apply_reflectors(&mut y);
        self.back_substitute(&mut y);
        y.truncate(n);
        Ok(y)
    }

    /// Least-squares solve with a rectangular right-hand side; every
    /// column of `b` is solved simultaneously.
    pub fn solve_mat(&self, b: &Mat<T>) -> Result<Mat<T>, LinError> {
        let m = self.qr.nrows();
        let n = self.qr.ncols();
        if b.nrows() != m {
            return Err(LinError::DimensionMismatch {
                expected: (m, b.ncols()),
                found: (b.nrows(), b.ncols()),
            });
        }
        if self.singular {
            return Err(LinError::SingularOperator);
        }

        let mut cols = Vec::with_capacity(b.ncols());
        for j in 0..b.ncols() {
            let mut y: Vec<T> = (0..m).map(|i| b[(i, j)]).collect();
            self.apply_reflectors(&mut y);
            self.back_substitute(&mut y);
            y.truncate(n);
            cols.push(y);
        }
        Ok(Mat::from_fn(n, b.ncols(), |i, j| cols[j][i]))
    }

    /// Matrix inverse for a square, non-singular decomposition.
    pub fn inverse(&self) -> Result<Mat<T>, LinError> {
        let m = self.qr.nrows();
        let n = self.qr.ncols();
        if m != n {
            return Err(LinError::DimensionMismatch {
                expected: (m, m),
                found: (m, n),
            });
        }
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

    /// y ← Qᵀ·y, applying the stored reflectors in order.
    fn apply_reflectors(&self, y: &mut [T]) {
        let m = self.qr.nrows();
        let n = self.qr.ncols();
        for k in 0..n {
            if self.qr[(k, k)] == T::zero() {
                continue;
            }
            let mut s = T::zero();
            for i in k..m {
                s = s + self.qr[(i, k)] * y[i];
            }
            s = -s / self.qr[(k, k)];
            for i in k..m {
                y[i] = y[i] + s * self.qr[(i, k)];
            }
        }
    }

    /// y[0..n] ← R⁻¹·y[0..n].
    fn back_substitute(&self, y: &mut [T]) {
        let n = self.qr.ncols();
        for k in (0..n).rev() {
            y[k] = y[k] / self.rdiag[k];
            for i in 0..k {
                y[i] = y[i] - y[k] * self.qr[(i, k)];
            }
        }
    }
}
