//! Dense-matrix API on top of Faer.
//!
//! Construction helpers for `faer::Mat<T>`, the canonical dense storage
//! used by the factorization engine.

use crate::core::traits::{Indexing, MatVec};
use faer::Mat;
use num_traits::Float;

/// Blanket construction interface so any Faer Mat<T> is a DenseMatrix.
pub trait DenseMatrix<T>: MatVec<Vec<T>> + Indexing {
    /// Construct from raw column-major storage.
    fn from_raw(nrows: usize, ncols: usize, data: Vec<T>) -> Self;
    /// Construct from row slices (each inner slice is one row).
    fn from_rows(rows: &[&[T]]) -> Self;
}

impl<T: Float> DenseMatrix<T> for Mat<T> {
    fn from_raw(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), nrows * ncols, "raw storage has incorrect length");
        Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i])
    }

    fn from_rows(rows: &[&[T]]) -> Self {
        let nrows = rows.len();
        let ncols = if nrows > 0 { rows[0].len() } else { 0 };
        assert!(rows.iter().all(|r| r.len() == ncols), "ragged rows");
        Mat::from_fn(nrows, ncols, |i, j| rows[i][j])
    }
}

/// Copy of `a` with fresh storage. Used by the copy-on-factor constructors.
pub(crate) fn copy_of<T: Float>(a: &Mat<T>) -> Mat<T> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[(i, j)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_is_column_major() {
        let a = Mat::<f64>::from_raw(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a[(0, 0)], 1.0);
        assert_eq!(a[(1, 0)], 2.0);
        assert_eq!(a[(0, 1)], 3.0);
        assert_eq!(a[(1, 1)], 4.0);
    }

    #[test]
    fn from_rows_matches_layout() {
        let a = Mat::<f64>::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert_eq!(a[(0, 1)], 2.0);
        assert_eq!(a[(1, 0)], 3.0);
    }
}
