//! Wrappers for faer dense matrix types and vector operations.
//!
//! This module implements the core operator traits for `faer::Mat`,
//! `faer::MatRef`, and `Vec<T>`, so that dense matrices and plain vectors
//! can be used directly by the factorization engine and the iterative
//! solvers. Inner products optionally use Rayon parallelism.

use crate::core::traits::{Diagonal, Indexing, InnerProduct, MatShape, MatTransVec, MatVec, MatrixGet};
use faer::{Mat, MatRef};
use num_traits::Float;

/// Matrix-vector multiplication for `faer::Mat`: `y = A * x`.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

impl<'a, T: Float> MatVec<Vec<T>> for MatRef<'a, T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

/// Matrix-transpose-vector multiplication for `faer::Mat`: `y = A^T * x`.
impl<T: Float> MatTransVec<Vec<T>> for Mat<T> {
    fn mattransvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.ncols(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.nrows(), x.len(), "Input vector x has incorrect length");
        for j in 0..self.ncols() {
            y[j] = T::zero();
            for i in 0..self.nrows() {
                y[j] = y[j] + self[(i, j)] * x[i];
            }
        }
    }
}

impl<'a, T: Float> MatTransVec<Vec<T>> for MatRef<'a, T> {
    fn mattransvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.ncols(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.nrows(), x.len(), "Input vector x has incorrect length");
        for j in 0..self.ncols() {
            y[j] = T::zero();
            for i in 0..self.nrows() {
                y[j] = y[j] + self[(i, j)] * x[i];
            }
        }
    }
}

impl<T: Float> MatShape for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

impl<'a, T: Float> MatShape for MatRef<'a, T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

impl<T: Float> MatrixGet<T> for Mat<T> {
    fn get(&self, i: usize, j: usize) -> T {
        self[(i, j)]
    }
}

impl<'a, T: Float> MatrixGet<T> for MatRef<'a, T> {
    fn get(&self, i: usize, j: usize) -> T {
        self[(i, j)]
    }
}

impl<T: Float> Diagonal<T> for Mat<T> {
    fn diag(&self) -> Vec<T> {
        let k = self.nrows().min(self.ncols());
        (0..k).map(|i| self[(i, i)]).collect()
    }
}

impl<'a, T: Float> Diagonal<T> for MatRef<'a, T> {
    fn diag(&self) -> Vec<T> {
        let k = self.nrows().min(self.ncols());
        (0..k).map(|i| self[(i, i)]).collect()
    }
}

/// Inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &Vec<T>) -> T {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .map(|xi| *xi * *xi)
                .reduce(|| T::zero(), |acc, v| acc + v)
                .sqrt()
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .map(|xi| *xi * *xi)
                .fold(T::zero(), |acc, v| acc + v)
                .sqrt()
        }
    }
}

/// A vector is a single column.
impl<T> Indexing for Vec<T> {
    fn nrows(&self) -> usize {
        self.len()
    }
}

impl<T> Indexing for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn a23() -> Mat<f64> {
        Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64 + 1.0)
    }

    #[test]
    fn matvec_and_transpose_are_consistent() {
        // ⟨A x, z⟩ == ⟨x, Aᵀ z⟩ for fixed vectors.
        let a = a23();
        let x = vec![1.0, -2.0, 0.5];
        let z = vec![3.0, 4.0];
        let mut ax = vec![0.0; 2];
        let mut atz = vec![0.0; 3];
        a.matvec(&x, &mut ax);
        a.mattransvec(&z, &mut atz);
        let ip = ();
        assert_abs_diff_eq!(ip.dot(&ax, &z), ip.dot(&x, &atz), epsilon = 1e-12);
    }

    #[test]
    fn get_and_diag_read_the_storage() {
        let a = a23();
        assert_eq!(MatrixGet::get(&a, 1, 2), 6.0);
        assert_eq!(Diagonal::diag(&a), vec![1.0, 5.0]);
    }

    #[test]
    fn dot_and_norm() {
        let ip = ();
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, -5.0, 6.0];
        assert_abs_diff_eq!(ip.dot(&x, &y), 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ip.norm(&x), 14.0_f64.sqrt(), epsilon = 1e-12);
    }
}
