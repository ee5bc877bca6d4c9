//! Direct factorization engine.
//!
//! Each decomposition lives in its own module and exposes an immutable
//! handle: factor once, then query (`solve`, `inverse`, `det`, ...) any
//! number of times. [`Factorization`] folds the handles into one closed
//! dispatch surface, and the [`Factor`] extension trait puts
//! copy-on-factor constructors directly on `faer::Mat`.

pub mod cholesky;
pub mod eigen;
pub mod lu;
pub mod qr;
pub mod svd;

pub use cholesky::Cholesky;
pub use eigen::{Eigen, SymmetricEigen};
pub use lu::Lu;
pub use qr::Qr;
pub use svd::Svd;

use crate::error::LinError;
use faer::Mat;
use num_traits::Float;

/// A factored square or rectangular operator, one variant per
/// decomposition. Operations a variant cannot support fail with
/// [`LinError::Unsupported`] instead of panicking.
pub enum Factorization<T> {
    Lu(Lu<T>),
    Cholesky(Cholesky<T>),
    Qr(Qr<T>),
    Svd(Svd<T>),
    SymmetricEigen(SymmetricEigen<T>),
    Eigen(Eigen<T>),
}

impl<T: Float + From<f64>> Factorization<T> {
    /// Solve A·x = b through whichever decomposition is held. The SVD
    /// variant solves in the least-squares sense via the pseudo-inverse.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinError> {
        match self {
            Factorization::Lu(f) => f.solve(b),
            Factorization::Cholesky(f) => f.solve(b),
            Factorization::Qr(f) => f.solve(b),
            Factorization::Svd(f) => f.solve(b),
            Factorization::SymmetricEigen(_) | Factorization::Eigen(_) => Err(
                LinError::Unsupported("solve is not defined for an eigendecomposition"),
            ),
        }
    }

    /// Solve A·X = B column by column.
    pub fn solve_mat(&self, b: &Mat<T>) -> Result<Mat<T>, LinError> {
        match self {
            Factorization::Lu(f) => f.solve_mat(b),
            Factorization::Cholesky(f) => f.solve_mat(b),
            Factorization::Qr(f) => f.solve_mat(b),
            Factorization::Svd(_) => Err(LinError::Unsupported(
                "matrix right-hand sides are not supported by the SVD solver",
            )),
            Factorization::SymmetricEigen(_) | Factorization::Eigen(_) => Err(
                LinError::Unsupported("solve is not defined for an eigendecomposition"),
            ),
        }
    }

    /// Matrix inverse where the decomposition defines one.
    pub fn inverse(&self) -> Result<Mat<T>, LinError> {
        match self {
            Factorization::Lu(f) => f.inverse(),
            Factorization::Cholesky(f) => f.inverse(),
            Factorization::Qr(f) => f.inverse(),
            Factorization::Svd(_) => Err(LinError::Unsupported(
                "inverse is not defined for the SVD handle",
            )),
            Factorization::SymmetricEigen(_) | Factorization::Eigen(_) => Err(
                LinError::Unsupported("inverse is not defined for an eigendecomposition"),
            ),
        }
    }

    /// Whether the factored operator is numerically singular. A handle
    /// whose construction rules out singularity reports `false`.
    pub fn is_singular(&self) -> bool {
        match self {
            Factorization::Lu(f) => f.is_singular(),
            Factorization::Qr(f) => f.is_singular(),
            Factorization::Svd(f) => f.is_singular(),
            Factorization::Cholesky(_)
            | Factorization::SymmetricEigen(_)
            | Factorization::Eigen(_) => false,
        }
    }

    /// Determinant where the decomposition defines one.
    pub fn det(&self) -> Result<T, LinError> {
        match self {
            Factorization::Lu(f) => Ok(f.det()),
            Factorization::Cholesky(f) => Ok(f.det()),
            Factorization::Qr(_) | Factorization::Svd(_) => Err(LinError::Unsupported(
                "determinant is not defined for this decomposition",
            )),
            Factorization::SymmetricEigen(_) | Factorization::Eigen(_) => Err(
                LinError::Unsupported("determinant is not defined for an eigendecomposition"),
            ),
        }
    }
}

/// Copy-on-factor constructors on the dense matrix type. Each method
/// copies the receiver before factoring; callers that want to give up
/// their storage instead use the handle's `factor` constructor.
pub trait Factor<T> {
    fn lu(&self) -> Result<Lu<T>, LinError>;
    fn cholesky(&self) -> Result<Cholesky<T>, LinError>;
    fn qr(&self) -> Result<Qr<T>, LinError>;
    fn svd(&self) -> Result<Svd<T>, LinError>;
    fn sym_eigen(&self) -> Result<SymmetricEigen<T>, LinError>;
    fn eigen(&self) -> Result<Eigen<T>, LinError>;
}

impl<T: Float + From<f64>> Factor<T> for Mat<T> {
    fn lu(&self) -> Result<Lu<T>, LinError> {
        Lu::new(self)
    }

    fn cholesky(&self) -> Result<Cholesky<T>, LinError> {
        Cholesky::new(self)
    }

    fn qr(&self) -> Result<Qr<T>, LinError> {
        Qr::new(self)
    }

    fn svd(&self) -> Result<Svd<T>, LinError> {
        Svd::new(self)
    }

    fn sym_eigen(&self) -> Result<SymmetricEigen<T>, LinError> {
        SymmetricEigen::new(self)
    }

    fn eigen(&self) -> Result<Eigen<T>, LinError> {
        Eigen::new(self)
    }
}
