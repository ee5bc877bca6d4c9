//! Dense matrix construction helpers.

pub mod dense;

pub use dense::DenseMatrix;
