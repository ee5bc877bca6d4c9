//! densol: dense factorizations and iterative solvers over Faer
//!
//! This crate provides a dense numerical linear algebra kernel: LU, Cholesky,
//! QR, SVD and eigendecomposition handles with solve/inverse/determinant
//! queries, a preconditioned biconjugate gradient solver over an abstract
//! operator interface, and a shifted power iteration for dominant eigenpairs.

pub mod core;
pub mod error;
pub mod factor;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use crate::core::*;
pub use crate::error::*;
pub use crate::factor::*;
pub use crate::matrix::*;
pub use crate::preconditioner::*;
pub use crate::solver::*;
pub use crate::utils::*;

// Re-export the solver statistics at the crate root for convenience
pub use crate::utils::convergence::SolveStats;
