//! Core linear-algebra traits for densol.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Matrix-transpose–vector product: y ← Aᵀ x.
///
/// Must be algebraically consistent with [`MatVec`] on the same logical
/// matrix: for all x, z it holds that ⟨A x, z⟩ = ⟨x, Aᵀ z⟩.
pub trait MatTransVec<V> {
    /// Compute y = Aᵀ · x.
    fn mattransvec(&self, x: &V, y: &mut V);
}

/// Shape queries for matrix-like types.
pub trait MatShape {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
}

/// Element access for matrix-like types.
pub trait MatrixGet<T> {
    /// Returns the element at (i, j).
    fn get(&self, i: usize, j: usize) -> T;
}

/// Main-diagonal extraction, as consumed by the Jacobi preconditioner.
pub trait Diagonal<T> {
    /// Returns the main diagonal (length min(nrows, ncols)).
    fn diag(&self) -> Vec<T>;
}

/// The full operator capability every iterative algorithm in this crate
/// depends on: multiply, transpose-multiply, shape, and diagonal.
///
/// Blanket-implemented, so any type providing the granular traits is an
/// `Operator`. Implementations may be backed by explicit dense storage
/// (`faer::Mat`) or by an implicit rule such as a kernel matrix generated
/// on the fly; only the direct factorizations require explicit storage.
pub trait Operator<T>: MatVec<Vec<T>> + MatTransVec<Vec<T>> + MatShape + Diagonal<T> {}

impl<T, M> Operator<T> for M where
    M: MatVec<Vec<T>> + MatTransVec<Vec<T>> + MatShape + Diagonal<T>
{
}

/// Inner products & norms.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Uniform indexing into vectors.
pub trait Indexing {
    /// Number of rows (or length for a vector).
    fn nrows(&self) -> usize;
}
