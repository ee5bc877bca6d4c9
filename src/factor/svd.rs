//! Singular value decomposition.
//!
//! Householder bidiagonalization followed by implicit-shift QR sweeps on
//! the bidiagonal band (Golub–Kahan). Produces the economy layout
//! `U: m×min(m,n)`, `s` descending, `V: n×min(m,n)`; a wide input is
//! handled by factoring its transpose and swapping the singular-vector
//! matrices.

use crate::error::LinError;
use faer::Mat;
use num_traits::Float;

const MAX_SWEEPS: usize = 500;

/// Immutable SVD handle: `A = U · diag(s) · Vᵀ`.
pub struct Svd<T> {
    u: Mat<T>,
    s: Vec<T>,
    v: Mat<T>,
    m: usize,
    n: usize,
}

impl<T: Float + From<f64>> Svd<T> {
    /// Factor a copy of `a` (the source matrix is left untouched; the
    /// working copy is consumed by the bidiagonalization).
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        let m = a.nrows();
        let n = a.ncols();
        if m >= n {
            let (u, s, v) = golub_kahan(a, m, n)?;
            Ok(Self { u, s, v, m, n })
        } else {
            // Factor Aᵀ = U'·S·V'ᵀ, so A = V'·S·U'ᵀ.
            let at = Mat::from_fn(n, m, |i, j| a[(j, i)]);
            let (u, s, v) = golub_kahan(&at, n, m)?;
            Ok(Self { u: v, s, v: u, m, n })
        }
    }

    /// Singular values, descending.
    pub fn values(&self) -> &[T] {
        &self.s
    }

    /// Left singular vectors, `m×min(m,n)`.
    pub fn u(&self) -> &Mat<T> {
        &self.u
    }

    /// Right singular vectors, `n×min(m,n)`.
    pub fn v(&self) -> &Mat<T> {
        &self.v
    }

    /// Largest singular value.
    pub fn norm2(&self) -> T {
        self.s[0]
    }

    /// Ratio of largest to smallest singular value.
    pub fn cond(&self) -> T {
        self.s[0] / self.s[self.s.len() - 1]
    }

    /// Number of singular values above the numerical rank threshold
    /// `max(m, n) · ε · s₀`.
    pub fn rank(&self) -> usize {
        let thresh = self.rank_threshold();
        self.s.iter().filter(|&&sv| sv > thresh).count()
    }

    /// Whether the source was numerically rank deficient.
    pub fn is_singular(&self) -> bool {
        self.rank() < self.m.min(self.n)
    }

    /// Minimum-norm least-squares solve through the pseudo-inverse:
    /// `x = V · diag(1/sᵢ) · Uᵀ · b`, dropping components below the rank
    /// threshold.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinError> {
        if b.len() != self.m {
            return Err(LinError::DimensionMismatch {
                expected: (self.m, 1),
                found: (b.len(), 1),
            });
        }
        let k = self.s.len();
        let thresh = self.rank_threshold();
        let mut utb = vec![T::zero(); k];
        for j in 0..k {
            if self.s[j] > thresh {
                let mut t = T::zero();
                for i in 0..self.m {
                    t = t + self.u[(i, j)] * b[i];
                }
                utb[j] = t / self.s[j];
            }
        }
        let mut x = vec![T::zero(); self.n];
        for i in 0..self.n {
            let mut t = T::zero();
            for j in 0..k {
                t = t + self.v[(i, j)] * utb[j];
            }
            x[i] = t;
        }
        Ok(x)
    }

    fn rank_threshold(&self) -> T {
        let dim: T = (self.m.max(self.n) as f64).into();
        dim * T::epsilon() * self.s[0]
    }
}

/// Core decomposition for `m ≥ n`: returns `(U: m×n, s: n, V: n×n)`.
#[allow(clippy::needless_range_loop)]
fn golub_kahan<T: Float + From<f64>>(
    src: &Mat<T>,
    m: usize,
    n: usize,
) -> Result<(Mat<T>, Vec<T>, Mat<T>), LinError> {
    debug_assert!(m >= n);
    let nu = n;
    let mut a = Mat::from_fn(m, n, |i, j| src[(i, j)]);
    let mut s = vec![T::zero(); n];
    let mut e = vec![T::zero(); n];
    let mut work = vec![T::zero(); m];
    let mut u = Mat::from_fn(m, nu, |_, _| T::zero());
    let mut v = Mat::from_fn(n, n, |_, _| T::zero());

    // Bidiagonalize: left reflectors into the lower triangle (and s),
    // right reflectors into the upper band (and e).
    let nct = (m - 1).min(n);
    let nrt = if n >= 2 { (n - 2).min(m) } else { 0 };
    for k in 0..nct.max(nrt) {
        if k < nct {
            let mut nrm = T::zero();
            for i in k..m {
                nrm = nrm.hypot(a[(i, k)]);
            }
            s[k] = nrm;
            if s[k] != T::zero() {
                if a[(k, k)] < T::zero() {
                    s[k] = -s[k];
                }
                for i in k..m {
                    a[(i, k)] = a[(i, k)] / s[k];
                }
                a[(k, k)] = a[(k, k)] + T::one();
            }
            s[k] = -s[k];
        }
        for j in (k + 1)..n {
            if k < nct && s[k] != T::zero() {
                let mut t = T::zero();
                for i in k..m {
                    t = t + a[(i, k)] * a[(i, j)];
                }
                t = -t / a[(k, k)];
                for i in k..m {
                    a[(i, j)] = a[(i, j)] + t * a[(i, k)];
                }
            }
            e[j] = a[(k, j)];
        }
        if k < nct {
            for i in k..m {
                u[(i, k)] = a[(i, k)];
            }
        }
        if k < nrt {
            let mut nrm = T::zero();
            for i in (k + 1)..n {
                nrm = nrm.hypot(e[i]);
            }
            e[k] = nrm;
            if e[k] != T::zero() {
                if e[k + 1] < T::zero() {
                    e[k] = -e[k];
                }
                for i in (k + 1)..n {
                    e[i] = e[i] / e[k];
                }
                e[k + 1] = e[k + 1] + T::one();
            }
            e[k] = -e[k];
            if k + 1 < m && e[k] != T::zero() {
                for i in (k + 1)..m {
                    work[i] = T::zero();
                }
                for j in (k + 1)..n {
                    for i in (k + 1)..m {
                        work[i] = work[i] + e[j] * a[(i, j)];
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for i in (k + 1)..m {
                        a[(i, j)] = a[(i, j)] + t * work[i];
                    }
                }
            }
            for i in (k + 1)..n {
                v[(i, k)] = e[i];
            }
        }
    }

    // Set up the bidiagonal band for the sweep phase.
    let p = n;
    if nct < n {
        s[nct] = a[(nct, nct)];
    }
    if nrt + 1 < p {
        e[nrt] = a[(nrt, p - 1)];
    }
    e[p - 1] = T::zero();

    // Expand the left reflectors into U.
    for j in nct..nu {
        for i in 0..m {
            u[(i, j)] = T::zero();
        }
        u[(j, j)] = T::one();
    }
    for k in (0..nct).rev() {
        if s[k] != T::zero() {
            for j in (k + 1)..nu {
                let mut t = T::zero();
                for i in k..m {
                    t = t + u[(i, k)] * u[(i, j)];
                }
                t = -t / u[(k, k)];
                for i in k..m {
                    u[(i, j)] = u[(i, j)] + t * u[(i, k)];
                }
            }
            for i in k..m {
                u[(i, k)] = -u[(i, k)];
            }
            u[(k, k)] = T::one() + u[(k, k)];
            for i in 0..k.saturating_sub(1) {
                u[(i, k)] = T::zero();
            }
        } else {
            for i in 0..m {
                u[(i, k)] = T::zero();
            }
            u[(k, k)] = T::one();
        }
    }

    // Expand the right reflectors into V.
    for k in (0..n).rev() {
        if k < nrt && e[k] != T::zero() {
            for j in (k + 1)..nu {
                let mut t = T::zero();
                for i in (k + 1)..n {
                    t = t + v[(i, k)] * v[(i, j)];
                }
                t = -t / v[(k + 1, k)];
                for i in (k + 1)..n {
                    v[(i, j)] = v[(i, j)] + t * v[(i, k)];
                }
            }
        }
        for i in 0..n {
            v[(i, k)] = T::zero();
        }
        v[(k, k)] = T::one();
    }

    // Implicit-shift QR sweeps on the bidiagonal band.
    let mut p = p;
    let pp = p - 1;
    let mut iter = 0usize;
    let eps = T::epsilon();
    let tiny: T = 2.0_f64.powi(-966).into();
    while p > 0 {
        if iter > MAX_SWEEPS {
            return Err(LinError::ConvergenceFailure(
                "bidiagonal QR sweep exceeded its iteration cap",
            ));
        }

        // Locate the trailing block to work on.
        let mut k = p as isize - 2;
        while k >= 0 {
            let ku = k as usize;
            if e[ku].abs() <= tiny + eps * (s[ku].abs() + s[ku + 1].abs()) {
                e[ku] = T::zero();
                break;
            }
            k -= 1;
        }

        let kase;
        if k == p as isize - 2 {
            kase = 4;
        } else {
            let mut ks = p as isize - 1;
            while ks > k {
                let ksu = ks as usize;
                let mut t = T::zero();
                if ks != p as isize {
                    t = t + e[ksu].abs();
                }
                if ks != k + 1 {
                    t = t + e[ksu - 1].abs();
                }
                if s[ksu].abs() <= tiny + eps * t {
                    s[ksu] = T::zero();
                    break;
                }
                ks -= 1;
            }
            if ks == k {
                kase = 3;
            } else if ks == p as isize - 1 {
                kase = 1;
            } else {
                kase = 2;
                k = ks;
            }
        }
        let k = (k + 1) as usize;

        match kase {
            // Deflate the negligible s[p-1].
            1 => {
                let mut f = e[p - 2];
                e[p - 2] = T::zero();
                for j in (k..=(p - 2)).rev() {
                    let mut t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] = cs * e[j - 1];
                    }
                    for i in 0..n {
                        t = cs * v[(i, j)] + sn * v[(i, p - 1)];
                        v[(i, p - 1)] = -sn * v[(i, j)] + cs * v[(i, p - 1)];
                        v[(i, j)] = t;
                    }
                }
            }
            // Split at the negligible s[k-1].
            2 => {
                let mut f = e[k - 1];
                e[k - 1] = T::zero();
                for j in k..p {
                    let mut t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] = cs * e[j];
                    for i in 0..m {
                        t = cs * u[(i, j)] + sn * u[(i, k - 1)];
                        u[(i, k - 1)] = -sn * u[(i, j)] + cs * u[(i, k - 1)];
                        u[(i, j)] = t;
                    }
                }
            }
            // One QR step with the Wilkinson shift.
            3 => {
                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let half: T = 0.5.into();
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) * half;
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = T::zero();
                if b != T::zero() || c != T::zero() {
                    shift = (b * b + c).sqrt();
                    if b < T::zero() {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                for j in k..(p - 1) {
                    let mut t = f.hypot(g);
                    let mut cs = f / t;
                    let mut sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] = cs * s[j + 1];
                    for i in 0..n {
                        t = cs * v[(i, j)] + sn * v[(i, j + 1)];
                        v[(i, j + 1)] = -sn * v[(i, j)] + cs * v[(i, j + 1)];
                        v[(i, j)] = t;
                    }
                    t = f.hypot(g);
                    cs = f / t;
                    sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = -sn * e[j] + cs * s[j + 1];
                    g = sn * e[j + 1];
                    e[j + 1] = cs * e[j + 1];
                    if j < m - 1 {
                        for i in 0..m {
                            t = cs * u[(i, j)] + sn * u[(i, j + 1)];
                            u[(i, j + 1)] = -sn * u[(i, j)] + cs * u[(i, j + 1)];
                            u[(i, j)] = t;
                        }
                    }
                }
                e[p - 2] = f;
                iter += 1;
            }
            // Converged: fix signs and bubble into descending order.
            _ => {
                let mut k = k;
                if s[k] <= T::zero() {
                    s[k] = if s[k] < T::zero() { -s[k] } else { T::zero() };
                    for i in 0..=pp {
                        v[(i, k)] = -v[(i, k)];
                    }
                }
                while k < pp {
                    if s[k] >= s[k + 1] {
                        break;
                    }
                    s.swap(k, k + 1);
                    if k < n - 1 {
                        for i in 0..n {
                            let t = v[(i, k + 1)];
                            v[(i, k + 1)] = v[(i, k)];
                            v[(i, k)] = t;
                        }
                    }
                    if k < m - 1 {
                        for i in 0..m {
                            let t = u[(i, k + 1)];
                            u[(i, k + 1)] = u[(i, k)];
                            u[(i, k)] = t;
                        }
                    }
                    k += 1;
                }
                iter = 0;
                p -= 1;
            }
        }
    }

    Ok((u, s, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn reconstruct(svd: &Svd<f64>, m: usize, n: usize) -> Mat<f64> {
        let k = svd.values().len();
        Mat::from_fn(m, n, |i, j| {
            (0..k)
                .map(|l| svd.u()[(i, l)] * svd.values()[l] * svd.v()[(j, l)])
                .sum()
        })
    }

    #[test]
    fn reconstructs_square_matrix() {
        let a = Mat::from_fn(3, 3, |i, j| {
            [[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]][i][j]
        });
        let svd = Svd::new(&a).unwrap();
        let r = reconstruct(&svd, 3, 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(r[(i, j)], a[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn values_descend() {
        let a = Mat::from_fn(4, 3, |i, j| ((i * 3 + j) as f64).sin() + 2.0 * ((i + j) as f64).cos());
        let svd = Svd::new(&a).unwrap();
        let s = svd.values();
        assert_eq!(s.len(), 3);
        for w in s.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(s[s.len() - 1] >= 0.0);
    }

    #[test]
    fn economy_layout_tall_and_wide() {
        let tall = Mat::from_fn(5, 3, |i, j| (i + 2 * j) as f64 + 1.0);
        let svd = Svd::new(&tall).unwrap();
        assert_eq!((svd.u().nrows(), svd.u().ncols()), (5, 3));
        assert_eq!((svd.v().nrows(), svd.v().ncols()), (3, 3));
        assert_eq!(svd.values().len(), 3);

        let wide = Mat::from_fn(3, 5, |i, j| (i + 2 * j) as f64 + 1.0);
        let svd = Svd::new(&wide).unwrap();
        assert_eq!((svd.u().nrows(), svd.u().ncols()), (3, 3));
        assert_eq!((svd.v().nrows(), svd.v().ncols()), (5, 3));
        let r = reconstruct(&svd, 3, 5);
        for i in 0..3 {
            for j in 0..5 {
                assert_abs_diff_eq!(r[(i, j)], wide[(i, j)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn orthonormal_singular_vectors() {
        let a = Mat::from_fn(4, 4, |i, j| ((i * 4 + j) as f64).sin() + if i == j { 3.0 } else { 0.0 });
        let svd = Svd::new(&a).unwrap();
        let u = svd.u();
        for p in 0..4 {
            for q in 0..4 {
                let dot: f64 = (0..4).map(|i| u[(i, p)] * u[(i, q)]).sum();
                let expected = if p == q { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(dot, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn rank_detects_deficiency() {
        // Rank 1: every row is a multiple of the first.
        let a = Mat::from_fn(3, 3, |i, j| ((i + 1) * (j + 1)) as f64);
        let svd = Svd::new(&a).unwrap();
        assert_eq!(svd.rank(), 1);
        assert!(svd.is_singular());

        let full = Mat::from_fn(3, 3, |i, j| if i == j { (i + 1) as f64 } else { 0.1 });
        let svd = Svd::new(&full).unwrap();
        assert_eq!(svd.rank(), 3);
        assert!(!svd.is_singular());
    }

    #[test]
    fn pseudo_inverse_solve_matches_direct() {
        let a = Mat::from_fn(3, 3, |i, j| {
            [[0.9, 0.4, 0.7], [0.4, 0.5, 0.3], [0.7, 0.3, 0.8]][i][j]
        });
        let svd = Svd::new(&a).unwrap();
        let x = svd.solve(&[0.5, 0.5, 0.5]).unwrap();
        let expected = [-0.2027027, 0.8783784, 0.4729730];
        for i in 0..3 {
            assert_abs_diff_eq!(x[i], expected[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn norm2_and_cond_on_diagonal() {
        let a = Mat::from_fn(3, 3, |i, j| if i == j { [4.0, 2.0, 1.0][i] } else { 0.0 });
        let svd = Svd::new(&a).unwrap();
        assert_abs_diff_eq!(svd.norm2(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.cond(), 4.0, epsilon = 1e-12);
    }
}
