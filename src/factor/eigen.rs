//! Eigendecomposition of square matrices.
//!
//! Two paths, matching how the handles are used downstream:
//!
//! - [`SymmetricEigen`] for real symmetric operators: Householder
//!   tridiagonalization followed by the implicit-shift QL iteration. All
//!   eigenvalues are real and the eigenvectors are orthonormal. The QL
//!   sweep produces ascending values; the handle reverses them so the
//!   public order is descending.
//! - [`Eigen`] for general square operators: orthogonal Hessenberg
//!   reduction followed by the real-Schur double-shift QR iteration.
//!   Eigenvalues may come in complex-conjugate pairs, exposed as parallel
//!   real/imaginary arrays; the eigenvector matrix uses the packed real
//!   layout where a pair at positions j, j+1 encodes `V[:,j] ± i·V[:,j+1]`.
//!   Eigenpairs are sorted descending by modulus, conjugate pairs kept
//!   adjacent.

use crate::error::LinError;
use faer::Mat;
use num_traits::Float;

/// Eigendecomposition of a real symmetric matrix.
///
/// Only the lower triangle of the source is read.
pub struct SymmetricEigen<T> {
    values: Vec<T>,
    vectors: Mat<T>,
}

impl<T: Float + From<f64>> SymmetricEigen<T> {
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        let m = a.nrows();
        let n = a.ncols();
        if m != n {
            return Err(LinError::DimensionMismatch {
                expected: (m, m),
                found: (m, n),
            });
        }

        // Mirror the lower triangle so the reduction sees an exactly
        // symmetric matrix.
        let mut v = Mat::from_fn(n, n, |i, j| if i >= j { a[(i, j)] } else { a[(j, i)] });
        let mut d = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];

        tred2(&mut v, &mut d, &mut e, n);
        tql2(&mut v, &mut d, &mut e, n)?;

        // QL leaves the spectrum ascending; flip to descending along with
        // the eigenvector columns.
        d.reverse();
        let vectors = Mat::from_fn(n, n, |i, j| v[(i, n - 1 - j)]);
        Ok(Self {
            values: d,
            vectors,
        })
    }

    /// Eigenvalues, descending.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Orthonormal eigenvectors, column j pairing with `values()[j]`.
    pub fn vectors(&self) -> &Mat<T> {
        &self.vectors
    }
}

/// Eigendecomposition of a general (possibly non-symmetric) real matrix.
pub struct Eigen<T> {
    re: Vec<T>,
    im: Vec<T>,
    v: Mat<T>,
}

impl<T: Float + From<f64>> Eigen<T> {
    pub fn new(a: &Mat<T>) -> Result<Self, LinError> {
        let m = a.nrows();
        let n = a.ncols();
        if m != n {
            return Err(LinError::DimensionMismatch {
                expected: (m, m),
                found: (m, n),
            });
        }

        let mut h = Mat::from_fn(n, n, |i, j| a[(i, j)]);
        let mut v = Mat::from_fn(n, n, |_, _| T::zero());
        let mut re = vec![T::zero(); n];
        let mut im = vec![T::zero(); n];

        orthes(&mut h, &mut v, n);
        hqr2(&mut h, &mut v, &mut re, &mut im, n)?;
        sort_pairs_descending(&mut re, &mut im, &mut v, n);

        Ok(Self { re, im, v })
    }

    /// Real parts of the eigenvalues, sorted descending by modulus.
    pub fn values_re(&self) -> &[T] {
        &self.re
    }

    /// Imaginary parts of the eigenvalues, parallel to `values_re`.
    /// Complex-conjugate pairs occupy adjacent positions.
    pub fn values_im(&self) -> &[T] {
        &self.im
    }

    /// Eigenvectors in the packed real layout: a real eigenvalue at j has
    /// the real eigenvector `V[:,j]`; a conjugate pair at j, j+1 has the
    /// eigenvectors `V[:,j] ± i·V[:,j+1]`.
    pub fn vectors(&self) -> &Mat<T> {
        &self.v
    }
}

// ── symmetric path ──────────────────────────────────────────────────

/// Householder reduction to symmetric tridiagonal form. On return `d`
/// holds the diagonal, `e` the subdiagonal (in e[1..]), and `v` the
/// accumulated orthogonal transform.
fn tred2<T: Float>(v: &mut Mat<T>, d: &mut [T], e: &mut [T], n: usize) {
    for j in 0..n {
        d[j] = v[(n - 1, j)];
    }

    for i in (1..n).rev() {
        let mut scale = T::zero();
        let mut h = T::zero();
        for k in 0..i {
            scale = scale + d[k].abs();
        }
        if scale == T::zero() {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1, j)];
                v[(i, j)] = T::zero();
                v[(j, i)] = T::zero();
            }
        } else {
            // Generate the Householder vector.
            for k in 0..i {
                d[k] = d[k] / scale;
                h = h + d[k] * d[k];
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > T::zero() {
                g = -g;
            }
            e[i] = scale * g;
            h = h - f * g;
            d[i - 1] = f - g;
            for j in 0..i {
                e[j] = T::zero();
            }

            // Apply the similarity transformation to the leading block.
            for j in 0..i {
                f = d[j];
                v[(j, i)] = f;
                g = e[j] + v[(j, j)] * f;
                for k in (j + 1)..i {
                    g = g + v[(k, j)] * d[k];
                    e[k] = e[k] + v[(k, j)] * f;
                }
                e[j] = g;
            }
            f = T::zero();
            for j in 0..i {
                e[j] = e[j] / h;
                f = f + e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] = e[j] - hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[(k, j)] = v[(k, j)] - (f * e[k] + g * d[k]);
                }
                d[j] = v[(i - 1, j)];
                v[(i, j)] = T::zero();
            }
        }
        d[i] = h;
    }

    // Accumulate the transformations.
    for i in 0..(n - 1) {
        v[(n - 1, i)] = v[(i, i)];
        v[(i, i)] = T::one();
        let h = d[i + 1];
        if h != T::zero() {
            for k in 0..=i {
                d[k] = v[(k, i + 1)] / h;
            }
            for j in 0..=i {
                let mut g = T::zero();
                for k in 0..=i {
                    g = g + v[(k, i + 1)] * v[(k, j)];
                }
                for k in 0..=i {
                    v[(k, j)] = v[(k, j)] - g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[(k, i + 1)] = T::zero();
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1, j)];
        v[(n - 1, j)] = T::zero();
    }
    v[(n - 1, n - 1)] = T::one();
    e[0] = T::zero();
}

/// Implicit-shift QL iteration on a symmetric tridiagonal matrix,
/// accumulating rotations into `v`. Eigenvalues land in `d` ascending.
fn tql2<T: Float>(v: &mut Mat<T>, d: &mut [T], e: &mut [T], n: usize) -> Result<(), LinError> {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = T::zero();

    let mut f = T::zero();
    let mut tst1 = T::zero();
    let eps = T::epsilon();
    let two = T::one() + T::one();

    for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }
        if m >= n {
            m = n - 1;
        }

        if m > l {
            let mut iter = 0usize;
            loop {
                iter += 1;
                if iter > 50 {
                    return Err(LinError::ConvergenceFailure(
                        "tridiagonal QL iteration exceeded its cap",
                    ));
                }

                // Implicit shift.
                let g = d[l];
                let mut p = (d[l + 1] - g) / (two * e[l]);
                let mut r = p.hypot(T::one());
                if p < T::zero() {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for i in (l + 2)..n {
                    d[i] = d[i] - h;
                }
                f = f + h;

                // Implicit QL sweep.
                p = d[m];
                let mut c = T::one();
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = T::zero();
                let mut s2 = T::zero();
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    let g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        h = v[(k, i + 1)];
                        v[(k, i + 1)] = s * v[(k, i)] + c * h;
                        v[(k, i)] = c * v[(k, i)] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] = d[l] + f;
        e[l] = T::zero();
    }

    // Selection sort into ascending order, carrying the vectors.
    for i in 0..(n - 1) {
        let mut k = i;
        let mut p = d[i];
        for j in (i + 1)..n {
            if d[j] < p {
                k = j;
                p = d[j];
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for j in 0..n {
                let t = v[(j, i)];
                v[(j, i)] = v[(j, k)];
                v[(j, k)] = t;
            }
        }
    }
    Ok(())
}

// ── general path ────────────────────────────────────────────────────

/// Orthogonal reduction to upper Hessenberg form, accumulating the
/// transform into `v`.
fn orthes<T: Float>(h: &mut Mat<T>, v: &mut Mat<T>, n: usize) {
    if n == 0 {
        return;
    }
    let high = n - 1;
    let mut ort = vec![T::zero(); n];

    for m in 1..high {
        let mut scale = T::zero();
        for i in m..=high {
            scale = scale + h[(i, m - 1)].abs();
        }
        if scale != T::zero() {
            let mut hsum = T::zero();
            for i in (m..=high).rev() {
                ort[i] = h[(i, m - 1)] / scale;
                hsum = hsum + ort[i] * ort[i];
            }
            let mut g = hsum.sqrt();
            if ort[m] > T::zero() {
                g = -g;
            }
            hsum = hsum - ort[m] * g;
            ort[m] = ort[m] - g;

            // Householder similarity: H ← (I − u·uᵀ/h) H (I − u·uᵀ/h).
            for j in m..n {
                let mut f = T::zero();
                for i in (m..=high).rev() {
                    f = f + ort[i] * h[(i, j)];
                }
                f = f / hsum;
                for i in m..=high {
                    h[(i, j)] = h[(i, j)] - f * ort[i];
                }
            }
            for i in 0..=high {
                let mut f = T::zero();
                for j in (m..=high).rev() {
                    f = f + ort[j] * h[(i, j)];
                }
                f = f / hsum;
                for j in m..=high {
                    h[(i, j)] = h[(i, j)] - f * ort[j];
                }
            }
            ort[m] = scale * ort[m];
            h[(m, m - 1)] = scale * g;
        }
    }

    // Accumulate the transform.
    for i in 0..n {
        for j in 0..n {
            v[(i, j)] = if i == j { T::one() } else { T::zero() };
        }
    }
    for m in (1..high).rev() {
        if h[(m, m - 1)] != T::zero() {
            for i in (m + 1)..=high {
                ort[i] = h[(i, m - 1)];
            }
            for j in m..=high {
                let mut g = T::zero();
                for i in m..=high {
                    g = g + ort[i] * v[(i, j)];
                }
                g = (g / ort[m]) / h[(m, m - 1)];
                for i in m..=high {
                    v[(i, j)] = v[(i, j)] + g * ort[i];
                }
            }
        }
    }
}

/// Complex scalar division (Smith's algorithm): (xr + i·xi) / (yr + i·yi).
fn cdiv<T: Float>(xr: T, xi: T, yr: T, yi: T) -> (T, T) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

/// Real-Schur double-shift QR iteration on an upper Hessenberg matrix,
/// with eigenvector back-substitution and back-transformation.
#[allow(clippy::too_many_lines)]
fn hqr2<T: Float + From<f64>>(
    h: &mut Mat<T>,
    v: &mut Mat<T>,
    d: &mut [T],
    e: &mut [T],
    nn: usize,
) -> Result<(), LinError> {
    if nn == 0 {
        return Ok(());
    }
    let low: isize = 0;
    let high: isize = nn as isize - 1;
    let eps = T::epsilon();
    let two = T::one() + T::one();
    let mut exshift = T::zero();
    let mut p = T::zero();
    let mut q = T::zero();
    let mut r = T::zero();
    let mut s = T::zero();
    let mut z = T::zero();
    let mut w = T::zero();
    let mut x = T::zero();
    let mut y = T::zero();

    // Frobenius-style norm of the Hessenberg band.
    let mut norm = T::zero();
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm = norm + h[(i, j)].abs();
        }
    }

    let mut en: isize = high;
    let mut iter = 0usize;
    let mut total_iter = 0usize;
    while en >= low {
        if total_iter > 30 * nn {
            return Err(LinError::ConvergenceFailure(
                "Schur QR iteration exceeded its cap",
            ));
        }
        let n = en as usize;

        // Look for a single small sub-diagonal element.
        let mut l = en;
        while l > low {
            let lu = l as usize;
            s = h[(lu - 1, lu - 1)].abs() + h[(lu, lu)].abs();
            if s == T::zero() {
                s = norm;
            }
            if h[(lu, lu - 1)].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == en {
            // One real root.
            h[(n, n)] = h[(n, n)] + exshift;
            d[n] = h[(n, n)];
            e[n] = T::zero();
            en -= 1;
            iter = 0;
        } else if l == en - 1 {
            // A 2x2 block: either two real roots or a conjugate pair.
            w = h[(n, n - 1)] * h[(n - 1, n)];
            p = (h[(n - 1, n - 1)] - h[(n, n)]) / two;
            q = p * p + w;
            z = q.abs().sqrt();
            h[(n, n)] = h[(n, n)] + exshift;
            h[(n - 1, n - 1)] = h[(n - 1, n - 1)] + exshift;
            x = h[(n, n)];

            if q >= T::zero() {
                // Real pair.
                z = if p >= T::zero() { p + z } else { p - z };
                d[n - 1] = x + z;
                d[n] = d[n - 1];
                if z != T::zero() {
                    d[n] = x - w / z;
                }
                e[n - 1] = T::zero();
                e[n] = T::zero();
                x = h[(n, n - 1)];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p = p / r;
                q = q / r;
                for j in (n - 1)..nn {
                    z = h[(n - 1, j)];
                    h[(n - 1, j)] = q * z + p * h[(n, j)];
                    h[(n, j)] = q * h[(n, j)] - p * z;
                }
                for i in 0..=n {
                    z = h[(i, n - 1)];
                    h[(i, n - 1)] = q * z + p * h[(i, n)];
                    h[(i, n)] = q * h[(i, n)] - p * z;
                }
                for i in 0..nn {
                    z = v[(i, n - 1)];
                    v[(i, n - 1)] = q * z + p * v[(i, n)];
                    v[(i, n)] = q * v[(i, n)] - p * z;
                }
            } else {
                // Complex pair.
                d[n - 1] = x + p;
                d[n] = x + p;
                e[n - 1] = z;
                e[n] = -z;
            }
            en -= 2;
            iter = 0;
        } else {
            // No convergence yet: form a shift and run a double QR step.
            x = h[(n, n)];
            y = T::zero();
            w = T::zero();
            if l < en {
                y = h[(n - 1, n - 1)];
                w = h[(n, n - 1)] * h[(n - 1, n)];
            }

            // Exceptional shifts to shake off stagnation.
            if iter == 10 {
                exshift = exshift + x;
                for i in (low as usize)..=n {
                    h[(i, i)] = h[(i, i)] - x;
                }
                s = h[(n, n - 1)].abs() + h[(n - 1, n - 2)].abs();
                let c075: T = 0.75.into();
                x = c075 * s;
                y = x;
                let c04375: T = 0.4375.into();
                w = -c04375 * s * s;
            }
            if iter == 30 {
                s = (y - x) / two;
                s = s * s + w;
                if s > T::zero() {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / two + s);
                    for i in (low as usize)..=n {
                        h[(i, i)] = h[(i, i)] - s;
                    }
                    exshift = exshift + s;
                    let c: T = 0.964.into();
                    x = c;
                    y = c;
                    w = c;
                }
            }
            iter += 1;
            total_iter += 1;

            // Look for two consecutive small sub-diagonal elements.
            let mut m = en - 2;
            while m >= l {
                let mu = m as usize;
                z = h[(mu, mu)];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(mu + 1, mu)] + h[(mu, mu + 1)];
                q = h[(mu + 1, mu + 1)] - z - r - s;
                r = h[(mu + 2, mu + 1)];
                s = p.abs() + q.abs() + r.abs();
                p = p / s;
                q = q / s;
                r = r / s;
                if m == l {
                    break;
                }
                if h[(mu, mu - 1)].abs() * (q.abs() + r.abs())
                    < eps
                        * (p.abs()
                            * (h[(mu - 1, mu - 1)].abs() + z.abs() + h[(mu + 1, mu + 1)].abs()))
                {
                    break;
                }
                m -= 1;
            }
            let m = m as usize;
            for i in (m + 2)..=n {
                h[(i, i - 2)] = T::zero();
                if i > m + 2 {
                    h[(i, i - 3)] = T::zero();
                }
            }

            // Double QR step on rows l..=n and columns m..=n.
            for k in m..n {
                let notlast = k != n - 1;
                if k != m {
                    p = h[(k, k - 1)];
                    q = h[(k + 1, k - 1)];
                    r = if notlast { h[(k + 2, k - 1)] } else { T::zero() };
                    x = p.abs() + q.abs() + r.abs();
                    if x == T::zero() {
                        continue;
                    }
                    p = p / x;
                    q = q / x;
                    r = r / x;
                }
                s = (p * p + q * q + r * r).sqrt();
                if p < T::zero() {
                    s = -s;
                }
                if s != T::zero() {
                    if k != m {
                        h[(k, k - 1)] = -s * x;
                    } else if l != m as isize {
                        h[(k, k - 1)] = -h[(k, k - 1)];
                    }
                    p = p + s;
                    x = p / s;
                    y = q / s;
                    z = r / s;
                    q = q / p;
                    r = r / p;

                    for j in k..nn {
                        p = h[(k, j)] + q * h[(k + 1, j)];
                        if notlast {
                            p = p + r * h[(k + 2, j)];
                            h[(k + 2, j)] = h[(k + 2, j)] - p * z;
                        }
                        h[(k, j)] = h[(k, j)] - p * x;
                        h[(k + 1, j)] = h[(k + 1, j)] - p * y;
                    }
                    for i in 0..=n.min(k + 3) {
                        p = x * h[(i, k)] + y * h[(i, k + 1)];
                        if notlast {
                            p = p + z * h[(i, k + 2)];
                            h[(i, k + 2)] = h[(i, k + 2)] - p * r;
                        }
                        h[(i, k)] = h[(i, k)] - p;
                        h[(i, k + 1)] = h[(i, k + 1)] - p * q;
                    }
                    for i in 0..nn {
                        p = x * v[(i, k)] + y * v[(i, k + 1)];
                        if notlast {
                            p = p + z * v[(i, k + 2)];
                            v[(i, k + 2)] = v[(i, k + 2)] - p * r;
                        }
                        v[(i, k)] = v[(i, k)] - p;
                        v[(i, k + 1)] = v[(i, k + 1)] - p * q;
                    }
                }
            }
        }
    }

    // Back-substitution: eigenvectors of the triangular form.
    if norm == T::zero() {
        return Ok(());
    }

    for n in (0..nn).rev() {
        p = d[n];
        q = e[n];
        if q == T::zero() {
            // Real eigenvector.
            let mut l = n;
            h[(n, n)] = T::one();
            for i in (0..n).rev() {
                w = h[(i, i)] - p;
                r = T::zero();
                for j in l..=n {
                    r = r + h[(i, j)] * h[(j, n)];
                }
                if e[i] < T::zero() {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == T::zero() {
                        if w != T::zero() {
                            h[(i, n)] = -r / w;
                        } else {
                            h[(i, n)] = -r / (eps * norm);
                        }
                    } else {
                        // Solve the 2x2 real system for the pair rows.
                        x = h[(i, i + 1)];
                        y = h[(i + 1, i)];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        let t = (x * s - z * r) / q;
                        h[(i, n)] = t;
                        if x.abs() > z.abs() {
                            h[(i + 1, n)] = (-r - w * t) / x;
                        } else {
                            h[(i + 1, n)] = (-s - y * t) / z;
                        }
                    }
                    // Overflow control.
                    let t = h[(i, n)].abs();
                    if (eps * t) * t > T::one() {
                        for j in i..=n {
                            h[(j, n)] = h[(j, n)] / t;
                        }
                    }
                }
            }
        } else if q < T::zero() && n > 0 {
            // Complex eigenvector (paired with column n-1).
            let mut l = n - 1;
            if h[(n, n - 1)].abs() > h[(n - 1, n)].abs() {
                h[(n - 1, n - 1)] = q / h[(n, n - 1)];
                h[(n - 1, n)] = -(h[(n, n)] - p) / h[(n, n - 1)];
            } else {
                let (cr, ci) = cdiv(T::zero(), -h[(n - 1, n)], h[(n - 1, n - 1)] - p, q);
                h[(n - 1, n - 1)] = cr;
                h[(n - 1, n)] = ci;
            }
            h[(n, n - 1)] = T::zero();
            h[(n, n)] = T::one();
            for i in (0..(n - 1)).rev() {
                let mut ra = T::zero();
                let mut sa = T::zero();
                for j in l..=n {
                    ra = ra + h[(i, j)] * h[(j, n - 1)];
                    sa = sa + h[(i, j)] * h[(j, n)];
                }
                w = h[(i, i)] - p;
                if e[i] < T::zero() {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == T::zero() {
                        let (cr, ci) = cdiv(-ra, -sa, w, q);
                        h[(i, n - 1)] = cr;
                        h[(i, n)] = ci;
                    } else {
                        // Solve the complex 2x2 system.
                        x = h[(i, i + 1)];
                        y = h[(i + 1, i)];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * two * q;
                        if vr == T::zero() && vi == T::zero() {
                            vr = eps
                                * norm
                                * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (cr, ci) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[(i, n - 1)] = cr;
                        h[(i, n)] = ci;
                        if x.abs() > z.abs() + q.abs() {
                            h[(i + 1, n - 1)] =
                                (-ra - w * h[(i, n - 1)] + q * h[(i, n)]) / x;
                            h[(i + 1, n)] = (-sa - w * h[(i, n)] - q * h[(i, n - 1)]) / x;
                        } else {
                            let (cr, ci) =
                                cdiv(-r - y * h[(i, n - 1)], -s - y * h[(i, n)], z, q);
                            h[(i + 1, n - 1)] = cr;
                            h[(i + 1, n)] = ci;
                        }
                    }
                    // Overflow control.
                    let t = h[(i, n - 1)].abs().max(h[(i, n)].abs());
                    if (eps * t) * t > T::one() {
                        for j in i..=n {
                            h[(j, n - 1)] = h[(j, n - 1)] / t;
                            h[(j, n)] = h[(j, n)] / t;
                        }
                    }
                }
            }
        }
    }

    // Back-transform to eigenvectors of the original matrix.
    for j in (0..nn).rev() {
        for i in 0..nn {
            z = T::zero();
            for k in 0..=j {
                z = z + v[(i, k)] * h[(k, j)];
            }
            v[(i, j)] = z;
        }
    }

    Ok(())
}

/// Sort eigenpairs descending by modulus, keeping conjugate pairs
/// adjacent and permuting the packed eigenvector columns with them.
fn sort_pairs_descending<T: Float>(re: &mut [T], im: &mut [T], v: &mut Mat<T>, n: usize) {
    // Collect blocks: a single column for a real eigenvalue, two columns
    // for a conjugate pair.
    let mut blocks: Vec<(usize, usize)> = Vec::new();
    let mut j = 0;
    while j < n {
        if im[j] != T::zero() && j + 1 < n {
            blocks.push((j, 2));
            j += 2;
        } else {
            blocks.push((j, 1));
            j += 1;
        }
    }
    let modulus = |k: usize| (re[k] * re[k] + im[k] * im[k]).sqrt();
    blocks.sort_by(|a, b| {
        let (ma, mb) = (modulus(a.0), modulus(b.0));
        mb.partial_cmp(&ma)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then_with(|| {
                re[b.0]
                    .partial_cmp(&re[a.0])
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
    });

    let mut new_re = Vec::with_capacity(n);
    let mut new_im = Vec::with_capacity(n);
    let mut order = Vec::with_capacity(n);
    for &(start, len) in &blocks {
        for k in start..(start + len) {
            new_re.push(re[k]);
            new_im.push(im[k]);
            order.push(k);
        }
    }
    re.copy_from_slice(&new_re);
    im.copy_from_slice(&new_im);
    let old = Mat::from_fn(n, n, |i, j| v[(i, j)]);
    for (jj, &src) in order.iter().enumerate() {
        for i in 0..n {
            v[(i, jj)] = old[(i, src)];
        }
    }
}
