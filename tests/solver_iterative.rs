//! Integration tests for the iterative solvers.
//!
//! These tests run the preconditioned biconjugate gradient solver and the
//! power iteration against the direct factorization engine on the same
//! systems, checking that both paths reach the same answers.

use approx::assert_abs_diff_eq;
use densol::core::traits::MatVec;
use densol::factor::Factor;
use densol::preconditioner::Jacobi;
use densol::solver::{bicg, power, BiCgSolver, LinearSolver, PowerIteration};
use densol::utils::convergence::ConvergenceTest;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Construct a symmetric positive definite tridiagonal matrix of size `n`,
/// the right-hand side for the solution x = [1, ..., 1], and that solution.
fn spd_tridiagonal(n: usize) -> (Mat<f64>, Vec<f64>, Vec<f64>) {
    let mut a = Mat::zeros(n, n);
    for i in 0..n {
        a[(i, i)] = 2.0;
        if i > 0 {
            a[(i, i - 1)] = -1.0;
            a[(i - 1, i)] = -1.0;
        }
    }
    let x_true = vec![1.0; n];
    let mut b = vec![0.0; n];
    a.matvec(&x_true, &mut b);
    (a, b, x_true)
}

/// A non-symmetric, diagonally dominant matrix with a random perturbation.
fn dominant_nonsymmetric(n: usize, rng: &mut StdRng) -> Mat<f64> {
    Mat::from_fn(n, n, |i, j| {
        if i == j {
            n as f64 + 2.0
        } else {
            rng.r#gen::<f64>() - 0.5
        }
    })
}

/// BiCG with default settings solves the tridiagonal SPD system to the
/// requested tolerance and matches the exact solution.
#[test]
fn bicg_solves_spd_tridiagonal() {
    let (a, b, x_true) = spd_tridiagonal(20);
    let mut x = vec![0.0; 20];
    let stats = bicg::solve(&a, &b, &mut x).unwrap();
    assert!(stats.converged);
    assert!(stats.iterations <= 40);
    for i in 0..20 {
        assert_abs_diff_eq!(x[i], x_true[i], epsilon = 1e-4);
    }
}

/// BiCG agrees with the LU direct solve on a non-symmetric system, under
/// every stop-test mode.
#[test]
fn bicg_matches_lu_on_nonsymmetric_systems() {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 10;
    let a = dominant_nonsymmetric(n, &mut rng);
    let b: Vec<f64> = (0..n).map(|_| rng.r#gen::<f64>()).collect();
    let reference = a.lu().unwrap().solve(&b).unwrap();

    for index in 1..=4 {
        let test = ConvergenceTest::from_index(index).unwrap();
        let mut solver = BiCgSolver::new(1e-10, test, 500).unwrap();
        let mut x = vec![0.0; n];
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert!(stats.converged, "stop test {index} did not converge");
        for i in 0..n {
            assert_abs_diff_eq!(x[i], reference[i], epsilon = 1e-6);
        }
    }
}

/// An explicitly supplied Jacobi preconditioner behaves exactly like the
/// default one.
#[test]
fn explicit_jacobi_matches_default() {
    let (a, b, _) = spd_tridiagonal(15);
    let jacobi = Jacobi::new(&a);

    let mut x_default = vec![0.0; 15];
    let mut x_explicit = vec![0.0; 15];
    let mut solver = BiCgSolver::new(1e-9, ConvergenceTest::Residual, 200).unwrap();
    let s1 = solver.solve(&a, None, &b, &mut x_default).unwrap();
    let s2 = solver.solve(&a, Some(&jacobi), &b, &mut x_explicit).unwrap();

    assert!(s1.converged && s2.converged);
    for i in 0..15 {
        assert_abs_diff_eq!(x_default[i], x_explicit[i], epsilon = 1e-8);
    }
}

/// Exhausting the iteration cap is reported through the stats, never as an
/// error, and the iterate is still usable.
#[test]
fn cap_exhaustion_reports_softly() {
    let (a, b, _) = spd_tridiagonal(30);
    let mut solver = BiCgSolver::new(1e-14, ConvergenceTest::Residual, 3).unwrap();
    let mut x = vec![0.0; 30];
    let stats = solver.solve(&a, None, &b, &mut x).unwrap();
    assert!(!stats.converged);
    assert_eq!(stats.iterations, 3);
    assert!(x.iter().all(|v| v.is_finite()));
}

/// Power iteration recovers the largest symmetric eigenvalue found by the
/// direct eigendecomposition.
#[test]
fn power_iteration_matches_direct_eigenvalue() {
    let mut rng = StdRng::seed_from_u64(17);
    let n = 8;
    let bmat = Mat::from_fn(n, n, |_, _| rng.r#gen::<f64>() - 0.5);
    let a = Mat::from_fn(n, n, |i, j| {
        let mut s = if i == j { n as f64 } else { 0.0 };
        for k in 0..n {
            s += bmat[(k, i)] * bmat[(k, j)];
        }
        s
    });
    let expected = a.sym_eigen().unwrap().values()[0];

    let mut v = vec![1.0; n];
    let stats = power::eigen(&a, &mut v).unwrap();
    assert!(stats.converged);
    assert_abs_diff_eq!(stats.eigenvalue, expected, epsilon = 1e-3 * expected);

    // The returned vector is an eigenvector: A v ≈ λ v.
    let mut av = vec![0.0; n];
    a.matvec(&v.clone(), &mut av);
    for i in 0..n {
        assert_abs_diff_eq!(av[i], stats.eigenvalue * v[i], epsilon = 1e-3 * expected);
    }
}

/// A shift close to a subdominant eigenvalue still reports the un-shifted
/// dominant value.
#[test]
fn shifted_power_iteration_reports_unshifted_value() {
    let a = Mat::from_fn(3, 3, |i, j| {
        [[6.0, 0.5, 0.0], [0.5, 3.0, 0.0], [0.0, 0.0, 1.0]][i][j]
    });
    let expected = a.sym_eigen().unwrap().values()[0];

    let solver = PowerIteration::new(1.0, 1e-10, 1000).unwrap();
    let mut v = vec![1.0, 1.0, 1.0];
    let stats = solver.eigen(&a, &mut v).unwrap();
    assert!(stats.converged);
    assert_abs_diff_eq!(stats.eigenvalue, expected, epsilon = 1e-6);
}
