use criterion::{black_box, Criterion, criterion_group, criterion_main};
use densol::factor::Factor;
use densol::solver::bicg;
use faer::Mat;

fn bench_direct_vs_iterative(c: &mut Criterion) {
    let n = 200;
    // Diagonally dominant so the iterative path converges quickly.
    let a = Mat::from_fn(n, n, |i, j| {
        if i == j {
            n as f64
        } else {
            ((i * n + j) as f64).sin() * 0.5
        }
    });
    let b: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();

    c.bench_function("LU factor + solve", |ben| {
        ben.iter(|| {
            let lu = black_box(&a).lu().unwrap();
            let _x = lu.solve(black_box(&b)).unwrap();
        })
    });

    c.bench_function("Jacobi-preconditioned BiCG", |ben| {
        ben.iter(|| {
            let mut x = vec![0.0; n];
            let _stats = bicg::solve(black_box(&a), black_box(&b), &mut x).unwrap();
        })
    });

    c.bench_function("QR factor + solve", |ben| {
        ben.iter(|| {
            let qr = black_box(&a).qr().unwrap();
            let _x = qr.solve(black_box(&b)).unwrap();
        })
    });
}

criterion_group!(benches, bench_direct_vs_iterative);
criterion_main!(benches);
