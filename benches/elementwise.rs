use armature::{cube::CubeExpr, expr, Cube, Expr, Mat};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn flat_vs_coordinate(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for n in [16, 128, 1024] {
        let a = Mat::<f64>::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0));
        let b = Mat::<f64>::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0));
        let mut dst = Mat::<f64>::zeros(n, n);

        c.bench_function(&format!("elementwise-flat-{n}"), |bench| {
            bench.iter(|| dst.assign(&a + &b * 2.0 - 1.0))
        });
        c.bench_function(&format!("elementwise-strided-{n}"), |bench| {
            bench.iter(|| {
                dst.submatrix_mut(0, 0, n / 2, n)
                    .assign(a.submatrix(0, 0, n / 2, n) + b.submatrix(n / 2, 0, n / 2, n))
            })
        });
        c.bench_function(&format!("elementwise-transposed-{n}"), |bench| {
            bench.iter(|| dst.assign(a.t() + &b))
        });
        c.bench_function(&format!("elementwise-sqrt-{n}"), |bench| {
            bench.iter(|| black_box(expr::sqrt(expr::abs(&a)).eval()))
        });
    }
}

pub fn cubes(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let a = Cube::<f64>::from_fn(64, 64, 16, |_, _, _| rng.gen_range(-1.0..1.0));
    let b = Cube::<f64>::from_fn(64, 64, 16, |_, _, _| rng.gen_range(-1.0..1.0));
    c.bench_function("cube-schur-64x64x16", |bench| {
        bench.iter(|| black_box((&a % &b + 1.0).eval()))
    });
}

criterion_group!(benches, flat_vs_coordinate, cubes);
criterion_main!(benches);
