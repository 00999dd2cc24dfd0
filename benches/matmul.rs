use armature::{
    linalg::matmul::{matmul_with_path, MatmulPath},
    Expr, Mat, Parallelism, SpMat,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<f64> {
    Mat::from_fn(nrows, ncols, |_, _| rng.gen_range(-1.0..1.0))
}

pub fn paths(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for n in [2, 4, 8, 16, 64, 256] {
        let lhs = random(&mut rng, n, n);
        let rhs = random(&mut rng, n, n);
        let mut dst = Mat::zeros(n, n);

        for (name, path) in [
            ("tiny", MatmulPath::Tiny),
            ("emul", MatmulPath::Emulated),
            ("backend", MatmulPath::Backend),
            ("auto", MatmulPath::Auto),
        ] {
            if name == "emul" && n > 64 {
                continue;
            }
            c.bench_function(&format!("matmul-{name}-{n}"), |b| {
                b.iter(|| {
                    matmul_with_path(
                        dst.as_mut().into_submat(),
                        lhs.as_ref().as_submat(),
                        rhs.as_ref().as_submat(),
                        None,
                        1.0,
                        Parallelism::None,
                        path,
                    )
                })
            });
        }
    }
}

pub fn expressions(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    for n in [4, 32, 256] {
        let a = random(&mut rng, n, n);
        let b = random(&mut rng, n, n);
        let x = random(&mut rng, n, 1);

        c.bench_function(&format!("expr-product-{n}"), |bench| {
            bench.iter(|| black_box((&a * &b).eval()))
        });
        c.bench_function(&format!("expr-transposed-product-{n}"), |bench| {
            bench.iter(|| black_box((a.t() * &b).eval()))
        });
        c.bench_function(&format!("expr-gemv-{n}"), |bench| {
            bench.iter(|| black_box((&a * &x).eval()))
        });
    }
}

pub fn sparse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    for (n, density) in [(256, 0.05), (1024, 0.01)] {
        let dense = Mat::from_fn(n, n, |_, _| {
            if rng.gen_bool(density) {
                rng.gen_range(-1.0..1.0)
            } else {
                0.0
            }
        });
        let a = SpMat::from_dense(&dense);
        let x = random(&mut rng, n, 16);

        c.bench_function(&format!("sparse-dense-{n}"), |bench| {
            bench.iter(|| black_box(&a * &x))
        });
        c.bench_function(&format!("sparse-sparse-{n}"), |bench| {
            bench.iter(|| black_box(&a * &a))
        });
    }
}

criterion_group!(benches, paths, expressions, sparse);
criterion_main!(benches);
