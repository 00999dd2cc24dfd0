use armature::{
    c64, col,
    cube::{self, CubeExpr},
    linalg, mat, row,
    sparse::SpExpr,
    Col, Cube, Expr, LinalgError, Mat, SpMat,
};
use assert_approx_eq::assert_approx_eq;

#[test]
fn scaling_and_doubling_are_bit_identical() {
    let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0f64]];
    let scaled = (&a * 2.0).eval();
    let doubled = (&a + &a).eval();
    let expected = mat![[2.0, 4.0, 6.0], [8.0, 10.0, 12.0], [14.0, 16.0, 18.0f64]];

    assert_eq!(scaled, expected);
    for (x, y) in core::iter::zip(scaled.as_slice(), doubled.as_slice()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[test]
#[should_panic(expected = "addition: incompatible matrix dimensions: 2x3 and 3x2")]
fn adding_mismatched_matrices_fails() {
    let a = Mat::<f64>::zeros(2, 3);
    let b = Mat::<f64>::zeros(3, 2);
    let _ = (&a + &b).eval();
}

#[test]
fn sparse_insert_then_delete() {
    let mut m = SpMat::<f64>::new(4, 4);
    m.add_element(0, 0, 5.0);
    m.add_element(2, 1, 3.0);
    m.add_element(3, 3, 7.0);

    assert_eq!(m.nnz(), 3);
    assert_eq!(m.col_ptrs(), &[0, 1, 2, 2, 3]);
    assert_eq!(m.row_indices(), &[0, 2, 3]);
    assert_eq!(m.values(), &[5.0, 3.0, 7.0]);

    assert_eq!(m.delete_element(2, 1), Some(3.0));
    assert_eq!(m.nnz(), 2);
    assert_eq!(m.col_ptrs(), &[0, 1, 1, 1, 2]);
    assert_eq!(m.row_indices(), &[0, 3]);
    assert_eq!(m.values(), &[5.0, 7.0]);
}

#[test]
fn tiny_and_large_products_agree_with_reference() {
    for n in [1, 2, 3, 4, 5, 9, 17] {
        let a = Mat::from_fn(n, n, |i, j| (i * n + j) as f64 / 7.0 - 1.0);
        let b = Mat::from_fn(n, n, |i, j| (i + 2 * j) as f64 / 5.0);
        let c = (&a * &b).eval();
        for i in 0..n {
            for j in 0..n {
                let expected: f64 = (0..n).map(|k| a.read(i, k) * b.read(k, j)).sum();
                assert_approx_eq!(c.read(i, j), expected, 1e-10);
            }
        }
    }
}

#[test]
fn integer_products_use_the_emulation() {
    let a = Mat::from_fn(10, 10, |i, j| (i + j) as i64);
    let b = Mat::<i64>::identity(10, 10);
    assert_eq!((&a * &b).eval(), a);
    assert_eq!((&a * &b * 3i64).eval(), (&a * 3i64).eval());
}

#[test]
fn mixed_element_types_promote() {
    let a = mat![[1i32, 2], [3, 4]];
    let b = mat![[0.5, 0.25], [1.0, 2.0f64]];
    assert_eq!((&a + &b).eval(), mat![[1.5, 2.25], [4.0, 6.0f64]]);
    assert_eq!((&a * &b).eval(), mat![[2.5, 4.25], [5.5, 8.75f64]]);

    let z = mat![[c64::new(0.0, 1.0)], [c64::new(1.0, 0.0)]];
    let v = col![2.0, 3.0f64];
    let w = (&v % &z).eval();
    assert_eq!(w.read(0, 0), c64::new(0.0, 2.0));
    assert_eq!(w.read(1, 0), c64::new(3.0, 0.0));
}

#[test]
fn vectors_and_outer_products() {
    let x: Col<f64> = col![1.0, 2.0, 3.0];
    let y = row![4.0, 5.0f64];
    let outer = (&x * &y).eval();
    assert_eq!(outer, mat![[4.0, 5.0], [8.0, 10.0], [12.0, 15.0]]);
    assert_eq!(linalg::reductions::dot(&x, &x), 14.0);
}

#[test]
fn solving_and_inverting() {
    let a = mat![[4.0, 3.0], [6.0, 3.0f64]];
    let b = mat![[10.0], [12.0f64]];
    let x = linalg::lu::try_solve(&a, &b).unwrap();
    assert_approx_eq!(x.read(0, 0), 1.0, 1e-12);
    assert_approx_eq!(x.read(1, 0), 2.0, 1e-12);
    assert_approx_eq!(linalg::lu::det(&a), -6.0, 1e-12);

    let singular = mat![[1.0, 2.0], [2.0, 4.0f64]];
    assert_eq!(linalg::lu::try_inv(&singular), Err(LinalgError::Singular));
}

#[test]
fn sparse_and_dense_expressions_meet() {
    let a = SpMat::try_new_from_triplets(3, 3, &[(0, 0, 2.0), (1, 2, -1.0), (2, 1, 4.0f64)])
        .unwrap();
    let d = Mat::from_fn(3, 2, |i, j| (i + j) as f64);

    let product = &a * &d;
    let expected = (&a.to_dense() * &d).eval();
    assert_eq!(product, expected);

    let sum = (&a + &a * 2.0f64).eval();
    assert_eq!(sum.to_dense(), (&a.to_dense() * 3.0f64).eval());
}

#[test]
fn cube_slices_evaluate_like_matrices() {
    let mut c = Cube::<f64>::zeros(2, 2, 3);
    for k in 0..3 {
        c.slice_mut(k).assign(&Mat::full(2, 2, k as f64));
    }
    let doubled = (&c + &c).eval();
    for k in 0..3 {
        assert_eq!(doubled.slice(k).to_owned(), Mat::full(2, 2, 2.0 * k as f64));
    }

    let stacked = cube::join_slices(&c, &doubled).eval();
    assert_eq!(stacked.nslices(), 6);
    assert_eq!(stacked.slice(5).to_owned(), Mat::full(2, 2, 4.0));
    let totals = cube::sum(&stacked, 2).eval();
    assert_eq!(totals.slice(0).to_owned(), Mat::full(2, 2, 9.0));
}
