use armature::{
    linalg::matmul::{matmul_with_path, MatmulPath},
    mat::{from_raw_parts, from_raw_parts_mut},
    Expr, Mat, Parallelism, SpMat,
};
use assert_approx_eq::assert_approx_eq;
use core::iter::zip;
use proptest::{collection::vec, prelude::*};

fn dense(nrows: usize, ncols: usize) -> impl Strategy<Value = Mat<f64>> {
    vec(-10.0..10.0f64, nrows * ncols)
        .prop_map(move |data| Mat::from_column_major_slice(&data, nrows, ncols))
}

fn any_dense(max: usize) -> impl Strategy<Value = Mat<f64>> {
    (1..=max, 1..=max).prop_flat_map(|(m, n)| dense(m, n))
}

fn product_operands(max: usize) -> impl Strategy<Value = (Mat<f64>, Mat<f64>)> {
    (1..=max, 1..=max, 1..=max).prop_flat_map(|(m, k, n)| (dense(m, k), dense(k, n)))
}

// about half of the entries are zero
fn sparse_pattern(max: usize) -> impl Strategy<Value = Mat<i64>> {
    (1..=max, 1..=max).prop_flat_map(|(m, n)| {
        vec(prop_oneof![Just(0i64), -9..10i64], m * n)
            .prop_map(move |data| Mat::from_column_major_slice(&data, m, n))
    })
}

fn assert_close(a: &Mat<f64>, b: &Mat<f64>, eps: f64) {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    for (&x, &y) in zip(a.as_slice(), b.as_slice()) {
        assert_approx_eq!(x, y, eps);
    }
}

fn product(lhs: &Mat<f64>, rhs: &Mat<f64>, path: MatmulPath) -> Mat<f64> {
    let mut dst = Mat::<f64>::zeros(lhs.nrows(), rhs.ncols());
    matmul_with_path(
        dst.as_mut().into_submat(),
        lhs.as_ref().as_submat(),
        rhs.as_ref().as_submat(),
        None,
        1.0,
        Parallelism::None,
        path,
    );
    dst
}

fn check_sparse_invariants(m: &SpMat<i64>) {
    let col_ptrs = m.col_ptrs();
    assert_eq!(col_ptrs.len(), m.ncols() + 1);
    assert_eq!(col_ptrs[0], 0);
    assert_eq!(col_ptrs[m.ncols()], m.nnz());
    assert_eq!(m.row_indices().len(), m.nnz());
    assert_eq!(m.values().len(), m.nnz());
    for col in 0..m.ncols() {
        assert!(col_ptrs[col] <= col_ptrs[col + 1]);
        let rows = m.row_indices_of_col(col);
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert!(rows.iter().all(|&row| row < m.nrows()));
    }
}

#[derive(Clone, Debug)]
enum Edit {
    Add(usize, usize, i64),
    Delete(usize, usize),
    ShedRow(usize),
    ShedCol(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0..8usize, 0..8usize, -5..6i64).prop_map(|(i, j, v)| Edit::Add(i, j, v)),
        2 => (0..8usize, 0..8usize).prop_map(|(i, j)| Edit::Delete(i, j)),
        1 => (0..8usize).prop_map(Edit::ShedRow),
        1 => (0..8usize).prop_map(Edit::ShedCol),
    ]
}

proptest! {
    #[test]
    fn product_path_does_not_change_result((lhs, rhs) in product_operands(12)) {
        let reference = product(&lhs, &rhs, MatmulPath::Emulated);
        assert_close(&product(&lhs, &rhs, MatmulPath::Tiny), &reference, 1e-10);
        assert_close(&product(&lhs, &rhs, MatmulPath::Backend), &reference, 1e-10);
        assert_close(&product(&lhs, &rhs, MatmulPath::Auto), &reference, 1e-10);
        assert_close(&(&lhs * &rhs).eval(), &reference, 1e-10);
    }

    #[test]
    fn single_precision_product_paths_agree((lhs, rhs) in product_operands(10)) {
        let lhs = Mat::from_fn(lhs.nrows(), lhs.ncols(), |i, j| lhs.read(i, j) as f32);
        let rhs = Mat::from_fn(rhs.nrows(), rhs.ncols(), |i, j| rhs.read(i, j) as f32);
        let run = |path| {
            let mut dst = Mat::<f32>::zeros(lhs.nrows(), rhs.ncols());
            matmul_with_path(
                dst.as_mut().into_submat(),
                lhs.as_ref().as_submat(),
                rhs.as_ref().as_submat(),
                None,
                1.0,
                Parallelism::None,
                path,
            );
            dst
        };
        let reference = run(MatmulPath::Emulated);
        for path in [MatmulPath::Tiny, MatmulPath::Backend] {
            let other = run(path);
            for (&x, &y) in zip(other.as_slice(), reference.as_slice()) {
                prop_assert!((x - y).abs() <= 1e-4 * (1.0 + y.abs()));
            }
        }
    }

    #[test]
    fn flat_and_coordinate_access_agree((a, b) in (1..=9usize, 1..=9usize).prop_flat_map(|(m, n)| (dense(m, n), dense(m, n)))) {
        let flat = (&a + &b * 2.0f64).eval();
        // the transposes only support coordinate access
        let at = a.t().eval();
        let bt = b.t().eval();
        let coordinate = (at.t() + bt.t() * 2.0f64).eval();
        prop_assert_eq!(&flat, &coordinate);

        let strided = (a.submatrix(0, 0, a.nrows(), a.ncols()) + b.submatrix(0, 0, b.nrows(), b.ncols()) * 2.0f64).eval();
        prop_assert_eq!(&flat, &strided);
    }

    #[test]
    fn identity_laws(a in any_dense(10)) {
        prop_assert_eq!(&(&a + 0.0f64).eval(), &a);
        prop_assert_eq!(&(&a * 1.0f64).eval(), &a);
        prop_assert_eq!(&(&a + &Mat::<f64>::zeros(a.nrows(), a.ncols())).eval(), &a);
        prop_assert_eq!(&(&a * &Mat::<f64>::identity(a.ncols(), a.ncols())).eval(), &a);
    }

    #[test]
    fn addition_is_associative((a, b, c) in (1..=9usize, 1..=9usize).prop_flat_map(|(m, n)| (dense(m, n), dense(m, n), dense(m, n)))) {
        let lhs = ((&a + &b).eval() + &c).eval();
        let rhs = (&a + (&b + &c).eval()).eval();
        assert_close(&lhs, &rhs, 1e-10);
        assert_close(&(&a + &b + &c).eval(), &lhs, 1e-10);
    }

    #[test]
    fn aliased_assignment_matches_temporary(n in 1..=10usize, data in vec(-5.0..5.0f64, 100)) {
        let mut storage = data[..n * n].to_vec();
        let original = Mat::from_column_major_slice(&storage, n, n);
        let expected_sum = (original.t() + &original).eval();

        let ptr = storage.as_mut_ptr();
        let src = unsafe { from_raw_parts(ptr as *const f64, n, n) };
        let mut dst = unsafe { from_raw_parts_mut(ptr, n, n) };
        dst.assign(src.t() + src);
        prop_assert_eq!(Mat::from_column_major_slice(&storage, n, n), expected_sum.clone());

        let ptr = storage.as_mut_ptr();
        let src = unsafe { from_raw_parts(ptr as *const f64, n, n) };
        let mut dst = unsafe { from_raw_parts_mut(ptr, n, n) };
        dst.assign(src * src);
        assert_close(
            &Mat::from_column_major_slice(&storage, n, n),
            &(&expected_sum * &expected_sum).eval(),
            1e-9,
        );
    }

    #[test]
    fn sparse_round_trip(pattern in sparse_pattern(10)) {
        let sparse = SpMat::from_dense(&pattern);
        check_sparse_invariants(&sparse);
        prop_assert_eq!(sparse.nnz(), pattern.as_slice().iter().filter(|&&v| v != 0).count());
        prop_assert!(sparse.values().iter().all(|&v| v != 0));

        let dense = sparse.to_dense();
        prop_assert_eq!(&dense, &pattern);
        prop_assert_eq!(SpMat::from_dense(&dense), sparse);
    }

    #[test]
    fn sparse_mutations_keep_structure(pattern in sparse_pattern(8), edits in vec(edit(), 0..40)) {
        let mut sparse = SpMat::from_dense(&pattern);
        let mut model = pattern.clone();

        for edit in edits {
            match edit {
                Edit::Add(i, j, v) if i < model.nrows() && j < model.ncols() => {
                    sparse.add_element(i, j, v);
                    model.write(i, j, v);
                }
                Edit::Delete(i, j) if i < model.nrows() && j < model.ncols() => {
                    let removed = sparse.delete_element(i, j);
                    prop_assert_eq!(removed.unwrap_or(0), model.read(i, j));
                    model.write(i, j, 0);
                }
                Edit::ShedRow(i) if i < model.nrows() => {
                    sparse.shed_row(i);
                    model = Mat::from_fn(model.nrows() - 1, model.ncols(), |r, c| {
                        model.read(if r < i { r } else { r + 1 }, c)
                    });
                }
                Edit::ShedCol(j) if j < model.ncols() => {
                    sparse.shed_col(j);
                    model = Mat::from_fn(model.nrows(), model.ncols() - 1, |r, c| {
                        model.read(r, if c < j { c } else { c + 1 })
                    });
                }
                _ => {}
            }
            check_sparse_invariants(&sparse);
            prop_assert_eq!(sparse.dims(), (model.nrows(), model.ncols()));
            prop_assert_eq!(&sparse.to_dense(), &model);
        }
    }
}
