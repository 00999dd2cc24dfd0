//! Products involving sparse matrices.
//!
//! The sparse-dense kernels accumulate into a dense destination with the same `alpha`/`beta`
//! convention as [`matmul`](crate::linalg::matmul::matmul), and split the columns of the
//! destination between threads. The sparse-sparse product uses a dense accumulator per column of
//! the result.

use super::SpMat;
use crate::{
    error::DimensionMismatch,
    expr::eop,
    linalg::{eval::apply_scalar, matmul::check_product_dims},
    mat::{SubMatMut, SubMatRef},
    utils::thread::{for_each_raw, par_split_indices, task_count, Ptr},
    Parallelism, Scalar,
};
use core::iter::zip;
use reborrow::*;

#[inline]
fn scale_destination<E: Scalar>(mut dst: SubMatMut<'_, E>, alpha: Option<E>) {
    match alpha {
        Some(alpha) => apply_scalar::<eop::kind::ScalarTimes, E>(dst, alpha),
        None => dst.fill(E::zero()),
    }
}

/// Computes `[alpha * dst] + beta * lhs * rhs`, where `lhs` is sparse, and stores the result in
/// `dst`.
///
/// # Panics
/// Panics if the dimensions of the operands are not compatible.
#[track_caller]
pub fn sparse_dense_matmul<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: &SpMat<E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) {
    check_product_dims(
        (dst.nrows(), dst.ncols()),
        (lhs.nrows(), lhs.ncols()),
        (rhs.nrows(), rhs.ncols()),
    );

    let m = lhs.nrows();
    let k = lhs.ncols();
    let n = rhs.ncols();
    if m == 0 || n == 0 {
        return;
    }
    scale_destination(dst.rb_mut(), alpha);

    let rhs_ptr = Ptr(rhs.as_ptr() as *mut E);
    let (rhs_rs, rhs_cs) = (rhs.row_stride(), rhs.col_stride());
    let dst_ptr = Ptr(dst.as_ptr_mut());
    let (dst_rs, dst_cs) = (dst.row_stride(), dst.col_stride());

    let n_tasks = task_count(n, lhs.nnz(), parallelism);
    for_each_raw(
        n_tasks,
        |idx| {
            let (col_start, ncols) = par_split_indices(n, idx, n_tasks);
            let rhs_ptr = { rhs_ptr }.0;
            let dst_ptr = { dst_ptr }.0;
            let rhs = unsafe { SubMatRef::from_raw_parts(rhs_ptr, k, n, rhs_rs, rhs_cs) };

            for j in col_start..col_start + ncols {
                let dst_col = unsafe { dst_ptr.offset(j as isize * dst_cs) };
                for depth in 0..k {
                    let b = beta.times(unsafe { rhs.read_unchecked(depth, j) });
                    for (&i, &a) in zip(lhs.row_indices_of_col(depth), lhs.values_of_col(depth)) {
                        unsafe {
                            let p = dst_col.offset(i as isize * dst_rs);
                            *p = (*p).plus(a.times(b));
                        }
                    }
                }
            }
        },
        parallelism,
    );
}

/// Computes `[alpha * dst] + beta * lhs * rhs`, where `rhs` is sparse, and stores the result in
/// `dst`.
///
/// # Panics
/// Panics if the dimensions of the operands are not compatible.
#[track_caller]
pub fn dense_sparse_matmul<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: &SpMat<E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) {
    check_product_dims(
        (dst.nrows(), dst.ncols()),
        (lhs.nrows(), lhs.ncols()),
        (rhs.nrows(), rhs.ncols()),
    );

    let m = lhs.nrows();
    let k = lhs.ncols();
    let n = rhs.ncols();
    if m == 0 || n == 0 {
        return;
    }
    scale_destination(dst.rb_mut(), alpha);

    let lhs_ptr = Ptr(lhs.as_ptr() as *mut E);
    let (lhs_rs, lhs_cs) = (lhs.row_stride(), lhs.col_stride());
    let dst_ptr = Ptr(dst.as_ptr_mut());
    let (dst_rs, dst_cs) = (dst.row_stride(), dst.col_stride());

    let n_tasks = task_count(n, m.saturating_mul(rhs.nnz() / n + 1), parallelism);
    for_each_raw(
        n_tasks,
        |idx| {
            let (col_start, ncols) = par_split_indices(n, idx, n_tasks);
            let lhs_ptr = { lhs_ptr }.0;
            let dst_ptr = { dst_ptr }.0;
            let lhs = unsafe { SubMatRef::from_raw_parts(lhs_ptr, m, k, lhs_rs, lhs_cs) };

            for j in col_start..col_start + ncols {
                let dst_col = unsafe { dst_ptr.offset(j as isize * dst_cs) };
                for (&depth, &b) in zip(rhs.row_indices_of_col(j), rhs.values_of_col(j)) {
                    let b = beta.times(b);
                    for i in 0..m {
                        unsafe {
                            let p = dst_col.offset(i as isize * dst_rs);
                            *p = (*p).plus(lhs.read_unchecked(i, depth).times(b));
                        }
                    }
                }
            }
        },
        parallelism,
    );
}

/// Computes the product of two sparse matrices. Computed zeros are not stored.
///
/// # Panics
/// Panics if `lhs.ncols() != rhs.nrows()`.
#[track_caller]
pub fn sparse_sparse_matmul<E: Scalar>(lhs: &SpMat<E>, rhs: &SpMat<E>) -> SpMat<E> {
    if lhs.ncols() != rhs.nrows() {
        DimensionMismatch::mat("matrix multiplication", lhs.dims(), rhs.dims()).panic();
    }

    let m = lhs.nrows();
    let n = rhs.ncols();

    let mut col_ptrs = Vec::with_capacity(n + 1);
    let mut row_indices = Vec::new();
    let mut values = Vec::new();
    col_ptrs.push(0);

    // `marker[i] == j` when row `i` already has a value in column `j` of the result
    let mut marker = vec![usize::MAX; m];
    let mut acc = vec![E::zero(); m];
    let mut rows = Vec::new();

    for j in 0..n {
        rows.clear();
        for (&depth, &b) in zip(rhs.row_indices_of_col(j), rhs.values_of_col(j)) {
            for (&i, &a) in zip(lhs.row_indices_of_col(depth), lhs.values_of_col(depth)) {
                if marker[i] != j {
                    marker[i] = j;
                    rows.push(i);
                    acc[i] = a.times(b);
                } else {
                    acc[i] = acc[i].plus(a.times(b));
                }
            }
        }
        rows.sort_unstable();
        for &i in &rows {
            if acc[i] != E::zero() {
                row_indices.push(i);
                values.push(acc[i]);
            }
        }
        col_ptrs.push(row_indices.len());
    }

    SpMat {
        nrows: m,
        ncols: n,
        col_ptrs,
        row_indices,
        values,
    }
}
