use super::{check_product_dims, matmul, store};
use crate::{
    mat::{SubMatMut, SubMatRef},
    utils::thread::{for_each_raw, par_split_indices, task_count, Ptr},
    Parallelism, Promote, Scalar,
};

/// Computes `[alpha * dst] + beta * lhs * rhs` for operands of possibly different element types,
/// and stores the result in `dst`.
///
/// When both operands already have the element type of the result, this is exactly [`matmul`].
/// Otherwise the elements are promoted to the element type of the result as the kernel reads
/// them, without converting the operands up front.
///
/// # Panics
/// Panics under the same conditions as [`matmul`].
#[track_caller]
pub fn matmul_mixed<E1: Promote<E2>, E2: Scalar>(
    dst: SubMatMut<'_, E1::Output>,
    lhs: SubMatRef<'_, E1>,
    rhs: SubMatRef<'_, E2>,
    alpha: Option<E1::Output>,
    beta: E1::Output,
    parallelism: Parallelism,
) {
    if coe::is_same::<E1, E1::Output>() && coe::is_same::<E2, E1::Output>() {
        let (lhs, rhs) = unsafe {
            (
                SubMatRef::from_raw_parts(
                    lhs.as_ptr() as *const E1::Output,
                    lhs.nrows(),
                    lhs.ncols(),
                    lhs.row_stride(),
                    lhs.col_stride(),
                ),
                SubMatRef::from_raw_parts(
                    rhs.as_ptr() as *const E1::Output,
                    rhs.nrows(),
                    rhs.ncols(),
                    rhs.row_stride(),
                    rhs.col_stride(),
                ),
            )
        };
        return matmul(dst, lhs, rhs, alpha, beta, parallelism);
    }

    check_product_dims(
        (dst.nrows(), dst.ncols()),
        (lhs.nrows(), lhs.ncols()),
        (rhs.nrows(), rhs.ncols()),
    );

    #[cfg(feature = "perf-warn")]
    if crate::__perf_warn!(MIXED_MATMUL_WARN) {
        log::warn!(
            target: "armature_perf",
            "Matrix multiplication of {} by {} promotes every element to {} inside the emulated kernel.",
            core::any::type_name::<E1>(),
            core::any::type_name::<E2>(),
            core::any::type_name::<E1::Output>(),
        );
    }

    gemm_mixed(dst, lhs, rhs, alpha, beta, parallelism)
}

/// Emulated product promoting the elements as they are read: each row of `lhs` is promoted once
/// into a scratch buffer, and the elements of `rhs` are promoted in the inner loop.
fn gemm_mixed<E1: Promote<E2>, E2: Scalar>(
    mut dst: SubMatMut<'_, E1::Output>,
    lhs: SubMatRef<'_, E1>,
    rhs: SubMatRef<'_, E2>,
    alpha: Option<E1::Output>,
    beta: E1::Output,
    parallelism: Parallelism,
) {
    let m = lhs.nrows();
    let k = lhs.ncols();
    let n = rhs.ncols();
    if m == 0 || n == 0 {
        return;
    }

    let lhs_ptr = Ptr(lhs.as_ptr() as *mut E1);
    let (lhs_rs, lhs_cs) = (lhs.row_stride(), lhs.col_stride());
    let rhs_ptr = Ptr(rhs.as_ptr() as *mut E2);
    let (rhs_rs, rhs_cs) = (rhs.row_stride(), rhs.col_stride());
    let dst_ptr = Ptr(dst.as_ptr_mut());
    let (dst_rs, dst_cs) = (dst.row_stride(), dst.col_stride());

    let n_tasks = task_count(m, n.saturating_mul(k), parallelism);
    for_each_raw(
        n_tasks,
        |idx| {
            let (row_start, nrows) = par_split_indices(m, idx, n_tasks);
            let lhs_ptr = { lhs_ptr }.0;
            let rhs_ptr = { rhs_ptr }.0;
            let dst_ptr = { dst_ptr }.0;

            let lhs = unsafe { SubMatRef::from_raw_parts(lhs_ptr, m, k, lhs_rs, lhs_cs) };
            let rhs = unsafe { SubMatRef::from_raw_parts(rhs_ptr, k, n, rhs_rs, rhs_cs) };
            let mut row = vec![E1::Output::zero(); k];

            for i in row_start..row_start + nrows {
                for (depth, x) in row.iter_mut().enumerate() {
                    *x = E1::promote_lhs(unsafe { lhs.read_unchecked(i, depth) });
                }
                for j in 0..n {
                    let mut acc = E1::Output::zero();
                    for (depth, &x) in row.iter().enumerate() {
                        let y = E1::promote_rhs(unsafe { rhs.read_unchecked(depth, j) });
                        acc = acc.plus(x.times(y));
                    }
                    unsafe {
                        store(
                            dst_ptr
                                .offset(i as isize * dst_rs)
                                .offset(j as isize * dst_cs),
                            acc,
                            alpha,
                            beta,
                        )
                    };
                }
            }
        },
        parallelism,
    );
}
