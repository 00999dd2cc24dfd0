use super::store;
use crate::{
    mat::{SubMatMut, SubMatRef},
    utils::thread::{for_each_raw, par_split_indices, task_count, Ptr},
    Parallelism, Scalar,
};

/// Dot product of two slices of the same length, with two independent accumulators.
#[inline(always)]
fn dot2<E: Scalar>(a: &[E], b: &[E]) -> E {
    debug_assert_eq!(a.len(), b.len());
    let mut acc0 = E::zero();
    let mut acc1 = E::zero();

    let a2 = a.chunks_exact(2);
    let b2 = b.chunks_exact(2);
    let a_tail = a2.remainder();
    let b_tail = b2.remainder();
    for (a, b) in a2.zip(b2) {
        acc0 = acc0.plus(a[0].times(b[0]));
        acc1 = acc1.plus(a[1].times(b[1]));
    }
    if let (Some(&a), Some(&b)) = (a_tail.first(), b_tail.first()) {
        acc0 = acc0.plus(a.times(b));
    }
    acc0.plus(acc1)
}

/// Fills `scratch` with row `i` of `lhs`, or returns the row directly when it is already
/// contiguous.
#[inline(always)]
unsafe fn row_of<'a, E: Scalar>(
    lhs: SubMatRef<'a, E>,
    i: usize,
    scratch: &'a mut [E],
) -> &'a [E] {
    let k = lhs.ncols();
    if lhs.col_stride() == 1 {
        core::slice::from_raw_parts(lhs.ptr_at(i, 0), k)
    } else {
        for (depth, x) in scratch.iter_mut().enumerate() {
            *x = lhs.read_unchecked(i, depth);
        }
        scratch
    }
}

/// `dst = [alpha * dst] + beta * lhs * rhs` where `rhs` and `dst` are column vectors.
pub(super) fn gemv<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
) {
    let m = lhs.nrows();
    let k = lhs.ncols();
    equator::debug_assert!(all(rhs.ncols() == 1, dst.ncols() == 1, dst.nrows() == m));

    let x: Vec<E> = (0..k)
        .map(|depth| unsafe { rhs.read_unchecked(depth, 0) })
        .collect();
    let mut scratch = vec![E::zero(); k];

    for i in 0..m {
        let row = unsafe { row_of(lhs, i, &mut scratch) };
        let acc = dot2(row, &x);
        unsafe { store(dst.ptr_at_mut(i, 0), acc, alpha, beta) };
    }
}

/// `dst = [alpha * dst] + beta * lhs * rhs`.
///
/// Every row of `lhs` is copied once into a scratch buffer, then multiplied by all the columns of
/// `rhs`, which are made contiguous beforehand if needed. Rows are split between tasks.
pub(super) fn gemm<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) {
    let m = lhs.nrows();
    let k = lhs.ncols();
    let n = rhs.ncols();
    equator::debug_assert!(all(rhs.nrows() == k, dst.nrows() == m, dst.ncols() == n));

    let owned;
    let rhs = if rhs.row_stride() == 1 || n == 0 {
        rhs
    } else {
        owned = rhs.to_owned();
        owned.as_ref().as_submat()
    };

    let lhs_ptr = Ptr(lhs.as_ptr() as *mut E);
    let lhs_rs = lhs.row_stride();
    let lhs_cs = lhs.col_stride();
    let rhs_ptr = Ptr(rhs.as_ptr() as *mut E);
    let rhs_cs = rhs.col_stride();
    let dst_ptr = Ptr(dst.as_ptr_mut());
    let dst_rs = dst.row_stride();
    let dst_cs = dst.col_stride();

    let n_tasks = task_count(m, n.saturating_mul(k), parallelism);
    for_each_raw(
        n_tasks,
        |idx| {
            let (row_start, nrows) = par_split_indices(m, idx, n_tasks);
            let lhs_ptr = { lhs_ptr }.0;
            let rhs_ptr = { rhs_ptr }.0;
            let dst_ptr = { dst_ptr }.0;

            let lhs = unsafe { SubMatRef::from_raw_parts(lhs_ptr, m, k, lhs_rs, lhs_cs) };
            let mut scratch = vec![E::zero(); k];

            for i in row_start..row_start + nrows {
                let row = unsafe { row_of(lhs, i, &mut scratch) };
                for j in 0..n {
                    let col = unsafe {
                        core::slice::from_raw_parts(rhs_ptr.offset(j as isize * rhs_cs), k)
                    };
                    let acc = dot2(row, col);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mat, mat::Mat};

    #[test]
    fn test_dot2_odd_and_even() {
        assert_eq!(dot2::<i32>(&[], &[]), 0);
        assert_eq!(dot2(&[1, 2, 3], &[4, 5, 6]), 32);
        assert_eq!(dot2(&[1, 2, 3, 4], &[1, 1, 1, 1]), 10);
    }

    #[test]
    fn test_gemv_and_gemm() {
        let a = mat![[1, 2, 3], [4, 5, 6i64]];
        let x = mat![[1], [1], [2i64]];

        let mut y = Mat::full(2, 1, 1);
        gemv(
            y.as_mut().into_submat(),
            a.as_ref().as_submat(),
            x.as_ref().as_submat(),
            Some(10),
            1,
        );
        assert_eq!(y, mat![[19], [31]]);

        let mut c = Mat::zeros(2, 2);
        gemm(
            c.as_mut().into_submat(),
            a.as_ref().as_submat(),
            a.as_ref().as_submat().transpose(),
            None,
            1,
            Parallelism::None,
        );
        assert_eq!(c, mat![[14, 32], [32, 77]]);
    }
}
