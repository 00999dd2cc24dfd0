//! Evaluation loops walking an expression's [`Proxy`] into a destination.
//!
//! When no node of the expression prefers coordinate access and the destination is contiguous,
//! both sides are walked with a single flat index. Otherwise the destination is walked column by
//! column, reading the source through its coordinates. Both loops are unrolled by two.

use crate::{
    expr::{inplace::Assign, EOpKind, InplaceKind, Proxy},
    mat::{Mat, SubMatMut},
    Scalar,
};

/// Combines every element of `src` into the corresponding element of `dst` with `K`.
///
/// `src` must have the dimensions of `dst`, and must not read memory overlapping `dst` unless it
/// is exactly the destination element being written.
#[inline]
pub fn apply_inplace<K: InplaceKind, P: Proxy>(mut dst: SubMatMut<'_, P::Elem>, src: &P) {
    let nrows = dst.nrows();
    let ncols = dst.ncols();
    equator::debug_assert!(all(src.nrows() == nrows, src.ncols() == ncols));
    if nrows == 0 || ncols == 0 {
        return;
    }

    let row_stride = dst.row_stride();
    let col_stride = dst.col_stride();
    let ptr = dst.as_ptr_mut();

    unsafe {
        if !P::PREFER_AT_ACCESSOR && dst.is_contiguous() {
            let n = nrows * ncols;
            let mut i = 0;
            while i + 1 < n {
                let a = src.get_unchecked(i);
                let b = src.get_unchecked(i + 1);
                let pa = ptr.add(i);
                let pb = ptr.add(i + 1);
                *pa = K::apply(*pa, a);
                *pb = K::apply(*pb, b);
                i += 2;
            }
            if i < n {
                let p = ptr.add(i);
                *p = K::apply(*p, src.get_unchecked(i));
            }
        } else if nrows == 1 {
            for j in 0..ncols {
                let p = ptr.offset(j as isize * col_stride);
                *p = K::apply(*p, src.at_unchecked(0, j));
            }
        } else {
            for j in 0..ncols {
                let col = ptr.offset(j as isize * col_stride);
                let mut i = 0;
                while i + 1 < nrows {
                    let a = src.at_unchecked(i, j);
                    let b = src.at_unchecked(i + 1, j);
                    let pa = col.offset(i as isize * row_stride);
                    let pb = col.offset((i + 1) as isize * row_stride);
                    *pa = K::apply(*pa, a);
                    *pb = K::apply(*pb, b);
                    i += 2;
                }
                if i < nrows {
                    let p = col.offset(i as isize * row_stride);
                    *p = K::apply(*p, src.at_unchecked(i, j));
                }
            }
        }
    }
}

/// Writes every element of `src` into the corresponding element of `dst`.
#[inline]
pub fn eval_into<P: Proxy>(dst: SubMatMut<'_, P::Elem>, src: &P) {
    apply_inplace::<Assign, P>(dst, src)
}

/// Evaluates `src` into a new matrix.
#[inline]
pub fn materialize<P: Proxy>(src: &P) -> Mat<P::Elem> {
    let mut out = Mat::zeros(src.nrows(), src.ncols());
    eval_into(out.as_mut().into_submat(), src);
    out
}

/// Replaces every element `x` of `dst` with `O::process(x, aux)`.
#[inline]
pub fn apply_scalar<O: EOpKind, E: Scalar>(mut dst: SubMatMut<'_, E>, aux: E) {
    let nrows = dst.nrows();
    let ncols = dst.ncols();
    if nrows == 0 || ncols == 0 {
        return;
    }

    let row_stride = dst.row_stride();
    let col_stride = dst.col_stride();
    let ptr = dst.as_ptr_mut();

    unsafe {
        if dst.is_contiguous() {
            for x in core::slice::from_raw_parts_mut(ptr, nrows * ncols) {
                *x = O::process(*x, aux);
            }
        } else {
            for j in 0..ncols {
                let col = ptr.offset(j as isize * col_stride);
                for i in 0..nrows {
                    let p = col.offset(i as isize * row_stride);
                    *p = O::process(*p, aux);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{eop, inplace::InplacePlus, Expr, MatProxy},
        mat,
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_flat_and_coordinate_paths_agree() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = Mat::from_fn(7, 5, |_, _| rng.gen::<f64>());
        let b = Mat::from_fn(5, 7, |_, _| rng.gen::<f64>());

        // flat: both operands contiguous
        let flat = (&a + &a * 3.0).eval();
        // coordinate: same values read through a strided transposed view
        let bt = b.t().eval();
        let coord = (bt.submatrix(0, 0, 7, 5) + bt.submatrix(0, 0, 7, 5) * 3.0).eval();
        let expected = (&bt + &bt * 3.0).eval();
        assert_eq!(coord, expected);
        assert_eq!(flat, Mat::from_fn(7, 5, |i, j| a.read(i, j) + a.read(i, j) * 3.0));
    }

    #[test]
    fn test_odd_sizes_are_fully_written() {
        for (m, n) in [(1, 1), (1, 5), (3, 1), (3, 3), (4, 5)] {
            let a = Mat::from_fn(m, n, |i, j| (i * n + j) as i32);
            let mut dst = Mat::zeros(m + 2, n + 2);
            eval_into(dst.submatrix_mut(1, 1, m, n), &a.as_ref());
            assert_eq!(dst.submatrix(1, 1, m, n).to_owned(), a);
            assert_eq!(materialize(&a.t()), a.t().eval());
        }
    }

    #[test]
    fn test_apply_inplace_and_scalar() {
        let mut a = mat![[1, 2, 3], [4, 5, 6u64]];
        let b = MatProxy::new(mat![[1, 1, 1], [1, 1, 1u64]]);
        apply_inplace::<InplacePlus, _>(a.as_mut().into_submat(), &b);
        assert_eq!(a, mat![[2, 3, 4], [5, 6, 7]]);

        apply_scalar::<eop::kind::ScalarTimes, _>(a.as_mut().into_submat().into_transpose(), 2);
        assert_eq!(a, mat![[4, 6, 8], [10, 12, 14]]);
    }
}
