//! Evaluation loops for cube expressions.
//!
//! Same strategy as the matrix loops: a single flat walk when the source prefers it and the
//! destination is contiguous, otherwise slice by slice and column by column through coordinates.

use super::{Cube, CubeProxy, SubCubeMut};
use crate::{
    expr::{inplace::Assign, EOpKind, InplaceKind},
    Scalar,
};

/// Combines every element of `src` into the corresponding element of `dst` with `K`.
///
/// `src` must have the dimensions of `dst`, and must not read memory overlapping `dst` unless it
/// is exactly the destination element being written.
#[inline]
pub fn apply_inplace<K: InplaceKind, P: CubeProxy>(mut dst: SubCubeMut<'_, P::Elem>, src: &P) {
    let nrows = dst.nrows();
    let ncols = dst.ncols();
    let nslices = dst.nslices();
    equator::debug_assert!(all(
        src.nrows() == nrows,
        src.ncols() == ncols,
        src.nslices() == nslices,
    ));
    if nrows == 0 || ncols == 0 || nslices == 0 {
        return;
    }

    let (row_stride, col_stride, slice_stride) = dst.strides();
    let ptr = dst.as_ptr_mut();

    unsafe {
        if !P::PREFER_AT_ACCESSOR && dst.is_contiguous() {
            let n = nrows * ncols * nslices;
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
        } else {
            for k in 0..nslices {
                let slice = ptr.offset(k as isize * slice_stride);
                for j in 0..ncols {
                    let col = slice.offset(j as isize * col_stride);
                    let mut i = 0;
                    while i + 1 < nrows {
                        let a = src.at_unchecked(i, j, k);
                        let b = src.at_unchecked(i + 1, j, k);
                        let pa = col.offset(i as isize * row_stride);
                        let pb = col.offset((i + 1) as isize * row_stride);
                        *pa = K::apply(*pa, a);
                        *pb = K::apply(*pb, b);
                        i += 2;
                    }
                    if i < nrows {
                        let p = col.offset(i as isize * row_stride);
                        *p = K::apply(*p, src.at_unchecked(i, j, k));
                    }
                }
            }
        }
    }
}

/// Writes every element of `src` into the corresponding element of `dst`.
#[inline]
pub fn eval_into<P: CubeProxy>(dst: SubCubeMut<'_, P::Elem>, src: &P) {
    apply_inplace::<Assign, P>(dst, src)
}

/// Evaluates `src` into a new cube.
#[inline]
pub fn materialize<P: CubeProxy>(src: &P) -> Cube<P::Elem> {
    let mut out = Cube::zeros(src.nrows(), src.ncols(), src.nslices());
    eval_into(out.as_mut().into_subcube(), src);
    out
}

/// Replaces every element `x` of `dst` with `O::process(x, aux)`.
#[inline]
pub fn apply_scalar<O: EOpKind, E: Scalar>(mut dst: SubCubeMut<'_, E>, aux: E) {
    let (nrows, ncols, nslices) = (dst.nrows(), dst.ncols(), dst.nslices());
    if nrows == 0 || ncols == 0 || nslices == 0 {
        return;
    }

    let (row_stride, col_stride, slice_stride) = dst.strides();
    let ptr = dst.as_ptr_mut();

    unsafe {
        if dst.is_contiguous() {
            for x in core::slice::from_raw_parts_mut(ptr, nrows * ncols * nslices) {
                *x = O::process(*x, aux);
            }
        } else {
            for k in 0..nslices {
                for j in 0..ncols {
                    for i in 0..nrows {
                        let p = ptr
                            .offset(i as isize * row_stride)
                            .offset(j as isize * col_stride)
                            .offset(k as isize * slice_stride);
                        *p = O::process(*p, aux);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{eop, inplace::InplaceMinus};

    #[test]
    fn test_flat_and_coordinate_paths_agree() {
        let a = Cube::from_fn(3, 3, 3, |i, j, k| (i + 3 * j + 9 * k) as i64);

        let flat = materialize(&a.as_ref());
        assert_eq!(flat, a);

        let sub = a.subcube(1, 0, 1, 2, 3, 2);
        let coord = materialize(&sub);
        assert_eq!(
            coord,
            Cube::from_fn(2, 3, 2, |i, j, k| a.read(i + 1, j, k + 1))
        );
    }

    #[test]
    fn test_writes_into_strided_destination() {
        let mut dst = Cube::<i32>::zeros(3, 2, 2);
        let src = Cube::from_fn(1, 2, 2, |_, j, k| (1 + j + 2 * k) as i32);
        eval_into(dst.subcube_mut(2, 0, 0, 1, 2, 2), &src.as_ref());
        assert_eq!(dst.as_slice(), &[0, 0, 1, 0, 0, 2, 0, 0, 3, 0, 0, 4]);

        apply_inplace::<InplaceMinus, _>(dst.subcube_mut(2, 0, 0, 1, 2, 2), &src.as_ref());
        assert_eq!(dst, Cube::zeros(3, 2, 2));

        apply_scalar::<eop::kind::ScalarPlus, _>(dst.subcube_mut(0, 1, 1, 3, 1, 1), 5);
        assert_eq!(dst.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 0, 0, 5, 5, 5]);
    }
}
