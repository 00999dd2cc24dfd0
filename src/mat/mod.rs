//! Dense column-major matrices and views over them.
//!
//! - [`Mat`] owns its storage. Up to [`MAT_INLINE_CAPACITY`] elements are stored inline, larger
//!   matrices live on the heap.
//! - [`MatRef`] and [`MatMut`] are views over a contiguous column-major buffer. They are also
//!   how foreign memory is wrapped without copying, see [`from_raw_parts`] and
//!   [`from_column_major_slice`].
//! - [`SubMatRef`] and [`SubMatMut`] are views with arbitrary row and column strides, produced
//!   by [`MatRef::submatrix`], [`MatRef::row`], and transposition.
//!
//! Element `(i, j)` of a contiguous matrix with `nrows` rows is stored at offset
//! `i + j * nrows`.

use core::ptr::NonNull;

mod matmut;
mod matown;
mod matref;
mod submat;

pub use matmut::MatMut;
pub use matown::{Mat, MemState};
pub use matref::MatRef;
pub use submat::{SubMatMut, SubMatRef};

/// Number of elements stored inline in a [`Mat`] before falling back to a heap allocation.
pub const MAT_INLINE_CAPACITY: usize = 16;

#[derive(Debug)]
struct MatImpl<E> {
    ptr: NonNull<E>,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
}

unsafe impl<E: Sync> Sync for MatImpl<E> {}
unsafe impl<E: Sync> Send for MatImpl<E> {}

impl<E> Copy for MatImpl<E> {}
impl<E> Clone for MatImpl<E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> MatImpl<E> {
    #[inline(always)]
    fn ptr_at(self, row: usize, col: usize) -> *mut E {
        self.ptr
            .as_ptr()
            .wrapping_offset(row as isize * self.row_stride)
            .wrapping_offset(col as isize * self.col_stride)
    }

    #[inline]
    fn is_contiguous(self) -> bool {
        self.row_stride == 1 && (self.ncols <= 1 || self.col_stride == self.nrows as isize)
    }

    #[inline]
    #[track_caller]
    fn submatrix(self, row_start: usize, col_start: usize, nrows: usize, ncols: usize) -> Self {
        equator::assert!(all(
            row_start <= self.nrows,
            col_start <= self.ncols,
            nrows <= self.nrows - row_start,
            ncols <= self.ncols - col_start,
        ));
        Self {
            ptr: unsafe { NonNull::new_unchecked(self.ptr_at(row_start, col_start)) },
            nrows,
            ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }

    #[inline]
    fn transpose(self) -> Self {
        Self {
            ptr: self.ptr,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    #[inline]
    fn region(self) -> crate::expr::MemRegion {
        crate::expr::MemRegion::strided(
            self.ptr.as_ptr(),
            self.nrows,
            self.ncols,
            self.row_stride,
            self.col_stride,
        )
    }
}

/// Creates a `MatRef` from a pointer to a column-major buffer and the matrix dimensions.
///
/// The returned view does not own the memory: this is the zero-copy way of handing foreign
/// buffers to expressions. Use [`Mat::from_column_major_slice`] to copy them instead.
///
/// # Safety
/// The behavior is undefined if any of the following conditions are violated:
/// * `ptr` must be non null and properly aligned, and valid for reads of `nrows * ncols`
///   elements for the lifetime `'a`.
/// * No mutable aliasing is allowed through other references during `'a`, except through views
///   that take part in the same assignment (the assignment detects the overlap and evaluates
///   through a temporary).
#[inline(always)]
pub unsafe fn from_raw_parts<'a, E: crate::Scalar>(
    ptr: *const E,
    nrows: usize,
    ncols: usize,
) -> MatRef<'a, E> {
    MatRef::__from_raw_parts(ptr, nrows, ncols)
}

/// Creates a `MatMut` from a pointer to a column-major buffer and the matrix dimensions.
///
/// # Safety
/// The behavior is undefined if any of the following conditions are violated:
/// * `ptr` must be non null and properly aligned, and valid for reads and writes of
///   `nrows * ncols` elements for the lifetime `'a`.
/// * The memory must not be accessed through other references during `'a`, except through views
///   that take part in the same assignment.
#[inline(always)]
pub unsafe fn from_raw_parts_mut<'a, E: crate::Scalar>(
    ptr: *mut E,
    nrows: usize,
    ncols: usize,
) -> MatMut<'a, E> {
    MatMut::__from_raw_parts(ptr, nrows, ncols)
}

/// Creates a `MatRef` viewing a column-major slice.
///
/// # Panics
/// Panics if `slice.len() != nrows * ncols`.
#[track_caller]
#[inline]
pub fn from_column_major_slice<E: crate::Scalar>(
    slice: &[E],
    nrows: usize,
    ncols: usize,
) -> MatRef<'_, E> {
    equator::assert!(slice.len() == nrows * ncols);
    unsafe { from_raw_parts(slice.as_ptr(), nrows, ncols) }
}

/// Creates a `MatMut` viewing a mutable column-major slice.
///
/// # Panics
/// Panics if `slice.len() != nrows * ncols`.
#[track_caller]
#[inline]
pub fn from_column_major_slice_mut<E: crate::Scalar>(
    slice: &mut [E],
    nrows: usize,
    ncols: usize,
) -> MatMut<'_, E> {
    equator::assert!(slice.len() == nrows * ncols);
    unsafe { from_raw_parts_mut(slice.as_mut_ptr(), nrows, ncols) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    #[test]
    fn test_views_over_slices() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0f64];
        let m = from_column_major_slice(&data, 2, 3);
        assert_eq!(m.read(1, 2), 6.0);
        assert_eq!(m.col_as_slice(1), &[3.0, 4.0]);

        let row = m.row(1);
        assert_eq!(row.ncols(), 3);
        assert_eq!(row.read(0, 1), 4.0);
        assert_eq!(row.col_stride(), 2);
    }

    #[test]
    fn test_mutation_through_views() {
        let mut data = [0i32; 6];
        {
            let mut m = from_column_major_slice_mut(&mut data, 3, 2);
            m.write(2, 1, 7);
            let mut sub = m.submatrix_mut(0, 0, 2, 2);
            sub.write(1, 0, 3);
        }
        assert_eq!(data, [0, 3, 0, 0, 0, 7]);
    }

    #[test]
    fn test_submatrix_of_submatrix() {
        let m = Mat::from_fn(5, 5, |i, j| (i * 10 + j) as f64);
        let sub = m.submatrix(1, 1, 3, 3).submatrix(1, 0, 2, 2);
        assert_eq!(sub.read(0, 0), 21.0);
        assert_eq!(sub.read(1, 1), 32.0);
        assert!(!sub.is_contiguous());

        let t = sub.transpose();
        assert_eq!(t.read(0, 1), 31.0);
    }

    #[test]
    #[should_panic]
    fn test_submatrix_out_of_bounds() {
        let m = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let _ = m.submatrix(1, 1, 2, 1);
    }
}
