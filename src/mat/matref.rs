use super::*;
use crate::{
    expr::{MemRegion, Trans},
    Scalar,
};
use core::{fmt, marker::PhantomData};

/// Immutable view over a contiguous column-major matrix.
///
/// The view is `Copy` and can be used directly as an operand of an expression. It is either
/// borrowed from a [`Mat`] or created over caller provided memory with
/// [`from_raw_parts`](super::from_raw_parts).
pub struct MatRef<'a, E> {
    inner: MatImpl<E>,
    __marker: PhantomData<&'a E>,
}

impl<E> Copy for MatRef<'_, E> {}
impl<E> Clone for MatRef<'_, E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: Scalar> MatRef<'a, E> {
    #[inline(always)]
    pub(crate) unsafe fn __from_raw_parts(ptr: *const E, nrows: usize, ncols: usize) -> Self {
        Self {
            inner: MatImpl {
                ptr: NonNull::new_unchecked(ptr as *mut E),
                nrows,
                ncols,
                row_stride: 1,
                col_stride: nrows as isize,
            },
            __marker: PhantomData,
        }
    }

    /// Returns the number of rows of the matrix.
    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.inner.nrows
    }

    /// Returns the number of columns of the matrix.
    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.inner.ncols
    }

    /// Returns the number of elements of the matrix.
    #[inline(always)]
    pub fn n_elem(&self) -> usize {
        self.inner.nrows * self.inner.ncols
    }

    /// Returns a pointer to the first element.
    #[inline(always)]
    pub fn as_ptr(self) -> *const E {
        self.inner.ptr.as_ptr()
    }

    /// Returns the column-major storage as a slice.
    #[inline]
    pub fn as_slice(self) -> &'a [E] {
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.n_elem()) }
    }

    /// Returns the elements of column `col` as a slice.
    #[inline]
    #[track_caller]
    pub fn col_as_slice(self, col: usize) -> &'a [E] {
        equator::assert!(col < self.ncols());
        let nrows = self.nrows();
        unsafe { core::slice::from_raw_parts(self.as_ptr().add(col * nrows), nrows) }
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> E {
        equator::assert!(all(row < self.nrows(), col < self.ncols()));
        unsafe { self.read_unchecked(row, col) }
    }

    /// Reads the value of the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Requires `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    #[track_caller]
    pub unsafe fn read_unchecked(&self, row: usize, col: usize) -> E {
        debug_assert!(row < self.nrows() && col < self.ncols());
        *self.as_ptr().add(row + col * self.nrows())
    }

    /// Returns a view over column `col`.
    #[inline]
    #[track_caller]
    pub fn col(self, col: usize) -> MatRef<'a, E> {
        equator::assert!(col < self.ncols());
        let nrows = self.nrows();
        unsafe { Self::__from_raw_parts(self.as_ptr().add(col * nrows), nrows, 1) }
    }

    /// Returns a view over row `row`. Its elements are `nrows` apart.
    #[inline]
    #[track_caller]
    pub fn row(self, row: usize) -> SubMatRef<'a, E> {
        equator::assert!(row < self.nrows());
        self.as_submat().submatrix(row, 0, 1, self.ncols())
    }

    /// Returns a view over the `nrows×ncols` block starting at `(row_start, col_start)`.
    #[inline]
    #[track_caller]
    pub fn submatrix(
        self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> SubMatRef<'a, E> {
        self.as_submat()
            .submatrix(row_start, col_start, nrows, ncols)
    }

    /// Returns the same view as a strided view.
    #[inline(always)]
    pub fn as_submat(self) -> SubMatRef<'a, E> {
        unsafe { SubMatRef::__from_impl(self.inner) }
    }

    /// Returns an owning copy of the matrix.
    #[inline]
    pub fn to_owned(&self) -> Mat<E> {
        Mat::from_column_major_slice(self.as_slice(), self.nrows(), self.ncols())
    }

    /// Returns a lazy transpose of the view.
    #[inline]
    pub fn t(self) -> Trans<MatRef<'a, E>> {
        Trans::new(self)
    }

    /// Returns the memory region covered by the view.
    #[inline]
    pub fn region(&self) -> MemRegion {
        MemRegion::contiguous(self.as_ptr(), self.n_elem())
    }
}

impl<E: Scalar> PartialEq for MatRef<'_, E> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.nrows() == other.nrows()
            && self.ncols() == other.ncols()
            && self.as_slice() == other.as_slice()
    }
}

impl<E: Scalar> fmt::Debug for MatRef<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_submat(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    #[test]
    fn test_col_and_row_views() {
        let a = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0f64]];
        let a = a.as_ref();
        assert_eq!(a.col(1).as_slice(), &[2.0, 4.0, 6.0]);
        assert_eq!(a.row(2).read(0, 1), 6.0);
        assert_eq!(a.to_owned(), mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_debug_lists_rows() {
        let a = mat![[1, 2], [3, 4i32]];
        assert_eq!(format!("{a:?}"), "[\n [1, 2],\n [3, 4],\n]");
    }
}
