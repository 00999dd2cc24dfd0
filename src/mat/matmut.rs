use super::*;
use crate::{
    expr::{Expr, MemRegion},
    Scalar,
};
use core::{fmt, marker::PhantomData};
use reborrow::*;

/// Mutable view over a contiguous column-major matrix.
///
/// Unlike [`Mat`], the view cannot be resized: assigning an expression of a different shape
/// panics.
pub struct MatMut<'a, E> {
    inner: MatImpl<E>,
    __marker: PhantomData<&'a mut E>,
}

impl<'short, E: Scalar> Reborrow<'short> for MatMut<'_, E> {
    type Target = MatRef<'short, E>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        unsafe { MatRef::__from_raw_parts(self.inner.ptr.as_ptr(), self.nrows(), self.ncols()) }
    }
}

impl<'short, E: Scalar> ReborrowMut<'short> for MatMut<'_, E> {
    type Target = MatMut<'short, E>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        MatMut {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'a, E: Scalar> IntoConst for MatMut<'a, E> {
    type Target = MatRef<'a, E>;

    #[inline]
    fn into_const(self) -> Self::Target {
        unsafe { MatRef::__from_raw_parts(self.inner.ptr.as_ptr(), self.nrows(), self.ncols()) }
    }
}

impl<'a, E: Scalar> MatMut<'a, E> {
    #[inline(always)]
    pub(crate) unsafe fn __from_raw_parts(ptr: *mut E, nrows: usize, ncols: usize) -> Self {
        Self {
            inner: MatImpl {
                ptr: NonNull::new_unchecked(ptr),
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
    pub fn as_ptr(&self) -> *const E {
        self.inner.ptr.as_ptr()
    }

    /// Returns a mutable pointer to the first element.
    #[inline(always)]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.inner.ptr.as_ptr()
    }

    /// Returns the column-major storage as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        self.rb().as_slice()
    }

    /// Returns the column-major storage as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        let len = self.n_elem();
        unsafe { core::slice::from_raw_parts_mut(self.as_ptr_mut(), len) }
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> E {
        self.rb().read(row, col)
    }

    /// Writes the value to the element at the given indices.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, value: E) {
        equator::assert!(all(row < self.nrows(), col < self.ncols()));
        unsafe { self.write_unchecked(row, col, value) }
    }

    /// Writes the value to the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Requires `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    #[track_caller]
    pub unsafe fn write_unchecked(&mut self, row: usize, col: usize, value: E) {
        debug_assert!(row < self.nrows() && col < self.ncols());
        *self.inner.ptr_at(row, col) = value;
    }

    /// Fills the matrix with `value`.
    #[inline]
    pub fn fill(&mut self, value: E) {
        for x in self.as_slice_mut() {
            *x = value;
        }
    }

    /// Returns a mutable view over column `col`.
    #[inline]
    #[track_caller]
    pub fn col_mut(&mut self, col: usize) -> MatMut<'_, E> {
        self.rb_mut().into_col(col)
    }

    /// Returns a mutable view over row `row`.
    #[inline]
    #[track_caller]
    pub fn row_mut(&mut self, row: usize) -> SubMatMut<'_, E> {
        self.rb_mut().into_row(row)
    }

    /// Returns a mutable view over the `nrows×ncols` block starting at `(row_start, col_start)`.
    #[inline]
    #[track_caller]
    pub fn submatrix_mut(
        &mut self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> SubMatMut<'_, E> {
        self.rb_mut()
            .into_submat()
            .into_submatrix(row_start, col_start, nrows, ncols)
    }

    /// Consumes the view and returns a mutable view over column `col`.
    #[inline]
    #[track_caller]
    pub fn into_col(self, col: usize) -> MatMut<'a, E> {
        equator::assert!(col < self.ncols());
        let nrows = self.nrows();
        unsafe { Self::__from_raw_parts(self.inner.ptr.as_ptr().add(col * nrows), nrows, 1) }
    }

    /// Consumes the view and returns a mutable view over row `row`.
    #[inline]
    #[track_caller]
    pub fn into_row(self, row: usize) -> SubMatMut<'a, E> {
        equator::assert!(row < self.nrows());
        let ncols = self.ncols();
        self.into_submat().into_submatrix(row, 0, 1, ncols)
    }

    /// Consumes the view and returns the same view as a strided view.
    #[inline(always)]
    pub fn into_submat(self) -> SubMatMut<'a, E> {
        unsafe { SubMatMut::__from_impl(self.inner) }
    }

    /// Evaluates the expression into the view.
    ///
    /// # Panics
    /// Panics if the dimensions of the expression differ from those of the view.
    #[inline]
    #[track_caller]
    pub fn assign<X: Expr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }

    /// Returns the memory region covered by the view.
    #[inline]
    pub fn region(&self) -> MemRegion {
        self.rb().region()
    }
}

impl<E: Scalar> fmt::Debug for MatMut<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.rb(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    #[test]
    fn test_write_through_column() {
        let mut a = Mat::<f64>::zeros(3, 2);
        {
            let mut view = a.as_mut();
            view.col_mut(1).fill(2.0);
            view.write(0, 0, -1.0);
        }
        assert_eq!(a, mat![[-1.0, 2.0], [0.0, 2.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_row_view_is_strided() {
        let mut a = Mat::<i64>::zeros(3, 3);
        let mut row = a.row_mut(1);
        row.fill(5);
        assert_eq!(a, mat![[0, 0, 0], [5, 5, 5], [0, 0, 0]]);
    }
}
