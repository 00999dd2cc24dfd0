use super::*;
use crate::{
    expr::{Expr, MemRegion},
    Scalar,
};
use core::{fmt, marker::PhantomData};
use reborrow::*;

/// Immutable view over a matrix with arbitrary row and column strides.
///
/// Submatrices, rows, and transposed views are represented this way. Elementwise expressions
/// containing such a view are evaluated with coordinate access instead of a flat walk.
pub struct SubMatRef<'a, E> {
    inner: MatImpl<E>,
    __marker: PhantomData<&'a E>,
}

/// Mutable view over a matrix with arbitrary row and column strides.
pub struct SubMatMut<'a, E> {
    inner: MatImpl<E>,
    __marker: PhantomData<&'a mut E>,
}

impl<E> Copy for SubMatRef<'_, E> {}
impl<E> Clone for SubMatRef<'_, E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<'short, E> Reborrow<'short> for SubMatMut<'_, E> {
    type Target = SubMatRef<'short, E>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        SubMatRef {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'short, E> ReborrowMut<'short> for SubMatMut<'_, E> {
    type Target = SubMatMut<'short, E>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        SubMatMut {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'a, E> IntoConst for SubMatMut<'a, E> {
    type Target = SubMatRef<'a, E>;

    #[inline]
    fn into_const(self) -> Self::Target {
        SubMatRef {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'a, E: Scalar> SubMatRef<'a, E> {
    #[inline(always)]
    pub(crate) unsafe fn __from_impl(inner: MatImpl<E>) -> Self {
        Self {
            inner,
            __marker: PhantomData,
        }
    }

    /// Creates a strided view from its raw parts.
    ///
    /// # Safety
    /// `ptr` must be non null and properly aligned, and every element `(i, j)` with `i < nrows`
    /// and `j < ncols`, located at `ptr + i * row_stride + j * col_stride`, must be valid for
    /// reads for the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(
        ptr: *const E,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self::__from_impl(MatImpl {
            ptr: NonNull::new_unchecked(ptr as *mut E),
            nrows,
            ncols,
            row_stride,
            col_stride,
        })
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

    /// Returns the offset between the first elements of two successive rows.
    #[inline(always)]
    pub fn row_stride(&self) -> isize {
        self.inner.row_stride
    }

    /// Returns the offset between the first elements of two successive columns.
    #[inline(always)]
    pub fn col_stride(&self) -> isize {
        self.inner.col_stride
    }

    /// Returns a pointer to the first element.
    #[inline(always)]
    pub fn as_ptr(self) -> *const E {
        self.inner.ptr.as_ptr()
    }

    /// Returns a pointer to the element at the given indices, with no bound checks.
    #[inline(always)]
    pub fn ptr_at(self, row: usize, col: usize) -> *const E {
        self.inner.ptr_at(row, col)
    }

    /// Returns whether the view is laid out like a contiguous column-major matrix.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.inner.is_contiguous()
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
        *self.inner.ptr_at(row, col)
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
        unsafe {
            Self::__from_impl(
                self.inner
                    .submatrix(row_start, col_start, nrows, ncols),
            )
        }
    }

    /// Returns a view over column `col`.
    #[inline]
    #[track_caller]
    pub fn col(self, col: usize) -> SubMatRef<'a, E> {
        let nrows = self.nrows();
        self.submatrix(0, col, nrows, 1)
    }

    /// Returns a view over row `row`.
    #[inline]
    #[track_caller]
    pub fn row(self, row: usize) -> SubMatRef<'a, E> {
        let ncols = self.ncols();
        self.submatrix(row, 0, 1, ncols)
    }

    /// Returns the transposed view, without copying.
    #[inline]
    pub fn transpose(self) -> SubMatRef<'a, E> {
        unsafe { Self::__from_impl(self.inner.transpose()) }
    }

    /// Returns the view as a contiguous view, if its layout allows it.
    #[inline]
    pub fn try_as_contiguous(self) -> Option<MatRef<'a, E>> {
        if self.is_contiguous() {
            Some(unsafe { MatRef::__from_raw_parts(self.as_ptr(), self.nrows(), self.ncols()) })
        } else {
            None
        }
    }

    /// Returns an owning copy of the matrix.
    #[inline]
    pub fn to_owned(&self) -> Mat<E> {
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| unsafe {
            self.read_unchecked(i, j)
        })
    }

    /// Returns the memory region covered by the view.
    #[inline]
    pub fn region(&self) -> MemRegion {
        self.inner.region()
    }
}

impl<'a, E: Scalar> SubMatMut<'a, E> {
    #[inline(always)]
    pub(crate) unsafe fn __from_impl(inner: MatImpl<E>) -> Self {
        Self {
            inner,
            __marker: PhantomData,
        }
    }

    /// Creates a mutable strided view from its raw parts.
    ///
    /// # Safety
    /// Same requirements as [`SubMatRef::from_raw_parts`], with the elements also valid for
    /// writes, and no two indices mapping to the same element.
    #[inline(always)]
    pub unsafe fn from_raw_parts(
        ptr: *mut E,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self::__from_impl(MatImpl {
            ptr: NonNull::new_unchecked(ptr),
            nrows,
            ncols,
            row_stride,
            col_stride,
        })
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

    /// Returns the offset between the first elements of two successive rows.
    #[inline(always)]
    pub fn row_stride(&self) -> isize {
        self.inner.row_stride
    }

    /// Returns the offset between the first elements of two successive columns.
    #[inline(always)]
    pub fn col_stride(&self) -> isize {
        self.inner.col_stride
    }

    /// Returns a mutable pointer to the first element.
    #[inline(always)]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.inner.ptr.as_ptr()
    }

    /// Returns a mutable pointer to the element at the given indices, with no bound checks.
    #[inline(always)]
    pub fn ptr_at_mut(&mut self, row: usize, col: usize) -> *mut E {
        self.inner.ptr_at(row, col)
    }

    /// Returns whether the view is laid out like a contiguous column-major matrix.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.inner.is_contiguous()
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
    pub fn fill(&mut self, value: E) {
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                unsafe { self.write_unchecked(i, j, value) };
            }
        }
    }

    /// Consumes the view and returns a view over the `nrows×ncols` block starting at
    /// `(row_start, col_start)`.
    #[inline]
    #[track_caller]
    pub fn into_submatrix(
        self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> SubMatMut<'a, E> {
        unsafe {
            Self::__from_impl(
                self.inner
                    .submatrix(row_start, col_start, nrows, ncols),
            )
        }
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
            .into_submatrix(row_start, col_start, nrows, ncols)
    }

    /// Consumes the view and returns the transposed view, without copying.
    #[inline]
    pub fn into_transpose(self) -> SubMatMut<'a, E> {
        unsafe { Self::__from_impl(self.inner.transpose()) }
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
        self.inner.region()
    }
}

impl<E: Scalar> fmt::Debug for SubMatRef<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct DebugRow<'a, E: Scalar>(SubMatRef<'a, E>);

        impl<E: Scalar> fmt::Debug for DebugRow<'_, E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let row = self.0;
                f.debug_list()
                    .entries((0..row.ncols()).map(|j| unsafe { row.read_unchecked(0, j) }))
                    .finish()
            }
        }

        writeln!(f, "[")?;
        for i in 0..self.nrows() {
            write!(f, " ")?;
            fmt::Debug::fmt(&DebugRow(self.row(i)), f)?;
            writeln!(f, ",")?;
        }
        write!(f, "]")
    }
}

impl<E: Scalar> fmt::Debug for SubMatMut<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.rb(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    #[test]
    fn test_strided_views() {
        let a = mat![[1, 2, 3], [4, 5, 6i32]];
        let t = a.as_ref().as_submat().transpose();
        assert_eq!((t.nrows(), t.ncols()), (3, 2));
        assert_eq!(t.read(2, 0), 3);
        assert_eq!(t.to_owned(), mat![[1, 4], [2, 5], [3, 6]]);
        assert!(t.try_as_contiguous().is_none());
        assert!(a.col(2).as_submat().try_as_contiguous().is_some());
    }

    #[test]
    fn test_fill_submatrix() {
        let mut a = Mat::<f32>::zeros(4, 4);
        a.submatrix_mut(1, 1, 2, 2).fill(1.0);
        assert_eq!(a.read(1, 1), 1.0);
        assert_eq!(a.read(2, 2), 1.0);
        assert_eq!(a.read(3, 3), 0.0);
        assert_eq!(a.read(0, 1), 0.0);
    }
}
