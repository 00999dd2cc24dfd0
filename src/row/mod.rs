//! Row vectors.
//!
//! A [`Row`] is a [`Mat`] with exactly one row. Since the storage is column-major with a single
//! row, its elements are still contiguous.

use crate::{
    error::DimensionMismatch,
    expr::{Expr, MatProxy, MemRegion, Target, Trans},
    mat::{Mat, MatMut, MatRef, SubMatMut, SubMatRef},
    Scalar,
};
use core::{
    fmt,
    ops::{Index, IndexMut},
};

/// Resizable row vector.
#[derive(Clone, PartialEq)]
pub struct Row<E: Scalar> {
    inner: Mat<E>,
}

impl<E: Scalar> Default for Row<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Scalar> Row<E> {
    /// Returns an empty row of dimension `0`.
    #[inline]
    pub fn new() -> Self {
        Self::zeros(0)
    }

    /// Returns a new row vector with `ncols` columns, filled with zeros.
    #[inline]
    pub fn zeros(ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(1, ncols),
        }
    }

    /// Returns a new row vector with `ncols` columns, filled with ones.
    #[inline]
    pub fn ones(ncols: usize) -> Self {
        Self::full(ncols, E::one())
    }

    /// Returns a new row vector with `ncols` columns, filled with `value`.
    #[inline]
    pub fn full(ncols: usize, value: E) -> Self {
        Self {
            inner: Mat::full(1, ncols, value),
        }
    }

    /// Returns a new row vector with `ncols` columns, filled with the provided function.
    #[inline]
    pub fn from_fn(ncols: usize, mut f: impl FnMut(usize) -> E) -> Self {
        Self {
            inner: Mat::from_fn(1, ncols, |_, j| f(j)),
        }
    }

    /// Returns a new row vector holding a copy of `slice`.
    #[inline]
    pub fn from_slice(slice: &[E]) -> Self {
        Self {
            inner: Mat::from_column_major_slice(slice, 1, slice.len()),
        }
    }

    /// Returns the number of rows of the row. This is always equal to `1`.
    #[inline(always)]
    pub fn nrows(&self) -> usize {
        1
    }

    /// Returns the number of columns of the row.
    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Returns the number of elements of the row.
    #[inline(always)]
    pub fn n_elem(&self) -> usize {
        self.inner.ncols()
    }

    /// Changes the number of columns without preserving the contents.
    #[inline]
    #[track_caller]
    pub fn set_size(&mut self, ncols: usize) {
        self.inner.set_size(1, ncols);
    }

    /// Changes the number of columns, preserving the leading elements and zero-initializing the
    /// others.
    #[inline]
    #[track_caller]
    pub fn resize(&mut self, ncols: usize) {
        self.inner.resize(1, ncols);
    }

    /// Fills the row with `value`.
    #[inline]
    pub fn fill(&mut self, value: E) {
        self.inner.fill(value);
    }

    /// Reads the element at index `col`.
    ///
    /// # Panics
    /// Panics if `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, col: usize) -> E {
        self.inner.read(0, col)
    }

    /// Writes `value` to the element at index `col`.
    ///
    /// # Panics
    /// Panics if `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, col: usize, value: E) {
        self.inner.write(0, col, value)
    }

    /// Returns a pointer to the data of the row.
    #[inline]
    pub fn as_ptr(&self) -> *const E {
        self.inner.as_ptr()
    }

    /// Returns a reference to a slice over the row.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        self.inner.as_slice()
    }

    /// Returns a mutable reference to a slice over the row.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        self.inner.as_slice_mut()
    }

    /// Returns a view over the row, as a `1×ncols` matrix.
    #[inline]
    pub fn as_ref(&self) -> MatRef<'_, E> {
        self.inner.as_ref()
    }

    /// Returns a mutable view over the row, as a `1×ncols` matrix.
    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_, E> {
        self.inner.as_mut()
    }

    /// Returns a view over the `ncols` elements starting at `col_start`.
    #[inline]
    #[track_caller]
    pub fn subcols(&self, col_start: usize, ncols: usize) -> SubMatRef<'_, E> {
        self.inner.submatrix(0, col_start, 1, ncols)
    }

    /// Returns a mutable view over the `ncols` elements starting at `col_start`.
    #[inline]
    #[track_caller]
    pub fn subcols_mut(&mut self, col_start: usize, ncols: usize) -> SubMatMut<'_, E> {
        self.inner.submatrix_mut(0, col_start, 1, ncols)
    }

    /// Returns the row as a matrix.
    #[inline]
    pub fn as_mat(&self) -> &Mat<E> {
        &self.inner
    }

    /// Converts the row into a matrix with one row.
    #[inline]
    pub fn into_mat(self) -> Mat<E> {
        self.inner
    }

    /// Returns a lazy transpose of the row, a column.
    #[inline]
    pub fn t(&self) -> Trans<MatRef<'_, E>> {
        Mat::t(&self.inner)
    }

    /// Evaluates the expression into `self`, resizing it as needed.
    ///
    /// # Panics
    /// Panics if the expression does not have exactly one row.
    #[inline]
    #[track_caller]
    pub fn assign<X: Expr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }
}

impl<E: Scalar> Index<usize> for Row<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, col: usize) -> &E {
        &self.inner.as_slice()[col]
    }
}

impl<E: Scalar> IndexMut<usize> for Row<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, col: usize) -> &mut E {
        &mut self.inner.as_slice_mut()[col]
    }
}

impl<E: Scalar> fmt::Debug for Row<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<E: Scalar> From<Row<E>> for Mat<E> {
    #[inline]
    fn from(row: Row<E>) -> Self {
        row.inner
    }
}

impl<E: Scalar> TryFrom<Mat<E>> for Row<E> {
    type Error = Mat<E>;

    /// Converts a `1×n` matrix into a row, giving the matrix back otherwise.
    #[inline]
    fn try_from(mat: Mat<E>) -> Result<Self, Mat<E>> {
        if mat.nrows() == 1 {
            Ok(Self { inner: mat })
        } else {
            Err(mat)
        }
    }
}

impl<'a, E: Scalar> Expr for &'a Row<E> {
    type Elem = E;
    type Proxy = MatRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> MatRef<'a, E> {
        self.as_ref()
    }
}

impl<E: Scalar> Expr for Row<E> {
    type Elem = E;
    type Proxy = MatProxy<E>;

    #[inline(always)]
    fn into_proxy(self) -> MatProxy<E> {
        MatProxy::new(self.inner)
    }

    #[inline]
    #[track_caller]
    fn assign_to<D: Target<Elem = E>>(self, dst: &mut D) {
        dst.take_result(self.inner)
    }
}

#[track_caller]
fn check_row(nrows: usize, ncols: usize) {
    if nrows != 1 {
        DimensionMismatch::mat("copy into row", (1, ncols), (nrows, ncols)).panic();
    }
}

impl<E: Scalar> Target for Row<E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (1, self.ncols())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        self.inner.region()
    }
    #[inline]
    fn view(&self) -> SubMatRef<'_, E> {
        self.inner.as_ref().as_submat()
    }
    #[inline]
    fn target_mut(&mut self) -> SubMatMut<'_, E> {
        self.inner.as_mut().into_submat()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize) {
        check_row(nrows, ncols);
        self.set_size(ncols);
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Mat<E>) {
        check_row(result.nrows(), result.ncols());
        self.inner = result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{col, mat, row};

    #[test]
    fn test_row_basics() {
        let mut r = row![1u32, 2, 3];
        assert_eq!((r.nrows(), r.ncols()), (1, 3));
        r[0] = 4;
        assert_eq!(r.read(0), 4);
        r.resize(2);
        assert_eq!(r.as_slice(), &[4, 2]);
        assert_eq!(r.subcols(1, 1).read(0, 0), 2);
        assert_eq!(Row::<u32>::from_fn(3, |j| j as u32), row![0, 1, 2]);
    }

    #[test]
    fn test_row_in_expressions() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let mut r = row![1.0, -1.0f64];
        r *= &a;
        assert_eq!(r, row![-2.0, -2.0]);

        r -= 1.0;
        assert_eq!(r.t().into_trans().eval(), mat![[-3.0, -3.0]]);

        let c = col![2.0, 0.5f64];
        r.assign(c.t());
        assert_eq!(r, row![2.0, 0.5]);
    }

    #[test]
    #[should_panic(expected = "copy into row: incompatible matrix dimensions: 1x1 and 2x1")]
    fn test_row_rejects_column_results() {
        let mut r = Row::<f64>::new();
        r.assign(&col![1.0, 2.0f64]);
    }
}
