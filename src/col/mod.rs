//! Column vectors.
//!
//! A [`Col`] is a [`Mat`] with exactly one column. It takes part in expressions like any
//! matrix, and assigning an expression to it fails unless the result is a column.

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

/// Resizable column vector.
///
/// # Note
///
/// The memory layout of `Col` is guaranteed to be contiguous, its elements are stored one after
/// the other.
#[derive(Clone, PartialEq)]
pub struct Col<E: Scalar> {
    inner: Mat<E>,
}

impl<E: Scalar> Default for Col<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Scalar> Col<E> {
    /// Returns an empty column of dimension `0`.
    #[inline]
    pub fn new() -> Self {
        Self::zeros(0)
    }

    /// Returns a new column vector with `nrows` rows, filled with zeros.
    #[inline]
    pub fn zeros(nrows: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, 1),
        }
    }

    /// Returns a new column vector with `nrows` rows, filled with ones.
    #[inline]
    pub fn ones(nrows: usize) -> Self {
        Self::full(nrows, E::one())
    }

    /// Returns a new column vector with `nrows` rows, filled with `value`.
    #[inline]
    pub fn full(nrows: usize, value: E) -> Self {
        Self {
            inner: Mat::full(nrows, 1, value),
        }
    }

    /// Returns a new column vector with `nrows` rows, filled with the provided function.
    #[inline]
    pub fn from_fn(nrows: usize, mut f: impl FnMut(usize) -> E) -> Self {
        Self {
            inner: Mat::from_fn(nrows, 1, |i, _| f(i)),
        }
    }

    /// Returns a new column vector holding a copy of `slice`.
    #[inline]
    pub fn from_slice(slice: &[E]) -> Self {
        Self {
            inner: Mat::from_column_major_slice(slice, slice.len(), 1),
        }
    }

    /// Returns the number of rows of the column.
    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Returns the number of columns of the column. This is always equal to `1`.
    #[inline(always)]
    pub fn ncols(&self) -> usize {
        1
    }

    /// Returns the number of elements of the column.
    #[inline(always)]
    pub fn n_elem(&self) -> usize {
        self.inner.nrows()
    }

    /// Changes the number of rows without preserving the contents.
    #[inline]
    #[track_caller]
    pub fn set_size(&mut self, nrows: usize) {
        self.inner.set_size(nrows, 1);
    }

    /// Changes the number of rows, preserving the leading elements and zero-initializing the
    /// others.
    #[inline]
    #[track_caller]
    pub fn resize(&mut self, nrows: usize) {
        self.inner.resize(nrows, 1);
    }

    /// Fills the column with `value`.
    #[inline]
    pub fn fill(&mut self, value: E) {
        self.inner.fill(value);
    }

    /// Reads the element at index `row`.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize) -> E {
        self.inner.read(row, 0)
    }

    /// Writes `value` to the element at index `row`.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()`.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, value: E) {
        self.inner.write(row, 0, value)
    }

    /// Returns a pointer to the data of the column.
    #[inline]
    pub fn as_ptr(&self) -> *const E {
        self.inner.as_ptr()
    }

    /// Returns a reference to a slice over the column.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        self.inner.as_slice()
    }

    /// Returns a mutable reference to a slice over the column.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        self.inner.as_slice_mut()
    }

    /// Returns a view over the column, as an `nrows×1` matrix.
    #[inline]
    pub fn as_ref(&self) -> MatRef<'_, E> {
        self.inner.as_ref()
    }

    /// Returns a mutable view over the column, as an `nrows×1` matrix.
    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_, E> {
        self.inner.as_mut()
    }

    /// Returns a view over the `nrows` elements starting at `row_start`.
    #[inline]
    #[track_caller]
    pub fn subrows(&self, row_start: usize, nrows: usize) -> SubMatRef<'_, E> {
        self.inner.submatrix(row_start, 0, nrows, 1)
    }

    /// Returns a mutable view over the `nrows` elements starting at `row_start`.
    #[inline]
    #[track_caller]
    pub fn subrows_mut(&mut self, row_start: usize, nrows: usize) -> SubMatMut<'_, E> {
        self.inner.submatrix_mut(row_start, 0, nrows, 1)
    }

    /// Returns the column as a matrix.
    #[inline]
    pub fn as_mat(&self) -> &Mat<E> {
        &self.inner
    }

    /// Converts the column into a matrix with one column.
    #[inline]
    pub fn into_mat(self) -> Mat<E> {
        self.inner
    }

    /// Returns a lazy transpose of the column, a row.
    #[inline]
    pub fn t(&self) -> Trans<MatRef<'_, E>> {
        Mat::t(&self.inner)
    }

    /// Evaluates the expression into `self`, resizing it as needed.
    ///
    /// # Panics
    /// Panics if the expression does not have exactly one column.
    #[inline]
    #[track_caller]
    pub fn assign<X: Expr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }
}

impl<E: Scalar> Index<usize> for Col<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, row: usize) -> &E {
        &self.inner.as_slice()[row]
    }
}

impl<E: Scalar> IndexMut<usize> for Col<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, row: usize) -> &mut E {
        &mut self.inner.as_slice_mut()[row]
    }
}

impl<E: Scalar> fmt::Debug for Col<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<E: Scalar> From<Col<E>> for Mat<E> {
    #[inline]
    fn from(col: Col<E>) -> Self {
        col.inner
    }
}

impl<E: Scalar> TryFrom<Mat<E>> for Col<E> {
    type Error = Mat<E>;

    /// Converts an `n×1` matrix into a column, giving the matrix back otherwise.
    #[inline]
    fn try_from(mat: Mat<E>) -> Result<Self, Mat<E>> {
        if mat.ncols() == 1 {
            Ok(Self { inner: mat })
        } else {
            Err(mat)
        }
    }
}

impl<'a, E: Scalar> Expr for &'a Col<E> {
    type Elem = E;
    type Proxy = MatRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> MatRef<'a, E> {
        self.as_ref()
    }
}

impl<E: Scalar> Expr for Col<E> {
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
fn check_col(nrows: usize, ncols: usize) {
    if ncols != 1 {
        DimensionMismatch::mat("copy into column", (nrows, 1), (nrows, ncols)).panic();
    }
}

impl<E: Scalar> Target for Col<E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.nrows(), 1)
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
        check_col(nrows, ncols);
        self.set_size(nrows);
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Mat<E>) {
        check_col(result.nrows(), result.ncols());
        self.inner = result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{col, mat, row};

    #[test]
    fn test_col_basics() {
        let mut c = col![1.0, 2.0, 3.0f64];
        assert_eq!(c.nrows(), 3);
        assert_eq!(c.ncols(), 1);
        assert_eq!(c[1], 2.0);
        c[1] = 5.0;
        c.write(2, 7.0);
        assert_eq!(c.as_slice(), &[1.0, 5.0, 7.0]);

        c.resize(4);
        assert_eq!(c.as_slice(), &[1.0, 5.0, 7.0, 0.0]);
        assert_eq!(Col::<i32>::from_fn(3, |i| i as i32 * 2), col![0, 2, 4]);
        assert_eq!(Col::<i32>::new().nrows(), 0);
    }

    #[test]
    fn test_col_in_expressions() {
        let a = mat![[1, 2], [3, 4i64]];
        let x = col![1, 1i64];
        let mut y = Col::new();
        y.assign(&a * &x + &x);
        assert_eq!(y, col![4, 8]);

        y += &x;
        y *= 2i64;
        assert_eq!(y.as_slice(), &[10, 18]);

        let r = row![1, 2i64];
        assert_eq!((&r * &y).eval(), mat![[46]]);
        assert_eq!((x.t() * &y).eval(), mat![[28]]);
    }

    #[test]
    #[should_panic(expected = "copy into column: incompatible matrix dimensions: 2x1 and 2x2")]
    fn test_col_rejects_matrix_results() {
        let a = mat![[1, 2], [3, 4i64]];
        let mut y = Col::<i64>::new();
        y.assign(&a);
    }

    #[test]
    fn test_col_conversions() {
        let m: Mat<f32> = col![1.0, 2.0f32].into();
        assert_eq!(m.ncols(), 1);
        assert!(Col::try_from(m).is_ok());
        assert!(Col::try_from(Mat::<f32>::zeros(2, 2)).is_err());
    }
}
