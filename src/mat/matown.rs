use super::*;
use crate::{
    expr::{Expr, MemRegion, Trans},
    Scalar,
};
use core::{
    fmt,
    ops::{Index, IndexMut},
};
use smallvec::SmallVec;

/// Whether the storage of a [`Mat`] is inline or on the heap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemState {
    /// Elements are stored inside the matrix object.
    Inline,
    /// Elements are stored in a heap allocation owned by the matrix.
    Heap,
}

/// Heap allocated (or inline, for small sizes) resizable matrix, stored in column-major order.
///
/// The matrix can be resized with [`Mat::set_size`] and [`Mat::resize`], and assigned the result
/// of any expression with [`Mat::assign`].
///
/// Element `(i, j)` is stored at offset `i + j * nrows`, which makes the storage directly
/// usable by column-major numeric backends.
#[derive(Clone)]
pub struct Mat<E: Scalar> {
    data: SmallVec<[E; MAT_INLINE_CAPACITY]>,
    nrows: usize,
    ncols: usize,
}

#[cold]
#[track_caller]
fn size_overflow() -> ! {
    panic!("requested matrix size is too large")
}

#[inline]
#[track_caller]
fn checked_len(nrows: usize, ncols: usize) -> usize {
    match nrows.checked_mul(ncols) {
        Some(len) => len,
        None => size_overflow(),
    }
}

impl<E: Scalar> Default for Mat<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Scalar> Mat<E> {
    /// Returns an empty matrix of dimension `0×0`.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: SmallVec::new(),
            nrows: 0,
            ncols: 0,
        }
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with zeros.
    #[inline]
    #[track_caller]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::full(nrows, ncols, E::zero())
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with ones.
    #[inline]
    #[track_caller]
    pub fn ones(nrows: usize, ncols: usize) -> Self {
        Self::full(nrows, ncols, E::one())
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with `value`.
    #[inline]
    #[track_caller]
    pub fn full(nrows: usize, ncols: usize, value: E) -> Self {
        Self {
            data: smallvec::smallvec![value; checked_len(nrows, ncols)],
            nrows,
            ncols,
        }
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, with ones on the diagonal and zeros
    /// elsewhere.
    #[inline]
    #[track_caller]
    pub fn identity(nrows: usize, ncols: usize) -> Self {
        let mut this = Self::zeros(nrows, ncols);
        for i in 0..Ord::min(nrows, ncols) {
            this.data[i + i * nrows] = E::one();
        }
        this
    }

    /// Returns a new matrix with dimensions `(nrows, ncols)`, filled with the provided function.
    #[inline]
    #[track_caller]
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> E) -> Self {
        let mut data = SmallVec::with_capacity(checked_len(nrows, ncols));
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Returns a new matrix copying the elements of a column-major slice.
    ///
    /// # Panics
    /// Panics if `slice.len() != nrows * ncols`.
    #[inline]
    #[track_caller]
    pub fn from_column_major_slice(slice: &[E], nrows: usize, ncols: usize) -> Self {
        equator::assert!(slice.len() == checked_len(nrows, ncols));
        Self {
            data: SmallVec::from_slice(slice),
            nrows,
            ncols,
        }
    }

    /// Returns the number of rows of the matrix.
    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns of the matrix.
    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the number of elements of the matrix.
    #[inline(always)]
    pub fn n_elem(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the elements are stored inline or on the heap.
    #[inline]
    pub fn mem_state(&self) -> MemState {
        if self.data.spilled() {
            MemState::Heap
        } else {
            MemState::Inline
        }
    }

    /// Changes the dimensions of the matrix without preserving its contents.
    ///
    /// Nothing happens when the dimensions already match. When only the shape changes but the
    /// number of elements stays the same, the storage is reused as is. Otherwise the new
    /// elements are zero-initialized.
    #[track_caller]
    pub fn set_size(&mut self, nrows: usize, ncols: usize) {
        if nrows == self.nrows && ncols == self.ncols {
            return;
        }
        let len = checked_len(nrows, ncols);
        if len != self.data.len() {
            self.data.clear();
            self.data.resize(len, E::zero());
        }
        self.nrows = nrows;
        self.ncols = ncols;
    }

    /// Changes the dimensions of the matrix to match those of `other`.
    #[inline]
    pub fn copy_size<F: Scalar>(&mut self, other: &Mat<F>) {
        self.set_size(other.nrows(), other.ncols());
    }

    /// Changes the dimensions of the matrix, preserving the elements in the overlapping top
    /// left block and zero-initializing the others.
    #[track_caller]
    pub fn resize(&mut self, nrows: usize, ncols: usize) {
        if nrows == self.nrows && ncols == self.ncols {
            return;
        }
        let old = core::mem::replace(self, Self::zeros(nrows, ncols));
        let min_rows = Ord::min(nrows, old.nrows);
        let min_cols = Ord::min(ncols, old.ncols);
        for j in 0..min_cols {
            self.data[j * nrows..j * nrows + min_rows]
                .copy_from_slice(&old.data[j * old.nrows..j * old.nrows + min_rows]);
        }
    }

    /// Sets the dimensions to `0×0` and releases the storage.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Resizes the matrix to `(nrows, ncols)` and fills it with zeros.
    #[inline]
    #[track_caller]
    pub fn set_zeros(&mut self, nrows: usize, ncols: usize) {
        self.set_size(nrows, ncols);
        self.fill(E::zero());
    }

    /// Resizes the matrix to `(nrows, ncols)` and fills it with ones.
    #[inline]
    #[track_caller]
    pub fn set_ones(&mut self, nrows: usize, ncols: usize) {
        self.set_size(nrows, ncols);
        self.fill(E::one());
    }

    /// Fills the matrix with `value`.
    #[inline]
    pub fn fill(&mut self, value: E) {
        for x in self.data.iter_mut() {
            *x = value;
        }
    }

    /// Takes the storage of `other`, leaving it empty.
    #[inline]
    pub fn steal_mem(&mut self, other: &mut Self) {
        *self = core::mem::take(other);
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> E {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        unsafe { self.read_unchecked(row, col) }
    }

    /// Reads the value of the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Requires `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    #[track_caller]
    pub unsafe fn read_unchecked(&self, row: usize, col: usize) -> E {
        debug_assert!(row < self.nrows && col < self.ncols);
        *self.data.get_unchecked(row + col * self.nrows)
    }

    /// Writes the value to the element at the given indices.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, value: E) {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        unsafe { self.write_unchecked(row, col, value) }
    }

    /// Writes the value to the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Requires `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    #[track_caller]
    pub unsafe fn write_unchecked(&mut self, row: usize, col: usize, value: E) {
        debug_assert!(row < self.nrows && col < self.ncols);
        *self.data.get_unchecked_mut(row + col * self.nrows) = value;
    }

    /// Returns a pointer to the column-major storage.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const E {
        self.data.as_ptr()
    }

    /// Returns a mutable pointer to the column-major storage.
    #[inline(always)]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.data.as_mut_ptr()
    }

    /// Returns the column-major storage as a slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    /// Returns the column-major storage as a mutable slice.
    #[inline(always)]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        &mut self.data
    }

    /// Returns the elements of column `col` as a slice.
    #[inline]
    #[track_caller]
    pub fn col_as_slice(&self, col: usize) -> &[E] {
        equator::assert!(col < self.ncols);
        &self.data[col * self.nrows..(col + 1) * self.nrows]
    }

    /// Returns the elements of column `col` as a mutable slice.
    #[inline]
    #[track_caller]
    pub fn col_as_slice_mut(&mut self, col: usize) -> &mut [E] {
        equator::assert!(col < self.ncols);
        &mut self.data[col * self.nrows..(col + 1) * self.nrows]
    }

    /// Returns a view over the matrix.
    #[inline]
    pub fn as_ref(&self) -> MatRef<'_, E> {
        unsafe { MatRef::__from_raw_parts(self.as_ptr(), self.nrows, self.ncols) }
    }

    /// Returns a mutable view over the matrix.
    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_, E> {
        let (nrows, ncols) = (self.nrows, self.ncols);
        unsafe { MatMut::__from_raw_parts(self.as_ptr_mut(), nrows, ncols) }
    }

    /// Returns a view over column `col`.
    #[inline]
    #[track_caller]
    pub fn col(&self, col: usize) -> MatRef<'_, E> {
        self.as_ref().col(col)
    }

    /// Returns a mutable view over column `col`.
    #[inline]
    #[track_caller]
    pub fn col_mut(&mut self, col: usize) -> MatMut<'_, E> {
        self.as_mut().into_col(col)
    }

    /// Returns a view over row `row`.
    #[inline]
    #[track_caller]
    pub fn row(&self, row: usize) -> SubMatRef<'_, E> {
        self.as_ref().row(row)
    }

    /// Returns a mutable view over row `row`.
    #[inline]
    #[track_caller]
    pub fn row_mut(&mut self, row: usize) -> SubMatMut<'_, E> {
        self.as_mut().into_row(row)
    }

    /// Returns a view over the `nrows×ncols` block starting at `(row_start, col_start)`.
    #[inline]
    #[track_caller]
    pub fn submatrix(
        &self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> SubMatRef<'_, E> {
        self.as_ref().submatrix(row_start, col_start, nrows, ncols)
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
        self.as_mut()
            .into_submat()
            .into_submatrix(row_start, col_start, nrows, ncols)
    }

    /// Returns a lazy transpose of the matrix.
    #[inline]
    pub fn t(&self) -> Trans<MatRef<'_, E>> {
        Trans::new(self.as_ref())
    }

    /// Evaluates the expression into `self`, resizing it as needed.
    ///
    /// If the expression reads memory owned by `self`, it is evaluated into a temporary whose
    /// storage then replaces that of `self`.
    #[inline]
    #[track_caller]
    pub fn assign<X: Expr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }

    /// Returns the memory region covered by the matrix storage.
    #[inline]
    pub fn region(&self) -> MemRegion {
        MemRegion::contiguous(self.as_ptr(), self.n_elem())
    }
}

impl<E: Scalar> Index<(usize, usize)> for Mat<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, (row, col): (usize, usize)) -> &E {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        &self.data[row + col * self.nrows]
    }
}

impl<E: Scalar> IndexMut<(usize, usize)> for Mat<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut E {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        &mut self.data[row + col * self.nrows]
    }
}

impl<E: Scalar> Index<usize> for Mat<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &E {
        &self.data[index]
    }
}

impl<E: Scalar> IndexMut<usize> for Mat<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut E {
        &mut self.data[index]
    }
}

impl<E: Scalar> PartialEq for Mat<E> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl<E: Scalar> fmt::Debug for Mat<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    #[test]
    fn test_column_major_layout() {
        let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0f64]];
        assert_eq!(
            a.as_slice(),
            &[1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0]
        );
        assert_eq!(a[(2, 1)], 8.0);
        assert_eq!(a[5], 8.0);
        assert_eq!(a.n_elem(), a.nrows() * a.ncols());
    }

    #[test]
    fn test_inline_threshold() {
        let small = Mat::<f64>::zeros(4, 4);
        assert_eq!(small.mem_state(), MemState::Inline);
        let large = Mat::<f64>::zeros(4, 5);
        assert_eq!(large.mem_state(), MemState::Heap);
    }

    #[test]
    fn test_set_size_reuses_storage() {
        let mut a = Mat::from_fn(2, 6, |i, j| (i + 2 * j) as f64);
        let ptr = a.as_ptr();
        a.set_size(2, 6);
        assert_eq!(a.as_ptr(), ptr);
        a.set_size(3, 4);
        assert_eq!(a.as_ptr(), ptr);
        assert_eq!((a.nrows(), a.ncols(), a.n_elem()), (3, 4, 12));
        a.set_size(1, 1);
        assert_eq!(a.n_elem(), 1);
    }

    #[test]
    fn test_resize_preserves_block() {
        let mut a = mat![[1, 2], [3, 4i32]];
        a.resize(3, 3);
        assert_eq!(a, mat![[1, 2, 0], [3, 4, 0], [0, 0, 0]]);
        a.resize(1, 2);
        assert_eq!(a, mat![[1, 2]]);
    }

    #[test]
    fn test_reset_and_fill() {
        let mut a = Mat::<u32>::identity(3, 2);
        assert_eq!(a, mat![[1, 0], [0, 1], [0, 0]]);
        a.set_ones(2, 2);
        assert_eq!(a, Mat::full(2, 2, 1));
        a.reset();
        assert_eq!((a.nrows(), a.ncols()), (0, 0));
    }

    #[test]
    fn test_steal_mem() {
        let mut a = Mat::<f64>::new();
        let mut b = Mat::<f64>::ones(10, 10);
        let ptr = b.as_ptr();
        a.steal_mem(&mut b);
        assert_eq!(a.as_ptr(), ptr);
        assert_eq!(b.n_elem(), 0);
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds() {
        let a = Mat::<f64>::zeros(2, 2);
        let _ = a[(2, 0)];
    }
}
