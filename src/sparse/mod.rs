//! Sparse matrices in compressed sparse column format.
//!
//! Each column of the matrix is represented by the row indices of its stored elements, in
//! strictly increasing order, and by their values. The indices and values of all the columns are
//! stored back to back, and a slice of `ncols + 1` column pointers gives where each column starts,
//! with the last one equal to the number of stored elements.
//!
//! # Example
//!
//! Consider the 4-by-5 matrix:
//! ```notcode
//! [[10.0, 0.0, 12.0, -1.0, 13.0]
//!  [ 0.0, 0.0, 25.0, -2.0,  0.0]
//!  [ 1.0, 0.0,  0.0,  0.0,  0.0]
//!  [ 4.0, 0.0,  0.0,  0.0,  5.0]]
//! ```
//!
//! The matrix is stored as follows:
//! ```notcode
//! column pointers:  0 |  3 |  3 |  5 |  7 |  9
//!
//! row indices:    0 |    2 |    3 |    0 |    1 |    0 |    1 |    0 |    3
//! values     : 10.0 |  1.0 |  4.0 | 12.0 | 25.0 | -1.0 | -2.0 | 13.0 |  5.0
//! ```
//!
//! Stored elements may be zero. Operations that compute new values (expressions, products,
//! [`SpMat::prune_zeros`]) drop exact zeros, while structural operations keep whatever is stored.
//!
//! A [`SpMat`] is always in canonical form when it can be observed. Inserting many elements
//! one at a time through [`SpMat::add_element`] shifts the storage every time, so
//! [`SpMat::batch`] returns a [`SpBatch`] that collects insertions and merges them all at once
//! when it is dropped.

use crate::{error::CreationError, expr::MemRegion, mat::Mat, Expr, Proxy, Scalar};
use core::{fmt, ops::Range};

mod batch;
mod iter;
pub mod matmul;
mod ops;
mod proxy;
mod value;

pub use batch::SpBatch;
pub use iter::{SpIter, SpRowIter};
pub use proxy::{
    abs, ceil, floor, round, sqrt, square, ColEntries, SpEGlueKind, SpEOp, SpEOpCol, SpEOpKind,
    SpExpr, SpGlue, SpGlueCol, SpProxy,
};
pub use value::SpValProxy;

/// Sparse matrix in compressed sparse column format.
#[derive(Clone, PartialEq)]
pub struct SpMat<E: Scalar> {
    nrows: usize,
    ncols: usize,
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<E>,
}

impl<E: Scalar> Default for SpMat<E> {
    #[inline]
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl<E: Scalar> SpMat<E> {
    /// Returns an `nrows×ncols` matrix with no stored elements.
    #[inline]
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            col_ptrs: vec![0; ncols + 1],
            row_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns an `nrows×ncols` matrix storing ones on its diagonal.
    pub fn identity(nrows: usize, ncols: usize) -> Self {
        let n = Ord::min(nrows, ncols);
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        col_ptrs.extend(0..=n);
        col_ptrs.resize(ncols + 1, n);
        Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices: (0..n).collect(),
            values: vec![E::one(); n],
        }
    }

    /// Creates a matrix from its column pointers, row indices and values, checking that they
    /// describe a valid matrix in canonical form.
    ///
    /// # Errors
    /// - [`CreationError::InvalidColPtrs`] if `col_ptrs` does not have `ncols + 1` elements, does
    /// not start at zero, is not non-decreasing, or does not end at the length of `row_indices`
    /// and `values`.
    /// - [`CreationError::UnsortedIndices`] if the row indices of a column are not strictly
    /// increasing.
    /// - [`CreationError::OutOfBounds`] if a row index is not smaller than `nrows`.
    pub fn try_new_from_parts(
        nrows: usize,
        ncols: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<E>,
    ) -> Result<Self, CreationError> {
        if col_ptrs.len() != ncols + 1
            || col_ptrs[0] != 0
            || col_ptrs[ncols] != row_indices.len()
            || row_indices.len() != values.len()
            || col_ptrs.windows(2).any(|w| w[0] > w[1])
        {
            return Err(CreationError::InvalidColPtrs);
        }

        for col in 0..ncols {
            let rows = &row_indices[col_ptrs[col]..col_ptrs[col + 1]];
            if rows.windows(2).any(|w| w[0] >= w[1]) {
                return Err(CreationError::UnsortedIndices { col });
            }
            if let Some(&row) = rows.last() {
                if row >= nrows {
                    return Err(CreationError::OutOfBounds { row, col });
                }
            }
        }

        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    /// Creates a matrix from `(row, col, value)` triplets. Values of duplicate coordinates are
    /// summed.
    ///
    /// # Errors
    /// [`CreationError::OutOfBounds`] if a coordinate is outside the matrix. When several are,
    /// the smallest one in column-major order is reported.
    pub fn try_new_from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, E)],
    ) -> Result<Self, CreationError> {
        if let Some(&(row, col, _)) = triplets
            .iter()
            .filter(|&&(row, col, _)| row >= nrows || col >= ncols)
            .min_by_key(|&&(row, col, _)| (col, row))
        {
            return Err(CreationError::OutOfBounds { row, col });
        }

        let mut order: Vec<usize> = (0..triplets.len()).collect();
        order.sort_by_key(|&idx| (triplets[idx].1, triplets[idx].0));

        let mut col_ptrs = vec![0usize; ncols + 1];
        let mut row_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::<E>::with_capacity(triplets.len());

        let mut prev: Option<(usize, usize)> = None;
        for idx in order {
            let (row, col, value) = triplets[idx];
            if prev == Some((row, col)) {
                if let Some(last) = values.last_mut() {
                    *last = last.plus(value);
                }
                continue;
            }
            prev = Some((row, col));
            row_indices.push(row);
            values.push(value);
            col_ptrs[col + 1] += 1;
        }
        for col in 0..ncols {
            col_ptrs[col + 1] += col_ptrs[col];
        }

        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    /// Creates a matrix storing the nonzero elements of a dense expression.
    pub fn from_dense<X: Expr<Elem = E>>(expr: X) -> Self {
        let src = expr.into_proxy();
        let (nrows, ncols) = (src.nrows(), src.ncols());
        let mut out = Self::new(nrows, ncols);
        for col in 0..ncols {
            for row in 0..nrows {
                let value = unsafe { src.at_unchecked(row, col) };
                if value != E::zero() {
                    out.row_indices.push(row);
                    out.values.push(value);
                }
            }
            out.col_ptrs[col + 1] = out.row_indices.len();
        }
        out
    }

    /// Returns a dense copy of the matrix.
    pub fn to_dense(&self) -> Mat<E> {
        let mut out = Mat::zeros(self.nrows, self.ncols);
        for (row, col, value) in self.iter() {
            out.write(row, col, value);
        }
        out
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
    /// Returns the number of rows and columns of the matrix.
    #[inline(always)]
    pub fn dims(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
    /// Returns the number of stored elements.
    #[inline(always)]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns the column pointers.
    #[inline]
    pub fn col_ptrs(&self) -> &[usize] {
        &self.col_ptrs
    }
    /// Returns the row indices of all the stored elements.
    #[inline]
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }
    /// Returns the values of all the stored elements.
    #[inline]
    pub fn values(&self) -> &[E] {
        &self.values
    }
    /// Returns the values of all the stored elements. The sparsity pattern cannot be changed
    /// through this slice, but stored elements may be set to zero.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [E] {
        &mut self.values
    }

    /// Returns the range of storage positions of column `col`.
    ///
    /// # Panics
    /// Panics if `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn col_range(&self, col: usize) -> Range<usize> {
        equator::assert!(col < self.ncols);
        self.col_ptrs[col]..self.col_ptrs[col + 1]
    }
    /// Returns the row indices of the stored elements of column `col`.
    #[inline]
    #[track_caller]
    pub fn row_indices_of_col(&self, col: usize) -> &[usize] {
        &self.row_indices[self.col_range(col)]
    }
    /// Returns the values of the stored elements of column `col`.
    #[inline]
    #[track_caller]
    pub fn values_of_col(&self, col: usize) -> &[E] {
        &self.values[self.col_range(col)]
    }

    #[inline]
    fn find(&self, row: usize, col: usize) -> Result<usize, usize> {
        let start = self.col_ptrs[col];
        let end = self.col_ptrs[col + 1];
        match self.row_indices[start..end].binary_search(&row) {
            Ok(pos) => Ok(start + pos),
            Err(pos) => Err(start + pos),
        }
    }

    /// Returns a reference to the element at `(row, col)` if it is stored.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn get(&self, row: usize, col: usize) -> Option<&E> {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        self.find(row, col).ok().map(|pos| &self.values[pos])
    }

    /// Returns the value at `(row, col)`, which is zero if the element is not stored.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> E {
        self.get(row, col).copied().unwrap_or(E::zero())
    }

    /// Returns a proxy to the element at `(row, col)`, through which it can be read and written.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[inline]
    #[track_caller]
    pub fn at_mut(&mut self, row: usize, col: usize) -> SpValProxy<'_, E> {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        SpValProxy::new(self, row, col)
    }

    /// Stores `value` at `(row, col)`. If the element is already stored, its value is overwritten
    /// in place. Otherwise a slot is inserted and the following column pointers are shifted.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[track_caller]
    pub fn add_element(&mut self, row: usize, col: usize, value: E) {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        match self.find(row, col) {
            Ok(pos) => self.values[pos] = value,
            Err(pos) => {
                self.row_indices.insert(pos, row);
                self.values.insert(pos, value);
                for ptr in &mut self.col_ptrs[col + 1..] {
                    *ptr += 1;
                }
            }
        }
    }

    /// Removes the element at `(row, col)` from the storage, and returns its value if it was
    /// stored.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
    #[track_caller]
    pub fn delete_element(&mut self, row: usize, col: usize) -> Option<E> {
        equator::assert!(all(row < self.nrows, col < self.ncols));
        let pos = self.find(row, col).ok()?;
        self.row_indices.remove(pos);
        let value = self.values.remove(pos);
        for ptr in &mut self.col_ptrs[col + 1..] {
            *ptr -= 1;
        }
        Some(value)
    }

    /// Returns a batch inserter. The insertions are merged into the matrix when the batch is
    /// dropped.
    #[inline]
    pub fn batch(&mut self) -> SpBatch<'_, E> {
        SpBatch::new(self)
    }

    /// Removes row `row`, shifting the following rows up.
    ///
    /// # Panics
    /// Panics if `row >= self.nrows()`.
    #[track_caller]
    pub fn shed_row(&mut self, row: usize) {
        equator::assert!(row < self.nrows);
        self.shed_rows(row..row + 1)
    }

    /// Removes the rows in `rows`, shifting the following rows up.
    ///
    /// # Panics
    /// Panics if the range is decreasing or ends past `self.nrows()`.
    #[track_caller]
    pub fn shed_rows(&mut self, rows: Range<usize>) {
        equator::assert!(all(rows.start <= rows.end, rows.end <= self.nrows));
        let removed = rows.end - rows.start;
        if removed == 0 {
            return;
        }

        let mut write = 0;
        let mut read_start = 0;
        for col in 0..self.ncols {
            let read_end = self.col_ptrs[col + 1];
            for pos in read_start..read_end {
                let row = self.row_indices[pos];
                if rows.contains(&row) {
                    continue;
                }
                self.row_indices[write] = if row >= rows.end { row - removed } else { row };
                self.values[write] = self.values[pos];
                write += 1;
            }
            self.col_ptrs[col + 1] = write;
            read_start = read_end;
        }
        self.row_indices.truncate(write);
        self.values.truncate(write);
        self.nrows -= removed;
    }

    /// Removes column `col`, shifting the following columns left.
    ///
    /// # Panics
    /// Panics if `col >= self.ncols()`.
    #[track_caller]
    pub fn shed_col(&mut self, col: usize) {
        equator::assert!(col < self.ncols);
        self.shed_cols(col..col + 1)
    }

    /// Removes the columns in `cols`, shifting the following columns left.
    ///
    /// # Panics
    /// Panics if the range is decreasing or ends past `self.ncols()`.
    #[track_caller]
    pub fn shed_cols(&mut self, cols: Range<usize>) {
        equator::assert!(all(cols.start <= cols.end, cols.end <= self.ncols));
        if cols.start == cols.end {
            return;
        }

        let start = self.col_ptrs[cols.start];
        let end = self.col_ptrs[cols.end];
        self.row_indices.drain(start..end);
        self.values.drain(start..end);
        self.col_ptrs.drain(cols.start + 1..cols.end + 1);
        for ptr in &mut self.col_ptrs[cols.start + 1..] {
            *ptr -= end - start;
        }
        self.ncols -= cols.end - cols.start;
    }

    /// Removes the stored elements that are equal to zero.
    pub fn prune_zeros(&mut self) {
        let mut write = 0;
        let mut read_start = 0;
        for col in 0..self.ncols {
            let read_end = self.col_ptrs[col + 1];
            for pos in read_start..read_end {
                if self.values[pos] != E::zero() {
                    self.row_indices[write] = self.row_indices[pos];
                    self.values[write] = self.values[pos];
                    write += 1;
                }
            }
            self.col_ptrs[col + 1] = write;
            read_start = read_end;
        }
        self.row_indices.truncate(write);
        self.values.truncate(write);
    }

    /// Returns the transpose of the matrix.
    pub fn transpose(&self) -> Self {
        let (col_ptrs, row_indices, positions) = row_major_index(self);
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            col_ptrs,
            row_indices,
            values: positions.into_iter().map(|pos| self.values[pos]).collect(),
        }
    }

    /// Makes the matrix `nrows×ncols` with no stored elements. The storage capacity is kept.
    pub fn set_size(&mut self, nrows: usize, ncols: usize) {
        self.nrows = nrows;
        self.ncols = ncols;
        self.col_ptrs.clear();
        self.col_ptrs.resize(ncols + 1, 0);
        self.row_indices.clear();
        self.values.clear();
    }

    /// Makes the matrix `0×0`.
    #[inline]
    pub fn reset(&mut self) {
        self.set_size(0, 0)
    }

    /// Returns an iterator over the stored elements as `(row, col, value)`, ordered by column
    /// then row.
    #[inline]
    pub fn iter(&self) -> SpIter<'_, E> {
        SpIter::new(self)
    }

    /// Returns an iterator over the stored elements as `(row, col, value)`, ordered by row then
    /// column.
    ///
    /// The iterator builds a row-major index of the matrix when it is created, which takes
    /// `O(nnz + nrows)` time and memory.
    #[inline]
    pub fn iter_rows(&self) -> SpRowIter<'_, E> {
        SpRowIter::new(self)
    }

    /// Evaluates a sparse expression into the matrix.
    #[inline]
    #[track_caller]
    pub fn assign<X: SpExpr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }

    /// Memory region holding the values of the matrix.
    #[inline]
    pub fn region(&self) -> MemRegion {
        MemRegion::contiguous(self.values.as_ptr(), self.values.len())
    }
}

/// Row-major index of `mat`: row pointers, column indices sorted within each row, and the
/// storage position of each element in `mat`.
fn row_major_index<E: Scalar>(mat: &SpMat<E>) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let nnz = mat.nnz();
    let mut row_ptrs = vec![0usize; mat.nrows + 1];
    for &row in &mat.row_indices {
        row_ptrs[row + 1] += 1;
    }
    for row in 0..mat.nrows {
        row_ptrs[row + 1] += row_ptrs[row];
    }

    let mut next = row_ptrs.clone();
    let mut col_indices = vec![0usize; nnz];
    let mut positions = vec![0usize; nnz];
    for col in 0..mat.ncols {
        for pos in mat.col_ptrs[col]..mat.col_ptrs[col + 1] {
            let row = mat.row_indices[pos];
            let dst = next[row];
            col_indices[dst] = col;
            positions[dst] = pos;
            next[row] += 1;
        }
    }
    (row_ptrs, col_indices, positions)
}

impl<E: Scalar> fmt::Debug for SpMat<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpMat {}x{} ", self.nrows, self.ncols)?;
        f.debug_map()
            .entries(self.iter().map(|(row, col, value)| ((row, col), value)))
            .finish()
    }
}

impl<E: Scalar> From<&Mat<E>> for SpMat<E> {
    #[inline]
    fn from(mat: &Mat<E>) -> Self {
        Self::from_dense(mat)
    }
}

impl<E: Scalar> From<&SpMat<E>> for Mat<E> {
    #[inline]
    fn from(mat: &SpMat<E>) -> Self {
        mat.to_dense()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;

    fn example() -> SpMat<f64> {
        let mut m = SpMat::new(4, 4);
        m.add_element(0, 0, 5.0);
        m.add_element(2, 1, 3.0);
        m.add_element(3, 3, 7.0);
        m
    }

    #[test]
    fn test_insert_and_delete() {
        let mut m = example();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.col_ptrs(), &[0, 1, 2, 2, 3]);
        assert_eq!(m.row_indices(), &[0, 2, 3]);
        assert_eq!(m.values(), &[5.0, 3.0, 7.0]);

        assert_eq!(m.delete_element(2, 1), Some(3.0));
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.col_ptrs(), &[0, 1, 1, 1, 2]);
        assert_eq!(m.row_indices(), &[0, 3]);
        assert_eq!(m.values(), &[5.0, 7.0]);

        assert_eq!(m.delete_element(2, 1), None);
        m.add_element(0, 0, -1.0);
        assert_eq!(m.values(), &[-1.0, 7.0]);
        assert_eq!(m.read(1, 1), 0.0);
        assert_eq!(m.get(3, 3), Some(&7.0));
    }

    #[test]
    fn test_try_new_from_parts() {
        let m = SpMat::try_new_from_parts(3, 2, vec![0, 2, 3], vec![0, 2, 1], vec![1, 2, 3]);
        assert_eq!(m.map(|m| m.read(2, 0)), Ok(2));

        assert_eq!(
            SpMat::try_new_from_parts(3, 2, vec![0, 2], vec![0, 2], vec![1, 2]),
            Err(CreationError::InvalidColPtrs),
        );
        assert_eq!(
            SpMat::try_new_from_parts(3, 2, vec![0, 2, 1], vec![0, 2], vec![1, 2]),
            Err(CreationError::InvalidColPtrs),
        );
        assert_eq!(
            SpMat::try_new_from_parts(3, 2, vec![0, 1, 3], vec![0, 2, 2], vec![1, 2, 3]),
            Err(CreationError::UnsortedIndices { col: 1 }),
        );
        assert_eq!(
            SpMat::try_new_from_parts(3, 2, vec![0, 1, 2], vec![0, 3], vec![1, 2]),
            Err(CreationError::OutOfBounds { row: 3, col: 1 }),
        );
    }

    #[test]
    fn test_triplets_sum_duplicates() {
        let m = SpMat::try_new_from_triplets(
            3,
            3,
            &[(2, 1, 1.0), (0, 0, 2.0), (2, 1, 4.0), (1, 2, -1.0)],
        )
        .unwrap();
        assert_eq!(m.col_ptrs(), &[0, 1, 2, 3]);
        assert_eq!(m.row_indices(), &[0, 2, 1]);
        assert_eq!(m.values(), &[2.0, 5.0, -1.0]);

        assert_eq!(
            SpMat::<f64>::try_new_from_triplets(2, 2, &[(0, 5, 1.0), (2, 1, 1.0)]),
            Err(CreationError::OutOfBounds { row: 2, col: 1 }),
        );
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = mat![[1.0, 0.0, 0.0], [0.0, 0.0, 2.0], [3.0, 0.0, 4.0f64]];
        let sparse = SpMat::from_dense(&dense);
        assert_eq!(sparse.col_ptrs(), &[0, 2, 2, 4]);
        assert_eq!(sparse.row_indices(), &[0, 2, 1, 2]);
        assert_eq!(sparse.to_dense(), dense);
        assert_eq!(SpMat::from_dense(&sparse.to_dense()), sparse);
    }

    #[test]
    fn test_shed() {
        let dense = Mat::from_fn(4, 5, |i, j| if (i + j) % 2 == 0 { (10 * i + j) as i32 } else { 0 });
        let mut m = SpMat::from_dense(&dense);

        m.shed_rows(1..3);
        assert_eq!(m.to_dense(), Mat::from_fn(2, 5, |i, j| dense.read(if i == 0 { 0 } else { 3 }, j)));

        m.shed_col(0);
        m.shed_cols(1..3);
        assert_eq!(m.dims(), (2, 2));
        assert_eq!(m.to_dense(), mat![[0, 4], [31, 0]]);

        m.shed_row(1);
        assert_eq!(m.col_ptrs(), &[0, 0, 1]);
        assert_eq!(m.row_indices(), &[0]);
    }

    #[test]
    fn test_transpose_and_prune() {
        let mut m = example();
        m.add_element(0, 3, 0.0);
        let t = m.transpose();
        assert_eq!(t.dims(), (4, 4));
        assert_eq!(t.col_ptrs(), &[0, 2, 2, 3, 4]);
        assert_eq!(t.row_indices(), &[0, 3, 1, 3]);
        assert_eq!(t.to_dense(), Mat::from_fn(4, 4, |i, j| m.read(j, i)));

        m.prune_zeros();
        assert_eq!(m, example());
    }

    #[test]
    fn test_identity_and_set_size() {
        let mut m = SpMat::<u32>::identity(3, 4);
        assert_eq!(m.col_ptrs(), &[0, 1, 2, 3, 3]);
        assert_eq!(m.to_dense(), Mat::identity(3, 4));

        m.set_size(2, 2);
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.col_ptrs(), &[0, 0, 0]);
        m.reset();
        assert_eq!(m.dims(), (0, 0));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_insert() {
        let mut m = example();
        m.add_element(4, 0, 1.0);
    }
}
