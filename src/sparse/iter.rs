use super::{row_major_index, SpMat};
use crate::Scalar;
use core::iter::FusedIterator;

/// Two-ended position over a compressed structure, tracking the outer index (column or row) of
/// both ends.
#[derive(Clone, Debug)]
struct Cursor {
    front: usize,
    back: usize,
    front_outer: usize,
    back_outer: usize,
}

impl Cursor {
    #[inline]
    fn new(ptrs: &[usize]) -> Self {
        let n_outer = ptrs.len() - 1;
        Self {
            front: 0,
            back: ptrs[n_outer],
            front_outer: 0,
            back_outer: n_outer.saturating_sub(1),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.back - self.front
    }

    /// Returns the outer index and storage position of the next element from the front.
    #[inline]
    fn next(&mut self, ptrs: &[usize]) -> Option<(usize, usize)> {
        if self.front == self.back {
            return None;
        }
        while ptrs[self.front_outer + 1] <= self.front {
            self.front_outer += 1;
        }
        let pos = self.front;
        self.front += 1;
        Some((self.front_outer, pos))
    }

    /// Returns the outer index and storage position of the next element from the back.
    #[inline]
    fn next_back(&mut self, ptrs: &[usize]) -> Option<(usize, usize)> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        while ptrs[self.back_outer] > self.back {
            self.back_outer -= 1;
        }
        Some((self.back_outer, self.back))
    }
}

/// Iterator over the stored elements of a [`SpMat`] as `(row, col, value)`, by column then row.
///
/// Created by [`SpMat::iter`].
#[derive(Clone, Debug)]
pub struct SpIter<'a, E: Scalar> {
    mat: &'a SpMat<E>,
    cursor: Cursor,
}

impl<'a, E: Scalar> SpIter<'a, E> {
    #[inline]
    pub(super) fn new(mat: &'a SpMat<E>) -> Self {
        Self {
            mat,
            cursor: Cursor::new(&mat.col_ptrs),
        }
    }
}

impl<E: Scalar> Iterator for SpIter<'_, E> {
    type Item = (usize, usize, E);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (col, pos) = self.cursor.next(&self.mat.col_ptrs)?;
        Some((self.mat.row_indices[pos], col, self.mat.values[pos]))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.cursor.len();
        (len, Some(len))
    }
}

impl<E: Scalar> DoubleEndedIterator for SpIter<'_, E> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let (col, pos) = self.cursor.next_back(&self.mat.col_ptrs)?;
        Some((self.mat.row_indices[pos], col, self.mat.values[pos]))
    }
}

impl<E: Scalar> ExactSizeIterator for SpIter<'_, E> {}
impl<E: Scalar> FusedIterator for SpIter<'_, E> {}

impl<'a, E: Scalar> IntoIterator for &'a SpMat<E> {
    type Item = (usize, usize, E);
    type IntoIter = SpIter<'a, E>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the stored elements of a [`SpMat`] as `(row, col, value)`, by row then column.
///
/// Created by [`SpMat::iter_rows`]. It owns a row-major index of the matrix, built when the
/// iterator is created.
#[derive(Clone, Debug)]
pub struct SpRowIter<'a, E: Scalar> {
    mat: &'a SpMat<E>,
    row_ptrs: Vec<usize>,
    col_indices: Vec<usize>,
    positions: Vec<usize>,
    cursor: Cursor,
}

impl<'a, E: Scalar> SpRowIter<'a, E> {
    pub(super) fn new(mat: &'a SpMat<E>) -> Self {
        #[cfg(feature = "perf-warn")]
        if mat.nnz() > 0 && crate::__perf_warn!(SPARSE_ROW_ITER_WARN) {
            log::warn!(
                target: "armature_perf",
                "Row-major iteration over a {}x{} sparse matrix builds a row index of {} elements.",
                mat.nrows(),
                mat.ncols(),
                mat.nnz(),
            );
        }

        let (row_ptrs, col_indices, positions) = row_major_index(mat);
        let cursor = Cursor::new(&row_ptrs);
        Self {
            mat,
            row_ptrs,
            col_indices,
            positions,
            cursor,
        }
    }

    #[inline]
    fn item(&self, row: usize, idx: usize) -> (usize, usize, E) {
        (row, self.col_indices[idx], self.mat.values[self.positions[idx]])
    }
}

impl<E: Scalar> Iterator for SpRowIter<'_, E> {
    type Item = (usize, usize, E);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (row, idx) = self.cursor.next(&self.row_ptrs)?;
        Some(self.item(row, idx))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.cursor.len();
        (len, Some(len))
    }
}

impl<E: Scalar> DoubleEndedIterator for SpRowIter<'_, E> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let (row, idx) = self.cursor.next_back(&self.row_ptrs)?;
        Some(self.item(row, idx))
    }
}

impl<E: Scalar> ExactSizeIterator for SpRowIter<'_, E> {}
impl<E: Scalar> FusedIterator for SpRowIter<'_, E> {}
