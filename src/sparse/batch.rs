use super::SpMat;
use crate::Scalar;

/// Collects insertions into a [`SpMat`] and merges them into the storage in a single pass when it
/// is dropped.
///
/// While the batch is alive the matrix is mutably borrowed, so it can not be observed in its
/// intermediate state. When the same coordinates are inserted several times, the last value
/// wins. Inserting zero removes the element.
///
/// # Example
/// ```
/// use armature::SpMat;
///
/// let mut m = SpMat::<f64>::new(3, 3);
/// {
///     let mut batch = m.batch();
///     batch.insert(2, 2, 1.0);
///     batch.insert(0, 1, 2.0);
///     batch.insert(2, 2, 3.0);
/// }
/// assert_eq!(m.col_ptrs(), &[0, 0, 1, 2]);
/// assert_eq!(m.values(), &[2.0, 3.0]);
/// ```
pub struct SpBatch<'a, E: Scalar> {
    mat: &'a mut SpMat<E>,
    pending: Vec<(usize, usize, E)>,
}

impl<'a, E: Scalar> SpBatch<'a, E> {
    #[inline]
    pub(super) fn new(mat: &'a mut SpMat<E>) -> Self {
        Self {
            mat,
            pending: Vec::new(),
        }
    }

    /// Queues `value` to be stored at `(row, col)`.
    ///
    /// # Panics
    /// Panics if `row` or `col` are out of bounds.
    #[inline]
    #[track_caller]
    pub fn insert(&mut self, row: usize, col: usize, value: E) {
        equator::assert!(all(row < self.mat.nrows(), col < self.mat.ncols()));
        self.pending.push((row, col, value));
    }

    /// Reserves capacity for at least `additional` more insertions.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.pending.reserve(additional)
    }

    /// Returns the number of queued insertions.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no insertion is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Merges the queued insertions into the matrix.
    #[inline]
    pub fn finish(self) {}

    fn merge(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        // stable, so duplicates stay in insertion order
        self.pending.sort_by_key(|&(row, col, _)| (col, row));

        let mat = &mut *self.mat;
        let ncols = mat.ncols;
        let capacity = mat.nnz() + self.pending.len();
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        let mut row_indices = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        col_ptrs.push(0);

        let mut next = 0;
        for col in 0..ncols {
            let mut old = mat.col_ptrs[col]..mat.col_ptrs[col + 1];
            let new_end = next
                + self.pending[next..]
                    .iter()
                    .take_while(|&&(_, c, _)| c == col)
                    .count();

            loop {
                let old_row = if old.start < old.end {
                    Some(mat.row_indices[old.start])
                } else {
                    None
                };
                let new_row = if next < new_end {
                    Some(self.pending[next].0)
                } else {
                    None
                };

                let take_old = match (old_row, new_row) {
                    (None, None) => break,
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (Some(old_row), Some(new_row)) => old_row < new_row,
                };

                if take_old {
                    row_indices.push(mat.row_indices[old.start]);
                    values.push(mat.values[old.start]);
                    old.start += 1;
                    continue;
                }

                let row = self.pending[next].0;
                if old_row == Some(row) {
                    old.start += 1;
                }
                while next + 1 < new_end && self.pending[next + 1].0 == row {
                    next += 1;
                }
                let value = self.pending[next].2;
                next += 1;
                if value != E::zero() {
                    row_indices.push(row);
                    values.push(value);
                }
            }
            col_ptrs.push(row_indices.len());
        }

        mat.col_ptrs = col_ptrs;
        mat.row_indices = row_indices;
        mat.values = values;
        self.pending.clear();
    }
}

impl<E: Scalar> Drop for SpBatch<'_, E> {
    #[inline]
    fn drop(&mut self) {
        self.merge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with_existing() {
        let mut m = SpMat::try_new_from_triplets(
            4,
            3,
            &[(0, 0, 1.0), (3, 0, 2.0), (1, 2, 3.0), (2, 2, 4.0)],
        )
        .unwrap();

        let mut batch = m.batch();
        batch.insert(2, 0, 5.0);
        batch.insert(3, 0, 6.0);
        batch.insert(0, 1, 7.0);
        batch.insert(1, 2, 0.0);
        batch.insert(0, 1, 8.0);
        assert_eq!(batch.len(), 5);
        batch.finish();

        assert_eq!(m.col_ptrs(), &[0, 3, 4, 5]);
        assert_eq!(m.row_indices(), &[0, 2, 3, 0, 2]);
        assert_eq!(m.values(), &[1.0, 5.0, 6.0, 8.0, 4.0]);
    }

    #[test]
    fn test_empty_batch_keeps_matrix() {
        let mut m = SpMat::<i32>::identity(2, 2);
        let before = m.clone();
        assert!(m.batch().is_empty());
        assert_eq!(m, before);
    }
}
