use super::SpMat;
use crate::Scalar;
use core::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Read-write handle to a single element of a [`SpMat`].
///
/// Writing a nonzero value stores the element, inserting a slot if it was not stored yet.
/// Writing zero removes the element from the storage.
pub struct SpValProxy<'a, E: Scalar> {
    mat: &'a mut SpMat<E>,
    row: usize,
    col: usize,
}

impl<'a, E: Scalar> SpValProxy<'a, E> {
    #[inline]
    pub(super) fn new(mat: &'a mut SpMat<E>, row: usize, col: usize) -> Self {
        Self { mat, row, col }
    }

    /// Returns the current value of the element.
    #[inline]
    pub fn get(&self) -> E {
        self.mat.read(self.row, self.col)
    }

    /// Sets the value of the element.
    #[inline]
    pub fn set(&mut self, value: E) {
        if value == E::zero() {
            self.mat.delete_element(self.row, self.col);
        } else {
            self.mat.add_element(self.row, self.col, value);
        }
    }

    /// Replaces the value `x` of the element with `f(x)`.
    #[inline]
    pub fn update(&mut self, f: impl FnOnce(E) -> E) {
        let value = f(self.get());
        self.set(value)
    }
}

impl<E: Scalar> AddAssign<E> for SpValProxy<'_, E> {
    #[inline]
    fn add_assign(&mut self, rhs: E) {
        self.update(|x| x.plus(rhs))
    }
}
impl<E: Scalar> SubAssign<E> for SpValProxy<'_, E> {
    #[inline]
    fn sub_assign(&mut self, rhs: E) {
        self.update(|x| x.minus(rhs))
    }
}
impl<E: Scalar> MulAssign<E> for SpValProxy<'_, E> {
    #[inline]
    fn mul_assign(&mut self, rhs: E) {
        self.update(|x| x.times(rhs))
    }
}
impl<E: Scalar> DivAssign<E> for SpValProxy<'_, E> {
    #[inline]
    fn div_assign(&mut self, rhs: E) {
        self.update(|x| x.over(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_inserts_and_deletes() {
        let mut m = SpMat::<i64>::new(3, 3);
        m.at_mut(1, 2).set(4);
        let mut v = m.at_mut(1, 2);
        v += 3;
        assert_eq!(m.values(), &[7]);

        let mut x = m.at_mut(0, 0);
        x -= 2;
        x *= 5;
        assert_eq!(x.get(), -10);
        assert_eq!(m.col_ptrs(), &[0, 1, 1, 2]);

        m.at_mut(1, 2).set(0);
        assert_eq!(m.nnz(), 1);
        let mut y = m.at_mut(0, 0);
        y /= -10;
        y -= 1;
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.col_ptrs(), &[0, 0, 0, 0]);
    }
}
