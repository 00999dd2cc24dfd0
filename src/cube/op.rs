//! Unary cube nodes that need the whole operand before producing any element of the result.

use super::{Cube, CubeExpr, CubeProxy, CubeTarget, SubCubeMut};
use crate::{expr::MemRegion, Scalar};
use core::marker::PhantomData;

/// Whole-cube unary operation.
///
/// `aux` carries the integer parameter of the operation, such as the dimension of a sum.
pub trait OpCubeKind<E: Scalar>: crate::seal::Seal + 'static {
    /// Name of the operation.
    const NAME: &'static str;

    /// Checks that the operand is valid for the operation.
    #[inline]
    #[track_caller]
    fn check(dims: (usize, usize, usize), aux: usize) {
        let _ = (dims, aux);
    }

    /// Dimensions of the result.
    fn dims(dims: (usize, usize, usize), aux: usize) -> (usize, usize, usize);

    /// Writes the result into `dst`, which has the dimensions returned by [`OpCubeKind::dims`]
    /// and does not overlap `src`.
    fn apply<P: CubeProxy<Elem = E>>(dst: SubCubeMut<'_, E>, src: &P, aux: usize);
}

/// Operation tags for [`OpCube`].
pub mod kind {
    use super::*;

    /// Sum along a dimension.
    #[derive(Copy, Clone, Debug)]
    pub struct Sum;
    /// Mean along a dimension.
    #[derive(Copy, Clone, Debug)]
    pub struct Mean;

    #[inline]
    fn reduced_dims(dims: (usize, usize, usize), dim: usize) -> (usize, usize, usize) {
        let (nrows, ncols, nslices) = dims;
        match dim {
            0 => (1, ncols, nslices),
            1 => (nrows, 1, nslices),
            _ => (nrows, ncols, 1),
        }
    }

    // calls `finish(acc, len)` with the sum of each line along `dim`
    fn reduce<E: Scalar, P: CubeProxy<Elem = E>>(
        mut dst: SubCubeMut<'_, E>,
        src: &P,
        dim: usize,
        finish: impl Fn(E, usize) -> E,
    ) {
        let (nrows, ncols, nslices) = (src.nrows(), src.ncols(), src.nslices());
        let (out_rows, out_cols, out_slices) = reduced_dims((nrows, ncols, nslices), dim);
        let len = [nrows, ncols, nslices][dim];

        for k in 0..out_slices {
            for j in 0..out_cols {
                for i in 0..out_rows {
                    let mut acc = E::zero();
                    for l in 0..len {
                        let (row, col, slice) = match dim {
                            0 => (l, j, k),
                            1 => (i, l, k),
                            _ => (i, j, l),
                        };
                        // SAFETY: `l < len` along `dim`, the other coordinates are bounded by
                        // the operand dimensions.
                        acc = acc.plus(unsafe { src.at_unchecked(row, col, slice) });
                    }
                    dst.write(i, j, k, finish(acc, len));
                }
            }
        }
    }

    impl<E: Scalar> OpCubeKind<E> for Sum {
        const NAME: &'static str = "sum";

        #[track_caller]
        fn check(_: (usize, usize, usize), dim: usize) {
            equator::assert!(dim < 3);
        }

        #[inline]
        fn dims(dims: (usize, usize, usize), dim: usize) -> (usize, usize, usize) {
            reduced_dims(dims, dim)
        }

        fn apply<P: CubeProxy<Elem = E>>(dst: SubCubeMut<'_, E>, src: &P, dim: usize) {
            reduce(dst, src, dim, |acc, _| acc)
        }
    }

    impl<E: Scalar> OpCubeKind<E> for Mean {
        const NAME: &'static str = "mean";

        #[track_caller]
        fn check(_: (usize, usize, usize), dim: usize) {
            equator::assert!(dim < 3);
        }

        #[inline]
        fn dims(dims: (usize, usize, usize), dim: usize) -> (usize, usize, usize) {
            reduced_dims(dims, dim)
        }

        fn apply<P: CubeProxy<Elem = E>>(dst: SubCubeMut<'_, E>, src: &P, dim: usize) {
            reduce(dst, src, dim, |acc, len| acc.over(E::from_f64(len as f64)))
        }
    }
}

/// Whole-cube unary node. It is computed into a temporary when used as an operand, and directly
/// into the destination when assigned and the destination is not one of its operands.
pub struct OpCube<P, O> {
    inner: P,
    aux: usize,
    __marker: PhantomData<O>,
}

impl<P: CubeProxy, O: OpCubeKind<P::Elem>> OpCube<P, O> {
    /// Creates the node.
    ///
    /// # Panics
    /// Panics if the operand is invalid for the operation.
    #[inline]
    #[track_caller]
    pub fn new(inner: P, aux: usize) -> Self {
        O::check((inner.nrows(), inner.ncols(), inner.nslices()), aux);
        Self {
            inner,
            aux,
            __marker: PhantomData,
        }
    }

    /// Dimensions of the result.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        let inner = &self.inner;
        O::dims((inner.nrows(), inner.ncols(), inner.nslices()), self.aux)
    }

    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.inner.is_alias(region)
    }

    fn materialize(&self) -> Cube<P::Elem> {
        let (nrows, ncols, nslices) = self.dims();
        let mut out = Cube::zeros(nrows, ncols, nslices);
        O::apply(out.as_mut().into_subcube(), &self.inner, self.aux);
        out
    }
}

impl<P: CubeProxy, O: OpCubeKind<P::Elem>> CubeExpr for OpCube<P, O> {
    type Elem = P::Elem;
    type Proxy = Cube<P::Elem>;

    #[inline]
    fn into_proxy(self) -> Cube<P::Elem> {
        self.materialize()
    }

    #[track_caller]
    fn assign_to<D: CubeTarget<Elem = P::Elem>>(self, dst: &mut D) {
        if self.is_alias(dst.region()) {
            dst.take_result(self.materialize());
        } else {
            let (nrows, ncols, nslices) = self.dims();
            dst.prepare(nrows, ncols, nslices);
            O::apply(dst.target_mut(), &self.inner, self.aux);
        }
    }
}

/// Sum of the elements along dimension `dim`: down the columns (`0`), along the rows (`1`), or
/// across the slices (`2`). The summed dimension has length one in the result.
///
/// # Panics
/// Panics if `dim > 2`.
#[inline]
#[track_caller]
pub fn sum<X: CubeExpr>(x: X, dim: usize) -> OpCube<X::Proxy, kind::Sum> {
    OpCube::new(x.into_proxy(), dim)
}

/// Mean of the elements along dimension `dim`, see [`sum`]. Integer means are truncated.
///
/// # Panics
/// Panics if `dim > 2`.
#[inline]
#[track_caller]
pub fn mean<X: CubeExpr>(x: X, dim: usize) -> OpCube<X::Proxy, kind::Mean> {
    OpCube::new(x.into_proxy(), dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cube::{from_raw_parts, from_raw_parts_mut},
        mat,
    };

    fn sample() -> Cube<i64> {
        Cube::from_fn(2, 3, 2, |i, j, k| (i + 10 * j + 100 * k) as i64)
    }

    #[test]
    fn test_sum_along_each_dim() {
        let c = sample();

        let s = sum(&c, 0).eval();
        assert_eq!((s.nrows(), s.ncols(), s.nslices()), (1, 3, 2));
        assert_eq!(s.read(0, 2, 1), 120 + 121);

        let s = sum(&c, 1).eval();
        assert_eq!((s.nrows(), s.ncols(), s.nslices()), (2, 1, 2));
        assert_eq!(s.read(1, 0, 0), 1 + 11 + 21);

        let s = sum(&c, 2).eval();
        assert_eq!((s.nrows(), s.ncols(), s.nslices()), (2, 3, 1));
        assert_eq!(s.slice(0).to_owned(), mat![[100, 120, 140], [102, 122, 142i64]]);
    }

    #[test]
    fn test_mean_and_expression_operands() {
        let c = Cube::from_fn(2, 2, 4, |i, j, k| (i + j + k) as f64);
        let m = mean(&c * 2.0f64, 2).eval();
        assert_eq!(m.slice(0).to_owned(), mat![[3.0, 5.0], [5.0, 7.0]]);

        // used as an operand, the node is evaluated once into a temporary
        let shifted = (sum(c.subcube(0, 0, 1, 2, 2, 3), 2) - 6.0f64).eval();
        assert_eq!(shifted.slice(0).to_owned(), mat![[0.0, 3.0], [3.0, 6.0]]);

        let i = Cube::from_fn(1, 1, 3, |_, _, k| k as u32);
        assert_eq!(mean(&i, 2).eval().read(0, 0, 0), 1);
    }

    #[test]
    fn test_assignment_over_the_operand() {
        let mut c = sample();
        let expected = sum(&c, 1).eval();
        let src = c.clone();
        c.assign(sum(src, 1));
        assert_eq!(c, expected);

        // the first column of every slice is replaced by the column sums of the whole cube
        let mut data: Vec<i64> = sample().as_slice().to_vec();
        let ptr = data.as_mut_ptr();
        let src = unsafe { from_raw_parts(ptr as *const i64, 2, 3, 2) };
        let dst = unsafe { from_raw_parts_mut(ptr, 2, 3, 2) };
        dst.into_subcube()
            .into_subcube(0, 0, 0, 2, 1, 2)
            .assign(sum(src, 1));
        let out = Cube::from_column_major_slice(&data, 2, 3, 2);
        assert_eq!(out.read(0, 0, 0), 30);
        assert_eq!(out.read(1, 0, 1), 1 + 11 + 21 + 300);
        assert_eq!(out.read(1, 2, 1), 121);
    }

    #[test]
    #[should_panic]
    fn test_sum_rejects_fourth_dim() {
        let _ = sum(&Cube::<f32>::zeros(1, 1, 1), 3);
    }
}
