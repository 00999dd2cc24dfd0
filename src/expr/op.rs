//! Unary nodes that need the whole operand before producing any element of the result.

use super::*;
use crate::{error::LinalgError, linalg::lu, scalar::Field};
use core::marker::PhantomData;

/// Whole-matrix unary operation.
///
/// `aux_a` and `aux_b` carry the integer parameters of the operation, such as the dimension of
/// a sum or the repetition counts of `repmat`.
pub trait OpKind<E: Scalar>: crate::seal::Seal + 'static {
    /// Name of the operation.
    const NAME: &'static str;

    /// Checks that the operand is valid for the operation.
    #[inline]
    #[track_caller]
    fn check(nrows: usize, ncols: usize, aux_a: usize, aux_b: usize) {
        let _ = (nrows, ncols, aux_a, aux_b);
    }

    /// Computes the result.
    fn apply<P: Proxy<Elem = E>>(src: &P, aux_a: usize, aux_b: usize) -> Mat<E>;
}

/// Operation tags for [`Op`].
pub mod kind {
    use super::*;

    /// Materialized transpose.
    #[derive(Copy, Clone, Debug)]
    pub struct Transpose;
    /// Matrix inverse.
    #[derive(Copy, Clone, Debug)]
    pub struct Inv;
    /// Sum along a dimension.
    #[derive(Copy, Clone, Debug)]
    pub struct Sum;
    /// Tiling of the operand.
    #[derive(Copy, Clone, Debug)]
    pub struct Repmat;

    impl<E: Scalar> OpKind<E> for Transpose {
        const NAME: &'static str = "transpose";

        fn apply<P: Proxy<Elem = E>>(src: &P, _: usize, _: usize) -> Mat<E> {
            if let Some(view) = src.as_strided() {
                return view.transpose().to_owned();
            }
            // SAFETY: `i < ncols` and `j < nrows` of the operand.
            Mat::from_fn(src.ncols(), src.nrows(), |i, j| unsafe {
                src.at_unchecked(j, i)
            })
        }
    }

    impl<E: Field> OpKind<E> for Inv {
        const NAME: &'static str = "inverse";

        #[track_caller]
        fn check(nrows: usize, ncols: usize, _: usize, _: usize) {
            if nrows != ncols {
                panic!("inverse: {}", LinalgError::NotSquare { nrows, ncols });
            }
        }

        #[track_caller]
        fn apply<P: Proxy<Elem = E>>(src: &P, _: usize, _: usize) -> Mat<E> {
            let inverse = match src.as_strided() {
                Some(view) => lu::inverse(view),
                None => lu::inverse(eval::materialize(src).as_ref().as_submat()),
            };
            match inverse {
                Ok(inverse) => inverse,
                Err(err) => panic!("inverse: {err}"),
            }
        }
    }

    impl<E: Scalar> OpKind<E> for Sum {
        const NAME: &'static str = "sum";

        #[track_caller]
        fn check(_: usize, _: usize, dim: usize, _: usize) {
            equator::assert!(dim < 2);
        }

        fn apply<P: Proxy<Elem = E>>(src: &P, dim: usize, _: usize) -> Mat<E> {
            let (nrows, ncols) = (src.nrows(), src.ncols());
            if dim == 0 {
                Mat::from_fn(1, ncols, |_, j| {
                    let mut acc = E::zero();
                    for i in 0..nrows {
                        // SAFETY: in bounds.
                        acc = acc.plus(unsafe { src.at_unchecked(i, j) });
                    }
                    acc
                })
            } else {
                let mut out = Mat::<E>::zeros(nrows, 1);
                for j in 0..ncols {
                    for i in 0..nrows {
                        // SAFETY: in bounds.
                        let v = unsafe { src.at_unchecked(i, j) };
                        out[i] = out[i].plus(v);
                    }
                }
                out
            }
        }
    }

    impl<E: Scalar> OpKind<E> for Repmat {
        const NAME: &'static str = "repmat";

        fn apply<P: Proxy<Elem = E>>(src: &P, row_copies: usize, col_copies: usize) -> Mat<E> {
            let (nrows, ncols) = (src.nrows(), src.ncols());
            // SAFETY: the modulo keeps the indices in bounds.
            Mat::from_fn(nrows * row_copies, ncols * col_copies, |i, j| unsafe {
                src.at_unchecked(i % nrows, j % ncols)
            })
        }
    }
}

/// Whole-matrix unary node. It is computed into a temporary when used as an operand, and
/// directly into the destination when assigned.
pub struct Op<P, O> {
    inner: P,
    aux_a: usize,
    aux_b: usize,
    __marker: PhantomData<O>,
}

impl<P: Proxy, O: OpKind<P::Elem>> Op<P, O> {
    /// Creates the node.
    ///
    /// # Panics
    /// Panics if the operand is invalid for the operation.
    #[inline]
    #[track_caller]
    pub fn new(inner: P, aux_a: usize, aux_b: usize) -> Self {
        O::check(inner.nrows(), inner.ncols(), aux_a, aux_b);
        Self {
            inner,
            aux_a,
            aux_b,
            __marker: PhantomData,
        }
    }

    #[track_caller]
    fn compute(&self) -> Mat<P::Elem> {
        O::apply(&self.inner, self.aux_a, self.aux_b)
    }
}

impl<P: Proxy, O: OpKind<P::Elem>> Expr for Op<P, O> {
    type Elem = P::Elem;
    type Proxy = MatProxy<P::Elem>;

    #[inline]
    #[track_caller]
    fn into_proxy(self) -> MatProxy<P::Elem> {
        MatProxy::new(self.compute())
    }

    #[inline]
    #[track_caller]
    fn assign_to<D: Target<Elem = P::Elem>>(self, dst: &mut D) {
        dst.take_result(self.compute())
    }
}

/// Materialized transpose.
#[inline]
pub fn trans<X: Expr>(x: X) -> Op<X::Proxy, kind::Transpose> {
    Op::new(x.into_proxy(), 0, 0)
}

/// Matrix inverse.
///
/// # Panics
/// Panics if the matrix is not square, or if it is singular. See
/// [`try_inv`](crate::linalg::lu::try_inv) for the quiet variant.
#[inline]
#[track_caller]
pub fn inv<X: Expr>(x: X) -> Op<X::Proxy, kind::Inv>
where
    X::Elem: Field,
{
    Op::new(x.into_proxy(), 0, 0)
}

/// Sum of the elements of each column (`dim == 0`, giving a `1×ncols` result) or of each row
/// (`dim == 1`, giving an `nrows×1` result).
///
/// # Panics
/// Panics if `dim > 1`.
#[inline]
#[track_caller]
pub fn sum<X: Expr>(x: X, dim: usize) -> Op<X::Proxy, kind::Sum> {
    Op::new(x.into_proxy(), dim, 0)
}

/// Tiles the operand `row_copies` times vertically and `col_copies` times horizontally.
#[inline]
pub fn repmat<X: Expr>(x: X, row_copies: usize, col_copies: usize) -> Op<X::Proxy, kind::Repmat> {
    Op::new(x.into_proxy(), row_copies, col_copies)
}
