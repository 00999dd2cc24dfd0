//! Operator overloads for sparse matrices.
//!
//! `+`, `-` and `%` between sparse expressions, unary `-`, and `*`/`/` by a scalar build lazy
//! sparse nodes. `*` between two sparse expressions, or between a sparse expression and a dense
//! matrix, computes the product immediately.

use super::{
    matmul::{dense_sparse_matmul, sparse_dense_matmul, sparse_sparse_matmul},
    SpEGlueKind, SpEOp, SpEOpKind, SpExpr, SpGlue, SpMat, SpProxy,
};
use crate::{
    col::Col,
    error::DimensionMismatch,
    expr::{eglue, eop},
    get_global_parallelism,
    mat::{Mat, MatRef, SubMatRef},
    row::Row,
    scalar::{c32, c64, Promote},
    Scalar,
};
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

const PRODUCT: &str = "matrix multiplication";

#[track_caller]
fn sparse_times_sparse<E: Scalar>(lhs: &SpMat<E>, rhs: &SpMat<E>) -> SpMat<E> {
    if lhs.ncols() != rhs.nrows() {
        DimensionMismatch::mat(PRODUCT, lhs.dims(), rhs.dims()).panic();
    }
    sparse_sparse_matmul(lhs, rhs)
}

#[track_caller]
fn sparse_times_dense<E: Scalar>(lhs: &SpMat<E>, rhs: SubMatRef<'_, E>) -> Mat<E> {
    if lhs.ncols() != rhs.nrows() {
        DimensionMismatch::mat(PRODUCT, lhs.dims(), (rhs.nrows(), rhs.ncols())).panic();
    }
    let mut out = Mat::zeros(lhs.nrows(), rhs.ncols());
    sparse_dense_matmul(
        out.as_mut().into_submat(),
        lhs,
        rhs,
        None,
        E::one(),
        get_global_parallelism(),
    );
    out
}

#[track_caller]
fn dense_times_sparse<E: Scalar>(lhs: SubMatRef<'_, E>, rhs: &SpMat<E>) -> Mat<E> {
    if lhs.ncols() != rhs.nrows() {
        DimensionMismatch::mat(PRODUCT, (lhs.nrows(), lhs.ncols()), rhs.dims()).panic();
    }
    let mut out = Mat::zeros(lhs.nrows(), rhs.ncols());
    dense_sparse_matmul(
        out.as_mut().into_submat(),
        lhs,
        rhs,
        None,
        E::one(),
        get_global_parallelism(),
    );
    out
}

macro_rules! impl_sp_glue_op {
    ([$($gen: tt)*] $ty: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*, __R: SpExpr> $trait<__R> for $ty
        where
            $ty: SpExpr,
            <$ty as SpExpr>::Elem: Promote<__R::Elem>,
        {
            type Output = SpGlue<<$ty as SpExpr>::Proxy, __R::Proxy, eglue::kind::$kind>;

            #[inline]
            #[track_caller]
            fn $method(self, rhs: __R) -> Self::Output {
                SpGlue::new(self.into_proxy(), rhs.into_proxy())
            }
        }
    };
}

macro_rules! impl_sp_scalar_ops {
    ([$($gen: tt)*] $ty: ty, $scalar: ty) => {
        impl<$($gen)*> Mul<$scalar> for $ty
        where
            $ty: SpExpr<Elem = $scalar>,
        {
            type Output = SpEOp<<$ty as SpExpr>::Proxy, eop::kind::ScalarTimes>;
            #[inline]
            fn mul(self, k: $scalar) -> Self::Output {
                SpEOp::with_aux(self.into_proxy(), k)
            }
        }
        impl<$($gen)*> Mul<$ty> for $scalar
        where
            $ty: SpExpr<Elem = $scalar>,
        {
            type Output = SpEOp<<$ty as SpExpr>::Proxy, eop::kind::ScalarTimes>;
            #[inline]
            fn mul(self, rhs: $ty) -> Self::Output {
                SpEOp::with_aux(rhs.into_proxy(), self)
            }
        }
        impl<$($gen)*> Div<$scalar> for $ty
        where
            $ty: SpExpr<Elem = $scalar>,
        {
            type Output = SpEOp<<$ty as SpExpr>::Proxy, eop::kind::ScalarDivPost>;
            #[inline]
            fn div(self, k: $scalar) -> Self::Output {
                SpEOp::with_aux(self.into_proxy(), k)
            }
        }
    };
}

macro_rules! impl_sp_dense_product {
    ([$($gen: tt)*] $ty: ty, [$($dgen: tt)*] $dense: ty, $rhs: ident => $as_submat: expr) => {
        impl<$($dgen)*, $($gen)*, E: Scalar> Mul<$dense> for $ty
        where
            $ty: SpExpr<Elem = E>,
        {
            type Output = Mat<E>;

            #[inline]
            #[track_caller]
            fn mul(self, $rhs: $dense) -> Mat<E> {
                let dense: SubMatRef<'_, E> = $as_submat;
                self.__with_evaluated(|lhs| sparse_times_dense(lhs, dense))
            }
        }
    };
}

macro_rules! impl_sp_expr_ops {
    ($([$($gen: tt)*] $ty: ty;)*) => {$(
        impl_sp_glue_op!([$($gen)*] $ty, Add, add, Plus);
        impl_sp_glue_op!([$($gen)*] $ty, Sub, sub, Minus);
        impl_sp_glue_op!([$($gen)*] $ty, Rem, rem, Schur);

        impl<$($gen)*> Neg for $ty
        where
            $ty: SpExpr,
        {
            type Output = SpEOp<<$ty as SpExpr>::Proxy, eop::kind::Neg>;

            #[inline]
            fn neg(self) -> Self::Output {
                SpEOp::new(self.into_proxy())
            }
        }

        impl<$($gen)*, __R: SpExpr> Mul<__R> for $ty
        where
            $ty: SpExpr<Elem = __R::Elem>,
        {
            type Output = SpMat<__R::Elem>;

            #[inline]
            #[track_caller]
            fn mul(self, rhs: __R) -> Self::Output {
                self.__with_evaluated(|lhs| {
                    rhs.__with_evaluated(|rhs| sparse_times_sparse(lhs, rhs))
                })
            }
        }

        impl_sp_dense_product!([$($gen)*] $ty, ['__b] &'__b Mat<E>, rhs => Mat::as_ref(rhs).as_submat());
        impl_sp_dense_product!([$($gen)*] $ty, ['__b] MatRef<'__b, E>, rhs => rhs.as_submat());
        impl_sp_dense_product!([$($gen)*] $ty, ['__b] SubMatRef<'__b, E>, rhs => rhs);
        impl_sp_dense_product!([$($gen)*] $ty, ['__b] &'__b Col<E>, rhs => Col::as_ref(rhs).as_submat());

        impl_sp_scalar_ops!([$($gen)*] $ty, f32);
        impl_sp_scalar_ops!([$($gen)*] $ty, f64);
        impl_sp_scalar_ops!([$($gen)*] $ty, i32);
        impl_sp_scalar_ops!([$($gen)*] $ty, i64);
        impl_sp_scalar_ops!([$($gen)*] $ty, u32);
        impl_sp_scalar_ops!([$($gen)*] $ty, u64);
        impl_sp_scalar_ops!([$($gen)*] $ty, c32);
        impl_sp_scalar_ops!([$($gen)*] $ty, c64);
    )*};
}

impl_sp_expr_ops! {
    ['a, F: Scalar] &'a SpMat<F>;
    [F: Scalar] SpMat<F>;
    [P: SpProxy, O: SpEOpKind] SpEOp<P, O>;
    [P1: SpProxy, P2: SpProxy, G: SpEGlueKind] SpGlue<P1, P2, G>;
}

macro_rules! impl_dense_sp_product {
    ($([$($gen: tt)*] $dense: ty, $lhs: ident => $as_submat: expr;)*) => {$(
        impl<'__s, $($gen)*, E: Scalar> Mul<&'__s SpMat<E>> for $dense {
            type Output = Mat<E>;

            #[inline]
            #[track_caller]
            fn mul(self, rhs: &'__s SpMat<E>) -> Mat<E> {
                let $lhs = self;
                dense_times_sparse($as_submat, rhs)
            }
        }
    )*};
}

impl_dense_sp_product! {
    ['a] &'a Mat<E>, lhs => Mat::as_ref(lhs).as_submat();
    ['a] MatRef<'a, E>, lhs => lhs.as_submat();
    ['a] SubMatRef<'a, E>, lhs => lhs;
    ['a] &'a Row<E>, lhs => Row::as_ref(lhs).as_submat();
}

macro_rules! impl_sp_inplace_op {
    ($trait: ident, $method: ident, $kind: ident) => {
        impl<E: Promote<E, Output = E>, R: SpExpr<Elem = E>> $trait<R> for SpMat<E> {
            #[inline]
            #[track_caller]
            fn $method(&mut self, rhs: R) {
                let out = SpGlue::<_, _, eglue::kind::$kind>::new(&*self, rhs.into_proxy()).eval();
                *self = out;
            }
        }
    };
}

impl_sp_inplace_op!(AddAssign, add_assign, Plus);
impl_sp_inplace_op!(SubAssign, sub_assign, Minus);
impl_sp_inplace_op!(RemAssign, rem_assign, Schur);

impl<E: Scalar, R: SpExpr<Elem = E>> MulAssign<R> for SpMat<E> {
    #[inline]
    #[track_caller]
    fn mul_assign(&mut self, rhs: R) {
        let out = rhs.__with_evaluated(|rhs| sparse_times_sparse(self, rhs));
        *self = out;
    }
}

/// Applies `x := O::process(x, k)` to every element, in place when zeros stay zero.
fn scale_in_place<E: Scalar, O: SpEOpKind>(m: &mut SpMat<E>, k: E) {
    if O::process(E::zero(), k) != E::zero() {
        let out = SpEOp::<_, O>::with_aux(&*m, k).eval();
        *m = out;
        return;
    }
    for x in m.values_mut() {
        *x = O::process(*x, k);
    }
    m.prune_zeros();
}

macro_rules! impl_sp_scalar_inplace_ops {
    ($($scalar: ty),*) => {$(
        impl MulAssign<$scalar> for SpMat<$scalar> {
            #[inline]
            fn mul_assign(&mut self, k: $scalar) {
                scale_in_place::<_, eop::kind::ScalarTimes>(self, k);
            }
        }
        impl DivAssign<$scalar> for SpMat<$scalar> {
            #[inline]
            fn div_assign(&mut self, k: $scalar) {
                scale_in_place::<_, eop::kind::ScalarDivPost>(self, k);
            }
        }
    )*};
}

impl_sp_scalar_inplace_ops!(f32, f64, i32, i64, u32, u64, c32, c64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{col, mat, row, Expr};

    fn a() -> SpMat<f64> {
        SpMat::from_dense(&mat![[1.0, 0.0, 2.0], [0.0, 0.0, 3.0], [4.0, 0.0, 0.0]])
    }
    fn b() -> SpMat<f64> {
        SpMat::from_dense(&mat![[0.0, 1.0, -2.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
    }

    #[test]
    fn test_elementwise_expressions() {
        let (a, b) = (a(), b());
        let r = (&a + &b * 2.0 - -&a).eval();
        assert_eq!(
            r.to_dense(),
            mat![[2.0, 2.0, 0.0], [0.0, 0.0, 6.0], [10.0, 0.0, 0.0]]
        );
        assert_eq!(r.nnz(), 4);

        let s = (&a % &b).eval();
        assert_eq!(s.to_dense(), mat![[0.0, 0.0, -4.0], [0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);

        let t = (0.5 * &a / 2.0).eval();
        assert_eq!(t.read(2, 0), 1.0);
    }

    #[test]
    fn test_products() {
        let (a, b) = (a(), b());
        let dense_a = a.to_dense();
        let dense_b = b.to_dense();

        let ab = &a * &b;
        assert_eq!(ab.to_dense(), (&dense_a * &dense_b).eval());
        assert_eq!((&a * (&b + &a)).to_dense(), (&dense_a * (&dense_b + &dense_a)).eval());

        assert_eq!(&a * &dense_b, (&dense_a * &dense_b).eval());
        assert_eq!(&dense_a * &b, (&dense_a * &dense_b).eval());

        let x = col![1.0, 2.0, 3.0];
        let y = &a * &x;
        assert_eq!(y, mat![[7.0], [9.0], [4.0]]);
        let z = &row![1.0, 1.0, 1.0] * &a;
        assert_eq!(z, mat![[5.0, 0.0, 5.0]]);
    }

    #[test]
    fn test_compound_assignment() {
        let mut m = a();
        m += &b();
        assert_eq!(m.read(0, 2), 0.0);
        assert_eq!(m.nnz(), 4);

        m -= b();
        assert_eq!(m, a());

        m *= 2.0;
        m /= 4.0;
        assert_eq!(m.values(), &[0.5, 2.0, 1.0, 1.5]);

        m *= 0.0;
        assert_eq!(m.nnz(), 0);

        let mut p = a();
        p *= SpMat::identity(3, 3);
        assert_eq!(p, a());
        p %= &b();
        assert_eq!(p.nnz(), 2);
    }

    #[test]
    fn test_scaling_by_non_finite_values() {
        let dense = mat![[2.0, 0.0], [0.0, 0.0f64]];
        let mut m = SpMat::from_dense(&dense);
        m /= 0.0;
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.read(0, 0), f64::INFINITY);
        assert!(m.read(1, 0).is_nan());
        assert!((&a() * f64::NAN).eval().values().iter().all(|x| x.is_nan()));
        assert_eq!((&a() * f64::NAN).eval().nnz(), 9);

        let mut m = SpMat::from_dense(&dense);
        m *= f64::INFINITY;
        assert_eq!(m.read(0, 0), f64::INFINITY);
        assert!(m.read(1, 1).is_nan());
    }

    #[test]
    #[should_panic(expected = "matrix multiplication: incompatible matrix dimensions: 3x3 and 2x3")]
    fn test_product_mismatch() {
        let _ = &a() * &SpMat::<f64>::new(2, 3);
    }

    #[test]
    #[should_panic(expected = "subtraction: incompatible matrix dimensions: 3x3 and 3x2")]
    fn test_elementwise_mismatch() {
        let _ = a() - SpMat::<f64>::new(3, 2);
    }
}
