//! Operator overloads building expression nodes.
//!
//! | operator | node |
//! |---|---|
//! | `a + b`, `a - b`, `a % b`, `a / b` | [`EGlue`] (elementwise, `%` is the elementwise product) |
//! | `a * b` | [`Glue`] (matrix product) |
//! | `-a` | [`EOp`] |
//! | `a + k`, `k - a`, `a * k`, `k / a`, ... | [`EOp`] with the scalar as auxiliary value |
//!
//! Compound assignment operators evaluate the right hand side directly into the destination.

use super::*;
use crate::{
    col::Col,
    mat::{MatMut, MatRef},
    row::Row,
    scalar::{c32, c64, Promote},
};
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};
use inplace::{InplaceDiv, InplaceMinus, InplacePlus, InplaceSchur};

macro_rules! impl_eglue_op {
    ([$($gen: tt)*] $ty: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*, __R: Expr> $trait<__R> for $ty
        where
            $ty: Expr,
            <$ty as Expr>::Elem: Promote<__R::Elem>,
        {
            type Output = EGlue<<$ty as Expr>::Proxy, __R::Proxy, eglue::kind::$kind>;

            #[inline]
            #[track_caller]
            fn $method(self, rhs: __R) -> Self::Output {
                EGlue::new(self.into_proxy(), rhs.into_proxy())
            }
        }
    };
}

macro_rules! impl_scalar_ops {
    ([$($gen: tt)*] $ty: ty, $scalar: ty) => {
        impl<$($gen)*> Add<$scalar> for $ty
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarPlus>;
            #[inline]
            fn add(self, k: $scalar) -> Self::Output {
                EOp::with_aux(self.into_proxy(), k)
            }
        }
        impl<$($gen)*> Sub<$scalar> for $ty
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarMinusPost>;
            #[inline]
            fn sub(self, k: $scalar) -> Self::Output {
                EOp::with_aux(self.into_proxy(), k)
            }
        }
        impl<$($gen)*> Mul<$scalar> for $ty
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarTimes>;
            #[inline]
            fn mul(self, k: $scalar) -> Self::Output {
                EOp::with_aux(self.into_proxy(), k)
            }
        }
        impl<$($gen)*> Div<$scalar> for $ty
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarDivPost>;
            #[inline]
            fn div(self, k: $scalar) -> Self::Output {
                EOp::with_aux(self.into_proxy(), k)
            }
        }

        impl<$($gen)*> Add<$ty> for $scalar
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarPlus>;
            #[inline]
            fn add(self, rhs: $ty) -> Self::Output {
                EOp::with_aux(rhs.into_proxy(), self)
            }
        }
        impl<$($gen)*> Sub<$ty> for $scalar
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarMinusPre>;
            #[inline]
            fn sub(self, rhs: $ty) -> Self::Output {
                EOp::with_aux(rhs.into_proxy(), self)
            }
        }
        impl<$($gen)*> Mul<$ty> for $scalar
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarTimes>;
            #[inline]
            fn mul(self, rhs: $ty) -> Self::Output {
                EOp::with_aux(rhs.into_proxy(), self)
            }
        }
        impl<$($gen)*> Div<$ty> for $scalar
        where
            $ty: Expr<Elem = $scalar>,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::ScalarDivPre>;
            #[inline]
            fn div(self, rhs: $ty) -> Self::Output {
                EOp::with_aux(rhs.into_proxy(), self)
            }
        }
    };
}

macro_rules! impl_expr_ops {
    ($([$($gen: tt)*] $ty: ty;)*) => {$(
        impl_eglue_op!([$($gen)*] $ty, Add, add, Plus);
        impl_eglue_op!([$($gen)*] $ty, Sub, sub, Minus);
        impl_eglue_op!([$($gen)*] $ty, Rem, rem, Schur);
        impl_eglue_op!([$($gen)*] $ty, Div, div, Div);

        impl<$($gen)*, __R: Expr> Mul<__R> for $ty
        where
            $ty: Expr,
            <$ty as Expr>::Elem: Promote<__R::Elem>,
        {
            type Output = Glue<<$ty as Expr>::Proxy, __R::Proxy, glue::kind::Times>;

            #[inline]
            #[track_caller]
            fn mul(self, rhs: __R) -> Self::Output {
                Glue::new(self.into_proxy(), rhs.into_proxy())
            }
        }

        impl<$($gen)*> Neg for $ty
        where
            $ty: Expr,
        {
            type Output = EOp<<$ty as Expr>::Proxy, eop::kind::Neg>;

            #[inline]
            fn neg(self) -> Self::Output {
                EOp::new(self.into_proxy())
            }
        }

        impl_scalar_ops!([$($gen)*] $ty, f32);
        impl_scalar_ops!([$($gen)*] $ty, f64);
        impl_scalar_ops!([$($gen)*] $ty, i32);
        impl_scalar_ops!([$($gen)*] $ty, i64);
        impl_scalar_ops!([$($gen)*] $ty, u32);
        impl_scalar_ops!([$($gen)*] $ty, u64);
        impl_scalar_ops!([$($gen)*] $ty, c32);
        impl_scalar_ops!([$($gen)*] $ty, c64);
    )*};
}

impl_expr_ops! {
    ['a, E: Scalar] MatRef<'a, E>;
    ['a, E: Scalar] SubMatRef<'a, E>;
    ['a, E: Scalar] &'a Mat<E>;
    [E: Scalar] Mat<E>;
    ['a, 'b, E: Scalar] &'a MatMut<'b, E>;
    ['a, 'b, E: Scalar] &'a SubMatMut<'b, E>;
    ['a, E: Scalar] &'a Col<E>;
    [E: Scalar] Col<E>;
    ['a, E: Scalar] &'a Row<E>;
    [E: Scalar] Row<E>;
    [E: Scalar] MatProxy<E>;
    [P: Proxy] Trans<P>;
    [P: Proxy, O: EOpKind] EOp<P, O>;
    [P1: Proxy, P2: Proxy, G: EGlueKind] EGlue<P1, P2, G>;
    [P: Proxy, O: OpKind<P::Elem>] Op<P, O>;
    [P1: Proxy, P2: Proxy, G: GlueKind<P1::Elem, P2::Elem>] Glue<P1, P2, G>;
}

macro_rules! impl_inplace_op {
    ([$($gen: tt)*] $ty: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*, __R: Expr<Elem = E>> $trait<__R> for $ty {
            #[inline]
            #[track_caller]
            fn $method(&mut self, rhs: __R) {
                rhs.apply_inplace::<$kind, _>(self)
            }
        }
    };
}

macro_rules! impl_scalar_inplace_ops {
    ([$($gen: tt)*] $ty: ty, $scalar: ty) => {
        impl<$($gen)*> AddAssign<$scalar> for $ty
        where
            $ty: Target<Elem = $scalar>,
        {
            #[inline]
            fn add_assign(&mut self, k: $scalar) {
                eval::apply_scalar::<eop::kind::ScalarPlus, _>(self.target_mut(), k)
            }
        }
        impl<$($gen)*> SubAssign<$scalar> for $ty
        where
            $ty: Target<Elem = $scalar>,
        {
            #[inline]
            fn sub_assign(&mut self, k: $scalar) {
                eval::apply_scalar::<eop::kind::ScalarMinusPost, _>(self.target_mut(), k)
            }
        }
        impl<$($gen)*> MulAssign<$scalar> for $ty
        where
            $ty: Target<Elem = $scalar>,
        {
            #[inline]
            fn mul_assign(&mut self, k: $scalar) {
                eval::apply_scalar::<eop::kind::ScalarTimes, _>(self.target_mut(), k)
            }
        }
        impl<$($gen)*> DivAssign<$scalar> for $ty
        where
            $ty: Target<Elem = $scalar>,
        {
            #[inline]
            fn div_assign(&mut self, k: $scalar) {
                eval::apply_scalar::<eop::kind::ScalarDivPost, _>(self.target_mut(), k)
            }
        }
    };
}

macro_rules! impl_inplace_ops {
    ($([$($gen: tt)*] $ty: ty;)*) => {$(
        impl_inplace_op!([$($gen)*] $ty, AddAssign, add_assign, InplacePlus);
        impl_inplace_op!([$($gen)*] $ty, SubAssign, sub_assign, InplaceMinus);
        impl_inplace_op!([$($gen)*] $ty, RemAssign, rem_assign, InplaceSchur);
        impl_inplace_op!([$($gen)*] $ty, DivAssign, div_assign, InplaceDiv);

        impl<$($gen)*, __R: Expr<Elem = E>> MulAssign<__R> for $ty
        where
            E: Promote<E, Output = E>,
        {
            #[inline]
            #[track_caller]
            fn mul_assign(&mut self, rhs: __R) {
                let product = Glue::<_, _, glue::kind::Times>::new(self.view(), rhs.into_proxy())
                    .into_proxy()
                    .into_inner();
                self.take_result(product);
            }
        }

        impl_scalar_inplace_ops!([$($gen)*] $ty, f32);
        impl_scalar_inplace_ops!([$($gen)*] $ty, f64);
        impl_scalar_inplace_ops!([$($gen)*] $ty, i32);
        impl_scalar_inplace_ops!([$($gen)*] $ty, i64);
        impl_scalar_inplace_ops!([$($gen)*] $ty, u32);
        impl_scalar_inplace_ops!([$($gen)*] $ty, u64);
        impl_scalar_inplace_ops!([$($gen)*] $ty, c32);
        impl_scalar_inplace_ops!([$($gen)*] $ty, c64);
    )*};
}

impl_inplace_ops! {
    [E: Scalar] Mat<E>;
    ['a, E: Scalar] MatMut<'a, E>;
    ['a, E: Scalar] SubMatMut<'a, E>;
    [E: Scalar] Col<E>;
    [E: Scalar] Row<E>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat};

    #[test]
    fn test_compound_assignment() {
        let mut a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let b = mat![[1.0, 1.0], [2.0, 2.0f64]];
        a += &b;
        assert_eq!(a, mat![[2.0, 3.0], [5.0, 6.0]]);
        a -= &b * 2.0;
        assert_eq!(a, mat![[0.0, 1.0], [1.0, 2.0]]);
        a %= &b;
        assert_eq!(a, mat![[0.0, 1.0], [2.0, 4.0]]);
        a /= &b;
        assert_eq!(a, mat![[0.0, 1.0], [1.0, 2.0]]);
    }

    #[test]
    fn test_scalar_compound_assignment() {
        let mut a = mat![[1, 2], [3, 4i64]];
        a += 1;
        a *= 3;
        a -= 2;
        a /= 2;
        assert_eq!(a, mat![[2, 3], [5, 6]]);

        let mut z = mat![[c64::new(1.0, 1.0)]];
        z *= c64::new(0.0, 1.0);
        assert_eq!(z, mat![[c64::new(-1.0, 1.0)]]);
    }

    #[test]
    fn test_compound_assignment_into_views() {
        let mut a = Mat::<f64>::zeros(3, 3);
        let b = mat![[1.0, 2.0], [3.0, 4.0f64]];
        {
            let mut sub = a.submatrix_mut(1, 1, 2, 2);
            sub += &b;
            sub *= 10.0;
        }
        let mut col = a.col_mut(0);
        col += 1.0;
        assert_eq!(
            a,
            mat![[1.0, 0.0, 0.0], [1.0, 10.0, 20.0], [1.0, 30.0, 40.0]]
        );
    }

    #[test]
    #[should_panic(expected = "addition: incompatible matrix dimensions: 2x2 and 3x3")]
    fn test_compound_assignment_checks_dims() {
        let mut a = Mat::<f64>::zeros(2, 2);
        a += &Mat::<f64>::zeros(3, 3);
    }

    #[test]
    fn test_matrix_compound_product() {
        let mut a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let b = mat![[0.0, 1.0], [1.0, 0.0f64]];
        a *= &b;
        assert_eq!(a, mat![[2.0, 1.0], [4.0, 3.0]]);

        let mut v = Mat::<f64>::ones(2, 1);
        let m = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0f64]];
        v *= Mat::<f64>::ones(1, 3);
        assert_eq!(v, Mat::ones(2, 3));
        v %= &m;
        assert_eq!(v, m);
    }

    #[test]
    fn test_alias_in_compound_assignment() {
        let mut data = [1.0f64, 2.0, 3.0, 4.0];
        let ptr = data.as_mut_ptr();
        let src = unsafe { crate::mat::from_raw_parts(ptr as *const f64, 2, 2) };
        let mut dst = unsafe { crate::mat::from_raw_parts_mut(ptr, 2, 2) };
        // dst += dst.t(), reading the transpose of the memory being written
        dst += src.t();
        assert_eq!(data, [2.0, 5.0, 5.0, 8.0]);
    }

    #[test]
    fn test_expression_chains() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let b = mat![[4.0, 3.0], [2.0, 1.0f64]];
        let c = ((&a + &b) * 0.5 - -&a % &b + 2.0 / (&b + 1.0)).eval();
        let expected = Mat::from_fn(2, 2, |i, j| {
            let (x, y) = (a.read(i, j), b.read(i, j));
            (x + y) * 0.5 + x * y + 2.0 / (y + 1.0)
        });
        assert_eq!(c, expected);
    }
}
