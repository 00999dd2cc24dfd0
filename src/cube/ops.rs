//! Operator overloads for cube expressions.
//!
//! Cubes support the elementwise operators of matrices (`+`, `-`, `%`, `/`, unary `-`, and
//! scalar operands on either side). `*` is only defined with a scalar.

use super::{
    eval, Cube, CubeExpr, CubeMut, CubeProxy, CubeRef, CubeTarget, EGlueCube, EOpCube, GlueCube,
    GlueCubeKind, OpCube, OpCubeKind, SubCubeMut, SubCubeRef,
};
use crate::{
    expr::{
        eglue,
        eop::{self, EOpKind},
        inplace::{InplaceDiv, InplaceMinus, InplacePlus, InplaceSchur},
        EGlueKind,
    },
    scalar::{c32, c64, Promote},
    Scalar,
};
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

macro_rules! impl_eglue_op {
    ([$($gen: tt)*] $ty: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*, __R: CubeExpr> $trait<__R> for $ty
        where
            $ty: CubeExpr,
            <$ty as CubeExpr>::Elem: Promote<__R::Elem>,
        {
            type Output = EGlueCube<<$ty as CubeExpr>::Proxy, __R::Proxy, eglue::kind::$kind>;

            #[inline]
            #[track_caller]
            fn $method(self, rhs: __R) -> Self::Output {
                EGlueCube::new(self.into_proxy(), rhs.into_proxy())
            }
        }
    };
}

macro_rules! impl_scalar_op {
    ([$($gen: tt)*] $ty: ty, $scalar: ty, $trait: ident, $method: ident, $post: ident, $pre: ident) => {
        impl<$($gen)*> $trait<$scalar> for $ty
        where
            $ty: CubeExpr<Elem = $scalar>,
        {
            type Output = EOpCube<<$ty as CubeExpr>::Proxy, eop::kind::$post>;
            #[inline]
            fn $method(self, k: $scalar) -> Self::Output {
                EOpCube::with_aux(self.into_proxy(), k)
            }
        }
        impl<$($gen)*> $trait<$ty> for $scalar
        where
            $ty: CubeExpr<Elem = $scalar>,
        {
            type Output = EOpCube<<$ty as CubeExpr>::Proxy, eop::kind::$pre>;
            #[inline]
            fn $method(self, rhs: $ty) -> Self::Output {
                EOpCube::with_aux(rhs.into_proxy(), self)
            }
        }
    };
}

macro_rules! impl_scalar_ops {
    ([$($gen: tt)*] $ty: ty, $scalar: ty) => {
        impl_scalar_op!([$($gen)*] $ty, $scalar, Add, add, ScalarPlus, ScalarPlus);
        impl_scalar_op!([$($gen)*] $ty, $scalar, Sub, sub, ScalarMinusPost, ScalarMinusPre);
        impl_scalar_op!([$($gen)*] $ty, $scalar, Mul, mul, ScalarTimes, ScalarTimes);
        impl_scalar_op!([$($gen)*] $ty, $scalar, Div, div, ScalarDivPost, ScalarDivPre);
    };
}

macro_rules! impl_cube_expr_ops {
    ($([$($gen: tt)*] $ty: ty;)*) => {$(
        impl_eglue_op!([$($gen)*] $ty, Add, add, Plus);
        impl_eglue_op!([$($gen)*] $ty, Sub, sub, Minus);
        impl_eglue_op!([$($gen)*] $ty, Rem, rem, Schur);
        impl_eglue_op!([$($gen)*] $ty, Div, div, Div);

        impl<$($gen)*> Neg for $ty
        where
            $ty: CubeExpr,
        {
            type Output = EOpCube<<$ty as CubeExpr>::Proxy, eop::kind::Neg>;

            #[inline]
            fn neg(self) -> Self::Output {
                EOpCube::new(self.into_proxy())
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

impl_cube_expr_ops! {
    ['a, E: Scalar] CubeRef<'a, E>;
    ['a, E: Scalar] SubCubeRef<'a, E>;
    ['a, E: Scalar] &'a Cube<E>;
    [E: Scalar] Cube<E>;
    ['a, 'b, E: Scalar] &'a CubeMut<'b, E>;
    ['a, 'b, E: Scalar] &'a SubCubeMut<'b, E>;
    [P: CubeProxy, O: EOpKind] EOpCube<P, O>;
    [P1: CubeProxy, P2: CubeProxy, G: EGlueKind] EGlueCube<P1, P2, G>;
    [P: CubeProxy, O: OpCubeKind<P::Elem>] OpCube<P, O>;
    [P1: CubeProxy, P2: CubeProxy, G: GlueCubeKind<P1::Elem, P2::Elem>] GlueCube<P1, P2, G>;
}

macro_rules! impl_inplace_op {
    ([$($gen: tt)*] $ty: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*, __R: CubeExpr<Elem = E>> $trait<__R> for $ty {
            #[inline]
            #[track_caller]
            fn $method(&mut self, rhs: __R) {
                rhs.apply_inplace::<$kind, _>(self)
            }
        }
    };
}

macro_rules! impl_scalar_inplace_op {
    ([$($gen: tt)*] $ty: ty, $scalar: ty, $trait: ident, $method: ident, $kind: ident) => {
        impl<$($gen)*> $trait<$scalar> for $ty
        where
            $ty: CubeTarget<Elem = $scalar>,
        {
            #[inline]
            fn $method(&mut self, k: $scalar) {
                eval::apply_scalar::<eop::kind::$kind, _>(self.target_mut(), k)
            }
        }
    };
}

macro_rules! impl_scalar_inplace_ops {
    ([$($gen: tt)*] $ty: ty, $scalar: ty) => {
        impl_scalar_inplace_op!([$($gen)*] $ty, $scalar, AddAssign, add_assign, ScalarPlus);
        impl_scalar_inplace_op!([$($gen)*] $ty, $scalar, SubAssign, sub_assign, ScalarMinusPost);
        impl_scalar_inplace_op!([$($gen)*] $ty, $scalar, MulAssign, mul_assign, ScalarTimes);
        impl_scalar_inplace_op!([$($gen)*] $ty, $scalar, DivAssign, div_assign, ScalarDivPost);
    };
}

macro_rules! impl_inplace_ops {
    ($([$($gen: tt)*] $ty: ty;)*) => {$(
        impl_inplace_op!([$($gen)*] $ty, AddAssign, add_assign, InplacePlus);
        impl_inplace_op!([$($gen)*] $ty, SubAssign, sub_assign, InplaceMinus);
        impl_inplace_op!([$($gen)*] $ty, RemAssign, rem_assign, InplaceSchur);
        impl_inplace_op!([$($gen)*] $ty, DivAssign, div_assign, InplaceDiv);

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
    [E: Scalar] Cube<E>;
    ['a, E: Scalar] CubeMut<'a, E>;
    ['a, E: Scalar] SubCubeMut<'a, E>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{from_raw_parts, from_raw_parts_mut};

    #[test]
    fn test_expression_chain() {
        let a = Cube::from_fn(2, 3, 2, |i, j, k| (i + j + k) as f64);
        let b = Cube::from_fn(2, 3, 2, |i, j, k| (1 + i * j * k) as f64);
        let c = ((&a + &b) * 0.5 - -&a % &b + 2.0 / (&b + 1.0)).eval();
        let expected = Cube::from_fn(2, 3, 2, |i, j, k| {
            let (x, y) = (a.read(i, j, k), b.read(i, j, k));
            (x + y) * 0.5 + x * y + 2.0 / (y + 1.0)
        });
        assert_eq!(c, expected);
    }

    #[test]
    fn test_mixed_types_and_strided_operands() {
        let a = Cube::from_fn(3, 3, 3, |i, j, k| (i + 3 * j + 9 * k) as i32);
        let b = Cube::full(2, 2, 2, 0.5f64);
        let c = (a.subcube(1, 1, 1, 2, 2, 2) + &b).eval();
        assert_eq!(c.read(0, 0, 0), 13.5);
        assert_eq!(c.read(1, 1, 1), 26.5);
    }

    #[test]
    fn test_compound_assignment() {
        let mut c = Cube::<i64>::ones(2, 2, 2);
        let d = Cube::from_fn(2, 2, 2, |i, j, k| (i + 2 * j + 4 * k) as i64);
        c += &d;
        c *= 2i64;
        c -= 1i64;
        assert_eq!(c.as_slice(), &[1, 3, 5, 7, 9, 11, 13, 15]);
        c %= &d;
        c /= &d + 1i64;
        assert_eq!(c.read(1, 1, 1), 15 * 7 / 8);

        {
            let mut sub = c.subcube_mut(0, 0, 1, 2, 2, 1);
            sub += 100i64;
        }
        assert_eq!(c.read(0, 0, 0), 0);
        assert_eq!(c.read(0, 0, 1), 100 + 9 * 4 / 5);
    }

    #[test]
    #[should_panic(expected = "addition: incompatible cube dimensions: 2x2x2 and 2x2x3")]
    fn test_mismatched_operands() {
        let a = Cube::<f32>::zeros(2, 2, 2);
        let b = Cube::<f32>::zeros(2, 2, 3);
        let _ = &a + &b;
    }

    #[test]
    fn test_alias_in_assignment() {
        let mut data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let ptr = data.as_mut_ptr();
        let src = unsafe { from_raw_parts(ptr as *const f64, 2, 2, 1) };
        // destination starts one element after the source
        let mut dst = unsafe { from_raw_parts_mut(ptr.add(1), 2, 2, 1) };
        dst.assign(src + 10.0);
        assert_eq!(data, [1.0, 11.0, 12.0, 13.0, 14.0, 6.0, 7.0, 8.0]);
    }
}
