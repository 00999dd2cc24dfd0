//! Elementwise unary nodes.

use super::*;
use core::marker::PhantomData;

/// Elementwise unary operation, applied to each element together with an auxiliary scalar
/// (the scalar operand of `A + k`, the exponent of `pow`, unused by the others).
pub trait EOpKind: crate::seal::Seal + 'static {
    /// Name of the operation.
    const NAME: &'static str;

    /// Computes the result for the element `x`.
    fn process<E: Scalar>(x: E, aux: E) -> E;
}

/// Operation tags for [`EOp`].
pub mod kind {
    use super::*;

    macro_rules! eop_kinds {
        ($($(#[$attr: meta])* $name: ident => $op_name: literal, |$x: ident, $aux: ident| $body: expr;)*) => {$(
            $(#[$attr])*
            #[derive(Copy, Clone, Debug)]
            pub struct $name;

            impl EOpKind for $name {
                const NAME: &'static str = $op_name;

                #[inline(always)]
                #[allow(unused_variables)]
                fn process<E: Scalar>($x: E, $aux: E) -> E {
                    $body
                }
            }
        )*};
    }

    eop_kinds! {
        /// `-x`.
        Neg => "negation", |x, aux| x.negate();
        /// `x + k`.
        ScalarPlus => "scalar addition", |x, aux| x.plus(aux);
        /// `k - x`.
        ScalarMinusPre => "scalar subtraction", |x, aux| aux.minus(x);
        /// `x - k`.
        ScalarMinusPost => "scalar subtraction", |x, aux| x.minus(aux);
        /// `x * k`.
        ScalarTimes => "scalar multiplication", |x, aux| x.times(aux);
        /// `k / x`.
        ScalarDivPre => "scalar division", |x, aux| aux.over(x);
        /// `x / k`.
        ScalarDivPost => "scalar division", |x, aux| x.over(aux);
        /// `x * x`.
        Square => "square", |x, aux| x.times(x);
        /// Square root.
        Sqrt => "sqrt", |x, aux| x.sqrt();
        /// Natural logarithm.
        Log => "log", |x, aux| x.ln();
        /// Exponential.
        Exp => "exp", |x, aux| x.exp();
        /// Sine.
        Sin => "sin", |x, aux| x.sin();
        /// Cosine.
        Cos => "cos", |x, aux| x.cos();
        /// Tangent.
        Tan => "tan", |x, aux| x.tan();
        /// `x` raised to the power `k`.
        Pow => "pow", |x, aux| x.pow(aux);
        /// Rounding towards negative infinity.
        Floor => "floor", |x, aux| x.floor();
        /// Rounding towards positive infinity.
        Ceil => "ceil", |x, aux| x.ceil();
        /// Rounding to the nearest integer.
        Round => "round", |x, aux| x.round();
        /// Absolute value.
        Abs => "abs", |x, aux| x.abs();
    }
}

/// Elementwise unary node, fused into the evaluation loop of the enclosing expression.
pub struct EOp<P: Proxy, O> {
    inner: P,
    aux: P::Elem,
    __marker: PhantomData<O>,
}

impl<P: Proxy + Clone, O> Clone for EOp<P, O> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            aux: self.aux,
            __marker: PhantomData,
        }
    }
}

impl<P: Proxy, O: EOpKind> EOp<P, O> {
    /// Creates the node, with a zero auxiliary scalar.
    #[inline]
    pub fn new(inner: P) -> Self {
        Self::with_aux(inner, P::Elem::zero())
    }

    /// Creates the node with the given auxiliary scalar.
    #[inline]
    pub fn with_aux(inner: P, aux: P::Elem) -> Self {
        Self {
            inner,
            aux,
            __marker: PhantomData,
        }
    }

    /// Returns the auxiliary scalar.
    #[inline]
    pub fn aux(&self) -> P::Elem {
        self.aux
    }
}

impl<P: Proxy, O: EOpKind> Proxy for EOp<P, O> {
    type Elem = P::Elem;
    const PREFER_AT_ACCESSOR: bool = P::PREFER_AT_ACCESSOR;

    #[inline(always)]
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> P::Elem {
        O::process(self.inner.get_unchecked(index), self.aux)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> P::Elem {
        O::process(self.inner.at_unchecked(row, col), self.aux)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.inner.is_alias(region)
    }
}

impl<P: Proxy, O: EOpKind> Expr for EOp<P, O> {
    type Elem = P::Elem;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

macro_rules! eop_fns {
    ($($(#[$attr: meta])* $name: ident => $kind: ident;)*) => {$(
        $(#[$attr])*
        #[inline]
        pub fn $name<X: Expr>(x: X) -> EOp<X::Proxy, kind::$kind> {
            EOp::new(x.into_proxy())
        }
    )*};
}

eop_fns! {
    /// Elementwise square.
    square => Square;
    /// Elementwise square root.
    sqrt => Sqrt;
    /// Elementwise natural logarithm.
    log => Log;
    /// Elementwise exponential.
    exp => Exp;
    /// Elementwise sine.
    sin => Sin;
    /// Elementwise cosine.
    cos => Cos;
    /// Elementwise tangent.
    tan => Tan;
    /// Elementwise rounding towards negative infinity.
    floor => Floor;
    /// Elementwise rounding towards positive infinity.
    ceil => Ceil;
    /// Elementwise rounding to the nearest integer, half-way cases away from zero.
    round => Round;
    /// Elementwise absolute value.
    abs => Abs;
}

/// Elementwise power with a scalar exponent.
#[inline]
pub fn pow<X: Expr>(x: X, exponent: X::Elem) -> EOp<X::Proxy, kind::Pow> {
    EOp::with_aux(x.into_proxy(), exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_scalar_times_matches_self_addition() {
        let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0f64]];
        let twice = (&a * 2.0).eval();
        let sum = (&a + &a).eval();
        assert_eq!(
            twice,
            mat![[2.0, 4.0, 6.0], [8.0, 10.0, 12.0], [14.0, 16.0, 18.0]]
        );
        for (x, y) in twice.as_slice().iter().zip(sum.as_slice()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_scalar_forms() {
        let a = mat![[1.0, 2.0], [4.0, 8.0f64]];
        assert_eq!((&a + 1.0).eval(), mat![[2.0, 3.0], [5.0, 9.0]]);
        assert_eq!((1.0 - &a).eval(), mat![[0.0, -1.0], [-3.0, -7.0]]);
        assert_eq!((&a - 1.0).eval(), mat![[0.0, 1.0], [3.0, 7.0]]);
        assert_eq!((8.0 / &a).eval(), mat![[8.0, 4.0], [2.0, 1.0]]);
        assert_eq!((&a / 2.0).eval(), mat![[0.5, 1.0], [2.0, 4.0]]);
        assert_eq!((-&a).eval(), mat![[-1.0, -2.0], [-4.0, -8.0]]);
    }

    #[test]
    fn test_math_functions() {
        let a = mat![[1.0, 4.0], [9.0, 16.0f64]];
        assert_eq!(sqrt(&a).eval(), mat![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(square(sqrt(&a)).eval(), a);
        assert_eq!(pow(&a, 0.5).eval(), mat![[1.0, 2.0], [3.0, 4.0]]);

        let e = exp(log(&a)).eval();
        for (x, y) in e.as_slice().iter().zip(a.as_slice()) {
            assert_approx_eq!(x, y, 1e-12);
        }

        let b = mat![[-1.5, 2.5], [0.4, -0.6f64]];
        assert_eq!(floor(&b).eval(), mat![[-2.0, 2.0], [0.0, -1.0]]);
        assert_eq!(ceil(&b).eval(), mat![[-1.0, 3.0], [1.0, -0.0]]);
        assert_eq!(round(&b).eval(), mat![[-2.0, 3.0], [0.0, -1.0]]);
        assert_eq!(abs(&b).eval(), mat![[1.5, 2.5], [0.4, 0.6]]);
    }

    #[test]
    fn test_trig_identity() {
        let a = Mat::from_fn(5, 5, |i, j| (i as f64) * 0.3 - (j as f64) * 0.2);
        let one = (square(sin(&a)) + square(cos(&a))).eval();
        for x in one.as_slice() {
            assert_approx_eq!(*x, 1.0, 1e-14);
        }
        let t = (tan(&a) - sin(&a) / cos(&a)).eval();
        for x in t.as_slice() {
            assert_approx_eq!(*x, 0.0, 1e-12);
        }
    }

    #[test]
    fn test_integer_and_complex_elements() {
        let a = mat![[-3, 4], [10, -1i32]];
        assert_eq!(abs(&a).eval(), mat![[3, 4], [10, 1]]);
        assert_eq!((&a / 0i32).eval(), Mat::zeros(2, 2));

        let z = mat![[c64::new(3.0, 4.0)]];
        assert_eq!(abs(&z).eval(), mat![[c64::new(5.0, 0.0)]]);
        assert_eq!((&z * c64::new(0.0, 1.0)).eval(), mat![[c64::new(-4.0, 3.0)]]);
    }

    #[test]
    fn test_fused_expression_on_submatrix() {
        let a = Mat::from_fn(6, 6, |i, j| (i * 6 + j) as f64);
        let sub = a.submatrix(1, 2, 3, 3);
        let expected = Mat::from_fn(3, 3, |i, j| 2.0 * sub.read(i, j) + 1.0);
        assert_eq!((sub * 2.0 + 1.0).eval(), expected);
    }
}
