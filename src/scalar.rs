//! Element types and the promotion rules used when two operands of different element types meet
//! in a binary operation.

use core::fmt::Debug;
use num_complex::Complex;
use num_traits::Float;

/// 32-bit complex floating point number.
#[allow(non_camel_case_types)]
pub type c32 = Complex<f32>;
/// 64-bit complex floating point number.
#[allow(non_camel_case_types)]
pub type c64 = Complex<f64>;

/// Element type of a dense or sparse container.
///
/// Integer arithmetic wraps on overflow, and integer division by zero yields zero. The
/// transcendental operations of integer types are computed in `f64` and converted back, which
/// truncates towards zero.
pub trait Scalar: crate::seal::Seal + Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Whether the type is a complex number.
    const IS_COMPLEX: bool;
    /// Whether the type implements [`BackendScalar`].
    const HAS_BACKEND: bool;

    /// Returns the additive identity.
    fn zero() -> Self;
    /// Returns the multiplicative identity.
    fn one() -> Self;
    /// Converts from `f64`, saturating for integer types.
    fn from_f64(value: f64) -> Self;

    /// `self + rhs`.
    fn plus(self, rhs: Self) -> Self;
    /// `self - rhs`.
    fn minus(self, rhs: Self) -> Self;
    /// `self * rhs`.
    fn times(self, rhs: Self) -> Self;
    /// `self / rhs`.
    fn over(self, rhs: Self) -> Self;
    /// `-self`.
    fn negate(self) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;
    /// Natural logarithm.
    fn ln(self) -> Self;
    /// Exponential.
    fn exp(self) -> Self;
    /// Sine.
    fn sin(self) -> Self;
    /// Cosine.
    fn cos(self) -> Self;
    /// Tangent.
    fn tan(self) -> Self;
    /// `self` raised to the power `exponent`.
    fn pow(self, exponent: Self) -> Self;
    /// Largest integer value not greater than `self` (componentwise for complex numbers).
    fn floor(self) -> Self;
    /// Smallest integer value not less than `self` (componentwise for complex numbers).
    fn ceil(self) -> Self;
    /// Nearest integer value, half-way cases away from zero (componentwise for complex numbers).
    fn round(self) -> Self;
    /// Absolute value. The modulus is stored in the real part for complex numbers.
    fn abs(self) -> Self;
    /// Complex conjugate, identity for real types.
    fn conj(self) -> Self;

    /// Absolute value as `f64`, used for pivoting and norms.
    fn magnitude(self) -> f64;
}

/// Element types supporting division in a field, used by the decompositions.
pub trait Field: Scalar {}

impl Field for f32 {}
impl Field for f64 {}
impl Field for c32 {}
impl Field for c64 {}

#[cfg(feature = "gemm")]
#[inline]
fn gemm_parallelism(parallelism: crate::Parallelism) -> gemm::Parallelism {
    match parallelism {
        crate::Parallelism::None => gemm::Parallelism::None,
        #[cfg(feature = "rayon")]
        crate::Parallelism::Rayon(0) => gemm::Parallelism::Rayon(rayon::current_num_threads()),
        #[cfg(feature = "rayon")]
        crate::Parallelism::Rayon(n_threads) => gemm::Parallelism::Rayon(n_threads),
    }
}

/// Element types with a native matrix multiplication kernel: `f32`, `f64`, `c32` and `c64`.
#[cfg(feature = "gemm")]
#[cfg_attr(docsrs, doc(cfg(feature = "gemm")))]
pub trait BackendScalar: Scalar {
    /// Computes `dst := alpha * dst + beta * lhs * rhs`, reading `dst` only if `read_dst` is
    /// `true`.
    ///
    /// # Safety
    /// The pointers and strides must describe valid `m × n`, `m × k` and `k × n` matrices, and
    /// `dst` must not overlap `lhs` or `rhs`.
    #[doc(hidden)]
    unsafe fn backend_gemm(
        m: usize,
        n: usize,
        k: usize,
        dst: *mut Self,
        dst_cs: isize,
        dst_rs: isize,
        read_dst: bool,
        lhs: *const Self,
        lhs_cs: isize,
        lhs_rs: isize,
        rhs: *const Self,
        rhs_cs: isize,
        rhs_rs: isize,
        alpha: Self,
        beta: Self,
        parallelism: crate::Parallelism,
    );
}

macro_rules! impl_backend {
    ($($ty: ty => $gemm_ty: ty),* $(,)?) => {$(
        #[cfg(feature = "gemm")]
        impl BackendScalar for $ty {
            #[inline]
            unsafe fn backend_gemm(
                m: usize,
                n: usize,
                k: usize,
                dst: *mut Self,
                dst_cs: isize,
                dst_rs: isize,
                read_dst: bool,
                lhs: *const Self,
                lhs_cs: isize,
                lhs_rs: isize,
                rhs: *const Self,
                rhs_cs: isize,
                rhs_rs: isize,
                alpha: Self,
                beta: Self,
                parallelism: crate::Parallelism,
            ) {
                let alpha: $gemm_ty = *(&alpha as *const $ty as *const $gemm_ty);
                let beta: $gemm_ty = *(&beta as *const $ty as *const $gemm_ty);
                gemm::gemm(
                    m,
                    n,
                    k,
                    dst as *mut $gemm_ty,
                    dst_cs,
                    dst_rs,
                    read_dst,
                    lhs as *const $gemm_ty,
                    lhs_cs,
                    lhs_rs,
                    rhs as *const $gemm_ty,
                    rhs_cs,
                    rhs_rs,
                    alpha,
                    beta,
                    false,
                    false,
                    false,
                    gemm_parallelism(parallelism),
                )
            }
        }
    )*};
}

macro_rules! impl_real {
    ($($ty: ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const IS_COMPLEX: bool = false;
            const HAS_BACKEND: bool = cfg!(feature = "gemm");

            #[inline(always)]
            fn zero() -> Self {
                0.0
            }
            #[inline(always)]
            fn one() -> Self {
                1.0
            }
            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline(always)]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline(always)]
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline(always)]
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline(always)]
            fn over(self, rhs: Self) -> Self {
                self / rhs
            }
            #[inline(always)]
            fn negate(self) -> Self {
                -self
            }

            #[inline]
            fn sqrt(self) -> Self {
                Float::sqrt(self)
            }
            #[inline]
            fn ln(self) -> Self {
                Float::ln(self)
            }
            #[inline]
            fn exp(self) -> Self {
                Float::exp(self)
            }
            #[inline]
            fn sin(self) -> Self {
                Float::sin(self)
            }
            #[inline]
            fn cos(self) -> Self {
                Float::cos(self)
            }
            #[inline]
            fn tan(self) -> Self {
                Float::tan(self)
            }
            #[inline]
            fn pow(self, exponent: Self) -> Self {
                Float::powf(self, exponent)
            }
            #[inline]
            fn floor(self) -> Self {
                Float::floor(self)
            }
            #[inline]
            fn ceil(self) -> Self {
                Float::ceil(self)
            }
            #[inline]
            fn round(self) -> Self {
                Float::round(self)
            }
            #[inline]
            fn abs(self) -> Self {
                Float::abs(self)
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline]
            fn magnitude(self) -> f64 {
                Float::abs(self) as f64
            }
        }
    )*};
}

macro_rules! impl_complex {
    ($($real: ty),* $(,)?) => {$(
        impl Scalar for Complex<$real> {
            const IS_COMPLEX: bool = true;
            const HAS_BACKEND: bool = cfg!(feature = "gemm");

            #[inline(always)]
            fn zero() -> Self {
                Complex::new(0.0, 0.0)
            }
            #[inline(always)]
            fn one() -> Self {
                Complex::new(1.0, 0.0)
            }
            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                Complex::new(value as $real, 0.0)
            }

            #[inline(always)]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline(always)]
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline(always)]
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline(always)]
            fn over(self, rhs: Self) -> Self {
                self / rhs
            }
            #[inline(always)]
            fn negate(self) -> Self {
                -self
            }

            #[inline]
            fn sqrt(self) -> Self {
                Complex::sqrt(self)
            }
            #[inline]
            fn ln(self) -> Self {
                Complex::ln(self)
            }
            #[inline]
            fn exp(self) -> Self {
                Complex::exp(self)
            }
            #[inline]
            fn sin(self) -> Self {
                Complex::sin(self)
            }
            #[inline]
            fn cos(self) -> Self {
                Complex::cos(self)
            }
            #[inline]
            fn tan(self) -> Self {
                Complex::tan(self)
            }
            #[inline]
            fn pow(self, exponent: Self) -> Self {
                Complex::powc(self, exponent)
            }
            #[inline]
            fn floor(self) -> Self {
                Complex::new(self.re.floor(), self.im.floor())
            }
            #[inline]
            fn ceil(self) -> Self {
                Complex::new(self.re.ceil(), self.im.ceil())
            }
            #[inline]
            fn round(self) -> Self {
                Complex::new(self.re.round(), self.im.round())
            }
            #[inline]
            fn abs(self) -> Self {
                Complex::new(self.norm(), 0.0)
            }
            #[inline(always)]
            fn conj(self) -> Self {
                Complex::conj(&self)
            }
            #[inline]
            fn magnitude(self) -> f64 {
                self.norm() as f64
            }
        }
    )*};
}

macro_rules! impl_int {
    ($($ty: ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const IS_COMPLEX: bool = false;
            const HAS_BACKEND: bool = false;

            #[inline(always)]
            fn zero() -> Self {
                0
            }
            #[inline(always)]
            fn one() -> Self {
                1
            }
            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline(always)]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline(always)]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline(always)]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            #[inline(always)]
            fn over(self, rhs: Self) -> Self {
                if rhs == 0 {
                    0
                } else {
                    self.wrapping_div(rhs)
                }
            }
            #[inline(always)]
            fn negate(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn sqrt(self) -> Self {
                (self as f64).sqrt() as $ty
            }
            #[inline]
            fn ln(self) -> Self {
                (self as f64).ln() as $ty
            }
            #[inline]
            fn exp(self) -> Self {
                (self as f64).exp() as $ty
            }
            #[inline]
            fn sin(self) -> Self {
                (self as f64).sin() as $ty
            }
            #[inline]
            fn cos(self) -> Self {
                (self as f64).cos() as $ty
            }
            #[inline]
            fn tan(self) -> Self {
                (self as f64).tan() as $ty
            }
            #[inline]
            fn pow(self, exponent: Self) -> Self {
                (self as f64).powf(exponent as f64) as $ty
            }
            #[inline(always)]
            fn floor(self) -> Self {
                self
            }
            #[inline(always)]
            fn ceil(self) -> Self {
                self
            }
            #[inline(always)]
            fn round(self) -> Self {
                self
            }
            #[inline]
            #[allow(unused_comparisons)]
            fn abs(self) -> Self {
                if self < 0 {
                    self.wrapping_neg()
                } else {
                    self
                }
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline]
            fn magnitude(self) -> f64 {
                (self as f64).abs()
            }
        }
    )*};
}

impl_real!(f32, f64);
impl_complex!(f32, f64);
impl_int!(i32, i64, u32, u64);
#[cfg(feature = "gemm")]
impl_backend!(f32 => f32, f64 => f64, c32 => gemm::c32, c64 => gemm::c64);

/// Lossless (or, for `i64`/`u64` into floating point, nearest) conversion used by the promotion
/// rules.
pub trait Widen<To>: Scalar {
    /// Converts `self` into the wider type.
    fn widen(self) -> To;
}

macro_rules! widen_identity {
    ($($ty: ty),*) => {$(
        impl Widen<$ty> for $ty {
            #[inline(always)]
            fn widen(self) -> $ty {
                self
            }
        }
    )*};
}

macro_rules! widen_prim {
    ($($from: ty => $to: ty),* $(,)?) => {$(
        impl Widen<$to> for $from {
            #[inline(always)]
            fn widen(self) -> $to {
                self as $to
            }
        }
    )*};
}

macro_rules! widen_to_complex {
    ($($from: ty => $real: ty),* $(,)?) => {$(
        impl Widen<Complex<$real>> for $from {
            #[inline(always)]
            fn widen(self) -> Complex<$real> {
                Complex::new(self as $real, 0.0)
            }
        }
    )*};
}

widen_identity!(f32, f64, i32, i64, u32, u64, c32, c64);
widen_prim!(
    f32 => f64, i32 => f64, i64 => f64, u32 => f64, u64 => f64,
    i32 => f32, i64 => f32, u32 => f32, u64 => f32,
    i32 => i64, u32 => i64, u64 => i64,
    u32 => i32, u32 => u64,
);
widen_to_complex!(
    f64 => f64, f32 => f64, i32 => f64, i64 => f64, u32 => f64, u64 => f64,
    f32 => f32, i32 => f32, i64 => f32, u32 => f32, u64 => f32,
);

impl Widen<c64> for c32 {
    #[inline(always)]
    fn widen(self) -> c64 {
        Complex::new(self.re as f64, self.im as f64)
    }
}

/// Promotion rule: the element type produced when combining `Self` with `Rhs`.
///
/// The table is symmetric. Pairs without a rule, such as `c32` with `c64`, do not implement the
/// trait, so mixing them in an expression is a compile-time error.
pub trait Promote<Rhs: Scalar>: Scalar {
    /// Promoted element type.
    type Output: Scalar;

    /// Converts a left hand side element.
    fn promote_lhs(lhs: Self) -> Self::Output;
    /// Converts a right hand side element.
    fn promote_rhs(rhs: Rhs) -> Self::Output;
}

macro_rules! promote_same {
    ($($ty: ty),*) => {$(
        impl Promote<$ty> for $ty {
            type Output = $ty;
            #[inline(always)]
            fn promote_lhs(lhs: Self) -> $ty {
                lhs
            }
            #[inline(always)]
            fn promote_rhs(rhs: $ty) -> $ty {
                rhs
            }
        }
    )*};
}

macro_rules! promote_pair {
    ($($a: ty, $b: ty => $out: ty);* $(;)?) => {$(
        impl Promote<$b> for $a {
            type Output = $out;
            #[inline(always)]
            fn promote_lhs(lhs: Self) -> $out {
                Widen::<$out>::widen(lhs)
            }
            #[inline(always)]
            fn promote_rhs(rhs: $b) -> $out {
                Widen::<$out>::widen(rhs)
            }
        }
        impl Promote<$a> for $b {
            type Output = $out;
            #[inline(always)]
            fn promote_lhs(lhs: Self) -> $out {
                Widen::<$out>::widen(lhs)
            }
            #[inline(always)]
            fn promote_rhs(rhs: $a) -> $out {
                Widen::<$out>::widen(rhs)
            }
        }
    )*};
}

promote_same!(f32, f64, i32, i64, u32, u64, c32, c64);
promote_pair! {
    f64, f32 => f64;
    f64, i32 => f64;
    f64, i64 => f64;
    f64, u32 => f64;
    f64, u64 => f64;

    f32, i32 => f32;
    f32, i64 => f32;
    f32, u32 => f32;
    f32, u64 => f32;

    i64, i32 => i64;
    i64, u32 => i64;
    i64, u64 => i64;
    i32, u32 => i32;
    i32, u64 => i64;
    u64, u32 => u64;

    c64, f64 => c64;
    c64, f32 => c64;
    c64, i32 => c64;
    c64, i64 => c64;
    c64, u32 => c64;
    c64, u64 => c64;

    c32, f32 => c32;
    c32, f64 => c64;
    c32, i32 => c32;
    c32, i64 => c32;
    c32, u32 => c32;
    c32, u64 => c32;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promoted<A: Promote<B>, B: Scalar>(a: A, b: B) -> (A::Output, A::Output) {
        (A::promote_lhs(a), A::promote_rhs(b))
    }

    #[test]
    fn test_promotion_widens_to_the_more_general_type() {
        let (a, b) = promoted(3i32, 0.5f64);
        assert_eq!((a, b), (3.0f64, 0.5f64));

        let (a, b) = promoted(2u32, -7i32);
        assert_eq!((a, b), (2i32, -7i32));

        let (a, b) = promoted(c32::new(1.0, 2.0), 4.0f64);
        assert_eq!(a, c64::new(1.0, 2.0));
        assert_eq!(b, c64::new(4.0, 0.0));
    }

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(u32::MAX.plus(1), 0);
        assert_eq!(1u32.negate().plus(3), 2);
        assert_eq!(7i32.over(0), 0);
        assert_eq!(16i64.sqrt(), 4);
        assert_eq!((-5i32).abs(), 5);
    }

    #[test]
    fn test_complex_helpers() {
        let z = c64::new(3.0, 4.0);
        assert_eq!(z.abs(), c64::new(5.0, 0.0));
        assert_eq!(z.magnitude(), 5.0);
        assert_eq!(Scalar::conj(z), c64::new(3.0, -4.0));
        assert_eq!(c64::new(1.4, -1.6).round(), c64::new(1.0, -2.0));
    }
}
