//! In-place combination of an expression into an existing destination (`+=`, `-=`, `%=`, `/=`).

use crate::Scalar;

/// Operation combining an element of the destination with an element of the source.
pub trait InplaceKind: crate::seal::Seal + 'static {
    /// Name of the operation, used in dimension mismatch messages.
    const NAME: &'static str;

    /// Combines `dst` with `src`.
    fn apply<E: Scalar>(dst: E, src: E) -> E;

    /// Coefficient applied to a matrix product accumulated into the destination, for kinds that
    /// can be fused into the product kernel.
    #[inline]
    fn gemm_beta<E: Scalar>() -> Option<E> {
        None
    }
}

/// `dst = src`.
#[derive(Copy, Clone, Debug)]
pub struct Assign;
/// `dst += src`.
#[derive(Copy, Clone, Debug)]
pub struct InplacePlus;
/// `dst -= src`.
#[derive(Copy, Clone, Debug)]
pub struct InplaceMinus;
/// `dst %= src` (elementwise product).
#[derive(Copy, Clone, Debug)]
pub struct InplaceSchur;
/// `dst /= src` (elementwise division).
#[derive(Copy, Clone, Debug)]
pub struct InplaceDiv;

impl InplaceKind for Assign {
    const NAME: &'static str = "copy into submatrix";

    #[inline(always)]
    fn apply<E: Scalar>(_: E, src: E) -> E {
        src
    }
}

impl InplaceKind for InplacePlus {
    const NAME: &'static str = "addition";

    #[inline(always)]
    fn apply<E: Scalar>(dst: E, src: E) -> E {
        dst.plus(src)
    }

    #[inline]
    fn gemm_beta<E: Scalar>() -> Option<E> {
        Some(E::one())
    }
}

impl InplaceKind for InplaceMinus {
    const NAME: &'static str = "subtraction";

    #[inline(always)]
    fn apply<E: Scalar>(dst: E, src: E) -> E {
        dst.minus(src)
    }

    #[inline]
    fn gemm_beta<E: Scalar>() -> Option<E> {
        Some(E::one().negate())
    }
}

impl InplaceKind for InplaceSchur {
    const NAME: &'static str = "element-wise multiplication";

    #[inline(always)]
    fn apply<E: Scalar>(dst: E, src: E) -> E {
        dst.times(src)
    }
}

impl InplaceKind for InplaceDiv {
    const NAME: &'static str = "element-wise division";

    #[inline(always)]
    fn apply<E: Scalar>(dst: E, src: E) -> E {
        dst.over(src)
    }
}
