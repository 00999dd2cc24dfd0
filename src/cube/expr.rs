//! Elementwise cube nodes.
//!
//! The operation tags are shared with the matrix nodes: any [`EOpKind`] or [`EGlueKind`] works
//! for cubes as well.

use super::{CubeExpr, CubeProxy};
use crate::{
    error::DimensionMismatch,
    expr::{eop::kind, EGlueKind, EOpKind, MemRegion},
    Promote, Scalar,
};
use core::marker::PhantomData;

/// Elementwise unary cube node.
pub struct EOpCube<P: CubeProxy, O> {
    inner: P,
    aux: P::Elem,
    __marker: PhantomData<O>,
}

impl<P: CubeProxy, O: EOpKind> EOpCube<P, O> {
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
}

impl<P: CubeProxy, O: EOpKind> CubeProxy for EOpCube<P, O> {
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
    fn nslices(&self) -> usize {
        self.inner.nslices()
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> P::Elem {
        O::process(self.inner.get_unchecked(index), self.aux)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> P::Elem {
        O::process(self.inner.at_unchecked(row, col, slice), self.aux)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.inner.is_alias(region)
    }
}

impl<P: CubeProxy, O: EOpKind> CubeExpr for EOpCube<P, O> {
    type Elem = P::Elem;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

/// Elementwise binary cube node, promoting its operands like [`EGlue`](crate::expr::EGlue).
pub struct EGlueCube<P1, P2, G> {
    lhs: P1,
    rhs: P2,
    __marker: PhantomData<G>,
}

impl<P1: CubeProxy, P2: CubeProxy, G: EGlueKind> EGlueCube<P1, P2, G>
where
    P1::Elem: Promote<P2::Elem>,
{
    /// Creates the node.
    ///
    /// # Panics
    /// Panics if the operands have different dimensions.
    #[inline]
    #[track_caller]
    pub fn new(lhs: P1, rhs: P2) -> Self {
        match Self::try_new(lhs, rhs) {
            Ok(node) => node,
            Err(err) => err.panic(),
        }
    }

    /// Creates the node, or returns an error if the operands have different dimensions.
    #[inline]
    pub fn try_new(lhs: P1, rhs: P2) -> Result<Self, DimensionMismatch> {
        let lhs_dims = (lhs.nrows(), lhs.ncols(), lhs.nslices());
        let rhs_dims = (rhs.nrows(), rhs.ncols(), rhs.nslices());
        if lhs_dims != rhs_dims {
            return Err(DimensionMismatch::cube(G::NAME, lhs_dims, rhs_dims));
        }
        Ok(Self {
            lhs,
            rhs,
            __marker: PhantomData,
        })
    }
}

impl<P1: CubeProxy, P2: CubeProxy, G: EGlueKind> CubeProxy for EGlueCube<P1, P2, G>
where
    P1::Elem: Promote<P2::Elem>,
{
    type Elem = <P1::Elem as Promote<P2::Elem>>::Output;
    const PREFER_AT_ACCESSOR: bool = P1::PREFER_AT_ACCESSOR || P2::PREFER_AT_ACCESSOR;

    #[inline(always)]
    fn nrows(&self) -> usize {
        self.lhs.nrows()
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        self.lhs.ncols()
    }
    #[inline(always)]
    fn nslices(&self) -> usize {
        self.lhs.nslices()
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> Self::Elem {
        G::process(
            <P1::Elem as Promote<P2::Elem>>::promote_lhs(self.lhs.get_unchecked(index)),
            <P1::Elem as Promote<P2::Elem>>::promote_rhs(self.rhs.get_unchecked(index)),
        )
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> Self::Elem {
        G::process(
            <P1::Elem as Promote<P2::Elem>>::promote_lhs(self.lhs.at_unchecked(row, col, slice)),
            <P1::Elem as Promote<P2::Elem>>::promote_rhs(self.rhs.at_unchecked(row, col, slice)),
        )
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.lhs.is_alias(region) || self.rhs.is_alias(region)
    }
}

impl<P1: CubeProxy, P2: CubeProxy, G: EGlueKind> CubeExpr for EGlueCube<P1, P2, G>
where
    P1::Elem: Promote<P2::Elem>,
{
    type Elem = <P1::Elem as Promote<P2::Elem>>::Output;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

macro_rules! eop_cube_fns {
    ($($(#[$attr: meta])* $name: ident => $kind: ident;)*) => {$(
        $(#[$attr])*
        #[inline]
        pub fn $name<X: CubeExpr>(x: X) -> EOpCube<X::Proxy, kind::$kind> {
            EOpCube::new(x.into_proxy())
        }
    )*};
}

eop_cube_fns! {
    /// Elementwise square.
    square => Square;
    /// Elementwise square root.
    sqrt => Sqrt;
    /// Elementwise natural logarithm.
    log => Log;
    /// Elementwise exponential.
    exp => Exp;
    /// Elementwise rounding towards negative infinity.
    floor => Floor;
    /// Elementwise rounding towards positive infinity.
    ceil => Ceil;
    /// Elementwise rounding to the nearest integer.
    round => Round;
    /// Elementwise absolute value.
    abs => Abs;
}

/// Elementwise power with a scalar exponent.
#[inline]
pub fn pow<X: CubeExpr>(x: X, exponent: X::Elem) -> EOpCube<X::Proxy, kind::Pow> {
    EOpCube::with_aux(x.into_proxy(), exponent)
}
