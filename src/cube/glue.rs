//! Binary cube nodes that need both operands in full before producing the result.

use super::{eval, Cube, CubeExpr, CubeProxy, CubeTarget, SubCubeMut};
use crate::{error::DimensionMismatch, expr::MemRegion, Scalar};
use core::marker::PhantomData;
use reborrow::*;

/// Whole-cube binary operation.
pub trait GlueCubeKind<E1: Scalar, E2: Scalar>: crate::seal::Seal + 'static {
    /// Element type of the result.
    type Output: Scalar;

    /// Name of the operation.
    const NAME: &'static str;

    /// Dimensions of the result, or `None` if the operands are incompatible.
    fn dims(
        lhs: (usize, usize, usize),
        rhs: (usize, usize, usize),
    ) -> Option<(usize, usize, usize)>;

    /// Writes the result into `dst`, which has the dimensions returned by
    /// [`GlueCubeKind::dims`] and does not overlap the operands.
    fn apply<P1: CubeProxy<Elem = E1>, P2: CubeProxy<Elem = E2>>(
        dst: SubCubeMut<'_, Self::Output>,
        lhs: &P1,
        rhs: &P2,
    );
}

/// Operation tags for [`GlueCube`].
pub mod kind {
    use super::*;

    /// Stacking of the slices of the second operand after those of the first.
    #[derive(Copy, Clone, Debug)]
    pub struct JoinSlices;

    impl<E: Scalar> GlueCubeKind<E, E> for JoinSlices {
        type Output = E;
        const NAME: &'static str = "join_slices";

        #[inline]
        fn dims(
            lhs: (usize, usize, usize),
            rhs: (usize, usize, usize),
        ) -> Option<(usize, usize, usize)> {
            if lhs.0 * lhs.1 * lhs.2 == 0 {
                Some(rhs)
            } else if rhs.0 * rhs.1 * rhs.2 == 0 {
                Some(lhs)
            } else {
                (lhs.0 == rhs.0 && lhs.1 == rhs.1).then_some((lhs.0, lhs.1, lhs.2 + rhs.2))
            }
        }

        fn apply<P1: CubeProxy<Elem = E>, P2: CubeProxy<Elem = E>>(
            mut dst: SubCubeMut<'_, E>,
            lhs: &P1,
            rhs: &P2,
        ) {
            let mut offset = 0;
            if lhs.n_elem() != 0 {
                let block = dst.rb_mut().into_subcube(
                    0,
                    0,
                    0,
                    lhs.nrows(),
                    lhs.ncols(),
                    lhs.nslices(),
                );
                eval::eval_into(block, lhs);
                offset = lhs.nslices();
            }
            if rhs.n_elem() != 0 {
                let block = dst.rb_mut().into_subcube(
                    0,
                    0,
                    offset,
                    rhs.nrows(),
                    rhs.ncols(),
                    rhs.nslices(),
                );
                eval::eval_into(block, rhs);
            }
        }
    }
}

/// Whole-cube binary node. It is computed into a temporary when used as an operand, and directly
/// into the destination when assigned and the destination overlaps neither operand.
pub struct GlueCube<P1, P2, G> {
    lhs: P1,
    rhs: P2,
    dims: (usize, usize, usize),
    __marker: PhantomData<G>,
}

impl<P1: CubeProxy, P2: CubeProxy, G: GlueCubeKind<P1::Elem, P2::Elem>> GlueCube<P1, P2, G> {
    /// Creates the node.
    ///
    /// # Panics
    /// Panics if the operands have incompatible dimensions.
    #[inline]
    #[track_caller]
    pub fn new(lhs: P1, rhs: P2) -> Self {
        match Self::try_new(lhs, rhs) {
            Ok(node) => node,
            Err(err) => err.panic(),
        }
    }

    /// Creates the node, or returns an error if the operands have incompatible dimensions.
    #[inline]
    pub fn try_new(lhs: P1, rhs: P2) -> Result<Self, DimensionMismatch> {
        let lhs_dims = (lhs.nrows(), lhs.ncols(), lhs.nslices());
        let rhs_dims = (rhs.nrows(), rhs.ncols(), rhs.nslices());
        match G::dims(lhs_dims, rhs_dims) {
            Some(dims) => Ok(Self {
                lhs,
                rhs,
                dims,
                __marker: PhantomData,
            }),
            None => Err(DimensionMismatch::cube(G::NAME, lhs_dims, rhs_dims)),
        }
    }

    /// Dimensions of the result.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.lhs.is_alias(region) || self.rhs.is_alias(region)
    }

    fn materialize(&self) -> Cube<G::Output> {
        let (nrows, ncols, nslices) = self.dims;
        let mut out = Cube::zeros(nrows, ncols, nslices);
        G::apply(out.as_mut().into_subcube(), &self.lhs, &self.rhs);
        out
    }
}

impl<P1: CubeProxy, P2: CubeProxy, G: GlueCubeKind<P1::Elem, P2::Elem>> CubeExpr
    for GlueCube<P1, P2, G>
{
    type Elem = G::Output;
    type Proxy = Cube<G::Output>;

    #[inline]
    fn into_proxy(self) -> Cube<G::Output> {
        self.materialize()
    }

    #[track_caller]
    fn assign_to<D: CubeTarget<Elem = G::Output>>(self, dst: &mut D) {
        if self.is_alias(dst.region()) {
            dst.take_result(self.materialize());
        } else {
            let (nrows, ncols, nslices) = self.dims;
            dst.prepare(nrows, ncols, nslices);
            G::apply(dst.target_mut(), &self.lhs, &self.rhs);
        }
    }
}

/// Stacks the slices of `back` after those of `front`. An empty operand is ignored.
///
/// # Panics
/// Panics if both operands are non empty and their slices have different dimensions.
#[inline]
#[track_caller]
pub fn join_slices<A: CubeExpr, B: CubeExpr<Elem = A::Elem>>(
    front: A,
    back: B,
) -> GlueCube<A::Proxy, B::Proxy, kind::JoinSlices> {
    GlueCube::new(front.into_proxy(), back.into_proxy())
}
