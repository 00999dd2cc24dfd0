//! Elementwise binary nodes.

use super::*;
use crate::{error::DimensionMismatch, scalar::Promote};
use core::marker::PhantomData;

/// Elementwise binary operation.
pub trait EGlueKind: crate::seal::Seal + 'static {
    /// Name of the operation, used in dimension mismatch messages.
    const NAME: &'static str;

    /// Combines two elements, already promoted to a common type.
    fn process<E: Scalar>(lhs: E, rhs: E) -> E;
}

/// Operation tags for [`EGlue`].
pub mod kind {
    use super::*;

    /// `lhs + rhs`.
    #[derive(Copy, Clone, Debug)]
    pub struct Plus;
    /// `lhs - rhs`.
    #[derive(Copy, Clone, Debug)]
    pub struct Minus;
    /// Elementwise product, written `lhs % rhs`.
    #[derive(Copy, Clone, Debug)]
    pub struct Schur;
    /// Elementwise division.
    #[derive(Copy, Clone, Debug)]
    pub struct Div;

    impl EGlueKind for Plus {
        const NAME: &'static str = "addition";
        #[inline(always)]
        fn process<E: Scalar>(lhs: E, rhs: E) -> E {
            lhs.plus(rhs)
        }
    }
    impl EGlueKind for Minus {
        const NAME: &'static str = "subtraction";
        #[inline(always)]
        fn process<E: Scalar>(lhs: E, rhs: E) -> E {
            lhs.minus(rhs)
        }
    }
    impl EGlueKind for Schur {
        const NAME: &'static str = "element-wise multiplication";
        #[inline(always)]
        fn process<E: Scalar>(lhs: E, rhs: E) -> E {
            lhs.times(rhs)
        }
    }
    impl EGlueKind for Div {
        const NAME: &'static str = "element-wise division";
        #[inline(always)]
        fn process<E: Scalar>(lhs: E, rhs: E) -> E {
            lhs.over(rhs)
        }
    }
}

/// Elementwise binary node. The operands may have different element types, in which case both
/// are converted to the type given by their [`Promote`] rule before being combined.
pub struct EGlue<P1, P2, G> {
    lhs: P1,
    rhs: P2,
    __marker: PhantomData<G>,
}

impl<P1: Clone, P2: Clone, G> Clone for EGlue<P1, P2, G> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
            __marker: PhantomData,
        }
    }
}

impl<P1: Proxy, P2: Proxy, G: EGlueKind> EGlue<P1, P2, G>
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
        let lhs_dims = (lhs.nrows(), lhs.ncols());
        let rhs_dims = (rhs.nrows(), rhs.ncols());
        if lhs_dims != rhs_dims {
            return Err(DimensionMismatch::mat(G::NAME, lhs_dims, rhs_dims));
        }
        Ok(Self {
            lhs,
            rhs,
            __marker: PhantomData,
        })
    }
}

impl<P1: Proxy, P2: Proxy, G: EGlueKind> Proxy for EGlue<P1, P2, G>
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
    unsafe fn get_unchecked(&self, index: usize) -> Self::Elem {
        G::process(
            <P1::Elem as Promote<P2::Elem>>::promote_lhs(self.lhs.get_unchecked(index)),
            <P1::Elem as Promote<P2::Elem>>::promote_rhs(self.rhs.get_unchecked(index)),
        )
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> Self::Elem {
        G::process(
            <P1::Elem as Promote<P2::Elem>>::promote_lhs(self.lhs.at_unchecked(row, col)),
            <P1::Elem as Promote<P2::Elem>>::promote_rhs(self.rhs.at_unchecked(row, col)),
        )
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.lhs.is_alias(region) || self.rhs.is_alias(region)
    }
}

impl<P1: Proxy, P2: Proxy, G: EGlueKind> Expr for EGlue<P1, P2, G>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat};

    #[test]
    fn test_elementwise_kinds() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let b = mat![[4.0, 3.0], [2.0, 1.0f64]];
        assert_eq!((&a + &b).eval(), mat![[5.0, 5.0], [5.0, 5.0]]);
        assert_eq!((&a - &b).eval(), mat![[-3.0, -1.0], [1.0, 3.0]]);
        assert_eq!((&a % &b).eval(), mat![[4.0, 6.0], [6.0, 4.0]]);
        assert_eq!((&a / &b).eval(), mat![[0.25, 2.0 / 3.0], [1.5, 4.0]]);
    }

    #[test]
    fn test_mixed_element_types() {
        let a = mat![[1, 2], [3, 4i32]];
        let b = mat![[0.5, 0.5], [0.5, 0.5f64]];
        let c: Mat<f64> = (&a + &b).eval();
        assert_eq!(c, mat![[1.5, 2.5], [3.5, 4.5]]);

        let z = mat![[c64::new(0.0, 1.0)]];
        let w: Mat<c64> = (&z % &mat![[2.0f32]]).eval();
        assert_eq!(w, mat![[c64::new(0.0, 2.0)]]);
    }

    #[test]
    fn test_try_new_reports_mismatch() {
        let a = Mat::<f64>::zeros(2, 3);
        let b = Mat::<f64>::zeros(3, 2);
        let err = EGlue::<_, _, kind::Plus>::try_new(a.as_ref(), b.as_ref())
            .err()
            .map(|err| err.to_string());
        assert_eq!(
            err.as_deref(),
            Some("addition: incompatible matrix dimensions: 2x3 and 3x2"),
        );
    }

    #[test]
    #[should_panic(expected = "element-wise division: incompatible matrix dimensions: 1x2 and 2x1")]
    fn test_operator_panics_on_mismatch() {
        let a = Mat::<f64>::zeros(1, 2);
        let b = Mat::<f64>::zeros(2, 1);
        let _ = &a / &b;
    }

    #[test]
    fn test_strided_operand_switches_to_coordinate_access() {
        let a = Mat::from_fn(5, 4, |i, j| (10 * i + j) as i64);
        let b = Mat::from_fn(2, 2, |i, j| (i + j) as i64);
        let node = a.submatrix(1, 1, 2, 2) + &b;
        assert!(<EGlue<SubMatRef<'_, i64>, crate::MatRef<'_, i64>, kind::Plus> as Proxy>::PREFER_AT_ACCESSOR);
        assert_eq!(node.eval(), mat![[11, 13], [22, 24]]);
    }
}
