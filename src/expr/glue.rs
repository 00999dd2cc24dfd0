//! Binary nodes that need both whole operands before producing any element of the result.

use super::*;
use crate::{
    error::{assert_same_dims, DimensionMismatch},
    get_global_parallelism,
    linalg::{lu, matmul},
    scalar::{Field, Promote},
};
use core::marker::PhantomData;
use reborrow::*;

/// Whole-matrix binary operation combining a left operand with elements `E1` and a right operand
/// with elements `E2`.
pub trait GlueKind<E1: Scalar, E2: Scalar>: crate::seal::Seal + 'static {
    /// Element type of the result.
    type Output: Scalar;

    /// Name of the operation, used in dimension mismatch messages.
    const NAME: &'static str;

    /// Dimensions of the result, or `None` if the operands are incompatible.
    fn dims(lhs: (usize, usize), rhs: (usize, usize)) -> Option<(usize, usize)>;

    /// Writes the result into `dst`, which has the dimensions returned by [`GlueKind::dims`] and
    /// does not overlap the operands.
    fn apply(dst: SubMatMut<'_, Self::Output>, lhs: SubMatRef<'_, E1>, rhs: SubMatRef<'_, E2>);

    /// Adds `beta` times the result to `dst` without a temporary, if the operation supports it.
    /// Returns `false` without touching `dst` otherwise.
    #[inline]
    fn accumulate(
        dst: SubMatMut<'_, Self::Output>,
        lhs: SubMatRef<'_, E1>,
        rhs: SubMatRef<'_, E2>,
        beta: Self::Output,
    ) -> bool {
        let _ = (dst, lhs, rhs, beta);
        false
    }
}

/// Operation tags for [`Glue`].
pub mod kind {
    use super::*;

    /// Matrix product.
    #[derive(Copy, Clone, Debug)]
    pub struct Times;
    /// Solution `X` of `A * X = B`.
    #[derive(Copy, Clone, Debug)]
    pub struct Solve;
    /// Vertical concatenation.
    #[derive(Copy, Clone, Debug)]
    pub struct JoinCols;
    /// Horizontal concatenation.
    #[derive(Copy, Clone, Debug)]
    pub struct JoinRows;

    impl<E1: Promote<E2>, E2: Scalar> GlueKind<E1, E2> for Times {
        type Output = E1::Output;
        const NAME: &'static str = "matrix multiplication";

        #[inline]
        fn dims(lhs: (usize, usize), rhs: (usize, usize)) -> Option<(usize, usize)> {
            (lhs.1 == rhs.0).then_some((lhs.0, rhs.1))
        }

        #[inline]
        fn apply(dst: SubMatMut<'_, E1::Output>, lhs: SubMatRef<'_, E1>, rhs: SubMatRef<'_, E2>) {
            matmul::matmul_mixed(
                dst,
                lhs,
                rhs,
                None,
                E1::Output::one(),
                get_global_parallelism(),
            );
        }

        #[inline]
        fn accumulate(
            dst: SubMatMut<'_, E1::Output>,
            lhs: SubMatRef<'_, E1>,
            rhs: SubMatRef<'_, E2>,
            beta: E1::Output,
        ) -> bool {
            matmul::matmul_mixed(
                dst,
                lhs,
                rhs,
                Some(E1::Output::one()),
                beta,
                get_global_parallelism(),
            );
            true
        }
    }

    impl<E: Field> GlueKind<E, E> for Solve {
        type Output = E;
        const NAME: &'static str = "solve";

        #[inline]
        fn dims(lhs: (usize, usize), rhs: (usize, usize)) -> Option<(usize, usize)> {
            (lhs.0 == lhs.1 && lhs.0 == rhs.0).then_some((lhs.1, rhs.1))
        }

        #[track_caller]
        fn apply(dst: SubMatMut<'_, E>, lhs: SubMatRef<'_, E>, rhs: SubMatRef<'_, E>) {
            match lu::solve(lhs, rhs) {
                Ok(sol) => eval::eval_into(dst, &sol.as_ref()),
                Err(err) => panic!("solve: {err}"),
            }
        }
    }

    impl<E: Scalar> GlueKind<E, E> for JoinCols {
        type Output = E;
        const NAME: &'static str = "join_cols";

        #[inline]
        fn dims(lhs: (usize, usize), rhs: (usize, usize)) -> Option<(usize, usize)> {
            if lhs.0 * lhs.1 == 0 {
                Some(rhs)
            } else if rhs.0 * rhs.1 == 0 {
                Some(lhs)
            } else {
                (lhs.1 == rhs.1).then_some((lhs.0 + rhs.0, lhs.1))
            }
        }

        fn apply(mut dst: SubMatMut<'_, E>, lhs: SubMatRef<'_, E>, rhs: SubMatRef<'_, E>) {
            let mut offset = 0;
            for part in [lhs, rhs] {
                if part.nrows() * part.ncols() == 0 {
                    continue;
                }
                let block = dst
                    .rb_mut()
                    .into_submatrix(offset, 0, part.nrows(), part.ncols());
                eval::eval_into(block, &part);
                offset += part.nrows();
            }
        }
    }

    impl<E: Scalar> GlueKind<E, E> for JoinRows {
        type Output = E;
        const NAME: &'static str = "join_rows";

        #[inline]
        fn dims(lhs: (usize, usize), rhs: (usize, usize)) -> Option<(usize, usize)> {
            if lhs.0 * lhs.1 == 0 {
                Some(rhs)
            } else if rhs.0 * rhs.1 == 0 {
                Some(lhs)
            } else {
                (lhs.0 == rhs.0).then_some((lhs.0, lhs.1 + rhs.1))
            }
        }

        fn apply(mut dst: SubMatMut<'_, E>, lhs: SubMatRef<'_, E>, rhs: SubMatRef<'_, E>) {
            let mut offset = 0;
            for part in [lhs, rhs] {
                if part.nrows() * part.ncols() == 0 {
                    continue;
                }
                let block = dst
                    .rb_mut()
                    .into_submatrix(0, offset, part.nrows(), part.ncols());
                eval::eval_into(block, &part);
                offset += part.ncols();
            }
        }
    }
}

/// Calls `f` with a strided view of `p`, materializing it first if it is not stored in memory.
#[inline]
fn with_strided<P: Proxy, R>(p: &P, f: impl FnOnce(SubMatRef<'_, P::Elem>) -> R) -> R {
    match p.as_strided() {
        Some(view) => f(view),
        None => {
            let tmp = eval::materialize(p);
            f(tmp.as_ref().as_submat())
        }
    }
}

/// Whole-matrix binary node.
///
/// When assigned to a destination that none of its operands overlap, the result is written
/// directly into the destination. Compound assignment of a product (`C += A * B`) accumulates
/// into the destination from within the product kernel.
pub struct Glue<P1, P2, G> {
    lhs: P1,
    rhs: P2,
    nrows: usize,
    ncols: usize,
    __marker: PhantomData<G>,
}

impl<P1: Proxy, P2: Proxy, G: GlueKind<P1::Elem, P2::Elem>> Glue<P1, P2, G> {
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
        let lhs_dims = (lhs.nrows(), lhs.ncols());
        let rhs_dims = (rhs.nrows(), rhs.ncols());
        match G::dims(lhs_dims, rhs_dims) {
            Some((nrows, ncols)) => Ok(Self {
                lhs,
                rhs,
                nrows,
                ncols,
                __marker: PhantomData,
            }),
            None => Err(DimensionMismatch::mat(G::NAME, lhs_dims, rhs_dims)),
        }
    }

    /// Number of rows of the result.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns of the result.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.lhs.is_alias(region) || self.rhs.is_alias(region)
    }

    #[track_caller]
    fn compute_into(&self, dst: SubMatMut<'_, G::Output>) {
        with_strided(&self.lhs, |lhs| {
            with_strided(&self.rhs, |rhs| G::apply(dst, lhs, rhs))
        })
    }

    #[track_caller]
    fn materialize(&self) -> Mat<G::Output> {
        let mut out = Mat::zeros(self.nrows, self.ncols);
        self.compute_into(out.as_mut().into_submat());
        out
    }
}

impl<P1: Proxy, P2: Proxy, G: GlueKind<P1::Elem, P2::Elem>> Expr for Glue<P1, P2, G> {
    type Elem = G::Output;
    type Proxy = MatProxy<G::Output>;

    #[inline]
    #[track_caller]
    fn into_proxy(self) -> MatProxy<G::Output> {
        MatProxy::new(self.materialize())
    }

    #[track_caller]
    fn assign_to<D: Target<Elem = G::Output>>(self, dst: &mut D) {
        if self.is_alias(dst.region()) {
            dst.take_result(self.materialize());
        } else {
            dst.prepare(self.nrows, self.ncols);
            self.compute_into(dst.target_mut());
        }
    }

    #[track_caller]
    fn apply_inplace<K: InplaceKind, D: Target<Elem = G::Output>>(self, dst: &mut D) {
        assert_same_dims(K::NAME, dst.dims(), (self.nrows, self.ncols));
        if !self.is_alias(dst.region()) {
            if let Some(beta) = K::gemm_beta::<G::Output>() {
                let target = dst.target_mut();
                let done = with_strided(&self.lhs, |lhs| {
                    with_strided(&self.rhs, |rhs| G::accumulate(target, lhs, rhs, beta))
                });
                if done {
                    return;
                }
            }
        }
        let tmp = MatProxy::new(self.materialize());
        eval::apply_inplace::<K, _>(dst.target_mut(), &tmp);
    }
}

/// Solution `X` of the square system `A * X = B`, computed with an LU decomposition with partial
/// pivoting.
///
/// # Panics
/// Panics if `A` is not square, if its dimensions do not match `B`, or if it is singular. See
/// [`try_solve`](crate::linalg::lu::try_solve) for the quiet variant.
#[inline]
#[track_caller]
pub fn solve<A: Expr, B: Expr<Elem = A::Elem>>(a: A, b: B) -> Glue<A::Proxy, B::Proxy, kind::Solve>
where
    A::Elem: Field,
{
    Glue::new(a.into_proxy(), b.into_proxy())
}

/// Stacks `top` above `bottom`. An empty operand is ignored.
#[inline]
#[track_caller]
pub fn join_cols<A: Expr, B: Expr<Elem = A::Elem>>(
    top: A,
    bottom: B,
) -> Glue<A::Proxy, B::Proxy, kind::JoinCols> {
    Glue::new(top.into_proxy(), bottom.into_proxy())
}

/// Places `left` beside `right`. An empty operand is ignored.
#[inline]
#[track_caller]
pub fn join_rows<A: Expr, B: Expr<Elem = A::Elem>>(
    left: A,
    right: B,
) -> Glue<A::Proxy, B::Proxy, kind::JoinRows> {
    Glue::new(left.into_proxy(), right.into_proxy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_product() {
        let a = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0f64]];
        let b = mat![[1.0, 0.0, 2.0], [0.0, 1.0, 3.0f64]];
        let c = (&a * &b).eval();
        assert_eq!(
            c,
            mat![[1.0, 2.0, 8.0], [3.0, 4.0, 18.0], [5.0, 6.0, 28.0]]
        );
    }

    #[test]
    fn test_mixed_product() {
        let a = mat![[1, 2], [3, 4i32]];
        let b = mat![[0.5], [0.25f64]];
        let c: Mat<f64> = (&a * &b).eval();
        assert_eq!(c, mat![[1.0], [2.5]]);
    }

    #[test]
    fn test_product_of_transposed_view() {
        let a = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0f64]];
        let ata = (a.t() * &a).eval();
        assert_eq!(ata, mat![[35.0, 44.0], [44.0, 56.0]]);
    }

    #[test]
    #[should_panic(expected = "matrix multiplication: incompatible matrix dimensions: 2x3 and 2x3")]
    fn test_product_dimension_mismatch() {
        let a = Mat::<f32>::zeros(2, 3);
        let _ = &a * &a;
    }

    #[test]
    fn test_product_assigned_to_an_operand() {
        // [[1, 1], [0, 1]] in column-major order
        let mut data = [1i64, 0, 1, 1];
        let ptr = data.as_mut_ptr();
        let lhs = unsafe { crate::mat::from_raw_parts(ptr as *const i64, 2, 2) };
        let mut dst = unsafe { crate::mat::from_raw_parts_mut(ptr, 2, 2) };
        dst.assign(lhs * lhs);
        assert_eq!(data, [1, 0, 2, 1]);
    }

    #[test]
    fn test_product_accumulates_into_destination() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let mut c = Mat::<f64>::ones(2, 2);
        c += &a * &a;
        assert_eq!(c, mat![[8.0, 11.0], [16.0, 23.0]]);
        c -= &a * &a;
        assert_eq!(c, Mat::ones(2, 2));
    }

    #[test]
    fn test_product_inside_elementwise_expression() {
        let a = mat![[2.0, 0.0], [0.0, 2.0f64]];
        let b = (&a * &a + 1.0).eval();
        assert_eq!(b, mat![[5.0, 1.0], [1.0, 5.0]]);
    }

    #[test]
    fn test_solve() {
        let a = mat![[3.0, 1.0], [1.0, 2.0f64]];
        let b = mat![[9.0], [8.0f64]];
        let x = solve(&a, &b).eval();
        assert_approx_eq!(x.read(0, 0), 2.0, 1e-14);
        assert_approx_eq!(x.read(1, 0), 3.0, 1e-14);
    }

    #[test]
    #[should_panic(expected = "solve: incompatible matrix dimensions: 2x2 and 3x1")]
    fn test_solve_dimension_mismatch() {
        let _ = solve(&Mat::<f64>::identity(2, 2), &Mat::<f64>::zeros(3, 1));
    }

    #[test]
    fn test_join() {
        let a = mat![[1, 2]];
        let b = mat![[3, 4], [5, 6]];
        assert_eq!(join_cols(&a, &b).eval(), mat![[1, 2], [3, 4], [5, 6]]);
        assert_eq!(join_rows(&b, a.t()).eval(), mat![[3, 4, 1], [5, 6, 2]]);
        assert_eq!(join_rows(&Mat::new(), &b).eval(), b);
        assert!(
            Glue::<_, _, kind::JoinCols>::try_new(Mat::<i32>::zeros(1, 3).as_ref(), b.as_ref())
                .is_err()
        );
    }
}
