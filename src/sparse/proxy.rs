//! Lazily evaluated sparse expressions.
//!
//! A sparse expression is walked one column at a time: [`SpProxy::col`] returns an iterator over
//! the `(row, value)` pairs of the column, in increasing row order. Elementwise nodes combine the
//! column iterators of their operands, so that evaluating `&a + &b * 2.0` merges the columns of
//! `a` and `b` directly into the destination.
//!
//! Only operations mapping zero to zero are available as sparse nodes, since anything else would
//! produce a dense result.

use super::SpMat;
use crate::{
    error::DimensionMismatch,
    expr::{eglue, eop, EGlueKind, EOpKind, MemRegion},
    Promote, Scalar,
};
use core::{iter::Peekable, marker::PhantomData};

/// Elementwise unary operations allowed on sparse expressions.
///
/// The operations without an auxiliary scalar map zero to zero. The scalar ones only do so for
/// finite nonzero scalars, see [`SpEOp`].
pub trait SpEOpKind: EOpKind {}

impl SpEOpKind for eop::kind::Neg {}
impl SpEOpKind for eop::kind::ScalarTimes {}
impl SpEOpKind for eop::kind::ScalarDivPost {}
impl SpEOpKind for eop::kind::Square {}
impl SpEOpKind for eop::kind::Sqrt {}
impl SpEOpKind for eop::kind::Abs {}
impl SpEOpKind for eop::kind::Floor {}
impl SpEOpKind for eop::kind::Ceil {}
impl SpEOpKind for eop::kind::Round {}

/// Elementwise binary operations that map a pair of zeros to zero.
pub trait SpEGlueKind: EGlueKind {
    /// Whether the result is stored wherever either operand is (`true`), or only where both are
    /// (`false`).
    const UNION: bool;
}

impl SpEGlueKind for eglue::kind::Plus {
    const UNION: bool = true;
}
impl SpEGlueKind for eglue::kind::Minus {
    const UNION: bool = true;
}
impl SpEGlueKind for eglue::kind::Schur {
    const UNION: bool = false;
}

/// Column-wise accessor over a sparse expression node.
pub trait SpProxy {
    /// Element type produced by the node.
    type Elem: Scalar;
    /// Iterator over the `(row, value)` pairs of a column, in increasing row order.
    type ColIter<'a>: Iterator<Item = (usize, Self::Elem)>
    where
        Self: 'a;

    /// Number of rows of the result.
    fn nrows(&self) -> usize;
    /// Number of columns of the result.
    fn ncols(&self) -> usize;
    /// Estimate of the number of stored elements of the result, used to reserve storage.
    fn nnz_hint(&self) -> usize;

    /// Returns the elements of column `col`.
    ///
    /// # Panics
    /// Panics if `col >= self.ncols()`.
    fn col(&self, col: usize) -> Self::ColIter<'_>;

    /// Returns `true` if any memory read by the node overlaps `region`.
    fn is_alias(&self, region: MemRegion) -> bool;
}

/// Sparse matrix valued expression.
pub trait SpExpr: Sized {
    /// Element type of the result.
    type Elem: Scalar;
    /// Accessor used to evaluate the expression.
    type Proxy: SpProxy<Elem = Self::Elem>;

    /// Converts the expression into its accessor.
    fn into_proxy(self) -> Self::Proxy;

    /// Evaluates the expression into a new sparse matrix.
    #[inline]
    fn eval(self) -> SpMat<Self::Elem> {
        let mut out = SpMat::new(0, 0);
        fill(&mut out, &self.into_proxy());
        out
    }

    /// Evaluates the expression into `dst`, reusing its storage when the expression does not read
    /// it.
    fn assign_to(self, dst: &mut SpMat<Self::Elem>) {
        let src = self.into_proxy();
        if src.is_alias(dst.region()) {
            let mut out = SpMat::new(0, 0);
            fill(&mut out, &src);
            *dst = out;
        } else {
            fill(dst, &src);
        }
    }

    /// Calls `f` with the result of the expression, which is only evaluated into a new matrix
    /// when it is not one already.
    #[doc(hidden)]
    #[inline]
    fn __with_evaluated<R>(self, f: impl FnOnce(&SpMat<Self::Elem>) -> R) -> R {
        f(&self.eval())
    }
}

/// Overwrites `dst` with the result of `src`.
fn fill<P: SpProxy>(dst: &mut SpMat<P::Elem>, src: &P) {
    let (nrows, ncols) = (src.nrows(), src.ncols());
    dst.nrows = nrows;
    dst.ncols = ncols;
    dst.col_ptrs.clear();
    dst.col_ptrs.reserve(ncols + 1);
    dst.col_ptrs.push(0);
    dst.row_indices.clear();
    dst.values.clear();
    let hint = src.nnz_hint();
    dst.row_indices.reserve(hint);
    dst.values.reserve(hint);

    for col in 0..ncols {
        for (row, value) in src.col(col) {
            dst.row_indices.push(row);
            dst.values.push(value);
        }
        dst.col_ptrs.push(dst.row_indices.len());
    }
}

/// Iterator over the stored elements of a column of a [`SpMat`].
#[derive(Clone, Debug)]
pub struct ColEntries<'a, E> {
    rows: core::slice::Iter<'a, usize>,
    values: core::slice::Iter<'a, E>,
}

impl<E: Scalar> Iterator for ColEntries<'_, E> {
    type Item = (usize, E);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some((*self.rows.next()?, *self.values.next()?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<E: Scalar> SpMat<E> {
    #[inline]
    #[track_caller]
    fn col_entries(&self, col: usize) -> ColEntries<'_, E> {
        let range = self.col_range(col);
        ColEntries {
            rows: self.row_indices[range.clone()].iter(),
            values: self.values[range].iter(),
        }
    }
}

impl<E: Scalar> SpProxy for SpMat<E> {
    type Elem = E;
    type ColIter<'a> = ColEntries<'a, E> where Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }
    #[inline]
    fn nnz_hint(&self) -> usize {
        self.nnz()
    }
    #[inline]
    #[track_caller]
    fn col(&self, col: usize) -> ColEntries<'_, E> {
        self.col_entries(col)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
}

impl<'m, E: Scalar> SpProxy for &'m SpMat<E> {
    type Elem = E;
    type ColIter<'a> = ColEntries<'a, E> where Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }
    #[inline]
    fn nnz_hint(&self) -> usize {
        self.nnz()
    }
    #[inline]
    #[track_caller]
    fn col(&self, col: usize) -> ColEntries<'_, E> {
        self.col_entries(col)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
}

impl<E: Scalar> SpExpr for SpMat<E> {
    type Elem = E;
    type Proxy = Self;

    #[inline]
    fn into_proxy(self) -> Self {
        self
    }

    #[inline]
    fn eval(self) -> SpMat<E> {
        self
    }

    #[inline]
    fn assign_to(self, dst: &mut SpMat<E>) {
        *dst = self;
    }

    #[inline]
    fn __with_evaluated<R>(self, f: impl FnOnce(&SpMat<E>) -> R) -> R {
        f(&self)
    }
}

impl<'m, E: Scalar> SpExpr for &'m SpMat<E> {
    type Elem = E;
    type Proxy = Self;

    #[inline]
    fn into_proxy(self) -> Self {
        self
    }

    #[inline]
    fn __with_evaluated<R>(self, f: impl FnOnce(&SpMat<E>) -> R) -> R {
        f(self)
    }
}

/// Elementwise unary sparse node. Computed zeros are dropped from the result.
///
/// When the operation maps zero to a nonzero value for the given auxiliary scalar (e.g. `x / 0.0`
/// or `x * inf`, which both turn zero into NaN), every element of the result is computed,
/// including the unstored ones, so that the result matches the dense one.
pub struct SpEOp<P: SpProxy, O> {
    inner: P,
    aux: P::Elem,
    fill: P::Elem,
    __marker: PhantomData<O>,
}

impl<P: SpProxy, O: SpEOpKind> SpEOp<P, O> {
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
            fill: O::process(P::Elem::zero(), aux),
            __marker: PhantomData,
        }
    }

    /// Returns `true` if the unstored elements of the operand stay zero in the result.
    #[inline]
    pub fn preserves_zeros(&self) -> bool {
        self.fill == P::Elem::zero()
    }
}

/// Column iterator of [`SpEOp`].
pub struct SpEOpCol<I: Iterator, E, O> {
    inner: Peekable<I>,
    aux: E,
    // value of the unstored elements, `None` if it is zero
    fill: Option<E>,
    row: usize,
    nrows: usize,
    __marker: PhantomData<O>,
}

impl<I: Iterator<Item = (usize, E)>, E: Scalar, O: SpEOpKind> Iterator for SpEOpCol<I, E, O> {
    type Item = (usize, E);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Some(fill) = self.fill else {
            loop {
                let (row, x) = self.inner.next()?;
                let value = O::process(x, self.aux);
                if value != E::zero() {
                    return Some((row, value));
                }
            }
        };

        while self.row < self.nrows {
            let row = self.row;
            self.row += 1;
            let value = match self.inner.peek() {
                Some(&(stored, x)) if stored == row => {
                    self.inner.next();
                    O::process(x, self.aux)
                }
                _ => fill,
            };
            if value != E::zero() {
                return Some((row, value));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.fill {
            None => (0, self.inner.size_hint().1),
            Some(_) => (0, Some(self.nrows - self.row)),
        }
    }
}

impl<P: SpProxy, O: SpEOpKind> SpProxy for SpEOp<P, O> {
    type Elem = P::Elem;
    type ColIter<'a> = SpEOpCol<P::ColIter<'a>, P::Elem, O> where Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
    #[inline]
    fn nnz_hint(&self) -> usize {
        if self.preserves_zeros() {
            self.inner.nnz_hint()
        } else {
            self.nrows().saturating_mul(self.ncols())
        }
    }
    #[inline]
    fn col(&self, col: usize) -> Self::ColIter<'_> {
        SpEOpCol {
            inner: self.inner.col(col).peekable(),
            aux: self.aux,
            fill: if self.preserves_zeros() {
                None
            } else {
                Some(self.fill)
            },
            row: 0,
            nrows: self.inner.nrows(),
            __marker: PhantomData,
        }
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.inner.is_alias(region)
    }
}

impl<P: SpProxy, O: SpEOpKind> SpExpr for SpEOp<P, O> {
    type Elem = P::Elem;
    type Proxy = Self;

    #[inline]
    fn into_proxy(self) -> Self {
        self
    }
}

/// Elementwise binary sparse node, promoting its operands like [`EGlue`](crate::expr::EGlue).
/// Computed zeros are dropped from the result.
pub struct SpGlue<P1, P2, G> {
    lhs: P1,
    rhs: P2,
    __marker: PhantomData<G>,
}

impl<P1: SpProxy, P2: SpProxy, G: SpEGlueKind> SpGlue<P1, P2, G>
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

/// Column iterator of [`SpGlue`], merging the columns of both operands.
pub struct SpGlueCol<I1: Iterator, I2: Iterator, G> {
    lhs: Peekable<I1>,
    rhs: Peekable<I2>,
    __marker: PhantomData<G>,
}

impl<I1, I2, E1, E2, G> Iterator for SpGlueCol<I1, I2, G>
where
    I1: Iterator<Item = (usize, E1)>,
    I2: Iterator<Item = (usize, E2)>,
    E1: Promote<E2>,
    E2: Scalar,
    G: SpEGlueKind,
{
    type Item = (usize, E1::Output);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let lhs_row = self.lhs.peek().map(|&(row, _)| row);
            let rhs_row = self.rhs.peek().map(|&(row, _)| row);
            let (row, take_lhs, take_rhs) = match (lhs_row, rhs_row) {
                (None, None) => return None,
                (Some(i), None) => (i, true, false),
                (None, Some(j)) => (j, false, true),
                (Some(i), Some(j)) => (Ord::min(i, j), i <= j, j <= i),
            };

            let lhs = if take_lhs { self.lhs.next() } else { None };
            let rhs = if take_rhs { self.rhs.next() } else { None };
            if !G::UNION && !(take_lhs && take_rhs) {
                continue;
            }

            let x = lhs.map_or(E1::Output::zero(), |(_, x)| E1::promote_lhs(x));
            let y = rhs.map_or(E1::Output::zero(), |(_, y)| E1::promote_rhs(y));
            let value = G::process(x, y);
            if value != E1::Output::zero() {
                return Some((row, value));
            }
        }
    }
}

impl<P1: SpProxy, P2: SpProxy, G: SpEGlueKind> SpProxy for SpGlue<P1, P2, G>
where
    P1::Elem: Promote<P2::Elem>,
{
    type Elem = <P1::Elem as Promote<P2::Elem>>::Output;
    type ColIter<'a> = SpGlueCol<P1::ColIter<'a>, P2::ColIter<'a>, G> where Self: 'a;

    #[inline]
    fn nrows(&self) -> usize {
        self.lhs.nrows()
    }
    #[inline]
    fn ncols(&self) -> usize {
        self.lhs.ncols()
    }
    #[inline]
    fn nnz_hint(&self) -> usize {
        if G::UNION {
            self.lhs.nnz_hint() + self.rhs.nnz_hint()
        } else {
            Ord::min(self.lhs.nnz_hint(), self.rhs.nnz_hint())
        }
    }
    #[inline]
    fn col(&self, col: usize) -> Self::ColIter<'_> {
        SpGlueCol {
            lhs: self.lhs.col(col).peekable(),
            rhs: self.rhs.col(col).peekable(),
            __marker: PhantomData,
        }
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.lhs.is_alias(region) || self.rhs.is_alias(region)
    }
}

impl<P1: SpProxy, P2: SpProxy, G: SpEGlueKind> SpExpr for SpGlue<P1, P2, G>
where
    P1::Elem: Promote<P2::Elem>,
{
    type Elem = <P1::Elem as Promote<P2::Elem>>::Output;
    type Proxy = Self;

    #[inline]
    fn into_proxy(self) -> Self {
        self
    }
}

macro_rules! sp_eop_fns {
    ($($(#[$attr: meta])* $name: ident => $kind: ident;)*) => {$(
        $(#[$attr])*
        #[inline]
        pub fn $name<X: SpExpr>(x: X) -> SpEOp<X::Proxy, eop::kind::$kind> {
            SpEOp::new(x.into_proxy())
        }
    )*};
}

sp_eop_fns! {
    /// Elementwise square of a sparse expression.
    square => Square;
    /// Elementwise square root of a sparse expression.
    sqrt => Sqrt;
    /// Elementwise absolute value of a sparse expression.
    abs => Abs;
    /// Elementwise rounding towards negative infinity of a sparse expression.
    floor => Floor;
    /// Elementwise rounding towards positive infinity of a sparse expression.
    ceil => Ceil;
    /// Elementwise rounding to the nearest integer of a sparse expression.
    round => Round;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat, Expr, Mat};

    #[test]
    fn test_union_and_intersection() {
        let a = SpMat::from_dense(&mat![[1.0, 0.0, 2.0], [0.0, 3.0, 0.0f64]]);
        let b = SpMat::from_dense(&mat![[-1.0, 4.0, 0.0], [0.0, 5.0, 6.0f64]]);

        let sum = SpGlue::<_, _, eglue::kind::Plus>::new(&a, &b).eval();
        // the computed zero at (0, 0) is not stored
        assert_eq!(sum.col_ptrs(), &[0, 0, 2, 4]);
        assert_eq!(sum.to_dense(), mat![[0.0, 4.0, 2.0], [0.0, 8.0, 6.0]]);

        let prod = SpGlue::<_, _, eglue::kind::Schur>::new(&a, &b).eval();
        assert_eq!(prod.nnz(), 2);
        assert_eq!(prod.to_dense(), mat![[-1.0, 0.0, 0.0], [0.0, 15.0, 0.0]]);
    }

    #[test]
    fn test_unary_drops_zeros() {
        let a = SpMat::from_dense(&mat![[0.25, -2.0], [1.5, 0.0f64]]);
        let r = round(&a).eval();
        assert_eq!(r.nnz(), 2);
        assert_eq!(r.to_dense(), mat![[0.0, -2.0], [2.0, 0.0]]);
        assert_eq!(abs(&a).eval().read(0, 1), 2.0);
        assert_eq!(square(sqrt(abs(&a))).eval().read(0, 0), 0.25);
    }

    #[test]
    fn test_promotion() {
        let a = SpMat::from_dense(&mat![[1i32, 0], [0, 2]]);
        let zero = c64::new(0.0, 0.0);
        let b = SpMat::from_dense(&mat![[c64::new(0.0, 1.0), c64::new(3.0, 0.0)], [zero, zero]]);
        let r = SpGlue::<_, _, eglue::kind::Minus>::new(&a, &b).eval();
        assert_eq!(
            r.to_dense(),
            Mat::from_fn(2, 2, |i, j| match (i, j) {
                (0, 0) => c64::new(1.0, -1.0),
                (0, 1) => c64::new(-3.0, 0.0),
                (1, 1) => c64::new(2.0, 0.0),
                _ => c64::new(0.0, 0.0),
            })
        );
    }

    #[test]
    fn test_assign_reuses_destination() {
        let a = SpMat::<i64>::identity(3, 3);
        let mut dst = SpMat::<i64>::new(1, 1);
        SpEOp::<_, eop::kind::ScalarTimes>::with_aux(&a, 4).assign_to(&mut dst);
        assert_eq!(dst.dims(), (3, 3));
        assert_eq!(dst.values(), &[4, 4, 4]);
    }

    fn same_elements(sparse: &SpMat<f64>, dense: &Mat<f64>) -> bool {
        let sparse = sparse.to_dense();
        (sparse.nrows(), sparse.ncols()) == (dense.nrows(), dense.ncols())
            && sparse
                .as_slice()
                .iter()
                .zip(dense.as_slice())
                .all(|(&x, &y)| x == y || (x.is_nan() && y.is_nan()))
    }

    #[test]
    fn test_scalar_ops_that_do_not_preserve_zeros() {
        let dense = mat![[1.0, 0.0], [0.0, -2.0], [0.0, 0.0f64]];
        let a = SpMat::from_dense(&dense);

        let by_zero = SpEOp::<_, eop::kind::ScalarDivPost>::with_aux(&a, 0.0);
        assert!(!by_zero.preserves_zeros());
        let r = by_zero.eval();
        assert_eq!(r.nnz(), 6);
        assert!(same_elements(&r, &(&dense / 0.0f64).eval()));
        assert_eq!(r.read(0, 0), f64::INFINITY);
        assert!(r.read(2, 1).is_nan());

        let by_inf = SpEOp::<_, eop::kind::ScalarTimes>::with_aux(&a, f64::INFINITY).eval();
        assert!(same_elements(&by_inf, &(&dense * f64::INFINITY).eval()));
        assert_eq!(by_inf.read(1, 1), f64::NEG_INFINITY);

        let finite = SpEOp::<_, eop::kind::ScalarDivPost>::with_aux(&a, 4.0);
        assert!(finite.preserves_zeros());
        assert_eq!(finite.eval().nnz(), 2);

        // integer division by zero yields zero
        let b = SpMat::from_dense(&mat![[3i32, 0], [0, 1]]);
        let r = SpEOp::<_, eop::kind::ScalarDivPost>::with_aux(&b, 0).eval();
        assert_eq!(r.nnz(), 0);
    }

    #[test]
    #[should_panic(expected = "addition: incompatible matrix dimensions: 2x2 and 2x3")]
    fn test_mismatch() {
        let a = SpMat::<f32>::new(2, 2);
        let b = SpMat::<f32>::new(2, 3);
        let _ = SpGlue::<_, _, eglue::kind::Plus>::new(&a, &b);
    }
}
