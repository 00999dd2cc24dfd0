use super::{eval, Cube, CubeMut, CubeRef, SubCubeMut, SubCubeRef};
use crate::{
    error::DimensionMismatch,
    expr::{InplaceKind, MemRegion},
    Scalar,
};
use reborrow::*;

/// Uniform element accessor over a cube expression node.
///
/// The cube counterpart of [`Proxy`](crate::expr::Proxy), with a third coordinate.
pub trait CubeProxy {
    /// Element type produced by the node.
    type Elem: Scalar;

    /// Whether coordinate access is cheaper than flat access for this node.
    const PREFER_AT_ACCESSOR: bool;

    /// Number of rows of the result.
    fn nrows(&self) -> usize;
    /// Number of columns of the result.
    fn ncols(&self) -> usize;
    /// Number of slices of the result.
    fn nslices(&self) -> usize;
    /// Number of elements of the result.
    #[inline]
    fn n_elem(&self) -> usize {
        self.nrows() * self.ncols() * self.nslices()
    }

    /// Returns the element at flat index `index`.
    ///
    /// # Safety
    /// Requires `index < self.n_elem()`.
    unsafe fn get_unchecked(&self, index: usize) -> Self::Elem;

    /// Returns the element at `(row, col, slice)`.
    ///
    /// # Safety
    /// Requires every coordinate to be within bounds.
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> Self::Elem;

    /// Returns `true` if any memory read by the node overlaps `region`.
    fn is_alias(&self, region: MemRegion) -> bool;
}

/// Destination of a cube assignment.
pub trait CubeTarget {
    /// Element type of the destination.
    type Elem: Scalar;

    /// Current dimensions of the destination.
    fn dims(&self) -> (usize, usize, usize);
    /// Memory region written by an assignment.
    fn region(&self) -> MemRegion;
    /// Mutable strided view of the destination.
    fn target_mut(&mut self) -> SubCubeMut<'_, Self::Elem>;

    /// Makes the destination `nrows×ncols×nslices`, resizing it if possible, panicking
    /// otherwise.
    fn prepare(&mut self, nrows: usize, ncols: usize, nslices: usize);

    /// Replaces the contents of the destination with `result`, taking its storage if possible.
    fn take_result(&mut self, result: Cube<Self::Elem>);
}

/// Cube valued expression.
pub trait CubeExpr: Sized {
    /// Element type of the result.
    type Elem: Scalar;
    /// Accessor used to evaluate the expression.
    type Proxy: CubeProxy<Elem = Self::Elem>;

    /// Converts the expression into its accessor.
    fn into_proxy(self) -> Self::Proxy;

    /// Evaluates the expression into a new cube.
    #[inline]
    #[track_caller]
    fn eval(self) -> Cube<Self::Elem> {
        let mut out = Cube::new();
        self.assign_to(&mut out);
        out
    }

    /// Evaluates the expression into `dst`, through a temporary if it reads memory overlapping
    /// `dst`.
    #[track_caller]
    fn assign_to<D: CubeTarget<Elem = Self::Elem>>(self, dst: &mut D) {
        let src = self.into_proxy();
        if src.is_alias(dst.region()) {
            dst.take_result(eval::materialize(&src));
        } else {
            dst.prepare(src.nrows(), src.ncols(), src.nslices());
            eval::eval_into(dst.target_mut(), &src);
        }
    }

    /// Combines the expression into `dst` with the in-place operation `K`.
    ///
    /// # Panics
    /// Panics if the dimensions of the expression differ from those of `dst`.
    #[track_caller]
    fn apply_inplace<K: InplaceKind, D: CubeTarget<Elem = Self::Elem>>(self, dst: &mut D) {
        let src = self.into_proxy();
        check_dims(K::NAME, dst.dims(), (src.nrows(), src.ncols(), src.nslices()));
        if src.is_alias(dst.region()) {
            let tmp = eval::materialize(&src);
            eval::apply_inplace::<K, _>(dst.target_mut(), &tmp);
        } else {
            eval::apply_inplace::<K, _>(dst.target_mut(), &src);
        }
    }
}

#[track_caller]
pub(super) fn check_dims(
    op: &'static str,
    lhs: (usize, usize, usize),
    rhs: (usize, usize, usize),
) {
    if lhs != rhs {
        DimensionMismatch::cube(op, lhs, rhs).panic();
    }
}

impl<E: Scalar> CubeProxy for Cube<E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = false;

    #[inline(always)]
    fn nrows(&self) -> usize {
        Cube::nrows(self)
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        Cube::ncols(self)
    }
    #[inline(always)]
    fn nslices(&self) -> usize {
        Cube::nslices(self)
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        *self.as_slice().get_unchecked(index)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> E {
        self.read_unchecked(row, col, slice)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
}

impl<E: Scalar> CubeProxy for CubeRef<'_, E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = false;

    #[inline(always)]
    fn nrows(&self) -> usize {
        CubeRef::nrows(self)
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        CubeRef::ncols(self)
    }
    #[inline(always)]
    fn nslices(&self) -> usize {
        CubeRef::nslices(self)
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        *self.as_ptr().add(index)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> E {
        self.read_unchecked(row, col, slice)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
}

impl<E: Scalar> CubeProxy for SubCubeRef<'_, E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = true;

    #[inline(always)]
    fn nrows(&self) -> usize {
        SubCubeRef::nrows(self)
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        SubCubeRef::ncols(self)
    }
    #[inline(always)]
    fn nslices(&self) -> usize {
        SubCubeRef::nslices(self)
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        let nrows = SubCubeRef::nrows(self);
        let ncols = SubCubeRef::ncols(self);
        let (slice, rem) = (index / (nrows * ncols), index % (nrows * ncols));
        self.read_unchecked(rem % nrows, rem / nrows, slice)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize, slice: usize) -> E {
        self.read_unchecked(row, col, slice)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
}

impl<'a, E: Scalar> CubeExpr for CubeRef<'a, E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

impl<'a, E: Scalar> CubeExpr for SubCubeRef<'a, E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

impl<'a, E: Scalar> CubeExpr for &'a Cube<E> {
    type Elem = E;
    type Proxy = CubeRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> CubeRef<'a, E> {
        self.as_ref()
    }
}

impl<E: Scalar> CubeExpr for Cube<E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }

    #[inline]
    #[track_caller]
    fn assign_to<D: CubeTarget<Elem = E>>(self, dst: &mut D) {
        dst.take_result(self)
    }
}

impl<'a, E: Scalar> CubeExpr for &'a CubeMut<'_, E> {
    type Elem = E;
    type Proxy = CubeRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> CubeRef<'a, E> {
        self.rb()
    }
}

impl<'a, E: Scalar> CubeExpr for &'a SubCubeMut<'_, E> {
    type Elem = E;
    type Proxy = SubCubeRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> SubCubeRef<'a, E> {
        self.rb()
    }
}

impl<E: Scalar> CubeTarget for Cube<E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize, usize) {
        (self.nrows(), self.ncols(), self.nslices())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        Cube::region(self)
    }
    #[inline]
    fn target_mut(&mut self) -> SubCubeMut<'_, E> {
        self.as_mut().into_subcube()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        self.set_size(nrows, ncols, nslices);
    }
    #[inline]
    fn take_result(&mut self, result: Cube<E>) {
        *self = result;
    }
}

#[track_caller]
fn copy_result<E: Scalar>(dst: SubCubeMut<'_, E>, result: &Cube<E>) {
    check_dims(
        "copy into subcube",
        (dst.nrows(), dst.ncols(), dst.nslices()),
        (result.nrows(), result.ncols(), result.nslices()),
    );
    eval::eval_into(dst, &result.as_ref());
}

impl<E: Scalar> CubeTarget for CubeMut<'_, E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize, usize) {
        (self.nrows(), self.ncols(), self.nslices())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        CubeMut::region(self)
    }
    #[inline]
    fn target_mut(&mut self) -> SubCubeMut<'_, E> {
        self.rb_mut().into_subcube()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        check_dims("copy into subcube", self.dims(), (nrows, ncols, nslices));
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Cube<E>) {
        copy_result(self.target_mut(), &result);
    }
}

impl<E: Scalar> CubeTarget for SubCubeMut<'_, E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize, usize) {
        (self.nrows(), self.ncols(), self.nslices())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        SubCubeMut::region(self)
    }
    #[inline]
    fn target_mut(&mut self) -> SubCubeMut<'_, E> {
        self.rb_mut()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        check_dims("copy into subcube", self.dims(), (nrows, ncols, nslices));
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Cube<E>) {
        copy_result(self.rb_mut(), &result);
    }
}
