use super::*;
use crate::{
    error::assert_same_dims,
    mat::{MatMut, MatRef},
};
use reborrow::*;

/// Accessor owning a materialized matrix, produced by nodes that must be evaluated before being
/// consumed, and by owned matrices used as operands.
#[derive(Clone, Debug)]
pub struct MatProxy<E: Scalar> {
    mat: Mat<E>,
}

impl<E: Scalar> MatProxy<E> {
    /// Wraps an owned matrix.
    #[inline]
    pub fn new(mat: Mat<E>) -> Self {
        Self { mat }
    }

    /// Returns the wrapped matrix.
    #[inline]
    pub fn into_inner(self) -> Mat<E> {
        self.mat
    }
}

impl<E: Scalar> Proxy for MatProxy<E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = false;

    #[inline(always)]
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        *self.mat.as_ptr().add(index)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> E {
        self.mat.read_unchecked(row, col)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.mat.region().overlaps(region)
    }
    #[inline]
    fn as_strided(&self) -> Option<SubMatRef<'_, E>> {
        Some(self.mat.as_ref().as_submat())
    }
}

impl<E: Scalar> Proxy for MatRef<'_, E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = false;

    #[inline(always)]
    fn nrows(&self) -> usize {
        MatRef::nrows(self)
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        MatRef::ncols(self)
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        *self.as_ptr().add(index)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> E {
        self.read_unchecked(row, col)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
    #[inline]
    fn as_strided(&self) -> Option<SubMatRef<'_, E>> {
        Some(self.as_submat())
    }
}

impl<E: Scalar> Proxy for SubMatRef<'_, E> {
    type Elem = E;
    const PREFER_AT_ACCESSOR: bool = true;

    #[inline(always)]
    fn nrows(&self) -> usize {
        SubMatRef::nrows(self)
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        SubMatRef::ncols(self)
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> E {
        let nrows = SubMatRef::nrows(self);
        self.read_unchecked(index % nrows, index / nrows)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> E {
        self.read_unchecked(row, col)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.region().overlaps(region)
    }
    #[inline]
    fn as_strided(&self) -> Option<SubMatRef<'_, E>> {
        Some(*self)
    }
}

impl<'a, E: Scalar> Expr for MatRef<'a, E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

impl<'a, E: Scalar> Expr for SubMatRef<'a, E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

impl<E: Scalar> Expr for MatProxy<E> {
    type Elem = E;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }

    #[inline]
    #[track_caller]
    fn assign_to<D: Target<Elem = E>>(self, dst: &mut D) {
        dst.take_result(self.mat)
    }
}

impl<'a, E: Scalar> Expr for &'a Mat<E> {
    type Elem = E;
    type Proxy = MatRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> MatRef<'a, E> {
        self.as_ref()
    }
}

impl<E: Scalar> Expr for Mat<E> {
    type Elem = E;
    type Proxy = MatProxy<E>;

    #[inline(always)]
    fn into_proxy(self) -> MatProxy<E> {
        MatProxy::new(self)
    }

    #[inline]
    #[track_caller]
    fn assign_to<D: Target<Elem = E>>(self, dst: &mut D) {
        dst.take_result(self)
    }
}

impl<'a, E: Scalar> Expr for &'a MatMut<'_, E> {
    type Elem = E;
    type Proxy = MatRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> MatRef<'a, E> {
        self.rb()
    }
}

impl<'a, E: Scalar> Expr for &'a SubMatMut<'_, E> {
    type Elem = E;
    type Proxy = SubMatRef<'a, E>;

    #[inline(always)]
    fn into_proxy(self) -> SubMatRef<'a, E> {
        self.rb()
    }
}

impl<E: Scalar> Target for Mat<E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        Mat::region(self)
    }
    #[inline]
    fn view(&self) -> SubMatRef<'_, E> {
        self.as_ref().as_submat()
    }
    #[inline]
    fn target_mut(&mut self) -> SubMatMut<'_, E> {
        self.as_mut().into_submat()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize) {
        self.set_size(nrows, ncols);
    }
    #[inline]
    fn take_result(&mut self, result: Mat<E>) {
        *self = result;
    }
}

#[track_caller]
fn copy_result<E: Scalar>(dst: SubMatMut<'_, E>, result: &Mat<E>) {
    assert_same_dims(
        "copy into submatrix",
        (dst.nrows(), dst.ncols()),
        (result.nrows(), result.ncols()),
    );
    eval::eval_into(dst, &result.as_ref());
}

impl<E: Scalar> Target for MatMut<'_, E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        MatMut::region(self)
    }
    #[inline]
    fn view(&self) -> SubMatRef<'_, E> {
        self.rb().as_submat()
    }
    #[inline]
    fn target_mut(&mut self) -> SubMatMut<'_, E> {
        self.rb_mut().into_submat()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize) {
        assert_same_dims("copy into submatrix", self.dims(), (nrows, ncols));
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Mat<E>) {
        copy_result(self.target_mut(), &result);
    }
}

impl<E: Scalar> Target for SubMatMut<'_, E> {
    type Elem = E;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
    #[inline]
    fn region(&self) -> MemRegion {
        SubMatMut::region(self)
    }
    #[inline]
    fn view(&self) -> SubMatRef<'_, E> {
        self.rb()
    }
    #[inline]
    fn target_mut(&mut self) -> SubMatMut<'_, E> {
        self.rb_mut()
    }
    #[inline]
    #[track_caller]
    fn prepare(&mut self, nrows: usize, ncols: usize) {
        assert_same_dims("copy into submatrix", self.dims(), (nrows, ncols));
    }
    #[inline]
    #[track_caller]
    fn take_result(&mut self, result: Mat<E>) {
        copy_result(self.rb_mut(), &result);
    }
}
