//! Dense three-dimensional arrays.
//!
//! A [`Cube`] is a stack of `nslices` matrices of dimension `nrows×ncols`, stored one after the
//! other in column-major order: element `(i, j, k)` lives at offset
//! `i + j * nrows + k * nrows * ncols`. Every slice is therefore a contiguous matrix, see
//! [`Cube::slice`].
//!
//! Cubes have their own expression nodes and accessor trait ([`CubeProxy`]), mirroring the
//! matrix ones, with the same flat or coordinate evaluation and the same alias handling on
//! assignment:
//! - [`EOpCube`] and [`EGlueCube`] are elementwise and fuse into the evaluation loop,
//! - [`OpCube`] ([`sum`], [`mean`]) and [`GlueCube`] ([`join_slices`]) produce their whole
//!   result at once, directly into the destination unless it overlaps an operand.

use crate::{
    expr::MemRegion,
    mat::{MatMut, MatRef, SubMatMut, SubMatRef},
    Scalar,
};
use core::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
    ptr::NonNull,
};
use reborrow::*;
use smallvec::SmallVec;

pub mod eval;
mod expr;
pub mod glue;
pub mod op;
mod ops;
mod proxy;

pub use expr::{abs, ceil, exp, floor, log, pow, round, sqrt, square, EGlueCube, EOpCube};
pub use glue::{join_slices, GlueCube, GlueCubeKind};
pub use op::{mean, sum, OpCube, OpCubeKind};
pub use proxy::{CubeExpr, CubeProxy, CubeTarget};

/// Number of elements stored inline in a [`Cube`] before falling back to a heap allocation.
pub const CUBE_INLINE_CAPACITY: usize = 64;

#[derive(Debug)]
struct CubeImpl<E> {
    ptr: NonNull<E>,
    nrows: usize,
    ncols: usize,
    nslices: usize,
    row_stride: isize,
    col_stride: isize,
    slice_stride: isize,
}

unsafe impl<E: Sync> Sync for CubeImpl<E> {}
unsafe impl<E: Sync> Send for CubeImpl<E> {}

impl<E> Copy for CubeImpl<E> {}
impl<E> Clone for CubeImpl<E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> CubeImpl<E> {
    #[inline(always)]
    fn contiguous(ptr: *mut E, nrows: usize, ncols: usize, nslices: usize) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            nrows,
            ncols,
            nslices,
            row_stride: 1,
            col_stride: nrows as isize,
            slice_stride: (nrows * ncols) as isize,
        }
    }

    #[inline(always)]
    fn ptr_at(self, row: usize, col: usize, slice: usize) -> *mut E {
        self.ptr
            .as_ptr()
            .wrapping_offset(row as isize * self.row_stride)
            .wrapping_offset(col as isize * self.col_stride)
            .wrapping_offset(slice as isize * self.slice_stride)
    }

    #[inline]
    fn is_contiguous(self) -> bool {
        self.row_stride == 1
            && (self.ncols <= 1 || self.col_stride == self.nrows as isize)
            && (self.nslices <= 1 || self.slice_stride == (self.nrows * self.ncols) as isize)
    }

    #[inline]
    #[track_caller]
    fn subcube(
        self,
        row_start: usize,
        col_start: usize,
        slice_start: usize,
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> Self {
        equator::assert!(all(
            row_start <= self.nrows,
            col_start <= self.ncols,
            slice_start <= self.nslices,
            nrows <= self.nrows - row_start,
            ncols <= self.ncols - col_start,
            nslices <= self.nslices - slice_start,
        ));
        Self {
            ptr: unsafe { NonNull::new_unchecked(self.ptr_at(row_start, col_start, slice_start)) },
            nrows,
            ncols,
            nslices,
            ..self
        }
    }

    #[inline]
    #[track_caller]
    fn slice(self, slice: usize) -> (*mut E, usize, usize, isize, isize) {
        equator::assert!(slice < self.nslices);
        (
            self.ptr_at(0, 0, slice),
            self.nrows,
            self.ncols,
            self.row_stride,
            self.col_stride,
        )
    }

    // strides are never negative for cube views
    #[inline]
    fn region(self) -> MemRegion {
        if self.nrows == 0 || self.ncols == 0 || self.nslices == 0 {
            return MemRegion::EMPTY;
        }
        let last = (self.nrows - 1) as isize * self.row_stride
            + (self.ncols - 1) as isize * self.col_stride
            + (self.nslices - 1) as isize * self.slice_stride;
        MemRegion::contiguous(self.ptr.as_ptr() as *const E, last as usize + 1)
    }
}

/// Heap allocated (or inline, for small sizes) resizable cube, stored slice after slice in
/// column-major order.
#[derive(Clone)]
pub struct Cube<E: Scalar> {
    data: SmallVec<[E; CUBE_INLINE_CAPACITY]>,
    nrows: usize,
    ncols: usize,
    nslices: usize,
}

#[track_caller]
fn checked_len(nrows: usize, ncols: usize, nslices: usize) -> usize {
    match nrows
        .checked_mul(ncols)
        .and_then(|len| len.checked_mul(nslices))
    {
        Some(len) => len,
        None => panic!("requested cube size is too large"),
    }
}

impl<E: Scalar> Default for Cube<E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Scalar> Cube<E> {
    /// Returns an empty cube of dimension `0×0×0`.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: SmallVec::new(),
            nrows: 0,
            ncols: 0,
            nslices: 0,
        }
    }

    /// Returns a new cube with the given dimensions, filled with zeros.
    #[inline]
    #[track_caller]
    pub fn zeros(nrows: usize, ncols: usize, nslices: usize) -> Self {
        Self::full(nrows, ncols, nslices, E::zero())
    }

    /// Returns a new cube with the given dimensions, filled with ones.
    #[inline]
    #[track_caller]
    pub fn ones(nrows: usize, ncols: usize, nslices: usize) -> Self {
        Self::full(nrows, ncols, nslices, E::one())
    }

    /// Returns a new cube with the given dimensions, filled with `value`.
    #[track_caller]
    pub fn full(nrows: usize, ncols: usize, nslices: usize, value: E) -> Self {
        let len = checked_len(nrows, ncols, nslices);
        Self {
            data: SmallVec::from_elem(value, len),
            nrows,
            ncols,
            nslices,
        }
    }

    /// Returns a new cube with the given dimensions, filled with the provided function, called
    /// as `f(row, col, slice)`.
    #[track_caller]
    pub fn from_fn(
        nrows: usize,
        ncols: usize,
        nslices: usize,
        mut f: impl FnMut(usize, usize, usize) -> E,
    ) -> Self {
        let len = checked_len(nrows, ncols, nslices);
        let mut data = SmallVec::with_capacity(len);
        for k in 0..nslices {
            for j in 0..ncols {
                for i in 0..nrows {
                    data.push(f(i, j, k));
                }
            }
        }
        Self {
            data,
            nrows,
            ncols,
            nslices,
        }
    }

    /// Returns a new cube holding a copy of `slice`, interpreted in column-major order, slice
    /// after slice.
    ///
    /// # Panics
    /// Panics if `slice.len() != nrows * ncols * nslices`.
    #[track_caller]
    pub fn from_column_major_slice(
        slice: &[E],
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> Self {
        equator::assert!(slice.len() == checked_len(nrows, ncols, nslices));
        Self {
            data: SmallVec::from_slice(slice),
            nrows,
            ncols,
            nslices,
        }
    }

    /// Returns the number of rows of the cube.
    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns of the cube.
    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the number of slices of the cube.
    #[inline(always)]
    pub fn nslices(&self) -> usize {
        self.nslices
    }

    /// Returns the number of elements of the cube.
    #[inline(always)]
    pub fn n_elem(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the elements are stored inline or on the heap.
    #[inline]
    pub fn mem_state(&self) -> crate::mat::MemState {
        if self.data.spilled() {
            crate::mat::MemState::Heap
        } else {
            crate::mat::MemState::Inline
        }
    }

    /// Changes the dimensions of the cube without preserving its contents.
    ///
    /// Nothing happens when the dimensions already match, and the storage is reused as is when
    /// the number of elements stays the same. Otherwise the new elements are zero-initialized.
    #[track_caller]
    pub fn set_size(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        if (nrows, ncols, nslices) == (self.nrows, self.ncols, self.nslices) {
            return;
        }
        let len = checked_len(nrows, ncols, nslices);
        if len != self.data.len() {
            self.data.clear();
            self.data.resize(len, E::zero());
        }
        self.nrows = nrows;
        self.ncols = ncols;
        self.nslices = nslices;
    }

    /// Changes the dimensions of the cube to match those of `other`.
    #[inline]
    pub fn copy_size<F: Scalar>(&mut self, other: &Cube<F>) {
        self.set_size(other.nrows, other.ncols, other.nslices);
    }

    /// Sets the dimensions to `0×0×0` and releases the storage.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Resizes the cube and fills it with zeros.
    #[inline]
    #[track_caller]
    pub fn set_zeros(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        self.set_size(nrows, ncols, nslices);
        self.fill(E::zero());
    }

    /// Resizes the cube and fills it with ones.
    #[inline]
    #[track_caller]
    pub fn set_ones(&mut self, nrows: usize, ncols: usize, nslices: usize) {
        self.set_size(nrows, ncols, nslices);
        self.fill(E::one());
    }

    /// Fills the cube with `value`.
    #[inline]
    pub fn fill(&mut self, value: E) {
        for x in self.data.iter_mut() {
            *x = value;
        }
    }

    #[inline(always)]
    fn offset(&self, row: usize, col: usize, slice: usize) -> usize {
        row + self.nrows * (col + self.ncols * slice)
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize, slice: usize) -> E {
        equator::assert!(all(row < self.nrows, col < self.ncols, slice < self.nslices));
        self.data[self.offset(row, col, slice)]
    }

    /// Reads the value of the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Requires `row < self.nrows()`, `col < self.ncols()` and `slice < self.nslices()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, row: usize, col: usize, slice: usize) -> E {
        *self.data.get_unchecked(self.offset(row, col, slice))
    }

    /// Writes `value` to the element at the given indices.
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, slice: usize, value: E) {
        equator::assert!(all(row < self.nrows, col < self.ncols, slice < self.nslices));
        let offset = self.offset(row, col, slice);
        self.data[offset] = value;
    }

    /// Returns a pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const E {
        self.data.as_ptr()
    }

    /// Returns a mutable pointer to the first element.
    #[inline]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.data.as_mut_ptr()
    }

    /// Returns the elements in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    /// Returns the elements in storage order.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        &mut self.data
    }

    /// Returns a view over the cube.
    #[inline]
    pub fn as_ref(&self) -> CubeRef<'_, E> {
        unsafe { from_raw_parts(self.as_ptr(), self.nrows, self.ncols, self.nslices) }
    }

    /// Returns a mutable view over the cube.
    #[inline]
    pub fn as_mut(&mut self) -> CubeMut<'_, E> {
        let (nrows, ncols, nslices) = (self.nrows, self.ncols, self.nslices);
        unsafe { from_raw_parts_mut(self.as_ptr_mut(), nrows, ncols, nslices) }
    }

    /// Returns slice `k` as a matrix.
    ///
    /// # Panics
    /// Panics if `k >= self.nslices()`.
    #[inline]
    #[track_caller]
    pub fn slice(&self, k: usize) -> MatRef<'_, E> {
        self.as_ref().slice(k)
    }

    /// Returns slice `k` as a mutable matrix.
    ///
    /// # Panics
    /// Panics if `k >= self.nslices()`.
    #[inline]
    #[track_caller]
    pub fn slice_mut(&mut self, k: usize) -> MatMut<'_, E> {
        self.as_mut().into_slice(k)
    }

    /// Returns a view over the subcube starting at `(row_start, col_start, slice_start)` with the
    /// given dimensions.
    #[inline]
    #[track_caller]
    pub fn subcube(
        &self,
        row_start: usize,
        col_start: usize,
        slice_start: usize,
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> SubCubeRef<'_, E> {
        self.as_ref()
            .as_subcube()
            .subcube(row_start, col_start, slice_start, nrows, ncols, nslices)
    }

    /// Returns a mutable view over the subcube starting at `(row_start, col_start, slice_start)`
    /// with the given dimensions.
    #[inline]
    #[track_caller]
    pub fn subcube_mut(
        &mut self,
        row_start: usize,
        col_start: usize,
        slice_start: usize,
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> SubCubeMut<'_, E> {
        self.as_mut()
            .into_subcube()
            .into_subcube(row_start, col_start, slice_start, nrows, ncols, nslices)
    }

    /// Evaluates the expression into `self`, resizing it as needed.
    #[inline]
    #[track_caller]
    pub fn assign<X: CubeExpr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }

    /// Returns the memory region covered by the cube storage.
    #[inline]
    pub fn region(&self) -> MemRegion {
        MemRegion::contiguous(self.as_ptr(), self.n_elem())
    }
}

impl<E: Scalar> Index<(usize, usize, usize)> for Cube<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, (row, col, slice): (usize, usize, usize)) -> &E {
        equator::assert!(all(row < self.nrows, col < self.ncols, slice < self.nslices));
        &self.data[self.offset(row, col, slice)]
    }
}

impl<E: Scalar> IndexMut<(usize, usize, usize)> for Cube<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, (row, col, slice): (usize, usize, usize)) -> &mut E {
        equator::assert!(all(row < self.nrows, col < self.ncols, slice < self.nslices));
        let offset = self.offset(row, col, slice);
        &mut self.data[offset]
    }
}

impl<E: Scalar> Index<usize> for Cube<E> {
    type Output = E;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &E {
        &self.data[index]
    }
}

impl<E: Scalar> IndexMut<usize> for Cube<E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut E {
        &mut self.data[index]
    }
}

impl<E: Scalar> PartialEq for Cube<E> {
    fn eq(&self, other: &Self) -> bool {
        (self.nrows, self.ncols, self.nslices) == (other.nrows, other.ncols, other.nslices)
            && self.data == other.data
    }
}

impl<E: Scalar> fmt::Debug for Cube<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for k in 0..self.nslices {
            list.entry(&self.slice(k));
        }
        list.finish()
    }
}

/// Immutable view over a contiguous cube.
pub struct CubeRef<'a, E> {
    inner: CubeImpl<E>,
    __marker: PhantomData<&'a E>,
}

/// Mutable view over a contiguous cube.
pub struct CubeMut<'a, E> {
    inner: CubeImpl<E>,
    __marker: PhantomData<&'a mut E>,
}

/// Immutable view over a cube with arbitrary strides, such as a subcube.
///
/// Elementwise expressions containing such a view are evaluated with coordinate access.
pub struct SubCubeRef<'a, E> {
    inner: CubeImpl<E>,
    __marker: PhantomData<&'a E>,
}

/// Mutable view over a cube with arbitrary strides.
pub struct SubCubeMut<'a, E> {
    inner: CubeImpl<E>,
    __marker: PhantomData<&'a mut E>,
}

impl<E> Copy for CubeRef<'_, E> {}
impl<E> Clone for CubeRef<'_, E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for SubCubeRef<'_, E> {}
impl<E> Clone for SubCubeRef<'_, E> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<'short, E> Reborrow<'short> for CubeMut<'_, E> {
    type Target = CubeRef<'short, E>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        CubeRef {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'short, E> ReborrowMut<'short> for CubeMut<'_, E> {
    type Target = CubeMut<'short, E>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        CubeMut {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'short, E> Reborrow<'short> for SubCubeMut<'_, E> {
    type Target = SubCubeRef<'short, E>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        SubCubeRef {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

impl<'short, E> ReborrowMut<'short> for SubCubeMut<'_, E> {
    type Target = SubCubeMut<'short, E>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        SubCubeMut {
            inner: self.inner,
            __marker: PhantomData,
        }
    }
}

macro_rules! impl_dims {
    ($ty: ident) => {
        impl<'a, E: Scalar> $ty<'a, E> {
            /// Returns the number of rows of the cube.
            #[inline(always)]
            pub fn nrows(&self) -> usize {
                self.inner.nrows
            }

            /// Returns the number of columns of the cube.
            #[inline(always)]
            pub fn ncols(&self) -> usize {
                self.inner.ncols
            }

            /// Returns the number of slices of the cube.
            #[inline(always)]
            pub fn nslices(&self) -> usize {
                self.inner.nslices
            }

            /// Returns the number of elements of the cube.
            #[inline(always)]
            pub fn n_elem(&self) -> usize {
                self.inner.nrows * self.inner.ncols * self.inner.nslices
            }

            /// Reads the value of the element at the given indices.
            ///
            /// # Panics
            /// Panics if any index is out of bounds.
            #[inline]
            #[track_caller]
            pub fn read(&self, row: usize, col: usize, slice: usize) -> E {
                equator::assert!(all(
                    row < self.nrows(),
                    col < self.ncols(),
                    slice < self.nslices(),
                ));
                unsafe { self.read_unchecked(row, col, slice) }
            }

            /// Reads the value of the element at the given indices, with no bound checks.
            ///
            /// # Safety
            /// Requires every index to be within bounds.
            #[inline(always)]
            pub unsafe fn read_unchecked(&self, row: usize, col: usize, slice: usize) -> E {
                *self.inner.ptr_at(row, col, slice)
            }

            /// Returns the memory region covered by the view.
            #[inline]
            pub fn region(&self) -> MemRegion {
                self.inner.region()
            }
        }
    };
}

impl_dims!(CubeRef);
impl_dims!(CubeMut);
impl_dims!(SubCubeRef);
impl_dims!(SubCubeMut);

impl<'a, E: Scalar> CubeRef<'a, E> {
    /// Returns a pointer to the first element.
    #[inline]
    pub fn as_ptr(self) -> *const E {
        self.inner.ptr.as_ptr()
    }

    /// Returns the elements in storage order.
    #[inline]
    pub fn as_slice(self) -> &'a [E] {
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.n_elem()) }
    }

    /// Returns slice `k` as a matrix.
    #[inline]
    #[track_caller]
    pub fn slice(self, k: usize) -> MatRef<'a, E> {
        let (ptr, nrows, ncols, _, _) = self.inner.slice(k);
        unsafe { crate::mat::from_raw_parts(ptr, nrows, ncols) }
    }

    /// Returns the view as a strided view.
    #[inline]
    pub fn as_subcube(self) -> SubCubeRef<'a, E> {
        SubCubeRef {
            inner: self.inner,
            __marker: PhantomData,
        }
    }

    /// Copies the view into a new cube.
    #[inline]
    pub fn to_owned(&self) -> Cube<E> {
        Cube::from_column_major_slice(self.as_slice(), self.nrows(), self.ncols(), self.nslices())
    }
}

impl<'a, E: Scalar> CubeMut<'a, E> {
    /// Returns a mutable pointer to the first element.
    #[inline]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.inner.ptr.as_ptr()
    }

    /// Returns the elements in storage order.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        unsafe { core::slice::from_raw_parts_mut(self.inner.ptr.as_ptr(), self.n_elem()) }
    }

    /// Writes `value` to the element at the given indices.
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, slice: usize, value: E) {
        equator::assert!(all(row < self.nrows(), col < self.ncols(), slice < self.nslices()));
        unsafe { *self.inner.ptr_at(row, col, slice) = value };
    }

    /// Converts the view into a mutable view over slice `k`.
    #[inline]
    #[track_caller]
    pub fn into_slice(self, k: usize) -> MatMut<'a, E> {
        let (ptr, nrows, ncols, _, _) = self.inner.slice(k);
        unsafe { crate::mat::from_raw_parts_mut(ptr, nrows, ncols) }
    }

    /// Converts the view into a strided view.
    #[inline]
    pub fn into_subcube(self) -> SubCubeMut<'a, E> {
        SubCubeMut {
            inner: self.inner,
            __marker: PhantomData,
        }
    }

    /// Evaluates the expression into `self`.
    ///
    /// # Panics
    /// Panics if the dimensions of the expression differ from those of `self`.
    #[inline]
    #[track_caller]
    pub fn assign<X: CubeExpr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }
}

impl<'a, E: Scalar> SubCubeRef<'a, E> {
    /// Creates a strided view from its raw parts.
    ///
    /// # Safety
    /// `ptr` must be non null and properly aligned, the strides must not be negative, and every
    /// element `(i, j, k)` within the dimensions, located at
    /// `ptr + i * row_stride + j * col_stride + k * slice_stride`, must be valid for reads for
    /// the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(
        ptr: *const E,
        nrows: usize,
        ncols: usize,
        nslices: usize,
        row_stride: isize,
        col_stride: isize,
        slice_stride: isize,
    ) -> Self {
        Self {
            inner: CubeImpl {
                ptr: NonNull::new_unchecked(ptr as *mut E),
                nrows,
                ncols,
                nslices,
                row_stride,
                col_stride,
                slice_stride,
            },
            __marker: PhantomData,
        }
    }

    /// Returns whether the view is laid out like a contiguous cube.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.inner.is_contiguous()
    }

    /// Returns the subcube starting at `(row_start, col_start, slice_start)` with the given
    /// dimensions.
    #[inline]
    #[track_caller]
    pub fn subcube(
        self,
        row_start: usize,
        col_start: usize,
        slice_start: usize,
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> SubCubeRef<'a, E> {
        SubCubeRef {
            inner: self
                .inner
                .subcube(row_start, col_start, slice_start, nrows, ncols, nslices),
            __marker: PhantomData,
        }
    }

    /// Returns slice `k` as a strided matrix view.
    #[inline]
    #[track_caller]
    pub fn slice(self, k: usize) -> SubMatRef<'a, E> {
        let (ptr, nrows, ncols, rs, cs) = self.inner.slice(k);
        unsafe { SubMatRef::from_raw_parts(ptr, nrows, ncols, rs, cs) }
    }

    /// Copies the view into a new cube.
    #[inline]
    pub fn to_owned(&self) -> Cube<E> {
        Cube::from_fn(self.nrows(), self.ncols(), self.nslices(), |i, j, k| unsafe {
            self.read_unchecked(i, j, k)
        })
    }
}

impl<'a, E: Scalar> SubCubeMut<'a, E> {
    /// Returns whether the view is laid out like a contiguous cube.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.inner.is_contiguous()
    }

    /// Returns the offsets between successive rows, columns and slices.
    #[inline]
    pub fn strides(&self) -> (isize, isize, isize) {
        (
            self.inner.row_stride,
            self.inner.col_stride,
            self.inner.slice_stride,
        )
    }

    /// Returns a mutable pointer to the first element.
    #[inline]
    pub fn as_ptr_mut(&mut self) -> *mut E {
        self.inner.ptr.as_ptr()
    }

    /// Writes `value` to the element at the given indices.
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, slice: usize, value: E) {
        equator::assert!(all(row < self.nrows(), col < self.ncols(), slice < self.nslices()));
        unsafe { *self.inner.ptr_at(row, col, slice) = value };
    }

    /// Converts the view into the subcube starting at `(row_start, col_start, slice_start)` with
    /// the given dimensions.
    #[inline]
    #[track_caller]
    pub fn into_subcube(
        self,
        row_start: usize,
        col_start: usize,
        slice_start: usize,
        nrows: usize,
        ncols: usize,
        nslices: usize,
    ) -> SubCubeMut<'a, E> {
        SubCubeMut {
            inner: self
                .inner
                .subcube(row_start, col_start, slice_start, nrows, ncols, nslices),
            __marker: PhantomData,
        }
    }

    /// Converts the view into a mutable strided view over slice `k`.
    #[inline]
    #[track_caller]
    pub fn into_slice(self, k: usize) -> SubMatMut<'a, E> {
        let (ptr, nrows, ncols, rs, cs) = self.inner.slice(k);
        unsafe { SubMatMut::from_raw_parts(ptr, nrows, ncols, rs, cs) }
    }

    /// Evaluates the expression into `self`.
    ///
    /// # Panics
    /// Panics if the dimensions of the expression differ from those of `self`.
    #[inline]
    #[track_caller]
    pub fn assign<X: CubeExpr<Elem = E>>(&mut self, expr: X) {
        expr.assign_to(self)
    }
}

/// Creates a `CubeRef` from a pointer to a buffer of `nrows * ncols * nslices` elements stored
/// slice after slice in column-major order.
///
/// # Safety
/// `ptr` must be non null and properly aligned, and valid for reads of
/// `nrows * ncols * nslices` elements for the lifetime `'a`. No mutable aliasing is allowed
/// during `'a`, except through views taking part in the same assignment.
#[inline(always)]
pub unsafe fn from_raw_parts<'a, E: Scalar>(
    ptr: *const E,
    nrows: usize,
    ncols: usize,
    nslices: usize,
) -> CubeRef<'a, E> {
    CubeRef {
        inner: CubeImpl::contiguous(ptr as *mut E, nrows, ncols, nslices),
        __marker: PhantomData,
    }
}

/// Creates a `CubeMut` from a pointer to a buffer of `nrows * ncols * nslices` elements stored
/// slice after slice in column-major order.
///
/// # Safety
/// `ptr` must be non null and properly aligned, and valid for reads and writes of
/// `nrows * ncols * nslices` elements for the lifetime `'a`. The memory must not be accessed
/// through other references during `'a`, except through views taking part in the same
/// assignment.
#[inline(always)]
pub unsafe fn from_raw_parts_mut<'a, E: Scalar>(
    ptr: *mut E,
    nrows: usize,
    ncols: usize,
    nslices: usize,
) -> CubeMut<'a, E> {
    CubeMut {
        inner: CubeImpl::contiguous(ptr, nrows, ncols, nslices),
        __marker: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mat, mat::MemState};

    #[test]
    fn test_layout_and_slices() {
        let c = Cube::from_fn(2, 3, 2, |i, j, k| (100 * k + 10 * i + j) as i32);
        assert_eq!(c.n_elem(), 12);
        assert_eq!(c[7], 110);
        assert_eq!(c[(1, 2, 1)], 112);
        assert_eq!(c.read(0, 1, 1), 101);
        assert_eq!(c.slice(1), mat![[100, 101, 102], [110, 111, 112]].as_ref());

        let sub = c.subcube(1, 1, 0, 1, 2, 2);
        assert!(!sub.is_contiguous());
        assert_eq!(sub.to_owned().as_slice(), &[11, 12, 111, 112]);
        assert_eq!(sub.slice(1).to_owned(), mat![[111, 112]]);
    }

    #[test]
    fn test_inline_storage_threshold() {
        assert_eq!(Cube::<f64>::zeros(4, 4, 4).mem_state(), MemState::Inline);
        assert_eq!(Cube::<f64>::zeros(4, 4, 5).mem_state(), MemState::Heap);
    }

    #[test]
    fn test_set_size_and_slice_assignment() {
        let mut c = Cube::<f64>::new();
        c.set_size(2, 2, 3);
        assert_eq!((c.nrows(), c.ncols(), c.nslices()), (2, 2, 3));
        c.slice_mut(2).assign(&mat![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(c.read(1, 0, 2), 3.0);
        assert_eq!(c.slice(0), Mat::zeros(2, 2).as_ref());

        let mut d = Cube::<f32>::new();
        d.copy_size(&c);
        assert_eq!(d.n_elem(), 12);
        d.reset();
        assert_eq!(d.n_elem(), 0);
    }

    #[test]
    fn test_subcube_region_covers_its_elements() {
        let c = Cube::<u64>::zeros(3, 3, 3);
        let sub = c.subcube(1, 1, 1, 2, 2, 2);
        let first = MemRegion::contiguous(&c[(1, 1, 1)] as *const u64, 1);
        let last = MemRegion::contiguous(&c[(2, 2, 2)] as *const u64, 1);
        let outside = MemRegion::contiguous(&c[(0, 0, 0)] as *const u64, 1);
        assert!(sub.region().overlaps(first));
        assert!(sub.region().overlaps(last));
        assert!(!sub.region().overlaps(outside));
    }

    use crate::mat::Mat;
}
