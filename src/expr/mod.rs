//! Lazily evaluated matrix expressions.
//!
//! An expression is any value implementing [`Expr`]: matrices and views, and the nodes created
//! by the arithmetic operators and the functions of this module. Converting an expression with
//! [`Expr::into_proxy`] yields its [`Proxy`], the uniform element accessor the evaluation loops
//! work with.
//!
//! Nodes come in two families:
//! - [`EOp`] (unary) and [`EGlue`] (binary) are elementwise and fuse into the evaluation loop of
//!   the enclosing expression.
//! - [`Op`] (unary) and [`Glue`] (binary) need their whole result before it can be consumed.
//!   They evaluate into a temporary [`Mat`] when used as an operand, and directly into the
//!   destination when assigned.
//!
//! The operation a node performs is selected by a zero-sized tag type (`EOpKind`, `EGlueKind`,
//! `OpKind`, `GlueKind`), so the per-element dispatch is resolved at compile time.

use crate::{
    linalg::eval,
    mat::{Mat, SubMatMut, SubMatRef},
    Scalar,
};

pub mod eglue;
pub mod eop;
pub mod glue;
pub mod inplace;
pub mod op;
mod leaf;
mod ops;
mod trans;

pub use eglue::{EGlue, EGlueKind};
pub use eop::{abs, ceil, cos, exp, floor, log, pow, round, sin, sqrt, square, tan, EOp, EOpKind};
pub use glue::{join_cols, join_rows, solve, Glue, GlueKind};
pub use inplace::InplaceKind;
pub use leaf::MatProxy;
pub use op::{inv, repmat, sum, trans, Op, OpKind};
pub use trans::Trans;

/// Address range covered by the storage of a matrix or view.
///
/// Two operands alias when their regions overlap. Strided views report the smallest range
/// containing all of their elements, which may produce false positives, but never false
/// negatives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemRegion {
    start: usize,
    end: usize,
}

impl MemRegion {
    /// Region covering no memory, overlapping nothing.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Region of `len` contiguous elements starting at `ptr`.
    #[inline]
    pub fn contiguous<E>(ptr: *const E, len: usize) -> Self {
        let size = core::mem::size_of::<E>();
        if len == 0 || size == 0 {
            return Self::EMPTY;
        }
        let start = ptr as usize;
        Self {
            start,
            end: start.wrapping_add(len * size),
        }
    }

    /// Region of an `nrows×ncols` matrix starting at `ptr` with the given strides.
    #[inline]
    pub fn strided<E>(
        ptr: *const E,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        let size = core::mem::size_of::<E>() as isize;
        if nrows == 0 || ncols == 0 || size == 0 {
            return Self::EMPTY;
        }
        let last_row = (nrows - 1) as isize * row_stride;
        let last_col = (ncols - 1) as isize * col_stride;
        let lo = Ord::min(last_row, 0) + Ord::min(last_col, 0);
        let hi = Ord::max(last_row, 0) + Ord::max(last_col, 0);
        let base = ptr as usize;
        Self {
            start: base.wrapping_add_signed(lo * size),
            end: base.wrapping_add_signed((hi + 1) * size),
        }
    }

    /// Returns `true` if the region covers no memory.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if the two regions share at least one byte.
    #[inline]
    pub fn overlaps(self, other: Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

/// Uniform element accessor over an expression node.
///
/// Elements can be read either through a flat column-major index, or through their coordinates.
/// [`Proxy::PREFER_AT_ACCESSOR`] tells the evaluator which one to use: nodes whose flat index
/// does not map to a plain memory walk (strided views, lazy transposes) prefer coordinate access,
/// and so does any node containing such a child.
pub trait Proxy {
    /// Element type produced by the node.
    type Elem: Scalar;

    /// Whether coordinate access is cheaper than flat access for this node.
    const PREFER_AT_ACCESSOR: bool;

    /// Number of rows of the result.
    fn nrows(&self) -> usize;
    /// Number of columns of the result.
    fn ncols(&self) -> usize;
    /// Number of elements of the result.
    #[inline]
    fn n_elem(&self) -> usize {
        self.nrows() * self.ncols()
    }

    /// Returns the element at flat column-major index `index`.
    ///
    /// # Safety
    /// Requires `index < self.n_elem()`.
    unsafe fn get_unchecked(&self, index: usize) -> Self::Elem;

    /// Returns the element at `(row, col)`.
    ///
    /// # Safety
    /// Requires `row < self.nrows()` and `col < self.ncols()`.
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> Self::Elem;

    /// Returns `true` if any memory read by the node overlaps `region`.
    fn is_alias(&self, region: MemRegion) -> bool;

    /// Returns a strided view of the node, if its elements are stored in memory as they are.
    ///
    /// Matrix products use it to hand operands to the kernels without copying.
    #[inline]
    fn as_strided(&self) -> Option<SubMatRef<'_, Self::Elem>> {
        None
    }
}

/// Destination of an assignment: a resizable [`Mat`], or a fixed-size mutable view.
pub trait Target {
    /// Element type of the destination.
    type Elem: Scalar;

    /// Current dimensions of the destination.
    fn dims(&self) -> (usize, usize);
    /// Memory region written by an assignment.
    fn region(&self) -> MemRegion;
    /// Read-only strided view of the destination.
    fn view(&self) -> SubMatRef<'_, Self::Elem>;
    /// Mutable strided view of the destination.
    fn target_mut(&mut self) -> SubMatMut<'_, Self::Elem>;

    /// Makes the destination `nrows×ncols`, resizing it if possible, panicking otherwise.
    fn prepare(&mut self, nrows: usize, ncols: usize);

    /// Replaces the contents of the destination with `result`, taking its storage if possible.
    fn take_result(&mut self, result: Mat<Self::Elem>);
}

/// Matrix valued expression.
pub trait Expr: Sized {
    /// Element type of the result.
    type Elem: Scalar;
    /// Accessor used to evaluate the expression.
    type Proxy: Proxy<Elem = Self::Elem>;

    /// Converts the expression into its accessor.
    fn into_proxy(self) -> Self::Proxy;

    /// Evaluates the expression into a new matrix.
    #[inline]
    #[track_caller]
    fn eval(self) -> Mat<Self::Elem> {
        let mut out = Mat::new();
        self.assign_to(&mut out);
        out
    }

    /// Evaluates the expression into `dst`.
    ///
    /// When the expression reads memory overlapping `dst`, it is first evaluated into a
    /// temporary which is then moved (or copied, for views) into `dst`.
    #[track_caller]
    fn assign_to<D: Target<Elem = Self::Elem>>(self, dst: &mut D) {
        let src = self.into_proxy();
        if src.is_alias(dst.region()) {
            dst.take_result(eval::materialize(&src));
        } else {
            dst.prepare(src.nrows(), src.ncols());
            eval::eval_into(dst.target_mut(), &src);
        }
    }

    /// Combines the expression into `dst` with the in-place operation `K`.
    ///
    /// # Panics
    /// Panics if the dimensions of the expression differ from those of `dst`.
    #[track_caller]
    fn apply_inplace<K: InplaceKind, D: Target<Elem = Self::Elem>>(self, dst: &mut D) {
        let src = self.into_proxy();
        crate::error::assert_same_dims(K::NAME, dst.dims(), (src.nrows(), src.ncols()));
        if src.is_alias(dst.region()) {
            let tmp = MatProxy::new(eval::materialize(&src));
            eval::apply_inplace::<K, _>(dst.target_mut(), &tmp);
        } else {
            eval::apply_inplace::<K, _>(dst.target_mut(), &src);
        }
    }

    /// Returns the lazy transpose of the expression, consuming it.
    ///
    /// Owned containers and views also have an inherent `t()`, which borrows.
    #[inline]
    fn into_trans(self) -> Trans<Self::Proxy> {
        Trans::new(self.into_proxy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_overlap() {
        let data = [0.0f64; 16];
        let a = MemRegion::contiguous(data.as_ptr(), 8);
        let b = MemRegion::contiguous(data[8..].as_ptr(), 8);
        let c = MemRegion::contiguous(data[7..].as_ptr(), 2);
        assert!(!a.overlaps(b));
        assert!(a.overlaps(c));
        assert!(b.overlaps(c));
        assert!(!a.overlaps(MemRegion::EMPTY));
    }

    #[test]
    fn test_strided_region_bounds() {
        let data = [0.0f32; 12];
        // rows 1..4 and columns 1..3 of a 4x3 matrix
        let ptr = &data[1 + 4] as *const f32;
        let region = MemRegion::strided(ptr, 3, 2, 1, 4);
        assert_eq!(region, MemRegion::contiguous(ptr, 7));

        let transposed = MemRegion::strided(ptr, 2, 3, 4, 1);
        assert_eq!(transposed, region);
    }
}
