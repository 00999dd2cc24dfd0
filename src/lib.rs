//! `armature` is a dense and sparse linear algebra library built around lazily evaluated matrix
//! expressions.
//!
//! Arithmetic on matrices does not compute anything by itself. `&a + &b * 2.0` builds a small
//! expression tree whose nodes know their dimensions and how to produce any element on demand.
//! The tree is only walked when it is assigned to a destination, at which point the whole
//! expression is evaluated in a single fused loop, without intermediate temporaries.
//!
//! # Expression nodes
//! - [`EOp`](expr::EOp) and [`EGlue`](expr::EGlue) are elementwise nodes (unary and binary)
//!   that fuse into the evaluation loop.
//! - [`Op`](expr::Op) and [`Glue`](expr::Glue) are nodes that need their whole result before
//!   they can be consumed (matrix products, inverses, concatenations). They are materialized
//!   into a temporary, or written directly into the destination when possible.
//!
//! Every node is seen by the evaluator through the [`Proxy`](expr::Proxy) trait, which exposes
//! flat and coordinate element access, and whether coordinate access should be preferred (for
//! strided views, lazy transposes, and any node containing one of those).
//!
//! # Aliasing
//! Before writing into a destination, the evaluator checks whether any leaf of the expression
//! overlaps the destination's memory, and evaluates into a temporary first when it does.
//!
//! # Matrix products
//! Products are dispatched by size: small square operands use fully unrolled kernels, larger
//! ones use the native backend (the `gemm` crate) for floating point types, and the remaining
//! cases use a cache-aware emulation.
//!
//! # Features
//! - `gemm` (default): native matrix multiplication backend for `f32`, `f64`, `c32`, `c64`.
//! - `rayon` (default): data parallel products.
//! - `perf-warn`: logs a warning (once per call site) through the `log` crate when an
//!   operation takes a slow path.

#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use core::sync::atomic::{AtomicUsize, Ordering};

pub mod col;
pub mod cube;
pub mod error;
pub mod expr;
pub mod linalg;
pub mod mat;
pub mod row;
pub mod scalar;
pub mod sparse;
pub mod utils;

mod seal;

pub use reborrow;

pub use col::Col;
pub use cube::Cube;
pub use error::{CreationError, DimensionMismatch, LinalgError};
pub use expr::{Expr, Proxy};
pub use mat::{Mat, MatMut, MatRef, SubMatMut, SubMatRef};
pub use row::Row;
pub use scalar::{c32, c64, Field, Promote, Scalar};
pub use sparse::SpMat;

/// Creates a [`Mat`] from a list of rows.
///
/// ```
/// use armature::{mat, Expr};
///
/// let a = mat![
///     [1.0, 2.0],
///     [3.0, 4.0],
///     [5.0, 6.0f64],
/// ];
/// assert_eq!((a.nrows(), a.ncols()), (3, 2));
/// assert_eq!(a.read(2, 0), 5.0);
///
/// // storage is column-major
/// assert_eq!(a.as_slice(), &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
/// assert_eq!(a.t().eval(), mat![[1.0, 3.0, 5.0], [2.0, 4.0, 6.0]]);
/// ```
#[macro_export]
macro_rules! mat {
    () => {
        $crate::mat::Mat::new()
    };

    ($([$($v:expr),* $(,)?] ),+ $(,)?) => {{
        let rows = [$([$($v),*]),+];
        $crate::mat::Mat::from_fn(rows.len(), rows[0].len(), |i, j| rows[i][j])
    }};
}

/// Creates a [`Col`] holding the arguments.
///
/// ```
/// use armature::col;
///
/// let x = col![1, 2, 3i64];
/// assert_eq!(x.nrows(), 3);
/// assert_eq!(x.read(2), 3);
/// ```
#[macro_export]
macro_rules! col {
    () => {
        $crate::col::Col::new()
    };

    ($($v:expr),+ $(,)?) => {
        $crate::col::Col::from_slice(&[$($v),+])
    };
}

/// Creates a [`Row`] holding the arguments.
///
/// ```
/// use armature::row;
///
/// let y = row![0.5, 1.5f32];
/// assert_eq!(y.ncols(), 2);
/// assert_eq!(y.read(1), 1.5);
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::row::Row::new()
    };

    ($($v:expr),+ $(,)?) => {
        $crate::row::Row::from_slice(&[$($v),+])
    };
}

/// Evaluates to `true` the first time the enclosing call site runs, and to `false` afterwards.
#[doc(hidden)]
#[macro_export]
macro_rules! __perf_warn {
    ($name: ident) => {{
        #[allow(non_upper_case_globals)]
        static $name: ::core::sync::atomic::AtomicBool = ::core::sync::atomic::AtomicBool::new(false);
        !$name.swap(true, ::core::sync::atomic::Ordering::Relaxed)
    }};
}

/// How the kernels that can split their work between threads (matrix products) should run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Parallelism {
    /// Run on the calling thread.
    None,
    /// Split the work between the calling thread and the current rayon pool.
    ///
    /// The value is an upper bound on the number of tasks. `0` means
    /// `rayon::current_num_threads()`.
    #[cfg(feature = "rayon")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rayon")))]
    Rayon(usize),
}

// 0: disabled, 1: `Parallelism::None`, n + 2: `Parallelism::Rayon(n)`
static GLOBAL_PARALLELISM: AtomicUsize = AtomicUsize::new(if cfg!(feature = "rayon") { 2 } else { 1 });

/// Makes [`get_global_parallelism`] panic, to catch code paths that rely on the global setting.
pub fn disable_global_parallelism() {
    GLOBAL_PARALLELISM.store(0, Ordering::Relaxed);
}

/// Sets the parallelism used by the operator overloads (`&a * &b` and friends).
pub fn set_global_parallelism(parallelism: Parallelism) {
    let encoded = match parallelism {
        Parallelism::None => 1,
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n_threads) => n_threads.saturating_add(2),
    };
    GLOBAL_PARALLELISM.store(encoded, Ordering::Relaxed);
}

/// Returns the parallelism used by the operator overloads.
///
/// # Panics
/// Panics after [`disable_global_parallelism`] has been called.
#[track_caller]
pub fn get_global_parallelism() -> Parallelism {
    match GLOBAL_PARALLELISM.load(Ordering::Relaxed) {
        0 => panic!("global parallelism is disabled"),
        #[cfg(feature = "rayon")]
        encoded if encoded >= 2 => Parallelism::Rayon(encoded - 2),
        _ => Parallelism::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros() {
        let m = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0f64]];
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let c = col![1i32, 2, 3];
        assert_eq!(c.nrows(), 3);
        let r = row![1i32, 2, 3];
        assert_eq!(r.ncols(), 3);
    }

    #[test]
    fn test_global_parallelism_roundtrip() {
        let before = get_global_parallelism();
        set_global_parallelism(Parallelism::None);
        assert_eq!(get_global_parallelism(), Parallelism::None);
        set_global_parallelism(before);
    }
}
