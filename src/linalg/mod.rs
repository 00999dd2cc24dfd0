//! Evaluation kernels and the linear algebra routines built on top of them.
//!
//! - [`eval`] walks expression proxies into destinations.
//! - [`matmul`] dispatches matrix products to the unrolled, emulated or native kernels.
//! - [`lu`] is the partial pivoting LU decomposition backing inverses, solves and determinants.
//! - [`reductions`] computes sums, dot products, norms and traces.

pub mod eval;
pub mod lu;
pub mod matmul;
pub mod reductions;
