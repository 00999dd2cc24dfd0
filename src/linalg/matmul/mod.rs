//! Matrix multiplication.
//!
//! [`matmul`] picks one of three kernels depending on the shape of the operands:
//! - fully unrolled kernels for square operands of order at most [`TINY_MAX`], multiplied by a
//!   square matrix or a vector of the same order,
//! - the native backend for element types that have one, once an operand exceeds
//!   [`BACKEND_THRESHOLD`] elements,
//! - an emulation copying each row of the left operand into a scratch buffer, so that every dot
//!   product walks contiguous memory, otherwise.
//!
//! All three produce the same result up to floating point rounding.

use crate::{
    error::DimensionMismatch,
    mat::{SubMatMut, SubMatRef},
    Parallelism, Scalar,
};
use reborrow::*;

mod emul;
mod mixed;
mod tiny;

pub use mixed::matmul_mixed;

/// Largest order of the square operands handled by the unrolled kernels.
pub const TINY_MAX: usize = 4;

/// Number of elements of an operand above which the native backend is used.
pub const BACKEND_THRESHOLD: usize = 64;

/// Kernel used for a product.
#[doc(hidden)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatmulPath {
    /// Selected from the dimensions and the element type.
    Auto,
    /// Unrolled kernels, falls back to the emulation for operands they do not handle.
    Tiny,
    /// Scratch buffer emulation.
    Emulated,
    /// Native backend, falls back to the emulation for element types without one.
    Backend,
}

#[inline(always)]
pub(crate) unsafe fn store<E: Scalar>(dst: *mut E, value: E, alpha: Option<E>, beta: E) {
    *dst = match alpha {
        Some(alpha) => alpha.times(*dst).plus(beta.times(value)),
        None => beta.times(value),
    };
}

#[inline]
fn is_tiny(m: usize, n: usize, k: usize) -> bool {
    m == k && m <= TINY_MAX && (n == m || n == 1)
}

fn select_path<E: Scalar>(m: usize, n: usize, k: usize) -> MatmulPath {
    if m * k > BACKEND_THRESHOLD || k * n > BACKEND_THRESHOLD {
        if E::HAS_BACKEND {
            return MatmulPath::Backend;
        }
        #[cfg(feature = "perf-warn")]
        if crate::__perf_warn!(MATMUL_WARN) {
            log::warn!(target: "armature_perf", "Matrix multiplication of {m}x{k} by {k}x{n} has no native backend for {}. Using the emulated kernel.", core::any::type_name::<E>());
        }
    }
    if is_tiny(m, n, k) {
        MatmulPath::Tiny
    } else {
        MatmulPath::Emulated
    }
}

/// Panics with a [`DimensionMismatch`] unless a `dst` of dimensions `dst` can hold the product
/// of `lhs` and `rhs`.
#[track_caller]
#[inline]
pub(crate) fn check_product_dims(dst: (usize, usize), lhs: (usize, usize), rhs: (usize, usize)) {
    if lhs.1 != rhs.0 {
        DimensionMismatch::mat("matrix multiplication", lhs, rhs).panic();
    }
    if dst != (lhs.0, rhs.1) {
        DimensionMismatch::mat("matrix multiplication", dst, (lhs.0, rhs.1)).panic();
    }
}

/// Runs the product on the native backend. Returns `false` if `E` has none.
///
/// # Safety
/// `dst` must not overlap `lhs` or `rhs`, and the dimensions must have been checked.
#[cfg(feature = "gemm")]
unsafe fn backend<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) -> bool {
    use crate::scalar::{c32, c64, BackendScalar};

    macro_rules! dispatch {
        ($($ty: ty),*) => {$(
            if coe::is_same::<E, $ty>() {
                <$ty as BackendScalar>::backend_gemm(
                    dst.nrows(),
                    dst.ncols(),
                    lhs.ncols(),
                    dst.as_ptr_mut() as *mut $ty,
                    dst.col_stride(),
                    dst.row_stride(),
                    alpha.is_some(),
                    lhs.as_ptr() as *const $ty,
                    lhs.col_stride(),
                    lhs.row_stride(),
                    rhs.as_ptr() as *const $ty,
                    rhs.col_stride(),
                    rhs.row_stride(),
                    coe::coerce_static::<E, $ty>(alpha.unwrap_or(E::zero())),
                    coe::coerce_static::<E, $ty>(beta),
                    parallelism,
                );
                return true;
            }
        )*};
    }

    dispatch!(f32, f64, c32, c64);
    false
}

#[cfg(not(feature = "gemm"))]
unsafe fn backend<E: Scalar>(
    dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) -> bool {
    let _ = (dst, lhs, rhs, alpha, beta, parallelism);
    false
}

/// Computes the matrix product `[alpha * dst] + beta * lhs * rhs` and stores the result in
/// `dst`.
///
/// Performs the operation:
/// - `dst = beta * lhs * rhs` if `alpha` is `None` (the preexisting values of `dst` are not
///   read),
/// - `dst = alpha * dst + beta * lhs * rhs` if `alpha` is `Some(_)`.
///
/// `dst` must not overlap `lhs` or `rhs`.
///
/// # Panics
/// Panics with a [`DimensionMismatch`] message unless
/// - `lhs.ncols() == rhs.nrows()`,
/// - `dst.nrows() == lhs.nrows()` and `dst.ncols() == rhs.ncols()`.
///
/// # Example
/// ```
/// use armature::{linalg::matmul::matmul, mat, Mat, Parallelism};
///
/// let lhs = mat![[0.0, 2.0], [1.0, 3.0]];
/// let rhs = mat![[4.0, 6.0], [5.0, 7.0]];
///
/// let mut dst = Mat::<f64>::zeros(2, 2);
/// matmul(
///     dst.as_mut().into_submat(),
///     lhs.as_ref().as_submat(),
///     rhs.as_ref().as_submat(),
///     None,
///     2.0,
///     Parallelism::None,
/// );
///
/// assert_eq!(dst, mat![[20.0, 28.0], [38.0, 54.0]]);
/// ```
#[track_caller]
#[inline]
pub fn matmul<E: Scalar>(
    dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
) {
    matmul_with_path(dst, lhs, rhs, alpha, beta, parallelism, MatmulPath::Auto)
}

/// Same as [`matmul`], with the kernel chosen by the caller.
#[doc(hidden)]
#[track_caller]
pub fn matmul_with_path<E: Scalar>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
    parallelism: Parallelism,
    path: MatmulPath,
) {
    check_product_dims(
        (dst.nrows(), dst.ncols()),
        (lhs.nrows(), lhs.ncols()),
        (rhs.nrows(), rhs.ncols()),
    );

    let m = dst.nrows();
    let n = dst.ncols();
    let k = lhs.ncols();
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        match alpha {
            Some(alpha) => {
                crate::linalg::eval::apply_scalar::<crate::expr::eop::kind::ScalarTimes, E>(
                    dst, alpha,
                )
            }
            None => dst.fill(E::zero()),
        }
        return;
    }

    let path = match path {
        MatmulPath::Auto => select_path::<E>(m, n, k),
        path => path,
    };

    if path == MatmulPath::Backend
        && unsafe { backend(dst.rb_mut(), lhs, rhs, alpha, beta, parallelism) }
    {
        return;
    }

    match path {
        MatmulPath::Tiny if is_tiny(m, n, k) => tiny::tinysq(dst, lhs, rhs, alpha, beta),
        _ => {
            if n == 1 {
                emul::gemv(dst, lhs, rhs, alpha, beta)
            } else {
                emul::gemm(dst, lhs, rhs, alpha, beta, parallelism)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat::Mat, Expr};
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn reference<E: Scalar>(
        dst: &Mat<E>,
        lhs: &Mat<E>,
        rhs: &Mat<E>,
        alpha: Option<E>,
        beta: E,
    ) -> Mat<E> {
        Mat::from_fn(dst.nrows(), dst.ncols(), |i, j| {
            let mut acc = E::zero();
            for depth in 0..lhs.ncols() {
                acc = acc.plus(lhs.read(i, depth).times(rhs.read(depth, j)));
            }
            match alpha {
                Some(alpha) => alpha.times(dst.read(i, j)).plus(beta.times(acc)),
                None => beta.times(acc),
            }
        })
    }

    fn random(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<f64> {
        Mat::from_fn(nrows, ncols, |_, _| rng.gen::<f64>() - 0.5)
    }

    #[test]
    fn test_paths_agree() {
        let mut rng = StdRng::seed_from_u64(0);
        let shapes = [
            (1, 1, 1),
            (2, 2, 2),
            (3, 1, 3),
            (4, 4, 4),
            (4, 1, 4),
            (5, 3, 2),
            (9, 9, 9),
            (17, 1, 33),
            (40, 13, 70),
        ];
        for (m, n, k) in shapes {
            let lhs = random(&mut rng, m, k);
            let rhs = random(&mut rng, k, n);
            let init = random(&mut rng, m, n);
            for alpha in [None, Some(0.5)] {
                let target = reference(&init, &lhs, &rhs, alpha, 2.0);
                for path in [
                    MatmulPath::Auto,
                    MatmulPath::Tiny,
                    MatmulPath::Emulated,
                    MatmulPath::Backend,
                ] {
                    for parallelism in [Parallelism::None, crate::get_global_parallelism()] {
                        let mut dst = init.clone();
                        matmul_with_path(
                            dst.as_mut().into_submat(),
                            lhs.as_ref().as_submat(),
                            rhs.as_ref().as_submat(),
                            alpha,
                            2.0,
                            parallelism,
                            path,
                        );
                        for (x, y) in dst.as_slice().iter().zip(target.as_slice()) {
                            assert_approx_eq!(x, y, 1e-10);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_strided_operands() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = random(&mut rng, 12, 10);
        let b = random(&mut rng, 10, 12);
        let lhs = a.t().eval();
        let rhs = b.submatrix(0, 0, 12, 10).to_owned();
        let target = reference(&Mat::zeros(10, 10), &lhs, &rhs, None, 1.0);

        let mut dst = Mat::<f64>::zeros(12, 12);
        let dst_view = dst.submatrix_mut(1, 2, 10, 10).into_transpose();
        matmul(
            dst_view,
            a.as_ref().as_submat().transpose(),
            b.submatrix(0, 0, 12, 10),
            None,
            1.0,
            Parallelism::None,
        );
        let got = dst.submatrix(1, 2, 10, 10).to_owned().t().eval();
        for (x, y) in got.as_slice().iter().zip(target.as_slice()) {
            assert_approx_eq!(x, y, 1e-10);
        }
    }

    #[test]
    fn test_integer_and_complex() {
        let a = Mat::from_fn(9, 9, |i, j| (i as i64) - (j as i64));
        let expected = reference(&Mat::zeros(9, 9), &a, &a, None, 1);
        let mut dst = Mat::zeros(9, 9);
        matmul(
            dst.as_mut().into_submat(),
            a.as_ref().as_submat(),
            a.as_ref().as_submat(),
            None,
            1,
            Parallelism::None,
        );
        assert_eq!(dst, expected);

        let z = Mat::from_fn(3, 3, |i, j| c64::new(i as f64, j as f64));
        let expected = reference(&Mat::zeros(3, 3), &z, &z, None, c64::new(1.0, 0.0));
        let mut dst = Mat::zeros(3, 3);
        matmul(
            dst.as_mut().into_submat(),
            z.as_ref().as_submat(),
            z.as_ref().as_submat(),
            None,
            c64::new(1.0, 0.0),
            Parallelism::None,
        );
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_empty_inner_dimension() {
        let lhs = Mat::<f32>::zeros(3, 0);
        let rhs = Mat::<f32>::zeros(0, 2);
        let mut dst = Mat::<f32>::ones(3, 2);
        matmul(
            dst.as_mut().into_submat(),
            lhs.as_ref().as_submat(),
            rhs.as_ref().as_submat(),
            Some(3.0),
            1.0,
            Parallelism::None,
        );
        assert_eq!(dst, Mat::full(3, 2, 3.0));
        matmul(
            dst.as_mut().into_submat(),
            lhs.as_ref().as_submat(),
            rhs.as_ref().as_submat(),
            None,
            1.0,
            Parallelism::None,
        );
        assert_eq!(dst, Mat::zeros(3, 2));
    }

    fn run_path<E: Scalar>(lhs: &Mat<E>, rhs: &Mat<E>, path: MatmulPath) -> Mat<E> {
        let mut dst = Mat::<E>::zeros(lhs.nrows(), rhs.ncols());
        matmul_with_path(
            dst.as_mut().into_submat(),
            lhs.as_ref().as_submat(),
            rhs.as_ref().as_submat(),
            None,
            E::one(),
            Parallelism::None,
            path,
        );
        dst
    }

    #[test]
    fn test_backend_for_each_element_type() {
        let a = Mat::from_fn(9, 11, |i, j| (i as f32) - 0.5 * (j as f32));
        let b = Mat::from_fn(11, 7, |i, j| (i * j % 5) as f32);
        let backend = run_path(&a, &b, MatmulPath::Backend);
        let emulated = run_path(&a, &b, MatmulPath::Emulated);
        for (x, y) in backend.as_slice().iter().zip(emulated.as_slice()) {
            assert_approx_eq!(x, y, 1e-4);
        }

        let a = Mat::from_fn(9, 9, |i, j| crate::c32::new(i as f32, -(j as f32)));
        let backend = run_path(&a, &a, MatmulPath::Backend);
        assert_eq!(backend, run_path(&a, &a, MatmulPath::Emulated));

        let a = Mat::from_fn(9, 9, |i, j| c64::new(j as f64, 1.0 + i as f64));
        let backend = run_path(&a, &a, MatmulPath::Backend);
        assert_eq!(backend, run_path(&a, &a, MatmulPath::Emulated));

        // no native kernel, falls back to the emulation
        let a = Mat::from_fn(9, 9, |i, j| (i as u32) * 3 + j as u32);
        assert_eq!(
            run_path(&a, &a, MatmulPath::Backend),
            run_path(&a, &a, MatmulPath::Emulated),
        );
    }

    #[test]
    #[should_panic(expected = "matrix multiplication: incompatible matrix dimensions: 2x3 and 2x3")]
    fn test_inner_dimension_mismatch() {
        let a = Mat::<f64>::zeros(2, 3);
        let mut dst = Mat::<f64>::zeros(2, 3);
        matmul(
            dst.as_mut().into_submat(),
            a.as_ref().as_submat(),
            a.as_ref().as_submat(),
            None,
            1.0,
            Parallelism::None,
        );
    }

    #[test]
    #[should_panic(expected = "matrix multiplication: incompatible matrix dimensions: 3x3 and 2x2")]
    fn test_destination_mismatch() {
        let a = Mat::<f64>::zeros(2, 2);
        let mut dst = Mat::<f64>::zeros(3, 3);
        matmul(
            dst.as_mut().into_submat(),
            a.as_ref().as_submat(),
            a.as_ref().as_submat(),
            None,
            1.0,
            Parallelism::None,
        );
    }
}
