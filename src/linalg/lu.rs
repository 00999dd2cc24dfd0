//! The partial pivoting LU decomposition is such that:
//! $$PA = LU,$$
//! where $P$ is a permutation matrix, $L$ is a unit lower triangular matrix, and $U$ is
//! an upper triangular matrix.
//!
//! It backs [`inv`](crate::expr::inv), [`solve`](crate::expr::solve) and their quiet variants
//! [`try_inv`] and [`try_solve`], as well as [`det`].

use crate::{
    error::{DimensionMismatch, LinalgError},
    expr::{Expr, Proxy},
    linalg::eval,
    mat::{Mat, SubMatMut, SubMatRef},
    Field,
};

/// Partial pivoting LU decomposition of a square matrix.
///
/// The factorization always completes. A zero pivot marks the matrix as singular, in which case
/// the determinant is zero and solving fails.
#[derive(Clone, Debug)]
pub struct Lu<E: Field> {
    factors: Mat<E>,
    row_perm: Vec<usize>,
    n_transpositions: usize,
    singular: bool,
}

impl<E: Field> Lu<E> {
    /// Computes the decomposition of `matrix`.
    ///
    /// # Errors
    /// Returns [`LinalgError::NotSquare`] if `matrix` is not square.
    pub fn new(matrix: SubMatRef<'_, E>) -> Result<Self, LinalgError> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(LinalgError::NotSquare {
                nrows: n,
                ncols: matrix.ncols(),
            });
        }

        let mut factors = matrix.to_owned();
        let mut row_perm: Vec<usize> = (0..n).collect();
        let mut n_transpositions = 0;
        let mut singular = false;

        for k in 0..n {
            let mut imax = k;
            let mut max = 0.0f64;
            for (i, x) in factors.col_as_slice(k).iter().enumerate().skip(k) {
                let abs = x.magnitude();
                if abs > max {
                    imax = i;
                    max = abs;
                }
            }

            if imax != k {
                for j in 0..n {
                    let col = factors.col_as_slice_mut(j);
                    col.swap(k, imax);
                }
                row_perm.swap(k, imax);
                n_transpositions += 1;
            }

            if max == 0.0 {
                singular = true;
                continue;
            }

            let data = factors.as_slice_mut();
            let (left, right) = data.split_at_mut((k + 1) * n);
            let col_k = &mut left[k * n..];
            let pivot = col_k[k];
            for x in &mut col_k[k + 1..] {
                *x = x.over(pivot);
            }
            let col_k = &*col_k;

            for col_j in right.chunks_exact_mut(n) {
                let ukj = col_j[k];
                for (x, &lik) in col_j[k + 1..].iter_mut().zip(&col_k[k + 1..]) {
                    *x = x.minus(lik.times(ukj));
                }
            }
        }

        Ok(Self {
            factors,
            row_perm,
            n_transpositions,
            singular,
        })
    }

    /// Returns the order of the decomposed matrix.
    #[inline]
    pub fn order(&self) -> usize {
        self.factors.nrows()
    }

    /// Returns the packed factors: `U` on and above the diagonal, `L` strictly below it (its unit
    /// diagonal is implicit).
    #[inline]
    pub fn factors(&self) -> &Mat<E> {
        &self.factors
    }

    /// Returns the row permutation: row `i` of `PA` is row `row_perm()[i]` of `A`.
    #[inline]
    pub fn row_perm(&self) -> &[usize] {
        &self.row_perm
    }

    /// Returns `true` if a zero pivot was met during the factorization.
    #[inline]
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// Returns the determinant of the decomposed matrix.
    pub fn det(&self) -> E {
        if self.singular {
            return E::zero();
        }
        let n = self.order();
        let mut det = E::one();
        for i in 0..n {
            det = det.times(self.factors.read(i, i));
        }
        if self.n_transpositions % 2 == 1 {
            det = det.negate();
        }
        det
    }

    /// Overwrites `rhs` with the solution `X` of `AX = rhs`.
    ///
    /// # Errors
    /// Returns [`LinalgError::Singular`] if the decomposed matrix is singular, in which case
    /// `rhs` is left untouched.
    ///
    /// # Panics
    /// Panics if `rhs` does not have as many rows as the decomposed matrix.
    #[track_caller]
    pub fn solve_in_place(&self, mut rhs: SubMatMut<'_, E>) -> Result<(), LinalgError> {
        let n = self.order();
        equator::assert!(rhs.nrows() == n);
        if self.singular {
            return Err(LinalgError::Singular);
        }

        let lu = self.factors.as_slice();
        let mut x = vec![E::zero(); n];
        for j in 0..rhs.ncols() {
            // x <- P b
            for (x, &src) in x.iter_mut().zip(&self.row_perm) {
                *x = rhs.read(src, j);
            }
            // x <- L^-1 x
            for (p, col) in lu.chunks_exact(n).enumerate() {
                let xp = x[p];
                for (x, &l) in x[p + 1..].iter_mut().zip(&col[p + 1..]) {
                    *x = x.minus(l.times(xp));
                }
            }
            // x <- U^-1 x
            for (p, col) in lu.chunks_exact(n).enumerate().rev() {
                let xp = x[p].over(col[p]);
                x[p] = xp;
                for (x, &u) in x[..p].iter_mut().zip(&col[..p]) {
                    *x = x.minus(u.times(xp));
                }
            }
            for (i, &x) in x.iter().enumerate() {
                rhs.write(i, j, x);
            }
        }
        Ok(())
    }

    /// Returns the solution `X` of `AX = rhs`.
    ///
    /// # Errors
    /// Returns [`LinalgError::Singular`] if the decomposed matrix is singular.
    #[track_caller]
    pub fn solve(&self, rhs: SubMatRef<'_, E>) -> Result<Mat<E>, LinalgError> {
        let mut out = rhs.to_owned();
        self.solve_in_place(out.as_mut().into_submat())?;
        Ok(out)
    }

    /// Returns the inverse of the decomposed matrix.
    ///
    /// # Errors
    /// Returns [`LinalgError::Singular`] if the decomposed matrix is singular.
    pub fn inverse(&self) -> Result<Mat<E>, LinalgError> {
        let n = self.order();
        let mut out = Mat::identity(n, n);
        self.solve_in_place(out.as_mut().into_submat())?;
        Ok(out)
    }
}

/// Returns the inverse of `matrix`.
///
/// # Errors
/// Returns [`LinalgError::NotSquare`] or [`LinalgError::Singular`].
pub fn inverse<E: Field>(matrix: SubMatRef<'_, E>) -> Result<Mat<E>, LinalgError> {
    Lu::new(matrix)?.inverse()
}

/// Returns the solution `X` of `lhs * X = rhs`.
///
/// # Errors
/// Returns [`LinalgError::NotSquare`] or [`LinalgError::Singular`].
///
/// # Panics
/// Panics if `lhs` and `rhs` do not have the same number of rows.
#[track_caller]
pub fn solve<E: Field>(
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
) -> Result<Mat<E>, LinalgError> {
    if lhs.nrows() != rhs.nrows() {
        DimensionMismatch::mat(
            "solve",
            (lhs.nrows(), lhs.ncols()),
            (rhs.nrows(), rhs.ncols()),
        )
        .panic();
    }
    Lu::new(lhs)?.solve(rhs)
}

#[inline]
fn with_view<P: Proxy, R>(p: &P, f: impl FnOnce(SubMatRef<'_, P::Elem>) -> R) -> R {
    match p.as_strided() {
        Some(view) => f(view),
        None => f(eval::materialize(p).as_ref().as_submat()),
    }
}

/// Evaluates `x` and returns its inverse, reporting failures instead of panicking.
///
/// ```
/// use armature::{linalg::lu::try_inv, mat, LinalgError};
///
/// let singular = mat![[1.0, 2.0], [2.0, 4.0f64]];
/// assert_eq!(try_inv(&singular), Err(LinalgError::Singular));
/// ```
///
/// # Errors
/// Returns [`LinalgError::NotSquare`] or [`LinalgError::Singular`].
pub fn try_inv<X: Expr>(x: X) -> Result<Mat<X::Elem>, LinalgError>
where
    X::Elem: Field,
{
    with_view(&x.into_proxy(), inverse)
}

/// Evaluates `a` and `b` and returns the solution `X` of `a * X = b`, reporting a singular or
/// non square `a` instead of panicking.
///
/// # Errors
/// Returns [`LinalgError::NotSquare`] or [`LinalgError::Singular`].
///
/// # Panics
/// Panics if `a` and `b` do not have the same number of rows.
#[track_caller]
pub fn try_solve<A: Expr, B: Expr<Elem = A::Elem>>(a: A, b: B) -> Result<Mat<A::Elem>, LinalgError>
where
    A::Elem: Field,
{
    let a = a.into_proxy();
    let b = b.into_proxy();
    with_view(&a, |a| with_view(&b, |b| solve(a, b)))
}

/// Evaluates `x` and returns its determinant.
///
/// # Panics
/// Panics if `x` is not square.
#[track_caller]
pub fn det<X: Expr>(x: X) -> X::Elem
where
    X::Elem: Field,
{
    match with_view(&x.into_proxy(), Lu::new) {
        Ok(lu) => lu.det(),
        Err(err) => panic!("det: {err}"),
    }
}
