//! Reductions of a whole expression to a single value.

use crate::{
    error::DimensionMismatch,
    expr::{Expr, Proxy},
    Promote, Scalar,
};

/// Folds every element of `p` with `f`, walking it the way the evaluation loops would.
#[inline(always)]
fn fold<P: Proxy, A>(p: &P, init: A, mut f: impl FnMut(A, P::Elem) -> A) -> A {
    let nrows = p.nrows();
    let ncols = p.ncols();
    let mut acc = init;
    unsafe {
        if !P::PREFER_AT_ACCESSOR {
            for i in 0..nrows * ncols {
                acc = f(acc, p.get_unchecked(i));
            }
        } else {
            for j in 0..ncols {
                for i in 0..nrows {
                    acc = f(acc, p.at_unchecked(i, j));
                }
            }
        }
    }
    acc
}

/// Returns the sum of all the elements of `x`, zero for an empty expression.
///
/// ```
/// use armature::{linalg::reductions::accu, mat};
///
/// let a = mat![[1, 2], [3, 4i32]];
/// assert_eq!(accu(&a), 10);
/// assert_eq!(accu(&a + &a), 20);
/// ```
pub fn accu<X: Expr>(x: X) -> X::Elem {
    let p = x.into_proxy();
    let [a0, a1, a2, a3] = fold(&p, ([X::Elem::zero(); 4], 0usize), |(mut acc, k), x| {
        acc[k] = acc[k].plus(x);
        (acc, (k + 1) % 4)
    })
    .0;
    a0.plus(a1).plus(a2.plus(a3))
}

/// Returns the dot product of `a` and `b`, seen as vectors in column-major order.
///
/// The element types are promoted like in any other binary operation. Complex elements are not
/// conjugated.
///
/// # Panics
/// Panics if `a` and `b` do not have the same number of elements.
#[track_caller]
pub fn dot<A: Expr, B: Expr>(a: A, b: B) -> <A::Elem as Promote<B::Elem>>::Output
where
    A::Elem: Promote<B::Elem>,
{
    let a = a.into_proxy();
    let b = b.into_proxy();
    if a.n_elem() != b.n_elem() {
        DimensionMismatch::mat("dot", (a.nrows(), a.ncols()), (b.nrows(), b.ncols())).panic();
    }

    let mut acc0 = <A::Elem as Promote<B::Elem>>::Output::zero();
    let mut acc1 = <A::Elem as Promote<B::Elem>>::Output::zero();
    let n = a.n_elem();
    let flat = !A::Proxy::PREFER_AT_ACCESSOR && !B::Proxy::PREFER_AT_ACCESSOR;
    let a_nrows = a.nrows();
    let b_nrows = b.nrows();

    let read = |i: usize| unsafe {
        let (x, y) = if flat {
            (a.get_unchecked(i), b.get_unchecked(i))
        } else {
            (
                a.at_unchecked(i % a_nrows, i / a_nrows),
                b.at_unchecked(i % b_nrows, i / b_nrows),
            )
        };
        <A::Elem as Promote<B::Elem>>::promote_lhs(x)
            .times(<A::Elem as Promote<B::Elem>>::promote_rhs(y))
    };

    let mut i = 0;
    while i + 1 < n {
        acc0 = acc0.plus(read(i));
        acc1 = acc1.plus(read(i + 1));
        i += 2;
    }
    if i < n {
        acc0 = acc0.plus(read(i));
    }
    acc0.plus(acc1)
}

/// Returns the Frobenius norm of `x`, the square root of the sum of the squared magnitudes of its
/// elements.
///
/// The elements are scaled by the largest magnitude before squaring, so that the result does
/// not overflow or underflow unless the norm itself does.
pub fn norm_fro<X: Expr>(x: X) -> f64 {
    let p = x.into_proxy();
    let max = fold(&p, 0.0f64, |max, x| {
        let abs = x.magnitude();
        if abs > max {
            abs
        } else {
            max
        }
    });
    if max == 0.0 || !max.is_finite() {
        return max;
    }
    let scale = max.recip();
    let sum = fold(&p, 0.0f64, |acc, x| {
        let y = x.magnitude() * scale;
        acc + y * y
    });
    max * sum.sqrt()
}

/// Returns the sum of the diagonal elements of `x`. The expression does not need to be square.
///
/// Only the diagonal elements are computed.
pub fn trace<X: Expr>(x: X) -> X::Elem {
    let p = x.into_proxy();
    let n = Ord::min(p.nrows(), p.ncols());
    let mut acc = X::Elem::zero();
    for i in 0..n {
        acc = acc.plus(unsafe { p.at_unchecked(i, i) });
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c64, mat, mat::Mat};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_accu() {
        let a = Mat::from_fn(5, 7, |i, j| (i * 7 + j) as u64);
        assert_eq!(accu(&a), (0..35).sum::<u64>());
        assert_eq!(accu(a.t()), (0..35).sum::<u64>());
        assert_eq!(accu(a.submatrix(1, 1, 2, 2)), 8 + 9 + 15 + 16);
        assert_eq!(accu(&Mat::<f64>::new()), 0.0);
    }

    #[test]
    fn test_dot_promotes() {
        let a = mat![[1, 2, 3i32]];
        let b = mat![[0.5], [0.25], [1.0f64]];
        assert_eq!(dot(&a, &b), 4.0);
        assert_eq!(dot(a.t(), &b), 4.0);

        let z = mat![[c64::new(0.0, 1.0), c64::new(1.0, 0.0)]];
        assert_eq!(dot(&z, &z), c64::new(0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "dot: incompatible matrix dimensions: 1x3 and 2x1")]
    fn test_dot_length_mismatch() {
        dot(&mat![[1, 2, 3i32]], &mat![[1], [2i32]]);
    }

    #[test]
    fn test_norm_fro() {
        let a = mat![[3.0, 0.0], [0.0, 4.0f64]];
        assert_approx_eq!(norm_fro(&a), 5.0);
        assert_approx_eq!(norm_fro(&a * 1e200) / 1e200, 5.0);
        assert_eq!(norm_fro(&Mat::<f32>::zeros(3, 3)), 0.0);
        assert_approx_eq!(norm_fro(&mat![[c64::new(3.0, 4.0)]]), 5.0);
    }

    #[test]
    fn test_trace() {
        let a = mat![[1, 2, 3], [4, 5, 6i64]];
        assert_eq!(trace(&a), 6);
        assert_eq!(trace(&a * a.t()), 14 + 77);
    }
}
