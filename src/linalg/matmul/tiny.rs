use super::store;
use crate::{
    mat::{SubMatMut, SubMatRef},
    Scalar,
};

/// Loads an `N×N` block, stored by columns.
#[inline(always)]
fn load<E: Scalar, const N: usize>(src: SubMatRef<'_, E>) -> [[E; N]; N] {
    let mut out = [[E::zero(); N]; N];
    for (j, col) in out.iter_mut().enumerate() {
        for (i, x) in col.iter_mut().enumerate() {
            *x = unsafe { src.read_unchecked(i, j) };
        }
    }
    out
}

/// `dst = [alpha * dst] + beta * lhs * rhs` for `N×N` operands.
#[inline(always)]
fn gemm_emul_tinysq<E: Scalar, const N: usize>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
) {
    let a = load::<E, N>(lhs);
    let b = load::<E, N>(rhs);
    for j in 0..N {
        for i in 0..N {
            let mut acc = E::zero();
            for depth in 0..N {
                acc = acc.plus(a[depth][i].times(b[j][depth]));
            }
            unsafe { store(dst.ptr_at_mut(i, j), acc, alpha, beta) };
        }
    }
}

/// `dst = [alpha * dst] + beta * lhs * rhs` for an `N×N` left operand and an `N×1` right
/// operand.
#[inline(always)]
fn gemv_emul_tinysq<E: Scalar, const N: usize>(
    mut dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
) {
    let a = load::<E, N>(lhs);
    let mut x = [E::zero(); N];
    for (depth, x) in x.iter_mut().enumerate() {
        *x = unsafe { rhs.read_unchecked(depth, 0) };
    }
    for i in 0..N {
        let mut acc = E::zero();
        for depth in 0..N {
            acc = acc.plus(a[depth][i].times(x[depth]));
        }
        unsafe { store(dst.ptr_at_mut(i, 0), acc, alpha, beta) };
    }
}

/// Product of a square left operand of order at most four, by a square matrix or a vector of the
/// same order.
pub(super) fn tinysq<E: Scalar>(
    dst: SubMatMut<'_, E>,
    lhs: SubMatRef<'_, E>,
    rhs: SubMatRef<'_, E>,
    alpha: Option<E>,
    beta: E,
) {
    let order = lhs.nrows();
    equator::debug_assert!(all(
        lhs.ncols() == order,
        rhs.nrows() == order,
        order <= super::TINY_MAX,
    ));

    if rhs.ncols() == 1 {
        match order {
            1 => gemv_emul_tinysq::<E, 1>(dst, lhs, rhs, alpha, beta),
            2 => gemv_emul_tinysq::<E, 2>(dst, lhs, rhs, alpha, beta),
            3 => gemv_emul_tinysq::<E, 3>(dst, lhs, rhs, alpha, beta),
            _ => gemv_emul_tinysq::<E, 4>(dst, lhs, rhs, alpha, beta),
        }
    } else {
        match order {
            1 => gemm_emul_tinysq::<E, 1>(dst, lhs, rhs, alpha, beta),
            2 => gemm_emul_tinysq::<E, 2>(dst, lhs, rhs, alpha, beta),
            3 => gemm_emul_tinysq::<E, 3>(dst, lhs, rhs, alpha, beta),
            _ => gemm_emul_tinysq::<E, 4>(dst, lhs, rhs, alpha, beta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mat, mat::Mat};

    #[test]
    fn test_tiny_kernels() {
        let a = mat![[1, 2, 3], [4, 5, 6], [7, 8, 10i32]];
        let x = mat![[1], [0], [-1i32]];

        let mut y = Mat::zeros(3, 1);
        tinysq(
            y.as_mut().into_submat(),
            a.as_ref().as_submat(),
            x.as_ref().as_submat(),
            None,
            1,
        );
        assert_eq!(y, mat![[-2], [-2], [-3]]);

        let mut c = Mat::ones(3, 3);
        tinysq(
            c.as_mut().into_submat(),
            a.as_ref().as_submat(),
            a.as_ref().as_submat().transpose(),
            Some(2),
            1,
        );
        assert_eq!(c, mat![[16, 34, 55], [34, 79, 130], [55, 130, 215]]);
    }
}
