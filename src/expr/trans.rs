use super::*;

/// Lazy transpose of an expression.
///
/// Elements are read through the coordinates of the operand, swapped. When the operand is
/// stored in memory, matrix products use the transposed strided view directly instead of
/// copying.
#[derive(Copy, Clone, Debug)]
pub struct Trans<P> {
    inner: P,
}

impl<P: Proxy> Trans<P> {
    /// Creates the transposed node.
    #[inline]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Returns the operand.
    #[inline]
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Proxy> Proxy for Trans<P> {
    type Elem = P::Elem;
    const PREFER_AT_ACCESSOR: bool = true;

    #[inline(always)]
    fn nrows(&self) -> usize {
        self.inner.ncols()
    }
    #[inline(always)]
    fn ncols(&self) -> usize {
        self.inner.nrows()
    }
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> P::Elem {
        let nrows = self.nrows();
        self.inner.at_unchecked(index / nrows, index % nrows)
    }
    #[inline(always)]
    unsafe fn at_unchecked(&self, row: usize, col: usize) -> P::Elem {
        self.inner.at_unchecked(col, row)
    }
    #[inline]
    fn is_alias(&self, region: MemRegion) -> bool {
        self.inner.is_alias(region)
    }
    #[inline]
    fn as_strided(&self) -> Option<SubMatRef<'_, P::Elem>> {
        self.inner.as_strided().map(SubMatRef::transpose)
    }
}

impl<P: Proxy> Expr for Trans<P> {
    type Elem = P::Elem;
    type Proxy = Self;

    #[inline(always)]
    fn into_proxy(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{col, mat};

    #[test]
    fn test_lazy_transpose() {
        let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0f64]];
        let t = a.t();
        assert_eq!((Proxy::nrows(&t), Proxy::ncols(&t)), (3, 2));
        assert_eq!(t.eval(), mat![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);

        let strided = a.t().as_strided().map(|view| view.to_owned());
        assert_eq!(strided, Some(mat![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]));
    }

    #[test]
    fn test_transpose_in_elementwise_expression() {
        let a = mat![[1, 2], [3, 4i32]];
        let b = (a.t() + &a).eval();
        assert_eq!(b, mat![[2, 5], [5, 8]]);
    }

    #[test]
    fn test_transpose_borrows_owned_containers() {
        let a = mat![[1.0, 2.0], [3.0, 4.0f64]];
        let ata = (a.t() * &a).eval();
        assert_eq!(ata, mat![[10.0, 14.0], [14.0, 20.0]]);
        assert_eq!(a.read(1, 0), 3.0);

        let x = col![1, 2i32];
        assert_eq!(x.t().eval(), mat![[1, 2]]);
        assert_eq!(x.nrows(), 2);

        let view = a.as_ref();
        assert_eq!(view.t().eval(), mat![[1.0, 3.0], [2.0, 4.0]]);
        assert_eq!((&a + view).into_trans().eval(), mat![[2.0, 6.0], [4.0, 8.0]]);
    }
}
