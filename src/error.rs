//! Error types.
//!
//! Dimension mismatches are programming errors: the operator overloads panic with the message of
//! a [`DimensionMismatch`], and the `try_*` constructors return it instead. Decomposition failures
//! are reported through [`LinalgError`] by the quiet variants of the decomposition-backed
//! operations, and sparse matrix creation from raw parts reports [`CreationError`].

use core::fmt;

/// Shape of an operand taking part in a failed operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Dims {
    /// Matrix with `nrows` rows and `ncols` columns.
    Mat {
        /// Number of rows.
        nrows: usize,
        /// Number of columns.
        ncols: usize,
    },
    /// Cube with `nrows` rows, `ncols` columns and `nslices` slices.
    Cube {
        /// Number of rows.
        nrows: usize,
        /// Number of columns.
        ncols: usize,
        /// Number of slices.
        nslices: usize,
    },
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Dims::Mat { nrows, ncols } => write!(f, "{nrows}x{ncols}"),
            Dims::Cube {
                nrows,
                ncols,
                nslices,
            } => write!(f, "{nrows}x{ncols}x{nslices}"),
        }
    }
}

/// Operands of an operation have incompatible dimensions.
///
/// Values are built with [`DimensionMismatch::mat`] or [`DimensionMismatch::cube`]. The fields
/// can be read, but not used to construct the struct outside of this crate:
///
/// ```compile_fail
/// use armature::error::{DimensionMismatch, Dims};
///
/// let err = DimensionMismatch {
///     op: "addition",
///     lhs: Dims::Mat { nrows: 1, ncols: 2 },
///     rhs: Dims::Mat { nrows: 2, ncols: 1 },
/// };
/// ```
///
/// ```
/// use armature::error::{DimensionMismatch, Dims};
///
/// let err = DimensionMismatch::mat("addition", (1, 2), (2, 1));
/// assert_eq!(err.op, "addition");
/// assert!(matches!(err.lhs, Dims::Mat { nrows: 1, ncols: 2 }));
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct DimensionMismatch {
    /// Name of the operation, e.g. `"addition"` or `"matrix multiplication"`.
    pub op: &'static str,
    /// Dimensions of the left hand side (or destination).
    pub lhs: Dims,
    /// Dimensions of the right hand side (or source).
    pub rhs: Dims,
}

impl DimensionMismatch {
    /// Mismatch between two matrix shapes.
    #[inline]
    pub fn mat(op: &'static str, lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        Self {
            op,
            lhs: Dims::Mat {
                nrows: lhs.0,
                ncols: lhs.1,
            },
            rhs: Dims::Mat {
                nrows: rhs.0,
                ncols: rhs.1,
            },
        }
    }

    /// Mismatch between two cube shapes.
    #[inline]
    pub fn cube(op: &'static str, lhs: (usize, usize, usize), rhs: (usize, usize, usize)) -> Self {
        Self {
            op,
            lhs: Dims::Cube {
                nrows: lhs.0,
                ncols: lhs.1,
                nslices: lhs.2,
            },
            rhs: Dims::Cube {
                nrows: rhs.0,
                ncols: rhs.1,
                nslices: rhs.2,
            },
        }
    }

    #[cold]
    #[track_caller]
    pub(crate) fn panic(self) -> ! {
        panic!("{self}")
    }
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.lhs {
            Dims::Mat { .. } => "matrix",
            Dims::Cube { .. } => "cube",
        };
        write!(
            f,
            "{}: incompatible {kind} dimensions: {} and {}",
            self.op, self.lhs, self.rhs,
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Panics with a [`DimensionMismatch`] message if the two shapes differ.
#[inline]
#[track_caller]
pub(crate) fn assert_same_dims(op: &'static str, lhs: (usize, usize), rhs: (usize, usize)) {
    if lhs != rhs {
        DimensionMismatch::mat(op, lhs, rhs).panic();
    }
}

/// Errors reported by the quiet variants of decomposition-backed operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum LinalgError {
    /// The operation requires a square matrix.
    NotSquare {
        /// Number of rows of the input.
        nrows: usize,
        /// Number of columns of the input.
        ncols: usize,
    },
    /// The matrix is singular to working precision.
    Singular,
}

impl fmt::Display for LinalgError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for LinalgError {}

/// Errors that can occur when creating a sparse matrix from raw parts or triplets.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[non_exhaustive]
pub enum CreationError {
    /// Matrix index out-of-bounds error.
    OutOfBounds {
        /// Row of the out-of-bounds index.
        row: usize,
        /// Column of the out-of-bounds index.
        col: usize,
    },
    /// The column pointers are not a non-decreasing sequence starting at zero and ending at the
    /// number of stored entries, or do not have `ncols + 1` elements.
    InvalidColPtrs,
    /// The row indices of a column are not strictly increasing.
    UnsortedIndices {
        /// Column containing the unsorted indices.
        col: usize,
    },
}

impl fmt::Display for CreationError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for CreationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DimensionMismatch::mat("addition", (2, 3), (3, 2));
        assert_eq!(
            err.to_string(),
            "addition: incompatible matrix dimensions: 2x3 and 3x2"
        );

        let err = DimensionMismatch::cube("subtraction", (1, 2, 3), (1, 2, 4));
        assert_eq!(
            err.to_string(),
            "subtraction: incompatible cube dimensions: 1x2x3 and 1x2x4"
        );
    }

    #[test]
    #[should_panic(expected = "matrix multiplication")]
    fn test_assert_same_dims_panics() {
        assert_same_dims("matrix multiplication", (1, 1), (2, 2));
    }
}
