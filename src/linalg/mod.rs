//! Linear algebra capabilities required by policy search.
//!
//! The learning algorithms are generic over a parameter vector type and its associated square
//! weight matrix type. Two families of implementations are provided:
//! * [`ndarray::Array1`] / [`ndarray::Array2`] with dimension chosen at run time.
//! * [`Vector`] / [`Matrix`] with dimension fixed at compile time.
mod dynamic;
mod fixed;

pub use fixed::{Matrix, Vector};

use ndarray::{s, Array2, Axis};
use std::fmt;
use thiserror::Error;

/// A real vector in a finite-dimensional space.
///
/// Used both for the linear policy parameters and for world states.
pub trait ParameterVector: Clone + fmt::Debug + PartialEq {
    /// Square matrix acting on vectors of this type.
    type Weight: WeightMatrix<Vector = Self>;

    /// The zero vector of the given dimension.
    fn zeros(dim: usize) -> Self;

    /// Construct a vector by evaluating `f` at each coordinate index.
    fn from_fn<F: FnMut(usize) -> f64>(dim: usize, f: F) -> Self;

    /// Number of coordinates.
    fn dim(&self) -> usize;

    /// Inner product.
    fn dot(&self, other: &Self) -> f64;

    /// Outer product `self · otherᵀ`.
    fn outer(&self, other: &Self) -> Self::Weight;

    /// Multiply in-place by a scalar.
    fn mul_scalar(&mut self, alpha: f64);

    /// In-place `self += alpha * other`.
    fn add_scaled(&mut self, alpha: f64, other: &Self);

    /// Euclidean norm.
    fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Whether every coordinate is exactly zero.
    fn is_zero(&self) -> bool;
}

/// A real square matrix paired with a [`ParameterVector`] type.
pub trait WeightMatrix: Clone + fmt::Debug + PartialEq {
    type Vector: ParameterVector<Weight = Self>;

    /// The zero matrix of side `dim`.
    fn zeros(dim: usize) -> Self;

    /// The identity matrix of side `dim`.
    fn identity(dim: usize) -> Self;

    /// Side length.
    fn dim(&self) -> usize;

    /// Multiply in-place by a scalar.
    fn mul_scalar(&mut self, alpha: f64);

    /// In-place `self += alpha * other`.
    fn add_scaled(&mut self, alpha: f64, other: &Self);

    /// The transposed matrix.
    fn transpose(&self) -> Self;

    /// Matrix-vector product `self · v`.
    fn mul_vec(&self, v: &Self::Vector) -> Self::Vector;

    /// Whether every entry is exactly zero.
    fn is_zero(&self) -> bool;

    /// The matrix inverse.
    ///
    /// # Errors
    /// Returns [`SingularMatrixError`] if the matrix is (numerically) singular
    /// or contains non-finite entries.
    fn try_inverse(&self) -> Result<Self, SingularMatrixError>;
}

/// A matrix could not be inverted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Error)]
pub enum SingularMatrixError {
    #[error("matrix is singular: no usable pivot in column {column}")]
    ZeroPivot { column: usize },
    #[error("matrix contains non-finite entries")]
    NonFinite,
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// A pivot is rejected when its magnitude is at most `n * EPSILON` times the largest
/// absolute entry of the input.
pub(crate) fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>, SingularMatrixError> {
    let n = matrix.nrows();
    assert_eq!(n, matrix.ncols(), "matrix must be square");
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(SingularMatrixError::NonFinite);
    }

    let scale = matrix.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    #[allow(clippy::cast_precision_loss)]
    let tolerance = scale * (n as f64) * f64::EPSILON;

    // Augmented [A | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    aug.slice_mut(s![.., ..n]).assign(matrix);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let (pivot_row, pivot_abs) = (col..n)
            .map(|r| (r, aug[[r, col]].abs()))
            .fold((col, -1.0), |best, cand| if cand.1 > best.1 { cand } else { best });
        if pivot_abs <= tolerance {
            return Err(SingularMatrixError::ZeroPivot { column: col });
        }
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|x| x / pivot);
        let pivot_row_values = aug.row(col).to_owned();
        for (r, mut row) in aug.axis_iter_mut(Axis(0)).enumerate() {
            if r == col {
                continue;
            }
            let factor = row[col];
            if factor != 0.0 {
                row.scaled_add(-factor, &pivot_row_values);
            }
        }
    }

    let inverse = aug.slice(s![.., n..]).to_owned();
    if inverse.iter().any(|x| !x.is_finite()) {
        return Err(SingularMatrixError::NonFinite);
    }
    Ok(inverse)
}
