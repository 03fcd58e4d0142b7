//! Run-time dimension vectors and matrices backed by `ndarray`.
use super::{invert, ParameterVector, SingularMatrixError, WeightMatrix};
use ndarray::{Array1, Array2};

impl ParameterVector for Array1<f64> {
    type Weight = Array2<f64>;

    #[inline]
    fn zeros(dim: usize) -> Self {
        Self::zeros(dim)
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> f64>(dim: usize, f: F) -> Self {
        Self::from_shape_fn(dim, f)
    }

    #[inline]
    fn dim(&self) -> usize {
        self.len()
    }

    #[inline]
    fn dot(&self, other: &Self) -> f64 {
        assert_eq!(self.len(), other.len(), "dimension mismatch");
        self.iter().zip(other).map(|(a, b)| a * b).sum()
    }

    fn outer(&self, other: &Self) -> Self::Weight {
        assert_eq!(self.len(), other.len(), "dimension mismatch");
        Array2::from_shape_fn((self.len(), other.len()), |(i, j)| self[i] * other[j])
    }

    #[inline]
    fn mul_scalar(&mut self, alpha: f64) {
        self.mapv_inplace(|x| x * alpha);
    }

    #[inline]
    fn add_scaled(&mut self, alpha: f64, other: &Self) {
        self.scaled_add(alpha, other);
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.iter().all(|x| *x == 0.0)
    }
}

impl WeightMatrix for Array2<f64> {
    type Vector = Array1<f64>;

    #[inline]
    fn zeros(dim: usize) -> Self {
        Self::zeros((dim, dim))
    }

    #[inline]
    fn identity(dim: usize) -> Self {
        Self::eye(dim)
    }

    #[inline]
    fn dim(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn mul_scalar(&mut self, alpha: f64) {
        self.mapv_inplace(|x| x * alpha);
    }

    #[inline]
    fn add_scaled(&mut self, alpha: f64, other: &Self) {
        self.scaled_add(alpha, other);
    }

    fn transpose(&self) -> Self {
        self.t().to_owned()
    }

    fn mul_vec(&self, v: &Self::Vector) -> Self::Vector {
        self.dot(v)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.iter().all(|x| *x == 0.0)
    }

    fn try_inverse(&self) -> Result<Self, SingularMatrixError> {
        invert(self)
    }
}
