//! Compile-time dimension vectors and matrices.
use super::{invert, ParameterVector, SingularMatrixError, WeightMatrix};
use ndarray::Array2;
use num_traits::Zero;
use std::ops::{Add, AddAssign, Index, Mul, Neg, Sub};

/// A real vector of dimension `N` stored inline.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vector<const N: usize>(pub [f64; N]);

impl<const N: usize> From<[f64; N]> for Vector<N> {
    fn from(coordinates: [f64; N]) -> Self {
        Self(coordinates)
    }
}

impl<const N: usize> Default for Vector<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> Zero for Vector<N> {
    fn zero() -> Self {
        Self([0.0; N])
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0.0)
    }
}

impl<const N: usize> Index<usize> for Vector<N> {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl<const N: usize> Add for Vector<N> {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl<const N: usize> AddAssign for Vector<N> {
    fn add_assign(&mut self, other: Self) {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a += b
        }
    }
}

impl<const N: usize> Sub for Vector<N> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl<const N: usize> Neg for Vector<N> {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.map(|a| -a))
    }
}

/// Scalar multiplication
impl<const N: usize> Mul<f64> for Vector<N> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self(self.0.map(|a| a * scalar))
    }
}

impl<const N: usize> ParameterVector for Vector<N> {
    type Weight = Matrix<N>;

    fn zeros(dim: usize) -> Self {
        debug_assert_eq!(dim, N, "dimension mismatch");
        Self::zero()
    }

    fn from_fn<F: FnMut(usize) -> f64>(dim: usize, f: F) -> Self {
        debug_assert_eq!(dim, N, "dimension mismatch");
        Self(array_init::array_init(f))
    }

    #[inline]
    fn dim(&self) -> usize {
        N
    }

    #[inline]
    fn dot(&self, other: &Self) -> f64 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    fn outer(&self, other: &Self) -> Matrix<N> {
        Matrix(array_init::array_init(|i| {
            array_init::array_init(|j| self.0[i] * other.0[j])
        }))
    }

    fn mul_scalar(&mut self, alpha: f64) {
        for a in &mut self.0 {
            *a *= alpha;
        }
    }

    fn add_scaled(&mut self, alpha: f64, other: &Self) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a = b.mul_add(alpha, *a);
        }
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }
}

/// A real `N x N` matrix stored inline in row-major order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix<const N: usize>(pub [[f64; N]; N]);

impl<const N: usize> Matrix<N> {
    fn to_array(self) -> Array2<f64> {
        Array2::from_shape_fn((N, N), |(i, j)| self.0[i][j])
    }

    fn from_array(array: &Array2<f64>) -> Self {
        Self(array_init::array_init(|i| {
            array_init::array_init(|j| array[[i, j]])
        }))
    }
}

impl<const N: usize> From<[[f64; N]; N]> for Matrix<N> {
    fn from(rows: [[f64; N]; N]) -> Self {
        Self(rows)
    }
}

impl<const N: usize> Index<(usize, usize)> for Matrix<N> {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.0[i][j]
    }
}

impl<const N: usize> WeightMatrix for Matrix<N> {
    type Vector = Vector<N>;

    fn zeros(dim: usize) -> Self {
        debug_assert_eq!(dim, N, "dimension mismatch");
        Self([[0.0; N]; N])
    }

    fn identity(dim: usize) -> Self {
        debug_assert_eq!(dim, N, "dimension mismatch");
        Self(array_init::array_init(|i| {
            array_init::array_init(|j| if i == j { 1.0 } else { 0.0 })
        }))
    }

    #[inline]
    fn dim(&self) -> usize {
        N
    }

    fn mul_scalar(&mut self, alpha: f64) {
        for a in self.0.iter_mut().flatten() {
            *a *= alpha;
        }
    }

    fn add_scaled(&mut self, alpha: f64, other: &Self) {
        for (a, b) in self.0.iter_mut().flatten().zip(other.0.iter().flatten()) {
            *a = b.mul_add(alpha, *a);
        }
    }

    fn transpose(&self) -> Self {
        Self(array_init::array_init(|i| {
            array_init::array_init(|j| self.0[j][i])
        }))
    }

    fn mul_vec(&self, v: &Vector<N>) -> Vector<N> {
        Vector(self.0.map(|row| Vector(row).dot(v)))
    }

    fn is_zero(&self) -> bool {
        self.0.iter().flatten().all(|x| *x == 0.0)
    }

    fn try_inverse(&self) -> Result<Self, SingularMatrixError> {
        invert(&self.to_array()).map(|inv| Self::from_array(&inv))
    }
}
