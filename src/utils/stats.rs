use num_traits::{real::Real, Zero};
use std::iter::{Extend, FromIterator};

/// Online mean and variance calculation using Welford's Algorithm
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OnlineMeanVariance<T> {
    mean: T,
    squared_residual_sum: T,
    count: u64,
}

impl<T: Zero> Default for OnlineMeanVariance<T> {
    fn default() -> Self {
        Self {
            mean: T::zero(),
            squared_residual_sum: T::zero(),
            count: 0,
        }
    }
}

impl<T: Copy> OnlineMeanVariance<T> {
    /// The mean of all accumulated values, if any.
    pub fn mean(&self) -> Option<T> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Number of accumulated values.
    pub const fn count(&self) -> u64 {
        self.count
    }
}

impl<T: Real> OnlineMeanVariance<T> {
    /// The (population) variance of all accumulated values, if any.
    pub fn variance(&self) -> Option<T> {
        if self.count == 0 {
            None
        } else {
            Some(self.squared_residual_sum / T::from(self.count)?)
        }
    }

    /// The (population) standard deviation of all accumulated values, if any.
    pub fn stddev(&self) -> Option<T> {
        self.variance().map(Real::sqrt)
    }

    /// Add a new value to the calculation.
    pub fn push(&mut self, value: T) {
        let residual_pre = value - self.mean;
        self.count += 1;
        // T::from(u64) is infallible for floats
        let count = T::from(self.count).unwrap_or_else(T::one);
        self.mean = self.mean + residual_pre / count;
        let residual_post = value - self.mean;
        self.squared_residual_sum = self.squared_residual_sum + residual_pre * residual_post;
    }

    /// Merge the statistics of another set of values into this one (Chan et al.).
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let (n_a, n_b) = match (T::from(self.count), T::from(other.count)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean = self.mean + delta * n_b / n;
        self.squared_residual_sum =
            self.squared_residual_sum + other.squared_residual_sum + delta * delta * n_a * n_b / n;
        self.count += other.count;
    }
}

impl<T: Real> Extend<T> for OnlineMeanVariance<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push(value)
        }
    }
}

impl<T: Real> FromIterator<T> for OnlineMeanVariance<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut s = Self::default();
        s.extend(iter);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_f64() {
        let stats: OnlineMeanVariance<f64> = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert!((stats.mean().unwrap() - 2.5).abs() < 1e-8);
        assert!((stats.variance().unwrap() - 1.25).abs() < 1e-8);
        assert_eq!(stats.count(), 4);
    }

    #[test]
    fn empty_has_no_mean() {
        let stats = OnlineMeanVariance::<f64>::default();
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.stddev(), None);
    }

    #[test]
    fn merge_matches_collect() {
        let mut a: OnlineMeanVariance<f64> = [1.0, 5.0, -2.0].into_iter().collect();
        let b: OnlineMeanVariance<f64> = [0.5, 3.0].into_iter().collect();
        let all: OnlineMeanVariance<f64> = [1.0, 5.0, -2.0, 0.5, 3.0].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.count(), all.count());
        assert!((a.mean().unwrap() - all.mean().unwrap()).abs() < 1e-12);
        assert!((a.variance().unwrap() - all.variance().unwrap()).abs() < 1e-12);
    }

    #[test]
    fn merge_into_empty() {
        let mut a = OnlineMeanVariance::<f64>::default();
        let b: OnlineMeanVariance<f64> = [2.0, 4.0].into_iter().collect();
        a.merge(&b);
        assert_eq!(a, b);
    }
}
