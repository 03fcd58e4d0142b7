//! Exploration policies for linear policy search.
use crate::error::PowerError;
use crate::linalg::ParameterVector;
use crate::Prng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// A stochastic linear policy that reports the exploration noise it used.
///
/// Conceptually `action = (theta + epsilon) · state`.
pub trait ExplorationPolicy<P> {
    /// Sample an action for `state` under parameters `theta`.
    ///
    /// Every call must draw fresh noise from `rng`.
    ///
    /// # Returns
    /// * `action` - The action to execute.
    /// * `epsilon` - The parameter-space noise that produced the action.
    fn sample(&self, theta: &P, state: &P, rng: &mut Prng) -> (f64, P);
}

impl<P, T: ExplorationPolicy<P> + ?Sized> ExplorationPolicy<P> for &'_ T {
    fn sample(&self, theta: &P, state: &P, rng: &mut Prng) -> (f64, P) {
        T::sample(self, theta, state, rng)
    }
}

/// Configuration for [`GaussianExploration`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianExplorationConfig {
    /// Standard deviation of each noise coordinate.
    pub stddev: f64,
}

impl Default for GaussianExplorationConfig {
    fn default() -> Self {
        Self { stddev: 0.5 }
    }
}

impl GaussianExplorationConfig {
    /// Build the policy.
    ///
    /// # Errors
    /// [`PowerError::InvalidConfiguration`] if `stddev` is negative or not finite.
    pub fn build(&self) -> Result<GaussianExploration, PowerError> {
        GaussianExploration::new(self.stddev)
    }
}

/// Parameter-space Gaussian exploration.
///
/// Each coordinate of `epsilon` is drawn independently from `N(0, stddev²)`.
#[derive(Debug, Copy, Clone)]
pub struct GaussianExploration {
    noise: Normal<f64>,
}

impl GaussianExploration {
    /// # Errors
    /// [`PowerError::InvalidConfiguration`] if `stddev` is negative or not finite.
    pub fn new(stddev: f64) -> Result<Self, PowerError> {
        if !stddev.is_finite() {
            return Err(PowerError::InvalidConfiguration(format!(
                "exploration stddev must be finite, got {}",
                stddev
            )));
        }
        let noise = Normal::new(0.0, stddev).map_err(|err| {
            PowerError::InvalidConfiguration(format!("exploration stddev {}: {}", stddev, err))
        })?;
        Ok(Self { noise })
    }

    pub fn stddev(&self) -> f64 {
        self.noise.std_dev()
    }
}

impl<P: ParameterVector> ExplorationPolicy<P> for GaussianExploration {
    fn sample(&self, theta: &P, state: &P, rng: &mut Prng) -> (f64, P) {
        let epsilon = P::from_fn(theta.dim(), |_| self.noise.sample(&mut *rng));
        let action = theta.dot(state) + epsilon.dot(state);
        (action, epsilon)
    }
}

/// Deterministic linear policy `action = theta · state` with zero noise.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Greedy;

impl<P: ParameterVector> ExplorationPolicy<P> for Greedy {
    fn sample(&self, theta: &P, state: &P, _: &mut Prng) -> (f64, P) {
        (theta.dot(state), P::zeros(theta.dim()))
    }
}
