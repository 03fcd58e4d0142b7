//! Batch aggregation of episodes into a single parameter update.
use crate::episode::{run_episode, EpisodeAggregate};
use crate::error::PowerError;
use crate::linalg::{ParameterVector, WeightMatrix};
use crate::policy::ExplorationPolicy;
use crate::utils::stats::OnlineMeanVariance;
use crate::world::World;
use crate::Prng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::panic;

/// Configuration for [`run_batch`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of independent episodes averaged into one update.
    pub episodes_per_batch: usize,
    /// Maximum number of steps per episode.
    pub max_steps_per_episode: usize,
    /// Scalar normaliser of the per-step weights `s sᵀ / (sᵀ σ s)`.
    pub sigma: f64,
    /// Number of simulation threads. Episodes are simulated in this thread if `<= 1`.
    pub num_threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            episodes_per_batch: 20,
            max_steps_per_episode: 100,
            sigma: 0.5,
            num_threads: 1,
        }
    }
}

impl BatchConfig {
    /// Check that the configuration describes a runnable batch.
    ///
    /// # Errors
    /// [`PowerError::InvalidConfiguration`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), PowerError> {
        let invalid = |msg: &str| Err(PowerError::InvalidConfiguration(msg.into()));
        if self.episodes_per_batch == 0 {
            return invalid("episodes_per_batch must be at least 1");
        }
        if self.max_steps_per_episode == 0 {
            return invalid("max_steps_per_episode must be at least 1");
        }
        if self.num_threads == 0 {
            return invalid("num_threads must be at least 1");
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(PowerError::InvalidConfiguration(format!(
                "sigma must be finite and positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// The result of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdate<P> {
    /// Parameter update `(mean Σ W Q)⁻¹ (mean Σ W ε Q)`.
    pub update: P,
    /// Mean total episode return.
    pub mean_return: f64,
    /// Population standard deviation of the total episode return.
    pub return_stddev: f64,
    /// Mean number of steps per episode.
    pub mean_episode_length: f64,
    /// Number of episodes in the batch.
    pub num_episodes: usize,
}

/// Order-independent reduction of episode aggregates.
///
/// Accumulators can be pushed to and merged in any order;
/// the finished update depends only on the multiset of episodes
/// (up to floating-point summation order).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAccumulator<P: ParameterVector> {
    weighted_matrix: P::Weight,
    weighted_vector: P,
    returns: OnlineMeanVariance<f64>,
    lengths: OnlineMeanVariance<f64>,
}

impl<P: ParameterVector> BatchAccumulator<P> {
    /// An empty accumulator for parameters of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            weighted_matrix: P::Weight::zeros(dim),
            weighted_vector: P::zeros(dim),
            returns: OnlineMeanVariance::default(),
            lengths: OnlineMeanVariance::default(),
        }
    }

    /// Number of accumulated episodes.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_episodes(&self) -> usize {
        self.returns.count() as usize
    }

    /// Add one episode.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, episode: &EpisodeAggregate<P>) {
        self.weighted_matrix.add_scaled(1.0, &episode.weighted_matrix);
        self.weighted_vector.add_scaled(1.0, &episode.weighted_vector);
        self.returns.push(episode.initial_return);
        self.lengths.push(episode.length as f64);
    }

    /// Add all episodes of another accumulator.
    pub fn merge(&mut self, other: &Self) {
        self.weighted_matrix.add_scaled(1.0, &other.weighted_matrix);
        self.weighted_vector.add_scaled(1.0, &other.weighted_vector);
        self.returns.merge(&other.returns);
        self.lengths.merge(&other.lengths);
    }

    /// Average the accumulated episodes and solve for the parameter update.
    ///
    /// If the averaged matrix and vector are both exactly zero (every return was zero)
    /// there is no signal to learn from and the update is zero.
    ///
    /// # Errors
    /// * [`PowerError::SingularAggregate`] if the averaged weight matrix is not invertible.
    /// * [`PowerError::InvalidConfiguration`] if no episodes were accumulated.
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> Result<BatchUpdate<P>, PowerError> {
        let num_episodes = self.num_episodes();
        if num_episodes == 0 {
            return Err(PowerError::InvalidConfiguration(
                "a batch must contain at least one episode".into(),
            ));
        }
        let n = num_episodes as f64;
        let Self {
            mut weighted_matrix,
            mut weighted_vector,
            returns,
            lengths,
        } = self;
        weighted_matrix.mul_scalar(n.recip());
        weighted_vector.mul_scalar(n.recip());

        let update = if weighted_matrix.is_zero() && weighted_vector.is_zero() {
            weighted_vector
        } else {
            weighted_matrix.try_inverse()?.mul_vec(&weighted_vector)
        };

        Ok(BatchUpdate {
            update,
            mean_return: returns.mean().unwrap_or(0.0),
            return_stddev: returns.stddev().unwrap_or(0.0),
            mean_episode_length: lengths.mean().unwrap_or(0.0),
            num_episodes,
        })
    }
}

/// Run a batch of episodes and compute the parameter update.
///
/// One seed is drawn from `rng` per episode and each episode runs with its own generator,
/// so the result does not depend on `config.num_threads`.
///
/// # Errors
/// * [`PowerError::InvalidConfiguration`] if `config` is invalid. No episodes are run.
/// * [`PowerError::DegenerateWeight`] if any episode has a degenerate step weight.
/// * [`PowerError::SingularAggregate`] if the mean weight matrix is not invertible.
pub fn run_batch<P, W, T>(
    world: &W,
    policy: &T,
    theta: &P,
    config: &BatchConfig,
    rng: &mut Prng,
) -> Result<BatchUpdate<P>, PowerError>
where
    P: ParameterVector + Send + Sync,
    P::Weight: Send,
    W: World<P> + Sync + ?Sized,
    T: ExplorationPolicy<P> + Sync + ?Sized,
{
    config.validate()?;
    let seeds = episode_seeds(config.episodes_per_batch, rng);
    let accumulator = if config.num_threads <= 1 {
        accumulate(world, policy, theta, config, &seeds)?
    } else {
        accumulate_parallel(world, policy, theta, config, &seeds)?
    };
    accumulator.finish()
}

fn episode_seeds(num_episodes: usize, rng: &mut Prng) -> Vec<u64> {
    (0..num_episodes).map(|_| rng.gen()).collect()
}

/// Simulate one episode per seed in this thread.
fn accumulate<P, W, T>(
    world: &W,
    policy: &T,
    theta: &P,
    config: &BatchConfig,
    seeds: &[u64],
) -> Result<BatchAccumulator<P>, PowerError>
where
    P: ParameterVector,
    W: World<P> + ?Sized,
    T: ExplorationPolicy<P> + ?Sized,
{
    let mut accumulator = BatchAccumulator::new(theta.dim());
    for &seed in seeds {
        let episode = run_episode(
            world,
            policy,
            theta,
            config.sigma,
            config.max_steps_per_episode,
            &mut Prng::seed_from_u64(seed),
        )?;
        accumulator.push(&episode);
    }
    Ok(accumulator)
}

/// Simulate one episode per seed, spread across `config.num_threads` threads.
///
/// Worker accumulators are merged in seed order.
fn accumulate_parallel<P, W, T>(
    world: &W,
    policy: &T,
    theta: &P,
    config: &BatchConfig,
    seeds: &[u64],
) -> Result<BatchAccumulator<P>, PowerError>
where
    P: ParameterVector + Send + Sync,
    P::Weight: Send,
    W: World<P> + Sync + ?Sized,
    T: ExplorationPolicy<P> + Sync + ?Sized,
{
    let workers = config.num_threads.min(seeds.len()).max(1);
    let chunk_size = (seeds.len() + workers - 1) / workers;
    let partials = crossbeam::scope(|scope| {
        let threads: Vec<_> = seeds
            .chunks(chunk_size.max(1))
            .map(|chunk| scope.spawn(move |_| accumulate(world, policy, theta, config, chunk)))
            .collect();
        threads
            .into_iter()
            .map(|t| t.join().unwrap_or_else(|err| panic::resume_unwind(err)))
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|err| panic::resume_unwind(err));

    let mut accumulator = BatchAccumulator::new(theta.dim());
    for partial in partials {
        accumulator.merge(&partial?);
    }
    Ok(accumulator)
}
