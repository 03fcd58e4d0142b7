//! The policy search training loop.
use crate::batch::{run_batch, BatchConfig, BatchUpdate};
use crate::error::{PowerError, TrainError};
use crate::linalg::ParameterVector;
use crate::logging::StatsLogger;
use crate::policy::ExplorationPolicy;
use crate::world::World;
use crate::Prng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for [`train`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Number of parameter updates.
    pub num_updates: usize,
    /// Number of independent episodes averaged into each update.
    pub episodes_per_batch: usize,
    /// Maximum number of steps per episode.
    pub max_steps_per_episode: usize,
    /// Scalar normaliser of the per-step weights.
    pub sigma: f64,
    /// Number of simulation threads per batch.
    pub num_threads: usize,
}

impl Default for PowerConfig {
    fn default() -> Self {
        let batch = BatchConfig::default();
        Self {
            num_updates: 100,
            episodes_per_batch: batch.episodes_per_batch,
            max_steps_per_episode: batch.max_steps_per_episode,
            sigma: batch.sigma,
            num_threads: batch.num_threads,
        }
    }
}

impl PowerConfig {
    /// The configuration of each batch.
    pub const fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            episodes_per_batch: self.episodes_per_batch,
            max_steps_per_episode: self.max_steps_per_episode,
            sigma: self.sigma,
            num_threads: self.num_threads,
        }
    }

    /// # Errors
    /// [`PowerError::InvalidConfiguration`] if the batch configuration is invalid.
    pub fn validate(&self) -> Result<(), PowerError> {
        self.batch_config().validate()
    }
}

/// Improve `theta` in-place with `config.num_updates` batch updates.
///
/// Each iteration runs one batch (see [`run_batch`]) and adds its update to `theta`.
/// There is no convergence check: all updates are always attempted.
/// Per-update statistics are written to `logger`.
///
/// # Errors
/// The configuration is checked before any simulation;
/// an invalid configuration fails with `iteration` 0 and `theta` unchanged.
/// A failed batch stops training and reports the failing iteration.
/// `theta` then holds the result of all preceding updates.
pub fn train<P, W, T>(
    world: &W,
    policy: &T,
    theta: &mut P,
    config: &PowerConfig,
    rng: &mut Prng,
    logger: &mut dyn StatsLogger,
) -> Result<(), TrainError>
where
    P: ParameterVector + Send + Sync,
    P::Weight: Send,
    W: World<P> + Sync + ?Sized,
    T: ExplorationPolicy<P> + Sync + ?Sized,
{
    config
        .validate()
        .map_err(|source| TrainError { iteration: 0, source })?;
    let batch_config = config.batch_config();

    for iteration in 0..config.num_updates {
        let start = Instant::now();
        let batch = run_batch(world, policy, theta, &batch_config, rng)
            .map_err(|source| TrainError { iteration, source })?;
        theta.add_scaled(1.0, &batch.update);
        log_batch(logger, &batch, start);
    }
    logger.flush();
    Ok(())
}

fn log_batch<P: ParameterVector>(
    logger: &mut dyn StatsLogger,
    batch: &BatchUpdate<P>,
    start: Instant,
) {
    logger.log_scalar("batch/mean_return", batch.mean_return);
    logger.log_scalar("batch/return_stddev", batch.return_stddev);
    logger.log_scalar("batch/mean_episode_length", batch.mean_episode_length);
    logger.log_scalar("batch/update_norm", batch.update.norm());
    logger.log_duration("batch/time", start.elapsed());
    logger.log_counter_increment("update/count", 1);
    logger.group_end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::evaluate;
    use crate::linalg::Vector;
    use crate::logging::testing::RecordingLogger;
    use crate::policy::{GaussianExploration, Greedy};
    use crate::testing::{ConstantNoise, OriginWorld, ScriptedWorld, TargetWorld, ZeroWorld};
    use ndarray::{arr1, Array1};
    use rand::SeedableRng;
    use rstest::rstest;

    fn noise() -> GaussianExploration {
        GaussianExploration::new(0.5).unwrap()
    }

    #[test]
    fn zero_updates_leaves_theta() {
        let config = PowerConfig {
            num_updates: 0,
            ..PowerConfig::default()
        };
        let mut theta = Vector([0.5, -0.5]);
        let mut logger = RecordingLogger::default();
        train(
            &OriginWorld { reward: 1.0 },
            &noise(),
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(0),
            &mut logger,
        )
        .unwrap();
        assert_eq!(theta, Vector([0.5, -0.5]));
        assert_eq!(logger.groups, 0);
    }

    #[test]
    fn logs_each_update() {
        let config = PowerConfig {
            num_updates: 4,
            episodes_per_batch: 3,
            ..PowerConfig::default()
        };
        let mut theta = Vector([0.0]);
        let mut logger = RecordingLogger::default();
        train(
            &ZeroWorld,
            &noise(),
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(1),
            &mut logger,
        )
        .unwrap();
        assert_eq!(logger.groups, 4);
        assert_eq!(logger.scalars("batch/mean_return"), vec![0.0; 4]);
        assert_eq!(theta, Vector([0.0]));
    }

    #[test]
    fn update_added_to_theta() {
        // Each batch solves to an update of 0.25
        let world = ScriptedWorld::new(vec![1.0, 1.0]);
        let config = PowerConfig {
            num_updates: 3,
            episodes_per_batch: 2,
            ..PowerConfig::default()
        };
        let mut theta = Vector([0.7]);
        train(
            &world,
            &ConstantNoise(Vector([0.25])),
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(2),
            &mut (),
        )
        .unwrap();
        assert!((theta[0] - (0.7 + 3.0 * 0.25)).abs() < 1e-12, "{:?}", theta);
    }

    #[test]
    fn greedy_leaves_theta() {
        let world = ScriptedWorld::new(vec![1.0, 1.0]);
        let config = PowerConfig {
            num_updates: 3,
            episodes_per_batch: 2,
            ..PowerConfig::default()
        };
        let mut theta = Vector([0.7]);
        train(
            &world,
            &Greedy,
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(2),
            &mut (),
        )
        .unwrap();
        assert_eq!(theta, Vector([0.7]));
    }

    #[rstest]
    #[case::no_episodes(PowerConfig { episodes_per_batch: 0, ..PowerConfig::default() })]
    #[case::no_steps(PowerConfig { max_steps_per_episode: 0, ..PowerConfig::default() })]
    fn invalid_config_fails_before_simulation(#[case] config: PowerConfig) {
        let mut theta = Vector([1.0]);
        let err = train(
            &ZeroWorld,
            &noise(),
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(3),
            &mut (),
        )
        .unwrap_err();
        assert_eq!(err.iteration, 0);
        assert!(matches!(err.source, PowerError::InvalidConfiguration(_)));
        assert_eq!(theta, Vector([1.0]));
    }

    #[test]
    fn degenerate_batch_stops_training() {
        let mut theta = arr1(&[0.0, 0.0]);
        let err = train(
            &OriginWorld { reward: 1.0 },
            &noise(),
            &mut theta,
            &PowerConfig::default(),
            &mut Prng::seed_from_u64(4),
            &mut (),
        )
        .unwrap_err();
        assert_eq!(err.iteration, 0);
        assert!(matches!(err.source, PowerError::DegenerateWeight { .. }));
        assert_eq!(theta, Array1::<f64>::zeros(2));
    }

    #[test]
    fn learns_target_action() {
        let world = TargetWorld {
            target: 1.0,
            horizon: 0.5,
        };
        let config = PowerConfig {
            num_updates: 30,
            episodes_per_batch: 30,
            max_steps_per_episode: 10,
            ..PowerConfig::default()
        };
        let mut theta = arr1(&[0.0, 0.0]);
        let initial = evaluate(&world, &theta, config.max_steps_per_episode);
        let mut logger = RecordingLogger::default();
        train(
            &world,
            &noise(),
            &mut theta,
            &config,
            &mut Prng::seed_from_u64(5),
            &mut logger,
        )
        .unwrap();
        let last = evaluate(&world, &theta, config.max_steps_per_episode);
        assert!(last > initial, "return {} -> {}", initial, last);

        let returns = logger.scalars("batch/mean_return");
        assert_eq!(returns.len(), 30);
        assert!(returns[29] > returns[0]);
    }

    #[test]
    fn parallel_training_matches_serial() {
        let world = TargetWorld {
            target: 0.5,
            horizon: 0.4,
        };
        let config = PowerConfig {
            num_updates: 5,
            episodes_per_batch: 12,
            max_steps_per_episode: 10,
            ..PowerConfig::default()
        };
        let mut serial = arr1(&[0.1, 0.0]);
        train(
            &world,
            &noise(),
            &mut serial,
            &config,
            &mut Prng::seed_from_u64(6),
            &mut (),
        )
        .unwrap();
        let mut parallel = arr1(&[0.1, 0.0]);
        let parallel_config = PowerConfig {
            num_threads: 3,
            ..config
        };
        train(
            &world,
            &noise(),
            &mut parallel,
            &parallel_config,
            &mut Prng::seed_from_u64(6),
            &mut (),
        )
        .unwrap();
        for (a, b) in serial.iter().zip(&parallel) {
            assert!((a - b).abs() < 1e-8, "{} != {}", serial, parallel);
        }
    }

    #[test]
    fn config_serde_round_trip() {
        let config = PowerConfig {
            num_updates: 7,
            sigma: 0.25,
            ..PowerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PowerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let parsed: PowerConfig = serde_json::from_str(r#"{"num_updates": 3}"#).unwrap();
        assert_eq!(parsed.num_updates, 3);
        assert_eq!(parsed.sigma, 0.5);
        assert_eq!(parsed.episodes_per_batch, 20);
    }
}
