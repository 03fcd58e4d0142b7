//! Policy learning by Weighting Exploration with the Returns (PoWER).
//!
//! Episodic policy search for linear policies `action = θ · state`.
//! Each update rolls out a batch of episodes with parameter-space exploration noise,
//! weights the noise of every step by its undiscounted return-to-go,
//! and solves the resulting weighted least-squares problem in closed form.
//!
//! # Example
//! ```
//! use ndarray::{arr1, Array1};
//! use power_rl::{train, GaussianExploration, PowerConfig, Prng, World};
//! use rand::SeedableRng;
//!
//! /// Reward actions close to 1 on a fixed state.
//! struct Target;
//!
//! impl World<Array1<f64>> for Target {
//!     fn act(&self, state: &Array1<f64>, action: f64) -> (f64, Array1<f64>) {
//!         let reward = (-(action - 1.0).powi(2)).exp();
//!         (reward, arr1(&[1.0, state[1] + 1.0]))
//!     }
//!     fn is_terminal(&self, state: &Array1<f64>) -> bool {
//!         state[1] >= 3.0
//!     }
//! }
//!
//! let config = PowerConfig {
//!     num_updates: 5,
//!     ..PowerConfig::default()
//! };
//! let mut theta = arr1(&[0.0, 0.0]);
//! let policy = GaussianExploration::new(0.5).unwrap();
//! let mut rng = Prng::seed_from_u64(0);
//! train(&Target, &policy, &mut theta, &config, &mut rng, &mut ()).unwrap();
//! ```
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod batch;
pub mod episode;
mod error;
pub mod linalg;
pub mod logging;
pub mod policy;
#[cfg(test)]
mod testing;
pub mod train;
pub mod utils;
pub mod world;

pub use batch::{run_batch, BatchConfig, BatchUpdate};
pub use episode::{evaluate, run_episode, EpisodeAggregate, Trajectory};
pub use error::{PowerError, TrainError};
pub use linalg::{ParameterVector, WeightMatrix};
pub use policy::{ExplorationPolicy, GaussianExploration, GaussianExplorationConfig, Greedy};
pub use train::{train, PowerConfig};
pub use world::World;

/// Pseudo-random number generator used for exploration noise.
pub type Prng = rand_chacha::ChaCha8Rng;
