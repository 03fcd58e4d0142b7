//! Episode rollout and per-episode return-weighted aggregates.
use crate::error::PowerError;
use crate::linalg::{ParameterVector, WeightMatrix};
use crate::policy::{ExplorationPolicy, Greedy};
use crate::world::World;
use crate::Prng;
use rand::SeedableRng;

/// The step-aligned record of a single episode.
///
/// `rewards[i]`, `epsilons[i]` and `states[i]` all describe step `i`,
/// where `states[i]` is the state in which the action was taken.
/// A trajectory always has at least one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<P> {
    rewards: Vec<f64>,
    epsilons: Vec<P>,
    states: Vec<P>,
}

impl<P> Trajectory<P> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            rewards: Vec::with_capacity(capacity),
            epsilons: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, reward: f64, epsilon: P, state: P) {
        self.rewards.push(reward);
        self.epsilons.push(epsilon);
        self.states.push(state);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Per-step rewards.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Per-step exploration noise.
    pub fn epsilons(&self) -> &[P] {
        &self.epsilons
    }

    /// Per-step pre-transition states.
    pub fn states(&self) -> &[P] {
        &self.states
    }

    /// The undiscounted return-to-go of each step.
    pub fn returns_to_go(&self) -> Vec<f64> {
        let mut returns = self.rewards.clone();
        returns_to_go(&mut returns);
        returns
    }
}

/// Run one episode from the zero state.
///
/// Always takes at least one step, then stops once `max_steps` steps have been taken
/// or the world reports the current state as terminal.
pub fn rollout<P, W, T>(
    world: &W,
    policy: &T,
    theta: &P,
    max_steps: usize,
    rng: &mut Prng,
) -> Trajectory<P>
where
    P: ParameterVector,
    W: World<P> + ?Sized,
    T: ExplorationPolicy<P> + ?Sized,
{
    // Trajectories may end long before max_steps so cap the preallocation
    let mut trajectory = Trajectory::with_capacity(max_steps.clamp(1, 1024));
    let mut state = P::zeros(theta.dim());
    loop {
        let (action, epsilon) = policy.sample(theta, &state, rng);
        let (reward, next_state) = world.act(&state, action);
        trajectory.push(reward, epsilon, state);
        state = next_state;
        if trajectory.len() >= max_steps || world.is_terminal(&state) {
            break;
        }
    }
    trajectory
}

/// Replace each reward by the undiscounted sum of itself and all later rewards.
pub fn returns_to_go(rewards: &mut [f64]) {
    let mut total = 0.0;
    for reward in rewards.iter_mut().rev() {
        total += *reward;
        *reward = total;
    }
}

/// Return-weighted sums from one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeAggregate<P: ParameterVector> {
    /// `Σᵢ Wᵢ Qᵢ`
    pub weighted_matrix: P::Weight,
    /// `Σᵢ Wᵢ εᵢ Qᵢ`
    pub weighted_vector: P,
    /// Total episode return (the return-to-go of step 0).
    pub initial_return: f64,
    /// Number of steps in the episode.
    pub length: usize,
}

impl<P: ParameterVector> Trajectory<P> {
    /// Compute the return-weighted matrix and vector sums of this trajectory.
    ///
    /// The weight of step 0 is the identity.
    /// The weight of step `i > 0` is `sᵢ sᵢᵀ / (sᵢᵀ σ sᵢ)`.
    ///
    /// # Errors
    /// [`PowerError::DegenerateWeight`] if the normaliser `sᵢᵀ σ sᵢ` of some step is
    /// zero or not finite.
    /// The weight equals `ŝᵢ ŝᵢᵀ / σ` for the unit state `ŝᵢ`, so any other
    /// state is accepted regardless of its scale.
    pub fn aggregate(mut self, sigma: f64) -> Result<EpisodeAggregate<P>, PowerError> {
        returns_to_go(&mut self.rewards);
        let dim = self.states.first().map_or(0, ParameterVector::dim);
        let mut weighted_matrix = P::Weight::zeros(dim);
        let mut weighted_vector = P::zeros(dim);

        let steps = self.rewards.iter().zip(&self.epsilons).zip(&self.states);
        for (step, ((&q, epsilon), state)) in steps.enumerate() {
            if step == 0 {
                weighted_matrix.add_scaled(q, &P::Weight::identity(dim));
                weighted_vector.add_scaled(q, epsilon);
                continue;
            }
            let norm = state.norm();
            if !(norm > 0.0 && norm.is_finite() && sigma != 0.0 && sigma.is_finite()) {
                return Err(PowerError::DegenerateWeight {
                    step,
                    quadratic_form: sigma * state.dot(state),
                });
            }
            let mut unit = state.clone();
            unit.mul_scalar(norm.recip());
            let mut weight = unit.outer(&unit);
            weight.mul_scalar(sigma.recip());
            weighted_matrix.add_scaled(q, &weight);
            weighted_vector.add_scaled(q, &weight.mul_vec(epsilon));
        }

        Ok(EpisodeAggregate {
            weighted_matrix,
            weighted_vector,
            initial_return: self.rewards.first().copied().unwrap_or(0.0),
            length: self.rewards.len(),
        })
    }
}

/// Run one episode and compute its return-weighted aggregates.
///
/// # Errors
/// See [`Trajectory::aggregate`].
pub fn run_episode<P, W, T>(
    world: &W,
    policy: &T,
    theta: &P,
    sigma: f64,
    max_steps: usize,
    rng: &mut Prng,
) -> Result<EpisodeAggregate<P>, PowerError>
where
    P: ParameterVector,
    W: World<P> + ?Sized,
    T: ExplorationPolicy<P> + ?Sized,
{
    rollout(world, policy, theta, max_steps, rng).aggregate(sigma)
}

/// Total return of one noise-free episode under `theta`.
pub fn evaluate<P, W>(world: &W, theta: &P, max_steps: usize) -> f64
where
    P: ParameterVector,
    W: World<P> + ?Sized,
{
    // Greedy never draws from the generator
    let mut rng = Prng::seed_from_u64(0);
    rollout(world, &Greedy, theta, max_steps, &mut rng)
        .rewards()
        .iter()
        .sum()
}
