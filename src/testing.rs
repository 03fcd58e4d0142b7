//! Worlds and policies for testing
use crate::linalg::ParameterVector;
use crate::policy::ExplorationPolicy;
use crate::world::World;
use crate::Prng;

/// World with a step counter in coordinate 0 that pays out a fixed reward sequence.
///
/// The episode ends once every reward has been paid.
/// States after the initial one are never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedWorld {
    pub rewards: Vec<f64>,
}

impl ScriptedWorld {
    pub fn new(rewards: Vec<f64>) -> Self {
        Self { rewards }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn step_index<P: ParameterVector>(state: &P) -> usize {
        let unit = P::from_fn(state.dim(), |i| if i == 0 { 1.0 } else { 0.0 });
        unit.dot(state).round() as usize
    }
}

impl<P: ParameterVector> World<P> for ScriptedWorld {
    fn act(&self, state: &P, _action: f64) -> (f64, P) {
        let step = Self::step_index(state);
        let reward = self.rewards.get(step).copied().unwrap_or(0.0);
        let mut next_state = state.clone();
        next_state.add_scaled(1.0, &P::from_fn(state.dim(), |i| if i == 0 { 1.0 } else { 0.0 }));
        (reward, next_state)
    }

    fn is_terminal(&self, state: &P) -> bool {
        Self::step_index(state) >= self.rewards.len()
    }
}

/// World that never pays a reward and terminates after one step.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ZeroWorld;

impl<P: ParameterVector> World<P> for ZeroWorld {
    fn act(&self, state: &P, _action: f64) -> (f64, P) {
        (0.0, P::zeros(state.dim()))
    }

    fn is_terminal(&self, _state: &P) -> bool {
        true
    }
}

/// World that pays a constant reward and never leaves the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OriginWorld {
    pub reward: f64,
}

impl<P: ParameterVector> World<P> for OriginWorld {
    fn act(&self, state: &P, _action: f64) -> (f64, P) {
        (self.reward, P::zeros(state.dim()))
    }

    fn is_terminal(&self, _state: &P) -> bool {
        false
    }
}

/// World that rewards actions close to a target value.
///
/// The state is `[1, t]` where `t` advances by `0.1` per step until it reaches `horizon`.
/// The reward is `exp(-(action - target)²)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TargetWorld {
    pub target: f64,
    pub horizon: f64,
}

impl<P: ParameterVector> World<P> for TargetWorld {
    fn act(&self, state: &P, action: f64) -> (f64, P) {
        let t = P::from_fn(state.dim(), |i| if i == 1 { 1.0 } else { 0.0 }).dot(state);
        let next_state = P::from_fn(state.dim(), |i| match i {
            0 => 1.0,
            1 => t + 0.1,
            _ => 0.0,
        });
        let reward = (-(action - self.target).powi(2)).exp();
        (reward, next_state)
    }

    fn is_terminal(&self, state: &P) -> bool {
        let t = P::from_fn(state.dim(), |i| if i == 1 { 1.0 } else { 0.0 }).dot(state);
        t >= self.horizon - 1e-9
    }
}

/// Linear policy that always adds the same noise vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNoise<P>(pub P);

impl<P: ParameterVector> ExplorationPolicy<P> for ConstantNoise<P> {
    fn sample(&self, theta: &P, state: &P, _: &mut Prng) -> (f64, P) {
        (theta.dot(state) + self.0.dot(state), self.0.clone())
    }
}

/// Wraps a world so that every state it reports is multiplied by `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaled<W> {
    pub world: W,
    pub scale: f64,
}

impl<W> Scaled<W> {
    fn unscale<P: ParameterVector>(&self, state: &P) -> P {
        let mut state = state.clone();
        state.mul_scalar(self.scale.recip());
        state
    }
}

impl<P: ParameterVector, W: World<P>> World<P> for Scaled<W> {
    fn act(&self, state: &P, action: f64) -> (f64, P) {
        let (reward, mut next_state) = self.world.act(&self.unscale(state), action);
        next_state.mul_scalar(self.scale);
        (reward, next_state)
    }

    fn is_terminal(&self, state: &P) -> bool {
        self.world.is_terminal(&self.unscale(state))
    }
}
