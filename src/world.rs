//! The world (environment) interface consumed by policy search.

/// A deterministic or stochastic world with real-vector states and scalar actions.
///
/// The world does not manage any episode state itself:
/// the current state is owned by the caller and passed in on every call.
/// Episodes always start from the zero state.
pub trait World<P> {
    /// Take `action` in `state`.
    ///
    /// # Returns
    /// * `reward` - The reward for this transition.
    /// * `next_state` - The resulting state.
    fn act(&self, state: &P, action: f64) -> (f64, P);

    /// Whether `state` ends the episode.
    fn is_terminal(&self, state: &P) -> bool;
}

impl<P, W: World<P> + ?Sized> World<P> for &'_ W {
    fn act(&self, state: &P, action: f64) -> (f64, P) {
        W::act(self, state, action)
    }
    fn is_terminal(&self, state: &P) -> bool {
        W::is_terminal(self, state)
    }
}

impl<P, W: World<P> + ?Sized> World<P> for Box<W> {
    fn act(&self, state: &P, action: f64) -> (f64, P) {
        W::act(self, state, action)
    }
    fn is_terminal(&self, state: &P) -> bool {
        W::is_terminal(self, state)
    }
}
