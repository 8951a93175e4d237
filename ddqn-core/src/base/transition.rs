//! Transition.

/// One step of experience `(o_t, a_t, o_t+1, r_t)`.
///
/// `next_state` is `None` when the episode terminated at this step, so that
/// no bootstrapped value is added to the learning target.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation before the action.
    pub state: O,

    /// Action taken.
    pub action: A,

    /// Observation after the action, `None` on termination.
    pub next_state: Option<O>,

    /// Reward.
    pub reward: f32,
}

impl<O, A> Transition<O, A> {
    /// Constructs a transition.
    pub fn new(state: O, action: A, next_state: Option<O>, reward: f32) -> Self {
        Self {
            state,
            action,
            next_state,
            reward,
        }
    }

    /// Returns `true` if the transition ends an episode by termination.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_none()
    }
}
