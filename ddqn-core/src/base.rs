//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
mod transition;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step};
pub use transition::Transition;

/// An observation of an environment.
///
/// Observations are flat feature vectors, which is what a value-function
/// approximator consumes.
pub trait Obs: Clone + Debug {
    /// Returns the features of the observation.
    fn as_slice(&self) -> &[f32];

    /// Returns the number of features.
    fn dim(&self) -> usize {
        self.as_slice().len()
    }
}

impl Obs for Vec<f32> {
    fn as_slice(&self) -> &[f32] {
        &self[..]
    }
}

/// A discrete action of an environment.
pub trait Act: Clone + Debug {
    /// Constructs the action with the given index in `0..n_actions`.
    fn from_index(ix: usize) -> Self;

    /// Returns the index of the action.
    fn index(&self) -> usize;
}

impl Act for usize {
    fn from_index(ix: usize) -> Self {
        ix
    }

    fn index(&self) -> usize {
        *self
    }
}
