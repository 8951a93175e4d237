//! Environment.
use super::{Act, Info, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP, with a discrete action space.
///
/// The learning core treats the environment as an opaque simulator. Errors
/// returned by [`Env::reset`] and [`Env::step`] are propagated unchanged by the
/// [`Trainer`](crate::Trainer).
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns the initial observation.
    fn reset(&mut self) -> Result<(Self::Obs, Self::Info)>;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// The number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Samples an action uniformly from the action space.
    fn sample_action(&mut self) -> Self::Act;
}
