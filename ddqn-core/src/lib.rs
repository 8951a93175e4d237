#![warn(missing_docs)]
//! Backend-independent core of a Double-DQN learner.
//!
//! This crate provides the interfaces of environments and agents, the
//! [`Transition`] record, a fixed-capacity [`ReplayBuffer`](replay_buffer::ReplayBuffer)
//! and the episode loop driving training ([`Trainer`]). Value-function
//! approximators and the learning update live in backend crates.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, Transition,
};

mod trainer;
pub use trainer::{EpisodeSummary, Trainer, TrainerConfig};
