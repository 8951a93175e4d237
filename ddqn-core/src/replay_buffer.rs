//! A generic implementation of replay buffer.
mod base;
mod config;
pub use base::ReplayBuffer;
pub use config::ReplayBufferConfig;
