//! Fixed-capacity ring buffer of transitions.
use super::ReplayBufferConfig;
use crate::{error::DqnError, ExperienceBufferBase, ReplayBufferBase, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A replay buffer holding the most recent `capacity` transitions.
///
/// Once full, a push overwrites the oldest transition. Batches are sampled
/// uniformly without replacement.
pub struct ReplayBuffer<O, A> {
    capacity: usize,

    // Next write position once the buffer is full.
    i: usize,
    data: Vec<Transition<O, A>>,
    rng: StdRng,
}

impl<O, A> ReplayBuffer<O, A> {
    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        let (newer, older) = if self.data.len() < self.capacity {
            self.data.split_at(0)
        } else {
            self.data.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }
}

impl<O, A> ExperienceBufferBase for ReplayBuffer<O, A> {
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;

        Ok(())
    }
}

impl<O: Clone, A: Clone> ReplayBufferBase for ReplayBuffer<O, A> {
    type Config = ReplayBufferConfig;
    type Batch = Vec<Transition<O, A>>;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(DqnError::InvalidConfig(
                "capacity of replay buffer must be positive".to_string(),
            )
            .into());
        }

        Ok(Self {
            capacity: config.capacity,
            i: 0,
            data: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let available = self.data.len();
        if size > available {
            return Err(DqnError::InsufficientData {
                requested: size,
                available,
            }
            .into());
        }

        Ok(index::sample(&mut self.rng, available, size)
            .into_iter()
            .map(|ix| self.data[ix].clone())
            .collect())
    }
}
