//! Exploration strategy of DQN.
use anyhow::{bail, Result};
use candle_core::{shape::D, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays exponentially with the number of actions taken so far:
///
/// `eps = eps_end + (eps_start - eps_end) * exp(-steps_done / eps_decay)`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Number of actions selected in training mode.
    #[serde(default)]
    pub steps_done: usize,

    /// Epsilon at the first step.
    pub eps_start: f64,

    /// Asymptotic value of epsilon.
    pub eps_end: f64,

    /// Time constant of the decay, in steps.
    pub eps_decay: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            steps_done: 0,
            eps_start: 0.9,
            eps_end: 0.05,
            eps_decay: 1000.0,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer with the default schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns epsilon after the given number of steps.
    pub fn epsilon_at(&self, steps: usize) -> f64 {
        self.eps_end + (self.eps_start - self.eps_end) * (-(steps as f64) / self.eps_decay).exp()
    }

    /// Returns epsilon for the next action.
    pub fn epsilon(&self) -> f64 {
        self.epsilon_at(self.steps_done)
    }

    /// Takes an action based on action values of a single observation.
    ///
    /// * `a` - action values, the last dimension runs over actions.
    pub fn action(&mut self, a: &Tensor, rng: &mut impl Rng) -> Result<usize> {
        let eps = self.epsilon();
        self.steps_done += 1;

        if rng.gen::<f64>() > eps {
            greedy(a)
        } else {
            match a.dims().last() {
                Some(&n_actions) if n_actions > 0 => Ok(rng.gen_range(0..n_actions)),
                _ => bail!("Empty action values: {:?}", a.shape()),
            }
        }
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the asymptotic epsilon value.
    pub fn eps_end(mut self, v: f64) -> Self {
        self.eps_end = v;
        self
    }

    /// Set the time constant of the decay.
    pub fn eps_decay(mut self, v: f64) -> Self {
        self.eps_decay = v;
        self
    }
}

/// Index of the largest action value of a single observation.
pub(super) fn greedy(a: &Tensor) -> Result<usize> {
    let ix = a.argmax(D::Minus1)?.flatten_all()?.to_vec1::<u32>()?;
    Ok(ix[0] as usize)
}
