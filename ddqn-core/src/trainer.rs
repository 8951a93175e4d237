//! Train [`Agent`].
mod config;
use crate::{
    error::DqnError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, ExperienceBufferBase, ReplayBufferBase, Transition,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of a finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Index of the episode, starting from 0.
    pub episode: usize,

    /// Sum of the rewards in the episode.
    pub total_reward: f32,

    /// The number of environment steps in the episode.
    pub steps: usize,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode loop.
///
/// # Training loop
///
/// For each of `n_episodes` episodes:
///
/// 1. Reset [`Env`] and take the initial observation `o_0`.
/// 2. Select an action `a_t` with the agent ([`Policy::sample`]). During the
///    warmup period the action is sampled from the action space instead.
/// 3. Step the environment, observing `o_t+1`, `r_t`, `terminated` and `truncated`.
/// 4. Push `Transition(o_t, a_t, o_t+1, r_t)` into the replay buffer, where
///    `o_t+1` is replaced by `None` if `terminated`.
/// 5. Call [`Agent::opt_with_record`], which runs a learning update when the
///    buffer holds enough transitions and then updates the target network.
/// 6. Back to step 2 until `terminated` or `truncated`.
///
/// The summaries of the episodes are returned in order from [`Trainer::train`].
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[Trainer]
///     C -->|Transition|D[ReplayBufferBase]
///     D -->|Batch|A
/// ```
///
/// [`Policy::sample`]: crate::Policy::sample
pub struct Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    n_episodes: usize,
    max_steps_per_episode: Option<usize>,
    warmup_period: usize,
    log_interval: usize,
    flush_record_interval: usize,
    save_interval: usize,
    model_dir: Option<String>,
    seed: i64,

    /// Environment steps over the whole run.
    env_steps: usize,
}

impl<E, R> Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            replay_buffer_config,
            n_episodes: config.n_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            warmup_period: config.warmup_period,
            log_interval: config.log_interval.max(1),
            flush_record_interval: config.flush_record_interval.max(1),
            save_interval: config.save_interval,
            model_dir: config.model_dir,
            seed: config.seed,
            env_steps: 0,
        }
    }

    /// Environment steps taken so far.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(()) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    /// Runs a single episode.
    ///
    /// Returns the summary of the episode and a record holding the summary
    /// together with the mean loss of the learning updates in the episode.
    pub fn run_episode<A>(
        &mut self,
        env: &mut E,
        buffer: &mut R,
        agent: &mut A,
        episode: usize,
    ) -> Result<(EpisodeSummary, Record)>
    where
        A: Agent<E, R>,
    {
        let (mut obs, _) = env.reset()?;
        let mut total_reward = 0f32;
        let mut steps = 0;
        let mut loss_total = 0f32;
        let mut n_updates = 0;
        let mut record = Record::empty();

        loop {
            let act = if self.env_steps < self.warmup_period {
                env.sample_action()
            } else {
                agent.sample(&obs)?
            };
            let step = env.step(&act)?;
            self.env_steps += 1;
            steps += 1;
            total_reward += step.reward;

            let is_terminated = step.is_terminated;
            let is_done = step.is_done()
                || self
                    .max_steps_per_episode
                    .map_or(false, |max_steps| steps >= max_steps);
            let next_state = match is_terminated {
                true => None,
                false => Some(step.obs.clone()),
            };
            buffer.push(Transition::new(obs, act, next_state, step.reward))?;

            let record_agent = agent.opt_with_record(buffer)?;
            if let Ok(loss) = record_agent.get_scalar("loss") {
                loss_total += loss;
                n_updates += 1;
            }
            record.merge_inplace(record_agent);

            if is_done {
                break;
            }
            obs = step.obs;
        }

        let summary = EpisodeSummary {
            episode,
            total_reward,
            steps,
        };

        record.insert("episode", Scalar(episode as f32));
        record.insert("reward", Scalar(total_reward));
        record.insert("steps", Scalar(steps as f32));
        if n_updates > 0 {
            record.insert("loss", Scalar(loss_total / n_updates as f32));
        }

        Ok((summary, record))
    }

    /// Train the agent.
    ///
    /// Builds the environment and the replay buffer from the configurations,
    /// runs `n_episodes` episodes and returns their summaries in order.
    pub fn train<A>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<Vec<EpisodeSummary>>
    where
        A: Agent<E, R>,
    {
        let mut env = E::build(&self.env_config, self.seed)?;
        let mut buffer = R::build(&self.replay_buffer_config)?;

        if let Some(n_actions) = agent.n_actions() {
            if n_actions != env.n_actions() {
                return Err(DqnError::InvalidConfig(format!(
                    "agent chooses from {} actions, but the environment has {}",
                    n_actions,
                    env.n_actions()
                ))
                .into());
            }
        }

        let mut summaries = Vec::with_capacity(self.n_episodes);
        agent.train();

        for episode in 0..self.n_episodes {
            let (summary, record) = self.run_episode(&mut env, &mut buffer, agent, episode)?;

            if episode % self.log_interval == 0 {
                info!(
                    "Episode {}: reward = {:.3}, steps = {}, buffer = {}",
                    episode,
                    summary.total_reward,
                    summary.steps,
                    buffer.len()
                );
            }

            recorder.store(record);
            if (episode + 1) % self.flush_record_interval == 0 {
                recorder.flush(episode as _);
            }

            if let Some(model_dir) = &self.model_dir {
                if self.save_interval > 0 && (episode + 1) % self.save_interval == 0 {
                    let path = Path::new(model_dir).join(format!("{}", episode + 1));
                    Self::save_model(agent, &path);
                }
            }

            summaries.push(summary);
        }

        recorder.flush(self.n_episodes as _);
        if let Some(model_dir) = &self.model_dir {
            let path = Path::new(model_dir).join("final");
            agent.save_params(&path)?;
            info!("Saved the final model in {:?}.", path);
        }

        Ok(summaries)
    }
}
