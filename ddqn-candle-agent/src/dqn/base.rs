//! Double-DQN agent implemented with candle.
use super::{
    config::DqnConfig,
    explorer::{greedy, EpsilonGreedy},
    model::DqnModel,
};
use crate::{
    model::SubModel1,
    util::{smooth_l1_loss, track, OutDim},
};
use anyhow::{bail, Result};
use candle_core::{shape::D, Device, Tensor};
use ddqn_core::{
    error::DqnError,
    record::{Record, RecordValue},
    Act, Agent, Configurable, Env, ExperienceBufferBase, Obs, Policy, ReplayBufferBase,
    Transition,
};
use log::{debug, info};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

/// Returns the targets of the action values, `reward + discount_factor * next_value`.
///
/// `next_value` must be zero for terminal transitions, so that their target
/// is exactly the reward.
pub fn td_targets(reward: &[f32], next_value: &[f32], discount_factor: f64) -> Vec<f32> {
    let gamma = discount_factor as f32;
    reward
        .iter()
        .zip(next_value.iter())
        .map(|(r, v)| r + gamma * v)
        .collect()
}

#[allow(dead_code)]
/// Double-DQN agent implemented with candle.
///
/// The greedy action at the next state is chosen by the policy network and
/// evaluated by the target network. The target network follows the policy
/// network by a soft update at every call of [`Agent::opt_with_record`].
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase<Batch = Vec<Transition<E::Obs, E::Act>>> + ExperienceBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) phantom: PhantomData<(E, R)>,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) tau: f64,
    pub(in crate::dqn) clip_grad_value: Option<f64>,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    rng: SmallRng,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase<Batch = Vec<Transition<E::Obs, E::Act>>> + ExperienceBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Stacks observations into a tensor of shape `(n, obs_dim)`.
    fn obs_tensor(&self, obs: &[&E::Obs]) -> Result<Tensor> {
        let dim = obs.first().map(|o| o.dim()).unwrap_or(0);
        let mut data = Vec::with_capacity(obs.len() * dim);
        for o in obs.iter() {
            if o.dim() != dim {
                bail!("Observations with different dimensions: {} and {}", dim, o.dim());
            }
            data.extend_from_slice(o.as_slice());
        }
        Ok(Tensor::from_vec(data, (obs.len(), dim), &self.device)?)
    }

    /// Values of the next states in the batch, zero for terminal transitions.
    fn next_values(&self, batch: &[Transition<E::Obs, E::Act>]) -> Result<Vec<f32>> {
        let mut next_values = vec![0f32; batch.len()];
        let (ixs, next_obs): (Vec<usize>, Vec<&E::Obs>) = batch
            .iter()
            .enumerate()
            .filter_map(|(i, tr)| tr.next_state.as_ref().map(|s| (i, s)))
            .unzip();

        if !next_obs.is_empty() {
            let next_obs = self.obs_tensor(&next_obs)?;
            let best = self.qnet.forward(&next_obs)?.argmax_keepdim(D::Minus1)?;
            let values = self
                .qnet_tgt
                .forward(&next_obs)?
                .gather(&best, D::Minus1)?
                .squeeze(D::Minus1)?
                .to_vec1::<f32>()?;
            for (i, v) in ixs.into_iter().zip(values.into_iter()) {
                next_values[i] = v;
            }
        }

        Ok(next_values)
    }

    fn update_critic(&mut self, buffer: &mut R) -> Result<f32> {
        let batch = buffer.batch(self.batch_size)?;
        let batch_size = batch.len();

        let obs = self.obs_tensor(&batch.iter().map(|tr| &tr.state).collect::<Vec<_>>())?;
        let act = {
            let act = batch
                .iter()
                .map(|tr| tr.action.index() as u32)
                .collect::<Vec<_>>();
            Tensor::from_vec(act, (batch_size, 1), &self.device)?
        };
        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let reward = batch.iter().map(|tr| tr.reward).collect::<Vec<_>>();
            let next_values = self.next_values(&batch)?;
            let tgt = td_targets(&reward, &next_values, self.discount_factor);
            Tensor::from_vec(tgt, (batch_size,), &self.device)?
        };

        let loss = smooth_l1_loss(&pred, &tgt)?;
        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(DqnError::Divergence(format!("loss is {}", loss_value)).into());
        }

        self.qnet.backward_step(&loss, self.clip_grad_value)?;
        debug!("loss = {}", loss_value);

        Ok(loss_value)
    }

    /// Returns the explorer, including the number of actions taken in training mode.
    pub fn explorer(&self) -> &EpsilonGreedy {
        &self.explorer
    }

    /// Returns the number of learning updates performed so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns the action values of the given observation under the policy network.
    pub fn action_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let obs = self.obs_tensor(&[obs])?;
        Ok(self.qnet.forward(&obs)?.flatten_all()?.to_vec1::<f32>()?)
    }
}

impl<E, Q, R> Configurable for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase<Batch = Vec<Transition<E::Obs, E::Act>>> + ExperienceBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    type Config = DqnConfig<Q>;

    /// Constructs DQN agent.
    ///
    /// The target network starts as an exact copy of the policy network.
    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        let device = Device::try_from(config.device.unwrap_or(crate::Device::Cpu))?;
        let qnet = DqnModel::build(config.model_config.clone(), device.clone())?;
        let qnet_tgt = DqnModel::build(config.model_config, device.clone())?;
        track(qnet_tgt.get_varmap(), qnet.get_varmap(), 1.0)?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            tau: config.tau,
            clip_grad_value: config.clip_grad_value,
            train: config.train,
            explorer: config.explorer,
            device,
            n_opts: 0,
            phantom: PhantomData,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase<Batch = Vec<Transition<E::Obs, E::Act>>> + ExperienceBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Epsilon-greedy in training mode, greedy in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = self.obs_tensor(&[obs])?;
        let a = self.qnet.forward(&obs)?;
        let ix = if self.train {
            self.explorer.action(&a, &mut self.rng)?
        } else {
            greedy(&a)?
        };
        Ok(E::Act::from_index(ix))
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase<Batch = Vec<Transition<E::Obs, E::Act>>> + ExperienceBufferBase,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn n_actions(&self) -> Option<usize> {
        Some(self.qnet.out_dim)
    }

    /// Runs a learning update if the buffer holds more than `batch_size`
    /// transitions, then soft-updates the target network.
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        let mut record = Record::empty();

        if buffer.len() > self.batch_size {
            let loss = self.update_critic(buffer)?;
            self.n_opts += 1;
            record.insert("loss", RecordValue::Scalar(loss));
            record.insert("updated", RecordValue::Scalar(1.0));
        } else {
            record.insert("updated", RecordValue::Scalar(0.0));
        }

        track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), self.tau)?;
        record.insert(
            "epsilon",
            RecordValue::Scalar(self.explorer.epsilon() as f32),
        );

        Ok(record)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        info!("Save DQN agent to {:?}", path);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        info!("Load DQN agent from {:?}", path);
        Ok(())
    }
}
