//! Configuration of DQN agent.
use super::{explorer::EpsilonGreedy, DqnModelConfig};
use crate::{model::SubModel1, util::OutDim, Device};
use anyhow::Result;
use candle_core::Tensor;
use ddqn_core::error::DqnError;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};

fn default_clip_grad_value() -> Option<f64> {
    Some(1.0)
}

fn default_seed() -> u64 {
    42
}

/// Constructs [`Dqn`](super::Dqn).
#[derive(Debug, Deserialize, Serialize)]
pub struct DqnConfig<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    pub(super) model_config: DqnModelConfig<Q::Config>,
    pub(super) batch_size: usize,
    pub(super) discount_factor: f64,
    pub(super) tau: f64,
    #[serde(default = "default_clip_grad_value")]
    pub(super) clip_grad_value: Option<f64>,
    pub(super) train: bool,
    pub(super) explorer: EpsilonGreedy,
    #[serde(default = "default_seed")]
    pub(super) seed: u64,
    pub device: Option<Device>,
    phantom: PhantomData<Q>,
}

impl<Q> Clone for DqnConfig<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            model_config: self.model_config.clone(),
            batch_size: self.batch_size,
            discount_factor: self.discount_factor,
            tau: self.tau,
            clip_grad_value: self.clip_grad_value,
            train: self.train,
            explorer: self.explorer.clone(),
            seed: self.seed,
            device: self.device,
            phantom: PhantomData,
        }
    }
}

impl<Q> PartialEq for DqnConfig<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.model_config == other.model_config
            && self.batch_size == other.batch_size
            && self.discount_factor == other.discount_factor
            && self.tau == other.tau
            && self.clip_grad_value == other.clip_grad_value
            && self.train == other.train
            && self.explorer == other.explorer
            && self.seed == other.seed
            && self.device == other.device
    }
}

impl<Q> Default for DqnConfig<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Constructs DQN builder with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 128,
            discount_factor: 0.995,
            tau: 0.005,
            clip_grad_value: default_clip_grad_value(),
            train: false,
            explorer: EpsilonGreedy::default(),
            seed: default_seed(),
            device: None,
            phantom: PhantomData,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Elementwise bound of gradients, `None` disables clamping.
    pub fn clip_grad_value(mut self, v: Option<f64>) -> Self {
        self.clip_grad_value = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Seed of the random number generator used for exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<Q::Config>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the output dimension of the configuration of the model.
    pub fn out_dim(mut self, out_dim: usize) -> Self {
        let model_config = self.model_config.clone();
        self.model_config = model_config.out_dim(out_dim);
        self
    }

    /// Device.
    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device = Some(device.location().into());
        self
    }

    /// Checks that hyper-parameters are in their valid ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(DqnError::InvalidConfig(msg).into()) };

        if self.batch_size == 0 {
            return invalid("batch_size must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid(format!(
                "discount_factor must be in [0, 1], got {}",
                self.discount_factor
            ));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return invalid(format!("tau must be in [0, 1], got {}", self.tau));
        }
        if let Some(clip) = self.clip_grad_value {
            if clip.is_nan() || clip <= 0.0 {
                return invalid(format!("clip_grad_value must be positive, got {}", clip));
            }
        }
        if self.explorer.eps_decay.is_nan() || self.explorer.eps_decay <= 0.0 {
            return invalid(format!(
                "eps_decay must be positive, got {}",
                self.explorer.eps_decay
            ));
        }
        Ok(())
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::{Mlp, MlpConfig}, opt::OptimizerConfig};
    use tempdir::TempDir;

    fn config() -> DqnConfig<Mlp> {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::new(4, vec![64, 64], 2, false))
            .opt_config(OptimizerConfig::default().learning_rate(1e-3));
        DqnConfig::default()
            .model_config(model_config)
            .batch_size(32)
            .discount_factor(0.99)
            .tau(0.01)
            .explorer(EpsilonGreedy::new().eps_decay(500.0))
            .device(candle_core::Device::Cpu)
    }

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = config();

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<Mlp>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let config = DqnConfig::<Mlp>::default();
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.discount_factor, 0.995);
        assert_eq!(config.tau, 0.005);
        assert_eq!(config.clip_grad_value, Some(1.0));
        assert_eq!(config.explorer, EpsilonGreedy::new());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_keeps_location() {
        let config = config();
        assert_eq!(config.device, Some(Device::Cpu));
    }

    #[test]
    fn test_validate() {
        let is_invalid = |config: DqnConfig<Mlp>| {
            matches!(
                config.validate().unwrap_err().downcast_ref::<DqnError>(),
                Some(DqnError::InvalidConfig(_))
            )
        };

        assert!(is_invalid(config().batch_size(0)));
        assert!(is_invalid(config().tau(1.5)));
        assert!(is_invalid(config().tau(-0.1)));
        assert!(is_invalid(config().discount_factor(1.01)));
        assert!(is_invalid(config().clip_grad_value(Some(0.0))));
        assert!(is_invalid(config().explorer(EpsilonGreedy::new().eps_decay(0.0))));
        assert!(config().tau(1.0).discount_factor(0.0).validate().is_ok());
    }
}
