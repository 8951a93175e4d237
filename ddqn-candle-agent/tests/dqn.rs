use anyhow::Result;
use ddqn_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
};
use ddqn_core::{
    record::BufferedRecorder,
    replay_buffer::{ReplayBuffer, ReplayBufferConfig},
    Agent, Configurable, Env, Step, Trainer, TrainerConfig,
};
use tempdir::TempDir;

/// A chain of `length` cells. Action 1 moves right, action 0 moves left.
/// Reaching the last cell terminates the episode with reward 1.
#[derive(Clone)]
struct ChainConfig {
    length: usize,
}

struct Chain {
    length: usize,
    pos: usize,
}

impl Chain {
    fn obs(&self) -> Vec<f32> {
        vec![self.pos as f32 / self.length as f32, 1.0]
    }
}

impl Env for Chain {
    type Config = ChainConfig;
    type Obs = Vec<f32>;
    type Act = usize;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            length: config.length,
            pos: 0,
        })
    }

    fn reset(&mut self) -> Result<(Self::Obs, Self::Info)> {
        self.pos = 0;
        Ok((self.obs(), ()))
    }

    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>> {
        match a {
            1 => self.pos += 1,
            _ => self.pos = self.pos.saturating_sub(1),
        }
        let is_terminated = self.pos >= self.length;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        Ok(Step::new(self.obs(), reward, is_terminated, false, ()))
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn sample_action(&mut self) -> Self::Act {
        1
    }
}

type Buffer = ReplayBuffer<Vec<f32>, usize>;
type ChainDqn = Dqn<Chain, Mlp, Buffer>;

fn dqn_config() -> DqnConfig<Mlp> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(2, vec![32, 32], 2, false))
        .opt_config(OptimizerConfig::Adam {
            lr: 1e-3,
            amsgrad: true,
            weight_decay: Some(0.01),
        });
    DqnConfig::default()
        .model_config(model_config)
        .batch_size(8)
        .tau(0.05)
        .explorer(EpsilonGreedy::new().eps_decay(50.0))
        .device(candle_core::Device::Cpu)
}

fn trainer(config: TrainerConfig) -> Trainer<Chain, Buffer> {
    let buffer_config = ReplayBufferConfig::default().capacity(500);
    Trainer::build(config, ChainConfig { length: 4 }, buffer_config)
}

#[test]
fn test_train_on_chain() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = TrainerConfig::default()
        .n_episodes(6)
        .max_steps_per_episode(Some(30));
    let mut trainer = trainer(config);
    let mut agent = ChainDqn::build(dqn_config())?;
    let mut recorder = BufferedRecorder::new();

    let summaries = trainer.train(&mut agent, &mut recorder)?;

    assert_eq!(summaries.len(), 6);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.episode, i);
        assert!(summary.steps >= 4 && summary.steps <= 30);
    }

    // One action selection per environment step, one update per step once
    // the buffer holds more than a batch
    let env_steps = trainer.env_steps();
    assert_eq!(agent.explorer().steps_done, env_steps);
    assert_eq!(agent.n_opts(), env_steps - 8);
    assert!(agent.explorer().epsilon() < 0.9);

    assert_eq!(recorder.len(), 6);
    for record in recorder.iter().skip(2) {
        assert!(record.get_scalar("loss")?.is_finite());
    }
    Ok(())
}

#[test]
fn test_checkpoint_round_trip() -> Result<()> {
    let dir = TempDir::new("ddqn_checkpoint")?;
    let model_dir = dir.path().join("model");
    let config = TrainerConfig::default()
        .n_episodes(2)
        .max_steps_per_episode(Some(20))
        .model_dir(model_dir.to_str().unwrap());
    let mut trainer = trainer(config);
    let mut agent = ChainDqn::build(dqn_config())?;
    trainer.train(&mut agent, &mut BufferedRecorder::new())?;

    let final_dir = model_dir.join("final");
    assert!(final_dir.join("qnet.safetensors").is_file());
    assert!(final_dir.join("qnet_tgt.safetensors").is_file());

    let mut restored = ChainDqn::build(dqn_config())?;
    restored.load_params(&final_dir)?;
    for obs in [vec![0.0, 1.0], vec![0.5, 1.0], vec![0.75, 1.0]] {
        assert_eq!(agent.action_values(&obs)?, restored.action_values(&obs)?);
    }
    Ok(())
}

#[test]
fn test_build_from_yaml() -> Result<()> {
    let dir = TempDir::new("ddqn_config")?;
    let path = dir.path().join("dqn.yaml");
    dqn_config().save(&path)?;

    let agent = ChainDqn::build_from_path(&path)?;
    assert_eq!(Agent::<Chain, Buffer>::n_actions(&agent), Some(2));
    Ok(())
}
