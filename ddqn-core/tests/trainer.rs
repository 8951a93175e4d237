use anyhow::{anyhow, Result};
use ddqn_core::{
    error::DqnError,
    record::{BufferedRecorder, NullRecorder, Record, RecordValue},
    replay_buffer::{ReplayBuffer, ReplayBufferConfig},
    Agent, Env, ExperienceBufferBase, Policy, ReplayBufferBase, Step, Trainer, TrainerConfig,
};
use std::path::Path;

/// A corridor of `length` cells. Action 1 moves right, action 0 stays.
/// Reaching the last cell terminates the episode with reward 1.
/// With `truncate_at`, an episode is cut off after that many steps.
#[derive(Clone, Default)]
struct CorridorConfig {
    length: usize,
    fail_at: Option<usize>,
    truncate_at: Option<usize>,
}

struct Corridor {
    length: usize,
    fail_at: Option<usize>,
    truncate_at: Option<usize>,
    pos: usize,
    n_steps: usize,
    episode_steps: usize,
}

impl Env for Corridor {
    type Config = CorridorConfig;
    type Obs = Vec<f32>;
    type Act = usize;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            length: config.length,
            fail_at: config.fail_at,
            truncate_at: config.truncate_at,
            pos: 0,
            n_steps: 0,
            episode_steps: 0,
        })
    }

    fn reset(&mut self) -> Result<(Self::Obs, Self::Info)> {
        self.pos = 0;
        self.episode_steps = 0;
        Ok((vec![0.0], ()))
    }

    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>> {
        self.n_steps += 1;
        self.episode_steps += 1;
        if Some(self.n_steps) == self.fail_at {
            return Err(anyhow!("simulator crashed"));
        }
        self.pos += *a;
        let is_terminated = self.pos >= self.length;
        let is_truncated = Some(self.episode_steps) == self.truncate_at;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        Ok(Step::new(
            vec![self.pos as f32],
            reward,
            is_terminated,
            is_truncated,
            (),
        ))
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn sample_action(&mut self) -> Self::Act {
        0
    }
}

type Buffer = ReplayBuffer<Vec<f32>, usize>;

/// Always moves right and inspects the buffer on every optimization call.
#[derive(Default)]
struct Forward {
    n_opts: usize,
    n_actions: Option<usize>,
    last_len: usize,
    n_terminal: usize,
    last_next_state: Option<Vec<f32>>,
}

impl Policy<Corridor> for Forward {
    fn sample(&mut self, _obs: &Vec<f32>) -> Result<usize> {
        Ok(1)
    }
}

impl Agent<Corridor, Buffer> for Forward {
    fn train(&mut self) {}

    fn eval(&mut self) {}

    fn is_train(&self) -> bool {
        true
    }

    fn n_actions(&self) -> Option<usize> {
        self.n_actions
    }

    fn opt_with_record(&mut self, buffer: &mut Buffer) -> Result<Record> {
        self.n_opts += 1;
        self.last_len = buffer.len();
        self.n_terminal = buffer.iter().filter(|t| t.is_terminal()).count();
        self.last_next_state = buffer.iter().last().and_then(|t| t.next_state.clone());
        if buffer.len() > 2 {
            let batch = buffer.batch(2)?;
            return Ok(Record::from_scalar("loss", batch.len() as f32));
        }
        Ok(Record::empty())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("forward.txt"), format!("{}", self.n_opts))?;
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn trainer(
    config: TrainerConfig,
    env_config: CorridorConfig,
    capacity: usize,
) -> Trainer<Corridor, Buffer> {
    let buffer_config = ReplayBufferConfig::default().capacity(capacity);
    Trainer::build(config, env_config, buffer_config)
}

#[test]
fn test_episode_loop() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let env_config = CorridorConfig {
        length: 3,
        ..Default::default()
    };
    let mut trainer = trainer(TrainerConfig::default().n_episodes(4), env_config, 100);
    let mut agent = Forward::default();
    let mut recorder = BufferedRecorder::new();

    let summaries = trainer.train(&mut agent, &mut recorder)?;

    assert_eq!(summaries.len(), 4);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.episode, i);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.total_reward, 1.0);
    }

    // One optimization call per environment step
    assert_eq!(trainer.env_steps(), 12);
    assert_eq!(agent.n_opts, 12);
    assert_eq!(agent.last_len, 12);

    // Only the last step of each episode is terminal
    assert_eq!(agent.n_terminal, 4);

    assert_eq!(recorder.len(), 4);
    let record = recorder.iter().last().unwrap();
    assert_eq!(record.get_scalar("episode")?, 3.0);
    assert_eq!(record.get_scalar("reward")?, 1.0);
    assert_eq!(record.get("loss"), Some(&RecordValue::Scalar(2.0)));
    Ok(())
}

#[test]
fn test_truncation_keeps_next_state() -> Result<()> {
    let env_config = CorridorConfig {
        length: 100,
        ..Default::default()
    };
    let config = TrainerConfig::default()
        .n_episodes(2)
        .max_steps_per_episode(Some(5));
    let mut trainer = trainer(config, env_config, 100);
    let mut agent = Forward::default();

    let summaries = trainer.train(&mut agent, &mut NullRecorder::default())?;

    assert_eq!(summaries.iter().map(|s| s.steps).collect::<Vec<_>>(), vec![5, 5]);
    assert_eq!(summaries[0].total_reward, 0.0);
    assert_eq!(agent.n_terminal, 0);
    Ok(())
}

#[test]
fn test_environment_truncation_ends_episode() -> Result<()> {
    let env_config = CorridorConfig {
        length: 100,
        truncate_at: Some(3),
        ..Default::default()
    };
    let mut trainer = trainer(TrainerConfig::default().n_episodes(2), env_config, 100);
    let mut agent = Forward::default();

    let summaries = trainer.train(&mut agent, &mut NullRecorder::default())?;

    assert_eq!(summaries.iter().map(|s| s.steps).collect::<Vec<_>>(), vec![3, 3]);
    assert_eq!(trainer.env_steps(), 6);
    assert_eq!(agent.last_len, 6);

    // Truncated transitions still bootstrap from the next observation
    assert_eq!(agent.n_terminal, 0);
    assert_eq!(agent.last_next_state, Some(vec![3.0]));
    Ok(())
}

#[test]
fn test_termination_wins_over_truncation() -> Result<()> {
    let env_config = CorridorConfig {
        length: 3,
        truncate_at: Some(3),
        ..Default::default()
    };
    let mut trainer = trainer(TrainerConfig::default().n_episodes(2), env_config, 100);
    let mut agent = Forward::default();

    let summaries = trainer.train(&mut agent, &mut NullRecorder::default())?;

    assert_eq!(summaries.iter().map(|s| s.steps).collect::<Vec<_>>(), vec![3, 3]);
    assert_eq!(agent.n_terminal, 2);
    assert_eq!(agent.last_next_state, None);
    Ok(())
}

#[test]
fn test_warmup_samples_from_action_space() -> Result<()> {
    let env_config = CorridorConfig {
        length: 2,
        ..Default::default()
    };
    let config = TrainerConfig::default().n_episodes(2).warmup_period(3);
    let mut trainer = trainer(config, env_config, 100);
    let mut agent = Forward::default();

    let summaries = trainer.train(&mut agent, &mut NullRecorder::default())?;

    // The action space sampler of the corridor never moves.
    assert_eq!(summaries[0].steps, 5);
    assert_eq!(summaries[1].steps, 2);
    Ok(())
}

#[test]
fn test_environment_error_is_propagated() {
    let env_config = CorridorConfig {
        length: 3,
        fail_at: Some(5),
        ..Default::default()
    };
    let mut trainer = trainer(TrainerConfig::default().n_episodes(3), env_config, 100);
    let mut agent = Forward::default();

    let err = trainer
        .train(&mut agent, &mut NullRecorder::default())
        .unwrap_err();

    assert_eq!(err.to_string(), "simulator crashed");
    assert_eq!(agent.n_opts, 4);
}

#[test]
fn test_action_space_mismatch() {
    let env_config = CorridorConfig {
        length: 3,
        ..Default::default()
    };
    let mut trainer = trainer(TrainerConfig::default().n_episodes(1), env_config, 100);
    let mut agent = Forward {
        n_actions: Some(4),
        ..Default::default()
    };

    let err = trainer
        .train(&mut agent, &mut NullRecorder::default())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DqnError>(),
        Some(DqnError::InvalidConfig(_))
    ));
}

#[test]
fn test_model_is_saved() -> Result<()> {
    let dir = tempdir::TempDir::new("trainer")?;
    let env_config = CorridorConfig {
        length: 3,
        ..Default::default()
    };
    let config = TrainerConfig::default()
        .n_episodes(4)
        .save_interval(2)
        .model_dir(dir.path().to_string_lossy());
    let mut trainer = trainer(config, env_config, 100);
    let mut agent = Forward::default();

    trainer.train(&mut agent, &mut NullRecorder::default())?;

    assert!(dir.path().join("2").join("forward.txt").exists());
    assert!(dir.path().join("4").join("forward.txt").exists());
    assert!(dir.path().join("final").join("forward.txt").exists());
    Ok(())
}

#[test]
fn test_final_save_error_is_propagated() -> Result<()> {
    let dir = tempdir::TempDir::new("trainer")?;
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory")?;
    let env_config = CorridorConfig {
        length: 3,
        ..Default::default()
    };
    let config = TrainerConfig::default()
        .n_episodes(1)
        .model_dir(blocker.join("model").to_string_lossy());
    let mut trainer = trainer(config, env_config, 100);
    let mut agent = Forward::default();

    let result = trainer.train(&mut agent, &mut NullRecorder::default());

    assert!(result.is_err());
    assert_eq!(agent.n_opts, 3);
    Ok(())
}
