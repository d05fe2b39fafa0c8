//! DQN solver implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, snapshot::DqnSnapshot};
use crate::{
    mlp::{Mlp, MlpConfig},
    opt::Optimizer,
    util::NamedTensors,
};
use anyhow::Result;
use candle_core::Device;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rlsolve_core::{
    config::SolverConfig,
    error::SolverError,
    record::{Record, RecordValue},
    util::{argmax, clip_loss, clip_reward},
    EnvSpace, ReplayMemory, Sarsa, Solver, Transition,
};
use serde_json::Value;

/// Runs a single masked update of `qnet` on transition `t` and returns the
/// clipped TD error.
///
/// Only the output of the taken action `a0` receives gradient.
fn update_q(
    qnet: &Mlp,
    opt: &mut Optimizer,
    config: &DqnConfig,
    t: &Transition<Vec<f32>>,
) -> Result<f64> {
    let q1 = qnet.forward_values(&t.s1)?;
    let q1_max = q1.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let target = t.r0 + config.gamma * q1_max as f64;

    let pred = qnet.forward(&t.s0)?.flatten_all()?.narrow(0, t.a0, 1)?;
    let q0 = pred.to_vec1::<f32>()?[0] as f64;
    let td_error = clip_loss(q0 - target, config.do_loss_clipping, config.loss_clamp);

    // The gradient of `pred * td_error` at the taken action is the clipped TD error.
    let loss = (pred * td_error)?.sum_all()?;
    opt.backward_step(&loss)?;
    trace!("a0={} q0={:.5} target={:.5}", t.a0, q0, target);

    Ok(td_error)
}

/// DQN solver.
///
/// The action-value function is a [`Mlp`] taking a state vector of
/// `number_of_states` elements and returning one value per action. Every
/// learning step runs one update on the latest transition and `replay_steps`
/// updates on transitions sampled from the replay memory.
pub struct DqnSolver<E, R = StdRng>
where
    E: EnvSpace,
    R: Rng,
{
    env: E,
    config: DqnConfig,
    rng: R,
    device: Device,
    number_of_states: usize,
    number_of_hidden_units: Vec<usize>,
    number_of_actions: usize,
    qnet: Mlp,
    opt: Optimizer,
    explorer: EpsilonGreedy,
    memory: Sarsa<Vec<f32>>,
    replay_memory: ReplayMemory<Transition<Vec<f32>>>,

    /// Number of learning steps since the last reset.
    learn_tick: usize,
    train: bool,
}

impl<E: EnvSpace> DqnSolver<E, StdRng> {
    /// Constructs a solver whose random number generator is seeded with
    /// the `seed` of the configuration.
    pub fn build(env: E, config: DqnConfig) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(env, config, rng)
    }
}

impl<E, R> DqnSolver<E, R>
where
    E: EnvSpace,
    R: Rng,
{
    /// Constructs a solver drawing all randomness from `rng`.
    pub fn with_rng(env: E, config: DqnConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let device = Device::try_from(config.device)?;
        let (number_of_states, number_of_actions) = sized_space(&env)?;
        let number_of_hidden_units = config.number_of_hidden_units.clone();
        let (qnet, opt) = build_network(
            &config,
            &device,
            MlpConfig::new(number_of_states, number_of_hidden_units.clone(), number_of_actions),
            &mut rng,
        )?;
        let explorer = EpsilonGreedy::new(
            config.epsilon_max,
            config.epsilon_min,
            config.epsilon_decay_period,
        );
        let replay_memory = ReplayMemory::new(config.experience_size)?;
        let train = config.training_mode;
        info!(
            "Built DQN solver: {} states, {:?} hidden units, {} actions",
            number_of_states, number_of_hidden_units, number_of_actions
        );

        Ok(Self {
            env,
            config,
            rng,
            device,
            number_of_states,
            number_of_hidden_units,
            number_of_actions,
            qnet,
            opt,
            explorer,
            memory: Sarsa::new(),
            replay_memory,
            learn_tick: 0,
            train,
        })
    }

    /// Epsilon used by the next decision.
    pub fn current_epsilon(&self) -> f64 {
        if self.train {
            self.explorer.epsilon(self.learn_tick)
        } else {
            self.config.epsilon
        }
    }

    /// Action values of `state`.
    pub fn q_values(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.check_state(state)?;
        self.qnet.forward_values(state)
    }

    /// Switches to training mode, where epsilon decays with learning steps.
    pub fn train(&mut self) {
        self.train = true;
    }

    /// Switches to evaluation mode, where the fixed `epsilon` is used.
    pub fn eval(&mut self) {
        self.train = false;
    }

    /// Returns `true` in training mode.
    pub fn is_train(&self) -> bool {
        self.train
    }

    /// Environment of the solver.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Configuration of the solver.
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Input size of the network.
    pub fn number_of_states(&self) -> usize {
        self.number_of_states
    }

    /// Widths of the hidden layers of the network.
    pub fn number_of_hidden_units(&self) -> &[usize] {
        &self.number_of_hidden_units
    }

    /// Output size of the network.
    pub fn number_of_actions(&self) -> usize {
        self.number_of_actions
    }

    /// Short-term memory.
    pub fn memory(&self) -> &Sarsa<Vec<f32>> {
        &self.memory
    }

    /// Replay memory.
    pub fn replay_memory(&self) -> &ReplayMemory<Transition<Vec<f32>>> {
        &self.replay_memory
    }

    /// Number of learning steps since the last reset.
    pub fn learn_tick(&self) -> usize {
        self.learn_tick
    }

    /// Network.
    pub fn network(&self) -> &Mlp {
        &self.qnet
    }

    fn check_state(&self, state: &[f32]) -> Result<()> {
        if state.len() == self.number_of_states {
            Ok(())
        } else {
            Err(SolverError::StateDimension {
                expected: self.number_of_states,
                got: state.len(),
            }
            .into())
        }
    }

    fn add_to_replay_memory(&mut self, t: Transition<Vec<f32>>) {
        if self.learn_tick % self.config.keep_experience_interval == 0 {
            self.replay_memory.push(t);
        }
        self.learn_tick += 1;
    }

    /// Runs `replay_steps` updates on sampled transitions and returns the sum
    /// of absolute TD errors.
    fn replay(&mut self) -> Result<f64> {
        let mut td_error = 0f64;

        for _ in 0..self.config.replay_steps {
            if let Some(t) = self.replay_memory.sample(&mut self.rng) {
                td_error += update_q(&self.qnet, &mut self.opt, &self.config, t)?.abs();
            }
        }

        Ok(td_error)
    }
}

fn sized_space<E: EnvSpace>(env: &E) -> Result<(usize, usize)> {
    let number_of_states = env.number_of_states();
    let number_of_actions = env.number_of_actions();
    if number_of_states == 0 || number_of_actions == 0 {
        return Err(SolverError::InvalidSpace {
            number_of_states,
            number_of_actions,
        }
        .into());
    }
    Ok((number_of_states, number_of_actions))
}

fn build_network<R: Rng>(
    config: &DqnConfig,
    device: &Device,
    mlp_config: MlpConfig,
    rng: &mut R,
) -> Result<(Mlp, Optimizer)> {
    let qnet = Mlp::build(mlp_config, device, rng)?;
    let opt = config
        .optimizer
        .clone()
        .learning_rate(config.alpha)
        .build(qnet.varmap().all_vars())?;
    Ok((qnet, opt))
}

impl<E, R> Solver for DqnSolver<E, R>
where
    E: EnvSpace,
    R: Rng,
{
    type State = [f32];

    fn reset(&mut self) -> Result<()> {
        let (number_of_states, number_of_actions) = sized_space(&self.env)?;
        let number_of_hidden_units = self.config.number_of_hidden_units.clone();
        let (qnet, opt) = build_network(
            &self.config,
            &self.device,
            MlpConfig::new(number_of_states, number_of_hidden_units.clone(), number_of_actions),
            &mut self.rng,
        )?;

        self.number_of_states = number_of_states;
        self.number_of_hidden_units = number_of_hidden_units;
        self.number_of_actions = number_of_actions;
        self.qnet = qnet;
        self.opt = opt;
        self.memory.clear();
        self.replay_memory.clear();
        self.learn_tick = 0;
        info!("Reset DQN solver");

        Ok(())
    }

    fn decide(&mut self, state: &[f32]) -> Result<usize> {
        self.check_state(state)?;

        let a = if self.rng.gen::<f64>() < self.current_epsilon() {
            self.rng.gen_range(0..self.number_of_actions)
        } else {
            let q = self.qnet.forward_values(state)?;
            argmax(&q).ok_or(SolverError::InvalidSpace {
                number_of_states: self.number_of_states,
                number_of_actions: q.len(),
            })?
        };

        self.memory.shift_state(state.to_vec(), a);
        Ok(a)
    }

    fn learn_with_record(&mut self, r: f64) -> Result<Record> {
        let mut record = Record::empty();

        if self.config.alpha > 0.0 {
            // Owned copies, independent of the short-term memory.
            if let Some(t) = self.memory.transition().map(|t| t.cloned()) {
                let td_error = update_q(&self.qnet, &mut self.opt, &self.config, &t)?;
                let s0 = t.s0.clone();
                self.add_to_replay_memory(t);
                let replay_td_error = self.replay()?;
                let q_values = self.qnet.forward_values(&s0)?;
                let n_updates = (1 + self.config.replay_steps) as f64;
                let loss = (td_error.abs() + replay_td_error) / n_updates;

                debug!(
                    "learn_tick={} td_error={:.5} loss={:.5} epsilon={:.4}",
                    self.learn_tick,
                    td_error,
                    loss,
                    self.current_epsilon()
                );
                record.insert("td_error", RecordValue::Scalar(td_error as f32));
                record.insert("loss", RecordValue::Scalar(loss as f32));
                record.insert("epsilon", RecordValue::Scalar(self.current_epsilon() as f32));
                record.insert(
                    "replay_len",
                    RecordValue::Scalar(self.replay_memory.len() as f32),
                );
                record.insert("q_values", RecordValue::Array1(q_values));
            }
        }

        let r = clip_reward(r, self.config.do_reward_clipping, self.config.reward_clamp);
        self.memory.shift_reward(r);

        Ok(record)
    }

    fn to_json(&self) -> Result<Value> {
        let snapshot = DqnSnapshot {
            number_of_states: self.number_of_states,
            number_of_hidden_units: self.number_of_hidden_units.clone(),
            number_of_actions: self.number_of_actions,
            network: NamedTensors::copy_from(self.qnet.varmap())?,
        };
        Ok(serde_json::to_value(snapshot)?)
    }

    /// Replaces the network with the one in the snapshot.
    ///
    /// Replay memory, short-term memory and the learning step counter are
    /// kept. The solver is unchanged if an error is returned.
    fn from_json(&mut self, json: &Value) -> Result<()> {
        let snapshot: DqnSnapshot = serde_json::from_value(json.clone())?;
        if snapshot.number_of_states == 0
            || snapshot.number_of_actions == 0
            || snapshot.number_of_hidden_units.is_empty()
        {
            return Err(SolverError::SnapshotMismatch(format!(
                "invalid network size {} x {:?} x {}",
                snapshot.number_of_states, snapshot.number_of_hidden_units, snapshot.number_of_actions
            ))
            .into());
        }

        // All parameters come from the snapshot; the solver's generator is not drawn from.
        let (qnet, opt) = build_network(
            &self.config,
            &self.device,
            MlpConfig::new(
                snapshot.number_of_states,
                snapshot.number_of_hidden_units.clone(),
                snapshot.number_of_actions,
            ),
            &mut StdRng::seed_from_u64(self.config.seed),
        )?;
        snapshot.network.copy_to(qnet.varmap())?;

        self.number_of_states = snapshot.number_of_states;
        self.number_of_hidden_units = snapshot.number_of_hidden_units;
        self.number_of_actions = snapshot.number_of_actions;
        self.qnet = qnet;
        self.opt = opt;
        info!(
            "Restored DQN network: {} states, {:?} hidden units, {} actions",
            self.number_of_states, self.number_of_hidden_units, self.number_of_actions
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[derive(Clone, Copy)]
    struct Space(usize, usize);

    impl EnvSpace for Space {
        fn number_of_states(&self) -> usize {
            self.0
        }

        fn number_of_actions(&self) -> usize {
            self.1
        }
    }

    fn one_hot(n: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0f32; n];
        v[i] = 1.0;
        v
    }

    fn small_config() -> DqnConfig {
        DqnConfig::default()
            .number_of_hidden_units(vec![8])
            .experience_size(100)
            .keep_experience_interval(1)
            .replay_steps(2)
    }

    fn parameters<E: EnvSpace, R: Rng>(solver: &DqnSolver<E, R>) -> Result<NamedTensors> {
        NamedTensors::copy_from(solver.network().varmap())
    }

    #[test]
    fn test_state_dimension_is_checked() -> Result<()> {
        let mut solver = DqnSolver::build(Space(3, 2), small_config())?;
        let err = solver.decide(&[1.0, 0.0]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SolverError>(),
            Some(&SolverError::StateDimension {
                expected: 3,
                got: 2
            })
        );
        assert!(solver.memory().is_empty());
        assert!(DqnSolver::build(Space(0, 2), small_config()).is_err());
        Ok(())
    }

    #[test]
    fn test_decide_returns_valid_actions() -> Result<()> {
        let mut solver = DqnSolver::build(Space(4, 3), small_config())?;
        for i in 0..50 {
            let a = solver.decide(&one_hot(4, i % 4))?;
            assert!(a < 3);
        }
        Ok(())
    }

    #[test]
    fn test_greedy_decision_follows_network() -> Result<()> {
        let config = small_config().training_mode(false).epsilon(0.0);
        let mut solver = DqnSolver::build(Space(4, 3), config)?;
        for i in 0..4 {
            let s = one_hot(4, i);
            let q = solver.q_values(&s)?;
            assert_eq!(solver.decide(&s)?, argmax(&q).unwrap());
        }
        Ok(())
    }

    #[test]
    fn test_epsilon_decays_with_learn_tick() -> Result<()> {
        let config = small_config()
            .epsilon_max(1.0)
            .epsilon_min(0.2)
            .epsilon_decay_period(4)
            .epsilon(0.05);
        let mut solver = DqnSolver::build(Space(2, 2), config)?;
        assert_eq!(solver.current_epsilon(), 1.0);

        let mut prev = solver.current_epsilon();
        for i in 0..10 {
            solver.decide(&one_hot(2, i % 2))?;
            solver.learn(1.0)?;
            let eps = solver.current_epsilon();
            assert!(eps <= prev);
            assert!(eps >= 0.2);
            prev = eps;
        }
        // The first call has no transition to learn from.
        assert_eq!(solver.learn_tick(), 9);
        assert_eq!(solver.current_epsilon(), 0.2);

        solver.eval();
        assert!(!solver.is_train());
        assert_eq!(solver.current_epsilon(), 0.05);
        solver.train();
        assert_eq!(solver.current_epsilon(), 0.2);
        Ok(())
    }

    #[test]
    fn test_alpha_zero_never_updates() -> Result<()> {
        let mut solver = DqnSolver::build(Space(3, 2), small_config().alpha(0.0))?;
        let before = parameters(&solver)?;

        for i in 0..30 {
            solver.decide(&one_hot(3, i % 3))?;
            let record = solver.learn_with_record(if i % 3 == 2 { 1.0 } else { -1.0 })?;
            assert!(record.is_empty());
        }

        assert_eq!(parameters(&solver)?, before);
        assert!(solver.replay_memory().is_empty());
        assert_eq!(solver.learn_tick(), 0);
        Ok(())
    }

    #[test]
    fn test_zero_reward_counts_as_transition() -> Result<()> {
        let mut solver = DqnSolver::build(Space(2, 2), small_config())?;
        solver.decide(&[1.0, 0.0])?;
        solver.learn(0.0)?;
        solver.decide(&[0.0, 1.0])?;
        let record = solver.learn_with_record(0.0)?;

        assert_eq!(solver.learn_tick(), 1);
        assert_eq!(record.get_scalar("replay_len")?, 1.0);
        let q = record.get_array1("q_values")?;
        assert_eq!(q, solver.q_values(&[1.0, 0.0])?);
        Ok(())
    }

    #[test]
    fn test_replay_stride_and_capacity() -> Result<()> {
        let config = small_config()
            .experience_size(3)
            .keep_experience_interval(2)
            .replay_steps(1);
        let mut solver = DqnSolver::build(Space(2, 2), config)?;

        for i in 0..20 {
            solver.decide(&one_hot(2, i % 2))?;
            solver.learn(0.5)?;
            assert!(solver.replay_memory().len() <= 3);
            assert!(solver.replay_memory().index() < 3);
        }

        // 19 learning steps, stored at ticks 0, 2, ..., 18.
        assert_eq!(solver.learn_tick(), 19);
        assert_eq!(solver.replay_memory().len(), 3);
        assert_eq!(solver.replay_memory().index(), 10 % 3);
        Ok(())
    }

    #[test]
    fn test_replay_stores_independent_copies() -> Result<()> {
        let mut solver = DqnSolver::build(Space(2, 2), small_config())?;
        let mut state = vec![1.0, 0.0];
        solver.decide(&state)?;
        solver.learn(1.0)?;
        state[0] = 0.0;
        state[1] = 1.0;
        solver.decide(&state)?;
        solver.learn(1.0)?;
        state[1] = 5.0;

        let t = solver.replay_memory().get(0).unwrap();
        assert_eq!(t.s0, vec![1.0, 0.0]);
        assert_eq!(t.s1, vec![0.0, 1.0]);
        assert_eq!(t.r0, 1.0);
        Ok(())
    }

    #[test]
    fn test_reward_clipping() -> Result<()> {
        let mut solver = DqnSolver::build(Space(2, 2), small_config().reward_clipping(true, 1.0))?;
        solver.learn(-7.0)?;
        assert_eq!(solver.memory().r0(), Some(-1.0));

        let mut solver = DqnSolver::build(Space(2, 2), small_config().reward_clipping(false, 1.0))?;
        solver.learn(-7.0)?;
        assert_eq!(solver.memory().r0(), Some(-7.0));
        Ok(())
    }

    #[test]
    fn test_masked_update_touches_taken_action_only() -> Result<()> {
        let config = small_config().alpha(0.01).loss_clipping(true, 1.0);
        let mut solver = DqnSolver::build(Space(3, 3), config)?;
        let before = parameters(&solver)?;
        let s0 = vec![1.0, 0.5, 0.0];
        let q_before = solver.q_values(&s0)?;

        let t = Transition {
            s0: s0.clone(),
            a0: 1,
            r0: 10.0,
            s1: vec![0.0, 0.0, 1.0],
            a1: 0,
        };
        let td_error = update_q(&solver.qnet, &mut solver.opt, &solver.config, &t)?;
        assert_eq!(td_error, -1.0);
        let after = parameters(&solver)?;

        // Rows of the output layer for the other actions are untouched.
        let w0 = &before.named_tensors["mlp.ln1.weight"].data;
        let w1 = &after.named_tensors["mlp.ln1.weight"].data;
        assert_eq!(w0[0..8], w1[0..8]);
        assert_eq!(w0[16..24], w1[16..24]);
        let b0 = &before.named_tensors["mlp.ln1.bias"].data;
        let b1 = &after.named_tensors["mlp.ln1.bias"].data;
        assert_eq!((b0[0], b0[2]), (b1[0], b1[2]));
        assert!(b1[1] > b0[1]);

        let q_after = solver.q_values(&s0)?;
        assert!(q_after[1] > q_before[1]);
        Ok(())
    }

    #[test]
    fn test_reset_clears_learning_state() -> Result<()> {
        init_logger();
        let mut solver = DqnSolver::build(Space(3, 2), small_config().epsilon_decay_period(10))?;
        for i in 0..20 {
            solver.decide(&one_hot(3, i % 3))?;
            solver.learn(1.0)?;
        }
        assert!(!solver.replay_memory().is_empty());

        solver.reset()?;
        assert!(solver.memory().is_empty());
        assert!(solver.replay_memory().is_empty());
        assert_eq!(solver.learn_tick(), 0);
        assert_eq!(solver.current_epsilon(), 1.0);

        let record = solver.learn_with_record(1.0)?;
        assert!(record.is_empty());
        Ok(())
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        init_logger();
        let config = small_config()
            .number_of_hidden_units(vec![6, 5])
            .training_mode(false)
            .epsilon(0.0);
        let mut solver1 = DqnSolver::build(Space(4, 3), config.clone())?;
        for i in 0..30 {
            solver1.decide(&one_hot(4, i % 4))?;
            solver1.learn(if i % 4 == 3 { 1.0 } else { 0.0 })?;
        }
        let json = solver1.to_json()?;
        assert_eq!(json["number_of_states"], 4);
        assert_eq!(json["number_of_actions"], 3);

        let mut solver2 = DqnSolver::build(Space(4, 3), config.seed(7).number_of_hidden_units(vec![2]))?;
        solver2.from_json(&json)?;
        assert_eq!(solver2.number_of_hidden_units(), &[6, 5]);
        assert_eq!(solver2.learn_tick(), 0);
        assert!(solver2.replay_memory().is_empty());

        for i in 0..4 {
            let s = one_hot(4, i);
            for (q1, q2) in solver1.q_values(&s)?.iter().zip(solver2.q_values(&s)?.iter()) {
                assert!((q1 - q2).abs() < 1e-5);
            }
            assert_eq!(solver1.decide(&s)?, solver2.decide(&s)?);
        }
        Ok(())
    }

    #[test]
    fn test_invalid_snapshot_keeps_network() -> Result<()> {
        let mut solver = DqnSolver::build(Space(3, 2), small_config())?;
        let before = parameters(&solver)?;

        assert!(solver.from_json(&serde_json::json!({"foo": 1})).is_err());

        let mut json = solver.to_json()?;
        json["number_of_hidden_units"] = serde_json::json!([4]);
        let err = solver.from_json(&json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SolverError>(),
            Some(SolverError::SnapshotMismatch(_))
        ));

        assert_eq!(parameters(&solver)?, before);
        assert_eq!(solver.number_of_hidden_units(), &[8]);
        Ok(())
    }

    #[test]
    fn test_rejected_snapshot_keeps_random_stream() -> Result<()> {
        let mut solver1 = DqnSolver::build(Space(3, 4), small_config())?;
        let mut solver2 = DqnSolver::build(Space(3, 4), small_config())?;

        let mut json = solver2.to_json()?;
        json["number_of_hidden_units"] = serde_json::json!([4]);
        assert!(solver2.from_json(&json).is_err());

        // Epsilon starts at 1, so every decision is a draw from the generator.
        for i in 0..20 {
            let s = one_hot(3, i % 3);
            assert_eq!(solver1.decide(&s)?, solver2.decide(&s)?);
        }
        Ok(())
    }
}
