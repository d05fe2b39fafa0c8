//! Tabular TD solver.
#![allow(clippy::float_cmp)]
use super::{
    config::{TdConfig, TdUpdate},
    planning::{EnvModel, MIN_PRIORITY},
};
use anyhow::Result;
use log::{debug, info, trace};
use rand::{distributions::WeightedIndex, rngs::StdRng, Rng, SeedableRng};
use rlsolve_core::{
    config::SolverConfig,
    error::SolverError,
    record::{Record, RecordValue},
    Sarsa, Solver, TabularEnv,
};
use serde_json::Value;

/// Largest per-state update below which the policy of the state is kept.
const POLICY_UPDATE_THRESHOLD: f64 = 1e-5;

/// Tabular TD(lambda) solver with prioritized sweeping.
///
/// All tables are dense and indexed by `action * number_of_states + state`.
pub struct TdSolver<E, R = StdRng>
where
    E: TabularEnv,
    R: Rng,
{
    env: E,
    config: TdConfig,
    rng: R,
    number_of_states: usize,
    number_of_actions: usize,

    /// Action values.
    q: Vec<f64>,

    /// Action-selection probabilities.
    policy: Vec<f64>,

    eligibility_traces: Vec<f64>,

    model: EnvModel,

    memory: Sarsa<usize>,

    /// Whether the latest decision was a random one.
    explored: bool,
}

impl<E: TabularEnv> TdSolver<E, StdRng> {
    /// Constructs a solver whose random number generator is seeded with
    /// the `seed` of the configuration.
    pub fn build(env: E, config: TdConfig) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(env, config, rng)
    }
}

impl<E, R> TdSolver<E, R>
where
    E: TabularEnv,
    R: Rng,
{
    /// Constructs a solver drawing all randomness from `rng`.
    pub fn with_rng(env: E, config: TdConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let mut solver = Self {
            env,
            config,
            rng,
            number_of_states: 0,
            number_of_actions: 0,
            q: Vec::new(),
            policy: Vec::new(),
            eligibility_traces: Vec::new(),
            model: EnvModel::new(0),
            memory: Sarsa::new(),
            explored: false,
        };
        solver.reset()?;

        Ok(solver)
    }

    #[inline]
    fn ix(&self, s: usize, a: usize) -> usize {
        a * self.number_of_states + s
    }

    /// Legal actions of `s` known to the action space.
    fn allowed_actions(&self, s: usize) -> Vec<usize> {
        let mut actions = self.env.allowed_actions(s);
        actions.retain(|&a| a < self.number_of_actions);
        actions
    }

    fn check_state(&self, s: usize) -> Result<()> {
        if s < self.number_of_states {
            Ok(())
        } else {
            Err(SolverError::StateOutOfRange {
                state: s,
                number_of_states: self.number_of_states,
            }
            .into())
        }
    }

    /// Chooses a uniformly random legal action with probability `epsilon`,
    /// otherwise samples one from the policy.
    fn epsilon_greedy_action(&mut self, s: usize, allowed: &[usize]) -> Result<usize> {
        self.explored = self.rng.gen::<f64>() < self.config.epsilon;

        if self.explored {
            Ok(allowed[self.rng.gen_range(0..allowed.len())])
        } else {
            let probs = allowed
                .iter()
                .map(|&a| self.policy[self.ix(s, a)])
                .collect::<Vec<_>>();
            let dist = WeightedIndex::new(&probs)?;
            Ok(allowed[self.rng.sample(&dist)])
        }
    }

    /// Largest action value over the legal actions of `s`, 0 if there are none.
    fn max_q(&self, s: usize) -> f64 {
        self.allowed_actions(s)
            .iter()
            .map(|&a| self.q[self.ix(s, a)])
            .fold(None, |m: Option<f64>, q| Some(m.map_or(q, |m| m.max(q))))
            .unwrap_or(0.0)
    }

    /// Action value of `s` expected under the current policy.
    fn expected_q(&self, s: usize) -> f64 {
        self.allowed_actions(s)
            .iter()
            .map(|&a| {
                let ix = self.ix(s, a);
                self.policy[ix] * self.q[ix]
            })
            .sum()
    }

    /// Runs one TD update and returns the TD error of the updated pair.
    ///
    /// `a1` is `None` for planning updates, which have no real next action.
    fn learn_from_tuple(
        &mut self,
        s0: usize,
        a0: usize,
        r0: f64,
        s1: usize,
        a1: Option<usize>,
        lambda: f64,
    ) -> f64 {
        let sa = self.ix(s0, a0);
        let (alpha, gamma) = (self.config.alpha, self.config.gamma);
        let target = match (self.config.update, a1) {
            (TdUpdate::QLearn, _) => r0 + gamma * self.max_q(s1),
            (TdUpdate::Sarsa, Some(a1)) => r0 + gamma * self.q[self.ix(s1, a1)],
            (TdUpdate::Sarsa, None) => r0 + gamma * self.expected_q(s1),
        };
        let td_error = target - self.q[sa];

        if lambda > 0.0 {
            if self.config.replacing_traces {
                self.eligibility_traces[sa] = 1.0;
            } else {
                self.eligibility_traces[sa] += 1.0;
            }

            let decay = lambda * gamma;
            for s in 0..self.number_of_states {
                let mut state_update = 0f64;
                for a in self.allowed_actions(s) {
                    let ix = self.ix(s, a);
                    let update = alpha * self.eligibility_traces[ix] * (target - self.q[ix]);
                    self.q[ix] += update;
                    self.update_priority(s, update);
                    self.eligibility_traces[ix] *= decay;
                    state_update = state_update.max(update.abs());
                }
                if state_update > POLICY_UPDATE_THRESHOLD {
                    self.update_policy(s);
                }
            }

            // Traces collected before a random action are no credit for the greedy policy.
            if self.explored && self.config.update == TdUpdate::QLearn {
                self.eligibility_traces.iter_mut().for_each(|e| *e = 0.0);
            }
        } else {
            let update = alpha * td_error;
            self.q[sa] += update;
            self.update_priority(s0, update);
            self.update_policy(s0);
        }

        trace!(
            "update s={} a={} target={:.5} td_error={:.5}",
            s0,
            a0,
            target,
            td_error
        );

        td_error
    }

    /// Raises the priority of every modeled pair leading into `s`.
    fn update_priority(&mut self, s: usize, u: f64) {
        let u = u.abs();
        if u < MIN_PRIORITY || self.config.number_of_planning_steps == 0 {
            return;
        }
        self.model.propagate(s, u);
    }

    /// Makes the policy of `s` (or moves it toward) the greedy one over its
    /// legal actions, splitting ties equally.
    fn update_policy(&mut self, s: usize) {
        let allowed = self.allowed_actions(s);
        if allowed.is_empty() {
            return;
        }

        let qs = allowed
            .iter()
            .map(|&a| self.q[self.ix(s, a)])
            .collect::<Vec<_>>();
        let qmax = qs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let nmax = qs.iter().filter(|&&q| q == qmax).count();

        let mut psum = 0.0;
        for (&a, &q) in allowed.iter().zip(qs.iter()) {
            let target = if q == qmax { 1.0 / nmax as f64 } else { 0.0 };
            let ix = self.ix(s, a);
            if self.config.smooth_policy_update {
                self.policy[ix] += self.config.beta * (target - self.policy[ix]);
                psum += self.policy[ix];
            } else {
                self.policy[ix] = target;
            }
        }

        if self.config.smooth_policy_update && psum > 0.0 {
            for &a in allowed.iter() {
                let ix = self.ix(s, a);
                self.policy[ix] /= psum;
            }
        }
    }

    /// Replays the highest-priority modeled transitions. Returns the number
    /// of updates.
    fn plan(&mut self) -> usize {
        let ranked = self.model.ranked(self.config.number_of_planning_steps);
        let n = ranked.len();

        for sa in ranked {
            self.model.clear_priority(sa);
            if let Some((s1, r)) = self.model.outcome(sa) {
                let (s0, a0) = (sa % self.number_of_states, sa / self.number_of_states);
                self.learn_from_tuple(s0, a0, r, s1, None, 0.0);
            }
        }

        n
    }

    /// Environment of the solver.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Configuration of the solver.
    pub fn config(&self) -> &TdConfig {
        &self.config
    }

    /// Number of states of the sized space.
    pub fn number_of_states(&self) -> usize {
        self.number_of_states
    }

    /// Number of actions of the sized space.
    pub fn number_of_actions(&self) -> usize {
        self.number_of_actions
    }

    /// Action value of `(s, a)`.
    pub fn q(&self, s: usize, a: usize) -> f64 {
        self.q[self.ix(s, a)]
    }

    /// Probability of choosing `a` in `s` when not exploring.
    pub fn probability(&self, s: usize, a: usize) -> f64 {
        self.policy[self.ix(s, a)]
    }

    /// Action-value table.
    pub fn q_values(&self) -> &[f64] {
        &self.q
    }

    /// Policy table.
    pub fn policy(&self) -> &[f64] {
        &self.policy
    }

    /// Eligibility traces.
    pub fn eligibility_traces(&self) -> &[f64] {
        &self.eligibility_traces
    }

    /// Pending planning priorities.
    pub fn priorities(&self) -> &[f64] {
        self.model.priorities()
    }

    /// Modeled successor state of every pair.
    pub fn model_successors(&self) -> &[Option<usize>] {
        self.model.successors()
    }

    /// Modeled reward of every pair.
    pub fn model_rewards(&self) -> &[f64] {
        self.model.rewards()
    }

    /// Modeled pairs in the order of their first observation.
    pub fn seen_pairs(&self) -> &[usize] {
        self.model.seen()
    }

    /// Short-term memory.
    pub fn memory(&self) -> &Sarsa<usize> {
        &self.memory
    }

    /// Whether the latest decision was exploratory.
    pub fn explored(&self) -> bool {
        self.explored
    }
}

impl<E, R> Solver for TdSolver<E, R>
where
    E: TabularEnv,
    R: Rng,
{
    type State = usize;

    fn reset(&mut self) -> Result<()> {
        let number_of_states = self.env.number_of_states();
        let number_of_actions = self.env.number_of_actions();
        if number_of_states == 0 || number_of_actions == 0 {
            return Err(SolverError::InvalidSpace {
                number_of_states,
                number_of_actions,
            }
            .into());
        }
        self.number_of_states = number_of_states;
        self.number_of_actions = number_of_actions;

        let n = number_of_states * number_of_actions;
        self.q = vec![self.config.q_init_value; n];
        self.policy = vec![0.0; n];
        self.eligibility_traces = vec![0.0; n];
        self.model = EnvModel::new(n);
        self.memory.clear();
        self.explored = false;

        for s in 0..number_of_states {
            let allowed = self.allowed_actions(s);
            for &a in allowed.iter() {
                let ix = self.ix(s, a);
                self.policy[ix] = 1.0 / allowed.len() as f64;
            }
        }

        info!(
            "Reset TD solver: {} states, {} actions",
            number_of_states, number_of_actions
        );
        Ok(())
    }

    fn decide(&mut self, state: &usize) -> Result<usize> {
        let s = *state;
        self.check_state(s)?;
        let allowed = self.allowed_actions(s);
        if allowed.is_empty() {
            return Err(SolverError::NoAllowedActions(s).into());
        }

        let a = self.epsilon_greedy_action(s, &allowed)?;
        self.memory.shift_state(s, a);
        Ok(a)
    }

    fn learn_with_record(&mut self, r1: f64) -> Result<Record> {
        let mut record = Record::empty();

        if let Some(t) = self.memory.transition().map(|t| t.cloned()) {
            let lambda = self.config.lambda;
            let td_error = self.learn_from_tuple(t.s0, t.a0, t.r0, t.s1, Some(t.a1), lambda);
            record.insert("td_error", RecordValue::Scalar(td_error as f32));

            if self.config.number_of_planning_steps > 0 {
                let sa = self.ix(t.s0, t.a0);
                self.model.observe(sa, t.s1, t.r0);
                let n = self.plan();
                debug!("{} planning updates", n);
                record.insert("planning_updates", RecordValue::Scalar(n as f32));
            }
        }
        self.memory.shift_reward(r1);

        Ok(record)
    }

    fn to_json(&self) -> Result<Value> {
        Err(SolverError::NotImplemented("serialization of TD solver").into())
    }

    fn from_json(&mut self, _json: &Value) -> Result<()> {
        Err(SolverError::NotImplemented("deserialization of TD solver").into())
    }
}
