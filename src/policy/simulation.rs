//! Leaf evaluation for the MCTS algorithm
//!
//! An evaluator estimates the value of the state a selection walk stopped
//! at, and decides what each visited node receives during backup.

use std::marker::PhantomData;

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::{
    game_state::{AgentId, DecisionProcess},
    MCTSError, Result,
};

/// Trait for leaf-value strategies
pub trait Evaluator<S: DecisionProcess>: Send + Sync {
    /// Estimates the value of the state a selection walk stopped at
    fn leaf_value(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64>;

    /// Value credited to `agent`'s selector at `visited` during backup
    ///
    /// The default passes the leaf value through unchanged, which suits
    /// evaluations that mean the same thing to every agent.
    fn backup_value(&self, leaf_value: f64, _visited: &S, _agent: AgentId) -> f64 {
        leaf_value
    }
}

// Implement Evaluator for Box<dyn Evaluator>
impl<S: DecisionProcess> Evaluator<S> for Box<dyn Evaluator<S>> {
    fn leaf_value(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        (**self).leaf_value(state, rng)
    }

    fn backup_value(&self, leaf_value: f64, visited: &S, agent: AgentId) -> f64 {
        (**self).backup_value(leaf_value, visited, agent)
    }
}

/// Random rollout evaluator
///
/// Plays uniformly random joint actions until a terminal state and returns
/// its score for the `perspective` agent.
#[derive(Debug, Clone)]
pub struct RolloutEvaluator {
    /// Agent whose terminal score is reported
    pub perspective: AgentId,
    /// Upper bound on rollout length; exceeding it is an adapter error
    pub max_steps: Option<usize>,
}

impl RolloutEvaluator {
    /// Creates a rollout evaluator scoring from agent 0's perspective
    pub fn new() -> Self {
        RolloutEvaluator {
            perspective: 0,
            max_steps: None,
        }
    }

    pub fn with_perspective(mut self, agent: AgentId) -> Self {
        self.perspective = agent;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

impl Default for RolloutEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DecisionProcess> Evaluator<S> for RolloutEvaluator {
    fn leaf_value(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        let mut current = state.clone();
        let mut steps = 0;

        while !current.is_terminal() {
            if self.max_steps.map_or(false, |max| steps >= max) {
                return Err(MCTSError::Adapter(format!(
                    "rollout did not terminate within {} steps",
                    steps
                )));
            }

            let agents = current.acting_agents();
            let mut joint = Vec::with_capacity(agents.len());
            for agent in agents {
                let actions = current.legal_actions(agent);
                let action = actions
                    .choose(rng)
                    .ok_or(MCTSError::NoLegalActions { agent })?;
                joint.push(action.clone());
            }

            current = current.transition(&joint, rng)?;
            steps += 1;
        }

        Ok(current.terminal_score(self.perspective))
    }
}

/// Heuristic evaluator
///
/// Scores non-terminal leaves with a direct estimate instead of a rollout.
pub struct HeuristicEvaluator<F, S> {
    heuristic: F,
    perspective: AgentId,
    _phantom: PhantomData<fn(&S)>,
}

impl<F, S> HeuristicEvaluator<F, S>
where
    F: Fn(&S) -> f64 + Send + Sync,
    S: DecisionProcess,
{
    /// Creates a new heuristic evaluator with the given function
    pub fn new(heuristic: F) -> Self {
        HeuristicEvaluator {
            heuristic,
            perspective: 0,
            _phantom: PhantomData,
        }
    }

    /// Sets the agent whose terminal score is used on terminal leaves
    pub fn with_perspective(mut self, agent: AgentId) -> Self {
        self.perspective = agent;
        self
    }
}

impl<F, S> Evaluator<S> for HeuristicEvaluator<F, S>
where
    F: Fn(&S) -> f64 + Send + Sync,
    S: DecisionProcess,
{
    fn leaf_value(&self, state: &S, _rng: &mut dyn RngCore) -> Result<f64> {
        if state.is_terminal() {
            return Ok(state.terminal_score(self.perspective));
        }
        Ok((self.heuristic)(state))
    }
}

/// Zero-sum wrapper for two-agent processes
///
/// The inner evaluator reports values for `perspective`; every other agent
/// is credited `total - value`. Use `total = 1.0` for scores in `[0, 1]` and
/// `total = 0.0` for scores in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct ZeroSumEvaluator<E> {
    inner: E,
    perspective: AgentId,
    total: f64,
}

impl<E> ZeroSumEvaluator<E> {
    /// Wraps `inner`, whose values are from `perspective`'s point of view
    pub fn new(inner: E, perspective: AgentId) -> Self {
        ZeroSumEvaluator {
            inner,
            perspective,
            total: 1.0,
        }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = total;
        self
    }
}

impl<S, E> Evaluator<S> for ZeroSumEvaluator<E>
where
    S: DecisionProcess,
    E: Evaluator<S>,
{
    fn leaf_value(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        self.inner.leaf_value(state, rng)
    }

    fn backup_value(&self, leaf_value: f64, _visited: &S, agent: AgentId) -> f64 {
        if agent == self.perspective {
            leaf_value
        } else {
            self.total - leaf_value
        }
    }
}
