//! Per-action bandit statistics and the selector that ranks them
//!
//! Every node holds one [`BanditSelector`] per acting agent. A selector owns
//! one [`BanditStat`] per legal action of its agent and answers which actions
//! currently have the highest confidence bound.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::{game_state::AgentId, policy::selection::SelectionPolicy, utils, MCTSError, Result};

/// Counters for one action of one agent at one node
///
/// `trials` never decreases. Only backpropagation changes `trials` and
/// `accumulated_value`; selection adds and removes the virtual part while a
/// simulation is in flight through the edge.
#[derive(Debug, Clone, PartialEq)]
pub struct BanditStat {
    prior: f64,
    accumulated_value: f64,
    trials: u64,
    virtual_trials: u32,
    virtual_penalty: f64,
}

impl BanditStat {
    /// Creates an unvisited statistic with the given prior
    pub fn new(prior: f64) -> Self {
        Self::with_counts(prior, 0.0, 0)
    }

    /// Creates a statistic with existing counts
    pub fn with_counts(prior: f64, accumulated_value: f64, trials: u64) -> Self {
        BanditStat {
            prior,
            accumulated_value,
            trials,
            virtual_trials: 0,
            virtual_penalty: 0.0,
        }
    }

    pub fn prior(&self) -> f64 {
        self.prior
    }

    pub fn accumulated_value(&self) -> f64 {
        self.accumulated_value
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// `accumulated_value / (trials + 1)`
    pub fn average_value(&self) -> f64 {
        utils::average_value(self.accumulated_value, self.trials)
    }

    /// Number of simulations currently in flight through this edge
    pub fn virtual_trials(&self) -> u32 {
        self.virtual_trials
    }

    /// Trials including in-flight simulations
    pub fn effective_trials(&self) -> u64 {
        self.trials + u64::from(self.virtual_trials)
    }

    /// Accumulated value with the virtual-loss penalty applied
    pub fn effective_value(&self) -> f64 {
        self.accumulated_value - self.virtual_penalty
    }

    pub(crate) fn apply_virtual_loss(&mut self, loss: f64) {
        self.virtual_trials += 1;
        self.virtual_penalty += loss;
    }

    pub(crate) fn undo_virtual_loss(&mut self, loss: f64) {
        debug_assert!(self.virtual_trials > 0, "virtual loss undone twice");
        self.virtual_trials = self.virtual_trials.saturating_sub(1);
        if self.virtual_trials == 0 {
            // Drop any rounding residue once nothing is in flight.
            self.virtual_penalty = 0.0;
        } else {
            self.virtual_penalty -= loss;
        }
    }

    pub(crate) fn record(&mut self, value: f64) {
        self.accumulated_value += value;
        self.trials += 1;
    }
}

/// The statistics of one agent at one node
#[derive(Debug, Clone)]
pub struct BanditSelector<A> {
    agent: AgentId,
    actions: Vec<A>,
    stats: Vec<BanditStat>,
}

impl<A: Clone + PartialEq> BanditSelector<A> {
    /// Creates a selector whose actions share a uniform prior
    pub fn uniform(agent: AgentId, actions: Vec<A>) -> Self {
        let prior = 1.0 / actions.len().max(1) as f64;
        let stats = actions.iter().map(|_| BanditStat::new(prior)).collect();
        BanditSelector {
            agent,
            actions,
            stats,
        }
    }

    /// Creates a selector with one prior per action
    ///
    /// Fails if the lengths differ or a prior is negative or not finite.
    pub fn with_priors(agent: AgentId, actions: Vec<A>, priors: Vec<f64>) -> Result<Self> {
        if priors.len() != actions.len() {
            return Err(MCTSError::InvalidPrior(format!(
                "agent {} has {} actions but {} priors",
                agent,
                actions.len(),
                priors.len()
            )));
        }
        if let Some(bad) = priors.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(MCTSError::InvalidPrior(format!(
                "agent {} received prior {}",
                agent, bad
            )));
        }

        Ok(BanditSelector {
            agent,
            actions,
            stats: priors.into_iter().map(BanditStat::new).collect(),
        })
    }

    /// Creates a selector from existing statistics, one per action
    pub fn from_stats(agent: AgentId, actions: Vec<A>, stats: Vec<BanditStat>) -> Result<Self> {
        if stats.len() != actions.len() {
            return Err(MCTSError::InvalidPrior(format!(
                "agent {} has {} actions but {} statistics",
                agent,
                actions.len(),
                stats.len()
            )));
        }
        Ok(BanditSelector {
            agent,
            actions,
            stats,
        })
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn stats(&self) -> &[BanditStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the statistic recorded for `action`, if it is one of ours
    pub fn stat_for(&self, action: &A) -> Option<&BanditStat> {
        self.index_of(action).map(|i| &self.stats[i])
    }

    pub fn index_of(&self, action: &A) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    /// Sum of completed trials over all actions
    pub fn total_trials(&self) -> u64 {
        self.stats.iter().map(BanditStat::trials).sum()
    }

    /// Sum of trials including in-flight simulations
    pub fn effective_total_trials(&self) -> u64 {
        self.stats.iter().map(BanditStat::effective_trials).sum()
    }

    /// Confidence score of every action, in action order
    pub fn scores(&self, policy: &dyn SelectionPolicy, exploration_constant: f64) -> Vec<f64> {
        let total = self.effective_total_trials();
        self.stats
            .iter()
            .map(|stat| policy.score(stat, total, exploration_constant))
            .collect()
    }

    /// Indices of every action whose score equals the maximum
    ///
    /// Scores are deterministic functions of integer counts and one shared
    /// constant, so exact equality is the tie criterion.
    pub fn max_actions(
        &self,
        policy: &dyn SelectionPolicy,
        exploration_constant: f64,
    ) -> Vec<usize> {
        arg_max(&self.scores(policy, exploration_constant))
    }

    /// Indices of every action with the highest completed trial count
    pub fn max_trial_actions(&self) -> Vec<usize> {
        let trials: Vec<f64> = self.stats.iter().map(|s| s.trials() as f64).collect();
        arg_max(&trials)
    }

    /// Indices of every action with the highest average value
    pub fn max_value_actions(&self) -> Vec<usize> {
        let values: Vec<f64> = self.stats.iter().map(BanditStat::average_value).collect();
        arg_max(&values)
    }

    /// Fraction of completed trials spent on each action
    ///
    /// All fractions are zero while the selector is unvisited.
    pub fn trial_fraction_map(&self) -> Vec<(A, f64)> {
        let total = self.total_trials();
        self.actions
            .iter()
            .zip(&self.stats)
            .map(|(action, stat)| {
                let fraction = if total == 0 {
                    0.0
                } else {
                    stat.trials() as f64 / total as f64
                };
                (action.clone(), fraction)
            })
            .collect()
    }

    /// Picks one of the maximal actions uniformly at random
    pub fn choose(
        &self,
        policy: &dyn SelectionPolicy,
        exploration_constant: f64,
        rng: &mut dyn RngCore,
    ) -> Result<usize> {
        self.max_actions(policy, exploration_constant)
            .choose(rng)
            .copied()
            .ok_or(MCTSError::NoLegalActions { agent: self.agent })
    }

    pub(crate) fn apply_virtual_loss(&mut self, index: usize, loss: f64) {
        self.stats[index].apply_virtual_loss(loss);
    }

    pub(crate) fn stat_mut(&mut self, index: usize) -> &mut BanditStat {
        &mut self.stats[index]
    }
}

fn arg_max(values: &[f64]) -> Vec<usize> {
    let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == best)
        .map(|(i, _)| i)
        .collect()
}
