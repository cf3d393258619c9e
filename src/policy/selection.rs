//! Selection policies for the MCTS algorithm
//!
//! A selection policy turns one [`BanditStat`] plus the total trial count of
//! its selector into a confidence score. The selector picks uniformly among
//! the actions that share the maximum score.

use crate::{bandit::BanditStat, utils};

/// Trait for confidence-bound formulas
pub trait SelectionPolicy: Send + Sync {
    /// Scores one action of a selector
    ///
    /// `stat` should be read through its effective (virtual-loss adjusted)
    /// counters and `total_trials` is the effective total of the selector.
    fn score(&self, stat: &BanditStat, total_trials: u64, exploration_constant: f64) -> f64;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn SelectionPolicy>;
}

/// Upper Confidence Bound 1 (UCB1) selection policy
///
/// ```text
/// UCB1 = average_value + C * sqrt(2 * ln(total_trials) / (trials + 1))
/// ```
///
/// With `average_value = accumulated_value / (trials + 1)`. This is the
/// default policy and ignores priors.
#[derive(Debug, Clone, Copy, Default)]
pub struct UCB1Policy;

impl UCB1Policy {
    /// Creates a new UCB1 policy
    pub fn new() -> Self {
        UCB1Policy
    }
}

impl SelectionPolicy for UCB1Policy {
    fn score(&self, stat: &BanditStat, total_trials: u64, exploration_constant: f64) -> f64 {
        utils::ucb1_score(
            stat.effective_value(),
            stat.effective_trials(),
            total_trials,
            exploration_constant,
        )
    }

    fn name(&self) -> &'static str {
        "ucb1"
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        Box::new(*self)
    }
}

/// Polynomial Upper Confidence Trees (PUCT) selection policy
///
/// The AlphaGo-style bound, weighting exploration by the action prior:
///
/// ```text
/// PUCB = average_value + C * prior * sqrt(total_trials) / (trials + 1)
/// ```
///
/// Priors are fixed when a node is created, see
/// [`PriorSource`](crate::policy::expansion::PriorSource).
#[derive(Debug, Clone, Copy, Default)]
pub struct PUCTPolicy;

impl PUCTPolicy {
    /// Creates a new PUCT policy
    pub fn new() -> Self {
        PUCTPolicy
    }
}

impl SelectionPolicy for PUCTPolicy {
    fn score(&self, stat: &BanditStat, total_trials: u64, exploration_constant: f64) -> f64 {
        utils::puct_score(
            stat.effective_value(),
            stat.effective_trials(),
            stat.prior(),
            total_trials,
            exploration_constant,
        )
    }

    fn name(&self) -> &'static str {
        "puct"
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        Box::new(*self)
    }
}

// Implement SelectionPolicy for Box<dyn SelectionPolicy>
impl SelectionPolicy for Box<dyn SelectionPolicy> {
    fn score(&self, stat: &BanditStat, total_trials: u64, exploration_constant: f64) -> f64 {
        (**self).score(stat, total_trials, exploration_constant)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        (**self).clone_box()
    }
}
