//! Configuration options for the MCTS algorithm
//!
//! This module defines the configuration parameters that control the
//! behavior of the search driver.

use std::time::Duration;

use crate::{MCTSError, Result};

/// Criteria for extracting the final action after search is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestActionCriteria {
    /// Select the action with the most completed trials
    ///
    /// The robust choice: trial counts converge on the best action even
    /// when value estimates are noisy. Ties go to the higher average value.
    MostTrials,

    /// Select the action with the highest average value
    ///
    /// More aggressive; ties go to the action with more trials.
    HighestValue,
}

/// Configuration for the MCTS algorithm
///
/// # Example
///
/// ```
/// use mcts_graph::{MCTSConfig, config::BestActionCriteria};
/// use std::time::Duration;
///
/// let config = MCTSConfig::default()
///     .with_exploration_constant(1.5)
///     .with_simulations(10_000)
///     .with_workers(4)
///     .with_max_time(Duration::from_secs(5))
///     .with_best_action_criteria(BestActionCriteria::MostTrials);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MCTSConfig {
    /// Exploration constant `C` of the confidence bound
    ///
    /// Higher values favor exploration of less-tried actions.
    pub exploration_constant: f64,

    /// Number of simulations run by [`MCTS::search`](crate::MCTS::search)
    ///
    /// With several workers this is the total across all workers.
    pub simulations: u32,

    /// Wall-clock budget; no new simulation starts once it is spent
    pub max_time: Option<Duration>,

    /// Number of parallel workers used by [`MCTS::search`](crate::MCTS::search)
    pub workers: usize,

    /// Penalty applied to an edge's value while a simulation is in flight
    /// through it
    pub virtual_loss: f64,

    /// How the final action is extracted
    pub best_action_criteria: BestActionCriteria,

    /// Relative cutoff applied to reported action distributions
    ///
    /// Actions tried less than `threshold * max_fraction` are dropped.
    pub distribution_threshold: Option<f64>,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        MCTSConfig {
            exploration_constant: 1.414, // sqrt(2)
            simulations: 10_000,
            max_time: None,
            workers: 1,
            virtual_loss: 1.0,
            best_action_criteria: BestActionCriteria::MostTrials,
            distribution_threshold: None,
        }
    }
}

impl MCTSConfig {
    /// Sets the exploration constant
    pub fn with_exploration_constant(mut self, constant: f64) -> Self {
        self.exploration_constant = constant;
        self
    }

    /// Sets the number of simulations
    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.simulations = simulations;
        self
    }

    /// Sets the maximum time to run the search
    pub fn with_max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    /// Sets the number of parallel workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the virtual-loss penalty
    pub fn with_virtual_loss(mut self, loss: f64) -> Self {
        self.virtual_loss = loss;
        self
    }

    /// Sets the criteria for extracting the final action
    pub fn with_best_action_criteria(mut self, criteria: BestActionCriteria) -> Self {
        self.best_action_criteria = criteria;
        self
    }

    /// Sets the relative cutoff for reported distributions
    pub fn with_distribution_threshold(mut self, threshold: f64) -> Self {
        self.distribution_threshold = Some(threshold);
        self
    }

    /// Checks that the configuration can drive a search
    pub fn validate(&self) -> Result<()> {
        validate_exploration_constant(self.exploration_constant)?;
        if !self.virtual_loss.is_finite() || self.virtual_loss < 0.0 {
            return Err(MCTSError::InvalidConfiguration(format!(
                "virtual loss must be finite and non-negative, got {}",
                self.virtual_loss
            )));
        }
        if self.workers == 0 {
            return Err(MCTSError::InvalidConfiguration(
                "at least one worker is required".to_string(),
            ));
        }
        if let Some(threshold) = self.distribution_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(MCTSError::InvalidConfiguration(format!(
                    "distribution threshold must lie in [0, 1], got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_exploration_constant(constant: f64) -> Result<()> {
    if !constant.is_finite() || constant < 0.0 {
        return Err(MCTSError::InvalidConfiguration(format!(
            "exploration constant must be finite and non-negative, got {}",
            constant
        )));
    }
    Ok(())
}
