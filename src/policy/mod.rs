//! Policies for the different phases of the MCTS algorithm
//!
//! - Selection policies: confidence bounds used to rank actions
//! - Expansion: node construction and prior assignment
//! - Simulation: leaf evaluators
//! - Backpropagation: recording results along a path

pub mod backpropagation;
pub mod expansion;
pub mod selection;
pub mod simulation;

pub use backpropagation::Backpropagator;
pub use expansion::{new_node, FnPrior, PriorSource, UniformPrior};
pub use selection::{PUCTPolicy, SelectionPolicy, UCB1Policy};
pub use simulation::{Evaluator, HeuristicEvaluator, RolloutEvaluator, ZeroSumEvaluator};
