//! # mcts-graph
//!
//! Monte Carlo graph search guided by bandit confidence bounds.
//!
//! States reached along different action sequences share one node, so the
//! search builds a directed acyclic graph rather than a tree. Each node keeps
//! one bandit selector per acting agent, which covers both alternating games
//! and simultaneous-move processes where several agents pick an action at
//! the same time.
//!
//! ## Features
//!
//! - UCB1 and PUCB (prior-weighted) selection
//! - Transposition table keyed by state equality
//! - Pluggable leaf evaluators: random rollouts, heuristics, zero-sum backup
//! - Parallel search on a shared table with virtual loss
//! - Detailed search statistics and text visualization
//!
//! ## Basic Usage
//!
//! ```
//! use mcts_graph::{AgentId, DecisionProcess, MCTSConfig, MCTS};
//! use rand::{RngCore, SeedableRng};
//! use rand_chacha::ChaCha8Rng;
//!
//! // Pick a number; 2 wins, anything else loses.
//! #[derive(Clone, Debug)]
//! struct PickTwo(Option<u8>);
//!
//! impl DecisionProcess for PickTwo {
//!     type Action = u8;
//!
//!     fn current_agent(&self) -> AgentId {
//!         0
//!     }
//!
//!     fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
//!         vec![1, 2, 3]
//!     }
//!
//!     fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> mcts_graph::Result<Self> {
//!         Ok(PickTwo(Some(joint[0])))
//!     }
//!
//!     fn is_terminal(&self) -> bool {
//!         self.0.is_some()
//!     }
//!
//!     fn states_equal(&self, other: &Self) -> bool {
//!         self.0 == other.0
//!     }
//!
//!     fn terminal_score(&self, _agent: AgentId) -> f64 {
//!         if self.0 == Some(2) { 1.0 } else { 0.0 }
//!     }
//! }
//!
//! fn main() -> Result<(), mcts_graph::MCTSError> {
//!     let config = MCTSConfig::default().with_simulations(300);
//!     let mut mcts = MCTS::new(config);
//!     let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//!     let best = mcts.search(PickTwo(None), &mut rng)?;
//!     assert_eq!(best, 2);
//!
//!     println!("{}", mcts.get_statistics().summary());
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Every simulation runs three phases against the shared [`NodeTable`]:
//!
//! 1. **Select/expand**: starting at the root, every acting agent picks the
//!    action maximizing its confidence bound. The joint action is applied and
//!    the successor is looked up among the node's children, then in the
//!    table. An unknown state becomes a new node and ends the walk; so does a
//!    terminal state or a node already visited by this walk.
//!
//! 2. **Evaluate**: the [`Evaluator`](policy::Evaluator) scores the state the
//!    walk stopped at.
//!
//! 3. **Backpropagate**: every edge on the path records the value, as
//!    transformed by the evaluator for the agent that chose it.
//!
//! ## Parallel Search
//!
//! ```
//! # use mcts_graph::{AgentId, DecisionProcess, MCTSConfig, MCTS};
//! # use rand::RngCore;
//! # #[derive(Clone, Debug)]
//! # struct PickTwo(Option<u8>);
//! # impl DecisionProcess for PickTwo {
//! #     type Action = u8;
//! #     fn current_agent(&self) -> AgentId { 0 }
//! #     fn legal_actions(&self, _agent: AgentId) -> Vec<u8> { vec![1, 2, 3] }
//! #     fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> mcts_graph::Result<Self> {
//! #         Ok(PickTwo(Some(joint[0])))
//! #     }
//! #     fn is_terminal(&self) -> bool { self.0.is_some() }
//! #     fn states_equal(&self, other: &Self) -> bool { self.0 == other.0 }
//! #     fn terminal_score(&self, _agent: AgentId) -> f64 {
//! #         if self.0 == Some(2) { 1.0 } else { 0.0 }
//! #     }
//! # }
//! use mcts_graph::policy::PUCTPolicy;
//! use mcts_graph::utils::worker_rngs;
//!
//! let mut mcts = MCTS::new(MCTSConfig::default()).with_selection_policy(PUCTPolicy::new());
//! let table = mcts
//!     .run_parallel(100, PickTwo(None), 1.0, worker_rngs(42, 4))
//!     .unwrap();
//!
//! assert_eq!(table.root_node().total_trials(0), 400);
//! ```

pub mod bandit;
pub mod config;
pub mod game_state;
pub mod mcts;
pub mod policy;
pub mod stats;
pub mod table;
pub mod tree;
pub mod utils;

pub use bandit::{BanditSelector, BanditStat};
pub use config::{BestActionCriteria, MCTSConfig};
pub use game_state::{Action, AgentId, DecisionProcess};
pub use mcts::MCTS;
pub use policy::{
    Evaluator, HeuristicEvaluator, PUCTPolicy, PriorSource, RolloutEvaluator, SelectionPolicy,
    UCB1Policy, ZeroSumEvaluator,
};
pub use stats::SearchStatistics;
pub use table::{NodeTable, TableEntry};
pub use tree::{Node, NodeId, NodeRef, PathStep, SelectionPath};

/// Error types for the MCTS algorithm
#[derive(thiserror::Error, Debug)]
pub enum MCTSError {
    /// An acting agent has no legal action at a non-terminal state
    #[error("No legal actions available for agent {agent} at a non-terminal state")]
    NoLegalActions { agent: AgentId },

    /// The decision process or evaluator broke its contract
    #[error("Decision process error: {0}")]
    Adapter(String),

    /// A prior source returned unusable priors
    #[error("Invalid priors: {0}")]
    InvalidPrior(String),

    /// The root state is terminal, so there is nothing to search
    #[error("Cannot search from a terminal state")]
    TerminalRoot,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A previous run on this table failed part-way
    #[error("Node table was left inconsistent by an aborted run")]
    AbortedTable,

    /// The node table cannot index another node
    #[error("Node table is full")]
    TableFull,

    /// A parallel worker panicked
    #[error("Search worker panicked")]
    WorkerPanicked,
}

/// Result type for MCTS operations
pub type Result<T> = std::result::Result<T, MCTSError>;
