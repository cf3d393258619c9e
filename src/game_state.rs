//! Traits defining the decision process searched by MCTS.
//!
//! The [`DecisionProcess`] trait is the only interface the search engine needs
//! from a game or planning problem. The engine never inspects a state beyond
//! the capabilities listed here.

use std::fmt::Debug;

use rand::RngCore;

use crate::Result;

/// Identifier of a decision-maker within a process
pub type AgentId = usize;

/// Trait for actions that can be taken in a decision process
///
/// Actions are compared with `PartialEq` when reporting distributions and
/// cloned into selection paths, so they should be cheap to copy.
pub trait Action: Clone + Debug + PartialEq + Send + Sync {}

impl<T> Action for T where T: Clone + Debug + PartialEq + Send + Sync {}

/// Trait defining the decision-process interface required for MCTS
///
/// Implement this on the state type of any game or planning problem. Both the
/// alternating (one agent acts per state) and simultaneous-move (several
/// agents act per state) variants go through the same trait; they differ only
/// in what [`acting_agents`](DecisionProcess::acting_agents) returns.
///
/// # Obligations
///
/// [`states_equal`](DecisionProcess::states_equal) defines node identity and
/// must be a true equivalence relation (reflexive, symmetric and transitive).
/// This is not checked at runtime: a non-transitive relation leads to
/// duplicate or inconsistent nodes in the [`NodeTable`](crate::NodeTable).
///
/// # Example
///
/// ```
/// use mcts_graph::{AgentId, DecisionProcess};
/// use rand::RngCore;
///
/// #[derive(Clone, Debug)]
/// struct Countdown(u8);
///
/// impl DecisionProcess for Countdown {
///     type Action = u8;
///
///     fn current_agent(&self) -> AgentId {
///         0
///     }
///
///     fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
///         (1..=self.0.min(2)).collect()
///     }
///
///     fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> mcts_graph::Result<Self> {
///         Ok(Countdown(self.0 - joint[0]))
///     }
///
///     fn is_terminal(&self) -> bool {
///         self.0 == 0
///     }
///
///     fn states_equal(&self, other: &Self) -> bool {
///         self.0 == other.0
///     }
///
///     fn terminal_score(&self, _agent: AgentId) -> f64 {
///         1.0
///     }
/// }
/// ```
pub trait DecisionProcess: Clone + Send + Sync {
    /// The type of actions that can be taken in this process
    type Action: Action;

    /// Returns the agents choosing an action at this state
    ///
    /// The default suits alternating processes: only the current agent acts.
    /// Simultaneous-move processes return every agent that moves at this
    /// state. The engine creates one bandit selector per entry, in order, and
    /// passes joint actions to [`transition`](DecisionProcess::transition) in
    /// the same order.
    fn acting_agents(&self) -> Vec<AgentId> {
        vec![self.current_agent()]
    }

    /// Returns the agent whose turn it is in this state
    fn current_agent(&self) -> AgentId;

    /// Returns the legal actions for one acting agent
    ///
    /// Must be non-empty for every acting agent of a non-terminal state.
    fn legal_actions(&self, agent: AgentId) -> Vec<Self::Action>;

    /// Applies a joint action, returning the successor state
    ///
    /// `joint` holds one action per entry of
    /// [`acting_agents`](DecisionProcess::acting_agents). Chance events may
    /// draw from `rng`; the result must depend only on the inputs and the
    /// draws taken from `rng`.
    fn transition(&self, joint: &[Self::Action], rng: &mut dyn RngCore) -> Result<Self>;

    /// Returns true if this state is terminal
    fn is_terminal(&self) -> bool;

    /// Returns true if both states denote the same decision point
    fn states_equal(&self, other: &Self) -> bool;

    /// Returns the score of a terminal state from one agent's perspective
    fn terminal_score(&self, agent: AgentId) -> f64;
}
