//! Graph data structures for Monte Carlo Tree Search
//!
//! This module defines the nodes of the search graph and the paths recorded
//! through it. Nodes are owned by the [`NodeTable`](crate::NodeTable) and
//! refer to each other by [`NodeId`], so a node reachable by several move
//! sequences is shared rather than duplicated.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    bandit::BanditSelector,
    config::BestActionCriteria,
    game_state::{AgentId, DecisionProcess},
    utils,
};

/// Index of a node in its [`NodeTable`](crate::NodeTable)
///
/// A table holds at most `u32::MAX + 1` nodes; inserting past that fails
/// with [`MCTSError::TableFull`](crate::MCTSError::TableFull).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node of every table
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts an arena index, or `None` if it does not fit a `u32`
    pub fn from_index(index: usize) -> Option<NodeId> {
        u32::try_from(index).ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to a node
pub type NodeRef<S> = Arc<Node<S>>;

/// A decision state in the search graph
///
/// Holds the state snapshot, one [`BanditSelector`] per acting agent and the
/// children already linked from this node. Statistics sit behind a per-node
/// lock so parallel workers only contend on the nodes they share.
pub struct Node<S: DecisionProcess> {
    state: S,
    agents: Vec<AgentId>,
    selectors: Mutex<Vec<BanditSelector<S::Action>>>,
    children: Mutex<Vec<NodeId>>,
    in_flight: AtomicU32,
}

impl<S: DecisionProcess> Node<S> {
    pub(crate) fn new(state: S, selectors: Vec<BanditSelector<S::Action>>) -> Self {
        let agents = selectors.iter().map(BanditSelector::agent).collect();
        Node {
            state,
            agents,
            selectors: Mutex::new(selectors),
            children: Mutex::new(Vec::new()),
            in_flight: AtomicU32::new(0),
        }
    }

    /// The state this node stands for
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Agents acting at this node, one per selector
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Snapshot of every selector
    pub fn selectors(&self) -> Vec<BanditSelector<S::Action>> {
        self.lock_selectors().clone()
    }

    /// Snapshot of the selector in `slot`
    pub fn selector(&self, slot: usize) -> Option<BanditSelector<S::Action>> {
        self.lock_selectors().get(slot).cloned()
    }

    /// Nodes already linked from this one
    pub fn children(&self) -> Vec<NodeId> {
        self.lock_children().clone()
    }

    /// Number of simulations whose selection path currently runs through this node
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Completed trials of the selector in `slot`
    pub fn total_trials(&self, slot: usize) -> u64 {
        self.lock_selectors()
            .get(slot)
            .map_or(0, BanditSelector::total_trials)
    }

    /// Final answer for the first acting agent
    pub fn best_action(&self, criteria: BestActionCriteria) -> Option<S::Action> {
        let selectors = self.lock_selectors();
        selectors.first().and_then(|s| best_of(s, criteria))
    }

    /// Final answer for every acting agent, in agent order
    pub fn best_joint_action(&self, criteria: BestActionCriteria) -> Option<Vec<S::Action>> {
        self.lock_selectors()
            .iter()
            .map(|s| best_of(s, criteria))
            .collect()
    }

    /// Trial fractions of the selector in `slot`
    ///
    /// With a `threshold`, actions whose fraction falls below
    /// `threshold * max_fraction` are dropped to zero and the remainder is
    /// renormalized.
    pub fn action_distribution(
        &self,
        slot: usize,
        threshold: Option<f64>,
    ) -> Vec<(S::Action, f64)> {
        let mut fractions = match self.lock_selectors().get(slot) {
            Some(selector) => selector.trial_fraction_map(),
            None => return Vec::new(),
        };

        if let Some(threshold) = threshold {
            let max = fractions.iter().map(|(_, f)| *f).fold(0.0, f64::max);
            let cutoff = threshold * max;
            for (_, fraction) in fractions.iter_mut() {
                if *fraction < cutoff {
                    *fraction = 0.0;
                }
            }
            let total: f64 = fractions.iter().map(|(_, f)| *f).sum();
            if total > 0.0 {
                for (_, fraction) in fractions.iter_mut() {
                    *fraction /= total;
                }
            }
        }

        fractions
    }

    pub(crate) fn lock_selectors(&self) -> MutexGuard<'_, Vec<BanditSelector<S::Action>>> {
        utils::lock(&self.selectors)
    }

    pub(crate) fn lock_children(&self) -> MutexGuard<'_, Vec<NodeId>> {
        utils::lock(&self.children)
    }

    /// Marks a selection through this node
    pub(crate) fn enter(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn leave(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "node left more often than entered");
    }
}

impl<S: DecisionProcess + fmt::Debug> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("state", &self.state)
            .field("agents", &self.agents)
            .field("children", &self.children())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn best_of<A: Clone + PartialEq>(
    selector: &BanditSelector<A>,
    criteria: BestActionCriteria,
) -> Option<A> {
    let candidates = match criteria {
        BestActionCriteria::MostTrials => selector.max_trial_actions(),
        BestActionCriteria::HighestValue => selector.max_value_actions(),
    };

    // Break ties on the other criterion, then on action order.
    let stats = selector.stats();
    let mut best: Option<usize> = None;
    for index in candidates {
        best = match best {
            None => Some(index),
            Some(current) => {
                let better = match criteria {
                    BestActionCriteria::MostTrials => {
                        stats[index].average_value() > stats[current].average_value()
                    }
                    BestActionCriteria::HighestValue => {
                        stats[index].trials() > stats[current].trials()
                    }
                };
                Some(if better { index } else { current })
            }
        };
    }

    best.map(|i| selector.actions()[i].clone())
}

/// One step of a selection walk: a node and the action index chosen per agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub node: NodeId,
    pub actions: Vec<usize>,
}

/// The steps recorded during one selection walk
///
/// Consumed once by backpropagation and then discarded.
#[derive(Debug, Clone, Default)]
pub struct SelectionPath {
    steps: Vec<PathStep>,
}

impl SelectionPath {
    /// Creates an empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty path with room for `capacity` steps
    ///
    /// The capacity is only a hint; the path grows past it as needed.
    pub fn with_capacity(capacity: usize) -> Self {
        SelectionPath {
            steps: Vec::with_capacity(capacity),
        }
    }

    /// Extends the path with a new step
    pub fn push(&mut self, node: NodeId, actions: Vec<usize>) {
        self.steps.push(PathStep { node, actions });
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns true if `node` already appears on the path
    pub fn contains(&self, node: NodeId) -> bool {
        self.steps.iter().any(|step| step.node == node)
    }

    /// Returns the length of the path
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the path is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}{:?}", step.node, step.actions)?;
        }
        write!(f, "]")
    }
}
