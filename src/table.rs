//! Transposition table owning every node of a search run
//!
//! The table is an append-only arena: nodes are never removed while the
//! table lives, and a [`NodeId`] is simply the node's index. Lookup is a
//! linear scan with [`DecisionProcess::states_equal`], so states only need an
//! equivalence relation, not a hash.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::{
    game_state::DecisionProcess,
    tree::{Node, NodeId, NodeRef},
    utils, MCTSError, Result,
};

/// Outcome of inserting a freshly built node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEntry {
    /// The state was already present before the insert began
    Existing(NodeId),
    /// The new node was stored under this id
    Inserted(NodeId),
    /// Another worker stored an equal state first; its node is returned
    Raced(NodeId),
}

impl TableEntry {
    pub fn id(self) -> NodeId {
        match self {
            TableEntry::Existing(id) | TableEntry::Inserted(id) | TableEntry::Raced(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, TableEntry::Inserted(_))
    }
}

/// The set of all nodes created in one search run
///
/// At most one node exists per distinct state. Readers share the arena
/// lock; only insertions take it exclusively, and an insertion re-checks the
/// nodes appended since its lookup so that two workers expanding the same
/// state end up sharing one node.
pub struct NodeTable<S: DecisionProcess> {
    nodes: RwLock<Vec<NodeRef<S>>>,
    aborted: AtomicBool,
}

impl<S: DecisionProcess> NodeTable<S> {
    pub(crate) fn with_root(root: Node<S>) -> Self {
        NodeTable {
            nodes: RwLock::new(vec![Arc::new(root)]),
            aborted: AtomicBool::new(false),
        }
    }

    /// Id of the root node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The root node
    pub fn root_node(&self) -> NodeRef<S> {
        self.node(NodeId::ROOT)
    }

    /// Returns the node stored under `id`
    pub fn get(&self, id: NodeId) -> Option<NodeRef<S>> {
        utils::read(&self.nodes).get(id.index()).cloned()
    }

    /// Number of nodes in the table
    pub fn len(&self) -> usize {
        utils::read(&self.nodes).len()
    }

    pub fn is_empty(&self) -> bool {
        utils::read(&self.nodes).is_empty()
    }

    /// Snapshot of every node, in creation order
    pub fn nodes(&self) -> Vec<NodeRef<S>> {
        utils::read(&self.nodes).clone()
    }

    /// Finds the node whose state equals `state`
    pub fn find(&self, state: &S) -> Option<NodeId> {
        self.find_with_len(state).0
    }

    /// Finds `state`, building and inserting a node for it when absent
    ///
    /// `build` runs without holding the table lock. If another worker inserts
    /// an equal state meanwhile, the freshly built node is discarded.
    pub fn find_or_insert<F>(&self, state: &S, build: F) -> Result<TableEntry>
    where
        F: FnOnce() -> Result<Node<S>>,
    {
        let (found, seen) = self.find_with_len(state);
        if let Some(id) = found {
            return Ok(TableEntry::Existing(id));
        }
        self.insert_after(build()?, seen)
    }

    /// Returns true if a run on this table failed part-way
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Renders the graph reachable from the root as indented text
    ///
    /// Nodes reached a second time are printed once more with a `(shared)`
    /// marker and not descended into again.
    pub fn visualize(&self, max_depth: usize) -> String {
        let mut output = String::new();
        let mut seen = HashSet::new();
        self.visualize_node(NodeId::ROOT, 0, max_depth, &mut seen, &mut output);
        output
    }

    fn visualize_node(
        &self,
        id: NodeId,
        depth: usize,
        max_depth: usize,
        seen: &mut HashSet<NodeId>,
        output: &mut String,
    ) {
        let node = self.node(id);
        let indent = "  ".repeat(depth);
        let label = if id == NodeId::ROOT {
            "Root".to_string()
        } else {
            id.to_string()
        };
        let (trials, value) = node
            .selector(0)
            .map(|s| {
                let trials = s.total_trials();
                let accumulated: f64 = s.stats().iter().map(|st| st.accumulated_value()).sum();
                (trials, utils::average_value(accumulated, trials))
            })
            .unwrap_or((0, 0.0));

        if !seen.insert(id) {
            let _ = writeln!(output, "{}{} (shared)", indent, label);
            return;
        }
        let _ = writeln!(
            output,
            "{}{} (visits: {}, value: {:.3})",
            indent, label, trials, value
        );

        if depth < max_depth {
            for child in node.children() {
                self.visualize_node(child, depth + 1, max_depth, seen, output);
            }
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> NodeRef<S> {
        utils::read(&self.nodes)[id.index()].clone()
    }

    /// Looks `state` up and reports how many nodes the scan covered
    pub(crate) fn find_with_len(&self, state: &S) -> (Option<NodeId>, usize) {
        let nodes = utils::read(&self.nodes);
        (scan(&nodes, 0, state), nodes.len())
    }

    /// Inserts `node` unless a node appended after the first `seen` matches it
    pub(crate) fn insert_after(&self, node: Node<S>, seen: usize) -> Result<TableEntry> {
        let mut nodes = utils::write(&self.nodes);
        if let Some(id) = scan(&nodes, seen, node.state()) {
            debug!("expansion race on node {}; linking the winner's node", id);
            return Ok(TableEntry::Raced(id));
        }
        let id = NodeId::from_index(nodes.len()).ok_or(MCTSError::TableFull)?;
        nodes.push(Arc::new(node));
        Ok(TableEntry::Inserted(id))
    }

    pub(crate) fn mark_aborted(&self) {
        self.aborted.store(true, Ordering::Release);
    }
}

fn scan<S: DecisionProcess>(nodes: &[NodeRef<S>], start: usize, state: &S) -> Option<NodeId> {
    nodes
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, node)| node.state().states_equal(state))
        .and_then(|(i, _)| NodeId::from_index(i))
}
