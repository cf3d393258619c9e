//! Backpropagation for the MCTS algorithm
//!
//! Backpropagation is the only place where completed trials and accumulated
//! values change. Every edge on the path first sheds the virtual loss it took
//! during selection, then records the real value.

use crate::{
    game_state::DecisionProcess,
    policy::simulation::Evaluator,
    table::NodeTable,
    tree::SelectionPath,
};

/// Applies simulation results along a selection path
#[derive(Debug, Clone, Copy)]
pub struct Backpropagator {
    virtual_loss: f64,
}

impl Backpropagator {
    /// Creates a backpropagator undoing `virtual_loss` per edge
    ///
    /// Must match the loss applied during selection.
    pub fn new(virtual_loss: f64) -> Self {
        Backpropagator { virtual_loss }
    }

    /// Records `leaf_value` on every edge of `path`
    ///
    /// The order of updates along the path does not matter; each edge is
    /// updated independently under its node's lock.
    pub fn backpropagate<S: DecisionProcess>(
        &self,
        table: &NodeTable<S>,
        path: SelectionPath,
        leaf_value: f64,
        evaluator: &dyn Evaluator<S>,
    ) {
        for step in path.steps() {
            let node = table.node(step.node);
            let values: Vec<f64> = node
                .agents()
                .iter()
                .map(|&agent| evaluator.backup_value(leaf_value, node.state(), agent))
                .collect();

            {
                let mut selectors = node.lock_selectors();
                for (slot, &action) in step.actions.iter().enumerate() {
                    let stat = selectors[slot].stat_mut(action);
                    stat.undo_virtual_loss(self.virtual_loss);
                    stat.record(values[slot]);
                }
            }
            node.leave();
        }
    }

    /// Releases a path whose simulation failed, without recording anything
    pub fn abandon<S: DecisionProcess>(&self, table: &NodeTable<S>, path: SelectionPath) {
        for step in path.steps() {
            let node = table.node(step.node);
            {
                let mut selectors = node.lock_selectors();
                for (slot, &action) in step.actions.iter().enumerate() {
                    selectors[slot].stat_mut(action).undo_virtual_loss(self.virtual_loss);
                }
            }
            node.leave();
        }
    }
}
