//! Main implementation of the Monte Carlo graph search
//!
//! This module contains the search driver, orchestrating the select/expand,
//! evaluate and backpropagate phases over a shared [`NodeTable`], either on
//! the calling thread or on a pool of parallel workers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, trace, warn};
use rand::RngCore;
use rayon::prelude::*;

use crate::{
    config::{self, MCTSConfig},
    game_state::DecisionProcess,
    policy::{
        backpropagation::Backpropagator,
        expansion::{new_node, PriorSource},
        selection::{SelectionPolicy, UCB1Policy},
        simulation::{Evaluator, RolloutEvaluator},
    },
    stats::{SearchCounters, SearchStatistics, WalkEnd},
    table::{NodeTable, TableEntry},
    tree::{Node, NodeId, SelectionPath},
    utils, MCTSError, Result,
};

/// The main Monte Carlo graph search driver
///
/// Holds the policies that shape a search and the statistics of the last
/// run. A run builds a fresh [`NodeTable`]; callers read the final answer
/// from its root node.
pub struct MCTS<S: DecisionProcess> {
    /// Configuration for [`search`](MCTS::search)
    config: MCTSConfig,

    /// Confidence bound used to rank actions
    selection_policy: Box<dyn SelectionPolicy>,

    /// Leaf evaluator and backup transform
    evaluator: Box<dyn Evaluator<S>>,

    /// Priors for new nodes; uniform when absent
    prior_source: Option<Box<dyn PriorSource<S>>>,

    /// Statistics gathered during the last run
    statistics: SearchStatistics,
}

impl<S: DecisionProcess + 'static> MCTS<S> {
    /// Creates a driver with UCB1 selection, random rollouts and uniform priors
    pub fn new(config: MCTSConfig) -> Self {
        MCTS {
            config,
            selection_policy: Box::new(UCB1Policy::new()),
            evaluator: Box::new(RolloutEvaluator::new()),
            prior_source: None,
            statistics: SearchStatistics::new(),
        }
    }

    /// Sets the selection policy to use
    pub fn with_selection_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.selection_policy = Box::new(policy);
        self
    }

    /// Sets the leaf evaluator to use
    pub fn with_evaluator<E: Evaluator<S> + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Sets the prior source used when nodes are created
    pub fn with_prior_source<P: PriorSource<S> + 'static>(mut self, source: P) -> Self {
        self.prior_source = Some(Box::new(source));
        self
    }

    /// Drops any prior source; new nodes get uniform priors
    pub fn set_uniform_prior(&mut self) {
        self.prior_source = None;
    }

    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Returns the statistics of the last run
    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Creates a table holding only the root node for `root_state`
    pub fn new_table(&self, root_state: S) -> Result<NodeTable<S>> {
        if root_state.is_terminal() {
            return Err(MCTSError::TerminalRoot);
        }
        let root = new_node(root_state, self.prior_source.as_deref())?;
        Ok(NodeTable::with_root(root))
    }

    /// Runs `simulations` simulations from `root_state` on the calling thread
    ///
    /// Given the same RNG seed and exploration constant, two runs produce
    /// identical statistics.
    pub fn run(
        &mut self,
        simulations: u32,
        root_state: S,
        exploration_constant: f64,
        rng: &mut dyn RngCore,
    ) -> Result<NodeTable<S>> {
        let table = self.new_table(root_state)?;
        self.extend(&table, simulations, exploration_constant, rng)?;
        Ok(table)
    }

    /// Continues searching an existing table
    ///
    /// A table whose previous run failed is refused.
    pub fn extend(
        &mut self,
        table: &NodeTable<S>,
        simulations: u32,
        exploration_constant: f64,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        self.check_run(table, exploration_constant)?;
        debug!(
            "starting {} simulations with {} (c = {})",
            simulations,
            self.selection_policy.name(),
            exploration_constant
        );

        let counters = SearchCounters::default();
        let stop = AtomicBool::new(false);
        let start = Instant::now();
        let result = self
            .searcher(table, exploration_constant, &counters, &stop, start)
            .run_worker(simulations, rng)
            .map(|_| ());

        self.finish(table, &counters, start, 1, &result);
        result
    }

    /// Runs `simulations_per_worker` simulations on each of `rngs.len()` workers
    ///
    /// All workers share one table. Each worker owns one of the supplied
    /// generators. The first failing worker stops the others and the whole
    /// batch fails.
    pub fn run_parallel<R: RngCore + Send>(
        &mut self,
        simulations_per_worker: u32,
        root_state: S,
        exploration_constant: f64,
        rngs: Vec<R>,
    ) -> Result<NodeTable<S>> {
        let table = self.new_table(root_state)?;
        let budgets = vec![simulations_per_worker; rngs.len()];
        self.extend_parallel(&table, budgets, exploration_constant, rngs)?;
        Ok(table)
    }

    /// Continues searching an existing table with parallel workers
    ///
    /// `budgets[i]` is the simulation count of the worker owning `rngs[i]`.
    pub fn extend_parallel<R: RngCore + Send>(
        &mut self,
        table: &NodeTable<S>,
        budgets: Vec<u32>,
        exploration_constant: f64,
        rngs: Vec<R>,
    ) -> Result<()> {
        self.check_run(table, exploration_constant)?;
        if rngs.is_empty() || budgets.len() != rngs.len() {
            return Err(MCTSError::InvalidConfiguration(format!(
                "{} worker budgets for {} worker generators",
                budgets.len(),
                rngs.len()
            )));
        }

        let workers = rngs.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| MCTSError::InvalidConfiguration(e.to_string()))?;
        debug!(
            "starting {} simulations on {} workers with {} (c = {})",
            budgets.iter().map(|&b| u64::from(b)).sum::<u64>(),
            workers,
            self.selection_policy.name(),
            exploration_constant
        );

        let counters = SearchCounters::default();
        let stop = AtomicBool::new(false);
        let start = Instant::now();
        let searcher = self.searcher(table, exploration_constant, &counters, &stop, start);

        let results: Vec<Result<u32>> = pool.install(|| {
            rngs.into_par_iter()
                .zip(budgets)
                .map(|(mut rng, budget)| {
                    let worker = AssertUnwindSafe(|| searcher.run_worker(budget, &mut rng));
                    let outcome =
                        panic::catch_unwind(worker).unwrap_or(Err(MCTSError::WorkerPanicked));
                    if outcome.is_err() {
                        stop.store(true, Ordering::Release);
                    }
                    outcome
                })
                .collect()
        });

        let result = match results.into_iter().find_map(|r| r.err()) {
            Some(err) => Err(err),
            None => Ok(()),
        };
        self.finish(table, &counters, start, workers, &result);
        result
    }

    /// Runs the configured search and returns the first agent's best action
    pub fn search(&mut self, root_state: S, rng: &mut dyn RngCore) -> Result<S::Action> {
        let table = self.search_table(root_state, rng)?;
        let root = table.root_node();
        root.best_action(self.config.best_action_criteria)
            .ok_or(MCTSError::TerminalRoot)
    }

    /// Runs the configured search and returns the best action of every acting agent
    pub fn search_joint(&mut self, root_state: S, rng: &mut dyn RngCore) -> Result<Vec<S::Action>> {
        let table = self.search_table(root_state, rng)?;
        let root = table.root_node();
        root.best_joint_action(self.config.best_action_criteria)
            .ok_or(MCTSError::TerminalRoot)
    }

    /// Runs the configured search and returns the table
    ///
    /// With more than one configured worker the simulations are split evenly
    /// and each worker's generator is seeded from `rng`.
    pub fn search_table(&mut self, root_state: S, rng: &mut dyn RngCore) -> Result<NodeTable<S>> {
        self.config.validate()?;
        let simulations = self.config.simulations;
        let exploration_constant = self.config.exploration_constant;
        let workers = self.config.workers;

        if workers == 1 {
            return self.run(simulations, root_state, exploration_constant, rng);
        }

        let table = self.new_table(root_state)?;
        let rngs = utils::worker_rngs(rng.next_u64(), workers);
        let share = simulations / workers as u32;
        let remainder = simulations as usize % workers;
        let budgets = (0..workers)
            .map(|i| share + u32::from(i < remainder))
            .collect();
        self.extend_parallel(&table, budgets, exploration_constant, rngs)?;
        Ok(table)
    }

    /// Trial fractions at the root of `table`, thresholded per the config
    pub fn root_distribution(&self, table: &NodeTable<S>, slot: usize) -> Vec<(S::Action, f64)> {
        table
            .root_node()
            .action_distribution(slot, self.config.distribution_threshold)
    }

    fn check_run(&self, table: &NodeTable<S>, exploration_constant: f64) -> Result<()> {
        if table.is_aborted() {
            return Err(MCTSError::AbortedTable);
        }
        config::validate_exploration_constant(exploration_constant)?;
        self.config.validate()
    }

    fn searcher<'a>(
        &'a self,
        table: &'a NodeTable<S>,
        exploration_constant: f64,
        counters: &'a SearchCounters,
        stop: &'a AtomicBool,
        start: Instant,
    ) -> Searcher<'a, S> {
        Searcher {
            table,
            policy: self.selection_policy.as_ref(),
            evaluator: self.evaluator.as_ref(),
            prior_source: self.prior_source.as_deref(),
            backpropagator: Backpropagator::new(self.config.virtual_loss),
            exploration_constant,
            virtual_loss: self.config.virtual_loss,
            counters,
            stop,
            deadline: self.config.max_time.map(|budget| start + budget),
        }
    }

    fn finish(
        &mut self,
        table: &NodeTable<S>,
        counters: &SearchCounters,
        start: Instant,
        workers: usize,
        result: &Result<()>,
    ) {
        self.statistics = counters.snapshot(start.elapsed(), table.len(), workers);
        match result {
            Ok(()) => debug!("{}", self.statistics.summary()),
            Err(err) => {
                table.mark_aborted();
                warn!(
                    "search aborted after {} simulations: {}",
                    self.statistics.simulations, err
                );
            }
        }
    }
}

/// Everything one worker needs to run simulations against a shared table
struct Searcher<'a, S: DecisionProcess> {
    table: &'a NodeTable<S>,
    policy: &'a dyn SelectionPolicy,
    evaluator: &'a dyn Evaluator<S>,
    prior_source: Option<&'a dyn PriorSource<S>>,
    backpropagator: Backpropagator,
    exploration_constant: f64,
    virtual_loss: f64,
    counters: &'a SearchCounters,
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
}

impl<'a, S: DecisionProcess> Searcher<'a, S> {
    /// Runs up to `simulations` simulations, returning how many completed
    fn run_worker(&self, simulations: u32, rng: &mut dyn RngCore) -> Result<u32> {
        let mut capacity = 1;
        let mut completed = 0;

        for _ in 0..simulations {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                self.counters.mark_stopped_early();
                break;
            }

            let depth = self.simulate(capacity, rng)?;
            capacity = depth + 1;
            completed += 1;
        }

        Ok(completed)
    }

    /// One select/expand, evaluate, backpropagate cycle
    fn simulate(&self, capacity: usize, rng: &mut dyn RngCore) -> Result<usize> {
        let mut path = SelectionPath::with_capacity(capacity);

        let value = match self.select_expand(&mut path, rng) {
            Ok(leaf) => self.evaluator.leaf_value(&leaf, rng),
            Err(err) => Err(err),
        };

        match value {
            Ok(value) => {
                let depth = path.len();
                trace!("simulation {} -> leaf value {:.3}", path, value);
                self.backpropagator
                    .backpropagate(self.table, path, value, self.evaluator);
                self.counters.record_simulation();
                Ok(depth)
            }
            Err(err) => {
                self.backpropagator.abandon(self.table, path);
                Err(err)
            }
        }
    }

    /// Walks from the root, recording every step in `path`
    ///
    /// Stops at a terminal state, at a freshly expanded node, or when the
    /// next node is already on this walk's path. Returns the state to
    /// evaluate.
    fn select_expand(&self, path: &mut SelectionPath, rng: &mut dyn RngCore) -> Result<S> {
        let mut current = NodeId::ROOT;

        loop {
            let node = self.table.node(current);
            let (chosen, joint) = self.select_actions(&node, rng)?;
            node.enter();
            path.push(current, chosen);

            let next = node.state().transition(&joint, rng)?;
            if next.is_terminal() {
                self.counters.record_walk(path.len(), WalkEnd::Terminal);
                return Ok(next);
            }

            let next_id = match self.find_child(&node, &next) {
                Some(id) => id,
                None => match self.table.find_with_len(&next) {
                    (Some(id), _) => {
                        self.link(&node, id);
                        self.counters.record_transposition();
                        id
                    }
                    (None, seen) => {
                        let built = new_node(next.clone(), self.prior_source)?;
                        match self.table.insert_after(built, seen)? {
                            TableEntry::Inserted(id) => {
                                self.link(&node, id);
                                self.counters.record_walk(path.len(), WalkEnd::Expanded);
                                return Ok(next);
                            }
                            TableEntry::Raced(id) | TableEntry::Existing(id) => {
                                self.link(&node, id);
                                self.counters.record_race();
                                id
                            }
                        }
                    }
                },
            };

            // A node already on the path would be entered a second time by
            // this walk; evaluate from here instead of descending again.
            if path.contains(next_id) {
                self.counters.record_walk(path.len(), WalkEnd::Reentered);
                return Ok(next);
            }
            current = next_id;
        }
    }

    /// Picks one maximal action per agent and puts virtual loss on each
    fn select_actions(
        &self,
        node: &Node<S>,
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<usize>, Vec<S::Action>)> {
        let mut selectors = node.lock_selectors();

        let chosen = selectors
            .iter()
            .map(|selector| selector.choose(self.policy, self.exploration_constant, rng))
            .collect::<Result<Vec<usize>>>()?;

        let mut joint = Vec::with_capacity(chosen.len());
        for (selector, &index) in selectors.iter_mut().zip(&chosen) {
            selector.apply_virtual_loss(index, self.virtual_loss);
            joint.push(selector.actions()[index].clone());
        }

        Ok((chosen, joint))
    }

    fn find_child(&self, node: &Node<S>, state: &S) -> Option<NodeId> {
        node.children()
            .into_iter()
            .find(|&id| self.table.node(id).state().states_equal(state))
    }

    fn link(&self, node: &Node<S>, child: NodeId) {
        let mut children = node.lock_children();
        if !children.contains(&child) {
            children.push(child);
        }
    }
}
