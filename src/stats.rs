//! Statistics collection for MCTS searches
//!
//! Workers bump shared atomic counters while they search; the driver folds
//! them into a [`SearchStatistics`] snapshot once the run is over.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Statistics collected during an MCTS search
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Number of completed simulations
    pub simulations: u64,

    /// Total time spent searching
    pub total_time: Duration,

    /// Number of nodes in the table after the run
    pub table_size: usize,

    /// Longest selection path seen
    pub max_depth: usize,

    /// New nodes created
    pub expansions: u64,

    /// Table hits linked as new children of another node
    pub transpositions: u64,

    /// Walks stopped because the next node was already on their path
    pub guard_breaks: u64,

    /// Walks that stopped on a terminal state
    pub terminal_leaves: u64,

    /// Expansions that lost an insertion race to another worker
    pub expansion_races: u64,

    /// Number of workers that took part
    pub workers: usize,

    /// Whether the search was stopped early due to time constraints
    pub stopped_early: bool,
}

impl SearchStatistics {
    /// Creates a new, empty statistics object
    pub fn new() -> Self {
        SearchStatistics {
            simulations: 0,
            total_time: Duration::from_secs(0),
            table_size: 1, // Start with root node
            max_depth: 0,
            expansions: 0,
            transpositions: 0,
            guard_breaks: 0,
            terminal_leaves: 0,
            expansion_races: 0,
            workers: 1,
            stopped_early: false,
        }
    }

    /// Returns the average time per simulation in microseconds
    pub fn avg_time_per_simulation_us(&self) -> f64 {
        if self.simulations == 0 {
            return 0.0;
        }
        self.total_time.as_micros() as f64 / self.simulations as f64
    }

    /// Returns the number of simulations per second
    pub fn simulations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.simulations as f64 / self.total_time.as_secs_f64()
    }

    /// Returns a summary of the statistics as a string
    pub fn summary(&self) -> String {
        format!(
            "MCTS Search Statistics:\n\
             - Simulations: {}\n\
             - Workers: {}\n\
             - Total time: {:.3} seconds\n\
             - Table size: {} nodes\n\
             - Max depth: {}\n\
             - Expansions: {}\n\
             - Transpositions linked: {}\n\
             - Re-entry stops: {}\n\
             - Terminal leaves: {}\n\
             - Expansion races: {}\n\
             - Avg time per simulation: {:.3} µs\n\
             - Simulations per second: {:.1}\n\
             - Stopped early: {}",
            self.simulations,
            self.workers,
            self.total_time.as_secs_f64(),
            self.table_size,
            self.max_depth,
            self.expansions,
            self.transpositions,
            self.guard_breaks,
            self.terminal_leaves,
            self.expansion_races,
            self.avg_time_per_simulation_us(),
            self.simulations_per_second(),
            self.stopped_early
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// How a selection walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalkEnd {
    Expanded,
    Terminal,
    Reentered,
}

/// Counters shared by every worker of one run
#[derive(Debug, Default)]
pub(crate) struct SearchCounters {
    simulations: AtomicU64,
    max_depth: AtomicUsize,
    expansions: AtomicU64,
    transpositions: AtomicU64,
    guard_breaks: AtomicU64,
    terminal_leaves: AtomicU64,
    expansion_races: AtomicU64,
    stopped_early: AtomicBool,
}

impl SearchCounters {
    pub fn record_walk(&self, depth: usize, end: WalkEnd) {
        self.max_depth.fetch_max(depth, Ordering::Relaxed);
        let counter = match end {
            WalkEnd::Expanded => &self.expansions,
            WalkEnd::Terminal => &self.terminal_leaves,
            WalkEnd::Reentered => &self.guard_breaks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transposition(&self) {
        self.transpositions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_race(&self) {
        self.expansion_races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_simulation(&self) {
        self.simulations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_stopped_early(&self) {
        self.stopped_early.store(true, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        total_time: Duration,
        table_size: usize,
        workers: usize,
    ) -> SearchStatistics {
        SearchStatistics {
            simulations: self.simulations.load(Ordering::Relaxed),
            total_time,
            table_size,
            max_depth: self.max_depth.load(Ordering::Relaxed),
            expansions: self.expansions.load(Ordering::Relaxed),
            transpositions: self.transpositions.load(Ordering::Relaxed),
            guard_breaks: self.guard_breaks.load(Ordering::Relaxed),
            terminal_leaves: self.terminal_leaves.load(Ordering::Relaxed),
            expansion_races: self.expansion_races.load(Ordering::Relaxed),
            workers,
            stopped_early: self.stopped_early.load(Ordering::Relaxed),
        }
    }
}
