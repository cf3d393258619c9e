//! Utility functions for the MCTS algorithm
//!
//! This module contains the confidence-bound formulas shared by the selection
//! policies, plus small helpers used by the parallel driver.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Average value of a statistic: `accumulated / (trials + 1)`
///
/// The `+ 1` keeps unvisited actions finite and biases early estimates
/// towards zero.
pub fn average_value(accumulated_value: f64, trials: u64) -> f64 {
    accumulated_value / (trials as f64 + 1.0)
}

/// UCB1 score: `avg + c * sqrt(2 ln(total) / (trials + 1))`
///
/// `total_trials` is clamped to 1, so a selector nobody has visited scores
/// each action by its average value alone.
pub fn ucb1_score(
    accumulated_value: f64,
    trials: u64,
    total_trials: u64,
    exploration_constant: f64,
) -> f64 {
    let total = total_trials.max(1) as f64;
    let exploration = (2.0 * total.ln() / (trials as f64 + 1.0)).sqrt();
    average_value(accumulated_value, trials) + exploration_constant * exploration
}

/// PUCB score (AlphaGo style): `avg + c * prior * sqrt(total) / (trials + 1)`
pub fn puct_score(
    accumulated_value: f64,
    trials: u64,
    prior: f64,
    total_trials: u64,
    exploration_constant: f64,
) -> f64 {
    let exploration = prior * (total_trials as f64).sqrt() / (trials as f64 + 1.0);
    average_value(accumulated_value, trials) + exploration_constant * exploration
}

/// Locks a mutex, recovering the data if a worker panicked while holding it
///
/// A panicking worker aborts the whole run, so the possibly inconsistent data
/// is never used for another search.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Creates `count` independent worker RNGs seeded from `seed`
///
/// Each worker owns its generator; two calls with the same seed produce the
/// same generators.
pub fn worker_rngs(seed: u64, count: usize) -> Vec<ChaCha8Rng> {
    let mut master = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| ChaCha8Rng::seed_from_u64(master.next_u64()))
        .collect()
}
