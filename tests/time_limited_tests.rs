mod common;

use common::Lattice;
use mcts_graph::{MCTSConfig, MCTS};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

#[test]
fn test_time_limited_search() {
    // Set a short but reasonable time limit
    let time_limit = Duration::from_millis(200);

    let config = MCTSConfig::default()
        .with_max_time(time_limit)
        .with_simulations(u32::MAX); // High to ensure time is the limiting factor
    let mut mcts = MCTS::new(config);
    let mut rng = ChaCha8Rng::seed_from_u64(71);

    let start = Instant::now();
    let result = mcts.search(Lattice::new(40), &mut rng);
    let elapsed = start.elapsed();

    assert!(result.is_ok(), "Time-limited search should succeed");
    assert!(
        elapsed < time_limit + Duration::from_secs(2),
        "Search took {:?}, expected about {:?}",
        elapsed,
        time_limit
    );

    let stats = mcts.get_statistics();
    assert!(stats.stopped_early, "Search should report stopping on time");
    assert!(stats.simulations > 0);
    assert!(stats.simulations < u64::from(u32::MAX));
}

#[test]
fn test_time_limit_applies_to_parallel_search() {
    let config = MCTSConfig::default()
        .with_max_time(Duration::from_millis(150))
        .with_simulations(u32::MAX)
        .with_workers(4);
    let mut mcts = MCTS::new(config);
    let mut rng = ChaCha8Rng::seed_from_u64(72);

    let table = mcts.search_table(Lattice::new(40), &mut rng).unwrap();

    let stats = mcts.get_statistics();
    assert!(stats.stopped_early);
    assert_eq!(table.root_node().total_trials(0), stats.simulations);
    common::assert_quiescent(&table);
}

#[test]
fn test_iteration_limit_wins_when_reached_first() {
    let config = MCTSConfig::default()
        .with_max_time(Duration::from_secs(30))
        .with_simulations(50);
    let mut mcts = MCTS::new(config);
    let mut rng = ChaCha8Rng::seed_from_u64(73);

    mcts.search(Lattice::new(10), &mut rng).unwrap();

    let stats = mcts.get_statistics();
    assert_eq!(stats.simulations, 50);
    assert!(!stats.stopped_early);
}
