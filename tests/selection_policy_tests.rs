use mcts_graph::{
    policy::{PUCTPolicy, SelectionPolicy, UCB1Policy},
    BanditSelector, BanditStat, MCTSError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_ucb1_policy_formula() {
    let policy = UCB1Policy::new();
    let stat = BanditStat::with_counts(0.5, 6.0, 9);

    // avg = 6 / 10, exploration = sqrt(2 ln 100 / 10)
    let expected = 0.6 + 1.5 * (2.0 * 100f64.ln() / 10.0).sqrt();
    assert!((policy.score(&stat, 100, 1.5) - expected).abs() < 1e-12);

    // Zero exploration reduces to the average value
    assert!((policy.score(&stat, 100, 0.0) - 0.6).abs() < 1e-12);
}

#[test]
fn test_ucb1_clamps_empty_total() {
    let policy = UCB1Policy::new();
    let stat = BanditStat::new(1.0);
    assert_eq!(policy.score(&stat, 0, 2.0), 0.0);
}

#[test]
fn test_puct_policy_formula() {
    let policy = PUCTPolicy::new();
    let stat = BanditStat::with_counts(0.3, 2.0, 3);

    // avg = 2 / 4, exploration = 0.3 * sqrt(16) / 4
    let expected = 0.5 + 1.2 * 0.3 * 4.0 / 4.0;
    assert!((policy.score(&stat, 16, 1.2) - expected).abs() < 1e-12);
}

#[test]
fn test_puct_prefers_high_prior_when_unvisited() {
    let selector =
        BanditSelector::with_priors(0, vec!['a', 'b', 'c'], vec![0.2, 0.7, 0.1]).unwrap();
    let policy = PUCTPolicy::new();

    // Nothing visited: sqrt(0) silences the prior term and every action ties
    assert_eq!(selector.max_actions(&policy, 1.0), vec![0, 1, 2]);

    let visited = selector_with(&[(0.2, 0.0, 1), (0.7, 0.0, 1), (0.1, 0.0, 1)]);
    assert_eq!(visited.max_actions(&policy, 1.0), vec![1]);
}

#[test]
fn test_selector_keeps_all_ties() {
    let selector = BanditSelector::uniform(3, vec![10u32, 20, 30]);
    let policy = UCB1Policy::new();

    assert_eq!(selector.agent(), 3);
    assert_eq!(selector.len(), 3);
    assert_eq!(selector.max_actions(&policy, 1.414), vec![0, 1, 2]);
    for stat in selector.stats() {
        assert!((stat.prior() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(stat.trials(), 0);
    }
}

#[test]
fn test_choose_draws_among_ties_uniformly() {
    let selector = BanditSelector::uniform(0, vec!['x', 'y']);
    let policy = UCB1Policy::new();
    let mut rng = ChaCha8Rng::seed_from_u64(51);

    let mut counts = [0u32; 2];
    for _ in 0..1000 {
        counts[selector.choose(&policy, 1.0, &mut rng).unwrap()] += 1;
    }
    assert!(counts[0] > 400 && counts[1] > 400, "counts = {:?}", counts);
}

#[test]
fn test_ucb1_explores_less_tried_action() {
    // Equal averages; the action with fewer trials has the larger bound
    let selector = selector_with(&[(0.5, 5.0, 9), (0.5, 1.0, 1)]);
    assert_eq!(selector.max_actions(&UCB1Policy::new(), 1.0), vec![1]);
    assert_eq!(selector.max_trial_actions(), vec![0]);
    assert_eq!(selector.max_value_actions(), vec![0, 1]);
}

#[test]
fn test_boxed_policy_delegates() {
    let boxed: Box<dyn SelectionPolicy> = Box::new(PUCTPolicy::new());
    let stat = BanditStat::with_counts(0.5, 1.0, 1);

    assert_eq!(boxed.name(), "puct");
    assert_eq!(boxed.score(&stat, 4, 1.0), PUCTPolicy::new().score(&stat, 4, 1.0));
    assert_eq!(boxed.clone_box().name(), "puct");
}

#[test]
fn test_invalid_priors() {
    let short = BanditSelector::with_priors(0, vec![1, 2], vec![1.0]);
    assert!(matches!(short, Err(MCTSError::InvalidPrior(_))));

    let negative = BanditSelector::with_priors(0, vec![1, 2], vec![0.5, -0.1]);
    assert!(matches!(negative, Err(MCTSError::InvalidPrior(_))));

    let nan = BanditSelector::with_priors(0, vec![1, 2], vec![f64::NAN, 0.5]);
    assert!(matches!(nan, Err(MCTSError::InvalidPrior(_))));
}

#[test]
fn test_empty_selector_cannot_choose() {
    let selector: BanditSelector<u8> = BanditSelector::uniform(2, Vec::new());
    let mut rng = ChaCha8Rng::seed_from_u64(52);

    let result = selector.choose(&UCB1Policy::new(), 1.0, &mut rng);
    assert!(matches!(result, Err(MCTSError::NoLegalActions { agent: 2 })));
}

/// Builds a selector from `(prior, accumulated_value, trials)` triples
fn selector_with(stats: &[(f64, f64, u64)]) -> BanditSelector<usize> {
    let actions = (0..stats.len()).collect();
    let stats = stats
        .iter()
        .map(|&(prior, value, trials)| BanditStat::with_counts(prior, value, trials))
        .collect();
    BanditSelector::from_stats(0, actions, stats).unwrap()
}
