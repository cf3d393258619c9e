//! Goofspiel example for simultaneous-move search
//!
//! Two players hold the cards 1..=N and bid one card each per round for a
//! randomly revealed prize card. The higher bid wins the prize; equal bids
//! discard it. Both players bid at the same time, so every node carries one
//! bandit selector per player. The search runs on several workers sharing
//! one node table.

use std::cmp::Ordering;
use std::fmt;

use log::info;
use mcts_graph::{
    policy::{RolloutEvaluator, ZeroSumEvaluator},
    AgentId, DecisionProcess, MCTSConfig, MCTSError, MCTS,
};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CARDS: u8 = 6;

fn main() -> Result<(), MCTSError> {
    env_logger::init();

    println!("MCTS Goofspiel Example ({} cards)", CARDS);
    println!("=================================");
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut game = Goofspiel::new(CARDS, &mut rng);

    let workers = std::thread::available_parallelism().map_or(4, |n| n.get());
    let config = MCTSConfig::default()
        .with_exploration_constant(1.0)
        .with_simulations(20_000)
        .with_workers(workers);
    let mut mcts =
        MCTS::new(config).with_evaluator(ZeroSumEvaluator::new(RolloutEvaluator::new(), 0));

    while !game.is_terminal() {
        println!("{}", game);

        let bids = mcts.search_joint(game.clone(), &mut rng)?;
        let stats = mcts.get_statistics();
        info!(
            "{} simulations on {} workers, {} nodes, {} expansion races",
            stats.simulations, stats.workers, stats.table_size, stats.expansion_races
        );

        println!("Player 0 bids {}, player 1 bids {}", bids[0], bids[1]);
        game = game.transition(&bids, &mut rng)?;
    }

    println!("{}", game);
    match game.scores[0].cmp(&game.scores[1]) {
        Ordering::Greater => println!("Player 0 wins!"),
        Ordering::Less => println!("Player 1 wins!"),
        Ordering::Equal => println!("It's a draw!"),
    }
    Ok(())
}

#[derive(Clone, Debug)]
struct Goofspiel {
    hands: [Vec<u8>; 2],
    prizes: Vec<u8>,
    prize: Option<u8>,
    scores: [u32; 2],
}

impl Goofspiel {
    fn new(cards: u8, rng: &mut dyn RngCore) -> Self {
        let deck: Vec<u8> = (1..=cards).collect();
        let mut game = Goofspiel {
            hands: [deck.clone(), deck.clone()],
            prizes: deck,
            prize: None,
            scores: [0, 0],
        };
        game.reveal(rng);
        game
    }

    /// Turns over a random prize card
    fn reveal(&mut self, rng: &mut dyn RngCore) {
        self.prize = if self.prizes.is_empty() {
            None
        } else {
            let index = rng.gen_range(0..self.prizes.len());
            Some(self.prizes.swap_remove(index))
        };
    }
}

impl DecisionProcess for Goofspiel {
    type Action = u8;

    fn acting_agents(&self) -> Vec<AgentId> {
        vec![0, 1]
    }

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, agent: AgentId) -> Vec<u8> {
        self.hands[agent].clone()
    }

    fn transition(&self, joint: &[u8], rng: &mut dyn RngCore) -> mcts_graph::Result<Self> {
        let prize = self
            .prize
            .ok_or_else(|| MCTSError::Adapter("no prize on the table".to_string()))?;
        let mut next = self.clone();

        for (agent, bid) in joint.iter().enumerate() {
            let hand = &mut next.hands[agent];
            let position = hand
                .iter()
                .position(|card| card == bid)
                .ok_or_else(|| {
                    MCTSError::Adapter(format!("player {} does not hold {}", agent, bid))
                })?;
            hand.remove(position);
        }

        match joint[0].cmp(&joint[1]) {
            Ordering::Greater => next.scores[0] += u32::from(prize),
            Ordering::Less => next.scores[1] += u32::from(prize),
            Ordering::Equal => {}
        }

        next.reveal(rng);
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.prize.is_none()
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.hands == other.hands
            && self.prize == other.prize
            && self.scores == other.scores
            && sorted(&self.prizes) == sorted(&other.prizes)
    }

    fn terminal_score(&self, agent: AgentId) -> f64 {
        let other = 1 - agent;
        match self.scores[agent].cmp(&self.scores[other]) {
            Ordering::Greater => 1.0,
            Ordering::Less => 0.0,
            Ordering::Equal => 0.5,
        }
    }
}

fn sorted(cards: &[u8]) -> Vec<u8> {
    let mut cards = cards.to_vec();
    cards.sort_unstable();
    cards
}

impl fmt::Display for Goofspiel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scores: {} - {}", self.scores[0], self.scores[1])?;
        for (agent, hand) in self.hands.iter().enumerate() {
            writeln!(f, "Player {} holds {:?}", agent, hand)?;
        }
        if let Some(prize) = self.prize {
            writeln!(f, "Prize card: {}", prize)?;
        }
        Ok(())
    }
}
