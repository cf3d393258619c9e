//! Tic-Tac-Toe example for the MCTS algorithm
//!
//! You play X against the search, which plays O. Pass `--self-play` to watch
//! the search play both sides.

use std::fmt;
use std::io::{self, Write};

use mcts_graph::{
    policy::{RolloutEvaluator, ZeroSumEvaluator},
    AgentId, DecisionProcess, MCTSConfig, MCTSError, MCTS,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const X: AgentId = 0;
const O: AgentId = 1;

fn main() -> Result<(), MCTSError> {
    // Initialize logging
    env_logger::init();

    println!("MCTS Tic-Tac-Toe Example");
    println!("========================");
    println!();

    let self_play = std::env::args().any(|arg| arg == "--self-play");
    let mut game = TicTacToe::new();
    let mut rng = ChaCha8Rng::from_entropy();

    let config = MCTSConfig::default()
        .with_exploration_constant(1.414)
        .with_simulations(10_000);

    // Rollouts score from X's side; O is credited the complement
    let mut mcts =
        MCTS::new(config).with_evaluator(ZeroSumEvaluator::new(RolloutEvaluator::new(), X));

    // Main game loop
    while !game.is_terminal() {
        println!("{}", game);

        let index = if game.current_agent() == X && !self_play {
            match read_move(&game) {
                Some(index) => index,
                None => continue,
            }
        } else {
            println!("Thinking...");
            let table = mcts.search_table(game.clone(), &mut rng)?;
            let root = table.root_node();
            let best = root
                .best_action(mcts.config().best_action_criteria)
                .ok_or(MCTSError::TerminalRoot)?;

            println!("{}", mcts.get_statistics().summary());
            for (square, fraction) in mcts.root_distribution(&table, 0) {
                if fraction > 0.0 {
                    let (row, col) = (square / 3, square % 3);
                    println!("  square {} ({}, {}): {:.1}%", square, row, col, fraction * 100.0);
                }
            }
            println!("Player {} plays ({}, {})", symbol(game.current_agent()), best / 3, best % 3);
            best
        };

        game = game.transition(&[index], &mut rng)?;
    }

    println!("{}", game);
    match game.winner() {
        Some(agent) => println!("Player {} wins!", symbol(agent)),
        None => println!("It's a draw!"),
    }
    Ok(())
}

fn read_move(game: &TicTacToe) -> Option<usize> {
    print!("Your move (enter row column, e.g. '1 2'): ");
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;

    let coords: Vec<usize> = input
        .split_whitespace()
        .filter_map(|s| s.parse::<usize>().ok())
        .collect();

    if coords.len() != 2 || coords[0] > 2 || coords[1] > 2 {
        println!("Invalid move! Enter row and column (0-2).");
        return None;
    }

    let index = coords[0] * 3 + coords[1];
    if game.board[index].is_some() {
        println!("That square is taken!");
        return None;
    }
    Some(index)
}

fn symbol(agent: AgentId) -> &'static str {
    if agent == X {
        "X"
    } else {
        "O"
    }
}

/// Tic-Tac-Toe game state
#[derive(Clone, Debug)]
struct TicTacToe {
    board: [Option<AgentId>; 9],
    moves_played: usize,
}

impl TicTacToe {
    fn new() -> Self {
        TicTacToe {
            board: [None; 9],
            moves_played: 0,
        }
    }

    /// Returns the winner of the game, if any
    fn winner(&self) -> Option<AgentId> {
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];

        LINES.iter().find_map(|&[a, b, c]| match self.board[a] {
            Some(agent) if self.board[b] == Some(agent) && self.board[c] == Some(agent) => {
                Some(agent)
            }
            _ => None,
        })
    }
}

impl DecisionProcess for TicTacToe {
    type Action = usize;

    fn current_agent(&self) -> AgentId {
        if self.moves_played % 2 == 0 {
            X
        } else {
            O
        }
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<usize> {
        (0..9).filter(|&i| self.board[i].is_none()).collect()
    }

    fn transition(&self, joint: &[usize], _rng: &mut dyn RngCore) -> mcts_graph::Result<Self> {
        let index = joint[0];
        if index >= 9 || self.board[index].is_some() {
            return Err(MCTSError::Adapter(format!("illegal move {}", index)));
        }

        let mut next = self.clone();
        next.board[index] = Some(self.current_agent());
        next.moves_played += 1;
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.moves_played == 9
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.board == other.board
    }

    fn terminal_score(&self, agent: AgentId) -> f64 {
        match self.winner() {
            Some(winner) if winner == agent => 1.0, // Win
            Some(_) => 0.0,                         // Loss
            None => 0.5,                            // Draw
        }
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2")?;
        for row in 0..3 {
            write!(f, "{} ", row)?;
            for col in 0..3 {
                let cell = match self.board[row * 3 + col] {
                    Some(agent) => symbol(agent),
                    None => ".",
                };
                write!(f, "{} ", cell)?;
            }
            writeln!(f)?;
        }

        if !self.is_terminal() {
            writeln!(f, "\nPlayer {}'s turn", symbol(self.current_agent()))?;
        }
        Ok(())
    }
}
