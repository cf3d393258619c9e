// Decision processes shared by the integration tests
#![allow(dead_code)]

use mcts_graph::{AgentId, DecisionProcess, MCTSError, NodeTable, Result};
use rand::RngCore;

/// Routes `log` output through the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A single decision; each action ends the process with a fixed score
#[derive(Clone, Debug)]
pub struct OneShot {
    pub scores: Vec<f64>,
    pub picked: Option<usize>,
}

impl OneShot {
    pub fn new(scores: &[f64]) -> Self {
        OneShot {
            scores: scores.to_vec(),
            picked: None,
        }
    }
}

impl DecisionProcess for OneShot {
    type Action = usize;

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<usize> {
        (0..self.scores.len()).collect()
    }

    fn transition(&self, joint: &[usize], _rng: &mut dyn RngCore) -> Result<Self> {
        Ok(OneShot {
            scores: self.scores.clone(),
            picked: Some(joint[0]),
        })
    }

    fn is_terminal(&self) -> bool {
        self.picked.is_some()
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.picked == other.picked
    }

    fn terminal_score(&self, _agent: AgentId) -> f64 {
        self.picked.map_or(0.0, |i| self.scores[i])
    }
}

/// Walk right (0) or down (1) on a grid until `x + y == size`
///
/// Many move orders reach the same cell, so the search graph is a DAG.
/// The terminal score is `x / size`.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub x: u8,
    pub y: u8,
    pub size: u8,
}

impl Lattice {
    pub fn new(size: u8) -> Self {
        Lattice { x: 0, y: 0, size }
    }
}

impl DecisionProcess for Lattice {
    type Action = u8;

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
        vec![0, 1]
    }

    fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
        let mut next = self.clone();
        match joint[0] {
            0 => next.x += 1,
            _ => next.y += 1,
        }
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.x + self.y >= self.size
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }

    fn terminal_score(&self, _agent: AgentId) -> f64 {
        f64::from(self.x) / f64::from(self.size)
    }
}

/// Binary choices recorded in full, so every state has exactly one parent
#[derive(Clone, Debug)]
pub struct Bits {
    pub path: Vec<u8>,
    pub depth: usize,
}

impl Bits {
    pub fn new(depth: usize) -> Self {
        Bits {
            path: Vec::new(),
            depth,
        }
    }
}

impl DecisionProcess for Bits {
    type Action = u8;

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
        vec![0, 1]
    }

    fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
        let mut next = self.clone();
        next.path.push(joint[0]);
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.path.len() >= self.depth
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.path == other.path
    }

    fn terminal_score(&self, _agent: AgentId) -> f64 {
        let ones = self.path.iter().filter(|&&b| b == 1).count();
        ones as f64 / self.depth as f64
    }
}

/// Action 0 stays in the same state, action 1 ends the process
#[derive(Clone, Debug)]
pub struct Loop {
    pub done: bool,
}

impl DecisionProcess for Loop {
    type Action = u8;

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
        vec![0, 1]
    }

    fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
        Ok(Loop {
            done: joint[0] == 1,
        })
    }

    fn is_terminal(&self) -> bool {
        self.done
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.done == other.done
    }

    fn terminal_score(&self, _agent: AgentId) -> f64 {
        1.0
    }
}

/// How a [`Faulty`] process breaks its contract
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fault {
    /// No legal actions at the faulty depth
    NoActions,
    /// `transition` fails from the faulty depth
    TransitionError,
    /// `transition` panics from the faulty depth
    Panic,
}

/// A counter that misbehaves once it reaches `fault_depth`
#[derive(Clone, Debug)]
pub struct Faulty {
    pub depth: u32,
    pub fault_depth: u32,
    pub max_depth: u32,
    pub fault: Fault,
}

impl Faulty {
    pub fn new(fault: Fault, fault_depth: u32, max_depth: u32) -> Self {
        Faulty {
            depth: 0,
            fault_depth,
            max_depth,
            fault,
        }
    }
}

impl DecisionProcess for Faulty {
    type Action = u8;

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
        if self.fault == Fault::NoActions && self.depth == self.fault_depth {
            return Vec::new();
        }
        vec![0, 1]
    }

    fn transition(&self, _joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
        if self.depth == self.fault_depth {
            match self.fault {
                Fault::TransitionError => {
                    return Err(MCTSError::Adapter(format!(
                        "transition refused at depth {}",
                        self.depth
                    )))
                }
                Fault::Panic => panic!("transition panicked at depth {}", self.depth),
                Fault::NoActions => {}
            }
        }
        let mut next = self.clone();
        next.depth += 1;
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.depth >= self.max_depth
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.depth == other.depth
    }

    fn terminal_score(&self, _agent: AgentId) -> f64 {
        0.5
    }
}

/// Two agents pick 0..=2 at the same time; agent 0 is paid
/// `(a0 + 2 - a1) / 4`, agent 1 the rest
///
/// Playing 2 is dominant for both agents.
#[derive(Clone, Debug)]
pub struct Duel {
    pub played: Option<(u8, u8)>,
}

impl DecisionProcess for Duel {
    type Action = u8;

    fn acting_agents(&self) -> Vec<AgentId> {
        vec![0, 1]
    }

    fn current_agent(&self) -> AgentId {
        0
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<u8> {
        vec![0, 1, 2]
    }

    fn transition(&self, joint: &[u8], _rng: &mut dyn RngCore) -> Result<Self> {
        Ok(Duel {
            played: Some((joint[0], joint[1])),
        })
    }

    fn is_terminal(&self) -> bool {
        self.played.is_some()
    }

    fn states_equal(&self, other: &Self) -> bool {
        self.played == other.played
    }

    fn terminal_score(&self, agent: AgentId) -> f64 {
        let (a0, a1) = self.played.unwrap_or((0, 0));
        let first = f64::from(a0 + 2 - a1) / 4.0;
        if agent == 0 {
            first
        } else {
            1.0 - first
        }
    }
}

/// Tic-tac-toe; agent 0 plays X and moves first
#[derive(Clone, Debug)]
pub struct TicTacToe {
    pub board: [Option<AgentId>; 9],
    pub moves_played: usize,
}

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

impl TicTacToe {
    pub fn new() -> Self {
        TicTacToe {
            board: [None; 9],
            moves_played: 0,
        }
    }

    pub fn winner(&self) -> Option<AgentId> {
        LINES.iter().find_map(|line| {
            let first = self.board[line[0]]?;
            if line.iter().all(|&i| self.board[i] == Some(first)) {
                Some(first)
            } else {
                None
            }
        })
    }
}

impl DecisionProcess for TicTacToe {
    type Action = usize;

    fn current_agent(&self) -> AgentId {
        self.moves_played % 2
    }

    fn legal_actions(&self, _agent: AgentId) -> Vec<usize> {
        (0..9).filter(|&i| self.board[i].is_none()).collect()
    }

    fn transition(&self, joint: &[usize], _rng: &mut dyn RngCore) -> Result<Self> {
        let position = joint[0];
        if self.board[position].is_some() {
            return Err(MCTSError::Adapter(format!("square {} is taken", position)));
        }
        let mut next = self.clone();
        next.board[position] = Some(self.current_agent());
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
            Some(winner) if winner == agent => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }
}

/// Asserts that no two nodes of `table` hold equal states
pub fn assert_no_duplicates<S: DecisionProcess>(table: &NodeTable<S>) {
    let nodes = table.nodes();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(
                !a.state().states_equal(b.state()),
                "table holds two nodes for one state"
            );
        }
    }
}

/// Asserts that nothing is left in flight anywhere in `table`
pub fn assert_quiescent<S: DecisionProcess>(table: &NodeTable<S>) {
    for node in table.nodes() {
        assert_eq!(node.in_flight(), 0, "node still marked in flight");
        for selector in node.selectors() {
            for stat in selector.stats() {
                assert_eq!(stat.virtual_trials(), 0, "virtual loss left behind");
                assert_eq!(stat.effective_value(), stat.accumulated_value());
            }
        }
    }
}
