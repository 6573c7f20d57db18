// Move-choosing agents
//
// Everything that can sit on one side of a game implements `Agent`. The search
// engine is one of them; the others exist to play against it.

use log::warn;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, Write};

use crate::search::{ChosenMove, SearchConfig, SearchContext};
use crate::types::{Board, Direction, Move, Player};

/// A side in a game: given the board and the side to move, produce a move
///
/// Returning `None` resigns. Moves are validated by the caller.
pub trait Agent {
    fn name(&self) -> &str;

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Move>;

    /// Value and depth behind the most recent move, for agents that search
    fn last_decision(&self) -> Option<ChosenMove> {
        None
    }
}

/// Agent backed by the alpha-beta search
///
/// Borrows its context so the transposition table can outlive the agent and be
/// shared by consecutive games.
pub struct SearchAgent<'a> {
    context: &'a mut SearchContext,
    config: SearchConfig,
    last_decision: Option<ChosenMove>,
}

impl<'a> SearchAgent<'a> {
    pub fn new(context: &'a mut SearchContext, config: SearchConfig) -> Self {
        SearchAgent {
            context,
            config,
            last_decision: None,
        }
    }
}

impl Agent for SearchAgent<'_> {
    fn name(&self) -> &str {
        "alpha-beta"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Move> {
        match self.context.choose_move(board, player, &self.config) {
            Ok(chosen) => {
                self.last_decision = Some(chosen);
                Some(chosen.mv)
            }
            Err(e) => {
                warn!("Search could not choose a move for {}: {}", player, e);
                self.last_decision = None;
                None
            }
        }
    }

    fn last_decision(&self) -> Option<ChosenMove> {
        self.last_decision
    }
}

/// Uniformly random legal moves from a seeded generator
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Move> {
        board.legal_moves(player).choose(&mut self.rng).copied()
    }
}

/// Wraps another agent and plays a uniformly random legal move instead with
/// probability `rate`
///
/// Varies otherwise deterministic engine-against-engine games.
pub struct ExploringAgent<A> {
    inner: A,
    rng: StdRng,
    rate: f64,
    explored: bool,
}

impl<A: Agent> ExploringAgent<A> {
    /// `rate` is clamped to `[0, 1]`
    pub fn new(inner: A, rate: f64, seed: u64) -> Self {
        ExploringAgent {
            inner,
            rng: StdRng::seed_from_u64(seed),
            rate: if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) },
            explored: false,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Agent> Agent for ExploringAgent<A> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Move> {
        self.explored = self.rate > 0.0 && self.rng.random_bool(self.rate);
        if self.explored {
            if let Some(&mv) = board.legal_moves(player).choose(&mut self.rng) {
                return Some(mv);
            }
            self.explored = false;
        }
        self.inner.choose_move(board, player)
    }

    /// `None` after a random move
    fn last_decision(&self) -> Option<ChosenMove> {
        if self.explored {
            None
        } else {
            self.inner.last_decision()
        }
    }
}

/// Parses `row col direction`, e.g. `0 4 left`
pub fn parse_move(line: &str) -> Result<Move, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(format!("Expected 'row col direction', got '{}'", line.trim()));
    }

    let row = parts[0]
        .parse::<usize>()
        .map_err(|e| format!("Invalid row '{}': {}", parts[0], e))?;
    let col = parts[1]
        .parse::<usize>()
        .map_err(|e| format!("Invalid column '{}': {}", parts[1], e))?;
    let direction = parts[2].parse::<Direction>()?;

    Ok(Move::new(row, col, direction))
}

/// Reads moves line by line, rejecting anything that is not legal and asking again
///
/// End of input resigns.
pub struct InputAgent<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InputAgent<R, W> {
    pub fn new(input: R, output: W) -> Self {
        InputAgent { input, output }
    }

    fn prompt(&mut self, text: &str) {
        // a broken prompt stream does not stop reading moves
        let _ = write!(self.output, "{}", text);
        let _ = self.output.flush();
    }
}

impl<R: BufRead, W: Write> Agent for InputAgent<R, W> {
    fn name(&self) -> &str {
        "input"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Move> {
        let legal = board.legal_moves(player);
        self.prompt(&format!("{}\nPlayer {} move (row col direction): ", board, player));

        loop {
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read move: {}", e);
                    return None;
                }
            }

            match parse_move(&line) {
                Ok(mv) if legal.contains(&mv) => return Some(mv),
                Ok(mv) => {
                    warn!("Rejected illegal move {} for player {}", mv, player);
                    self.prompt("Illegal move, try again: ");
                }
                Err(e) => {
                    warn!("Rejected input: {}", e);
                    self.prompt("Could not parse move, try again: ");
                }
            }
        }
    }
}
