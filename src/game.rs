// Turn alternation between two agents
//
// The game owns move validation: agents may return anything, and only moves
// that pass `Board::checked_move` are played.

use log::{info, warn};

use crate::agent::Agent;
use crate::eval::winner;
use crate::search::ChosenMove;
use crate::types::{Board, Move, Player};

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Player),
    /// Ply limit reached
    Draw,
    /// The given player resigned or returned an illegal move
    Forfeit(Player),
}

impl Outcome {
    /// Player credited with the game, if any
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner(player) => Some(*player),
            Outcome::Forfeit(player) => Some(player.opponent()),
            Outcome::Draw => None,
        }
    }
}

/// Summary of a finished game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub outcome: Outcome,
    pub plies: u32,
    pub board: Board,
}

/// A move that was accepted and is about to be played
#[derive(Debug, Clone, Copy)]
pub struct MoveEvent<'a> {
    pub ply: u32,
    pub player: Player,
    pub board: &'a Board,
    pub mv: Move,
    /// Present when the mover is a searching agent
    pub decision: Option<ChosenMove>,
}

/// A game in progress; `Player::A` moves first on a fresh board
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    to_move: Player,
    ply: u32,
    max_plies: u32,
}

impl Game {
    pub fn new(max_plies: u32) -> Self {
        Game::from_position(Board::new(), Player::A, max_plies)
    }

    pub fn from_position(board: Board, to_move: Player, max_plies: u32) -> Self {
        Game {
            board,
            to_move,
            ply: 0,
            max_plies,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Plays to the end; `first` controls `Player::A`, `second` controls `Player::B`
    pub fn play(&mut self, first: &mut dyn Agent, second: &mut dyn Agent) -> GameRecord {
        self.play_with(first, second, |_| {})
    }

    /// Same as `play`, calling `on_move` for every accepted move before it is applied
    pub fn play_with<F>(
        &mut self,
        first: &mut dyn Agent,
        second: &mut dyn Agent,
        mut on_move: F,
    ) -> GameRecord
    where
        F: FnMut(&MoveEvent<'_>),
    {
        loop {
            if self.ply >= self.max_plies {
                info!("Game drawn after {} plies", self.ply);
                return self.record(Outcome::Draw);
            }

            let player = self.to_move;
            let agent: &mut dyn Agent = match player {
                Player::A => &mut *first,
                Player::B => &mut *second,
            };

            let Some(mv) = agent.choose_move(&self.board, player) else {
                warn!("Player {} ({}) resigned", player, agent.name());
                return self.record(Outcome::Forfeit(player));
            };

            let next = match self.board.checked_move(mv, player) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Player {} ({}) forfeits: {}", player, agent.name(), e);
                    return self.record(Outcome::Forfeit(player));
                }
            };

            on_move(&MoveEvent {
                ply: self.ply,
                player,
                board: &self.board,
                mv,
                decision: agent.last_decision(),
            });

            self.board = next;
            self.ply += 1;

            if let Some(won) = winner(&self.board, player) {
                info!("Player {} wins after {} plies", won, self.ply);
                return self.record(Outcome::Winner(won));
            }

            self.to_move = player.opponent();
        }
    }

    fn record(&self, outcome: Outcome) -> GameRecord {
        GameRecord {
            outcome,
            plies: self.ply,
            board: self.board,
        }
    }
}

/// Win/loss tally from one agent's point of view
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl MatchSummary {
    /// Adds a game in which the tallied agent played `side`
    pub fn record(&mut self, outcome: Outcome, side: Player) {
        match outcome.winner() {
            Some(winner) if winner == side => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
    }

    pub fn merge(mut self, other: MatchSummary) -> MatchSummary {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            0.0
        } else {
            100.0 * self.wins as f64 / self.games() as f64
        }
    }
}
