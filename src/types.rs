// Quixo board model
//
// The board is a 5x5 grid of trinary cells. Only the 16 border cells can be
// picked up: a player takes an empty cube or one of their own, slides the rest
// of the row or column toward the gap and pushes their mark in at the far edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Side length of the board
pub const BOARD_SIZE: usize = 5;

const LAST: usize = BOARD_SIZE - 1;

/// One of the two sides, encoded as +1 / -1 so that negating a board swaps perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    /// Signed encoding shared with `Cell`
    pub fn sign(self) -> i8 {
        match self {
            Player::A => 1,
            Player::B => -1,
        }
    }

    pub fn from_sign(sign: i8) -> Option<Player> {
        match sign {
            1 => Some(Player::A),
            -1 => Some(Player::B),
            _ => None,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "A"),
            Player::B => write!(f, "B"),
        }
    }
}

/// Content of a single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Player),
}

impl Cell {
    /// Signed trinary value: 0 for empty, otherwise the owner's sign
    pub fn value(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Taken(player) => player.sign(),
        }
    }

    pub fn is_owned_by(self, player: Player) -> bool {
        self == Cell::Taken(player)
    }

    /// The same cell with the owner swapped
    pub fn inverted(self) -> Cell {
        match self {
            Cell::Empty => Cell::Empty,
            Cell::Taken(player) => Cell::Taken(player.opponent()),
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Taken(Player::A) => 'X',
            Cell::Taken(Player::B) => 'O',
        }
    }
}

impl From<Cell> for i8 {
    fn from(cell: Cell) -> i8 {
        cell.value()
    }
}

impl TryFrom<i8> for Cell {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            v => Player::from_sign(v)
                .map(Cell::Taken)
                .ok_or_else(|| format!("Invalid cell value: {}", v)),
        }
    }
}

/// Direction in which the picked-up cube is pushed back onto the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    /// All directions in move generation order
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Top => "top",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// True when pushing from (row, col) in this direction would leave the board
    pub fn points_off_board(self, row: usize, col: usize) -> bool {
        match self {
            Direction::Top => row == 0,
            Direction::Bottom => row == LAST,
            Direction::Left => col == 0,
            Direction::Right => col == LAST,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" | "t" | "up" => Ok(Direction::Top),
            "bottom" | "b" | "down" => Ok(Direction::Bottom),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// A ply: the border cell to pick up and the direction to push it back in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

impl Move {
    pub fn new(row: usize, col: usize, direction: Direction) -> Self {
        Move { row, col, direction }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}", self.row, self.col, self.direction.as_str())
    }
}

/// Rejection of an externally supplied move
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move {mv} is not legal for player {player}")]
    Illegal { mv: Move, player: Player },
}

pub fn is_border(row: usize, col: usize) -> bool {
    row == 0 || row == LAST || col == 0 || col == LAST
}

/// 5x5 Quixo board, treated as an immutable value by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    pub cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board
    pub fn new() -> Self {
        Board::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row][col] = cell;
    }

    /// Number of cells holding exactly `cell`
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == cell).count()
    }

    /// Generates every legal move for `player`, in row-major origin order and
    /// `Direction::ALL` order per origin
    ///
    /// A border cell is a candidate origin when it is empty or owned by `player`;
    /// the only directions removed are the ones that would push off the board.
    pub fn legal_moves(&self, player: Player) -> Vec<Move> {
        let mut moves = Vec::with_capacity(44);

        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if !self.can_pick_up(row, col, player) {
                    continue;
                }
                moves.extend(
                    Direction::ALL
                        .iter()
                        .filter(|dir| !dir.points_off_board(row, col))
                        .map(|&dir| Move::new(row, col, dir)),
                );
            }
        }

        moves
    }

    /// Checks a single move against the border, ownership and direction rules
    pub fn is_legal(&self, mv: Move, player: Player) -> bool {
        mv.row < BOARD_SIZE
            && mv.col < BOARD_SIZE
            && self.can_pick_up(mv.row, mv.col, player)
            && !mv.direction.points_off_board(mv.row, mv.col)
    }

    fn can_pick_up(&self, row: usize, col: usize, player: Player) -> bool {
        if !is_border(row, col) {
            return false;
        }
        let cell = self.cells[row][col];
        cell == Cell::Empty || cell.is_owned_by(player)
    }

    /// Returns the board after `player` plays `mv`
    ///
    /// Tiles between the origin and the edge in the push direction shift one step
    /// toward the origin and the vacated edge cell receives `player`'s mark.
    ///
    /// # Panics
    /// If `mv` is not legal for `player`. Moves coming from outside the engine must
    /// go through [`Board::checked_move`].
    pub fn apply_move(&self, mv: Move, player: Player) -> Board {
        assert!(
            self.is_legal(mv, player),
            "illegal move {} applied for player {}",
            mv,
            player
        );

        let mut next = *self;
        let (row, col) = (mv.row, mv.col);
        let mark = Cell::Taken(player);

        match mv.direction {
            Direction::Top => {
                for r in 1..=row {
                    next.cells[r][col] = self.cells[r - 1][col];
                }
                next.cells[0][col] = mark;
            }
            Direction::Bottom => {
                for r in row..LAST {
                    next.cells[r][col] = self.cells[r + 1][col];
                }
                next.cells[LAST][col] = mark;
            }
            Direction::Left => {
                for c in 1..=col {
                    next.cells[row][c] = self.cells[row][c - 1];
                }
                next.cells[row][0] = mark;
            }
            Direction::Right => {
                for c in col..LAST {
                    next.cells[row][c] = self.cells[row][c + 1];
                }
                next.cells[row][LAST] = mark;
            }
        }

        next
    }

    /// Validating counterpart of `apply_move` for moves of unknown origin
    pub fn checked_move(&self, mv: Move, player: Player) -> Result<Board, MoveError> {
        if self.is_legal(mv, player) {
            Ok(self.apply_move(mv, player))
        } else {
            Err(MoveError::Illegal { mv, player })
        }
    }

    /// Quarter turn counter-clockwise
    pub fn rotated(&self) -> Board {
        let mut out = Board::new();
        for r in 0..BOARD_SIZE {
            for c in 0..BOARD_SIZE {
                out.cells[r][c] = self.cells[c][LAST - r];
            }
        }
        out
    }

    /// Mirror image across the horizontal axis (top row becomes bottom row)
    pub fn flipped(&self) -> Board {
        let mut out = *self;
        out.cells.reverse();
        out
    }

    /// Colour inversion: every cube changes owner
    pub fn inverted(&self) -> Board {
        let mut out = *self;
        for cell in out.cells.iter_mut().flatten() {
            *cell = cell.inverted();
        }
        out
    }

    /// Row-major byte serialization; empty < A < B in byte order
    pub fn to_bytes(&self) -> [u8; BOARD_SIZE * BOARD_SIZE] {
        let mut bytes = [0u8; BOARD_SIZE * BOARD_SIZE];
        for (byte, cell) in bytes.iter_mut().zip(self.cells.iter().flatten()) {
            *byte = cell.value() as u8;
        }
        bytes
    }
}

/// Parses the `Display` form: 25 symbols out of `X` (A), `O` (B) and `.` (empty),
/// whitespace ignored
impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols: Vec<char> = s.chars().filter(|ch| !ch.is_whitespace()).collect();
        if symbols.len() != BOARD_SIZE * BOARD_SIZE {
            return Err(format!(
                "Expected {} cells, found {}",
                BOARD_SIZE * BOARD_SIZE,
                symbols.len()
            ));
        }

        let mut board = Board::new();
        for (idx, symbol) in symbols.into_iter().enumerate() {
            let cell = match symbol {
                '.' => Cell::Empty,
                'X' | 'x' => Cell::Taken(Player::A),
                'O' | 'o' => Cell::Taken(Player::B),
                other => return Err(format!("Invalid cell symbol: {}", other)),
            };
            board.cells[idx / BOARD_SIZE][idx % BOARD_SIZE] = cell;
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
