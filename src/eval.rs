// Position evaluation
//
// The terminal scan and the alignment counters share one pass over the 12 lines
// of the board (5 rows, 5 columns, 2 diagonals). Lines are scanned in that fixed
// order and the first stage holding a completed line decides the verdict.

use crate::types::{Board, Cell, Player, BOARD_SIZE};

/// Score of a won position from the winner's perspective
pub const MAX_SCORE: f64 = 10_000.0;
/// Score of a lost position; also the threshold that always accepts a search result
pub const MIN_SCORE: f64 = -MAX_SCORE;

/// Number of winning lines passing through each cell
const POSITION_WEIGHTS: [[i32; BOARD_SIZE]; BOARD_SIZE] = [
    [3, 2, 2, 2, 3],
    [2, 3, 2, 3, 2],
    [2, 2, 4, 2, 2],
    [2, 3, 2, 3, 2],
    [3, 2, 2, 2, 3],
];

const TOTAL_POSITION_WEIGHT: i32 = total_weight();

const fn total_weight() -> i32 {
    let mut total = 0;
    let mut r = 0;
    while r < BOARD_SIZE {
        let mut c = 0;
        while c < BOARD_SIZE {
            total += POSITION_WEIGHTS[r][c];
            c += 1;
        }
        r += 1;
    }
    total
}

/// Open lines (no opposing mark) with four or three marks of one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentCounts {
    pub mine_4: u32,
    pub theirs_4: u32,
    pub mine_3: u32,
    pub theirs_3: u32,
}

impl AlignmentCounts {
    fn record(&mut self, line: LineTally) {
        match (line.mine, line.theirs) {
            (4, 0) => self.mine_4 += 1,
            (3, 0) => self.mine_3 += 1,
            (0, 4) => self.theirs_4 += 1,
            (0, 3) => self.theirs_3 += 1,
            _ => {}
        }
    }
}

/// Outcome of the terminal scan for the player to move
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// `MAX_SCORE` or `MIN_SCORE`; no move is attached to a decided position
    Terminal(f64),
    /// Undecided position (score 0) with its alignment counters
    Open(AlignmentCounts),
}

#[derive(Debug, Clone, Copy)]
struct LineTally {
    mine: u8,
    theirs: u8,
}

fn tally(board: &Board, cells: impl Iterator<Item = (usize, usize)>, player: Player) -> LineTally {
    let mut line = LineTally { mine: 0, theirs: 0 };
    for (r, c) in cells {
        match board.cells[r][c] {
            Cell::Taken(owner) if owner == player => line.mine += 1,
            Cell::Taken(_) => line.theirs += 1,
            Cell::Empty => {}
        }
    }
    line
}

/// Scans one stage of lines. Within a stage a line of the player to move wins
/// outright, even after an opposing line was seen; an opposing line only loses
/// once the whole stage has been scanned.
fn scan_stage(
    lines: impl Iterator<Item = LineTally>,
    counts: &mut AlignmentCounts,
) -> Option<f64> {
    let mut opponent_won = false;

    for line in lines {
        if line.mine as usize == BOARD_SIZE {
            return Some(MAX_SCORE);
        }
        if line.theirs as usize == BOARD_SIZE {
            opponent_won = true;
        } else if !opponent_won {
            counts.record(line);
        }
    }

    opponent_won.then_some(MIN_SCORE)
}

/// Terminal detection fused with alignment counting, from `player`'s perspective
///
/// Rows are scanned first, then columns, then the main diagonal and finally the
/// anti-diagonal. The first stage containing a completed line decides; later
/// stages are not looked at.
pub fn evaluate_terminal_and_counts(board: &Board, player: Player) -> Evaluation {
    let mut counts = AlignmentCounts::default();

    let rows = (0..BOARD_SIZE).map(|r| tally(board, (0..BOARD_SIZE).map(move |c| (r, c)), player));
    if let Some(score) = scan_stage(rows, &mut counts) {
        return Evaluation::Terminal(score);
    }

    let cols = (0..BOARD_SIZE).map(|c| tally(board, (0..BOARD_SIZE).map(move |r| (r, c)), player));
    if let Some(score) = scan_stage(cols, &mut counts) {
        return Evaluation::Terminal(score);
    }

    let diagonal = tally(board, (0..BOARD_SIZE).map(|i| (i, i)), player);
    if let Some(score) = scan_stage(std::iter::once(diagonal), &mut counts) {
        return Evaluation::Terminal(score);
    }

    let anti_diagonal = tally(board, (0..BOARD_SIZE).map(|i| (i, BOARD_SIZE - 1 - i)), player);
    if let Some(score) = scan_stage(std::iter::once(anti_diagonal), &mut counts) {
        return Evaluation::Terminal(score);
    }

    Evaluation::Open(counts)
}

/// Static score of an undecided position for `player`
///
/// Weighted sum of the open four-line differential (/5), the open three-line
/// differential (/25) and the board's dot product with `POSITION_WEIGHTS`
/// normalised by the total weight.
pub fn heuristic_score(board: &Board, player: Player, counts: &AlignmentCounts) -> f64 {
    let fours = (counts.mine_4 as f64 - counts.theirs_4 as f64) / 5.0;
    let threes = (counts.mine_3 as f64 - counts.theirs_3 as f64) / 25.0;

    let mut positional: i32 = 0;
    for (weights, row) in POSITION_WEIGHTS.iter().zip(board.cells.iter()) {
        for (weight, cell) in weights.iter().zip(row.iter()) {
            positional += weight * cell.value() as i32;
        }
    }
    positional *= player.sign() as i32;

    fours + threes + positional as f64 / TOTAL_POSITION_WEIGHT as f64
}

/// Terminal score if decided, heuristic score otherwise
pub fn static_score(board: &Board, player: Player) -> f64 {
    match evaluate_terminal_and_counts(board, player) {
        Evaluation::Terminal(score) => score,
        Evaluation::Open(counts) => heuristic_score(board, player, &counts),
    }
}

fn line_owned_by(
    board: &Board,
    player: Player,
    mut cells: impl Iterator<Item = (usize, usize)>,
) -> bool {
    cells.all(|(r, c)| board.cells[r][c].is_owned_by(player))
}

fn owns_full_line(board: &Board, player: Player) -> bool {
    (0..BOARD_SIZE).any(|r| line_owned_by(board, player, (0..BOARD_SIZE).map(move |c| (r, c))))
        || (0..BOARD_SIZE).any(|c| line_owned_by(board, player, (0..BOARD_SIZE).map(move |r| (r, c))))
        || line_owned_by(board, player, (0..BOARD_SIZE).map(|i| (i, i)))
        || line_owned_by(board, player, (0..BOARD_SIZE).map(|i| (i, BOARD_SIZE - 1 - i)))
}

/// Winner after `last_mover` has played
///
/// Completing a line for the opponent loses even if the same move also
/// completed one of the mover's lines.
pub fn winner(board: &Board, last_mover: Player) -> Option<Player> {
    let opponent = last_mover.opponent();
    if owns_full_line(board, opponent) {
        Some(opponent)
    } else if owns_full_line(board, last_mover) {
        Some(last_mover)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_total_position_weight() {
        assert_eq!(TOTAL_POSITION_WEIGHT, 60);
    }

    #[test]
    fn test_empty_board_is_neutral() {
        let eval = evaluate_terminal_and_counts(&Board::new(), Player::A);
        assert_eq!(eval, Evaluation::Open(AlignmentCounts::default()));
        assert_eq!(static_score(&Board::new(), Player::A), 0.0);
    }

    #[test]
    fn test_row_of_five_wins_and_loses() {
        let b = board(
            ".....
             XXXXX
             O....
             O....
             .O...",
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::A),
            Evaluation::Terminal(MAX_SCORE)
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::B),
            Evaluation::Terminal(MIN_SCORE)
        );
    }

    #[test]
    fn test_anti_diagonal_is_detected() {
        let b = board(
            "....O
             ...O.
             ..O..
             .O...
             O....",
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::B),
            Evaluation::Terminal(MAX_SCORE)
        );
    }

    #[test]
    fn test_column_of_five_is_detected() {
        let b = board(
            "X....
             X....
             X....
             X....
             XOOOO",
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::A),
            Evaluation::Terminal(MAX_SCORE)
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::B),
            Evaluation::Terminal(MIN_SCORE)
        );
    }

    #[test]
    fn test_mover_line_in_same_stage_wins() {
        let b = board(
            "OOOOO
             XXXXX
             .....
             .....
             .....",
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::A),
            Evaluation::Terminal(MAX_SCORE)
        );
        assert_eq!(
            evaluate_terminal_and_counts(&b, Player::B),
            Evaluation::Terminal(MAX_SCORE)
        );
    }

    #[test]
    fn test_counts_only_open_lines() {
        let b = board(
            "XXXX.
             XXXO.
             OOO..
             .....
             .....",
        );
        let counts = match evaluate_terminal_and_counts(&b, Player::A) {
            Evaluation::Open(counts) => counts,
            other => panic!("unexpected {:?}", other),
        };
        // row 0 open four; row 1 blocked; column 0 (X X O . .) blocked
        assert_eq!(counts.mine_4, 1);
        assert_eq!(counts.mine_3, 0);
        // row 2 open three for O
        assert_eq!(counts.theirs_3, 1);
        assert_eq!(counts.theirs_4, 0);
    }

    #[test]
    fn test_heuristic_weights() {
        let b = board(
            "X....
             .....
             ..O..
             .....
             .....",
        );
        let counts = AlignmentCounts::default();
        assert!((heuristic_score(&b, Player::A, &counts) - (3.0 - 4.0) / 60.0).abs() < 1e-12);

        let counts = AlignmentCounts {
            mine_4: 2,
            theirs_4: 1,
            mine_3: 0,
            theirs_3: 1,
        };
        let expected = 1.0 / 5.0 - 1.0 / 25.0 + (3.0 - 4.0) / 60.0;
        assert!((heuristic_score(&b, Player::A, &counts) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_winner_prefers_opponent_line() {
        let b = board(
            "XXXXX
             OOOOO
             .....
             .....
             .....",
        );
        assert_eq!(winner(&b, Player::A), Some(Player::B));
        assert_eq!(winner(&b, Player::B), Some(Player::A));
        assert_eq!(winner(&Board::new(), Player::A), None);
    }

    #[test]
    fn test_winner_sees_every_line_kind() {
        let column = board("..O.. ..O.. ..O.. ..O.. ..O..");
        let diagonal = board("X.... .X... ..X.. ...X. ....X");
        let anti_diagonal = board("....O ...O. ..O.. .O... O....");
        let broken = board("XXXX. ..... ..... ..... .....");

        assert_eq!(winner(&column, Player::B), Some(Player::B));
        assert_eq!(winner(&column, Player::A), Some(Player::B));
        assert_eq!(winner(&diagonal, Player::A), Some(Player::A));
        assert_eq!(winner(&anti_diagonal, Player::A), Some(Player::B));
        assert_eq!(winner(&broken, Player::A), None);
    }
}
