// Alpha-beta search and the iterative deepening driver
//
// Scores are kept in the perspective of the player at the root: every node
// returns root-relative values, max nodes raise alpha and min nodes lower beta.
// Leaves convert the mover-relative evaluation with a sign fixed by the root
// depth parity and the node depth parity.

use log::{debug, info};
use serde::Deserialize;
use std::time::Instant;
use thiserror::Error;

use crate::canonical::{canonical_key, CanonicalKey};
use crate::eval::{evaluate_terminal_and_counts, heuristic_score, Evaluation, MAX_SCORE, MIN_SCORE};
use crate::simple_profiler::{self, ProfileGuard};
use crate::transposition::TranspositionTable;
use crate::types::{Board, Move, Player};

/// Invalid depth range or acceptance thresholds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchConfigError {
    #[error("min_depth must be at least 1")]
    ZeroMinDepth,
    #[error("min_depth {min_depth} exceeds max_depth {max_depth}")]
    InvertedDepthRange { min_depth: u8, max_depth: u8 },
    #[error("expected {expected} thresholds for depths {min_depth}..={max_depth}, found {found}")]
    ThresholdCount {
        min_depth: u8,
        max_depth: u8,
        expected: usize,
        found: usize,
    },
    #[error("final threshold must be {required} so the deepest search always accepts, found {found}")]
    OpenFinalThreshold { required: f64, found: f64 },
}

/// Failure to produce a move for the requested position
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("no move available: the position is already decided or has no legal moves")]
    NoMove,
    #[error("no depth up to {max_depth} met its acceptance threshold")]
    Exhausted { max_depth: u8 },
}

#[derive(Debug, Deserialize)]
struct RawSearchConfig {
    min_depth: u8,
    max_depth: u8,
    thresholds: Vec<f64>,
}

impl TryFrom<RawSearchConfig> for SearchConfig {
    type Error = SearchConfigError;

    fn try_from(raw: RawSearchConfig) -> Result<Self, Self::Error> {
        SearchConfig::new(raw.min_depth, raw.max_depth, raw.thresholds)
    }
}

/// Depth range and per-depth acceptance thresholds of the deepening loop
///
/// `thresholds[i]` applies to depth `min_depth + i`. The last threshold is always
/// `MIN_SCORE`, so the deepest iteration accepts whatever it finds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSearchConfig")]
pub struct SearchConfig {
    min_depth: u8,
    max_depth: u8,
    thresholds: Vec<f64>,
}

impl SearchConfig {
    /// Validates and builds a configuration
    ///
    /// # Arguments
    /// * `min_depth` - First depth searched, at least 1
    /// * `max_depth` - Last depth searched, also the deepest table entry probed
    /// * `thresholds` - One acceptance threshold per depth, ending with `MIN_SCORE`
    pub fn new(
        min_depth: u8,
        max_depth: u8,
        thresholds: Vec<f64>,
    ) -> Result<Self, SearchConfigError> {
        if min_depth == 0 {
            return Err(SearchConfigError::ZeroMinDepth);
        }
        if min_depth > max_depth {
            return Err(SearchConfigError::InvertedDepthRange {
                min_depth,
                max_depth,
            });
        }

        let expected = (max_depth - min_depth) as usize + 1;
        if thresholds.len() != expected {
            return Err(SearchConfigError::ThresholdCount {
                min_depth,
                max_depth,
                expected,
                found: thresholds.len(),
            });
        }

        match thresholds.last() {
            Some(&last) if last == MIN_SCORE => {}
            other => {
                return Err(SearchConfigError::OpenFinalThreshold {
                    required: MIN_SCORE,
                    found: other.copied().unwrap_or(f64::NAN),
                })
            }
        }

        Ok(SearchConfig {
            min_depth,
            max_depth,
            thresholds,
        })
    }

    /// Searches exactly `depth` plies
    pub fn fixed_depth(depth: u8) -> Result<Self, SearchConfigError> {
        SearchConfig::new(depth, depth, vec![MIN_SCORE])
    }

    pub fn min_depth(&self) -> u8 {
        self.min_depth
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl Default for SearchConfig {
    /// Depths 1 to 3: accept a forced win at depth 1, a clearly good position at
    /// depth 2, anything at depth 3
    fn default() -> Self {
        SearchConfig {
            min_depth: 1,
            max_depth: 3,
            thresholds: vec![MAX_SCORE, 0.3, MIN_SCORE],
        }
    }
}

/// Result of one alpha-beta call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// Best child move; `None` at leaves and decided positions
    pub best_move: Option<Move>,
    /// Root-relative value
    pub value: f64,
    /// No cutoff happened anywhere below this node, so `value` is exact rather
    /// than a bound
    pub exact: bool,
}

impl SearchOutcome {
    fn leaf(value: f64) -> Self {
        SearchOutcome {
            best_move: None,
            value,
            exact: true,
        }
    }
}

/// Move returned by the deepening driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChosenMove {
    pub mv: Move,
    pub value: f64,
    /// Depth whose result was accepted
    pub depth: u8,
}

/// Node and cutoff counters accumulated over the lifetime of a context
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaf_evaluations: u64,
    pub cutoffs: u64,
    /// Children whose recursion was postponed behind cached siblings
    pub deferred: u64,
}

/// Per-search constants derived from the root depth
#[derive(Debug, Clone, Copy)]
struct Frame {
    max_parity: u8,
    leaf_sign: f64,
    max_depth: u8,
}

impl Frame {
    fn for_root(depth: u8, max_depth: u8) -> Self {
        Frame {
            max_parity: depth % 2,
            leaf_sign: parity_sign(depth),
            max_depth,
        }
    }
}

fn parity_sign(depth: u8) -> f64 {
    if depth % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Alpha-beta window of one node
#[derive(Debug, Clone, Copy)]
struct Window {
    alpha: f64,
    beta: f64,
    is_max: bool,
}

impl Window {
    /// Folds a child value into the window; true when the remaining siblings can be cut
    fn update(&mut self, value: f64) -> bool {
        if self.is_max {
            self.alpha = self.alpha.max(value);
        } else {
            self.beta = self.beta.min(value);
        }
        self.beta <= self.alpha
    }
}

/// Child that missed the table and waits for the second pass
struct PendingChild {
    mv: Move,
    board: Board,
    key: CanonicalKey,
}

/// First move holding the extreme value, in evaluation order
fn best_of(evaluated: &[(Move, f64)], is_max: bool) -> Option<(Move, f64)> {
    let (&first, rest) = evaluated.split_first()?;
    Some(rest.iter().fold(first, |best, &(mv, value)| {
        let better = if is_max { value > best.1 } else { value < best.1 };
        if better {
            (mv, value)
        } else {
            best
        }
    }))
}

/// Search state owning the transposition table
///
/// The table lives as long as the context, so positions cached by one
/// `choose_move` call are reused by the next. Contexts are single-threaded;
/// parallel callers use one context per worker.
#[derive(Debug, Default)]
pub struct SearchContext {
    table: TranspositionTable,
    stats: SearchStats,
}

impl SearchContext {
    /// Creates a context with an unbounded table
    pub fn new() -> Self {
        SearchContext::default()
    }

    pub fn with_table_capacity(soft_capacity: Option<usize>) -> Self {
        SearchContext {
            table: TranspositionTable::with_soft_capacity(soft_capacity),
            stats: SearchStats::default(),
        }
    }

    pub fn table(&self) -> &TranspositionTable {
        &self.table
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Picks a move by iterative deepening
    ///
    /// Depths run from `min_depth` to `max_depth`; the first depth whose value
    /// reaches its threshold is accepted.
    ///
    /// # Returns
    /// * `Ok(ChosenMove)` - accepted move with its value and depth
    /// * `Err(SearchError::NoMove)` - the position is decided or has no legal move
    pub fn choose_move(
        &mut self,
        board: &Board,
        player: Player,
        config: &SearchConfig,
    ) -> Result<ChosenMove, SearchError> {
        let start_time = Instant::now();
        let depths = config.min_depth..=config.max_depth;

        for (depth, &threshold) in depths.zip(config.thresholds.iter()) {
            let outcome = self.search(board, player, depth, config.max_depth);
            let mv = outcome.best_move.ok_or(SearchError::NoMove)?;

            debug!(
                "Depth {}: best {} value {:.4} (threshold {}, exact: {})",
                depth, mv, outcome.value, threshold, outcome.exact
            );

            if outcome.value >= threshold {
                simple_profiler::merge_thread_local();
                info!(
                    "Player {}: chose {} (value: {:.4}, depth: {}, time: {}ms, table: {} entries)",
                    player,
                    mv,
                    outcome.value,
                    depth,
                    start_time.elapsed().as_millis(),
                    self.table.len()
                );
                return Ok(ChosenMove {
                    mv,
                    value: outcome.value,
                    depth,
                });
            }
        }

        simple_profiler::merge_thread_local();
        Err(SearchError::Exhausted {
            max_depth: config.max_depth,
        })
    }

    /// Full-width alpha-beta search of `depth` plies from the root
    ///
    /// `max_depth` bounds the table probes: cached values up to that depth are
    /// accepted for any node.
    pub fn search(&mut self, board: &Board, player: Player, depth: u8, max_depth: u8) -> SearchOutcome {
        let frame = Frame::for_root(depth, max_depth.max(depth));
        self.alpha_beta(board, player, depth, MIN_SCORE, MAX_SCORE, frame)
    }

    fn alpha_beta(
        &mut self,
        board: &Board,
        player: Player,
        depth: u8,
        alpha: f64,
        beta: f64,
        frame: Frame,
    ) -> SearchOutcome {
        let _guard = ProfileGuard::new("alpha_beta");
        self.stats.nodes += 1;

        let evaluation = crate::profile!("eval", { evaluate_terminal_and_counts(board, player) });
        let counts = match evaluation {
            Evaluation::Terminal(score) => {
                return SearchOutcome::leaf(frame.leaf_sign * score * parity_sign(depth));
            }
            Evaluation::Open(counts) => counts,
        };

        if depth == 0 {
            self.stats.leaf_evaluations += 1;
            return SearchOutcome::leaf(frame.leaf_sign * heuristic_score(board, player, &counts));
        }

        let moves = crate::profile!("move_gen", { board.legal_moves(player) });
        if moves.is_empty() {
            return SearchOutcome::leaf(0.0);
        }

        let mut window = Window {
            alpha,
            beta,
            is_max: depth % 2 == frame.max_parity,
        };
        let mut evaluated: Vec<(Move, f64)> = Vec::with_capacity(moves.len());
        let mut pending: Vec<PendingChild> = Vec::new();
        let mut subtree_exact = true;
        let mut cut = false;

        // First pass: cached children, plus direct recursion at depth 1
        for &mv in &moves {
            let child = board.apply_move(mv, player);
            let key = canonical_key(&child, player);

            let value = match self.table.lookup_best(&key, depth, frame.max_depth, window.is_max) {
                Some(value) => value,
                None if depth > 1 => {
                    pending.push(PendingChild {
                        mv,
                        board: child,
                        key,
                    });
                    continue;
                }
                None => {
                    let outcome = self.expand_child(&child, key, player, depth, window, frame);
                    subtree_exact &= outcome.exact;
                    outcome.value
                }
            };

            evaluated.push((mv, value));
            if window.update(value) {
                cut = true;
                break;
            }
        }

        // Second pass: recursion for the misses, with the window the hits produced
        if !cut {
            self.stats.deferred += pending.len() as u64;
            for child in pending {
                let outcome = self.expand_child(&child.board, child.key, player, depth, window, frame);
                subtree_exact &= outcome.exact;
                evaluated.push((child.mv, outcome.value));
                if window.update(outcome.value) {
                    cut = true;
                    break;
                }
            }
        }

        if cut {
            self.stats.cutoffs += 1;
            simple_profiler::record_alpha_beta_cutoff();
        }

        let exact = subtree_exact && evaluated.len() == moves.len();
        match best_of(&evaluated, window.is_max) {
            Some((mv, value)) => SearchOutcome {
                best_move: Some(mv),
                value,
                exact,
            },
            None => SearchOutcome::leaf(0.0),
        }
    }

    /// Recurses into a child and caches its value when it is exact
    fn expand_child(
        &mut self,
        child: &Board,
        key: CanonicalKey,
        player: Player,
        depth: u8,
        window: Window,
        frame: Frame,
    ) -> SearchOutcome {
        let outcome = self.alpha_beta(
            child,
            player.opponent(),
            depth - 1,
            window.alpha,
            window.beta,
            frame,
        );
        if outcome.exact {
            self.table.store(key, depth, window.is_max, outcome.value);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_default_config_is_valid() {
        let default = SearchConfig::default();
        let rebuilt = SearchConfig::new(1, 3, vec![MAX_SCORE, 0.3, MIN_SCORE]).unwrap();
        assert_eq!(default, rebuilt);
    }

    #[test]
    fn test_config_rejects_open_final_threshold() {
        let err = SearchConfig::new(1, 3, vec![MAX_SCORE, 0.3, 0.0]).unwrap_err();
        assert_eq!(
            err,
            SearchConfigError::OpenFinalThreshold {
                required: MIN_SCORE,
                found: 0.0
            }
        );
    }

    #[test]
    fn test_config_rejects_wrong_threshold_count() {
        assert!(matches!(
            SearchConfig::new(1, 3, vec![MAX_SCORE, MIN_SCORE]),
            Err(SearchConfigError::ThresholdCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_config_rejects_bad_depths() {
        assert_eq!(
            SearchConfig::new(0, 2, vec![0.0, 0.0, MIN_SCORE]),
            Err(SearchConfigError::ZeroMinDepth)
        );
        assert_eq!(
            SearchConfig::new(3, 2, vec![MIN_SCORE]),
            Err(SearchConfigError::InvertedDepthRange {
                min_depth: 3,
                max_depth: 2
            })
        );
    }

    #[test]
    fn test_config_deserializes_through_validation() {
        let ok: SearchConfig =
            toml::from_str("min_depth = 2\nmax_depth = 2\nthresholds = [-10000.0]").unwrap();
        assert_eq!(ok, SearchConfig::fixed_depth(2).unwrap());

        let bad: Result<SearchConfig, _> =
            toml::from_str("min_depth = 1\nmax_depth = 2\nthresholds = [0.0, 0.5]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_best_of_keeps_first_extreme() {
        let a = Move::new(0, 0, Direction::Bottom);
        let b = Move::new(0, 1, Direction::Bottom);
        let c = Move::new(0, 2, Direction::Bottom);
        let evaluated = [(a, 0.5), (b, 0.7), (c, 0.7)];

        assert_eq!(best_of(&evaluated, true), Some((b, 0.7)));
        assert_eq!(best_of(&evaluated, false), Some((a, 0.5)));
        assert_eq!(best_of(&[], true), None);
    }

    #[test]
    fn test_window_cutoff() {
        let mut window = Window {
            alpha: 0.0,
            beta: 1.0,
            is_max: false,
        };
        assert!(!window.update(0.5));
        assert!(window.update(-0.5));
    }

    #[test]
    fn test_leaf_sign_follows_root_parity() {
        // depth-1 root: leaves are the opponent's positions and get negated
        assert_eq!(Frame::for_root(1, 1).leaf_sign, -1.0);
        assert_eq!(Frame::for_root(2, 3).leaf_sign, 1.0);
        assert_eq!(Frame::for_root(3, 3).max_parity, 1);
    }

    #[test]
    fn test_decided_root_has_no_move() {
        let board: Board = "XXXXX
                            O....
                            O....
                            O....
                            ....."
            .parse()
            .unwrap();
        let mut ctx = SearchContext::new();
        assert_eq!(
            ctx.choose_move(&board, Player::B, &SearchConfig::default()),
            Err(SearchError::NoMove)
        );
    }

    #[test]
    fn test_depth_one_takes_immediate_win() {
        let board: Board = "XXXX.
                            .....
                            O....
                            O....
                            O...."
            .parse()
            .unwrap();
        let mut ctx = SearchContext::new();
        let chosen = ctx
            .choose_move(&board, Player::A, &SearchConfig::default())
            .unwrap();

        assert_eq!(chosen.depth, 1);
        assert_eq!(chosen.value, MAX_SCORE);
        let next = board.apply_move(chosen.mv, Player::A);
        assert_eq!(
            evaluate_terminal_and_counts(&next, Player::A),
            Evaluation::Terminal(MAX_SCORE)
        );
    }
}
