// Search correctness against a plain minimax, plus table reuse and deepening behaviour

use quixo_engine::eval::{evaluate_terminal_and_counts, heuristic_score, winner, Evaluation, MAX_SCORE};
use quixo_engine::search::{SearchConfig, SearchContext, SearchError};
use quixo_engine::types::{Board, Direction, Move, Player};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

/// Exhaustive minimax with values from `root`'s point of view
fn reference_minimax(board: &Board, player: Player, root: Player, depth: u8) -> f64 {
    let perspective = if player == root { 1.0 } else { -1.0 };
    let counts = match evaluate_terminal_and_counts(board, player) {
        Evaluation::Terminal(score) => return perspective * score,
        Evaluation::Open(counts) => counts,
    };
    if depth == 0 {
        return perspective * heuristic_score(board, player, &counts);
    }

    let values: Vec<f64> = board
        .legal_moves(player)
        .into_iter()
        .map(|mv| reference_minimax(&board.apply_move(mv, player), player.opponent(), root, depth - 1))
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    if player == root {
        values.into_iter().fold(f64::NEG_INFINITY, f64::max)
    } else {
        values.into_iter().fold(f64::INFINITY, f64::min)
    }
}

/// Undecided positions reached by a few random plies from the empty board
fn midgame_positions(seed: u64, count: usize, plies: usize) -> Vec<(Board, Player)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = Vec::new();

    while positions.len() < count {
        let mut board = Board::new();
        let mut player = Player::A;
        let mut decided = false;

        for _ in 0..plies {
            let Some(&mv) = board.legal_moves(player).choose(&mut rng) else {
                decided = true;
                break;
            };
            board = board.apply_move(mv, player);
            if winner(&board, player).is_some() {
                decided = true;
                break;
            }
            player = player.opponent();
        }

        if !decided {
            positions.push((board, player));
        }
    }

    positions
}

#[test]
fn test_alpha_beta_matches_minimax_at_depth_one() {
    for (board, player) in midgame_positions(31, 20, 10) {
        let mut ctx = SearchContext::new();
        let outcome = ctx.search(&board, player, 1, 1);
        let expected = reference_minimax(&board, player, player, 1);

        assert_eq!(outcome.value, expected, "position\n{}", board);
        // only an immediate win cuts at depth one
        if expected < MAX_SCORE {
            assert!(outcome.exact);
        }

        let best = outcome.best_move.expect("undecided position has a move");
        let child = board.apply_move(best, player);
        assert_eq!(reference_minimax(&child, player.opponent(), player, 0), expected);
    }
}

#[test]
fn test_alpha_beta_matches_minimax_at_depth_two() {
    for (board, player) in midgame_positions(32, 6, 12) {
        let mut ctx = SearchContext::new();
        let outcome = ctx.search(&board, player, 2, 2);
        let expected = reference_minimax(&board, player, player, 2);

        assert!(
            (outcome.value - expected).abs() < 1e-12,
            "alpha-beta {} vs minimax {} on\n{}",
            outcome.value,
            expected,
            board
        );

        let best = outcome.best_move.expect("undecided position has a move");
        let child = board.apply_move(best, player);
        let best_value = reference_minimax(&child, player.opponent(), player, 1);
        assert!((best_value - expected).abs() < 1e-12);
    }
}

#[test]
fn test_alpha_beta_matches_minimax_at_depth_three() {
    let config = SearchConfig::fixed_depth(3).unwrap();

    for (board, player) in midgame_positions(35, 3, 14) {
        let expected = reference_minimax(&board, player, player, 3);

        let mut ctx = SearchContext::new();
        let outcome = ctx.search(&board, player, 3, 3);
        assert!(
            (outcome.value - expected).abs() < 1e-12,
            "alpha-beta {} vs minimax {} on\n{}",
            outcome.value,
            expected,
            board
        );

        let best = outcome.best_move.expect("undecided position has a move");
        let child = board.apply_move(best, player);
        assert!((reference_minimax(&child, player.opponent(), player, 2) - expected).abs() < 1e-12);

        let chosen = SearchContext::new().choose_move(&board, player, &config).unwrap();
        assert_eq!(chosen.depth, 3);
        assert!((chosen.value - expected).abs() < 1e-12);
    }
}

fn has_decisive_move(board: &Board, player: Player) -> bool {
    board
        .legal_moves(player)
        .into_iter()
        .any(|mv| winner(&board.apply_move(mv, player), player).is_some())
}

#[test]
fn test_symmetric_position_is_served_from_the_table() {
    let quiet = midgame_positions(33, 20, 8)
        .into_iter()
        .filter(|(board, player)| !has_decisive_move(board, *player))
        .take(5);

    for (board, player) in quiet {
        let mut ctx = SearchContext::new();
        let first = ctx.search(&board, player, 1, 1);
        let before = ctx.table().stats();

        let rotated = ctx.search(&board.rotated(), player, 1, 1);
        let after_rotation = ctx.table().stats();
        assert_eq!(rotated.value, first.value);
        assert_eq!(after_rotation.stores, before.stores, "no new entries for a rotation");
        assert_eq!(
            after_rotation.hits - before.hits,
            board.legal_moves(player).len() as u64
        );

        let inverted = ctx.search(&board.inverted(), player.opponent(), 1, 1);
        assert_eq!(inverted.value, first.value);
        assert_eq!(ctx.table().stats().stores, before.stores);
    }
}

#[test]
fn test_cached_values_do_not_change_the_result() {
    for (board, player) in midgame_positions(34, 4, 10) {
        let mut warm = SearchContext::new();
        let cold_value = warm.search(&board, player, 2, 2).value;
        let warm_value = warm.search(&board, player, 2, 2).value;

        assert!((cold_value - warm_value).abs() < 1e-12);
        assert!(warm.table().stats().hits > 0);
    }
}

#[test]
fn test_deepening_reaches_max_depth_on_quiet_board() {
    let mut ctx = SearchContext::new();
    let chosen = ctx
        .choose_move(&Board::new(), Player::A, &SearchConfig::default())
        .expect("empty board has moves");

    assert_eq!(chosen.depth, 3);
    assert!(Board::new().is_legal(chosen.mv, Player::A));
}

#[test]
fn test_deepening_stops_at_forced_win() {
    let board: Board = "XXXX. ..... O.... O.... O....".parse().unwrap();
    let mut ctx = SearchContext::new();

    let chosen = ctx
        .choose_move(&board, Player::A, &SearchConfig::default())
        .unwrap();
    assert_eq!(chosen.depth, 1);
    assert_eq!(chosen.value, MAX_SCORE);
    assert_eq!(chosen.mv, Move::new(0, 4, Direction::Left));
    assert_eq!(winner(&board.apply_move(chosen.mv, Player::A), Player::A), Some(Player::A));
}

#[test]
fn test_defends_against_immediate_loss() {
    // B threatens to complete column 4 by pushing (4, 4) up; A must break it
    let board: Board = "....O ....O ....O ....O X....".parse().unwrap();
    let mut ctx = SearchContext::new();

    let chosen = ctx
        .choose_move(&board, Player::A, &SearchConfig::fixed_depth(2).unwrap())
        .unwrap();
    let after = board.apply_move(chosen.mv, Player::A);

    for reply in after.legal_moves(Player::B) {
        let next = after.apply_move(reply, Player::B);
        assert_ne!(winner(&next, Player::B), Some(Player::B), "{} loses to {}", chosen.mv, reply);
    }
}

#[test]
fn test_decided_position_has_no_move() {
    let board: Board = "XXXXX ..... O.... O.... .....".parse().unwrap();
    let mut ctx = SearchContext::new();

    assert_eq!(
        ctx.choose_move(&board, Player::B, &SearchConfig::default()),
        Err(SearchError::NoMove)
    );
}
