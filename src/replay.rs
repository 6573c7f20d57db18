// Replay module for analyzing logged games and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL move logs
// 2. Re-run the search on logged positions
// 3. Compare logged vs replayed moves
// 4. Check that every logged move was legal

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::match_logger::LogEntry;
use crate::search::{ChosenMove, SearchContext};
use crate::types::{Board, Move, Player};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub game: u32,
    pub turn: u32,
    pub player: Player,
    pub original_move: Move,
    pub replayed_move: Move,
    pub matches: bool,
    pub original_value: Option<f64>,
    pub replayed_value: f64,
    pub search_depth: u8,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing move logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Runs the configured search on one position with an empty table
    /// Returns the decision and the time it took
    pub fn replay_turn(&self, board: &Board, player: Player) -> Result<(ChosenMove, u128), String> {
        let mut context = SearchContext::with_table_capacity(self.config.table.soft_capacity);

        let start_time = Instant::now();
        let chosen = context
            .choose_move(board, player, &self.config.search)
            .map_err(|e| e.to_string())?;

        Ok((chosen, start_time.elapsed().as_millis()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying game {} turn {}...", entry.game, entry.turn);
        }

        let (chosen, computation_time) = self.replay_turn(&entry.board, entry.player)?;
        let matches = chosen.mv == entry.chosen_move;

        let result = ReplayResult {
            game: entry.game,
            turn: entry.turn,
            player: entry.player,
            original_move: entry.chosen_move,
            replayed_move: chosen.mv,
            matches,
            original_value: entry.value,
            replayed_value: chosen.value,
            search_depth: chosen.depth,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if matches {
                info!(
                    "Game {} turn {}: ✓ MATCH - {} (value: {:.3}, depth: {}, time: {}ms)",
                    entry.game, entry.turn, chosen.mv, chosen.value, chosen.depth, computation_time
                );
            } else {
                warn!(
                    "Game {} turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (value: {:.3}, depth: {}, time: {}ms)",
                    entry.game,
                    entry.turn,
                    entry.chosen_move,
                    chosen.mv,
                    chosen.value,
                    chosen.depth,
                    computation_time
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries, skipping those the search cannot answer
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay game {} turn {}: {}", entry.game, entry.turn, e);
                }
            }
        }

        results
    }

    /// Replays specific turns of one game
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        game: u32,
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.game == game && e.turn == *turn_num)
                .ok_or_else(|| format!("Game {} turn {} not found in log file", game, turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay game {} turn {}: {}", game, turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Checks every logged move against the logged position
    ///
    /// Also checks that consecutive turns of a game chain together: the board
    /// logged for turn `t + 1` must be the result of the move logged for `t`.
    /// Entries of parallel games may be interleaved in any order.
    pub fn validate_legality(&self, entries: &[LogEntry]) -> Result<(), String> {
        let mut ordered: Vec<&LogEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| (entry.game, entry.turn));

        let mut previous: Option<&LogEntry> = None;

        for entry in ordered {
            let next = entry
                .board
                .checked_move(entry.chosen_move, entry.player)
                .map_err(|e| format!("Game {} turn {}: {}", entry.game, entry.turn, e))?;

            if let Some(prev) = previous {
                if prev.game == entry.game && prev.turn + 1 == entry.turn {
                    let expected = prev.board.apply_move(prev.chosen_move, prev.player);
                    if expected != entry.board {
                        return Err(format!(
                            "Game {} turn {}: logged board does not follow from turn {}",
                            entry.game, entry.turn, prev.turn
                        ));
                    }
                    if prev.player == entry.player {
                        return Err(format!(
                            "Game {} turn {}: player {} moved twice in a row",
                            entry.game, entry.turn, entry.player
                        ));
                    }
                }
            }

            if self.verbose {
                info!(
                    "Game {} turn {}: {} by {} is legal\n{}",
                    entry.game, entry.turn, entry.chosen_move, entry.player, next
                );
            }
            previous = Some(entry);
        }

        Ok(())
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            let avg_depth: f64 =
                results.iter().map(|r| r.search_depth as f64).sum::<f64>() / results.len() as f64;

            println!("Average Search Depth:       {:.1}", avg_depth);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                let logged = result
                    .original_value
                    .map(|v| format!("{:.3}", v))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "Game {} turn {} ({}): {} → {} (logged: {}, replayed: {:.3}, depth: {}, time: {}ms)",
                    result.game,
                    result.turn,
                    result.player,
                    result.original_move,
                    result.replayed_move,
                    logged,
                    result.replayed_value,
                    result.search_depth,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }
}
