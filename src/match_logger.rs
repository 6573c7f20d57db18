// Move logging for batch matches
//
// Every accepted move is written as one JSON line together with the position it
// was played from. Games running on different rayon workers share one logger,
// so the writer sits behind a mutex.

use log::{error, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use crate::game::MoveEvent;
use crate::types::{Board, Move, Player};

/// Represents a single line of the move log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub game: u32,
    pub turn: u32,
    pub player: Player,
    /// Position before the move
    pub board: Board,
    pub chosen_move: Move,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,
    pub timestamp: String,
}

impl LogEntry {
    pub fn from_event(game: u32, event: &MoveEvent<'_>) -> Self {
        LogEntry {
            game,
            turn: event.ply,
            player: event.player,
            board: *event.board,
            chosen_move: event.mv,
            value: event.decision.map(|d| d.value),
            depth: event.decision.map(|d| d.depth),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Shared move logger; a disabled logger ignores every call
pub struct MatchLogger {
    writer: Mutex<Option<BufWriter<File>>>,
}

impl MatchLogger {
    /// Creates a new move logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return MatchLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                info!("Move logging enabled: {}", log_file_path);
                MatchLogger {
                    writer: Mutex::new(Some(BufWriter::new(file))),
                }
            }
            Err(e) => {
                error!("Failed to create move log file '{}': {}", log_file_path, e);
                MatchLogger::disabled()
            }
        }
    }

    /// Creates a disabled logger (no-op)
    pub fn disabled() -> Self {
        MatchLogger {
            writer: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.lock().is_some()
    }

    /// Appends one move of game `game`
    pub fn log_move(&self, game: u32, event: &MoveEvent<'_>) {
        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return;
        };

        let entry = LogEntry::from_event(game, event);
        match serde_json::to_string(&entry) {
            Ok(json_line) => {
                if let Err(e) = writeln!(writer, "{}", json_line) {
                    error!("Failed to write move log entry: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize move log entry: {}", e);
            }
        }
    }

    /// Flushes buffered entries to disk
    pub fn flush(&self) {
        if let Some(writer) = self.writer.lock().as_mut() {
            if let Err(e) = writer.flush() {
                error!("Failed to flush move log: {}", e);
            }
        }
    }
}

impl Drop for MatchLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
