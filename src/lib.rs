// Library exports for the Quixo engine
// This allows the match runner, the replay tool and the tests to share the core search logic

pub mod agent;
pub mod canonical;
pub mod config;
pub mod eval;
pub mod game;
pub mod match_logger;
pub mod replay;
pub mod search;
pub mod simple_profiler;
pub mod transposition;
pub mod types;

pub use agent::{Agent, ExploringAgent, InputAgent, RandomAgent, SearchAgent};
pub use config::Config;
pub use game::{Game, GameRecord, MatchSummary, Outcome};
pub use search::{ChosenMove, SearchConfig, SearchContext, SearchError};
pub use types::{Board, Cell, Direction, Move, Player};
