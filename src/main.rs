// Quixo match runner
//
// Usage:
//   cargo run --release -- [options]
//
// Options:
//   --config <path>   Path to Quixo.toml (default: Quixo.toml)
//   --games <n>       Number of games against the opponent
//   --seed <n>        Base seed for the random agent and exploration
//   --exploration <p> Chance that a search agent plays a random legal move
//   --sequential      Play games one after another sharing a single table
//   --human <A|B>     Play one game from standard input as the given side

use log::info;
use rayon::prelude::*;
use std::env;
use std::io;
use std::process;
use std::time::Instant;

use quixo_engine::config::Config;
use quixo_engine::match_logger::MatchLogger;
use quixo_engine::simple_profiler;
use quixo_engine::{
    Agent, ExploringAgent, Game, GameRecord, InputAgent, MatchSummary, Outcome, Player,
    RandomAgent, SearchAgent, SearchContext,
};

/// Keeps the engine's exploration stream apart from the opponent's seeds
const EXPLORATION_SEED_OFFSET: u64 = 1 << 32;

fn print_usage() {
    eprintln!("Quixo Engine");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  quixo [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --config <path>   Path to Quixo.toml (default: Quixo.toml)");
    eprintln!("  --games <n>       Number of games against the opponent");
    eprintln!("  --seed <n>        Base seed for the random agent and exploration");
    eprintln!("  --exploration <p> Chance that a search agent plays a random legal move");
    eprintln!("  --sequential      Play games one after another sharing a single table");
    eprintln!("  --human <A|B>     Play one game from standard input as the given side");
    eprintln!("  --help            Show this help message");
}

fn next_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().unwrap_or_else(|e| {
        eprintln!("Error: invalid value '{}' for {}: {}", value, flag, e);
        process::exit(1);
    })
}

/// Plays game `index` of a batch; the search agent takes A on even games and B on odd ones
///
/// `contexts` holds the engine's table and, when `[matches.opponent]` is set, the
/// opposing engine's table.
fn play_batch_game(
    index: u32,
    config: &Config,
    contexts: &mut (SearchContext, SearchContext),
    logger: &MatchLogger,
) -> (GameRecord, Player) {
    let search_side = if index % 2 == 0 { Player::A } else { Player::B };
    let game_seed = config.matches.seed.wrapping_add(index as u64);
    let rate = config.matches.exploration;
    let (engine_context, opponent_context) = contexts;

    let mut search_agent = ExploringAgent::new(
        SearchAgent::new(engine_context, config.search.clone()),
        rate,
        game_seed.wrapping_add(EXPLORATION_SEED_OFFSET),
    );
    let mut opponent: Box<dyn Agent + '_> = match &config.matches.opponent {
        Some(search) => Box::new(ExploringAgent::new(
            SearchAgent::new(opponent_context, search.clone()),
            rate,
            game_seed,
        )),
        None => Box::new(RandomAgent::new(game_seed)),
    };

    let (first, second): (&mut dyn Agent, &mut dyn Agent) = match search_side {
        Player::A => (&mut search_agent, opponent.as_mut()),
        Player::B => (opponent.as_mut(), &mut search_agent),
    };

    let record = Game::new(config.matches.max_turns).play_with(first, second, |event| {
        logger.log_move(index, event)
    });

    info!(
        "Game {}: search as {} -> {:?} after {} plies",
        index, search_side, record.outcome, record.plies
    );
    (record, search_side)
}

fn run_batch(config: &Config, logger: &MatchLogger) -> MatchSummary {
    let games = config.matches.games;
    let capacity = config.table.soft_capacity;

    if config.matches.parallel {
        info!("Playing {} games on {} threads", games, rayon::current_num_threads());
        (0..games)
            .into_par_iter()
            .map_init(
                || {
                    (
                        SearchContext::with_table_capacity(capacity),
                        SearchContext::with_table_capacity(capacity),
                    )
                },
                |contexts, index| {
                    let (record, side) = play_batch_game(index, config, contexts, logger);
                    let mut summary = MatchSummary::default();
                    summary.record(record.outcome, side);
                    summary
                },
            )
            .reduce(MatchSummary::default, MatchSummary::merge)
    } else {
        info!("Playing {} games sequentially", games);
        let mut contexts = (
            SearchContext::with_table_capacity(capacity),
            SearchContext::with_table_capacity(capacity),
        );
        let mut summary = MatchSummary::default();
        for index in 0..games {
            let (record, side) = play_batch_game(index, config, &mut contexts, logger);
            summary.record(record.outcome, side);
        }
        let context = &contexts.0;
        let stats = context.table().stats();
        info!(
            "Table: {} entries, {} probes, {} hits, {} evictions",
            context.table().len(),
            stats.probes,
            stats.hits,
            stats.evictions
        );
        summary
    }
}

fn run_human(config: &Config, human_side: Player, logger: &MatchLogger) {
    let mut context = SearchContext::with_table_capacity(config.table.soft_capacity);
    let mut search_agent = SearchAgent::new(&mut context, config.search.clone());
    let stdin = io::stdin();
    let mut human = InputAgent::new(stdin.lock(), io::stdout());

    let (first, second): (&mut dyn Agent, &mut dyn Agent) = match human_side {
        Player::A => (&mut human, &mut search_agent),
        Player::B => (&mut search_agent, &mut human),
    };

    let record = Game::new(config.matches.max_turns)
        .play_with(first, second, |event| logger.log_move(0, event));

    println!("{}", record.board);
    match record.outcome {
        Outcome::Winner(player) if player == human_side => println!("You win!"),
        Outcome::Winner(_) => println!("The engine wins."),
        Outcome::Forfeit(player) if player == human_side => println!("You resigned."),
        Outcome::Forfeit(_) => println!("The engine resigned."),
        Outcome::Draw => println!("Draw after {} plies.", record.plies),
    }
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config_path = None;
    let mut games = None;
    let mut seed = None;
    let mut exploration = None;
    let mut sequential = false;
    let mut human = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(next_value(&args, i, "--config").to_string());
                i += 1;
            }
            "--games" => {
                games = Some(parse_number::<u32>(next_value(&args, i, "--games"), "--games"));
                i += 1;
            }
            "--seed" => {
                seed = Some(parse_number::<u64>(next_value(&args, i, "--seed"), "--seed"));
                i += 1;
            }
            "--exploration" => {
                let rate = parse_number::<f64>(next_value(&args, i, "--exploration"), "--exploration");
                if !(0.0..=1.0).contains(&rate) {
                    eprintln!("Error: --exploration expects a value in 0..=1, got {}", rate);
                    process::exit(1);
                }
                exploration = Some(rate);
                i += 1;
            }
            "--sequential" => {
                sequential = true;
            }
            "--human" => {
                human = match next_value(&args, i, "--human").to_uppercase().as_str() {
                    "A" => Some(Player::A),
                    "B" => Some(Player::B),
                    other => {
                        eprintln!("Error: --human expects A or B, got '{}'", other);
                        process::exit(1);
                    }
                };
                i += 1;
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Error: Unknown option '{}'", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            eprintln!("Error: Could not load config from '{}': {}", path, e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };
    if let Some(games) = games {
        config.matches.games = games;
    }
    if let Some(seed) = seed {
        config.matches.seed = seed;
    }
    if let Some(rate) = exploration {
        config.matches.exploration = rate;
    }
    if sequential {
        config.matches.parallel = false;
    }

    info!(
        "Starting Quixo engine (depths {}..={}, thresholds {:?})",
        config.search.min_depth(),
        config.search.max_depth(),
        config.search.thresholds()
    );
    match &config.matches.opponent {
        Some(opponent) => info!(
            "Opponent: engine (depths {}..={}, thresholds {:?}), exploration {}",
            opponent.min_depth(),
            opponent.max_depth(),
            opponent.thresholds(),
            config.matches.exploration
        ),
        None => info!("Opponent: random agent, exploration {}", config.matches.exploration),
    }

    let logger = MatchLogger::new(config.debug.enabled, &config.debug.log_file_path);

    if let Some(side) = human {
        run_human(&config, side, &logger);
        return;
    }

    let start_time = Instant::now();
    let summary = run_batch(&config, &logger);
    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    logger.flush();

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                    MATCH REPORT");
    println!("═══════════════════════════════════════════════════════════");
    println!("Games:          {}", summary.games());
    println!("Wins:           {} ({:.1}%)", summary.wins, summary.win_rate());
    println!("Losses:         {}", summary.losses);
    println!("Draws:          {}", summary.draws);
    println!("Time:           {}ms", elapsed_ms);
    println!("═══════════════════════════════════════════════════════════\n");

    simple_profiler::print_report(elapsed_ms);
}
