// Standalone replay tool for analyzing Quixo move logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --all                      Replay all turns
//   --game <g> --turns <t1,t2> Replay specific turns of one game
//   --validate                 Check that every logged move was legal
//   --verbose                  Show detailed output for each turn
//   --config <path>            Path to Quixo.toml (default: Quixo.toml)

use std::env;
use std::process;

use quixo_engine::config::Config;
use quixo_engine::replay::ReplayEngine;

fn print_usage() {
    eprintln!("Quixo Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --all                   Replay all turns in the log");
    eprintln!("  --game <G>              Game to pick turns from (default: 0)");
    eprintln!("  --turns <T1,T2,...>     Replay specific turns (comma-separated)");
    eprintln!("  --validate              Check legality of every logged move");
    eprintln!("  --verbose               Show detailed output for each turn");
    eprintln!("  --config <path>         Path to Quixo.toml (default: Quixo.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Replay all turns");
    eprintln!("  replay quixo_moves.jsonl --all");
    eprintln!();
    eprintln!("  # Replay specific turns of game 3");
    eprintln!("  replay quixo_moves.jsonl --game 3 --turns 5,10,15");
    eprintln!();
    eprintln!("  # Validate a log");
    eprintln!("  replay quixo_moves.jsonl --validate");
}

fn parse_turns(s: &str) -> Result<Vec<u32>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<u32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

enum Mode {
    All,
    Turns(String),
    Validate,
}

fn main() {
    // Initialize logger
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let log_file = &args[1];
    let mut config_path = "Quixo.toml".to_string();
    let mut verbose = false;
    let mut game = 0u32;
    let mut mode = None;

    // Parse arguments
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => {
                mode = Some(Mode::All);
            }
            "--turns" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --turns requires an argument");
                    process::exit(1);
                }
                mode = Some(Mode::Turns(args[i + 1].clone()));
                i += 1;
            }
            "--game" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --game requires an argument");
                    process::exit(1);
                }
                game = args[i + 1].parse().unwrap_or_else(|e| {
                    eprintln!("Error: Invalid game number '{}': {}", args[i + 1], e);
                    process::exit(1);
                });
                i += 1;
            }
            "--validate" => {
                mode = Some(Mode::Validate);
            }
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires an argument");
                    process::exit(1);
                }
                config_path = args[i + 1].clone();
                i += 1;
            }
            "--verbose" => {
                verbose = true;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(mode) = mode else {
        eprintln!("Error: Must specify --all, --turns, or --validate");
        print_usage();
        process::exit(1);
    };

    // Load configuration
    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let engine = ReplayEngine::new(config, verbose);

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    println!("Loaded {} log entries\n", entries.len());

    match mode {
        Mode::All => {
            println!("Replaying all {} turns...\n", entries.len());
            let results = engine.replay_all(&entries);
            engine.print_report(&results);
        }
        Mode::Turns(turn_arg) => {
            let turns = match parse_turns(&turn_arg) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error parsing turns: {}", e);
                    process::exit(1);
                }
            };

            println!("Replaying {} turn(s) of game {}...\n", turns.len(), game);
            match engine.replay_turns(&entries, game, &turns) {
                Ok(results) => {
                    engine.print_report(&results);
                }
                Err(e) => {
                    eprintln!("Error during replay: {}", e);
                    process::exit(1);
                }
            }
        }
        Mode::Validate => {
            println!("Validating {} logged move(s)...\n", entries.len());
            match engine.validate_legality(&entries) {
                Ok(()) => {
                    println!("✓ All logged moves are legal!");
                }
                Err(e) => {
                    eprintln!("✗ Validation failed: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
