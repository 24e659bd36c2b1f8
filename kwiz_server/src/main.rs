// CLI entry point for the kwiz trivia server.
//
// Loads the question file, starts the server, and blocks until the game
// finishes with nobody connected. See `server.rs` for the networking
// architecture and `rounds.rs` for the game flow.
//
// Usage:
//   kwiz-server [OPTIONS]
//     --port <PORT>      Listen port (default: 12345)
//     --config <PATH>    Question file (default: config.json)

use std::path::PathBuf;
use std::time::Duration;

use kwiz_server::bank::AnswerBank;
use kwiz_server::config::GameConfig;
use kwiz_server::rounds::GameRules;
use kwiz_server::server::{ServerConfig, start_server};

struct Args {
    port: u16,
    config: PathBuf,
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let game_config = match GameConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {}: {e}", args.config.display());
            std::process::exit(1);
        }
    };

    let question_count = game_config.questions.len();
    let config = ServerConfig {
        port: args.port,
        rules: GameRules {
            time_limit: Duration::from_secs(u64::from(game_config.time_limit_secs)),
            max_rounds: game_config.max_rounds,
            ..GameRules::default()
        },
        bank: AnswerBank::from_config(&game_config),
        ..ServerConfig::default()
    };

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Server listening on {addr} ({question_count} questions loaded).");
    println!("Waiting for players...");

    // The server stops on its own once a finished game's ranking window
    // expires with nobody connected.
    handle.wait();
    println!("Game complete, shutting down.");
}

/// Parse command-line arguments into an `Args`. Uses simple
/// `std::env::args()` matching, no clap dependency.
fn parse_args() -> Args {
    let mut parsed = Args {
        port: ServerConfig::default().port,
        config: PathBuf::from("config.json"),
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                parsed.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                parsed.config = args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_usage() {
    println!("Usage: kwiz-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>      Listen port (default: 12345)");
    println!("  --config <PATH>    Question file (default: config.json)");
    println!("  --help, -h         Show this help");
}
