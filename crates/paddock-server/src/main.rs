//! Paddock server binary
//!
//! Serves season statistics over HTTP.

use paddock_server::{config::ServerConfig, start_server, ServerError};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ServerConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using defaults");
        eprintln!("Usage: paddock-server --config <path-to-config.toml>");
        eprintln!();
        let mut config = ServerConfig::default();
        config.apply_env_overrides();
        config
    };

    start_server(config).await
}

fn print_help() {
    println!("Paddock Server - Formula 1 season statistics");
    println!();
    println!("USAGE:");
    println!("    paddock-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    PADDOCK_SEASON_CACHE_DIR      Directory for persisted seasons");
    println!("    PADDOCK_PRIMARY_BASE_URL      Session-level results API");
    println!("    PADDOCK_SECONDARY_BASE_URL    Historical results API");
    println!("    RUST_LOG                      Log filter (default: info)");
    println!();
}
