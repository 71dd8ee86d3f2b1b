//! Mess Ledger Backend - API Server
//!
//! Run modes:
//!   cargo run                       - Start REST API (default)
//!   cargo run -- serve --port 4000  - Start REST API on another port
//!   cargo run -- help               - Show usage

use mess_ledger::common::logging::init_from_config;
use mess_ledger::{api, AppConfig, ConfigError, LedgerError, Stores};
use std::env;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    let result = match command {
        "serve" => run_api_server(args.get(2..).unwrap_or_default()).await,
        "--port" => run_api_server(&args[1..]).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Mess Ledger Backend");
    println!();
    println!("Usage:");
    println!("  mess-ledger [serve] [--port <port>]   Start REST API server (default: 3001)");
    println!("  mess-ledger help                      Show this message");
    println!();
    println!("Environment Variables:");
    println!("  MESS_DATABASE_URL   'memory' or SQLite file path (required)");
    println!("  MESS_JWT_SECRET     Token signing secret, 16+ bytes (required)");
    println!("  MESS_API_PORT       REST API port (default: 3001)");
    println!("  MESS_BIND_ADDR      Listen address (default: 0.0.0.0)");
    println!("  MESS_LOG_LEVEL      trace|debug|info|warn|error (default: info)");
    println!("  MESS_LOG_FORMAT     json|pretty (default: pretty)");
    println!("  MESS_BCRYPT_COST    bcrypt cost factor (default: 10)");
    println!("  MESS_STATIC_DIR     Frontend bundle served for unmatched paths");
    println!("  MESS_LOGIN_LOG      JSON file recording login timestamps");
}

/// Start REST API server
async fn run_api_server(args: &[String]) -> Result<(), LedgerError> {
    dotenv::dotenv().ok();

    let mut config = AppConfig::from_env()?;

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port = args[i + 1].parse().map_err(|_| {
                    ConfigError::InvalidValue("--port".into(), format!("not a port: {}", args[i + 1]))
                })?;
                i += 2;
            }
            _ => i += 1,
        }
    }

    init_from_config(&config)?;
    config.print_summary();

    let stores = Stores::open(&config.database)?;
    tracing::info!(target: "mess_ledger::api", "stores opened");

    api::start_server(&config, stores).await?;
    Ok(())
}
