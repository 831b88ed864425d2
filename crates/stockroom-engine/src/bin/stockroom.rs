//! # Stockroom Admin Tool
//!
//! Small operator commands against an engine database.
//!
//! ## Usage
//! ```bash
//! # Create or upgrade the schema
//! cargo run -p stockroom-engine --bin stockroom -- migrate
//!
//! # Print a committed transaction as JSON
//! cargo run -p stockroom-engine --bin stockroom -- show REN-20260115-0001
//!
//! # Print the stock level of one item at one location
//! cargo run -p stockroom-engine --bin stockroom -- stock drill-01 loc-main
//!
//! # Use another config file or database
//! cargo run -p stockroom-engine --bin stockroom -- --config ./engine.toml --db ./dev.db stock drill-01 loc-main
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use stockroom_db::Database;
use stockroom_engine::{telemetry, EngineConfig, TransactionProcessor};
use tracing::{error, info};

enum Command {
    Migrate,
    Show { number: String },
    Stock { item_id: String, location_id: String },
}

struct Cli {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    command: Command,
}

fn print_help() {
    println!("Usage: stockroom [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  migrate                      Apply pending migrations and print status");
    println!("  show <transaction-number>    Print a committed transaction as JSON");
    println!("  stock <item-id> <location>   Print a stock level as JSON");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Config file (default: platform config dir/engine.toml)");
    println!("  -d, --db <PATH>       Database file, overrides the config");
    println!("  -h, --help            Show this help message");
}

/// `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<Cli>, String> {
    let mut config_path = None;
    let mut db_path = None;
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let value = args.get(i + 1).ok_or("--config needs a path")?;
                config_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--db" | "-d" => {
                let value = args.get(i + 1).ok_or("--db needs a path")?;
                db_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => return Err(format!("unknown option {}", other)),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [cmd] if cmd == "migrate" => Command::Migrate,
        [cmd, number] if cmd == "show" => Command::Show {
            number: number.clone(),
        },
        [cmd, item, location] if cmd == "stock" => Command::Stock {
            item_id: item.clone(),
            location_id: location.clone(),
        },
        [] => return Err("missing command".to_string()),
        _ => return Err(format!("unrecognised command: {}", positional.join(" "))),
    };

    Ok(Some(Cli {
        config_path,
        db_path,
        command,
    }))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {}", msg);
            print_help();
            return ExitCode::from(2);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EngineConfig::load(cli.config_path)?;
    if let Some(path) = cli.db_path {
        config.database.path = Some(path);
    }

    telemetry::init_tracing(&config.logging.filter);

    match cli.command {
        Command::Migrate => {
            let db = Database::new(config.to_db_config()?.run_migrations(false)).await?;
            db.run_migrations().await?;
            let status = db.migration_status().await?;
            info!(total = status.total, applied = status.applied, "Migration status");
            println!("migrations: {}/{} applied", status.applied, status.total);
            if !status.is_current() {
                return Err(format!("migrations still pending: {:?}", status.pending).into());
            }
            if !db.health_check().await {
                return Err("database did not answer a health check".into());
            }
            db.close().await;
        }
        Command::Show { number } => {
            let processor = TransactionProcessor::connect(&config).await?;
            let transaction = processor.get_by_number(&number).await?;
            println!("{}", serde_json::to_string_pretty(&transaction)?);
            processor.database().close().await;
        }
        Command::Stock {
            item_id,
            location_id,
        } => {
            let processor = TransactionProcessor::connect(&config).await?;
            let level = processor.stock_level(&item_id, &location_id).await?;
            println!("{}", serde_json::to_string_pretty(&level)?);
            processor.database().close().await;
        }
    }

    Ok(())
}
