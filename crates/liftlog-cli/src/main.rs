//! liftlog CLI
//!
//! Operator tooling over the liftlog store

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use liftlog_core::logging_facility;

mod commands;
mod settings;

use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "liftlog")]
#[command(about = "liftlog - ownership-checked workout log", long_about = None)]
struct Cli {
    /// SQLite database file (overrides LIFTLOG_DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Ask whether a user owns a resource
    Check(commands::check::CheckArgs),
    /// Print a user's sessions with their exercises as JSON
    Sessions(commands::sessions::SessionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Some(db) = cli.db {
        settings.database_path = db;
    }
    logging_facility::init(settings.profile());

    let result = match cli.command {
        Commands::Migrate => commands::migrate::execute(&settings),
        Commands::Check(args) => commands::check::execute(&settings, args),
        Commands::Sessions(args) => commands::sessions::execute(&settings, args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
