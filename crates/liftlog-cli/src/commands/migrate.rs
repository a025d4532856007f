//! Migrate command
//!
//! Usage: liftlog migrate [--db <FILE>]

use std::process::ExitCode;

use liftlog_store::SqliteBackend;

use super::CommandResult;
use crate::settings::Settings;

/// Opening the backend applies any pending migrations
pub fn execute(settings: &Settings) -> CommandResult {
    SqliteBackend::open(&settings.database_path)?;
    tracing::info!(path = %settings.database_path.display(), "schema up to date");
    println!("✓ Database ready at {}", settings.database_path.display());
    Ok(ExitCode::SUCCESS)
}
