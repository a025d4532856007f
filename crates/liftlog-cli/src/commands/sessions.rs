//! Sessions command
//!
//! Usage: liftlog sessions --user <ID> --email <EMAIL>

use std::process::ExitCode;

use clap::Args;
use liftlog_core::{Principal, UserId};
use liftlog_core_types::RequestContext;
use liftlog_engine::Resolver;
use liftlog_store::SqliteBackend;

use super::CommandResult;
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Principal user id
    #[arg(long)]
    pub user: UserId,

    /// Principal email
    #[arg(long)]
    pub email: String,
}

pub fn execute(settings: &Settings, args: SessionsArgs) -> CommandResult {
    let backend = SqliteBackend::open(&settings.database_path)?;
    let resolver = Resolver::new(backend, settings.loader_config());
    let scope = resolver.scope(Principal::new(args.user, args.email), RequestContext::new());

    let runtime = tokio::runtime::Runtime::new()?;
    let sessions = runtime.block_on(resolver.workout_sessions_with_exercises(&scope))?;

    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(ExitCode::SUCCESS)
}
