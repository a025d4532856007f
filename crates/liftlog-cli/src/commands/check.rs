//! Check command
//!
//! Usage: liftlog check --user <ID> --shape <SHAPE> --resource <ID>
//!
//! Exits 0 when access is granted, 2 when it is denied and 1 on any other
//! error.

use std::process::ExitCode;

use clap::Args;
use liftlog_core::errors::ExErrorKind;
use liftlog_core::{AccessControlService, ChainShape, UserId};
use liftlog_store::SqliteBackend;

use super::CommandResult;
use crate::settings::Settings;

pub const EXIT_DENIED: u8 = 2;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Principal user id
    #[arg(long)]
    pub user: UserId,

    /// Resource kind: workout-routine, exercise-routine, workout-session,
    /// exercise or set-entry
    #[arg(long)]
    pub shape: ChainShape,

    /// Resource id, passed through as given
    #[arg(long)]
    pub resource: String,
}

pub fn execute(settings: &Settings, args: CheckArgs) -> CommandResult {
    let backend = SqliteBackend::open(&settings.database_path)?;
    let acs = AccessControlService::new(backend);

    match acs.can_access(args.shape, args.user, &args.resource) {
        Ok(()) => {
            println!("granted");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.kind() == ExErrorKind::AccessDenied => {
            println!("denied");
            Ok(ExitCode::from(EXIT_DENIED))
        }
        Err(e) => Err(e.into()),
    }
}
