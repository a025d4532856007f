pub mod check;
pub mod migrate;
pub mod sessions;

pub type CommandResult = Result<std::process::ExitCode, Box<dyn std::error::Error>>;
