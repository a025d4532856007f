//! Process settings
//!
//! Defaults, then an optional `.env` file, then `LIFTLOG_*` environment
//! variables. Command-line flags are applied on top by `main`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use liftlog_core::logging_facility::Profile;
use liftlog_core::LoaderConfig;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "LIFTLOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: PathBuf,
    pub log_profile: String,
    /// Batch window in milliseconds; 0 leaves only explicit dispatch
    pub loader_wait_ms: u64,
    pub loader_max_batch: usize,
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(".liftlog/store.db"),
            log_profile: "development".to_string(),
            loader_wait_ms: 2,
            loader_max_batch: 100,
            environment: "dev".to_string(),
        }
    }
}

impl Settings {
    /// Load settings for this process
    ///
    /// `.env` is read first unless `LIFTLOG_ENVIRONMENT` is `prod`; a
    /// missing or unreadable file is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when an override cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let is_prod = std::env::var(format!("{ENV_PREFIX}_ENVIRONMENT"))
            .map(|env| env.eq_ignore_ascii_case("prod"))
            .unwrap_or(false);
        if !is_prod {
            let _ = dotenvy::dotenv();
        }
        Self::from_env()
    }

    /// Defaults overlaid with `LIFTLOG_*` variables, no `.env` handling
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when an override cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn profile(&self) -> Profile {
        self.log_profile.parse().unwrap_or(Profile::Development)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        let config = match self.loader_wait_ms {
            0 => LoaderConfig::manual(),
            ms => LoaderConfig::default().with_wait(Duration::from_millis(ms)),
        };
        config.with_max_batch_size(self.loader_max_batch)
    }
}
