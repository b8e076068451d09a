//! Runtime configuration.
//!
//! Values come from (lowest to highest precedence): built-in defaults, an
//! optional config file, then `PHYSIO_LEDGER__*` environment variables
//! (e.g. `PHYSIO_LEDGER__BUSY_TIMEOUT_MS=2000`).

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PHYSIO_LEDGER";

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite database path
    pub database_path: String,
    /// How long a store call waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Default size of the top-due-patients list
    pub top_due_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: "physio-ledger.db".into(),
            busy_timeout_ms: 5_000,
            top_due_limit: 10,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: LedgerConfig = config.try_deserialize()?;
        tracing::debug!(
            database_path = %loaded.database_path,
            busy_timeout_ms = loaded.busy_timeout_ms,
            "loaded ledger configuration"
        );
        Ok(loaded)
    }

    /// Busy timeout as a `Duration`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
