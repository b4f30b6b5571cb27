//! Application settings loading from config.toml
//!
//! Every field has a default, so a missing or partial file is fine. The file
//! path comes from `HABIT_LEDGER_CONFIG`; without it `./config.toml` is read
//! when present.

use crate::core::accountant::StreakPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "HABIT_LEDGER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` in the environment takes precedence
    pub database_url: Option<String>,
    /// How streaks react to a missed period
    pub streak_policy: StreakPolicy,
    /// Number of entries shown in the leaderboard snapshot
    pub leaderboard_size: u64,
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            streak_policy: StreakPolicy::default(),
            leaderboard_size: 10,
            log_filter: "info".to_string(),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns `Error::Config` if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type or an unknown streak policy
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `HABIT_LEDGER_CONFIG`, else `./config.toml`, else defaults.
///
/// An explicitly named file must exist; the default location is optional.
pub fn load_default_config() -> Result<AppConfig> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return load_config(path);
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        debug!("No config.toml found, using defaults");
        Ok(AppConfig::default())
    }
}
