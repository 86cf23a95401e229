//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use zt_core::{AggregationConfig, OpenIntervalPolicy};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the session database file.
    pub database_path: PathBuf,

    /// Directory receiving CSV exports.
    pub export_dir: PathBuf,

    /// How the still-open interval is treated when computing matrices.
    #[serde(default)]
    pub open_intervals: OpenIntervalPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("export_dir", &self.export_dir)
            .field("open_intervals", &self.open_intervals)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("zt.db"),
            export_dir: data_dir.join("exports"),
            open_intervals: OpenIntervalPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ZT_*)
        figment = figment.merge(Env::prefixed("ZT_"));

        figment.extract()
    }

    /// Aggregation settings derived from this configuration.
    pub const fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            open_intervals: self.open_intervals,
        }
    }
}

/// Returns the platform-specific config directory for zt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("zt"))
}

/// Returns the platform-specific data directory for zt.
///
/// On Linux: `~/.local/share/zt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("zt"))
}
