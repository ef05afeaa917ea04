//! Configuration for the agency dashboard

use anyhow::{Context, Result};
use clap::ValueEnum;
use earnings_engine::LedgerOptions;
use earnings_engine::constants::DEFAULT_LEDGER_NAME;
use earnings_engine::ledger::parse_utc_offset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

// =============================================================================
// File-based Configuration (dashboard.toml)
// =============================================================================

/// Configuration loaded from dashboard.toml; every section is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Where ledgers are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON files under <data_dir>/ledgers
    #[default]
    Fs,
    /// SQLite database at <data_dir>/ledgers.db
    Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    /// Ledger opened when nothing has been selected
    #[serde(default = "default_ledger_name")]
    pub default_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// Reporting offset such as "-07:00"; defaults to the ledger's own offset
    #[serde(default)]
    pub utc_offset: Option<String>,
    /// Treat an explicit `platformFee: 0` as unset
    #[serde(default)]
    pub zero_fee_means_default: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_DATA_DIR)
}

fn default_ledger_name() -> String {
    DEFAULT_LEDGER_NAME.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_name: default_ledger_name(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| {
            format!(
                "Failed to parse {}. Check for:\n\
                 - Unknown sections or keys (only [storage], [ledger] and [engine] are read)\n\
                 - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
                 - backend other than \"fs\" or \"sqlite\"",
                path.display()
            )
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Like [`FileConfig::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Command-line values that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub data_dir: Option<PathBuf>,
    pub utc_offset: Option<String>,
}

/// Resolved settings
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub default_ledger: String,
    pub ledger_options: LedgerOptions,
}

impl Config {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let utc_offset = match overrides.utc_offset.or(file.engine.utc_offset) {
            Some(raw) => Some(
                parse_utc_offset(&raw)
                    .with_context(|| format!("Invalid utc_offset '{}', expected e.g. \"-07:00\"", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            backend: overrides.backend.unwrap_or(file.storage.backend),
            data_dir: overrides.data_dir.unwrap_or(file.storage.data_dir),
            default_ledger: file.ledger.default_name,
            ledger_options: LedgerOptions {
                utc_offset,
                zero_fee_means_default: file.engine.zero_fee_means_default,
            },
        })
    }
}
