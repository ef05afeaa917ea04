//! Centralized constants for the agency dashboard
//!
//! File names, directory layout and defaults used across the CLI.

// =============================================================================
// Configuration
// =============================================================================

/// Default config file path
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "AGENCY_LOG";

/// Default data directory
pub const DEFAULT_DATA_DIR: &str = "./data";

// =============================================================================
// Storage Layout
// =============================================================================

/// Sub-directory of the data dir holding uploaded ledgers
pub const LEDGERS_DIR: &str = "ledgers";

/// Upload timestamps and current selection for the file-system store
pub const SETTINGS_FILENAME: &str = "settings.json";

/// SQLite database for the sqlite store
pub const DATABASE_FILENAME: &str = "ledgers.db";

/// Settings key holding the selected ledger
pub const CURRENT_LEDGER_KEY: &str = "current_ledger";

/// Ledger served under the default name when no upload overrides it
pub const BUNDLED_LEDGER: &str = include_str!("../data/default.json");

// =============================================================================
// Report Output Files
// =============================================================================

pub const EARNINGS_SUMMARY_FILENAME: &str = "earnings_summary.csv";
pub const CREATOR_PERFORMANCE_FILENAME: &str = "creator_performance.csv";
pub const TRENDS_FILENAME: &str = "trends.csv";

/// Days covered by the exported trend when no range is given
pub const EXPORT_TREND_DAYS: i64 = 30;
