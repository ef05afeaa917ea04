//! Centralized constants for the earnings engine
//!
//! Values shared by the ledger loader, the aggregation engine and the session.

// =============================================================================
// Fees
// =============================================================================

/// Platform fee rate applied when the ledger metadata does not specify one
pub const DEFAULT_PLATFORM_FEE_RATE: f64 = 0.20;

// =============================================================================
// Ledger Names
// =============================================================================

/// Name of the bundled ledger used when nothing else has been selected
pub const DEFAULT_LEDGER_NAME: &str = "default.json";

/// Placeholder user name reported when no ledger is loaded
pub const EMPTY_USER_NAME: &str = "No Data";

/// Placeholder UTC offset reported when no ledger is loaded
pub const EMPTY_UTC_OFFSET: &str = "-07:00";

// =============================================================================
// Chart Density
// =============================================================================

/// Maximum points for hourly trend charts
pub const MAX_HOUR_POINTS: u32 = 24;

/// Maximum points for daily trend charts
pub const MAX_DAY_POINTS: u32 = 30;

/// Maximum points for weekly trend charts
pub const MAX_WEEK_POINTS: u32 = 12;

/// Maximum points for monthly trend charts
pub const MAX_MONTH_POINTS: u32 = 12;

// =============================================================================
// Standard Windows
// =============================================================================

/// Days before today that open the trailing "This week" window
pub const TRAILING_WEEK_DAYS: i64 = 6;

/// Length of the week-over-week comparison window in days
pub const WEEK_LENGTH_DAYS: i64 = 7;
