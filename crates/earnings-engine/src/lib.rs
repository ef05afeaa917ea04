//! Earnings analytics over a creator-agency transaction ledger
//!
//! A [`Ledger`] is validated once at load time. An [`AggregationEngine`]
//! built over it answers period, channel, creator and fan queries through
//! the [`LedgerAnalytics`] trait, and a [`Session`] holds whichever ledger
//! is currently active.

pub mod constants;
pub mod creators;
pub mod engine;
pub mod error;
pub mod fans;
pub mod ledger;
pub mod period;
pub mod session;
pub mod store;
pub mod trends;

pub use creators::CreatorPerformanceRow;
pub use engine::{
    AggregationEngine, EarningsBreakdown, EarningsData, EarningsTotals, LedgerAnalytics, PeriodEarnings, Statistics,
    growth_percentage,
};
pub use error::LedgerError;
pub use fans::SubscriptionSummary;
pub use ledger::{Channel, Ledger, LedgerOptions};
pub use period::{Clock, FixedClock, Granularity, Period, StandardPeriod, SystemClock};
pub use session::{Session, Snapshot, empty_snapshot};
pub use store::{LedgerStore, MemoryLedgerStore};
pub use trends::{SalesPoint, TrendPoint};
