//! Session facade: the active ledger and its precomputed overview
//!
//! A replacement ledger gets its engine and snapshot built completely
//! before it is published, so queries never see a half-switched state.
//! With nothing loaded every query answers with the zero shape.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants;
use crate::creators::CreatorPerformanceRow;
use crate::engine::{AggregationEngine, EarningsData, EarningsTotals, LedgerAnalytics, Statistics, empty_earnings_data};
use crate::error::LedgerError;
use crate::fans::SubscriptionSummary;
use crate::ledger::{Channel, Creator, DataRange, Fan, Ledger, LedgerOptions, NotificationSummary};
use crate::period::{Clock, Granularity, Period};
use crate::store::LedgerStore;
use crate::trends::{SalesPoint, TrendPoint};

// =============================================================================
// Snapshot
// =============================================================================

/// Ledger header plus the derived data range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub user_name: String,
    pub utc_offset: String,
    pub operational_status: bool,
    pub generated_at: Option<String>,
    pub data_range: Option<DataRange>,
    pub platform_fee: f64,
    pub total_messages: u64,
}

/// Everything the overview needs without issuing a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub earnings_data: EarningsData,
    pub creator_table: Vec<CreatorPerformanceRow>,
    pub statistics: Statistics,
    pub notifications: NotificationSummary,
    pub computed_at: DateTime<Utc>,
}

impl Snapshot {
    fn build(engine: &AggregationEngine, now: DateTime<Utc>) -> Self {
        let ledger = engine.ledger();
        Self {
            metadata: SnapshotMetadata {
                user_name: ledger.metadata.user_name.clone(),
                utc_offset: ledger.metadata.utc_offset.clone(),
                operational_status: ledger.metadata.operational_status,
                generated_at: ledger.metadata.generated_at.clone(),
                data_range: ledger.data_range(),
                platform_fee: ledger.platform_fee_rate(),
                total_messages: ledger.metadata.total_messages,
            },
            earnings_data: engine.generate_earnings_data(now),
            creator_table: engine.generate_creator_performance_data(now),
            statistics: engine.get_statistics(now),
            notifications: ledger.notification_summary(),
            computed_at: now,
        }
    }
}

/// The shape reported while no ledger is loaded
pub fn empty_snapshot(now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        metadata: SnapshotMetadata {
            user_name: constants::EMPTY_USER_NAME.to_string(),
            utc_offset: constants::EMPTY_UTC_OFFSET.to_string(),
            operational_status: false,
            generated_at: None,
            data_range: None,
            platform_fee: constants::DEFAULT_PLATFORM_FEE_RATE,
            total_messages: 0,
        },
        earnings_data: empty_earnings_data(),
        creator_table: Vec::new(),
        statistics: Statistics::default(),
        notifications: NotificationSummary::default(),
        computed_at: now,
    }
}

// =============================================================================
// Session
// =============================================================================

/// A published ledger with its engine and snapshot
pub struct ActiveLedger {
    pub name: Option<String>,
    pub engine: AggregationEngine,
    pub snapshot: Snapshot,
}

pub struct Session {
    clock: Arc<dyn Clock>,
    options: LedgerOptions,
    active: Option<Arc<ActiveLedger>>,
}

impl Session {
    pub fn new(clock: Arc<dyn Clock>, options: LedgerOptions) -> Self {
        Self {
            clock,
            options,
            active: None,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    /// Name the active ledger was loaded under, if it came from a store
    pub fn ledger_name(&self) -> Option<&str> {
        self.active.as_ref().and_then(|a| a.name.as_deref())
    }

    /// Shared handle to the published state; stays valid across later swaps
    pub fn active(&self) -> Option<Arc<ActiveLedger>> {
        self.active.clone()
    }

    pub fn engine(&self) -> Option<&AggregationEngine> {
        self.active.as_deref().map(|a| &a.engine)
    }

    /// Current snapshot, or the empty shape
    pub fn snapshot(&self) -> Snapshot {
        match &self.active {
            Some(active) => active.snapshot.clone(),
            None => empty_snapshot(self.now()),
        }
    }

    /// Build a new engine and snapshot for `ledger`, then publish them
    pub fn replace(&mut self, ledger: Ledger) {
        self.publish(ledger, None);
    }

    fn publish(&mut self, ledger: Ledger, name: Option<String>) {
        let engine = AggregationEngine::new(Arc::new(ledger));
        let snapshot = Snapshot::build(&engine, self.now());
        info!(
            ledger = name.as_deref().unwrap_or("<upload>"),
            transactions = engine.ledger().transactions.len(),
            creators = snapshot.creator_table.len(),
            "Ledger published"
        );
        self.active = Some(Arc::new(ActiveLedger { name, engine, snapshot }));
    }

    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            info!("Ledger cleared");
        }
    }

    /// Validate and adopt an uploaded document; the previous state survives a failure
    pub fn load_json(&mut self, json: &str) -> Result<(), LedgerError> {
        match Ledger::from_json_str(json, &self.options) {
            Ok(ledger) => {
                self.publish(ledger, None);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Rejected uploaded ledger, keeping previous state");
                Err(err)
            }
        }
    }

    /// Load `name` from `store`.
    ///
    /// Returns `Ok(false)` when the store has no such ledger. Either way a
    /// failed or missing load leaves the previous state in place.
    pub async fn load_from<S: LedgerStore>(&mut self, store: &S, name: &str) -> Result<bool> {
        let body = match store.load(name).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                warn!(ledger = name, "Ledger not found, keeping previous state");
                return Ok(false);
            }
            Err(err) => {
                warn!(ledger = name, error = %err, "Ledger load failed, keeping previous state");
                return Err(err);
            }
        };

        let ledger = Ledger::from_json_str(&body, &self.options)
            .inspect_err(|err| warn!(ledger = name, error = %err, "Rejected ledger, keeping previous state"))
            .with_context(|| format!("Ledger '{}' is not a valid transaction ledger", name))?;

        self.publish(ledger, Some(name.to_string()));
        Ok(true)
    }
}

impl LedgerAnalytics for Session {
    fn calculate_earnings_for_period(&self, period: Period, channel: Option<Channel>) -> EarningsTotals {
        self.engine()
            .map(|e| e.calculate_earnings_for_period(period, channel))
            .unwrap_or_default()
    }

    fn calculate_creator_earnings(&self, creator: &str, period: Period, channel: Option<Channel>) -> EarningsTotals {
        self.engine()
            .map(|e| e.calculate_creator_earnings(creator, period, channel))
            .unwrap_or_default()
    }

    fn calculate_refunds_for_period(&self, period: Period) -> f64 {
        self.engine().map_or(0.0, |e| e.calculate_refunds_for_period(period))
    }

    fn generate_earnings_data(&self, now: DateTime<Utc>) -> EarningsData {
        self.engine()
            .map_or_else(empty_earnings_data, |e| e.generate_earnings_data(now))
    }

    fn generate_creator_performance_data(&self, now: DateTime<Utc>) -> Vec<CreatorPerformanceRow> {
        self.engine()
            .map(|e| e.generate_creator_performance_data(now))
            .unwrap_or_default()
    }

    fn generate_dynamic_earnings_trends(&self, period: Period, granularity: Granularity) -> Vec<TrendPoint> {
        self.engine()
            .map(|e| e.generate_dynamic_earnings_trends(period, granularity))
            .unwrap_or_default()
    }

    fn generate_dynamic_sales_chart(&self, period: Period, granularity: Granularity) -> Vec<SalesPoint> {
        self.engine()
            .map(|e| e.generate_dynamic_sales_chart(period, granularity))
            .unwrap_or_default()
    }

    fn get_statistics(&self, now: DateTime<Utc>) -> Statistics {
        self.engine().map(|e| e.get_statistics(now)).unwrap_or_default()
    }

    fn fans_for_creator(&self, creator: &str, period: Period) -> Vec<Fan> {
        self.engine()
            .map(|e| e.fans_for_creator(creator, period))
            .unwrap_or_default()
    }

    fn new_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary {
        self.engine()
            .map(|e| e.new_subscriptions(creator, period))
            .unwrap_or_default()
    }

    fn recurring_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary {
        self.engine()
            .map(|e| e.recurring_subscriptions(creator, period))
            .unwrap_or_default()
    }

    fn fans_with_renew_on(&self, creator: &str, period: Period) -> usize {
        self.engine().map_or(0, |e| e.fans_with_renew_on(creator, period))
    }

    fn active_fans(&self, creator: &str, period: Period) -> usize {
        self.engine().map_or(0, |e| e.active_fans(creator, period))
    }

    fn avg_spend_per_spender(&self, creator: &str, period: Period) -> f64 {
        self.engine().map_or(0.0, |e| e.avg_spend_per_spender(creator, period))
    }

    fn avg_spend_per_transaction(&self, creator: &str, period: Period) -> f64 {
        self.engine().map_or(0.0, |e| e.avg_spend_per_transaction(creator, period))
    }

    fn avg_subscription_length(&self, creator: &str, period: Period) -> f64 {
        self.engine().map_or(0.0, |e| e.avg_subscription_length(creator, period))
    }

    fn creator_profile(&self, creator: &str) -> Option<Creator> {
        self.engine().and_then(|e| e.creator_profile(creator))
    }
}
