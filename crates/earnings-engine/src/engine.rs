//! Aggregation engine over one loaded ledger
//!
//! The engine is built once per ledger and never mutated afterwards except
//! for its memo cache, which lives exactly as long as the engine does.
//! Per-creator, trend and fan queries live in sibling modules as further
//! `impl AggregationEngine` blocks.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use crate::creators::CreatorPerformanceRow;
use crate::fans::SubscriptionSummary;
use crate::ledger::{Amounts, Channel, Creator, Fan, Ledger, Transaction};
use crate::period::{Granularity, Period, StandardPeriod};
use crate::trends::{SalesPoint, TrendPoint};

// =============================================================================
// Result types
// =============================================================================

/// Sums over the non-refunded transactions matching a query
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsTotals {
    pub gross: f64,
    pub net: f64,
    pub platform_fees: f64,
    pub transaction_count: usize,
}

impl EarningsTotals {
    fn add(mut self, amounts: &Amounts) -> Self {
        self.gross += amounts.gross;
        self.net += amounts.net;
        self.platform_fees += amounts.platform_fee;
        self.transaction_count += 1;
        self
    }
}

/// Total plus one figure per channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EarningsBreakdown {
    pub total: f64,
    pub subscriptions: f64,
    pub tips: f64,
    pub posts: f64,
    pub messages: f64,
    pub referrals: f64,
    pub streams: f64,
}

impl EarningsBreakdown {
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Subscriptions => self.subscriptions,
            Channel::Tips => self.tips,
            Channel::Posts => self.posts,
            Channel::Messages => self.messages,
            Channel::Referrals => self.referrals,
            Channel::Streams => self.streams,
        }
    }

    fn set_channel(&mut self, channel: Channel, value: f64) {
        let slot = match channel {
            Channel::Subscriptions => &mut self.subscriptions,
            Channel::Tips => &mut self.tips,
            Channel::Posts => &mut self.posts,
            Channel::Messages => &mut self.messages,
            Channel::Referrals => &mut self.referrals,
            Channel::Streams => &mut self.streams,
        };
        *slot = value;
    }
}

/// Gross and net breakdowns for one standard period
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PeriodEarnings {
    #[serde(rename = "Gross earnings")]
    pub gross: EarningsBreakdown,
    #[serde(rename = "Net earnings")]
    pub net: EarningsBreakdown,
}

/// Earnings for every standard period, keyed by period
pub type EarningsData = BTreeMap<StandardPeriod, PeriodEarnings>;

/// All-zero earnings for every standard period
pub fn empty_earnings_data() -> EarningsData {
    StandardPeriod::ALL
        .into_iter()
        .map(|p| (p, PeriodEarnings::default()))
        .collect()
}

/// Headline figures for the trailing week
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub creators: usize,
    pub message_earnings: f64,
    pub total_earnings: f64,
    pub refunded: f64,
}

/// Percentage change from `previous` to `current`; 0 when there is no baseline
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

// =============================================================================
// Query interface
// =============================================================================

/// Everything the presentation layer may ask of a loaded ledger.
///
/// Implemented by [`AggregationEngine`] and by the session, which answers
/// with zero/empty values while no ledger is loaded.
pub trait LedgerAnalytics {
    fn calculate_earnings_for_period(&self, period: Period, channel: Option<Channel>) -> EarningsTotals;
    fn calculate_creator_earnings(&self, creator: &str, period: Period, channel: Option<Channel>) -> EarningsTotals;
    fn calculate_refunds_for_period(&self, period: Period) -> f64;
    fn generate_earnings_data(&self, now: DateTime<Utc>) -> EarningsData;
    fn generate_creator_performance_data(&self, now: DateTime<Utc>) -> Vec<CreatorPerformanceRow>;
    fn generate_dynamic_earnings_trends(&self, period: Period, granularity: Granularity) -> Vec<TrendPoint>;
    fn generate_dynamic_sales_chart(&self, period: Period, granularity: Granularity) -> Vec<SalesPoint>;
    fn get_statistics(&self, now: DateTime<Utc>) -> Statistics;

    fn fans_for_creator(&self, creator: &str, period: Period) -> Vec<Fan>;
    fn new_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary;
    fn recurring_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary;
    fn fans_with_renew_on(&self, creator: &str, period: Period) -> usize;
    fn active_fans(&self, creator: &str, period: Period) -> usize;
    fn avg_spend_per_spender(&self, creator: &str, period: Period) -> f64;
    fn avg_spend_per_transaction(&self, creator: &str, period: Period) -> f64;
    fn avg_subscription_length(&self, creator: &str, period: Period) -> f64;
    fn creator_profile(&self, creator: &str) -> Option<Creator>;
}

// =============================================================================
// Engine
// =============================================================================

/// Memo key: exact period bounds plus the optional filters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    channel: Option<Channel>,
    creator: Option<String>,
}

pub struct AggregationEngine {
    ledger: Arc<Ledger>,
    offset: FixedOffset,
    cache: Mutex<HashMap<CacheKey, EarningsTotals>>,
}

impl AggregationEngine {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        debug!(
            transactions = ledger.transactions.len(),
            fans = ledger.fans.len(),
            creators = ledger.creators.len(),
            platform_fee_rate = ledger.platform_fee_rate(),
            "Aggregation engine created"
        );
        let offset = ledger.offset();
        Self {
            ledger,
            offset,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Offset used to cut days for standard periods and chart labels
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Canonical amounts of a transaction (resolved when the ledger was loaded)
    pub fn normalize_amounts(&self, transaction: &Transaction) -> Amounts {
        transaction.amounts
    }

    /// Number of memoized aggregates
    pub fn cached_entries(&self) -> usize {
        self.cache_lock().len()
    }

    fn cache_lock(&self) -> MutexGuard<'_, HashMap<CacheKey, EarningsTotals>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-refunded transactions inside `period`, optionally narrowed
    pub(crate) fn earning_transactions<'a>(
        &'a self,
        period: Period,
        channel: Option<Channel>,
        creator: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.ledger.transactions.iter().filter(move |tx| {
            !tx.is_refunded()
                && period.contains(tx.timestamp)
                && channel.is_none_or(|c| tx.channel == c)
                && creator.is_none_or(|alias| tx.creator_alias == alias)
        })
    }

    pub(crate) fn earnings(&self, period: Period, channel: Option<Channel>, creator: Option<&str>) -> EarningsTotals {
        let key = CacheKey {
            start: period.start,
            end: period.end,
            channel,
            creator: creator.map(str::to_owned),
        };

        let cached = self.cache_lock().get(&key).copied();
        if let Some(totals) = cached {
            trace!(%period, ?channel, ?creator, "Earnings cache hit");
            return totals;
        }

        let totals = self
            .earning_transactions(period, channel, creator)
            .fold(EarningsTotals::default(), |acc, tx| acc.add(&tx.amounts));
        trace!(%period, ?channel, ?creator, count = totals.transaction_count, "Earnings computed");

        self.cache_lock().insert(key, totals);
        totals
    }

    pub(crate) fn refunds(&self, period: Period) -> f64 {
        self.ledger
            .transactions
            .iter()
            .filter_map(|tx| tx.refund)
            .filter(|refund| period.contains(refund.timestamp))
            .map(|refund| refund.amount)
            .sum()
    }

    fn period_earnings(&self, period: Period) -> PeriodEarnings {
        let all = self.earnings(period, None, None);
        let mut result = PeriodEarnings {
            gross: EarningsBreakdown {
                total: all.gross,
                ..Default::default()
            },
            net: EarningsBreakdown {
                total: all.net,
                ..Default::default()
            },
        };

        for channel in Channel::ALL {
            let totals = self.earnings(period, Some(channel), None);
            result.gross.set_channel(channel, totals.gross);
            result.net.set_channel(channel, totals.net);
        }

        result
    }

    pub fn standard_periods(&self, now: DateTime<Utc>) -> Vec<(StandardPeriod, Period)> {
        StandardPeriod::ALL
            .into_iter()
            .map(|p| (p, p.bounds(now, &self.offset)))
            .collect()
    }
}

impl LedgerAnalytics for AggregationEngine {
    fn calculate_earnings_for_period(&self, period: Period, channel: Option<Channel>) -> EarningsTotals {
        self.earnings(period, channel, None)
    }

    fn calculate_creator_earnings(&self, creator: &str, period: Period, channel: Option<Channel>) -> EarningsTotals {
        self.earnings(period, channel, Some(creator))
    }

    fn calculate_refunds_for_period(&self, period: Period) -> f64 {
        self.refunds(period)
    }

    fn generate_earnings_data(&self, now: DateTime<Utc>) -> EarningsData {
        self.standard_periods(now)
            .into_iter()
            .map(|(name, period)| (name, self.period_earnings(period)))
            .collect()
    }

    fn generate_creator_performance_data(&self, now: DateTime<Utc>) -> Vec<CreatorPerformanceRow> {
        self.creator_rows(now)
    }

    fn generate_dynamic_earnings_trends(&self, period: Period, granularity: Granularity) -> Vec<TrendPoint> {
        self.earnings_trend(period, granularity)
    }

    fn generate_dynamic_sales_chart(&self, period: Period, granularity: Granularity) -> Vec<SalesPoint> {
        self.sales_chart(period, granularity)
    }

    fn get_statistics(&self, now: DateTime<Utc>) -> Statistics {
        let week = StandardPeriod::ThisWeek.bounds(now, &self.offset);
        Statistics {
            creators: self.ledger.creator_aliases().len(),
            message_earnings: self.earnings(week, Some(Channel::Messages), None).gross,
            total_earnings: self.earnings(week, None, None).gross,
            refunded: self.refunds(week),
        }
    }

    fn fans_for_creator(&self, creator: &str, period: Period) -> Vec<Fan> {
        self.current_fans(creator, period).cloned().collect()
    }

    fn new_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary {
        self.new_subscription_summary(creator, period)
    }

    fn recurring_subscriptions(&self, creator: &str, period: Period) -> SubscriptionSummary {
        self.recurring_subscription_summary(creator, period)
    }

    fn fans_with_renew_on(&self, creator: &str, period: Period) -> usize {
        self.current_fans(creator, period).filter(|fan| fan.renew_on).count()
    }

    fn active_fans(&self, creator: &str, period: Period) -> usize {
        self.active_fan_count(creator, period)
    }

    fn avg_spend_per_spender(&self, creator: &str, period: Period) -> f64 {
        self.spend_per_spender(creator, period)
    }

    fn avg_spend_per_transaction(&self, creator: &str, period: Period) -> f64 {
        self.spend_per_transaction(creator, period)
    }

    fn avg_subscription_length(&self, creator: &str, period: Period) -> f64 {
        self.subscription_length_days(creator, period)
    }

    fn creator_profile(&self, creator: &str) -> Option<Creator> {
        self.ledger.creator(creator).cloned()
    }
}
