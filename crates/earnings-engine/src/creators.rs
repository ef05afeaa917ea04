//! Per-creator performance table
//!
//! Every creator is compared over the trailing week against the
//! non-overlapping week before it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::engine::{AggregationEngine, LedgerAnalytics, growth_percentage};
use crate::ledger::Channel;
use crate::period::{Period, local_date, trailing_week};

/// One table row; numeric fields sit next to their display strings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorPerformanceRow {
    pub creator: String,

    pub total_earnings: f64,
    pub previous_earnings: f64,
    pub total_earnings_change: f64,
    pub total_earnings_display: String,

    pub subscriptions: f64,
    pub subscriptions_change: f64,
    pub subscriptions_display: String,
    pub tips: f64,
    pub tips_display: String,
    pub messages: f64,
    pub messages_display: String,

    pub contribution: f64,
    pub contribution_display: String,

    pub new_subscriptions: usize,
    pub new_subscriptions_change: f64,
    pub recurring_subscriptions: usize,
    pub recurring_subscriptions_change: f64,

    pub fans_with_renew_on: usize,
    pub renew_on_percent: f64,
    pub renew_on_percent_display: String,
    pub active_fans: usize,
    pub active_fans_change: f64,

    pub avg_spend_per_spender: f64,
    pub avg_spend_per_spender_change: f64,
    pub avg_spend_per_spender_display: String,
    pub avg_spend_per_transaction: f64,
    pub avg_spend_per_transaction_change: f64,
    pub avg_spend_per_transaction_display: String,
    pub avg_subscription_length: f64,
    pub avg_subscription_length_display: String,

    pub of_ranking: Option<Value>,
    pub following: Option<Value>,
}

pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_days(days: f64) -> String {
    format!("{:.1} days", days)
}

fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

fn count_growth(current: usize, previous: usize) -> f64 {
    growth_percentage(current as f64, previous as f64)
}

impl AggregationEngine {
    pub(crate) fn creator_rows(&self, now: DateTime<Utc>) -> Vec<CreatorPerformanceRow> {
        let offset = self.offset();
        let today = local_date(now, &offset);
        let this_week = trailing_week(today, 0, &offset);
        let last_week = trailing_week(today, 1, &offset);
        let all_creators = self.earnings(this_week, None, None).gross;

        self.ledger()
            .creator_aliases()
            .into_iter()
            .map(|alias| self.creator_row(alias, this_week, last_week, all_creators))
            .collect()
    }

    fn creator_row(&self, alias: &str, this_week: Period, last_week: Period, all_creators: f64) -> CreatorPerformanceRow {
        let current = self.earnings(this_week, None, Some(alias));
        let previous = self.earnings(last_week, None, Some(alias));
        let channel = |c: Channel, period: Period| self.earnings(period, Some(c), Some(alias)).gross;

        let subscriptions = channel(Channel::Subscriptions, this_week);
        let tips = channel(Channel::Tips, this_week);
        let messages = channel(Channel::Messages, this_week);
        let contribution = share(current.gross, all_creators);

        let new_now = self.new_subscription_summary(alias, this_week);
        let new_before = self.new_subscription_summary(alias, last_week);
        let recurring_now = self.recurring_subscription_summary(alias, this_week);
        let recurring_before = self.recurring_subscription_summary(alias, last_week);

        let current_fans = self.current_fans(alias, this_week).count();
        let fans_with_renew_on = self.fans_with_renew_on(alias, this_week);
        let renew_on_percent = share(fans_with_renew_on as f64, current_fans as f64);
        let active_fans = self.active_fan_count(alias, this_week);

        let per_spender = self.spend_per_spender(alias, this_week);
        let per_transaction = self.spend_per_transaction(alias, this_week);
        let subscription_length = self.subscription_length_days(alias, this_week);

        let profile = self.ledger().creator(alias);

        CreatorPerformanceRow {
            creator: alias.to_string(),

            total_earnings: current.gross,
            previous_earnings: previous.gross,
            total_earnings_change: growth_percentage(current.gross, previous.gross),
            total_earnings_display: format_money(current.gross),

            subscriptions,
            subscriptions_change: growth_percentage(subscriptions, channel(Channel::Subscriptions, last_week)),
            subscriptions_display: format_money(subscriptions),
            tips,
            tips_display: format_money(tips),
            messages,
            messages_display: format_money(messages),

            contribution,
            contribution_display: format_percent(contribution),

            new_subscriptions: new_now.count,
            new_subscriptions_change: count_growth(new_now.count, new_before.count),
            recurring_subscriptions: recurring_now.count,
            recurring_subscriptions_change: count_growth(recurring_now.count, recurring_before.count),

            fans_with_renew_on,
            renew_on_percent,
            renew_on_percent_display: format_percent(renew_on_percent),
            active_fans,
            active_fans_change: count_growth(active_fans, self.active_fan_count(alias, last_week)),

            avg_spend_per_spender: per_spender,
            avg_spend_per_spender_change: growth_percentage(per_spender, self.spend_per_spender(alias, last_week)),
            avg_spend_per_spender_display: format_money(per_spender),
            avg_spend_per_transaction: per_transaction,
            avg_spend_per_transaction_change: growth_percentage(
                per_transaction,
                self.spend_per_transaction(alias, last_week),
            ),
            avg_spend_per_transaction_display: format_money(per_transaction),
            avg_subscription_length: subscription_length,
            avg_subscription_length_display: format_days(subscription_length),

            of_ranking: profile.and_then(|p| p.of_ranking.clone()),
            following: profile.and_then(|p| p.following.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Ledger, LedgerOptions};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn engine() -> AggregationEngine {
        let doc = json!({
            "metadata": { "userName": "A", "utcOffset": "+00:00", "operationalStatus": true, "platformFee": 0.2 },
            "transactions": [
                { "id": "1", "timestamp": "2025-03-13T10:00:00Z", "channel": "subscriptions", "creatorAlias": "@b", "amount": 30.0 },
                { "id": "2", "timestamp": "2025-03-12T10:00:00Z", "channel": "tips", "creatorAlias": "@a", "amount": 60.0 },
                { "id": "3", "timestamp": "2025-03-10T10:00:00Z", "channel": "messages", "creatorAlias": "@a", "amount": 10.0 },
                { "id": "4", "timestamp": "2025-03-05T10:00:00Z", "channel": "tips", "creatorAlias": "@a", "amount": 35.0 },
                { "id": "5", "timestamp": "2025-03-07T23:59:59Z", "channel": "subscriptions", "creatorAlias": "@b", "amount": 50.0 }
            ],
            "creators": [
                { "alias": "@a", "ofRanking": "0.4%", "following": "12K", "displayName": "Anna" }
            ]
        });
        AggregationEngine::new(Arc::new(Ledger::from_value(doc, &LedgerOptions::default()).unwrap()))
    }

    #[test]
    fn rows_follow_first_appearance() {
        let rows = engine().generate_creator_performance_data(now());
        let names: Vec<_> = rows.iter().map(|r| r.creator.as_str()).collect();
        assert_eq!(names, vec!["@b", "@a"]);
    }

    #[test]
    fn rows_are_scoped_to_their_creator() {
        let rows = engine().generate_creator_performance_data(now());
        let a = &rows[1];
        assert_eq!(a.total_earnings, 70.0);
        assert_eq!(a.previous_earnings, 35.0);
        assert_eq!(a.total_earnings_change, 100.0);
        assert_eq!(a.tips, 60.0);
        assert_eq!(a.messages, 10.0);
        assert_eq!(a.subscriptions, 0.0);
        assert_eq!(a.total_earnings_display, "$70.00");
        assert_eq!(a.of_ranking, Some(json!("0.4%")));
        assert_eq!(a.following, Some(json!("12K")));

        let b = &rows[0];
        assert_eq!(b.subscriptions, 30.0);
        assert_eq!(b.subscriptions_change, -40.0);
        assert!(b.of_ranking.is_none());
    }

    #[test]
    fn contributions_split_the_week() {
        let rows = engine().generate_creator_performance_data(now());
        let total: f64 = rows.iter().map(|r| r.contribution).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(rows[1].contribution_display, "70.0%");
    }

    #[test]
    fn rows_without_fans_report_zero_metrics() {
        let rows = engine().generate_creator_performance_data(now());
        let a = &rows[1];
        assert_eq!(a.active_fans, 0);
        assert_eq!(a.renew_on_percent, 0.0);
        assert_eq!(a.avg_spend_per_spender, 0.0);
        assert_eq!(a.avg_spend_per_transaction, 28.0);
        assert_eq!(a.avg_subscription_length_display, "0.0 days");
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(format_money(1234.5), "$1234.50");
        assert_eq!(format_percent(12.345), "12.3%");
        assert_eq!(format_days(42.0), "42.0 days");
    }
}
