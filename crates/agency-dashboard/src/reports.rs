//! Report generation (console tables and CSV exports)

use anyhow::{Context, Result};
use csv::Writer;
use earnings_engine::creators::{format_days, format_money};
use earnings_engine::{
    Channel, CreatorPerformanceRow, EarningsTotals, LedgerAnalytics, Period, SalesPoint, Snapshot, StandardPeriod,
    SubscriptionSummary, TrendPoint,
};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::constants;

/// Avoid displaying -0.00
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

fn money(value: f64) -> String {
    format_money(normalize_zero(value))
}

fn signed_percent(value: f64) -> String {
    format!("{:+.1}%", normalize_zero(value))
}

// =============================================================================
// Console Output
// =============================================================================

/// Earnings by standard period plus the weekly statistics
pub fn print_summary(snapshot: &Snapshot) {
    let meta = &snapshot.metadata;

    println!("\n============================================================");
    println!("EARNINGS SUMMARY: {}", meta.user_name);
    println!("============================================================");
    println!("  UTC offset:         {}", meta.utc_offset);
    println!("  Platform fee:       {:.1}%", meta.platform_fee * 100.0);
    match &meta.data_range {
        Some(range) => println!(
            "  Data range:         {} to {}",
            range.start_date.format("%Y-%m-%d %H:%M"),
            range.end_date.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  Data range:         (no transactions)"),
    }
    if let Some(generated) = &meta.generated_at {
        println!("  Generated at:       {}", generated);
    }

    println!(
        "\n{:<12} {:<6} {:>12} {:>14} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Period", "Kind", "Total", "Subscriptions", "Tips", "Posts", "Messages", "Referrals", "Streams"
    );
    println!("{}", "-".repeat(100));
    for (period, earnings) in &snapshot.earnings_data {
        for (kind, breakdown) in [("Gross", &earnings.gross), ("Net", &earnings.net)] {
            println!(
                "{:<12} {:<6} {:>12} {:>14} {:>10} {:>10} {:>10} {:>10} {:>10}",
                period.name(),
                kind,
                money(breakdown.total),
                money(breakdown.subscriptions),
                money(breakdown.tips),
                money(breakdown.posts),
                money(breakdown.messages),
                money(breakdown.referrals),
                money(breakdown.streams),
            );
        }
    }

    let stats = &snapshot.statistics;
    println!("\nTHIS WEEK:");
    println!("  Creators:           {}", stats.creators);
    println!("  Total earnings:     {:>12}", money(stats.total_earnings));
    println!("  Message earnings:   {:>12}", money(stats.message_earnings));
    println!("  Refunded:           {:>12}", money(stats.refunded));
    println!("  Messages received:  {}", snapshot.notifications.total_messages);
    println!("============================================================");
}

#[derive(Tabled)]
struct CreatorTableRow<'a> {
    #[tabled(rename = "Creator")]
    creator: &'a str,
    #[tabled(rename = "Earnings")]
    earnings: &'a str,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Subs")]
    subscriptions: &'a str,
    #[tabled(rename = "Tips")]
    tips: &'a str,
    #[tabled(rename = "Messages")]
    messages: &'a str,
    #[tabled(rename = "Share")]
    contribution: &'a str,
    #[tabled(rename = "New")]
    new_subscriptions: usize,
    #[tabled(rename = "Recurring")]
    recurring_subscriptions: usize,
    #[tabled(rename = "Active fans")]
    active_fans: usize,
    #[tabled(rename = "Renew on")]
    renew_on: String,
    #[tabled(rename = "Per spender")]
    per_spender: &'a str,
    #[tabled(rename = "Per tx")]
    per_transaction: &'a str,
    #[tabled(rename = "Sub length")]
    subscription_length: &'a str,
}

impl<'a> From<&'a CreatorPerformanceRow> for CreatorTableRow<'a> {
    fn from(row: &'a CreatorPerformanceRow) -> Self {
        Self {
            creator: &row.creator,
            earnings: &row.total_earnings_display,
            change: signed_percent(row.total_earnings_change),
            subscriptions: &row.subscriptions_display,
            tips: &row.tips_display,
            messages: &row.messages_display,
            contribution: &row.contribution_display,
            new_subscriptions: row.new_subscriptions,
            recurring_subscriptions: row.recurring_subscriptions,
            active_fans: row.active_fans,
            renew_on: format!("{} ({})", row.fans_with_renew_on, row.renew_on_percent_display),
            per_spender: &row.avg_spend_per_spender_display,
            per_transaction: &row.avg_spend_per_transaction_display,
            subscription_length: &row.avg_subscription_length_display,
        }
    }
}

/// Creator performance for the trailing week
pub fn print_creator_table(rows: &[CreatorPerformanceRow]) {
    if rows.is_empty() {
        println!("No creators in the active ledger.");
        return;
    }

    let table_rows: Vec<CreatorTableRow> = rows.iter().map(CreatorTableRow::from).collect();
    let mut table = Table::new(table_rows);
    table.with(Style::psql());
    println!("{}", table);
    println!("\n{} creator(s), this week vs. the week before", rows.len());
}

pub fn print_totals(period: &Period, label: &str, totals: &EarningsTotals) {
    println!("Earnings {} ({})", label, period);
    println!("{}", "-".repeat(40));
    println!("  Gross:          {:>14}", money(totals.gross));
    println!("  Platform fees:  {:>14}", money(totals.platform_fees));
    println!("  Net:            {:>14}", money(totals.net));
    println!("  Transactions:   {:>14}", totals.transaction_count);
}

pub fn print_trend(points: &[TrendPoint]) {
    if points.is_empty() {
        println!("No points in range.");
        return;
    }

    println!("{:<16} {:>14}", "Date", "Gross");
    println!("{}", "-".repeat(32));
    for point in points {
        println!("{:<16} {:>14}", point.date, money(point.value));
    }
    println!("{}", "-".repeat(32));
    println!("{:<16} {:>14}", "Total", money(points.iter().map(|p| p.value).sum()));
}

pub fn print_sales_chart(points: &[SalesPoint]) {
    if points.is_empty() {
        println!("No points in range.");
        return;
    }

    print!("{:<16}", "Date");
    for channel in Channel::ALL {
        print!(" {:>13}", channel.as_str());
    }
    println!();
    println!("{}", "-".repeat(16 + 14 * Channel::ALL.len()));
    for point in points {
        print!("{:<16}", point.date);
        for channel in Channel::ALL {
            print!(" {:>13}", money(point.channel(channel)));
        }
        println!();
    }
}

/// Every fan metric for one creator and range
#[derive(Debug, Clone, PartialEq)]
pub struct FanMetrics {
    pub current_fans: usize,
    pub new_subscriptions: SubscriptionSummary,
    pub recurring_subscriptions: SubscriptionSummary,
    pub fans_with_renew_on: usize,
    pub active_fans: usize,
    pub avg_spend_per_spender: f64,
    pub avg_spend_per_transaction: f64,
    pub avg_subscription_length: f64,
}

impl FanMetrics {
    pub fn collect(analytics: &impl LedgerAnalytics, creator: &str, period: Period) -> Self {
        Self {
            current_fans: analytics.fans_for_creator(creator, period).len(),
            new_subscriptions: analytics.new_subscriptions(creator, period),
            recurring_subscriptions: analytics.recurring_subscriptions(creator, period),
            fans_with_renew_on: analytics.fans_with_renew_on(creator, period),
            active_fans: analytics.active_fans(creator, period),
            avg_spend_per_spender: analytics.avg_spend_per_spender(creator, period),
            avg_spend_per_transaction: analytics.avg_spend_per_transaction(creator, period),
            avg_subscription_length: analytics.avg_subscription_length(creator, period),
        }
    }
}

pub fn print_fan_metrics(creator: &str, period: &Period, metrics: &FanMetrics) {
    println!("Fan metrics for {} ({})", creator, period);
    println!("{}", "-".repeat(50));
    println!("  Current fans:              {:>10}", metrics.current_fans);
    println!(
        "  New subscriptions:         {:>10}  net {}",
        metrics.new_subscriptions.count,
        money(metrics.new_subscriptions.earnings)
    );
    println!(
        "  Recurring subscriptions:   {:>10}  net {}",
        metrics.recurring_subscriptions.count,
        money(metrics.recurring_subscriptions.earnings)
    );
    println!("  Fans with renew on:        {:>10}", metrics.fans_with_renew_on);
    println!("  Active fans:               {:>10}", metrics.active_fans);
    println!("  Avg spend per spender:     {:>10}", money(metrics.avg_spend_per_spender));
    println!("  Avg spend per transaction: {:>10}", money(metrics.avg_spend_per_transaction));
    println!("  Avg subscription length:   {:>10}", format_days(metrics.avg_subscription_length));
}

// =============================================================================
// CSV Exports
// =============================================================================

/// Write all CSV exports into `output_dir`
pub fn export_all(output_dir: &Path, snapshot: &Snapshot, trend: &[SalesPoint]) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    export_earnings_summary(output_dir, snapshot)?;
    export_creator_performance(output_dir, &snapshot.creator_table)?;
    export_trends(output_dir, trend)?;
    Ok(())
}

/// Generate earnings_summary.csv
fn export_earnings_summary(output_dir: &Path, snapshot: &Snapshot) -> Result<()> {
    let path = output_dir.join(constants::EARNINGS_SUMMARY_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    let mut header = vec!["Period", "Kind", "Total"];
    header.extend(Channel::ALL.iter().map(|c| c.as_str()));
    wtr.write_record(&header)?;

    for period in StandardPeriod::ALL {
        let Some(earnings) = snapshot.earnings_data.get(&period) else {
            continue;
        };
        for (kind, breakdown) in [("Gross", &earnings.gross), ("Net", &earnings.net)] {
            let mut record = vec![
                period.name().to_string(),
                kind.to_string(),
                format!("{:.2}", breakdown.total),
            ];
            record.extend(Channel::ALL.iter().map(|c| format!("{:.2}", breakdown.channel(*c))));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate creator_performance.csv
fn export_creator_performance(output_dir: &Path, rows: &[CreatorPerformanceRow]) -> Result<()> {
    let path = output_dir.join(constants::CREATOR_PERFORMANCE_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Creator",
        "Total_Earnings",
        "Previous_Week",
        "Change_Pct",
        "Subscriptions",
        "Subscriptions_Change_Pct",
        "Tips",
        "Messages",
        "Contribution_Pct",
        "New_Subscriptions",
        "Recurring_Subscriptions",
        "Fans_With_Renew_On",
        "Renew_On_Pct",
        "Active_Fans",
        "Active_Fans_Change_Pct",
        "Avg_Spend_Per_Spender",
        "Avg_Spend_Per_Transaction",
        "Avg_Subscription_Days",
        "OF_Ranking",
        "Following",
    ])?;

    for row in rows {
        let profile_field = |value: &Option<serde_json::Value>| match value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        wtr.write_record([
            row.creator.clone(),
            format!("{:.2}", row.total_earnings),
            format!("{:.2}", row.previous_earnings),
            format!("{:.1}", row.total_earnings_change),
            format!("{:.2}", row.subscriptions),
            format!("{:.1}", row.subscriptions_change),
            format!("{:.2}", row.tips),
            format!("{:.2}", row.messages),
            format!("{:.1}", row.contribution),
            row.new_subscriptions.to_string(),
            row.recurring_subscriptions.to_string(),
            row.fans_with_renew_on.to_string(),
            format!("{:.1}", row.renew_on_percent),
            row.active_fans.to_string(),
            format!("{:.1}", row.active_fans_change),
            format!("{:.2}", row.avg_spend_per_spender),
            format!("{:.2}", row.avg_spend_per_transaction),
            format!("{:.1}", row.avg_subscription_length),
            profile_field(&row.of_ranking),
            profile_field(&row.following),
        ])?;
    }

    wtr.flush()?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate trends.csv
fn export_trends(output_dir: &Path, points: &[SalesPoint]) -> Result<()> {
    let path = output_dir.join(constants::TRENDS_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    let mut header = vec!["Date", "Total"];
    header.extend(Channel::ALL.iter().map(|c| c.as_str()));
    wtr.write_record(&header)?;

    for point in points {
        let total: f64 = Channel::ALL.iter().map(|c| point.channel(*c)).sum();
        let mut record = vec![point.date.clone(), format!("{:.2}", total)];
        record.extend(Channel::ALL.iter().map(|c| format!("{:.2}", point.channel(*c))));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    println!("  Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use earnings_engine::{FixedClock, LedgerOptions, Session};
    use std::sync::Arc;

    fn session() -> Session {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 18, 0, 0).unwrap();
        let mut session = Session::new(Arc::new(FixedClock(now)), LedgerOptions::default());
        session.load_json(constants::BUNDLED_LEDGER).unwrap();
        session
    }

    #[test]
    fn negative_zero_is_normalized() {
        assert_eq!(money(-0.0), "$0.00");
        assert_eq!(signed_percent(12.34), "+12.3%");
    }

    #[test]
    fn exports_write_three_files() {
        let session = session();
        let snapshot = session.snapshot();
        let period = Period::new(
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 14, 23, 59, 59).unwrap(),
        );
        let trend = session.generate_dynamic_sales_chart(period, earnings_engine::Granularity::Day);

        let dir = tempfile::tempdir().unwrap();
        export_all(dir.path(), &snapshot, &trend).unwrap();

        let summary = std::fs::read_to_string(dir.path().join(constants::EARNINGS_SUMMARY_FILENAME)).unwrap();
        assert_eq!(summary.lines().count(), 1 + 8);
        assert!(summary.starts_with("Period,Kind,Total,subscriptions,tips"));

        let creators = std::fs::read_to_string(dir.path().join(constants::CREATOR_PERFORMANCE_FILENAME)).unwrap();
        assert_eq!(creators.lines().count(), 1 + snapshot.creator_table.len());

        let trends = std::fs::read_to_string(dir.path().join(constants::TRENDS_FILENAME)).unwrap();
        assert_eq!(trends.lines().count(), 1 + 14);
    }

    #[test]
    fn fan_metrics_collect_from_session() {
        let session = session();
        let period = Period::new(
            Utc.with_ymd_and_hms(2026, 10, 8, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 14, 23, 59, 59).unwrap(),
        );
        let metrics = FanMetrics::collect(&session, "@luna", period);
        assert_eq!(metrics.current_fans, 3);
        assert_eq!(metrics.active_fans, 2);
        assert_eq!(metrics.new_subscriptions.count, 1);
        assert!(metrics.avg_spend_per_spender > 0.0);

        let empty = FanMetrics::collect(&session, "@nobody", period);
        assert_eq!(empty.current_fans, 0);
        assert_eq!(empty.avg_spend_per_spender, 0.0);
    }
}
