//! Dynamic trend series for arbitrary ranges
//!
//! A range is walked in the reporting offset, one granularity unit per
//! point. Each point covers `[unit start, next unit start - 1ms]` so that
//! neighbouring points never count the same transaction twice.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::engine::AggregationEngine;
use crate::ledger::Channel;
use crate::period::{Granularity, Period, local_to_utc};

/// One point of the gross earnings trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub value: f64,
}

/// One point of the per-channel sales chart
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SalesPoint {
    pub date: String,
    pub subscriptions: f64,
    pub tips: f64,
    pub posts: f64,
    pub messages: f64,
    pub referrals: f64,
    pub streams: f64,
}

impl SalesPoint {
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
}

/// A labelled sub-interval of a trend range
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub period: Period,
}

/// Split `period` into at most `granularity.max_points()` buckets
pub fn buckets(period: Period, granularity: Granularity, offset: &chrono::FixedOffset) -> Vec<Bucket> {
    let start = period.start.with_timezone(offset).naive_local();
    let end = period.end.with_timezone(offset).naive_local();

    // A point exists for every unit start that is not past the end
    (0..granularity.max_points())
        .map_while(|i| {
            let current = granularity.advance(start, i).filter(|current| *current <= end)?;
            let next = granularity.advance(start, i + 1)?;
            Some(bucket(current, next, granularity, offset))
        })
        .collect()
}

fn bucket(current: NaiveDateTime, next: NaiveDateTime, granularity: Granularity, offset: &chrono::FixedOffset) -> Bucket {
    Bucket {
        label: current.format(granularity.date_format()).to_string(),
        period: Period::new(
            local_to_utc(current, offset),
            local_to_utc(next, offset) - Duration::milliseconds(1),
        ),
    }
}

impl AggregationEngine {
    pub(crate) fn earnings_trend(&self, period: Period, granularity: Granularity) -> Vec<TrendPoint> {
        let points: Vec<TrendPoint> = buckets(period, granularity, &self.offset())
            .into_iter()
            .map(|bucket| TrendPoint {
                value: self.earnings(bucket.period, None, None).gross,
                date: bucket.label,
            })
            .collect();
        debug!(%period, %granularity, points = points.len(), "Earnings trend generated");
        points
    }

    pub(crate) fn sales_chart(&self, period: Period, granularity: Granularity) -> Vec<SalesPoint> {
        let points: Vec<SalesPoint> = buckets(period, granularity, &self.offset())
            .into_iter()
            .map(|bucket| {
                let gross = |channel| self.earnings(bucket.period, Some(channel), None).gross;
                SalesPoint {
                    subscriptions: gross(Channel::Subscriptions),
                    tips: gross(Channel::Tips),
                    posts: gross(Channel::Posts),
                    messages: gross(Channel::Messages),
                    referrals: gross(Channel::Referrals),
                    streams: gross(Channel::Streams),
                    date: bucket.label,
                }
            })
            .collect();
        debug!(%period, %granularity, points = points.len(), "Sales chart generated");
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_buckets_are_capped() {
        let period = Period::new(at(2025, 1, 1, 0), at(2025, 3, 2, 0));
        assert_eq!(buckets(period, Granularity::Day, &utc()).len(), 30);
    }

    #[test]
    fn bucket_count_is_units_plus_one() {
        let period = Period::new(at(2025, 1, 1, 0), at(2025, 1, 5, 12));
        let days = buckets(period, Granularity::Day, &utc());
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].label, "Jan 1");
        assert_eq!(days[4].label, "Jan 5");
    }

    #[test]
    fn buckets_partition_the_range() {
        let period = Period::new(at(2025, 1, 1, 0), at(2025, 1, 3, 0));
        let days = buckets(period, Granularity::Day, &utc());
        assert_eq!(days[0].period.end + Duration::milliseconds(1), days[1].period.start);
    }

    #[test]
    fn labels_follow_granularity() {
        let period = Period::new(at(2025, 1, 1, 9), at(2025, 1, 1, 11));
        let hours = buckets(period, Granularity::Hour, &utc());
        assert_eq!(hours.len(), 3);
        assert_eq!(hours[0].label, "Jan 1, 09:00");

        let months = buckets(Period::new(at(2025, 1, 15, 0), at(2025, 4, 15, 0)), Granularity::Month, &utc());
        assert_eq!(months.len(), 4);
        assert_eq!(months[3].label, "Apr 2025");
    }

    #[test]
    fn clamped_month_step_still_reaches_range_end() {
        // Jan 31 + 1 month clamps to Feb 28, which is the inclusive end
        let period = Period::new(at(2025, 1, 31, 0), at(2025, 2, 28, 0));
        let months = buckets(period, Granularity::Month, &utc());
        assert_eq!(months.len(), 2);
        assert_eq!(months[1].label, "Feb 2025");
        assert!(months[1].period.contains(period.end));
    }

    #[test]
    fn labels_are_local_to_offset() {
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let period = Period::new(at(2025, 1, 2, 3), at(2025, 1, 2, 5));
        let hours = buckets(period, Granularity::Hour, &offset);
        assert_eq!(hours[0].label, "Jan 1, 20:00");
        assert_eq!(hours[0].period.start, at(2025, 1, 2, 3));
    }

    #[test]
    fn reversed_range_is_empty() {
        let period = Period::new(at(2025, 1, 5, 0), at(2025, 1, 1, 0));
        assert!(buckets(period, Granularity::Day, &utc()).is_empty());
    }
}
