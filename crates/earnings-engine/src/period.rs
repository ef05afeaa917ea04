//! Reporting periods, granularities and the injectable clock
//!
//! All periods are closed intervals: an instant equal to either bound is
//! inside. Day boundaries are computed in the reporting offset, never in
//! the host's local time zone.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants;

// =============================================================================
// Clock
// =============================================================================

/// Source of the reference instant for now-relative periods
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant (tests, `--now` overrides)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Period
// =============================================================================

/// Closed interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole local days from the start of `first` to the end of `last`
    pub fn for_local_dates(first: NaiveDate, last: NaiveDate, offset: &FixedOffset) -> Self {
        Self::new(start_of_day(first, offset), end_of_day(last, offset))
    }

    /// Inclusive on both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Convert a wall-clock time in `offset` to UTC
pub fn local_to_utc(local: NaiveDateTime, offset: &FixedOffset) -> DateTime<Utc> {
    (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Local midnight of `date`
pub fn start_of_day(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN), offset)
}

/// Last millisecond of `date` (next local midnight minus 1 ms)
pub fn end_of_day(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    start_of_day(date, offset) + Duration::days(1) - Duration::milliseconds(1)
}

/// Calendar date of `instant` as seen in `offset`
pub fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}

// =============================================================================
// Standard Periods
// =============================================================================

/// The four fixed, now-relative windows shown on the overview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardPeriod {
    Yesterday,
    Today,
    ThisWeek,
    ThisMonth,
}

impl StandardPeriod {
    pub const ALL: [StandardPeriod; 4] = [Self::Yesterday, Self::Today, Self::ThisWeek, Self::ThisMonth];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Yesterday => "Yesterday",
            Self::Today => "Today",
            Self::ThisWeek => "This week",
            Self::ThisMonth => "This month",
        }
    }

    /// Bounds relative to `now`, with days cut in `offset`
    pub fn bounds(&self, now: DateTime<Utc>, offset: &FixedOffset) -> Period {
        let today = local_date(now, offset);
        match self {
            Self::Yesterday => {
                let yesterday = today - Duration::days(1);
                Period::for_local_dates(yesterday, yesterday, offset)
            }
            Self::Today => Period::for_local_dates(today, today, offset),
            Self::ThisWeek => trailing_week(today, 0, offset),
            Self::ThisMonth => {
                let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
                Period::for_local_dates(first, today, offset)
            }
        }
    }
}

impl fmt::Display for StandardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for StandardPeriod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Seven-day window ending `weeks_back` weeks before `today`.
///
/// `weeks_back = 0` is "this week" (6 days ago through today),
/// `weeks_back = 1` is the non-overlapping week before it.
pub fn trailing_week(today: NaiveDate, weeks_back: i64, offset: &FixedOffset) -> Period {
    let last = today - Duration::days(weeks_back * constants::WEEK_LENGTH_DAYS);
    let first = last - Duration::days(constants::TRAILING_WEEK_DAYS);
    Period::for_local_dates(first, last, offset)
}

// =============================================================================
// Granularity
// =============================================================================

/// Step size for dynamic trend charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Upper bound on chart points
    pub fn max_points(&self) -> u32 {
        match self {
            Self::Hour => constants::MAX_HOUR_POINTS,
            Self::Day => constants::MAX_DAY_POINTS,
            Self::Week => constants::MAX_WEEK_POINTS,
            Self::Month => constants::MAX_MONTH_POINTS,
        }
    }

    /// `strftime` pattern for point labels ("MMM D, HH:mm", "MMM D", "MMM YYYY")
    pub fn date_format(&self) -> &'static str {
        match self {
            Self::Hour => "%b %-d, %H:%M",
            Self::Day | Self::Week => "%b %-d",
            Self::Month => "%b %Y",
        }
    }

    /// `start` advanced by `steps` units; month steps clamp to the month's last day
    pub fn advance(&self, start: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        match self {
            Self::Hour => start.checked_add_signed(Duration::hours(i64::from(steps))),
            Self::Day => start.checked_add_signed(Duration::days(i64::from(steps))),
            Self::Week => start.checked_add_signed(Duration::weeks(i64::from(steps))),
            Self::Month => start.checked_add_months(Months::new(steps)),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        })
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" | "hours" => Ok(Self::Hour),
            "day" | "days" => Ok(Self::Day),
            "week" | "weeks" => Ok(Self::Week),
            "month" | "months" => Ok(Self::Month),
            other => Err(format!("unknown granularity '{}', expected hour, day, week or month", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn period_is_inclusive_on_both_ends() {
        let period = Period::new(at(2025, 1, 1, 0, 0, 0), at(2025, 1, 1, 23, 59, 59));
        assert!(period.contains(at(2025, 1, 1, 0, 0, 0)));
        assert!(period.contains(at(2025, 1, 1, 23, 59, 59)));
        assert!(!period.contains(at(2025, 1, 2, 0, 0, 0)));
    }

    #[test]
    fn standard_periods_relative_to_now() {
        let now = at(2025, 3, 12, 15, 30, 0);
        let offset = utc();

        let today = StandardPeriod::Today.bounds(now, &offset);
        assert_eq!(today.start, at(2025, 3, 12, 0, 0, 0));
        assert_eq!(today.end, at(2025, 3, 13, 0, 0, 0) - Duration::milliseconds(1));

        let yesterday = StandardPeriod::Yesterday.bounds(now, &offset);
        assert_eq!(yesterday.start, at(2025, 3, 11, 0, 0, 0));

        let week = StandardPeriod::ThisWeek.bounds(now, &offset);
        assert_eq!(week.start, at(2025, 3, 6, 0, 0, 0));
        assert_eq!(week.end, today.end);

        let month = StandardPeriod::ThisMonth.bounds(now, &offset);
        assert_eq!(month.start, at(2025, 3, 1, 0, 0, 0));
        assert_eq!(month.end, today.end);
    }

    #[test]
    fn day_boundaries_follow_offset() {
        // 03:00 UTC is still the previous evening at -07:00
        let now = at(2025, 3, 12, 3, 0, 0);
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();

        let today = StandardPeriod::Today.bounds(now, &offset);
        assert_eq!(today.start, at(2025, 3, 11, 7, 0, 0));
    }

    #[test]
    fn previous_week_does_not_overlap() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let this_week = trailing_week(today, 0, &utc());
        let last_week = trailing_week(today, 1, &utc());
        assert!(last_week.end < this_week.start);
        assert_eq!(last_week.start, at(2025, 3, 1, 0, 0, 0));
    }

    #[test]
    fn month_advance_clamps() {
        let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let feb = Granularity::Month.advance(jan31, 1).unwrap();
        assert_eq!(feb.date(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn granularity_parses() {
        assert_eq!("Week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("fortnight".parse::<Granularity>().is_err());
    }
}
