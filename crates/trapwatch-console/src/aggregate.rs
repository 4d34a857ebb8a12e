//! Event aggregation into gap-free time-bucketed series
//!
//! Pure functions: no I/O, no clock access. The caller supplies `now`, which
//! makes every property here unit-testable.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use trapwatch_core::Event;

/// Selectable window for the time-series view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Last hour, 5-minute buckets
    Hour,
    /// Last 24 hours, 1-hour buckets
    Day,
    /// Last 7 days, 1-day buckets
    Week,
    /// Last 30 days, 1-day buckets (same resolution as week)
    Month,
}

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

impl TimeRange {
    /// All ranges, in selector order
    pub const ALL: [Self; 4] = [Self::Hour, Self::Day, Self::Week, Self::Month];

    /// Window duration in milliseconds
    #[must_use]
    pub const fn window_ms(self) -> i64 {
        match self {
            Self::Hour => HOUR_MS,
            Self::Day => DAY_MS,
            Self::Week => 7 * DAY_MS,
            Self::Month => 30 * DAY_MS,
        }
    }

    /// Bucket width in milliseconds.
    ///
    /// Month intentionally reuses the week's 1-day buckets; a 30-day window at
    /// finer resolution is unreadable on the chart.
    #[must_use]
    pub const fn bucket_ms(self) -> i64 {
        match self {
            Self::Hour => 5 * MINUTE_MS,
            Self::Day => HOUR_MS,
            Self::Week | Self::Month => DAY_MS,
        }
    }

    /// Stable lowercase name, matching the range selector values
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Format a bucket start as a chart label.
    ///
    /// Hour shows time-of-day only, Day shows date and time, Week and Month
    /// show the date only. Labels are rendered in UTC.
    #[must_use]
    pub fn label(self, bucket_start_ms: i64) -> String {
        let datetime: DateTime<Utc> = Utc
            .timestamp_millis_opt(bucket_start_ms)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        match self {
            Self::Hour => datetime.format("%-I:%M %p").to_string(),
            Self::Day => datetime.format("%b %-d, %-I:%M %p").to_string(),
            Self::Week | Self::Month => datetime.format("%b %-d").to_string(),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = trapwatch_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(trapwatch_core::Error::validation(
                "time_range",
                format!("unknown time range '{other}' (expected hour, day, week or month)"),
            )),
        }
    }
}

/// A bucketed event series ready for charting.
///
/// The three vectors are parallel: `counts[i]` is the number of events whose
/// timestamp aligns to `bucket_starts[i]`, labeled `labels[i]`. Regenerated on
/// every refresh, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
    /// Aligned bucket start times, unix milliseconds, strictly ascending
    pub bucket_starts: Vec<i64>,
    /// Range-specific label per bucket
    pub labels: Vec<String>,
    /// Event count per bucket
    pub counts: Vec<u64>,
}

impl TimeSeries {
    /// Number of buckets in the series
    #[must_use]
    pub fn len(&self) -> usize {
        self.bucket_starts.len()
    }

    /// Whether the series holds no buckets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bucket_starts.is_empty()
    }

    /// Sum of all bucket counts
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Align a timestamp down to its bucket start
const fn align(timestamp_ms: i64, bucket_ms: i64) -> i64 {
    timestamp_ms.div_euclid(bucket_ms) * bucket_ms
}

/// Aggregate raw events into a gap-free bucketed series over `[cutoff, now]`.
///
/// Every aligned bucket in the window is pre-seeded at zero, so the chart
/// never shows gaps for quiet periods. Events before the cutoff are excluded;
/// events with timestamps in the future relative to `now` (client clock skew)
/// are still bucketed rather than clamped or dropped, which may extend the
/// series past `now`.
#[must_use]
pub fn aggregate(events: &[Event], range: TimeRange, now: DateTime<Utc>) -> TimeSeries {
    let now_ms = now.timestamp_millis();
    let bucket_ms = range.bucket_ms();
    let cutoff_ms = now_ms - range.window_ms();

    let mut buckets: BTreeMap<i64, u64> = BTreeMap::new();

    // Pre-seed the full window so zero-count buckets still appear.
    let mut t = cutoff_ms;
    while t <= now_ms {
        buckets.insert(align(t, bucket_ms), 0);
        t += bucket_ms;
    }

    for event in events {
        let event_ms = i64::try_from(event.ts)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        if event_ms < cutoff_ms {
            continue;
        }
        *buckets.entry(align(event_ms, bucket_ms)).or_insert(0) += 1;
    }

    let mut series = TimeSeries {
        bucket_starts: Vec::with_capacity(buckets.len()),
        labels: Vec::with_capacity(buckets.len()),
        counts: Vec::with_capacity(buckets.len()),
    };
    for (start, count) in buckets {
        series.bucket_starts.push(start);
        series.labels.push(range.label(start));
        series.counts.push(count);
    }
    series
}
