//! Time window resolution
//!
//! Turns a range selector into concrete start/end instants in the
//! reporting timezone, and derives the equivalent prior-period window for
//! comparison. The reporting timezone is an explicit configuration value,
//! injected wherever "today" matters.

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::EngineError;

/// Timestamp format used throughout the store
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Number of trailing days covered by the chart superset
pub const CHART_WINDOW_DAYS: i64 = 90;

/// Fixed reporting timezone configuration
///
/// All day boundaries ("today", week anchors, bucket dates) are computed in
/// this offset. Defaults to UTC; configurable via `HMT_UTC_OFFSET_MINUTES`.
#[derive(Debug, Clone, Copy)]
pub struct ReportingZone {
    offset: FixedOffset,
}

impl ReportingZone {
    pub fn utc() -> Self {
        Self {
            offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
        }
    }

    /// Build from a UTC offset in minutes (east positive)
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    /// Read the offset from `HMT_UTC_OFFSET_MINUTES`, falling back to UTC
    pub fn from_env() -> Self {
        std::env::var("HMT_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .and_then(Self::from_offset_minutes)
            .unwrap_or_else(Self::utc)
    }

    /// Current wall-clock time in the reporting timezone
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }

    /// Current calendar date in the reporting timezone
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Range selector for analysis windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSelector {
    /// Trailing 7 days, today included
    Week,
    /// Trailing 30 days
    Month,
    /// Trailing 90 days
    Quarter,
    /// Explicit start/end dates
    Custom,
}

impl RangeSelector {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "week" | "7d" | "7" => Some(RangeSelector::Week),
            "month" | "30d" | "30" => Some(RangeSelector::Month),
            "quarter" | "90d" | "90" | "3m" => Some(RangeSelector::Quarter),
            "custom" => Some(RangeSelector::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSelector::Week => "week",
            RangeSelector::Month => "month",
            RangeSelector::Quarter => "quarter",
            RangeSelector::Custom => "custom",
        }
    }

    /// Window length in days for the keyword selectors
    pub fn days(&self) -> Option<i64> {
        match self {
            RangeSelector::Week => Some(7),
            RangeSelector::Month => Some(30),
            RangeSelector::Quarter => Some(90),
            RangeSelector::Custom => None,
        }
    }
}

/// A concrete analysis window
///
/// Day-aligned: start is 00:00:00 of the first day and end is 23:59:59 of
/// the last day, in the reporting timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Window spanning the given calendar dates, inclusive
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_hms_opt(23, 59, 59).expect("valid end-of-day time"),
        }
    }

    /// Trailing window of `days` calendar days ending today (inclusive)
    pub fn trailing_days(today: NaiveDate, days: i64) -> Self {
        Self::from_dates(today - Duration::days(days - 1), today)
    }

    /// The equivalent prior-period window: identical duration, ending
    /// exactly at this window's start instant.
    pub fn prior(&self) -> Self {
        let duration = self.end - self.start;
        Self {
            start: self.start - duration,
            end: self.start,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Inclusive day count
    pub fn duration_days(&self) -> i64 {
        (self.end_date() - self.start_date()).num_days() + 1
    }

    /// Store-format timestamp for the start instant
    pub fn start_str(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Store-format timestamp for the end instant
    pub fn end_str(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Resolve a selector (plus custom bounds) into a concrete window
///
/// Keyword windows always end today so that today's readings are included.
/// Custom requires both bounds.
pub fn resolve_window(
    selector: RangeSelector,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<TimeWindow, EngineError> {
    match selector.days() {
        Some(days) => Ok(TimeWindow::trailing_days(today, days)),
        None => match (custom_start, custom_end) {
            (Some(start), Some(end)) => Ok(TimeWindow::from_dates(start, end)),
            _ => Err(EngineError::MissingRangeBounds),
        },
    }
}

/// The fixed 90-day superset window used for trend charts, resolved in
/// parallel with whatever window the caller requested.
pub fn chart_window(today: NaiveDate) -> TimeWindow {
    TimeWindow::trailing_days(today, CHART_WINDOW_DAYS)
}
