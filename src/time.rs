//! Timezone-naive time values measured in seconds since the Unix epoch.
//!
//! Every value is interpreted as UTC. Persistence collaborators exchange times as
//! ISO-8601 basic strings (`YYYYMMDDTHHMMSSZ`), see [`time_to_string`] and
//! [`time_from_string`].

use crate::error::ScheduleError;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;

const ISO_BASIC_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeValue(i64);

/// Calendar units a [`TimeValue`] can be aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl TimeValue {
    /// 1970-01-01T00:00:00Z
    pub const MIN: TimeValue = TimeValue(0);
    /// 9999-12-31T23:59:59Z
    pub const MAX: TimeValue = TimeValue(253_402_300_799);
    /// Returned by [`time_from_string`] when the input cannot be parsed.
    pub const INVALID: TimeValue = TimeValue(-1);

    /// Returns `None` when `seconds` falls outside the valid range.
    pub fn new(seconds: i64) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&seconds)
            .then_some(Self(seconds))
    }

    /// Clamps `seconds` into the valid range.
    pub fn saturating(seconds: i64) -> Self {
        Self(seconds.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        (Self::MIN.0..=Self::MAX.0).contains(&self.0)
    }

    /// Adds a signed offset, clamping at the ends of the valid range.
    pub fn offset(self, seconds: i64) -> Self {
        Self::saturating(self.0.saturating_add(seconds))
    }

    pub fn compose(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .and_then(Self::from_datetime)
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::from_datetime(date.and_time(NaiveTime::MIN))
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Option<Self> {
        Self::new(datetime.and_utc().timestamp())
    }

    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        if !self.is_valid() {
            return None;
        }
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.naive_utc())
    }

    /// Splits the value into `(year, month, day, hour, minute, second)`.
    pub fn decompose(self) -> Option<(i32, u32, u32, u32, u32, u32)> {
        self.to_datetime().map(|dt| {
            (
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
            )
        })
    }

    pub fn date(self) -> NaiveDate {
        self.to_datetime()
            .map(|dt| dt.date())
            .unwrap_or_default()
    }

    pub fn seconds_of_day(self) -> i64 {
        self.0.rem_euclid(SECONDS_PER_DAY)
    }

    /// Midnight of the day containing this value.
    pub fn day_start(self) -> Self {
        Self(self.0 - self.seconds_of_day())
    }

    /// 0 = Sunday .. 6 = Saturday
    pub fn weekday(self) -> u32 {
        self.date().weekday().num_days_from_sunday()
    }

    /// Start of the `unit` containing this value. Weeks start on Monday.
    pub fn align_prev(self, unit: TimeUnit) -> Self {
        let date = self.date();
        let aligned = match unit {
            TimeUnit::Hour => return Self(self.0 - self.0.rem_euclid(SECONDS_PER_HOUR)),
            TimeUnit::Day => return self.day_start(),
            TimeUnit::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TimeUnit::Month => first_of_month(date.year(), date.month()),
            TimeUnit::Quarter => first_of_month(date.year(), (date.month() - 1) / 3 * 3 + 1),
            TimeUnit::HalfYear => {
                first_of_month(date.year(), if date.month() <= 6 { 1 } else { 7 })
            }
            TimeUnit::Year => first_of_month(date.year(), 1),
        };
        Self::from_date(aligned).unwrap_or(Self::MIN)
    }

    /// Start of the next `unit` boundary at or after this value.
    pub fn align_next(self, unit: TimeUnit) -> Self {
        let floor = self.align_prev(unit);
        if floor == self {
            return self;
        }
        let months = match unit {
            TimeUnit::Hour => return floor.offset(SECONDS_PER_HOUR),
            TimeUnit::Day => return floor.offset(SECONDS_PER_DAY),
            TimeUnit::Week => return floor.offset(7 * SECONDS_PER_DAY),
            TimeUnit::Month => 1,
            TimeUnit::Quarter => 3,
            TimeUnit::HalfYear => 6,
            TimeUnit::Year => 12,
        };
        floor
            .date()
            .checked_add_months(Months::new(months))
            .and_then(Self::from_date)
            .unwrap_or(Self::MAX)
    }

    /// Formats with a chrono strftime pattern; invalid values format as an empty string.
    pub fn format(self, pattern: &str) -> String {
        self.to_datetime()
            .map(|dt| dt.format(pattern).to_string())
            .unwrap_or_default()
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

impl Default for TimeValue {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(&self.format("%Y-%m-%d %H:%M:%S"))
        } else {
            f.write_str("invalid")
        }
    }
}

impl FromStr for TimeValue {
    type Err = ScheduleError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let parsed = if trimmed.len() <= 10 {
            NaiveDate::parse_from_str(trimmed, "%Y%m%d")
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
                .map(|date| date.and_time(NaiveTime::MIN))
        } else {
            let body = trimmed.strip_suffix('Z').unwrap_or(trimmed);
            NaiveDateTime::parse_from_str(body, ISO_BASIC_FORMAT)
        };
        parsed
            .ok()
            .and_then(Self::from_datetime)
            .ok_or_else(|| ScheduleError::InvalidTimeString(input.to_string()))
    }
}

/// Formats `time` as `YYYYMMDDTHHMMSSZ`.
pub fn time_to_string(time: TimeValue) -> String {
    if !time.is_valid() {
        return String::new();
    }
    format!("{}Z", time.format(ISO_BASIC_FORMAT))
}

/// Parses an ISO-8601 basic string, returning [`TimeValue::INVALID`] on failure.
///
/// Date-only input (ten characters or fewer) is taken as midnight UTC.
pub fn time_from_string(input: &str) -> TimeValue {
    match input.parse::<TimeValue>() {
        Ok(time) => time,
        Err(err) => {
            warn!(%err, "rejecting malformed time string");
            TimeValue::INVALID
        }
    }
}
