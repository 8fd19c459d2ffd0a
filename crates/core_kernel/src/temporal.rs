//! Date ranges and time zones for billing periods
//!
//! Reports are requested for whole calendar days. A [`DateRange`] names the
//! first and last day (both inclusive) together with the time zone those days
//! are read in, and turns them into UTC instant bounds for filtering.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper used to interpret report days
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(s.to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Returns the IANA name of the zone
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(chrono::NaiveTime::MIN), true)
    }

    /// Gets the end of day (23:59:59.999999999) in this timezone as UTC
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let last = date
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
        self.resolve_local(last, false)
    }

    /// Returns the calendar day an instant falls on in this timezone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    // A wall-clock time inside a DST gap never happens; the day then starts at
    // the first instant after the gap and ends at the last instant before it.
    fn resolve_local(&self, local: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
        let step = Duration::minutes(if earliest { 1 } else { -1 });
        let mut candidate = local;
        for _ in 0..MAX_GAP_STEPS {
            match self.0.from_local_datetime(&candidate) {
                LocalResult::Single(t) => return t.with_timezone(&Utc),
                LocalResult::Ambiguous(a, b) => {
                    let t = if earliest { a } else { b };
                    return t.with_timezone(&Utc);
                }
                LocalResult::None => candidate += step,
            }
        }
        local.and_utc()
    }
}

/// Minutes walked out of a DST gap; two days covers zones that skipped a whole date
const MAX_GAP_STEPS: usize = 2 * 24 * 60;

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Missing date range bound: {0}")]
    MissingBound(&'static str),

    #[error("Invalid {bound} date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        bound: &'static str,
        value: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// An inclusive range of calendar days read in a given timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub timezone: Timezone,
}

impl DateRange {
    /// Creates a range read in UTC
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        Self::with_timezone(start, end, Timezone::default())
    }

    pub fn with_timezone(
        start: NaiveDate,
        end: NaiveDate,
        timezone: Timezone,
    ) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end, timezone })
    }

    /// Builds a range from optional request bounds, failing on either one missing
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        timezone: Timezone,
    ) -> Result<Self, TemporalError> {
        let start = start.ok_or(TemporalError::MissingBound("from"))?;
        let end = end.ok_or(TemporalError::MissingBound("to"))?;
        Self::with_timezone(start, end, timezone)
    }

    /// Parses a `YYYY-MM-DD` request bound
    pub fn parse_bound(bound: &'static str, value: &str) -> Result<NaiveDate, TemporalError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| TemporalError::InvalidDate {
            bound,
            value: value.to_string(),
        })
    }

    /// First instant of the range
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.timezone.start_of_day(self.start)
    }

    /// Last instant of the range
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.timezone.end_of_day(self.end)
    }

    /// Returns true if the instant falls on one of the range's days
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.starts_at() && instant <= self.ends_at()
    }
}
