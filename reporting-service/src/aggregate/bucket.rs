use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Returned when a symbolic name (granularity, timeframe, report type) is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(Self::Hour),
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(UnknownVariant {
                kind: "granularity",
                value: s.to_string(),
            }),
        }
    }
}

/// Sort key of an aggregation bucket: the local start of the calendar
/// period the reading falls into.
///
/// Ordering follows `start`, so buckets sort chronologically regardless of
/// how their labels read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    start: PrimitiveDateTime,
    granularity: Granularity,
}

impl BucketKey {
    /// Bucket containing `ts` once shifted into `offset`; `None` when the
    /// shifted instant falls outside the representable date range.
    ///
    /// Weeks start on Monday (ISO weeks): a Sunday belongs to the week of the
    /// preceding Monday.
    pub fn for_instant(ts: OffsetDateTime, granularity: Granularity, offset: UtcOffset) -> Option<Self> {
        let local = ts.checked_to_offset(offset)?;
        let date = local.date();

        let start = match granularity {
            Granularity::Hour => date.with_hms(local.hour(), 0, 0).ok()?,
            Granularity::Day => date.midnight(),
            Granularity::Week => {
                let back = i64::from(date.weekday().number_days_from_monday());
                date.checked_sub(Duration::days(back))?.midnight()
            }
            Granularity::Month => Date::from_calendar_date(date.year(), date.month(), 1)
                .ok()?
                .midnight(),
        };

        Some(Self { start, granularity })
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Human label shown on charts and exports.
    pub fn label(&self) -> String {
        let date = self.start.date();
        match self.granularity {
            Granularity::Hour => format!("{:02}:00", self.start.hour()),
            Granularity::Day => format!("{} {}", month_abbrev(date.month()), date.day()),
            Granularity::Week => format!("Week of {}", iso_date(date)),
            Granularity::Month => format!("{} {}", month_abbrev(date.month()), date.year()),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.start.date();
        match self.granularity {
            Granularity::Hour => write!(f, "{}-{:02}", iso_date(date), self.start.hour()),
            Granularity::Day | Granularity::Week => f.write_str(&iso_date(date)),
            Granularity::Month => write!(f, "{:04}-{:02}", date.year(), u8::from(date.month())),
        }
    }
}

/// `YYYY-MM-DD`.
pub fn iso_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

pub fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
