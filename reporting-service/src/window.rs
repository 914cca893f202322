//! Wall-clock relative time windows.
//!
//! Windows are not calendar aligned: "weekly" means the 7 days ending now.
//! Readings dated after `now` are excluded, as are readings whose timestamp
//! does not parse.

use std::fmt;
use std::str::FromStr;

use sems_client::domain::MeterReading;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::aggregate::{Granularity, UnknownVariant};

/// Dashboard timeframe selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Daily => Duration::hours(24),
            Self::Weekly => Duration::days(7),
            Self::Monthly => Duration::days(30),
            Self::Yearly => Duration::days(365),
        }
    }

    pub fn default_granularity(&self) -> Granularity {
        match self {
            Self::Daily => Granularity::Hour,
            Self::Weekly | Self::Monthly => Granularity::Day,
            Self::Yearly => Granularity::Month,
        }
    }

    pub fn filter(&self, readings: &[MeterReading]) -> Vec<MeterReading> {
        filter_window(readings, self.duration(), OffsetDateTime::now_utc())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(UnknownVariant {
                kind: "timeframe",
                value: s.to_string(),
            }),
        }
    }
}

/// Report page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "6-month")]
    SixMonth,
    #[serde(rename = "yearly")]
    Yearly,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::SixMonth => "6-month",
            Self::Yearly => "yearly",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Monthly => Duration::days(30),
            Self::SixMonth => Duration::days(180),
            Self::Yearly => Duration::days(365),
        }
    }

    pub fn default_granularity(&self) -> Granularity {
        match self {
            Self::Monthly => Granularity::Day,
            Self::SixMonth => Granularity::Week,
            Self::Yearly => Granularity::Month,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly Energy Report",
            Self::SixMonth => "6-Month Energy Report",
            Self::Yearly => "Yearly Energy Report",
        }
    }

    pub fn filter(&self, readings: &[MeterReading]) -> Vec<MeterReading> {
        filter_window(readings, self.duration(), OffsetDateTime::now_utc())
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "6-month" | "six-month" | "6month" => Ok(Self::SixMonth),
            "yearly" => Ok(Self::Yearly),
            _ => Err(UnknownVariant {
                kind: "report type",
                value: s.to_string(),
            }),
        }
    }
}

/// Either kind of window, for code that handles both dashboard and report pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Window {
    Timeframe(Timeframe),
    Report(ReportType),
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeframe(t) => t.as_str(),
            Self::Report(r) => r.as_str(),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Timeframe(t) => t.duration(),
            Self::Report(r) => r.duration(),
        }
    }

    pub fn default_granularity(&self) -> Granularity {
        match self {
            Self::Timeframe(t) => t.default_granularity(),
            Self::Report(r) => r.default_granularity(),
        }
    }
}

impl From<Timeframe> for Window {
    fn from(t: Timeframe) -> Self {
        Self::Timeframe(t)
    }
}

impl From<ReportType> for Window {
    fn from(r: ReportType) -> Self {
        Self::Report(r)
    }
}

impl FromStr for Window {
    type Err = UnknownVariant;

    /// Timeframe names win over report names ("monthly" is both and the windows agree).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Timeframe>()
            .map(Window::Timeframe)
            .or_else(|_| s.parse::<ReportType>().map(Window::Report))
            .map_err(|_| UnknownVariant {
                kind: "window",
                value: s.to_string(),
            })
    }
}

/// Readings whose timestamp lies in `[now - window, now]`.
pub fn filter_window(readings: &[MeterReading], window: Duration, now: OffsetDateTime) -> Vec<MeterReading> {
    let start = now - window;
    readings
        .iter()
        .filter(|r| r.timestamp().is_some_and(|ts| ts >= start && ts <= now))
        .cloned()
        .collect()
}

/// Day-count window used for totals.
pub fn filter_last_days(readings: &[MeterReading], days: u32, now: OffsetDateTime) -> Vec<MeterReading> {
    filter_window(readings, Duration::days(i64::from(days)), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn at(ts: &str) -> MeterReading {
        MeterReading::new(1, 1, ts)
    }

    #[test]
    fn daily_window_is_last_24_hours() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let readings = vec![
            at("2024-06-09T11:59:59Z"),
            at("2024-06-09T12:00:00Z"),
            at("2024-06-10T11:00:00Z"),
            at("2024-06-10T12:00:00Z"),
        ];

        let kept = filter_window(&readings, Timeframe::Daily.duration(), now);

        let times: Vec<&str> = kept.iter().map(|r| r.time_value.as_str()).collect();
        assert_eq!(
            times,
            vec!["2024-06-09T12:00:00Z", "2024-06-10T11:00:00Z", "2024-06-10T12:00:00Z"]
        );
    }

    #[test]
    fn future_and_invalid_readings_are_excluded() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let readings = vec![at("2024-06-10T12:00:01Z"), at("yesterday"), at("2024-06-10T10:00:00Z")];

        let kept = filter_window(&readings, Duration::days(7), now);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].time_value, "2024-06-10T10:00:00Z");
    }

    #[test]
    fn same_instant_gives_same_subset() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let readings = vec![at("2024-06-01T00:00:00Z"), at("2024-05-01T00:00:00Z")];

        let a = filter_window(&readings, ReportType::Monthly.duration(), now);
        let b = filter_window(&readings, ReportType::Monthly.duration(), now);

        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn last_days_window() {
        let now = datetime!(2024-06-10 00:00 UTC);
        let readings = vec![at("2024-06-03T00:00:00Z"), at("2024-06-02T23:59:59Z")];

        assert_eq!(filter_last_days(&readings, 7, now).len(), 1);
        assert!(filter_last_days(&readings, 0, now).is_empty());
    }

    #[test]
    fn window_durations() {
        assert_eq!(Timeframe::Weekly.duration(), Duration::days(7));
        assert_eq!(Timeframe::Monthly.duration(), Duration::days(30));
        assert_eq!(Timeframe::Yearly.duration(), Duration::days(365));
        assert_eq!(ReportType::SixMonth.duration(), Duration::days(180));
    }

    #[test]
    fn parses_names() {
        assert_eq!("weekly".parse::<Timeframe>(), Ok(Timeframe::Weekly));
        assert_eq!("6-month".parse::<ReportType>(), Ok(ReportType::SixMonth));
        assert_eq!("6-month".parse::<Window>(), Ok(Window::Report(ReportType::SixMonth)));
        assert_eq!("daily".parse::<Window>(), Ok(Window::Timeframe(Timeframe::Daily)));
        assert!("hourly".parse::<Window>().is_err());
    }
}
