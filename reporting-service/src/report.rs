use sems_client::domain::MeterReading;
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::aggregate::{aggregate_in, AggregatedData, Granularity};
use crate::stats::{summarize, UsageSummary};
use crate::window::{filter_window, Window};

/// A windowed, bucketed view of readings plus its summary tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub title: String,
    pub window: Window,
    pub granularity: Granularity,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub buckets: Vec<AggregatedData>,
    pub summary: UsageSummary,
}

fn title_for(window: Window) -> String {
    match window {
        Window::Report(r) => r.title().to_string(),
        Window::Timeframe(t) => {
            let name = t.as_str();
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => format!("{}{} Energy Usage", first.to_ascii_uppercase(), chars.as_str()),
                None => "Energy Usage".to_string(),
            }
        }
    }
}

/// Filter `readings` to `window` ending at `now`, bucket them and compute
/// the summary over the same filtered set.
pub fn build_usage_report(
    readings: &[MeterReading],
    window: Window,
    granularity: Option<Granularity>,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> UsageReport {
    let granularity = granularity.unwrap_or_else(|| window.default_granularity());
    let recent = filter_window(readings, window.duration(), now);
    let days = u32::try_from(window.duration().whole_days().max(1)).unwrap_or(u32::MAX);

    let buckets = aggregate_in(&recent, granularity, offset);
    let summary = summarize(&recent, days, now, offset);

    tracing::debug!(
        window = window.as_str(),
        %granularity,
        readings = recent.len(),
        buckets = buckets.len(),
        "usage report built"
    );

    UsageReport {
        title: title_for(window),
        window,
        granularity,
        generated_at: now,
        buckets,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::NOT_AVAILABLE;
    use crate::window::{ReportType, Timeframe};
    use time::macros::datetime;

    fn at(id: i64, ts: &str) -> MeterReading {
        MeterReading::new(id, 1, ts)
    }

    #[test]
    fn daily_report_buckets_by_hour_inside_the_window() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let readings = vec![
            at(1, "2024-06-10T09:15:00Z").with_consumption(1.0).with_power(100.0),
            at(2, "2024-06-10T09:45:00Z").with_consumption(2.0).with_power(300.0),
            at(3, "2024-06-08T09:00:00Z").with_consumption(50.0),
            at(4, "2024-06-11T09:00:00Z").with_consumption(50.0),
        ];

        let report = build_usage_report(&readings, Timeframe::Daily.into(), None, now, UtcOffset::UTC);

        assert_eq!(report.title, "Daily Energy Usage");
        assert_eq!(report.granularity, Granularity::Hour);
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].date, "09:00");
        assert_eq!(report.buckets[0].consumption, 3.0);
        assert_eq!(report.buckets[0].power, 200.0);
        assert_eq!(report.summary.reading_count, 2);
        assert_eq!(report.summary.totals.days, 1);
        assert_eq!(report.summary.totals.total_consumption, 3.0);
        assert_eq!(report.summary.peak_usage_time, "9:00 - 10:00");
    }

    #[test]
    fn explicit_granularity_overrides_default() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let readings = vec![at(1, "2024-06-01T09:00:00Z"), at(2, "2024-06-09T09:00:00Z")];

        let report = build_usage_report(
            &readings,
            ReportType::Monthly.into(),
            Some(Granularity::Month),
            now,
            UtcOffset::UTC,
        );

        assert_eq!(report.title, "Monthly Energy Report");
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].date, "Jun 2024");
        assert_eq!(report.buckets[0].count, 2);
    }

    #[test]
    fn empty_window_yields_empty_report() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let report = build_usage_report(&[], ReportType::SixMonth.into(), None, now, UtcOffset::UTC);

        assert!(report.buckets.is_empty());
        assert_eq!(report.summary.peak_usage_time, NOT_AVAILABLE);
        assert_eq!(report.summary.efficiency_rating, 0.0);
        assert_eq!(report.summary.totals.total_consumption, 0.0);
    }

    #[test]
    fn serializes_window_and_timestamp() {
        let now = datetime!(2024-06-10 12:00 UTC);
        let report = build_usage_report(&[], Timeframe::Weekly.into(), None, now, UtcOffset::UTC);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["window"], "weekly");
        assert_eq!(json["granularity"], "day");
        assert_eq!(json["generatedAt"], "2024-06-10T12:00:00Z");
    }
}
