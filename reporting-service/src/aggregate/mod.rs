//! Time-bucketed aggregation of meter readings.
//!
//! Additive quantities (consumption, cost) are summed per bucket; intensive
//! quantities (power, voltage, current, power factor) are averaged over the
//! readings in the bucket. Readings whose timestamp cannot be parsed are
//! skipped.

mod bucket;

use std::collections::BTreeMap;

use sems_client::domain::MeterReading;
use serde::Serialize;
use time::UtcOffset;

pub use bucket::{iso_date, month_abbrev, BucketKey, Granularity, UnknownVariant};

/// One output bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedData {
    pub date: String,
    pub consumption: f64,
    pub cost: f64,
    pub power: f64,
    pub voltage: f64,
    pub current: f64,
    pub power_factor: f64,
    pub count: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    consumption: f64,
    cost: f64,
    power: f64,
    voltage: f64,
    current: f64,
    power_factor: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, r: &MeterReading) {
        self.consumption += r.consumption();
        self.cost += r.cost();
        self.power += r.power();
        self.voltage += r.voltage();
        self.current += r.current();
        self.power_factor += r.power_factor();
        self.count += 1;
    }

    fn finish(self, key: &BucketKey) -> AggregatedData {
        let mean = |sum: f64| {
            if self.count == 0 {
                0.0
            } else {
                sum / self.count as f64
            }
        };

        AggregatedData {
            date: key.label(),
            consumption: self.consumption,
            cost: self.cost,
            power: mean(self.power),
            voltage: mean(self.voltage),
            current: mean(self.current),
            power_factor: mean(self.power_factor),
            count: self.count,
        }
    }
}

/// Buckets with their sort keys, in ascending key order.
pub fn aggregate_keyed(
    readings: &[MeterReading],
    granularity: Granularity,
    offset: UtcOffset,
) -> Vec<(BucketKey, AggregatedData)> {
    let mut buckets: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();

    for reading in readings {
        let Some(key) = reading
            .timestamp()
            .and_then(|ts| BucketKey::for_instant(ts, granularity, offset))
        else {
            tracing::trace!(id = reading.id, time_value = %reading.time_value, "skipping reading with unparseable timestamp");
            continue;
        };
        buckets.entry(key).or_default().add(reading);
    }

    buckets
        .into_iter()
        .map(|(key, acc)| {
            let data = acc.finish(&key);
            (key, data)
        })
        .collect()
}

/// Aggregate in a given UTC offset; output is sorted chronologically.
pub fn aggregate_in(
    readings: &[MeterReading],
    granularity: Granularity,
    offset: UtcOffset,
) -> Vec<AggregatedData> {
    aggregate_keyed(readings, granularity, offset)
        .into_iter()
        .map(|(_, data)| data)
        .collect()
}

pub fn aggregate(readings: &[MeterReading], granularity: Granularity) -> Vec<AggregatedData> {
    aggregate_in(readings, granularity, UtcOffset::UTC)
}

pub fn group_by_hour(readings: &[MeterReading]) -> Vec<AggregatedData> {
    aggregate(readings, Granularity::Hour)
}

pub fn group_by_day(readings: &[MeterReading]) -> Vec<AggregatedData> {
    aggregate(readings, Granularity::Day)
}

pub fn group_by_week(readings: &[MeterReading]) -> Vec<AggregatedData> {
    aggregate(readings, Granularity::Week)
}

pub fn group_by_month(readings: &[MeterReading]) -> Vec<AggregatedData> {
    aggregate(readings, Granularity::Month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: &str) -> MeterReading {
        MeterReading::new(1, 1, ts)
    }

    #[test]
    fn hour_buckets_sum_and_average() {
        let readings = vec![
            reading("2024-01-01T09:15:00Z").with_consumption(1.0).with_power(100.0),
            reading("2024-01-01T09:45:00Z").with_consumption(2.0).with_power(200.0),
            reading("2024-01-01T10:05:00Z").with_consumption(3.0).with_power(300.0),
        ];

        let out = group_by_hour(&readings);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, "09:00");
        assert_eq!(out[0].consumption, 3.0);
        assert_eq!(out[0].power, 150.0);
        assert_eq!(out[0].count, 2);
        assert_eq!(out[1].date, "10:00");
        assert_eq!(out[1].consumption, 3.0);
        assert_eq!(out[1].power, 300.0);
        assert_eq!(out[1].count, 1);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(group_by_day(&[]).is_empty());
        assert!(group_by_month(&[]).is_empty());
    }

    #[test]
    fn unparseable_timestamps_are_skipped() {
        let readings = vec![
            reading("garbage").with_consumption(99.0),
            reading("2024-01-01T00:00:00Z").with_consumption(1.0),
        ];

        let out = group_by_day(&readings);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].consumption, 1.0);
        assert_eq!(out[0].count, 1);
    }

    #[test]
    fn missing_values_count_as_zero_but_still_count() {
        let readings = vec![
            reading("2024-01-01T00:00:00Z").with_power(100.0).with_cost(5.0),
            reading("2024-01-01T01:00:00Z"),
        ];

        let out = group_by_day(&readings);

        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].power, 50.0);
        assert_eq!(out[0].cost, 5.0);
    }

    #[test]
    fn output_is_chronological_not_lexicographic() {
        // "Dec 2023" > "Jan 2024" lexicographically, but must come first.
        let readings = vec![
            reading("2024-01-10T00:00:00Z").with_consumption(1.0),
            reading("2023-12-10T00:00:00Z").with_consumption(2.0),
            reading("2024-02-10T00:00:00Z").with_consumption(3.0),
        ];

        let labels: Vec<String> = group_by_month(&readings).into_iter().map(|b| b.date).collect();
        assert_eq!(labels, vec!["Dec 2023", "Jan 2024", "Feb 2024"]);
    }

    #[test]
    fn day_labels_sort_by_date_across_months() {
        let readings = vec![
            reading("2024-02-01T00:00:00Z"),
            reading("2024-01-31T00:00:00Z"),
        ];

        let labels: Vec<String> = group_by_day(&readings).into_iter().map(|b| b.date).collect();
        assert_eq!(labels, vec!["Jan 31", "Feb 1"]);
    }

    #[test]
    fn week_grouping_uses_iso_monday() {
        let readings = vec![
            reading("2024-01-01T08:00:00Z").with_consumption(1.0), // Monday
            reading("2024-01-07T20:00:00Z").with_consumption(1.0), // Sunday, same week
            reading("2024-01-08T08:00:00Z").with_consumption(1.0), // next Monday
        ];

        let out = group_by_week(&readings);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, "Week of 2024-01-01");
        assert_eq!(out[0].count, 2);
        assert_eq!(out[1].date, "Week of 2024-01-08");
    }

    #[test]
    fn keyed_output_exposes_sort_keys() {
        let readings = vec![reading("2024-05-06T13:20:00Z")];
        let keyed = aggregate_keyed(&readings, Granularity::Hour, UtcOffset::UTC);

        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed[0].0.to_string(), "2024-05-06-13");
        assert_eq!(keyed[0].1.date, "13:00");
    }

    #[test]
    fn input_is_not_mutated_and_result_is_repeatable() {
        let readings = vec![
            reading("2024-01-01T09:15:00Z").with_power(10.0),
            reading("2024-01-02T09:15:00Z").with_power(30.0),
        ];
        let before = readings.clone();

        let first = group_by_day(&readings);
        let second = group_by_day(&readings);

        assert_eq!(first, second);
        assert_eq!(readings, before);
    }

    #[test]
    fn readings_shifted_past_the_calendar_range_are_skipped() {
        let readings = vec![
            reading("9999-12-31T23:00:00Z").with_consumption(5.0),
            reading("2024-01-01T09:15:00Z").with_consumption(1.0),
        ];

        let buckets = aggregate_in(&readings, Granularity::Day, time::macros::offset!(+7));

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, "Jan 1");
        assert_eq!(buckets[0].consumption, 1.0);
    }
}
