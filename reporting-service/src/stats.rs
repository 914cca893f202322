//! Summary scalars for dashboard tiles.

use std::ops::RangeInclusive;

use sems_client::domain::MeterReading;
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::window::filter_last_days;

pub const NOT_AVAILABLE: &str = "N/A";

pub const POWER_FACTOR_WEIGHT: f64 = 40.0;
pub const LOAD_BALANCE_WEIGHT: f64 = 30.0;
pub const CONSUMPTION_RATE_WEIGHT: f64 = 30.0;

/// Stand-in for the allocated-vs-consumed ratio, which is not available
/// from meter readings alone.
pub const CONSUMPTION_RATE_PLACEHOLDER: f64 = 0.8;

/// Hours of day counted as peak load (09:00 - 20:59).
pub const PEAK_HOURS: RangeInclusive<u8> = 9..=20;

/// Hour of day of `r` in `offset`. Unparseable timestamps and instants that
/// cannot be shifted into `offset` give `None`.
fn local_hour(r: &MeterReading, offset: UtcOffset) -> Option<u8> {
    r.timestamp()?.checked_to_offset(offset).map(|t| t.hour())
}

/// Mean power per hour of day (0-23), collapsing calendar days.
/// `None` for hours without readings.
pub fn hourly_mean_power(readings: &[MeterReading], offset: UtcOffset) -> [Option<f64>; 24] {
    let mut sums = [(0.0_f64, 0_usize); 24];

    for r in readings {
        let Some(hour) = local_hour(r, offset) else {
            continue;
        };
        let slot = &mut sums[usize::from(hour)];
        slot.0 += r.power();
        slot.1 += 1;
    }

    sums.map(|(sum, count)| if count == 0 { None } else { Some(sum / count as f64) })
}

/// Hour with the highest mean power. The first hour wins ties; hours whose
/// mean is not positive never qualify.
pub fn peak_usage_hour(readings: &[MeterReading], offset: UtcOffset) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    for (hour, mean) in hourly_mean_power(readings, offset).into_iter().enumerate() {
        let Some(mean) = mean else { continue };
        if mean > 0.0 && best.map_or(true, |(_, m)| mean > m) {
            best = Some((hour as u8, mean));
        }
    }
    best.map(|(hour, _)| hour)
}

/// Hour with the lowest mean power, ignoring hours whose mean is exactly 0.
/// The first hour wins ties.
pub fn lowest_usage_hour(readings: &[MeterReading], offset: UtcOffset) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    for (hour, mean) in hourly_mean_power(readings, offset).into_iter().enumerate() {
        let Some(mean) = mean else { continue };
        if mean != 0.0 && best.map_or(true, |(_, m)| mean < m) {
            best = Some((hour as u8, mean));
        }
    }
    best.map(|(hour, _)| hour)
}

/// `"H:00 - H+1:00"`.
pub fn format_hour_range(hour: u8) -> String {
    format!("{}:00 - {}:00", hour, u16::from(hour) + 1)
}

pub fn peak_usage_time(readings: &[MeterReading]) -> String {
    peak_usage_time_in(readings, UtcOffset::UTC)
}

pub fn peak_usage_time_in(readings: &[MeterReading], offset: UtcOffset) -> String {
    peak_usage_hour(readings, offset)
        .map(format_hour_range)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn lowest_usage_time(readings: &[MeterReading]) -> String {
    lowest_usage_time_in(readings, UtcOffset::UTC)
}

pub fn lowest_usage_time_in(readings: &[MeterReading], offset: UtcOffset) -> String {
    lowest_usage_hour(readings, offset)
        .map(format_hour_range)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Mean power during peak and off-peak hours, `0.0` for an empty group.
fn peak_off_peak_means(readings: &[MeterReading], offset: UtcOffset) -> (f64, f64) {
    let (mut peak_sum, mut peak_n) = (0.0, 0_usize);
    let (mut off_sum, mut off_n) = (0.0, 0_usize);

    for r in readings {
        let Some(hour) = local_hour(r, offset) else {
            continue;
        };
        if PEAK_HOURS.contains(&hour) {
            peak_sum += r.power();
            peak_n += 1;
        } else {
            off_sum += r.power();
            off_n += 1;
        }
    }

    let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { sum / n as f64 };
    (mean(peak_sum, peak_n), mean(off_sum, off_n))
}

/// Heuristic 0-100 efficiency score.
///
/// Power factor contributes up to 40 points, peak/off-peak load balance up
/// to 30, and the consumption-rate component is the fixed placeholder
/// `30 * 0.8`. Empty input scores 0.
pub fn efficiency_rating(readings: &[MeterReading]) -> f64 {
    efficiency_rating_in(readings, UtcOffset::UTC)
}

pub fn efficiency_rating_in(readings: &[MeterReading], offset: UtcOffset) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }

    let mean_pf = readings.iter().map(MeterReading::power_factor).sum::<f64>() / readings.len() as f64;
    let pf_score = (mean_pf / 1.0).min(1.0) * POWER_FACTOR_WEIGHT;

    let (peak_mean, off_peak_mean) = peak_off_peak_means(readings, offset);
    let total = peak_mean + off_peak_mean;
    let balance = if total == 0.0 {
        0.0
    } else {
        1.0 - (peak_mean - off_peak_mean).abs() / total
    };
    let balance_score = balance * LOAD_BALANCE_WEIGHT;

    let consumption_score = CONSUMPTION_RATE_WEIGHT * CONSUMPTION_RATE_PLACEHOLDER;

    (pf_score + balance_score + consumption_score).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub days: u32,
    pub total_consumption: f64,
    pub total_cost: f64,
    pub average_daily_consumption: f64,
}

/// Totals over the last `days` days ending at `now`.
pub fn usage_totals(readings: &[MeterReading], days: u32, now: OffsetDateTime) -> UsageTotals {
    let recent = filter_last_days(readings, days, now);
    let total_consumption: f64 = recent.iter().map(MeterReading::consumption).sum();
    let total_cost: f64 = recent.iter().map(MeterReading::cost).sum();

    let average_daily_consumption = if days == 0 {
        0.0
    } else {
        total_consumption / f64::from(days)
    };

    UsageTotals {
        days,
        total_consumption,
        total_cost,
        average_daily_consumption,
    }
}

/// All dashboard tiles for one reading set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub reading_count: usize,
    pub totals: UsageTotals,
    pub peak_usage_time: String,
    pub lowest_usage_time: String,
    pub efficiency_rating: f64,
}

pub fn summarize(readings: &[MeterReading], days: u32, now: OffsetDateTime, offset: UtcOffset) -> UsageSummary {
    UsageSummary {
        reading_count: readings.len(),
        totals: usage_totals(readings, days, now),
        peak_usage_time: peak_usage_time_in(readings, offset),
        lowest_usage_time: lowest_usage_time_in(readings, offset),
        efficiency_rating: efficiency_rating_in(readings, offset),
    }
}
