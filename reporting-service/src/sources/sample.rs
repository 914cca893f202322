use sems_client::domain::MeterReading;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::pipeline::{PipelineError, ReadingSource};

const SAMPLE_METER_ID: i64 = 1;
const SAMPLE_TARIFF_PER_KWH: f64 = 0.15;
const NOMINAL_VOLTAGE: f64 = 220.0;

/// Built-in demo dataset: one reading per hour for `days` days ending at the
/// hour containing `end`.
///
/// Values are deterministic so a dashboard fed from it renders the same
/// chart on every refresh.
pub fn sample_readings(end: OffsetDateTime, days: u32) -> Vec<MeterReading> {
    let Some(end) = end.replace_minute(0).and_then(|t| t.replace_second(0)).ok() else {
        return Vec::new();
    };
    let end = end.replace_nanosecond(0).unwrap_or(end);
    let hours = i64::from(days) * 24;

    (0..hours)
        .filter_map(|i| {
            let ts = end - Duration::hours(hours - 1 - i);
            let time_value = ts.format(&Rfc3339).ok()?;
            let hour = ts.hour();

            let base = 300.0 + 40.0 * f64::from(ts.day() % 5);
            let daytime = if (9..=20).contains(&hour) { 900.0 } else { 0.0 };
            let evening = if (18..=21).contains(&hour) { 400.0 } else { 0.0 };
            let power = base + daytime + evening;

            let voltage = NOMINAL_VOLTAGE + (i % 7 - 3) as f64 * 0.8;
            let power_factor = 0.85 + (i % 10) as f64 * 0.012;
            let consumption = power / 1000.0;

            Some(
                MeterReading::new(i + 1, SAMPLE_METER_ID, time_value)
                    .with_power(power)
                    .with_voltage(voltage)
                    .with_current(power / voltage)
                    .with_consumption(consumption)
                    .with_cost(consumption * SAMPLE_TARIFF_PER_KWH)
                    .with_power_factor(power_factor),
            )
        })
        .collect()
}

/// Source serving [`sample_readings`] relative to the current time.
#[derive(Debug, Clone)]
pub struct SampleSource {
    days: u32,
}

impl SampleSource {
    pub fn new(days: u32) -> Self {
        Self { days }
    }
}

impl Default for SampleSource {
    fn default() -> Self {
        Self::new(7)
    }
}

#[async_trait::async_trait]
impl ReadingSource for SampleSource {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
        Ok(sample_readings(OffsetDateTime::now_utc(), self.days))
    }
}
