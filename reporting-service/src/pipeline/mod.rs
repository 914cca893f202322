use sems_client::domain::MeterReading;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
}

/// Where meter readings come from.
///
/// Implementations may fail; [`crate::sources::FallbackSource`] is the layer
/// that turns failures into fallback data so aggregation never sees an error.
#[async_trait::async_trait]
pub trait ReadingSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError>;
}

/// Counts of suspicious values in a fetched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub invalid_timestamps: usize,
    pub power_factor_above_one: usize,
}

/// Flag suspicious readings at the ingestion boundary without altering them.
///
/// Power factors above 1.0 are physically implausible but show up in
/// generated data; they are counted and logged, never clamped.
pub fn inspect_batch(source: &'static str, readings: &[MeterReading]) -> BatchReport {
    let mut report = BatchReport {
        total: readings.len(),
        ..BatchReport::default()
    };

    for r in readings {
        if r.timestamp().is_none() {
            report.invalid_timestamps += 1;
        }
        if r.power_factor_value.is_some_and(|pf| pf > 1.0) {
            report.power_factor_above_one += 1;
        }
    }

    metrics::counter!("readings_fetched_total", "source" => source).increment(report.total as u64);

    if report.invalid_timestamps > 0 {
        metrics::counter!("readings_invalid_timestamp_total", "source" => source)
            .increment(report.invalid_timestamps as u64);
        tracing::warn!(
            source,
            count = report.invalid_timestamps,
            "readings with unparseable timeValue will be left out of aggregation"
        );
    }

    if report.power_factor_above_one > 0 {
        metrics::counter!("readings_power_factor_out_of_range_total", "source" => source)
            .increment(report.power_factor_above_one as u64);
        tracing::warn!(
            source,
            count = report.power_factor_above_one,
            "readings report a power factor above 1.0"
        );
    }

    report
}
