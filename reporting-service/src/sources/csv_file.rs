use std::path::{Path, PathBuf};

use csv::StringRecord;
use sems_client::domain::MeterReading;

use crate::export::csv::READINGS_HEADER;
use crate::pipeline::{PipelineError, ReadingSource};

/// CSV source for `MeterReading`, reading the same layout the readings
/// export writes.
///
/// Expected header columns (by name):
/// - ID
/// - Meter ID
/// - Time (ISO-8601)
/// - Power (W), Voltage (V), Current (A), Consumption (kWh), Cost,
///   Power Factor (all optional, blank means missing)
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

fn column<'r>(record: &'r StringRecord, headers: &StringRecord, name: &str) -> Option<&'r str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|idx| record.get(idx))
}

fn record_to_reading(record: &StringRecord, headers: &StringRecord) -> Result<MeterReading, PipelineError> {
    let required = |name: &str| {
        column(record, headers, name)
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let id_str = required(READINGS_HEADER[0])?;
    let id: i64 = id_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid id '{id_str}': {e}")))?;

    let meter_str = required(READINGS_HEADER[1])?;
    let meter_id: i64 = meter_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid meter id '{meter_str}': {e}")))?;

    let time_value = required(READINGS_HEADER[2])?.trim().to_string();

    let number = |name: &str| column(record, headers, name).and_then(parse_optional_f64);

    Ok(MeterReading {
        id,
        meter_id,
        time_value,
        power_value: number(READINGS_HEADER[3]),
        voltage_value: number(READINGS_HEADER[4]),
        current_value: number(READINGS_HEADER[5]),
        consumption_value: number(READINGS_HEADER[6]),
        electricity_cost: number(READINGS_HEADER[7]),
        power_factor_value: number(READINGS_HEADER[8]),
    })
}

/// Rows with unusable identifiers are skipped and counted; the rest of the
/// file still loads.
fn read_file(path: &Path) -> Result<Vec<MeterReading>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
        .clone();

    let mut readings = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;

        match record_to_reading(&record, &headers) {
            Ok(r) => readings.push(r),
            Err(e) => {
                metrics::counter!("reading_csv_parse_errors_total").increment(1);
                tracing::warn!(error = %e, row = line + 1, "skipping CSV row");
            }
        }
    }

    Ok(readings)
}

#[async_trait::async_trait]
impl ReadingSource for CsvFileSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_file(&path))
            .await
            .map_err(|e| PipelineError::Source(format!("CSV reader task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::export::csv::readings_to_csv;

    #[tokio::test]
    async fn loads_exported_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "ID,Meter ID,Time,Power (W),Voltage (V),Current (A),Consumption (kWh),Cost,Power Factor\n\
             1,10,2024-01-01T09:15:00Z,100,220,0.45,1.5,0.3,0.95\n\
             2,10,2024-01-01T09:45:00Z,,,,2,,\n"
        )
        .unwrap();

        let readings = CsvFileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].power(), 100.0);
        assert_eq!(readings[0].power_factor(), 0.95);
        assert_eq!(readings[1].consumption(), 2.0);
        assert!(readings[1].power_value.is_none());
    }

    #[tokio::test]
    async fn skips_rows_with_bad_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "ID,Meter ID,Time,Power (W)\n\
             x,10,2024-01-01T09:15:00Z,100\n\
             2,10,2024-01-01T09:45:00Z,200\n"
        )
        .unwrap();

        let readings = CsvFileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id, 2);
    }

    #[tokio::test]
    async fn reads_back_an_export() {
        let original = vec![
            MeterReading::new(5, 9, "2024-02-02T02:00:00Z")
                .with_power(50.5)
                .with_consumption(0.25)
                .with_power_factor(1.2),
        ];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(readings_to_csv(&original).unwrap().as_bytes()).unwrap();

        let loaded = CsvFileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let res = CsvFileSource::new("/nonexistent/readings.csv").fetch().await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
