use csv::{QuoteStyle, Terminator, WriterBuilder};
use sems_client::domain::MeterReading;
use serde::Serialize;

use super::ExportError;

/// Column order of the raw readings export.
pub const READINGS_HEADER: [&str; 9] = [
    "ID",
    "Meter ID",
    "Time",
    "Power (W)",
    "Voltage (V)",
    "Current (A)",
    "Consumption (kWh)",
    "Cost",
    "Power Factor",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Raw readings as CSV, one row per reading.
///
/// Values are written without quoting or escaping: every column is numeric
/// or an ISO timestamp. A `time_value` containing a comma would shift the
/// row; use [`records_to_csv`] for free-text data.
pub fn readings_to_csv(readings: &[MeterReading]) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(READINGS_HEADER)?;
    for r in readings {
        wtr.write_record([
            r.id.to_string(),
            r.meter_id.to_string(),
            r.time_value.clone(),
            cell(r.power_value),
            cell(r.voltage_value),
            cell(r.current_value),
            cell(r.consumption_value),
            cell(r.electricity_cost),
            cell(r.power_factor_value),
        ])?;
    }

    finish(wtr)
}

/// Generic object-array export; the header comes from the field names of `T`.
///
/// Strings containing commas, quotes or line breaks are quoted. An empty
/// slice produces an empty document.
pub fn records_to_csv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        wtr.serialize(row)?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}
