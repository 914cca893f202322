//! Presentation formatters: currency/date strings, CSV and PDF documents.

pub mod csv;
pub mod format;
pub mod pdf;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sems_client::domain::MeterReading;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::aggregate::{iso_date, UnknownVariant};
use crate::report::build_usage_report;
use crate::window::{filter_window, ReportType, Timeframe, Window};

use self::format::CurrencyFormat;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to finish export buffer: {0}")]
    Buffer(String),
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("export task failed: {0}")]
    Task(String),
}

/// `energy-usage-{timeframe}-{YYYY-MM-DD}.csv`
pub fn usage_csv_filename(timeframe: Timeframe, date: Date) -> String {
    format!("energy-usage-{}-{}.csv", timeframe.as_str(), iso_date(date))
}

/// `energy-usage-{timeframe}-{YYYY-MM-DD}.pdf`
pub fn usage_pdf_filename(timeframe: Timeframe, date: Date) -> String {
    format!("energy-usage-{}-{}.pdf", timeframe.as_str(), iso_date(date))
}

/// `energy-report-{type}-{YYYY-MM-DD}.csv`
pub fn report_csv_filename(report_type: ReportType, date: Date) -> String {
    format!("energy-report-{}-{}.csv", report_type.as_str(), iso_date(date))
}

/// `energy-report-{type}-{YYYY-MM-DD}.pdf`
pub fn report_pdf_filename(report_type: ReportType, date: Date) -> String {
    format!("energy-report-{}-{}.pdf", report_type.as_str(), iso_date(date))
}

pub fn transaction_pdf_filename(transaction_id: i64) -> String {
    format!("transaction_{transaction_id}.pdf")
}

pub fn allocation_pdf_filename(transaction_id: i64) -> String {
    format!("allocation_{transaction_id}.pdf")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            _ => Err(UnknownVariant {
                kind: "export format",
                value: s.to_string(),
            }),
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render `window` of `readings` as a file.
///
/// Timeframe CSVs carry the raw readings inside the window; report CSVs carry
/// one row per bucket. PDFs always show the bucketed report. File names are
/// dated in `offset`.
pub fn export_window(
    readings: &[MeterReading],
    window: Window,
    format: ExportFormat,
    now: OffsetDateTime,
    offset: UtcOffset,
    currency: &CurrencyFormat,
) -> Result<ExportedFile, ExportError> {
    let today = now.checked_to_offset(offset).unwrap_or(now).date();

    let (filename, bytes) = match (window, format) {
        (Window::Timeframe(t), ExportFormat::Csv) => {
            let recent = filter_window(readings, t.duration(), now);
            (usage_csv_filename(t, today), csv::readings_to_csv(&recent)?.into_bytes())
        }
        (Window::Report(r), ExportFormat::Csv) => {
            let report = build_usage_report(readings, window, None, now, offset);
            (report_csv_filename(r, today), csv::records_to_csv(&report.buckets)?.into_bytes())
        }
        (_, ExportFormat::Pdf) => {
            let report = build_usage_report(readings, window, None, now, offset);
            let filename = match window {
                Window::Timeframe(t) => usage_pdf_filename(t, today),
                Window::Report(r) => report_pdf_filename(r, today),
            };
            (filename, pdf::render(&pdf::usage_report_pdf(&report, currency))?)
        }
    };

    metrics::counter!("exports_total", "format" => format.as_str()).increment(1);
    tracing::info!(window = window.as_str(), %format, %filename, bytes = bytes.len(), "export rendered");

    Ok(ExportedFile {
        filename,
        content_type: format.content_type(),
        bytes,
    })
}

impl ExportedFile {
    /// Write into `dir` (created if missing) under the file's own name.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}
