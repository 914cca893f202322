//! Multi-section PDF documents.
//!
//! A [`PdfReport`] is a plain description (title, sections of text with an
//! optional table); [`render`] lays it out on A4 pages with the built-in
//! Helvetica fonts. Output depends only on the report, including its
//! `generated_at` stamp.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use sems_client::domain::Transaction;
use time::OffsetDateTime;

use super::format::{format_date, format_number, format_timestamp, CurrencyFormat};
use super::ExportError;
use crate::report::UsageReport;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
    pub table: Option<PdfTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfReport {
    pub title: String,
    pub generated_at: OffsetDateTime,
    pub sections: Vec<PdfSection>,
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn usage_report_pdf(report: &UsageReport, currency: &CurrencyFormat) -> PdfReport {
    let s = &report.summary;
    let summary = PdfSection {
        heading: "Summary".to_string(),
        paragraphs: vec![
            format!(
                "Period: last {} day(s), grouped by {}.",
                s.totals.days, report.granularity
            ),
            format!("Readings: {}", s.reading_count),
            format!(
                "Total consumption: {} kWh",
                format_number(s.totals.total_consumption, 2)
            ),
            format!("Total cost: {}", currency.format(s.totals.total_cost)),
            format!(
                "Average daily consumption: {} kWh",
                format_number(s.totals.average_daily_consumption, 2)
            ),
            format!("Peak usage time: {}", s.peak_usage_time),
            format!("Lowest usage time: {}", s.lowest_usage_time),
            format!("Efficiency rating: {}/100", format_number(s.efficiency_rating, 0)),
        ],
        table: None,
    };

    let breakdown = PdfSection {
        heading: "Breakdown".to_string(),
        paragraphs: if report.buckets.is_empty() {
            vec!["No readings in this period.".to_string()]
        } else {
            Vec::new()
        },
        table: (!report.buckets.is_empty()).then(|| PdfTable {
            headers: strings([
                "Period",
                "Consumption (kWh)",
                "Cost",
                "Avg Power (W)",
                "Avg Voltage (V)",
                "Power Factor",
            ]),
            rows: report
                .buckets
                .iter()
                .map(|b| {
                    vec![
                        b.date.clone(),
                        format_number(b.consumption, 2),
                        currency.format(b.cost),
                        format_number(b.power, 1),
                        format_number(b.voltage, 1),
                        format_number(b.power_factor, 2),
                    ]
                })
                .collect(),
        }),
    };

    PdfReport {
        title: report.title.clone(),
        generated_at: report.generated_at,
        sections: vec![summary, breakdown],
    }
}

fn customer_section(tx: &Transaction) -> PdfSection {
    let address = match &tx.address {
        Some(addr) => addr.one_line(),
        None => "No address on file".to_string(),
    };

    PdfSection {
        heading: "Customer".to_string(),
        paragraphs: vec![
            format!("Name: {}", tx.customer_name),
            format!("Address: {address}"),
            format!("Meter ID: {}", tx.meter_id),
        ],
        table: None,
    }
}

/// Receipt for a purchase (`transaction_{id}.pdf`).
pub fn transaction_receipt_pdf(tx: &Transaction, currency: &CurrencyFormat, generated_at: OffsetDateTime) -> PdfReport {
    PdfReport {
        title: "Transaction Receipt".to_string(),
        generated_at,
        sections: vec![
            PdfSection {
                heading: "Transaction".to_string(),
                paragraphs: vec![
                    format!("Transaction ID: {}", tx.transaction_id),
                    format!("Date: {}", format_date(tx.created_at.date())),
                    format!(
                        "Payment method: {}",
                        tx.payment_method.as_deref().unwrap_or("-")
                    ),
                ],
                table: None,
            },
            customer_section(tx),
            PdfSection {
                heading: "Details".to_string(),
                paragraphs: Vec::new(),
                table: Some(PdfTable {
                    headers: strings(["Description", "Energy (kWh)", "Amount"]),
                    rows: vec![vec![
                        "Electricity purchase".to_string(),
                        format_number(tx.kwh_allocated, 2),
                        currency.format(tx.amount),
                    ]],
                }),
            },
        ],
    }
}

/// Energy allocation statement for a purchase (`allocation_{id}.pdf`).
pub fn allocation_pdf(tx: &Transaction, currency: &CurrencyFormat, generated_at: OffsetDateTime) -> PdfReport {
    let rate = if tx.kwh_allocated > 0.0 {
        currency.format(tx.amount / tx.kwh_allocated)
    } else {
        "-".to_string()
    };

    PdfReport {
        title: "Energy Allocation".to_string(),
        generated_at,
        sections: vec![
            customer_section(tx),
            PdfSection {
                heading: "Allocation".to_string(),
                paragraphs: vec![format!(
                    "Allocated by transaction {} on {}.",
                    tx.transaction_id,
                    format_date(tx.created_at.date())
                )],
                table: Some(PdfTable {
                    headers: strings(["Meter ID", "Allocated (kWh)", "Rate per kWh", "Amount Paid"]),
                    rows: vec![vec![
                        tx.meter_id.to_string(),
                        format_number(tx.kwh_allocated, 2),
                        rate,
                        currency.format(tx.amount),
                    ]],
                }),
            },
        ],
    }
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_BOTTOM: f32 = 22.0;
const FOOTER_Y: f32 = 12.0;
const LAYER: &str = "content";

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;

fn pdf_err<E: std::fmt::Debug>(e: E) -> ExportError {
    ExportError::Pdf(format!("{e:?}"))
}

/// Line advance in mm for a font size in pt.
fn line_height(size: f32) -> f32 {
    size * 0.3528 * 1.45
}

/// Rough number of Helvetica characters fitting in `width_mm`.
fn chars_fitting(width_mm: f32, size: f32) -> usize {
    ((width_mm / (size * 0.3528 * 0.5)) as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    page: usize,
    footer: String,
}

impl PageWriter {
    fn new(title: &str, footer: String) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            page: 1,
            footer,
        })
    }

    fn write_footer(&self) {
        self.layer.use_text(
            format!("{} | page {}", self.footer, self.page),
            FOOTER_SIZE,
            Mm(MARGIN),
            Mm(FOOTER_Y),
            &self.regular,
        );
    }

    fn new_page(&mut self) {
        self.write_footer();
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page += 1;
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` mm still fit above the footer.
    /// Returns whether a page break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < CONTENT_BOTTOM {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let h = line_height(size);
        self.ensure_space(h);
        self.y -= h;
        self.text_at(text, size, MARGIN, bold);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn table_row(&mut self, cells: &[String], col_width: f32, bold: bool) {
        let max_chars = chars_fitting(col_width - 2.0, TABLE_SIZE);
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + col_width * i as f32;
            self.text_at(&truncate(cell, max_chars), TABLE_SIZE, x, bold);
        }
    }

    fn table(&mut self, table: &PdfTable) {
        let columns = table.headers.len().max(1);
        let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
        let h = line_height(TABLE_SIZE);

        self.ensure_space(h * 2.0);
        self.y -= h;
        self.table_row(&table.headers, col_width, true);

        for row in &table.rows {
            if self.ensure_space(h) {
                self.y -= h;
                self.table_row(&table.headers, col_width, true);
            }
            self.y -= h;
            self.table_row(row, col_width, false);
        }
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.write_footer();
        self.doc.save_to_bytes().map_err(pdf_err)
    }
}

/// Lay out `report` and return the PDF bytes.
pub fn render(report: &PdfReport) -> Result<Vec<u8>, ExportError> {
    let stamp = format_timestamp(report.generated_at);
    let mut w = PageWriter::new(&report.title, format!("SEMS | generated {stamp}"))?;

    w.line(&report.title, TITLE_SIZE, true);
    w.line(&format!("Generated: {stamp}"), BODY_SIZE - 1.0, false);
    w.gap(4.0);

    let body_chars = chars_fitting(PAGE_WIDTH - 2.0 * MARGIN, BODY_SIZE);
    for section in &report.sections {
        w.gap(3.0);
        w.line(&section.heading, HEADING_SIZE, true);
        for paragraph in &section.paragraphs {
            for line in wrap_text(paragraph, body_chars) {
                w.line(&line, BODY_SIZE, false);
            }
        }
        if let Some(table) = &section.table {
            w.gap(2.0);
            w.table(table);
        }
    }

    tracing::debug!(title = %report.title, pages = w.page, "pdf rendered");
    w.finish()
}
