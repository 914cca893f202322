use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use sems_client::api::fetch_transaction;
use sems_client::domain::Transaction;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;

use super::error::{ApiError, Result};
use super::AppState;
use crate::aggregate::Granularity;
use crate::export::{self, export_window, pdf, ExportError, ExportFormat};
use crate::report::{build_usage_report, UsageReport};
use crate::store::Snapshot;
use crate::window::{ReportType, Timeframe, Window};

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    pub timeframe: Option<String>,
    pub granularity: Option<String>,
}

impl UsageQuery {
    fn timeframe(&self) -> Result<Timeframe> {
        Ok(match self.timeframe.as_deref() {
            Some(t) => t.parse()?,
            None => Timeframe::Weekly,
        })
    }

    fn granularity(&self) -> Result<Option<Granularity>> {
        Ok(self.granularity.as_deref().map(str::parse).transpose()?)
    }
}

fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response()
}

async fn current(state: &AppState) -> Snapshot {
    state.store.get_or_refresh(state.source.as_ref()).await
}

/// Run CPU-bound rendering off the async workers.
async fn blocking<T, F>(render: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, ExportError> + Send + 'static,
{
    let rendered = tokio::task::spawn_blocking(render)
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?;
    Ok(rendered?)
}

async fn download(state: &AppState, window: Window, format: ExportFormat) -> Result<Response> {
    let readings = current(state).await.readings;
    let (offset, currency) = (state.offset, state.currency.clone());

    let file = blocking(move || {
        export_window(&readings, window, format, OffsetDateTime::now_utc(), offset, &currency)
    })
    .await?;
    Ok(attachment(file.content_type, &file.filename, file.bytes))
}

async fn usage_report(state: &AppState, window: Window, granularity: Option<Granularity>) -> UsageReport {
    let snapshot = current(state).await;
    build_usage_report(
        &snapshot.readings,
        window,
        granularity,
        OffsetDateTime::now_utc(),
        state.offset,
    )
}

fn report_type(raw: &str) -> Result<ReportType> {
    Ok(raw.parse()?)
}

pub async fn health() -> &'static str {
    "ok"
}

/// GET /api/usage?timeframe=&granularity=
pub async fn usage(State(state): State<AppState>, Query(q): Query<UsageQuery>) -> Result<Json<UsageReport>> {
    let timeframe = q.timeframe()?;
    let granularity = q.granularity()?;
    Ok(Json(usage_report(&state, timeframe.into(), granularity).await))
}

/// GET /api/usage/csv?timeframe=
/// Raw readings inside the window.
pub async fn usage_csv(State(state): State<AppState>, Query(q): Query<UsageQuery>) -> Result<Response> {
    let timeframe = q.timeframe()?;
    download(&state, timeframe.into(), ExportFormat::Csv).await
}

/// GET /api/reports/:report_type
pub async fn report(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(q): Query<UsageQuery>,
) -> Result<Json<UsageReport>> {
    let report_type = report_type(&raw)?;
    let granularity = q.granularity()?;
    Ok(Json(usage_report(&state, report_type.into(), granularity).await))
}

/// GET /api/reports/:report_type/csv
/// One row per bucket.
pub async fn report_csv(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response> {
    let report_type = report_type(&raw)?;
    download(&state, report_type.into(), ExportFormat::Csv).await
}

/// GET /api/reports/:report_type/pdf
pub async fn report_pdf(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response> {
    let report_type = report_type(&raw)?;
    download(&state, report_type.into(), ExportFormat::Pdf).await
}

async fn transaction(state: &AppState, id: i64) -> Result<Transaction> {
    let client = state
        .api
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("transaction documents need an [api] section".to_string()))?;
    Ok(fetch_transaction(client, id).await?)
}

/// GET /api/transactions/:id/receipt
pub async fn transaction_receipt(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let tx = transaction(&state, id).await?;
    let doc = pdf::transaction_receipt_pdf(&tx, &state.currency, OffsetDateTime::now_utc().to_offset(state.offset));
    let bytes = blocking(move || pdf::render(&doc)).await?;

    metrics::counter!("exports_total", "format" => "pdf").increment(1);
    Ok(attachment("application/pdf", &export::transaction_pdf_filename(id), bytes))
}

/// GET /api/transactions/:id/allocation
pub async fn transaction_allocation(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let tx = transaction(&state, id).await?;
    let doc = pdf::allocation_pdf(&tx, &state.currency, OffsetDateTime::now_utc().to_offset(state.offset));
    let bytes = blocking(move || pdf::render(&doc)).await?;

    metrics::counter!("exports_total", "format" => "pdf").increment(1);
    Ok(attachment("application/pdf", &export::allocation_pdf_filename(id), bytes))
}

/// POST /api/refresh
pub async fn refresh(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.store.refresh(state.source.as_ref()).await;
    let fetched_at = snapshot
        .fetched_at
        .and_then(|t| t.format(&time::format_description::well_known::Rfc3339).ok());

    Json(json!({
        "status": true,
        "readings": snapshot.readings.len(),
        "sequence": snapshot.sequence,
        "fetchedAt": fetched_at,
    }))
}
