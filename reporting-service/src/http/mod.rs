//! HTTP surface over the reading store: JSON reports and file exports.

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sems_client::ApiClient;
use time::UtcOffset;

use crate::export::format::CurrencyFormat;
use crate::pipeline::ReadingSource;
use crate::store::ReadingStore;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReadingSource>,
    pub store: Arc<ReadingStore>,
    /// Needed only for the transaction documents.
    pub api: Option<ApiClient>,
    pub offset: UtcOffset,
    pub currency: CurrencyFormat,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/usage", get(handlers::usage))
        .route("/api/usage/csv", get(handlers::usage_csv))
        .route("/api/reports/:report_type", get(handlers::report))
        .route("/api/reports/:report_type/csv", get(handlers::report_csv))
        .route("/api/reports/:report_type/pdf", get(handlers::report_pdf))
        .route("/api/transactions/:id/receipt", get(handlers::transaction_receipt))
        .route("/api/transactions/:id/allocation", get(handlers::transaction_allocation))
        .route("/api/refresh", post(handlers::refresh))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use sems_client::domain::MeterReading;
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    use crate::pipeline::PipelineError;

    struct Fixed(Vec<MeterReading>);

    #[async_trait::async_trait]
    impl ReadingSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    fn recent_readings() -> Vec<MeterReading> {
        let now = OffsetDateTime::now_utc();
        (1..=3)
            .map(|i| {
                let ts = now - Duration::hours(i);
                MeterReading::new(i, 1, ts.format(&time::format_description::well_known::Rfc3339).unwrap())
                    .with_consumption(1.0)
                    .with_cost(0.15)
                    .with_power(100.0 * i as f64)
                    .with_power_factor(0.9)
            })
            .collect()
    }

    fn app_with(api: Option<ApiClient>) -> Router {
        create_router(AppState {
            source: Arc::new(Fixed(recent_readings())),
            store: Arc::new(ReadingStore::new(Duration::minutes(5))),
            api,
            offset: UtcOffset::UTC,
            currency: CurrencyFormat::default(),
        })
    }

    fn app() -> Router {
        app_with(None)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, _, body) = get(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn usage_report_json() {
        let (status, _, body) = get(app(), "/api/usage?timeframe=daily").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["window"], "daily");
        assert_eq!(json["granularity"], "hour");
        assert_eq!(json["summary"]["readingCount"], 3);
        assert_eq!(json["summary"]["totals"]["totalConsumption"], 3.0);
    }

    #[tokio::test]
    async fn unknown_timeframe_is_bad_request_with_envelope() {
        let (status, _, body) = get(app(), "/api/usage?timeframe=hourly").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], false);
        assert!(json["message"].as_str().unwrap().contains("hourly"));
    }

    #[tokio::test]
    async fn usage_csv_is_an_attachment() {
        let (status, headers, body) = get(app(), "/api/usage/csv?timeframe=weekly").await;
        assert_eq!(status, StatusCode::OK);

        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"energy-usage-weekly-"));
        assert!(disposition.ends_with(".csv\""));
        assert_eq!(String::from_utf8(body).unwrap().lines().count(), 4);
    }

    #[tokio::test]
    async fn report_csv_has_bucket_rows() {
        let (status, headers, body) = get(app(), "/api/reports/6-month/csv").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("energy-report-6-month-"));

        let csv = String::from_utf8(body).unwrap();
        assert!(csv.starts_with("date,consumption,cost,power,voltage,current,powerFactor,count\n"));
    }

    #[tokio::test]
    async fn report_pdf_renders() {
        let (status, headers, body) = get(app(), "/api/reports/monthly/pdf").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn unknown_report_type_is_bad_request() {
        let (status, _, _) = get(app(), "/api/reports/quarterly").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_reports_count() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], true);
        assert_eq!(json["readings"], 3);
    }

    #[tokio::test]
    async fn transaction_documents_need_an_api_client() {
        let (status, _, _) = get(app(), "/api/transactions/5/receipt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transaction_receipt_pdf() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/transactions/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":true,"message":"ok","data":{
                    "transactionId":5,"customerName":"Ayu","meterId":3,
                    "amount":50.0,"kwhAllocated":20.0,
                    "createdAt":"2024-02-01T10:00:00Z"}}"#,
            )
            .create_async()
            .await;
        let client = ApiClient::new(&server.url(), "t".to_string(), std::time::Duration::from_secs(5)).unwrap();

        let (status, headers, body) = get(app_with(Some(client)), "/api/transactions/5/receipt").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"transaction_5.pdf\""
        );
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn upstream_rejection_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/transactions/9")
            .with_status(200)
            .with_body(r#"{"status":false,"message":"not found"}"#)
            .create_async()
            .await;
        let client = ApiClient::new(&server.url(), "t".to_string(), std::time::Duration::from_secs(5)).unwrap();

        let (status, _, body) = get(app_with(Some(client)), "/api/transactions/9/allocation").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], false);
    }
}
