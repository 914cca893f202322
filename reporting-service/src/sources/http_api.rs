use sems_client::api::fetch_readings;
use sems_client::domain::MeterReading;
use sems_client::ApiClient;

use crate::pipeline::{PipelineError, ReadingSource};

/// Readings pulled from the SEMS REST backend.
#[derive(Clone)]
pub struct HttpApiSource {
    client: ApiClient,
    meter_id: Option<i64>,
}

impl HttpApiSource {
    pub fn new(client: ApiClient, meter_id: Option<i64>) -> Self {
        Self { client, meter_id }
    }
}

#[async_trait::async_trait]
impl ReadingSource for HttpApiSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
        fetch_readings(&self.client, self.meter_id)
            .await
            .map_err(|e| PipelineError::Source(format!("sems api: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pipeline::inspect_batch;
    use crate::sources::{FallbackSource, SampleSource};
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn maps_client_errors_to_source_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/meters/3/readings")
            .with_status(401)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "expired", Duration::from_secs(5)).unwrap();
        let source = HttpApiSource::new(client, Some(3));

        let res = source.fetch().await;
        assert!(matches!(res, Err(PipelineError::Source(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn returns_backend_readings() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/meter-readings")
            .with_status(200)
            .with_body(
                json!({
                    "status": true,
                    "message": "ok",
                    "data": [{"id": 1, "meterId": 2, "timeValue": "2024-01-01T00:00:00Z"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "t", Duration::from_secs(5)).unwrap();
        let readings = HttpApiSource::new(client, None).fetch().await.unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].meter_id, 2);
    }

    #[tokio::test]
    async fn malformed_time_values_stay_in_the_batch() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/meter-readings")
            .with_status(200)
            .with_body(
                json!({
                    "status": true,
                    "message": "ok",
                    "data": [
                        {"id": 1, "meterId": 2, "timeValue": "2024-01-01T00:00:00Z", "powerValue": 100.0},
                        {"id": 2, "meterId": 2, "timeValue": null, "powerValue": 200.0},
                        {"id": 3, "meterId": 2, "timeValue": "yesterday"},
                        {"id": 4, "meterId": 2, "timeValue": "2024-01-01T01:00:00Z", "powerFactorValue": 1.4}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "t", Duration::from_secs(5)).unwrap();
        let source = FallbackSource::new(Box::new(HttpApiSource::new(client, None)))
            .with_fallback(Box::new(SampleSource::new(1)));

        let readings = source.readings().await;

        assert_eq!(readings.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        let report = inspect_batch("http", &readings);
        assert_eq!(report.total, 4);
        assert_eq!(report.invalid_timestamps, 2);
        assert_eq!(report.power_factor_above_one, 1);
    }
}
