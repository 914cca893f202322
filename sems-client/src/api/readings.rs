use crate::api::ApiClient;
use crate::domain::MeterReading;
use crate::error::ClientError;

/// Fetch meter readings, either for every meter or for a single one.
///
/// Readings are returned exactly as served; timestamp parsing and window
/// filtering happen downstream.
pub async fn fetch_readings(
    client: &ApiClient,
    meter_id: Option<i64>,
) -> Result<Vec<MeterReading>, ClientError> {
    let path = match meter_id {
        Some(id) => format!("/meters/{id}/readings"),
        None => "/meter-readings".to_string(),
    };

    let readings: Vec<MeterReading> = client.get_data(&path).await?;
    tracing::debug!(count = readings.len(), ?meter_id, "fetched meter readings");

    Ok(readings)
}
