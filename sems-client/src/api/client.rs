use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::domain::ApiResponse;
use crate::error::ClientError;

/// Bearer-authenticated client for the SEMS REST backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    http: Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and unwrap the `{status, message, data}` envelope.
    pub(crate) async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "sems api request");

        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "sems api returned non-success status");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        envelope.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_base_url() {
        let res = ApiClient::new("  ", "t", Duration::from_secs(1));
        assert!(matches!(res, Err(ClientError::Config(_))));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/api/", "t", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
    }
}
