use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::aggregate::UnknownVariant;
use crate::export::ExportError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(#[from] sems_client::ClientError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl From<UnknownVariant> for ApiError {
    fn from(e: UnknownVariant) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// Errors use the same `{status, message}` envelope as the SEMS backend.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(e) => {
                tracing::warn!(error = %e, "upstream request failed");
                StatusCode::BAD_GATEWAY
            }
            ApiError::Export(e) => {
                metrics::counter!("export_failures_total").increment(1);
                tracing::error!(error = %e, "export failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "status": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
