use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Envelope every SEMS backend endpoint wraps its payload in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn into_result(self) -> Result<T, ClientError> {
        if !self.status {
            return Err(ClientError::Rejected(self.message));
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response envelope has no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_envelope_surfaces_message() {
        let body = r#"{"status":false,"message":"meter not found","data":null}"#;
        let resp: ApiResponse<Vec<i64>> = serde_json::from_str(body).unwrap();

        match resp.into_result() {
            Err(ClientError::Rejected(msg)) => assert_eq!(msg, "meter not found"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn accepted_envelope_without_data_is_a_decode_error() {
        let body = r#"{"status":true,"message":"ok"}"#;
        let resp: ApiResponse<Vec<i64>> = serde_json::from_str(body).unwrap();
        assert!(matches!(resp.into_result(), Err(ClientError::Decode(_))));
    }
}
