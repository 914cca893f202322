#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("request rejected by backend: {0}")]
    Rejected(String),
}
