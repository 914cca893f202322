pub mod api;
pub mod domain;
pub mod error;

pub use api::ApiClient;
pub use error::ClientError;
