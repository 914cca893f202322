pub mod aggregate;
pub mod config;
pub mod export;
pub mod http;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod stats;
pub mod store;
pub mod window;

pub use pipeline::{PipelineError, ReadingSource};
pub use report::{build_usage_report, UsageReport};
