pub mod csv_file;
pub mod fallback;
pub mod http_api;
pub mod sample;

use anyhow::Context;

pub use csv_file::CsvFileSource;
pub use fallback::FallbackSource;
pub use http_api::HttpApiSource;
pub use sample::{sample_readings, SampleSource};

use crate::config::{AppConfig, SourceKind};
use crate::pipeline::ReadingSource;

/// Build the degrading source described by the configuration.
pub fn from_config(cfg: &AppConfig) -> anyhow::Result<FallbackSource> {
    let primary: Box<dyn ReadingSource> = match cfg.source.kind {
        SourceKind::Http => {
            let client = cfg.api_client()?.context("[api] section missing")?;
            let meter_id = cfg.api.as_ref().and_then(|a| a.meter_id);
            Box::new(HttpApiSource::new(client, meter_id))
        }
        SourceKind::Csv => {
            let path = cfg.source.csv_path.clone().context("source.csv_path missing")?;
            Box::new(CsvFileSource::new(path))
        }
        SourceKind::Sample => Box::new(SampleSource::new(cfg.source.sample_days)),
    };

    let mut source = FallbackSource::new(primary);
    if cfg.source.fallback_to_sample && cfg.source.kind != SourceKind::Sample {
        source = source.with_fallback(Box::new(SampleSource::new(cfg.source.sample_days)));
    }

    tracing::info!(
        kind = ?cfg.source.kind,
        fallback_to_sample = cfg.source.fallback_to_sample,
        "reading source configured"
    );
    Ok(source)
}
