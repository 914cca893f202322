use sems_client::domain::MeterReading;

use crate::pipeline::{inspect_batch, PipelineError, ReadingSource};

/// The degrading ingestion adapter.
///
/// Tries the primary source; on failure logs, counts and serves the
/// fallback's readings instead, or an empty batch when there is no fallback
/// or it fails too. Callers always get a (possibly empty) batch.
pub struct FallbackSource {
    primary: Box<dyn ReadingSource>,
    fallback: Option<Box<dyn ReadingSource>>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn ReadingSource>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn ReadingSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub async fn readings(&self) -> Vec<MeterReading> {
        let primary = self.primary.name();
        match self.primary.fetch().await {
            Ok(readings) => {
                inspect_batch(primary, &readings);
                return readings;
            }
            Err(e) => {
                metrics::counter!("readings_fetch_failed_total", "source" => primary).increment(1);
                tracing::warn!(error = %e, source = primary, "reading fetch failed, degrading");
            }
        }

        let Some(fallback) = &self.fallback else {
            return Vec::new();
        };

        match fallback.fetch().await {
            Ok(readings) => {
                tracing::info!(source = fallback.name(), count = readings.len(), "serving fallback readings");
                inspect_batch(fallback.name(), &readings);
                readings
            }
            Err(e) => {
                metrics::counter!("readings_fetch_failed_total", "source" => fallback.name()).increment(1);
                tracing::error!(error = %e, source = fallback.name(), "fallback fetch failed, serving no readings");
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl ReadingSource for FallbackSource {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
        Ok(self.readings().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    struct Failing;

    #[async_trait::async_trait]
    impl ReadingSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self) -> Result<Vec<MeterReading>, PipelineError> {
            Err(PipelineError::Source("connection refused".to_string()))
        }
    }

    fn one() -> Vec<MeterReading> {
        vec![MeterReading::new(1, 1, "2024-01-01T00:00:00Z")]
    }

    #[tokio::test]
    async fn primary_success_wins() {
        let source = FallbackSource::new(Box::new(Fixed(one()))).with_fallback(Box::new(Fixed(Vec::new())));
        assert_eq!(source.readings().await, one());
    }

    #[tokio::test]
    async fn failure_degrades_to_fallback() {
        let source = FallbackSource::new(Box::new(Failing)).with_fallback(Box::new(Fixed(one())));
        assert_eq!(source.readings().await, one());
    }

    #[tokio::test]
    async fn failure_without_fallback_is_empty() {
        let source = FallbackSource::new(Box::new(Failing));
        assert!(source.readings().await.is_empty());
        assert!(source.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn both_failing_is_empty() {
        let source = FallbackSource::new(Box::new(Failing)).with_fallback(Box::new(Failing));
        assert!(source.readings().await.is_empty());
    }
}
