//! Shared cache of the latest fetched readings.
//!
//! Refreshes are sequenced: each fetch takes a ticket from
//! [`ReadingStore::begin_refresh`] and its result is applied only if no
//! later ticket has been issued, so a slow response can never overwrite a
//! newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sems_client::domain::MeterReading;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::pipeline::ReadingSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub readings: Arc<Vec<MeterReading>>,
    pub fetched_at: Option<OffsetDateTime>,
    pub sequence: u64,
}

pub struct ReadingStore {
    current: RwLock<Snapshot>,
    issued: AtomicU64,
    max_age: Duration,
}

impl ReadingStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            current: RwLock::new(Snapshot::default()),
            issued: AtomicU64::new(0),
            max_age,
        }
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install `readings` if `ticket` is still the latest issued one.
    /// Returns whether the result was applied.
    pub async fn apply(&self, ticket: RefreshTicket, readings: Vec<MeterReading>, fetched_at: OffsetDateTime) -> bool {
        let latest = self.issued.load(Ordering::SeqCst);
        if ticket.0 != latest {
            metrics::counter!("store_stale_refresh_discarded_total").increment(1);
            tracing::debug!(ticket = ticket.0, latest, "discarding superseded refresh");
            return false;
        }

        let mut current = self.current.write().await;
        if ticket.0 <= current.sequence {
            return false;
        }
        *current = Snapshot {
            readings: Arc::new(readings),
            fetched_at: Some(fetched_at),
            sequence: ticket.0,
        };
        true
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.current.read().await.clone()
    }

    /// True when nothing has been fetched yet or the data is older than the
    /// configured max age.
    pub async fn is_stale(&self, now: OffsetDateTime) -> bool {
        match self.current.read().await.fetched_at {
            Some(at) => now - at > self.max_age,
            None => true,
        }
    }

    /// Fetch from `source` and apply the result under a fresh ticket.
    pub async fn refresh(&self, source: &dyn ReadingSource) -> Snapshot {
        let ticket = self.begin_refresh();
        match source.fetch().await {
            Ok(readings) => {
                let count = readings.len();
                if self.apply(ticket, readings, OffsetDateTime::now_utc()).await {
                    metrics::counter!("store_refresh_total").increment(1);
                    tracing::info!(source = source.name(), count, "reading store refreshed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, source = source.name(), "store refresh failed, keeping previous readings");
            }
        }
        self.snapshot().await
    }

    /// Current snapshot, refreshing first when it is stale.
    pub async fn get_or_refresh(&self, source: &dyn ReadingSource) -> Snapshot {
        if self.is_stale(OffsetDateTime::now_utc()).await {
            self.refresh(source).await
        } else {
            self.snapshot().await
        }
    }
}
