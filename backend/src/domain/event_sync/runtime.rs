//! Port and runtime dependency bundles for the event sync engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CampusMemberRepository, CampusRepository, EventCatalogueRepository, IntraEventSource,
    ServiceCredentialProvider,
};

use super::{BackoffJitter, SyncSleeper};

/// Port bundle required by the event sync engine.
pub struct EventSyncPorts {
    /// Service credential adapter.
    pub credentials: Arc<dyn ServiceCredentialProvider>,
    /// Intranet event and subscriber adapter.
    pub source: Arc<dyn IntraEventSource>,
    /// Campus listing adapter.
    pub campuses: Arc<dyn CampusRepository>,
    /// Campus member listing adapter.
    pub members: Arc<dyn CampusMemberRepository>,
    /// Event catalogue adapter.
    pub catalogue: Arc<dyn EventCatalogueRepository>,
}

impl EventSyncPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        credentials: Arc<dyn ServiceCredentialProvider>,
        source: Arc<dyn IntraEventSource>,
        campuses: Arc<dyn CampusRepository>,
        members: Arc<dyn CampusMemberRepository>,
        catalogue: Arc<dyn EventCatalogueRepository>,
    ) -> Self {
        Self {
            credentials,
            source,
            campuses,
            members,
            catalogue,
        }
    }
}

/// Runtime helpers used by the rate limiter and page retries.
pub struct EventSyncRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn SyncSleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for EventSyncRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl SyncSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Default jitter strategy adding up to a quarter of the base delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % (max_extra.saturating_add(1));
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

#[cfg(test)]
mod tests {
    //! Jitter bounds coverage.

    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case::first_attempt(Duration::from_millis(500), 1)]
    #[case::later_attempt(Duration::from_secs(4), 4)]
    #[case::zero_base(Duration::ZERO, 2)]
    fn jitter_stays_within_a_quarter_of_base(#[case] base: Duration, #[case] attempt: u32) {
        let now = Utc
            .with_ymd_and_hms(2026, 10, 19, 9, 30, 0)
            .single()
            .expect("valid time");
        let delay = AttemptJitter.jittered_delay(base, attempt, now);
        let ceiling = base + (base / 4).max(Duration::from_millis(1));

        assert!(delay >= base, "jitter never shortens the delay");
        assert!(delay <= ceiling, "jitter is bounded: {delay:?} > {ceiling:?}");
    }
}
