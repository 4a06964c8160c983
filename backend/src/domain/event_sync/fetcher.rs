//! Per-campus upstream event listing.

use std::sync::Arc;

use tracing::debug;

use crate::domain::CampusId;
use crate::domain::ports::{AccessToken, IntraEventSource, IntraSourceError, UpstreamEvent};

use super::rate_limiter::RequestRateLimiter;

/// Lists a campus's upstream events through the shared rate limiter.
pub struct EventFetcher {
    source: Arc<dyn IntraEventSource>,
    limiter: Arc<dyn RequestRateLimiter>,
}

impl EventFetcher {
    /// Build a fetcher.
    pub fn new(source: Arc<dyn IntraEventSource>, limiter: Arc<dyn RequestRateLimiter>) -> Self {
        Self { source, limiter }
    }

    /// Return the upstream events of `campus_id` in upstream order.
    ///
    /// # Errors
    ///
    /// Propagates the upstream failure unchanged; callers treat it as
    /// campus-scoped.
    pub async fn fetch(
        &self,
        campus_id: CampusId,
        token: &AccessToken,
    ) -> Result<Vec<UpstreamEvent>, IntraSourceError> {
        self.limiter.acquire().await;
        let events = self.source.list_campus_events(campus_id, token).await?;
        debug!(%campus_id, count = events.len(), "campus events fetched");
        Ok(events)
    }
}
