//! Domain orchestration service for the campus event sync.
//!
//! One run acquires the service credential, walks every campus in ascending
//! ID order, and reconciles each campus's upstream events against the
//! catalogue. Upstream calls share one interval rate limiter; subscriber
//! pages retry with jittered exponential backoff. Failures are scoped to the
//! event, the campus, or the run, and every skip is counted in the returned
//! [`SyncSummary`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::PageSize;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{
    AccessToken, CampusRepository, EventSyncCommand, IntraSourceError,
    ServiceCredentialProvider, SyncSummary, UpstreamEvent,
};
use crate::domain::{Campus, CampusId};

mod attendees;
mod fanout;
mod fetcher;
mod mapping;
mod paginator;
mod rate_limiter;
mod reconcile;
mod runtime;

pub use attendees::{AttendeeCount, AttendeeResolver};
pub use fanout::NotificationFanout;
pub use fetcher::EventFetcher;
pub use paginator::{PageSource, PageWalk, PageWalkStatus, Paginator, PaginatorConfig};
pub use rate_limiter::{IntervalRateLimiter, RequestRateLimiter};
pub use reconcile::{
    CatalogueReconciler, Disposition, ReconcileError, ReconcileOutcome, SkipReason, decide,
};
pub use runtime::{AttemptJitter, EventSyncPorts, EventSyncRuntime, TokioSleeper};

/// Sync tuning shared by the rate limiter and the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSyncConfig {
    /// Subscriber items requested per page.
    pub page_size: PageSize,
    /// Minimum spacing between upstream requests.
    pub request_interval: Duration,
    /// Attempts per subscriber page, including the first call.
    pub max_page_attempts: u32,
    /// Backoff before the first page retry.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
    /// Upper bound on subscriber pages walked per event.
    pub max_pages: u32,
}

impl Default for EventSyncConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::clamped(100),
            request_interval: Duration::from_secs(1),
            max_page_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            max_pages: 1_000,
        }
    }
}

impl EventSyncConfig {
    fn paginator(&self) -> PaginatorConfig {
        PaginatorConfig {
            page_size: self.page_size,
            max_attempts: self.max_page_attempts,
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
            max_pages: self.max_pages,
        }
    }
}

/// Async clock-independent sleeping abstraction for rate limiting and retries.
#[async_trait]
pub trait SyncSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use campus_events::domain::SyncSleeper;
    /// use std::sync::{Arc, Mutex};
    /// use std::time::Duration;
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Arc<Mutex<u32>>,
    /// }
    /// #[async_trait]
    /// impl SyncSleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_secs(1)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use campus_events::domain::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    /// struct DeterministicJitter;
    /// impl BackoffJitter for DeterministicJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<chrono::Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).single().expect("valid time");
    /// let delay = DeterministicJitter.jittered_delay(Duration::from_millis(500), 2, now);
    /// assert_eq!(delay, Duration::from_millis(510));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

#[derive(Debug, thiserror::Error)]
enum CampusSyncError {
    #[error("event listing failed: {0}")]
    Fetch(IntraSourceError),
    #[error(transparent)]
    Reconcile(ReconcileError),
}

/// Domain-owned event sync service.
pub struct EventSyncService {
    credentials: Arc<dyn ServiceCredentialProvider>,
    campuses: Arc<dyn CampusRepository>,
    fetcher: EventFetcher,
    resolver: AttendeeResolver,
    reconciler: CatalogueReconciler,
    run_lock: Mutex<()>,
}

impl EventSyncService {
    /// Build a service using default runtime dependencies.
    /// ```rust,ignore
    /// let service = EventSyncService::new(ports, clock, EventSyncConfig::default());
    /// ```
    pub fn new(ports: EventSyncPorts, clock: Arc<dyn Clock>, config: EventSyncConfig) -> Self {
        Self::with_runtime(ports, clock, EventSyncRuntime::default(), config)
    }

    /// Build a service with injected runtime abstractions.
    /// ```rust,ignore
    /// let service = EventSyncService::with_runtime(ports, clock, runtime, config);
    /// ```
    pub fn with_runtime(
        ports: EventSyncPorts,
        clock: Arc<dyn Clock>,
        runtime: EventSyncRuntime,
        config: EventSyncConfig,
    ) -> Self {
        let limiter: Arc<dyn RequestRateLimiter> = Arc::new(IntervalRateLimiter::new(
            config.request_interval,
            clock.clone(),
            runtime.sleeper.clone(),
        ));
        let paginator = Paginator::new(
            config.paginator(),
            limiter.clone(),
            runtime.sleeper,
            runtime.jitter,
            clock.clone(),
        );

        Self {
            credentials: ports.credentials,
            campuses: ports.campuses,
            fetcher: EventFetcher::new(ports.source.clone(), limiter),
            resolver: AttendeeResolver::new(ports.source, paginator),
            reconciler: CatalogueReconciler::new(
                ports.catalogue,
                ports.members,
                NotificationFanout::new(clock.clone()),
                clock,
            ),
            run_lock: Mutex::new(()),
        }
    }

    async fn run(&self) -> Result<SyncSummary, Error> {
        let token = self
            .credentials
            .acquire_service_credential()
            .await
            .map_err(|error| {
                warn!(%error, "service credential unavailable; aborting sync");
                mapping::map_credential_error(error)
            })?;

        let mut campuses = self.campuses.list_all_campuses().await.map_err(|error| {
            warn!(%error, "campus listing failed; aborting sync");
            mapping::map_campus_listing_error(error)
        })?;
        campuses.sort_by_key(|campus| campus.id);
        let known: BTreeSet<CampusId> = campuses.iter().map(|campus| campus.id).collect();

        let mut summary = SyncSummary::default();
        for campus in &campuses {
            match self.sync_campus(campus, &known, &token, &mut summary).await {
                Ok(()) => {
                    summary.campuses_synced = summary.campuses_synced.saturating_add(1);
                }
                Err(error) => {
                    warn!(campus_id = %campus.id, %error, "campus skipped");
                    summary.campuses_skipped = summary.campuses_skipped.saturating_add(1);
                }
            }
        }

        info!(
            events_added = summary.events_added,
            events_updated = summary.events_updated,
            events_unchanged = summary.events_unchanged,
            events_expired = summary.events_expired,
            events_failed = summary.events_failed,
            notifications_created = summary.notifications_created,
            partial_attendee_counts = summary.partial_attendee_counts,
            campuses_synced = summary.campuses_synced,
            campuses_skipped = summary.campuses_skipped,
            "event sync finished"
        );
        Ok(summary)
    }

    async fn sync_campus(
        &self,
        campus: &Campus,
        known: &BTreeSet<CampusId>,
        token: &AccessToken,
        summary: &mut SyncSummary,
    ) -> Result<(), CampusSyncError> {
        let events = self
            .fetcher
            .fetch(campus.id, token)
            .await
            .map_err(CampusSyncError::Fetch)?;
        info!(campus_id = %campus.id, campus = %campus.name, events = events.len(), "syncing campus");

        for event in &events {
            self.sync_event(campus.id, known, event, token, summary)
                .await
                .map_err(CampusSyncError::Reconcile)?;
        }
        Ok(())
    }

    async fn sync_event(
        &self,
        campus_id: CampusId,
        known: &BTreeSet<CampusId>,
        event: &UpstreamEvent,
        token: &AccessToken,
        summary: &mut SyncSummary,
    ) -> Result<(), ReconcileError> {
        if self.reconciler.is_expired(event) {
            debug!(event_id = %event.id, "event expired; skipped");
            summary.events_expired = summary.events_expired.saturating_add(1);
            return Ok(());
        }

        let attendees = match self.resolver.resolve(event.id, token).await {
            Ok(attendees) => attendees,
            Err(error) => {
                warn!(event_id = %event.id, %error, "attendee resolution failed; event skipped");
                summary.events_failed = summary.events_failed.saturating_add(1);
                return Ok(());
            }
        };
        if !attendees.complete {
            summary.partial_attendee_counts = summary.partial_attendee_counts.saturating_add(1);
        }

        match self.reconciler.reconcile(campus_id, known, event, attendees).await {
            Ok(outcome) => {
                record_outcome(summary, outcome);
                Ok(())
            }
            Err(error) => {
                summary.events_failed = summary.events_failed.saturating_add(1);
                if error.aborts_campus() {
                    return Err(error);
                }
                warn!(event_id = %event.id, %error, "event reconciliation failed; event skipped");
                Ok(())
            }
        }
    }
}

fn record_outcome(summary: &mut SyncSummary, outcome: ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Inserted {
            notifications_created,
        } => {
            summary.events_added = summary.events_added.saturating_add(1);
            let created = u32::try_from(notifications_created).unwrap_or(u32::MAX);
            summary.notifications_created = summary.notifications_created.saturating_add(created);
        }
        ReconcileOutcome::Updated => {
            summary.events_updated = summary.events_updated.saturating_add(1);
        }
        ReconcileOutcome::Skipped(SkipReason::Unchanged | SkipReason::AlreadyCatalogued) => {
            summary.events_unchanged = summary.events_unchanged.saturating_add(1);
        }
    }
}

#[async_trait]
impl EventSyncCommand for EventSyncService {
    async fn run_sync(&self) -> Result<SyncSummary, Error> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("event sync requested while another run is active");
            return Err(Error::conflict("an event sync is already running"));
        };

        let run_id = Uuid::new_v4();
        self.run()
            .instrument(info_span!("event_sync", %run_id))
            .await
    }
}
