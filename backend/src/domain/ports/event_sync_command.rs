//! Driving port exposed to sync triggers (HTTP handler, scheduler, CLI).

use async_trait::async_trait;

use crate::domain::Error;

/// Counters describing one sync run.
///
/// `events_added` and `events_updated` are the headline figures; the rest
/// make every skip observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Events inserted for the first time.
    pub events_added: u32,
    /// Stored events overwritten because a tracked field changed.
    pub events_updated: u32,
    /// Events skipped because nothing changed or another writer won the insert.
    pub events_unchanged: u32,
    /// Events skipped because they had already ended.
    pub events_expired: u32,
    /// Events whose reconciliation failed and was abandoned.
    pub events_failed: u32,
    /// Notifications written by the fan-out.
    pub notifications_created: u32,
    /// Events reconciled with an incomplete subscriber walk.
    pub partial_attendee_counts: u32,
    /// Campuses processed to completion.
    pub campuses_synced: u32,
    /// Campuses abandoned after an upstream or storage failure.
    pub campuses_skipped: u32,
}

/// Driving port for running one catalogue sync.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSyncCommand: Send + Sync {
    /// Run one full sync across every campus.
    ///
    /// # Errors
    ///
    /// Fails when the service credential or the campus list cannot be
    /// obtained, or when another run is already in progress.
    async fn run_sync(&self) -> Result<SyncSummary, Error>;
}
