//! Periodic sync trigger.
//!
//! Runs [`EventSyncCommand::run_sync`] on a fixed period. A tick that lands
//! while another run holds the lock is logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::domain::ErrorCode;
use crate::domain::ports::{EventSyncCommand, SyncSummary};

/// Spawn a task that triggers a sync every `period`, starting immediately.
pub fn spawn_periodic_sync(
    command: Arc<dyn EventSyncCommand>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "scheduled event sync enabled");
        loop {
            ticker.tick().await;
            run_scheduled_sync(command.as_ref()).await;
        }
    })
}

/// Run one scheduled sync and log its result.
///
/// Returns the summary when the run completed.
pub async fn run_scheduled_sync(command: &dyn EventSyncCommand) -> Option<SyncSummary> {
    match command.run_sync().await {
        Ok(summary) => Some(summary),
        Err(error) if error.code() == ErrorCode::Conflict => {
            debug!("scheduled sync skipped; a run is already active");
            None
        }
        Err(error) => {
            warn!(code = ?error.code(), message = %error.message(), "scheduled sync failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;
    use crate::domain::ports::MockEventSyncCommand;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn completed_run_returns_its_summary() {
        let mut command = MockEventSyncCommand::new();
        command.expect_run_sync().times(1).returning(|| {
            Ok(SyncSummary {
                events_added: 2,
                ..SyncSummary::default()
            })
        });

        let summary = run_scheduled_sync(&command).await;

        assert_eq!(summary.map(|s| s.events_added), Some(2));
    }

    #[rstest]
    #[case::running(Error::conflict("an event sync is already running"))]
    #[case::outage(Error::service_unavailable("intranet down"))]
    #[tokio::test]
    async fn failed_runs_are_absorbed(#[case] error: Error) {
        let mut command = MockEventSyncCommand::new();
        command
            .expect_run_sync()
            .times(1)
            .returning(move || Err(error.clone()));

        assert_eq!(run_scheduled_sync(&command).await, None);
    }
}
