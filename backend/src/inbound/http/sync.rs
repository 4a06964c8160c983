//! Manual sync trigger.
//!
//! ```text
//! POST /api/v1/events/sync
//! ```

use actix_web::{HttpResponse, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::SyncSummary;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Response payload describing one completed sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummaryBody {
    /// Events inserted for the first time.
    #[schema(example = 1)]
    pub events_added: u32,
    /// Stored events overwritten with fresh upstream data.
    #[schema(example = 0)]
    pub events_updated: u32,
    /// Events already up to date.
    pub events_unchanged: u32,
    /// Events skipped because they had ended.
    pub events_expired: u32,
    /// Events abandoned after an error.
    pub events_failed: u32,
    /// Notifications written for newly added events.
    #[schema(example = 3)]
    pub notifications_created: u32,
    /// Events stored with an incomplete attendee count.
    pub partial_attendee_counts: u32,
    /// Campuses processed to completion.
    pub campuses_synced: u32,
    /// Campuses abandoned during the run.
    pub campuses_skipped: u32,
}

impl From<SyncSummary> for SyncSummaryBody {
    fn from(summary: SyncSummary) -> Self {
        Self {
            events_added: summary.events_added,
            events_updated: summary.events_updated,
            events_unchanged: summary.events_unchanged,
            events_expired: summary.events_expired,
            events_failed: summary.events_failed,
            notifications_created: summary.notifications_created,
            partial_attendee_counts: summary.partial_attendee_counts,
            campuses_synced: summary.campuses_synced,
            campuses_skipped: summary.campuses_skipped,
        }
    }
}

/// Run one event sync and return its summary.
#[utoipa::path(
    post,
    path = "/api/v1/events/sync",
    description = "Pull events for every campus from the intranet, reconcile them with the catalogue, and notify campus members about new events.",
    responses(
        (status = 200, description = "Sync completed", body = SyncSummaryBody),
        (status = 409, description = "A sync is already running", body = ErrorSchema),
        (status = 503, description = "Intranet or database unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "syncEvents"
)]
#[post("/events/sync")]
pub async fn sync_events(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let summary = state.event_sync.run_sync().await?;
    Ok(HttpResponse::Ok().json(SyncSummaryBody::from(summary)))
}
