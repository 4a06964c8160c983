//! Driven port for reading campus events from the intranet API.
//!
//! The domain owns the narrow upstream event shape so the sync engine stays
//! independent of the full intranet payload.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::define_port_error;
use super::service_credential_provider::AccessToken;
use crate::domain::{CampusId, EventId, TrackId, UserId};

/// Event as published upstream, restricted to the fields the sync consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEvent {
    /// Upstream identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Venue.
    pub location: String,
    /// Category tag.
    pub kind: String,
    /// Capacity; `None` means unlimited.
    pub max_people: Option<u32>,
    /// Upstream subscriber counter. May lag a full subscriber page walk.
    pub nbr_subscribers: u32,
    /// Start instant.
    pub begin_at: DateTime<Utc>,
    /// End instant.
    pub end_at: DateTime<Utc>,
    /// Owning campuses.
    pub campus_ids: Vec<CampusId>,
    /// Associated program tracks.
    pub cursus_ids: Vec<TrackId>,
    /// Upstream creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Upstream update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UpstreamEvent {
    /// Return whether the event ended before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_at < now
    }
}

/// One entry of an event's subscriber collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSubscriber {
    /// Subscription record identifier.
    pub subscription_id: i64,
    /// Subscribed user.
    pub user_id: UserId,
}

define_port_error! {
    /// Errors surfaced while calling the intranet API.
    pub enum IntraSourceError {
        /// Network transport failed or the upstream answered with a server error.
        Transport { message: String } =>
            "intranet transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "intranet timeout: {message}",
        /// The upstream rate-limited the request.
        RateLimited { message: String } =>
            "intranet rate limited request: {message}",
        /// The bearer credential was refused.
        Unauthorized { message: String } =>
            "intranet refused credential: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "intranet response decode failed: {message}",
        /// The upstream rejected the request as malformed.
        InvalidRequest { message: String } =>
            "intranet request invalid: {message}",
    }
}

impl IntraSourceError {
    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Port for the intranet event and subscriber collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntraEventSource: Send + Sync {
    /// List the current upstream events of one campus, in upstream order.
    async fn list_campus_events(
        &self,
        campus_id: CampusId,
        token: &AccessToken,
    ) -> Result<Vec<UpstreamEvent>, IntraSourceError>;

    /// Fetch one page of an event's subscriber collection.
    ///
    /// An empty page marks the end of the collection.
    async fn list_event_subscribers(
        &self,
        event_id: EventId,
        token: &AccessToken,
        page: PageRequest,
    ) -> Result<Vec<EventSubscriber>, IntraSourceError>;
}
