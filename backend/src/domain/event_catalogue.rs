//! Catalogue entities synchronised from the intranet.
//!
//! Identifiers are upstream-assigned integers wrapped in newtypes so campus,
//! user, event, and program-track IDs cannot be mixed up at call sites.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! upstream_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw upstream identifier.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Return the raw upstream identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

upstream_id! {
    /// Upstream event identifier. Immutable for the life of the event.
    EventId
}

upstream_id! {
    /// Upstream campus identifier.
    CampusId
}

upstream_id! {
    /// Upstream user identifier.
    UserId
}

upstream_id! {
    /// Upstream program-track (cursus) identifier.
    TrackId
}

/// Stored catalogue record for one event.
///
/// One record exists per [`EventId`]. Every other field may change between
/// syncs; updates overwrite the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEvent {
    /// Upstream identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Venue, possibly empty.
    pub location: String,
    /// Category tag (upstream `kind`).
    pub category: String,
    /// Resolved attendee count.
    pub attendees: u32,
    /// Capacity; `None` means unlimited.
    pub capacity: Option<u32>,
    /// Start instant.
    pub begins_at: DateTime<Utc>,
    /// End instant.
    pub ends_at: DateTime<Utc>,
    /// Campuses the event belongs to.
    pub campus_ids: Vec<CampusId>,
    /// Program tracks the event is associated with.
    pub track_ids: Vec<TrackId>,
    /// Upstream creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Upstream update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CatalogueEvent {
    /// Return whether any tracked field differs from `stored`.
    ///
    /// Campus and track IDs compare as sets. Upstream bookkeeping timestamps
    /// are not tracked; they are refreshed whenever an update is written.
    ///
    /// # Examples
    /// ```
    /// use campus_events::domain::{CampusId, CatalogueEvent, EventId};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let at = Utc.with_ymd_and_hms(2026, 11, 2, 18, 0, 0).single().expect("valid time");
    /// let stored = CatalogueEvent {
    ///     id: EventId::new(500),
    ///     name: "Piscine debrief".to_owned(),
    ///     description: String::new(),
    ///     location: "Cluster 1".to_owned(),
    ///     category: "event".to_owned(),
    ///     attendees: 0,
    ///     capacity: Some(50),
    ///     begins_at: at,
    ///     ends_at: at,
    ///     campus_ids: vec![CampusId::new(29)],
    ///     track_ids: Vec::new(),
    ///     created_at: at,
    ///     updated_at: at,
    /// };
    /// let mut fetched = stored.clone();
    /// assert!(!fetched.differs_from(&stored));
    /// fetched.capacity = Some(75);
    /// assert!(fetched.differs_from(&stored));
    /// ```
    pub fn differs_from(&self, stored: &Self) -> bool {
        self.name != stored.name
            || self.description != stored.description
            || self.location != stored.location
            || self.category != stored.category
            || self.attendees != stored.attendees
            || self.capacity != stored.capacity
            || self.begins_at != stored.begins_at
            || self.ends_at != stored.ends_at
            || id_set(&self.campus_ids) != id_set(&stored.campus_ids)
            || id_set(&self.track_ids) != id_set(&stored.track_ids)
    }
}

fn id_set<T: Ord + Copy>(ids: &[T]) -> BTreeSet<T> {
    ids.iter().copied().collect()
}

/// Campus provisioned outside this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campus {
    /// Upstream identifier.
    pub id: CampusId,
    /// Display name.
    pub name: String,
    /// Number of registered members.
    pub member_count: u32,
    /// City.
    pub city: String,
    /// Country.
    pub country: String,
}

/// User as seen by the notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampusMember {
    /// Upstream identifier.
    pub id: UserId,
    /// Intranet login.
    pub login: String,
    /// Campuses the user belongs to.
    pub campus_ids: Vec<CampusId>,
}

/// Per-user notification about a newly catalogued event.
///
/// Identity is the `(user_id, event_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Recipient.
    pub user_id: UserId,
    /// Event the notification announces.
    pub event_id: EventId,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Soft-delete instant; `None` while live.
    pub deleted_at: Option<DateTime<Utc>>,
}
