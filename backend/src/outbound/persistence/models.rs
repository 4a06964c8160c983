//! Internal Diesel row structs and their domain conversions.
//!
//! These types never leave the persistence layer. Counts are stored as
//! `INTEGER`, so conversions saturate on the way in and reject negative values
//! on the way out.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{campus_members, campuses, events, notifications};
use crate::domain::{
    Campus, CampusId, CampusMember, CatalogueEvent, EventId, NotificationRecord, TrackId, UserId,
};

/// Row struct for reading from the campuses table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = campuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CampusRow {
    pub campus_id: i64,
    pub name: String,
    pub member_count: i32,
    pub city: String,
    pub country: String,
}

impl TryFrom<CampusRow> for Campus {
    type Error = String;

    fn try_from(row: CampusRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampusId::new(row.campus_id),
            member_count: non_negative(row.member_count, "campuses.member_count")?,
            name: row.name,
            city: row.city,
            country: row.country,
        })
    }
}

/// Row struct for reading from the campus_members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = campus_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CampusMemberRow {
    pub user_id: i64,
    pub login: String,
    pub campus_ids: Vec<i64>,
}

impl From<CampusMemberRow> for CampusMember {
    fn from(row: CampusMemberRow) -> Self {
        Self {
            id: UserId::new(row.user_id),
            login: row.login,
            campus_ids: row.campus_ids.into_iter().map(CampusId::new).collect(),
        }
    }
}

/// Row struct for reading, inserting, and overwriting catalogued events.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(primary_key(event_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub event_id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub attendees: i32,
    pub capacity: Option<i32>,
    pub begins_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub campus_ids: Vec<i64>,
    pub track_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CatalogueEvent> for EventRow {
    fn from(event: &CatalogueEvent) -> Self {
        Self {
            event_id: event.id.get(),
            name: event.name.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            category: event.category.clone(),
            attendees: saturating_i32(event.attendees),
            capacity: event.capacity.map(saturating_i32),
            begins_at: event.begins_at,
            ends_at: event.ends_at,
            campus_ids: event.campus_ids.iter().map(|id| id.get()).collect(),
            track_ids: event.track_ids.iter().map(|id| id.get()).collect(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl TryFrom<EventRow> for CatalogueEvent {
    type Error = String;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::new(row.event_id),
            attendees: non_negative(row.attendees, "events.attendees")?,
            capacity: row
                .capacity
                .map(|capacity| non_negative(capacity, "events.capacity"))
                .transpose()?,
            name: row.name,
            description: row.description,
            location: row.location,
            category: row.category,
            begins_at: row.begins_at,
            ends_at: row.ends_at,
            campus_ids: row.campus_ids.into_iter().map(CampusId::new).collect(),
            track_ids: row.track_ids.into_iter().map(TrackId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for the notification fan-out batch.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow {
    pub user_id: i64,
    pub event_id: i64,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&NotificationRecord> for NewNotificationRow {
    fn from(record: &NotificationRecord) -> Self {
        Self {
            user_id: record.user_id.get(),
            event_id: record.event_id.get(),
            read: record.read,
            created_at: record.created_at,
            deleted_at: record.deleted_at,
        }
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn non_negative(value: i32, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{column} holds negative value {value}"))
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage.

    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn event() -> CatalogueEvent {
        let at = Utc
            .with_ymd_and_hms(2026, 11, 2, 18, 0, 0)
            .single()
            .expect("valid time");
        CatalogueEvent {
            id: EventId::new(500),
            name: "Piscine debrief".to_owned(),
            description: String::new(),
            location: "Cluster 1".to_owned(),
            category: "event".to_owned(),
            attendees: 3,
            capacity: None,
            begins_at: at,
            ends_at: at,
            campus_ids: vec![CampusId::new(29)],
            track_ids: vec![TrackId::new(21)],
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    fn event_row_preserves_every_field(event: CatalogueEvent) {
        let restored = CatalogueEvent::try_from(EventRow::from(&event)).expect("row converts");
        assert_eq!(restored, event);
    }

    #[rstest]
    fn oversized_counts_saturate(mut event: CatalogueEvent) {
        event.attendees = u32::MAX;
        assert_eq!(EventRow::from(&event).attendees, i32::MAX);
    }

    #[rstest]
    fn negative_stored_capacity_is_rejected(event: CatalogueEvent) {
        let mut row = EventRow::from(&event);
        row.capacity = Some(-1);
        let error = CatalogueEvent::try_from(row).expect_err("negative capacity");
        assert!(error.contains("events.capacity"));
    }
}
