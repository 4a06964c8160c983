//! DTOs for decoding intranet JSON responses.
//!
//! Only the fields the sync consumes are declared; everything else in the
//! upstream payload is ignored. Nullable text fields decode to empty strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::ports::{EventSubscriber, UpstreamEvent};
use crate::domain::{CampusId, EventId, TrackId, UserId};

#[derive(Debug, Deserialize)]
pub(super) struct EventDto {
    pub(super) id: i64,
    pub(super) name: String,
    #[serde(default)]
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) location: Option<String>,
    #[serde(default)]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) max_people: Option<i64>,
    #[serde(default)]
    pub(super) nbr_subscribers: Option<i64>,
    pub(super) begin_at: DateTime<Utc>,
    pub(super) end_at: DateTime<Utc>,
    #[serde(default)]
    pub(super) campus_ids: Vec<i64>,
    #[serde(default)]
    pub(super) cursus_ids: Vec<i64>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl From<EventDto> for UpstreamEvent {
    fn from(dto: EventDto) -> Self {
        Self {
            id: EventId::new(dto.id),
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            location: dto.location.unwrap_or_default(),
            kind: dto.kind.unwrap_or_default(),
            max_people: dto.max_people.and_then(|value| u32::try_from(value).ok()),
            nbr_subscribers: dto
                .nbr_subscribers
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or_default(),
            begin_at: dto.begin_at,
            end_at: dto.end_at,
            campus_ids: dto.campus_ids.into_iter().map(CampusId::new).collect(),
            cursus_ids: dto.cursus_ids.into_iter().map(TrackId::new).collect(),
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EventUserDto {
    pub(super) id: i64,
    pub(super) user_id: i64,
}

impl From<EventUserDto> for EventSubscriber {
    fn from(dto: EventUserDto) -> Self {
        Self {
            subscription_id: dto.id,
            user_id: UserId::new(dto.user_id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponseDto {
    pub(super) access_token: String,
}
