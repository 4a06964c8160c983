//! Shared test doubles for the event sync engine.
//!
//! The stubs use interior mutability so scenarios can change upstream or
//! storage state between runs after handing the stub to the service.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use pagination::PageRequest;

use crate::domain::ports::{
    AccessToken, CampusMemberRepository, CampusMemberRepositoryError, CampusRepository,
    CampusRepositoryError, CatalogueInsertOutcome, EventCatalogueRepository,
    EventCatalogueRepositoryError, EventSubscriber, IntraEventSource, IntraSourceError,
    UpstreamEvent,
};
use crate::domain::{
    BackoffJitter, Campus, CampusId, CampusMember, CatalogueEvent, EventId, NotificationRecord,
    SyncSleeper, TrackId, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Instant every scenario treats as "now".
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed test instant must be valid"),
    }
}

/// Build an upstream event owned by `campus_id` that ends at `ends_at`.
///
/// The event starts two hours before it ends, has a capacity of 50, and
/// reports no subscribers.
pub fn upstream_event(id: i64, campus_id: i64, ends_at: DateTime<Utc>) -> UpstreamEvent {
    UpstreamEvent {
        id: EventId::new(id),
        name: format!("Event {id}"),
        description: "Campus event".to_owned(),
        location: "Cluster 1".to_owned(),
        kind: "event".to_owned(),
        max_people: Some(50),
        nbr_subscribers: 0,
        begin_at: ends_at - TimeDelta::hours(2),
        end_at: ends_at,
        campus_ids: vec![CampusId::new(campus_id)],
        cursus_ids: vec![TrackId::new(21)],
        created_at: fixed_now() - TimeDelta::days(1),
        updated_at: fixed_now() - TimeDelta::days(1),
    }
}

/// Virtual clock moved explicitly by tests.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0) += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl SyncSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl SyncSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Records requested sleeps and moves the virtual clock by the same amount.
pub struct ClockAdvancingSleeper {
    clock: Arc<MutableClock>,
    recorded: Mutex<Vec<Duration>>,
}

impl ClockAdvancingSleeper {
    pub fn new(clock: Arc<MutableClock>) -> Self {
        Self {
            clock,
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.recorded).clone()
    }

    /// Sum of every recorded sleep.
    pub fn total(&self) -> Duration {
        lock(&self.recorded).iter().sum()
    }
}

#[async_trait]
impl SyncSleeper for ClockAdvancingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.recorded).push(duration);
        self.clock.advance(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Upstream call observed by [`ScriptedIntraEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRequest {
    CampusEvents(CampusId),
    Subscribers { event_id: EventId, page: u32 },
}

/// Scripted intranet source serving events per campus and paged subscribers.
///
/// Unscripted campuses list no events; unscripted events have no subscribers.
#[derive(Default)]
pub struct ScriptedIntraEventSource {
    campus_events: Mutex<HashMap<CampusId, Result<Vec<UpstreamEvent>, IntraSourceError>>>,
    subscribers: Mutex<HashMap<EventId, Vec<EventSubscriber>>>,
    page_failures: Mutex<HashMap<(EventId, u32), VecDeque<IntraSourceError>>>,
    requests: Mutex<Vec<SourceRequest>>,
}

impl ScriptedIntraEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the event listing of `campus_id`.
    pub fn set_campus_events(&self, campus_id: i64, events: Vec<UpstreamEvent>) {
        lock(&self.campus_events).insert(CampusId::new(campus_id), Ok(events));
    }

    /// Make the event listing of `campus_id` fail.
    pub fn fail_campus(&self, campus_id: i64, error: IntraSourceError) {
        lock(&self.campus_events).insert(CampusId::new(campus_id), Err(error));
    }

    /// Replace the subscriber collection of `event_id`.
    pub fn set_subscribers(&self, event_id: i64, user_ids: impl IntoIterator<Item = i64>) {
        let subscribers = user_ids
            .into_iter()
            .map(|user_id| EventSubscriber {
                subscription_id: event_id * 10_000 + user_id,
                user_id: UserId::new(user_id),
            })
            .collect();
        lock(&self.subscribers).insert(EventId::new(event_id), subscribers);
    }

    /// Queue failures returned, in order, for one subscriber page.
    pub fn fail_subscriber_page(
        &self,
        event_id: i64,
        page: u32,
        errors: impl IntoIterator<Item = IntraSourceError>,
    ) {
        lock(&self.page_failures)
            .entry((EventId::new(event_id), page))
            .or_default()
            .extend(errors);
    }

    pub fn requests(&self) -> Vec<SourceRequest> {
        lock(&self.requests).clone()
    }

    /// Subscriber pages requested for `event_id`, retries included.
    pub fn subscriber_pages_requested(&self, event_id: i64) -> Vec<u32> {
        let event_id = EventId::new(event_id);
        lock(&self.requests)
            .iter()
            .filter_map(|request| match request {
                SourceRequest::Subscribers {
                    event_id: requested,
                    page,
                } if *requested == event_id => Some(*page),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl IntraEventSource for ScriptedIntraEventSource {
    async fn list_campus_events(
        &self,
        campus_id: CampusId,
        _token: &AccessToken,
    ) -> Result<Vec<UpstreamEvent>, IntraSourceError> {
        lock(&self.requests).push(SourceRequest::CampusEvents(campus_id));
        lock(&self.campus_events)
            .get(&campus_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_event_subscribers(
        &self,
        event_id: EventId,
        _token: &AccessToken,
        page: PageRequest,
    ) -> Result<Vec<EventSubscriber>, IntraSourceError> {
        let number = page.number().get();
        lock(&self.requests).push(SourceRequest::Subscribers {
            event_id,
            page: number,
        });
        if let Some(error) = lock(&self.page_failures)
            .get_mut(&(event_id, number))
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let size = usize::try_from(page.size().get()).unwrap_or(usize::MAX);
        let skip = usize::try_from(number.saturating_sub(1))
            .unwrap_or(usize::MAX)
            .saturating_mul(size);
        Ok(lock(&self.subscribers)
            .get(&event_id)
            .map(|all| all.iter().skip(skip).take(size).copied().collect())
            .unwrap_or_default())
    }
}

/// In-memory campus and member directory.
#[derive(Default)]
pub struct InMemoryCampusDirectory {
    campuses: Mutex<Vec<Campus>>,
    members: Mutex<Vec<CampusMember>>,
    campus_failure: Mutex<Option<CampusRepositoryError>>,
    member_failure: Mutex<Option<CampusMemberRepositoryError>>,
}

impl InMemoryCampusDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_campus(&self, id: i64, name: &str) {
        lock(&self.campuses).push(Campus {
            id: CampusId::new(id),
            name: name.to_owned(),
            member_count: 0,
            city: String::new(),
            country: String::new(),
        });
    }

    pub fn add_member(&self, user_id: i64, campus_ids: &[i64]) {
        lock(&self.members).push(CampusMember {
            id: UserId::new(user_id),
            login: format!("user{user_id}"),
            campus_ids: campus_ids.iter().copied().map(CampusId::new).collect(),
        });
    }

    pub fn fail_campus_listing(&self, error: CampusRepositoryError) {
        *lock(&self.campus_failure) = Some(error);
    }

    pub fn fail_member_listing(&self, error: CampusMemberRepositoryError) {
        *lock(&self.member_failure) = Some(error);
    }
}

#[async_trait]
impl CampusRepository for InMemoryCampusDirectory {
    async fn list_all_campuses(&self) -> Result<Vec<Campus>, CampusRepositoryError> {
        if let Some(error) = lock(&self.campus_failure).clone() {
            return Err(error);
        }
        Ok(lock(&self.campuses).clone())
    }
}

#[async_trait]
impl CampusMemberRepository for InMemoryCampusDirectory {
    async fn list_users_by_campus(
        &self,
        campus_id: CampusId,
    ) -> Result<Vec<CampusMember>, CampusMemberRepositoryError> {
        if let Some(error) = lock(&self.member_failure).clone() {
            return Err(error);
        }
        Ok(lock(&self.members)
            .iter()
            .filter(|member| member.campus_ids.contains(&campus_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct CatalogueState {
    events: BTreeMap<EventId, CatalogueEvent>,
    notifications: BTreeMap<(UserId, EventId), NotificationRecord>,
    insert_failure: Option<EventCatalogueRepositoryError>,
    lookup_failure: Option<EventCatalogueRepositoryError>,
    find_calls: usize,
}

/// In-memory event catalogue with all-or-nothing inserts.
#[derive(Default)]
pub struct InMemoryEventCatalogue {
    state: Mutex<CatalogueState>,
}

impl InMemoryEventCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, event: CatalogueEvent) {
        lock(&self.state).events.insert(event.id, event);
    }

    pub fn event(&self, event_id: i64) -> Option<CatalogueEvent> {
        lock(&self.state).events.get(&EventId::new(event_id)).cloned()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.state).events.len()
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        lock(&self.state).notifications.values().cloned().collect()
    }

    /// Fail every insert with `error`, writing nothing.
    pub fn fail_inserts_with(&self, error: EventCatalogueRepositoryError) {
        lock(&self.state).insert_failure = Some(error);
    }

    pub fn fail_lookups_with(&self, error: EventCatalogueRepositoryError) {
        lock(&self.state).lookup_failure = Some(error);
    }

    pub fn find_calls(&self) -> usize {
        lock(&self.state).find_calls
    }
}

#[async_trait]
impl EventCatalogueRepository for InMemoryEventCatalogue {
    async fn find_event(
        &self,
        event_id: EventId,
    ) -> Result<Option<CatalogueEvent>, EventCatalogueRepositoryError> {
        let mut state = lock(&self.state);
        state.find_calls += 1;
        if let Some(error) = state.lookup_failure.clone() {
            return Err(error);
        }
        Ok(state.events.get(&event_id).cloned())
    }

    async fn update_event(
        &self,
        event: &CatalogueEvent,
    ) -> Result<(), EventCatalogueRepositoryError> {
        let mut state = lock(&self.state);
        match state.events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(())
            }
            None => Err(EventCatalogueRepositoryError::missing(event.id)),
        }
    }

    async fn insert_event_with_notifications(
        &self,
        event: &CatalogueEvent,
        notifications: &[NotificationRecord],
    ) -> Result<CatalogueInsertOutcome, EventCatalogueRepositoryError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.insert_failure.clone() {
            return Err(error);
        }
        if state.events.contains_key(&event.id) {
            return Ok(CatalogueInsertOutcome::AlreadyPresent);
        }

        state.events.insert(event.id, event.clone());
        let mut notifications_created = 0;
        for record in notifications {
            let key = (record.user_id, record.event_id);
            if !state.notifications.contains_key(&key) {
                state.notifications.insert(key, record.clone());
                notifications_created += 1;
            }
        }
        Ok(CatalogueInsertOutcome::Inserted {
            notifications_created,
        })
    }
}
