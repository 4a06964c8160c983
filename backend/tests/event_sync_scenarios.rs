//! End-to-end sync scenarios over in-memory adapters.
//!
//! Each scenario drives [`EventSyncService`] through the `EventSyncCommand`
//! port with scripted intranet responses, an in-memory catalogue, and a
//! virtual clock that the sleeper advances.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::Clock;
use pagination::PageSize;
use rstest::{fixture, rstest};

use campus_events::domain::ports::{
    AccessToken, CredentialError, EventCatalogueRepositoryError, EventSyncCommand,
    FixtureServiceCredentialProvider, IntraSourceError, ServiceCredentialProvider, UpstreamEvent,
};
use campus_events::domain::{
    CampusId, ErrorCode, EventSyncConfig, EventSyncPorts, EventSyncRuntime, EventSyncService, UserId,
};
use campus_events::test_support::event_sync::{
    ClockAdvancingSleeper, InMemoryCampusDirectory, InMemoryEventCatalogue, MutableClock,
    NoJitter, ScriptedIntraEventSource, fixed_now, upstream_event,
};

struct RejectingCredentials;

#[async_trait]
impl ServiceCredentialProvider for RejectingCredentials {
    async fn acquire_service_credential(&self) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::rejected("invalid_client"))
    }
}

struct World {
    clock: Arc<MutableClock>,
    sleeper: Arc<ClockAdvancingSleeper>,
    source: Arc<ScriptedIntraEventSource>,
    directory: Arc<InMemoryCampusDirectory>,
    catalogue: Arc<InMemoryEventCatalogue>,
}

impl World {
    fn service(&self, page_size: i64) -> EventSyncService {
        self.service_with(Arc::new(FixtureServiceCredentialProvider::default()), page_size)
    }

    fn service_with(
        &self,
        credentials: Arc<dyn ServiceCredentialProvider>,
        page_size: i64,
    ) -> EventSyncService {
        EventSyncService::with_runtime(
            EventSyncPorts::new(
                credentials,
                self.source.clone(),
                self.directory.clone(),
                self.directory.clone(),
                self.catalogue.clone(),
            ),
            self.clock.clone(),
            EventSyncRuntime {
                sleeper: self.sleeper.clone(),
                jitter: Arc::new(NoJitter),
            },
            EventSyncConfig {
                page_size: PageSize::clamped(page_size),
                ..EventSyncConfig::default()
            },
        )
    }
}

/// Campus 29 with three members and nothing catalogued yet.
#[fixture]
fn world() -> World {
    let clock = Arc::new(MutableClock::new(fixed_now()));
    let directory = InMemoryCampusDirectory::new();
    directory.add_campus(29, "Paris");
    directory.add_member(1, &[29]);
    directory.add_member(2, &[29]);
    directory.add_member(3, &[29]);
    World {
        sleeper: Arc::new(ClockAdvancingSleeper::new(clock.clone())),
        clock,
        source: Arc::new(ScriptedIntraEventSource::new()),
        directory: Arc::new(directory),
        catalogue: Arc::new(InMemoryEventCatalogue::new()),
    }
}

fn event_500() -> UpstreamEvent {
    upstream_event(500, 29, fixed_now() + TimeDelta::days(3))
}

#[rstest]
#[tokio::test]
async fn new_event_is_catalogued_and_every_member_notified(world: World) {
    world.source.set_campus_events(29, vec![event_500()]);

    let summary = world.service(100).run_sync().await.expect("run succeeds");

    assert_eq!(summary.events_added, 1);
    assert_eq!(summary.events_updated, 0);
    assert_eq!(summary.notifications_created, 3);

    let stored = world.catalogue.event(500).expect("event catalogued");
    assert_eq!(stored.attendees, 0);
    assert_eq!(stored.capacity, Some(50));

    let mut notifications = world.catalogue.notifications();
    notifications.sort_by_key(|record| record.user_id);
    let recipients: Vec<UserId> = notifications.iter().map(|record| record.user_id).collect();
    assert_eq!(recipients, vec![UserId::new(1), UserId::new(2), UserId::new(3)]);
    assert!(notifications.iter().all(|record| !record.read));
    assert!(notifications.iter().all(|record| record.deleted_at.is_none()));
}

#[rstest]
#[tokio::test]
async fn shared_event_notifies_members_of_every_listing_campus(world: World) {
    world.directory.add_campus(1, "Madrid");
    world.directory.add_member(10, &[1]);
    let mut shared = upstream_event(600, 1, fixed_now() + TimeDelta::days(3));
    shared.campus_ids = vec![CampusId::new(1), CampusId::new(29)];
    world.source.set_campus_events(1, vec![shared.clone()]);
    world.source.set_campus_events(29, vec![shared]);

    let summary = world.service(100).run_sync().await.expect("run succeeds");

    assert_eq!(summary.events_added, 1);
    assert_eq!(summary.events_unchanged, 1);
    assert_eq!(summary.notifications_created, 4);
    let mut recipients: Vec<UserId> = world
        .catalogue
        .notifications()
        .iter()
        .map(|record| record.user_id)
        .collect();
    recipients.sort();
    assert_eq!(
        recipients,
        vec![UserId::new(1), UserId::new(2), UserId::new(3), UserId::new(10)]
    );
}

#[rstest]
#[tokio::test]
async fn changed_capacity_updates_without_new_notifications(world: World) {
    world.source.set_campus_events(29, vec![event_500()]);
    let service = world.service(100);
    service.run_sync().await.expect("first run succeeds");

    let mut resized = event_500();
    resized.max_people = Some(75);
    world.source.set_campus_events(29, vec![resized]);
    let summary = service.run_sync().await.expect("second run succeeds");

    assert_eq!(summary.events_added, 0);
    assert_eq!(summary.events_updated, 1);
    assert_eq!(summary.notifications_created, 0);
    assert_eq!(world.catalogue.notifications().len(), 3);
    assert_eq!(
        world.catalogue.event(500).and_then(|event| event.capacity),
        Some(75)
    );
}

#[rstest]
#[tokio::test]
async fn repeating_an_unchanged_sync_writes_nothing(world: World) {
    world.source.set_campus_events(
        29,
        vec![event_500(), upstream_event(501, 29, fixed_now() + TimeDelta::days(5))],
    );
    world.source.set_subscribers(501, [1, 2]);
    let service = world.service(100);
    service.run_sync().await.expect("first run succeeds");
    let catalogued = world.catalogue.event(501);

    let summary = service.run_sync().await.expect("second run succeeds");

    assert_eq!(summary.events_added, 0);
    assert_eq!(summary.events_updated, 0);
    assert_eq!(summary.events_unchanged, 2);
    assert_eq!(summary.notifications_created, 0);
    assert_eq!(world.catalogue.notifications().len(), 6);
    assert_eq!(world.catalogue.event(501), catalogued);
}

#[rstest]
#[tokio::test]
async fn expired_event_leaves_storage_untouched(world: World) {
    world.source.set_campus_events(
        29,
        vec![upstream_event(502, 29, fixed_now() - TimeDelta::minutes(1))],
    );

    let summary = world.service(100).run_sync().await.expect("run succeeds");

    assert_eq!(summary.events_expired, 1);
    assert_eq!(summary.events_added, 0);
    assert!(world.source.subscriber_pages_requested(502).is_empty());
    assert_eq!(world.catalogue.event_count(), 0);
    assert!(world.catalogue.notifications().is_empty());
}

#[rstest]
#[case::exact_multiple(30, 10, vec![1, 2, 3, 4])]
#[case::remainder(25, 10, vec![1, 2, 3, 4])]
#[case::single_page(7, 10, vec![1, 2])]
#[case::no_subscribers(0, 10, vec![1])]
#[tokio::test]
async fn subscriber_walk_takes_one_request_past_the_last_page(
    world: World,
    #[case] subscribers: i64,
    #[case] page_size: i64,
    #[case] expected_pages: Vec<u32>,
) {
    world.source.set_campus_events(29, vec![event_500()]);
    world.source.set_subscribers(500, 1..=subscribers);

    world
        .service(page_size)
        .run_sync()
        .await
        .expect("run succeeds");

    assert_eq!(world.source.subscriber_pages_requested(500), expected_pages);
    assert_eq!(
        world.catalogue.event(500).map(|event| i64::from(event.attendees)),
        Some(subscribers)
    );
}

#[rstest]
#[tokio::test]
async fn unreachable_campus_is_skipped_and_the_run_continues(world: World) {
    world.directory.add_campus(42, "Lyon");
    world.directory.add_member(4, &[42]);
    world
        .source
        .fail_campus(29, IntraSourceError::transport("502 Bad Gateway"));
    world.source.set_campus_events(
        42,
        vec![upstream_event(600, 42, fixed_now() + TimeDelta::days(1))],
    );

    let summary = world.service(100).run_sync().await.expect("run succeeds");

    assert_eq!(summary.campuses_skipped, 1);
    assert_eq!(summary.campuses_synced, 1);
    assert_eq!(summary.events_added, 1);
    assert_eq!(summary.notifications_created, 1);
}

#[rstest]
#[tokio::test]
async fn rejected_service_credential_aborts_before_any_fetch(world: World) {
    world.source.set_campus_events(29, vec![event_500()]);

    let error = world
        .service_with(Arc::new(RejectingCredentials), 100)
        .run_sync()
        .await
        .expect_err("credential failure is fatal");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert!(world.source.requests().is_empty());
    assert_eq!(world.catalogue.event_count(), 0);
}

#[rstest]
#[tokio::test]
async fn failed_insert_writes_neither_event_nor_notifications(world: World) {
    world.source.set_campus_events(29, vec![event_500()]);
    world
        .catalogue
        .fail_inserts_with(EventCatalogueRepositoryError::query("deadlock detected"));

    let summary = world.service(100).run_sync().await.expect("run succeeds");

    assert_eq!(summary.events_added, 0);
    assert_eq!(summary.events_failed, 1);
    assert_eq!(summary.notifications_created, 0);
    assert_eq!(world.catalogue.event_count(), 0);
    assert!(world.catalogue.notifications().is_empty());
}

#[rstest]
#[tokio::test]
async fn upstream_requests_respect_the_interval_on_the_virtual_clock(world: World) {
    world.source.set_campus_events(29, vec![event_500()]);
    world.source.set_subscribers(500, 1..=5);
    let started = world.clock.utc();

    world.service(2).run_sync().await.expect("run succeeds");

    // One campus listing plus pages 1..=4 of subscribers.
    assert_eq!(world.source.requests().len(), 5);
    assert!(
        world
            .sleeper
            .recorded()
            .iter()
            .all(|pause| *pause <= Duration::from_secs(1))
    );
    assert!(world.clock.utc() - started >= TimeDelta::seconds(4));
}
