//! Catalogue reconciliation: decide INSERT, UPDATE, or SKIP and apply it.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    CampusMemberRepository, CampusMemberRepositoryError, CatalogueInsertOutcome,
    EventCatalogueRepository, EventCatalogueRepositoryError, UpstreamEvent,
};
use crate::domain::{CampusId, CatalogueEvent};

use super::attendees::AttendeeCount;
use super::fanout::NotificationFanout;
use super::mapping;

/// Why an event was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stored record already matches upstream.
    Unchanged,
    /// A concurrent writer inserted the event first.
    AlreadyCatalogued,
}

/// Reconciliation decision for one fetched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// First sighting.
    Insert,
    /// A tracked field changed.
    Update,
    /// Nothing to write.
    Skip(SkipReason),
}

/// Applied result of reconciling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The event was catalogued with its notifications.
    Inserted {
        /// Notifications written alongside the event.
        notifications_created: usize,
    },
    /// The stored record was overwritten.
    Updated,
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Failures while reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The stored record could not be read.
    #[error("catalogue lookup failed: {0}")]
    Lookup(EventCatalogueRepositoryError),
    /// Fan-out recipients could not be listed.
    #[error("notification recipients unavailable: {0}")]
    Recipients(CampusMemberRepositoryError),
    /// The insert, fan-out, or update write failed.
    #[error("catalogue write failed: {0}")]
    Write(EventCatalogueRepositoryError),
}

impl ReconcileError {
    /// Return whether the failure must abandon the rest of the campus.
    ///
    /// Lookup failures only cost the current event. Write and recipient
    /// failures stop the campus so a degraded store is not hammered event by
    /// event.
    pub fn aborts_campus(&self) -> bool {
        !matches!(self, Self::Lookup(_))
    }
}

/// Decide what to do with `candidate` given the stored record, if any.
///
/// # Examples
/// ```
/// use campus_events::domain::event_sync::{Disposition, SkipReason, decide};
/// # use campus_events::domain::{CatalogueEvent, EventId};
/// # use chrono::{TimeZone, Utc};
/// # let at = Utc.with_ymd_and_hms(2026, 11, 2, 18, 0, 0).single().expect("valid time");
/// # let stored = CatalogueEvent {
/// #     id: EventId::new(500), name: "Talk".to_owned(), description: String::new(),
/// #     location: String::new(), category: "event".to_owned(), attendees: 0,
/// #     capacity: Some(50), begins_at: at, ends_at: at, campus_ids: Vec::new(),
/// #     track_ids: Vec::new(), created_at: at, updated_at: at,
/// # };
/// let mut fetched = stored.clone();
/// assert_eq!(decide(&fetched, None), Disposition::Insert);
/// assert_eq!(decide(&fetched, Some(&stored)), Disposition::Skip(SkipReason::Unchanged));
/// fetched.capacity = Some(75);
/// assert_eq!(decide(&fetched, Some(&stored)), Disposition::Update);
/// ```
pub fn decide(candidate: &CatalogueEvent, stored: Option<&CatalogueEvent>) -> Disposition {
    match stored {
        None => Disposition::Insert,
        Some(stored) if candidate.differs_from(stored) => Disposition::Update,
        Some(_) => Disposition::Skip(SkipReason::Unchanged),
    }
}

/// Attendee count to record for an event.
///
/// A complete walk is authoritative. A partial walk must not overwrite a
/// known count, so known events keep their stored count and new events fall
/// back to the upstream subscriber counter.
fn effective_attendees(
    attendees: AttendeeCount,
    upstream: &UpstreamEvent,
    stored: Option<&CatalogueEvent>,
) -> u32 {
    if attendees.complete {
        return attendees.count;
    }
    stored.map_or(upstream.nbr_subscribers, |stored| stored.attendees)
}

/// Sole writer of catalogue state.
pub struct CatalogueReconciler {
    catalogue: Arc<dyn EventCatalogueRepository>,
    members: Arc<dyn CampusMemberRepository>,
    fanout: NotificationFanout,
    clock: Arc<dyn Clock>,
}

impl CatalogueReconciler {
    /// Build a reconciler.
    pub fn new(
        catalogue: Arc<dyn EventCatalogueRepository>,
        members: Arc<dyn CampusMemberRepository>,
        fanout: NotificationFanout,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalogue,
            members,
            fanout,
            clock,
        }
    }

    /// Return whether `upstream` has already ended.
    ///
    /// Expired events are skipped before their attendees are resolved.
    pub fn is_expired(&self, upstream: &UpstreamEvent) -> bool {
        upstream.is_expired_at(self.clock.utc())
    }

    /// Reconcile one upstream, non-expired event listed by `campus_id`.
    ///
    /// A first sighting is announced to the members of every campus in the
    /// event's campus list that also appears in `known_campuses`, plus the
    /// listing campus itself.
    ///
    /// # Errors
    ///
    /// See [`ReconcileError`]; [`ReconcileError::aborts_campus`] tells the
    /// caller how far the failure reaches.
    pub async fn reconcile(
        &self,
        campus_id: CampusId,
        known_campuses: &BTreeSet<CampusId>,
        upstream: &UpstreamEvent,
        attendees: AttendeeCount,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let stored = self
            .catalogue
            .find_event(upstream.id)
            .await
            .map_err(ReconcileError::Lookup)?;
        let count = effective_attendees(attendees, upstream, stored.as_ref());
        let candidate = mapping::catalogue_event(upstream, count);

        match decide(&candidate, stored.as_ref()) {
            Disposition::Insert => {
                let campuses = recipient_campuses(campus_id, &candidate, known_campuses);
                self.insert(&campuses, &candidate).await
            }
            Disposition::Update => {
                self.catalogue
                    .update_event(&candidate)
                    .await
                    .map_err(ReconcileError::Write)?;
                debug!(event_id = %candidate.id, "catalogued event updated");
                Ok(ReconcileOutcome::Updated)
            }
            Disposition::Skip(reason) => Ok(ReconcileOutcome::Skipped(reason)),
        }
    }

    async fn insert(
        &self,
        campuses: &BTreeSet<CampusId>,
        candidate: &CatalogueEvent,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut recipients = Vec::new();
        for campus_id in campuses {
            let members = self
                .members
                .list_users_by_campus(*campus_id)
                .await
                .map_err(ReconcileError::Recipients)?;
            recipients.extend(members);
        }
        let notifications = self.fanout.notifications_for(candidate.id, &recipients);

        match self
            .catalogue
            .insert_event_with_notifications(candidate, &notifications)
            .await
            .map_err(ReconcileError::Write)?
        {
            CatalogueInsertOutcome::Inserted {
                notifications_created,
            } => {
                debug!(
                    event_id = %candidate.id,
                    campuses = campuses.len(),
                    notifications_created,
                    "event catalogued"
                );
                Ok(ReconcileOutcome::Inserted {
                    notifications_created,
                })
            }
            CatalogueInsertOutcome::AlreadyPresent => {
                debug!(event_id = %candidate.id, "event catalogued concurrently");
                Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyCatalogued))
            }
        }
    }
}

/// Campuses whose members hear about a first sighting, in ascending ID order.
fn recipient_campuses(
    campus_id: CampusId,
    candidate: &CatalogueEvent,
    known_campuses: &BTreeSet<CampusId>,
) -> BTreeSet<CampusId> {
    candidate
        .campus_ids
        .iter()
        .copied()
        .filter(|id| known_campuses.contains(id))
        .chain(std::iter::once(campus_id))
        .collect()
}

#[cfg(test)]
mod tests {
    //! Disposition and write-path coverage with mocked storage.

    use super::*;
    use crate::domain::ports::{MockCampusMemberRepository, MockEventCatalogueRepository};
    use crate::domain::{CampusMember, EventId, UserId};
    use crate::test_support::event_sync::{MutableClock, fixed_now, upstream_event};
    use chrono::TimeDelta;
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    const CAMPUS: CampusId = CampusId::new(29);

    #[fixture]
    fn upstream() -> UpstreamEvent {
        upstream_event(500, 29, fixed_now() + TimeDelta::days(3))
    }

    fn complete(count: u32) -> AttendeeCount {
        AttendeeCount {
            count,
            complete: true,
        }
    }

    fn partial(count: u32) -> AttendeeCount {
        AttendeeCount {
            count,
            complete: false,
        }
    }

    fn members(ids: &[i64]) -> Vec<CampusMember> {
        ids.iter()
            .map(|id| CampusMember {
                id: UserId::new(*id),
                login: format!("user{id}"),
                campus_ids: vec![CAMPUS],
            })
            .collect()
    }

    fn known() -> BTreeSet<CampusId> {
        BTreeSet::from([CAMPUS])
    }

    fn reconciler(
        catalogue: MockEventCatalogueRepository,
        members: MockCampusMemberRepository,
    ) -> CatalogueReconciler {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        CatalogueReconciler::new(
            Arc::new(catalogue),
            Arc::new(members),
            NotificationFanout::new(clock.clone()),
            clock,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn new_event_is_inserted_with_one_notification_per_member(upstream: UpstreamEvent) {
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue
            .expect_find_event()
            .with(eq(EventId::new(500)))
            .returning(|_| Ok(None));
        catalogue
            .expect_insert_event_with_notifications()
            .withf(|event, notifications| {
                event.attendees == 4
                    && notifications.len() == 3
                    && notifications.iter().all(|record| !record.read)
            })
            .times(1)
            .returning(|_, notifications| {
                Ok(CatalogueInsertOutcome::Inserted {
                    notifications_created: notifications.len(),
                })
            });
        let mut directory = MockCampusMemberRepository::new();
        directory
            .expect_list_users_by_campus()
            .with(eq(CAMPUS))
            .returning(|_| Ok(members(&[1, 2, 3])));

        let outcome = reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known(), &upstream, complete(4))
            .await
            .expect("reconcile succeeds");

        assert_eq!(
            outcome,
            ReconcileOutcome::Inserted {
                notifications_created: 3
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn changed_event_is_overwritten_without_notifications(upstream: UpstreamEvent) {
        let mut stored = mapping::catalogue_event(&upstream, 4);
        stored.capacity = Some(50);
        let mut changed = upstream.clone();
        changed.max_people = Some(75);

        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue
            .expect_find_event()
            .returning(move |_| Ok(Some(stored.clone())));
        catalogue
            .expect_update_event()
            .withf(|event| event.capacity == Some(75) && event.attendees == 4)
            .times(1)
            .returning(|_| Ok(()));
        catalogue.expect_insert_event_with_notifications().never();
        let mut directory = MockCampusMemberRepository::new();
        directory.expect_list_users_by_campus().never();

        let outcome = reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known(), &changed, complete(4))
            .await
            .expect("reconcile succeeds");

        assert_eq!(outcome, ReconcileOutcome::Updated);
    }

    #[rstest]
    #[tokio::test]
    async fn unchanged_event_is_skipped(upstream: UpstreamEvent) {
        let stored = mapping::catalogue_event(&upstream, 4);
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue
            .expect_find_event()
            .returning(move |_| Ok(Some(stored.clone())));
        catalogue.expect_update_event().never();
        catalogue.expect_insert_event_with_notifications().never();

        let outcome = reconciler(catalogue, MockCampusMemberRepository::new())
            .reconcile(CAMPUS, &known(), &upstream, complete(4))
            .await
            .expect("reconcile succeeds");

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::Unchanged));
    }

    #[rstest]
    #[tokio::test]
    async fn first_sighting_notifies_every_known_listed_campus(mut upstream: UpstreamEvent) {
        upstream.campus_ids = vec![CampusId::new(42), CAMPUS, CampusId::new(99)];
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue.expect_find_event().returning(|_| Ok(None));
        catalogue
            .expect_insert_event_with_notifications()
            .withf(|_, notifications| {
                let users: Vec<i64> = notifications.iter().map(|n| n.user_id.get()).collect();
                users == vec![1, 2, 3, 10]
            })
            .times(1)
            .returning(|_, notifications| {
                Ok(CatalogueInsertOutcome::Inserted {
                    notifications_created: notifications.len(),
                })
            });
        let mut directory = MockCampusMemberRepository::new();
        directory
            .expect_list_users_by_campus()
            .with(eq(CAMPUS))
            .times(1)
            .returning(|_| Ok(members(&[1, 2, 3])));
        directory
            .expect_list_users_by_campus()
            .with(eq(CampusId::new(42)))
            .times(1)
            .returning(|_| Ok(members(&[3, 10])));
        directory
            .expect_list_users_by_campus()
            .with(eq(CampusId::new(99)))
            .never();

        let known = BTreeSet::from([CAMPUS, CampusId::new(42)]);
        let outcome = reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known, &upstream, complete(0))
            .await
            .expect("reconcile succeeds");

        assert_eq!(
            outcome,
            ReconcileOutcome::Inserted {
                notifications_created: 4
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn lost_insert_race_is_a_skip(upstream: UpstreamEvent) {
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue.expect_find_event().returning(|_| Ok(None));
        catalogue
            .expect_insert_event_with_notifications()
            .returning(|_, _| Ok(CatalogueInsertOutcome::AlreadyPresent));
        let mut directory = MockCampusMemberRepository::new();
        directory
            .expect_list_users_by_campus()
            .returning(|_| Ok(members(&[1])));

        let outcome = reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known(), &upstream, complete(0))
            .await
            .expect("reconcile succeeds");

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped(SkipReason::AlreadyCatalogued)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn partial_count_keeps_the_stored_attendees(upstream: UpstreamEvent) {
        let stored = mapping::catalogue_event(&upstream, 40);
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue
            .expect_find_event()
            .returning(move |_| Ok(Some(stored.clone())));
        catalogue.expect_update_event().never();

        let outcome = reconciler(catalogue, MockCampusMemberRepository::new())
            .reconcile(CAMPUS, &known(), &upstream, partial(12))
            .await
            .expect("reconcile succeeds");

        assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::Unchanged));
    }

    #[rstest]
    #[tokio::test]
    async fn partial_count_for_new_event_uses_upstream_counter(mut upstream: UpstreamEvent) {
        upstream.nbr_subscribers = 17;
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue.expect_find_event().returning(|_| Ok(None));
        catalogue
            .expect_insert_event_with_notifications()
            .withf(|event, _| event.attendees == 17)
            .times(1)
            .returning(|_, _| {
                Ok(CatalogueInsertOutcome::Inserted {
                    notifications_created: 0,
                })
            });
        let mut directory = MockCampusMemberRepository::new();
        directory
            .expect_list_users_by_campus()
            .returning(|_| Ok(Vec::new()));

        reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known(), &upstream, partial(5))
            .await
            .expect("reconcile succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn failed_fan_out_write_aborts_the_campus(upstream: UpstreamEvent) {
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue.expect_find_event().returning(|_| Ok(None));
        catalogue
            .expect_insert_event_with_notifications()
            .returning(|_, _| Err(EventCatalogueRepositoryError::query("deadlock detected")));
        let mut directory = MockCampusMemberRepository::new();
        directory
            .expect_list_users_by_campus()
            .returning(|_| Ok(members(&[1, 2])));

        let error = reconciler(catalogue, directory)
            .reconcile(CAMPUS, &known(), &upstream, complete(0))
            .await
            .expect_err("write failure surfaces");

        assert!(matches!(error, ReconcileError::Write(_)));
        assert!(error.aborts_campus());
    }

    #[rstest]
    #[tokio::test]
    async fn lookup_failure_is_event_scoped(upstream: UpstreamEvent) {
        let mut catalogue = MockEventCatalogueRepository::new();
        catalogue
            .expect_find_event()
            .returning(|_| Err(EventCatalogueRepositoryError::connection("pool timeout")));

        let error = reconciler(catalogue, MockCampusMemberRepository::new())
            .reconcile(CAMPUS, &known(), &upstream, complete(0))
            .await
            .expect_err("lookup failure surfaces");

        assert!(!error.aborts_campus());
    }
}
