//! PostgreSQL-backed event catalogue with transactional notification fan-out.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use tracing::debug;

use crate::domain::ports::{
    CatalogueInsertOutcome, EventCatalogueRepository, EventCatalogueRepositoryError,
};
use crate::domain::{CatalogueEvent, EventId, NotificationRecord};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EventRow, NewNotificationRow};
use super::pool::DbPool;
use super::schema::{events, notifications};

/// PostgreSQL rejects statements carrying more than this many bind parameters.
const MAX_BIND_PARAMETERS: usize = 65_535;

/// Columns bound per notification row.
const NOTIFICATION_COLUMNS: usize = 5;

/// Notification rows written per `INSERT` statement.
const NOTIFICATION_CHUNK_ROWS: usize = MAX_BIND_PARAMETERS / NOTIFICATION_COLUMNS;

/// Diesel-backed implementation of the event catalogue port.
#[derive(Clone)]
pub struct DieselEventCatalogueRepository {
    pool: DbPool,
}

impl DieselEventCatalogueRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error, operation: &str) -> EventCatalogueRepositoryError {
    map_diesel_error(
        error,
        operation,
        EventCatalogueRepositoryError::query,
        EventCatalogueRepositoryError::connection,
    )
}

#[async_trait]
impl EventCatalogueRepository for DieselEventCatalogueRepository {
    async fn find_event(
        &self,
        event_id: EventId,
    ) -> Result<Option<CatalogueEvent>, EventCatalogueRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, EventCatalogueRepositoryError::connection))?;

        let row: Option<EventRow> = events::table
            .find(event_id.get())
            .select(EventRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| diesel_error(error, "event lookup"))?;

        row.map(CatalogueEvent::try_from)
            .transpose()
            .map_err(EventCatalogueRepositoryError::query)
    }

    async fn update_event(
        &self,
        event: &CatalogueEvent,
    ) -> Result<(), EventCatalogueRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, EventCatalogueRepositoryError::connection))?;

        let row = EventRow::from(event);
        let updated = diesel::update(events::table.find(row.event_id))
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(|error| diesel_error(error, "event update"))?;

        if updated == 0 {
            return Err(EventCatalogueRepositoryError::missing(event.id));
        }
        Ok(())
    }

    async fn insert_event_with_notifications(
        &self,
        event: &CatalogueEvent,
        notifications: &[NotificationRecord],
    ) -> Result<CatalogueInsertOutcome, EventCatalogueRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, EventCatalogueRepositoryError::connection))?;

        let event_row = EventRow::from(event);
        let notification_rows: Vec<NewNotificationRow> =
            notifications.iter().map(NewNotificationRow::from).collect();

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let inserted = diesel::insert_into(events::table)
                        .values(&event_row)
                        .on_conflict(events::event_id)
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        return Ok(CatalogueInsertOutcome::AlreadyPresent);
                    }

                    let mut notifications_created = 0;
                    for chunk in notification_rows.chunks(NOTIFICATION_CHUNK_ROWS) {
                        notifications_created += diesel::insert_into(notifications::table)
                            .values(chunk)
                            .on_conflict((notifications::user_id, notifications::event_id))
                            .do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    Ok(CatalogueInsertOutcome::Inserted {
                        notifications_created,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| diesel_error(error, "event insert with notifications"))?;

        debug!(event_id = %event.id, ?outcome, "event insert transaction committed");
        Ok(outcome)
    }
}
