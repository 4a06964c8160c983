//! Driven port for the event catalogue and its notification fan-out writes.
//!
//! Inserting an event and its notifications is one atomic operation so an
//! event can never become visible without the notifications that announce it.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{CatalogueEvent, EventId, NotificationRecord};

/// Result of an insert-if-absent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogueInsertOutcome {
    /// The event was new; notifications were written alongside it.
    Inserted {
        /// Notifications written in the same transaction.
        notifications_created: usize,
    },
    /// Another writer catalogued the event first; nothing was written.
    AlreadyPresent,
}

define_port_error! {
    /// Errors raised by the event catalogue.
    pub enum EventCatalogueRepositoryError {
        /// Storage could not be reached.
        Connection { message: String } =>
            "event catalogue connection failed: {message}",
        /// The query or write failed.
        Query { message: String } =>
            "event catalogue query failed: {message}",
        /// An update targeted an event that is not catalogued.
        Missing { event_id: EventId } =>
            "event {event_id} is not catalogued",
    }
}

/// Port for reading and writing catalogued events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventCatalogueRepository: Send + Sync {
    /// Look up a stored event by identifier.
    async fn find_event(
        &self,
        event_id: EventId,
    ) -> Result<Option<CatalogueEvent>, EventCatalogueRepositoryError>;

    /// Overwrite every field of a stored event.
    async fn update_event(
        &self,
        event: &CatalogueEvent,
    ) -> Result<(), EventCatalogueRepositoryError>;

    /// Insert `event` if absent and, in the same transaction, its notifications.
    ///
    /// Returns [`CatalogueInsertOutcome::AlreadyPresent`] without writing
    /// anything when the identifier already exists. A failed notification write
    /// rolls back the event insert.
    async fn insert_event_with_notifications(
        &self,
        event: &CatalogueEvent,
        notifications: &[NotificationRecord],
    ) -> Result<CatalogueInsertOutcome, EventCatalogueRepositoryError>;
}
