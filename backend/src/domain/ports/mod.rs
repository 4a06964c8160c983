//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (storage, upstream API, credentials) are consumed by the sync
//! engine; the driving port [`EventSyncCommand`] is what triggers call.

mod macros;
pub(crate) use macros::define_port_error;

mod campus_member_repository;
mod campus_repository;
mod event_catalogue_repository;
mod event_sync_command;
mod intra_event_source;
mod service_credential_provider;

#[cfg(test)]
pub use campus_member_repository::MockCampusMemberRepository;
pub use campus_member_repository::{CampusMemberRepository, CampusMemberRepositoryError};
#[cfg(test)]
pub use campus_repository::MockCampusRepository;
pub use campus_repository::{CampusRepository, CampusRepositoryError};
#[cfg(test)]
pub use event_catalogue_repository::MockEventCatalogueRepository;
pub use event_catalogue_repository::{
    CatalogueInsertOutcome, EventCatalogueRepository, EventCatalogueRepositoryError,
};
#[cfg(test)]
pub use event_sync_command::MockEventSyncCommand;
pub use event_sync_command::{EventSyncCommand, SyncSummary};
#[cfg(test)]
pub use intra_event_source::MockIntraEventSource;
pub use intra_event_source::{EventSubscriber, IntraEventSource, IntraSourceError, UpstreamEvent};
#[cfg(test)]
pub use service_credential_provider::MockServiceCredentialProvider;
pub use service_credential_provider::{
    AccessToken, CredentialError, FixtureServiceCredentialProvider, ServiceCredentialProvider,
};
