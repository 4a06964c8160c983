//! Process bootstrap shared by the server and the one-shot CLI.
//!
//! Installs JSON tracing and assembles [`EventSyncService`] from settings and
//! a database pool.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{SettingsError, SyncSettings};
use crate::domain::{EventSyncPorts, EventSyncService};
use crate::outbound::intra::{
    IntraClientCredentials, IntraHttpEventSource, IntraOAuthCredentialProvider,
};
use crate::outbound::persistence::{DbPool, DieselCampusRepository, DieselEventCatalogueRepository};

/// Errors raised while wiring the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Settings were missing or invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// An HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Install the JSON tracing subscriber filtered by `RUST_LOG`.
///
/// A second installation is logged and ignored.
pub fn init_tracing() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
}

/// Build the sync engine over the intranet adapters and Diesel repositories.
///
/// # Errors
///
/// Returns [`BootstrapError`] when credentials or URLs are missing or
/// invalid, or when a reqwest client cannot be built.
pub fn build_event_sync_service(
    settings: &SyncSettings,
    pool: DbPool,
) -> Result<EventSyncService, BootstrapError> {
    let (client_id, client_secret) = settings.client_credentials()?;
    let timeout = settings.request_timeout();

    let credentials = IntraOAuthCredentialProvider::new(
        settings.token_url()?,
        IntraClientCredentials::new(client_id, client_secret),
        timeout,
    )?;
    let source = IntraHttpEventSource::new(settings.api_base_url()?, timeout)?;
    let directory = Arc::new(DieselCampusRepository::new(pool.clone()));

    let ports = EventSyncPorts::new(
        Arc::new(credentials),
        Arc::new(source),
        directory.clone(),
        directory,
        Arc::new(DieselEventCatalogueRepository::new(pool)),
    );
    Ok(EventSyncService::new(
        ports,
        Arc::new(DefaultClock),
        settings.event_sync_config(),
    ))
}
