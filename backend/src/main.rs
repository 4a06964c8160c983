//! Server entry-point: sync trigger, health probes, and the optional
//! scheduled sync.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::info;

use campus_events::bootstrap::{build_event_sync_service, init_tracing};
use campus_events::config::SyncSettings;
use campus_events::domain::ports::EventSyncCommand;
use campus_events::inbound::http::health::HealthState;
use campus_events::inbound::http::state::HttpState;
use campus_events::inbound::schedule::spawn_periodic_sync;
use campus_events::outbound::persistence::{DbPool, PoolConfig};

mod server;

#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = SyncSettings::load().wrap_err("load settings")?;
    let database_url = settings.database_url()?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;

    let event_sync: Arc<dyn EventSyncCommand> =
        Arc::new(build_event_sync_service(&settings, pool)?);
    let scheduler = settings
        .sync_interval()
        .map(|period| spawn_periodic_sync(event_sync.clone(), period));

    let health_state = web::Data::new(HealthState::new());
    let http_state = web::Data::new(HttpState::new(event_sync));
    let bind_addr = settings.bind_addr();
    let server = server::create_server(health_state.clone(), http_state, bind_addr)
        .wrap_err_with(|| format!("bind {bind_addr}"))?;

    health_state.mark_ready();
    info!(%bind_addr, "campus events server listening");
    let result = server.await;

    health_state.mark_unhealthy();
    if let Some(handle) = scheduler {
        handle.abort();
    }
    result.wrap_err("server terminated")
}
