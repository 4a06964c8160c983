//! Run one event sync and print its summary.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::Write;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::info;

use campus_events::bootstrap::{build_event_sync_service, init_tracing};
use campus_events::config::SyncSettings;
use campus_events::domain::ports::{EventSyncCommand, SyncSummary};
use campus_events::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

/// `sync-events` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sync-events",
    about = "Pull intranet events for every campus into the catalogue once",
    version
)]
struct CliArgs {
    /// Database connection URL. Overrides settings and `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Apply pending schema migrations before syncing.
    #[arg(long)]
    migrate: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main())
}

async fn async_main() -> color_eyre::Result<()> {
    init_tracing();
    let args = CliArgs::parse();
    let mut settings = SyncSettings::load_from_iter([std::ffi::OsString::from("sync-events")])
        .wrap_err("load settings")?;
    if let Some(url) = args.database_url {
        settings.database_url = Some(url);
    }
    let database_url = settings.database_url()?;

    if args.migrate {
        let applied = run_pending_migrations(&database_url).await?;
        info!(count = applied.len(), "schema up to date");
    }

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;
    let service = build_event_sync_service(&settings, pool)?;
    let summary = service.run_sync().await.wrap_err("event sync failed")?;

    let mut stdout = std::io::stdout().lock();
    for line in summary_lines(&summary) {
        writeln!(stdout, "{line}").wrap_err("write summary")?;
    }
    Ok(())
}

fn summary_lines(summary: &SyncSummary) -> Vec<String> {
    [
        ("events_added", summary.events_added),
        ("events_updated", summary.events_updated),
        ("events_unchanged", summary.events_unchanged),
        ("events_expired", summary.events_expired),
        ("events_failed", summary.events_failed),
        ("notifications_created", summary.notifications_created),
        ("partial_attendee_counts", summary.partial_attendee_counts),
        ("campuses_synced", summary.campuses_synced),
        ("campuses_skipped", summary.campuses_skipped),
    ]
    .into_iter()
    .map(|(key, value)| format!("{key}={value}"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn summary_prints_one_key_value_line_per_counter() {
        let summary = SyncSummary {
            events_added: 1,
            notifications_created: 3,
            ..SyncSummary::default()
        };

        let lines = summary_lines(&summary);

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "events_added=1");
        assert!(lines.contains(&"notifications_created=3".to_owned()));
    }

    #[rstest]
    fn parses_database_url_and_migrate_flag() {
        let args = CliArgs::try_parse_from([
            "sync-events",
            "--database-url",
            "postgres://localhost/events",
            "--migrate",
        ])
        .expect("arguments parse");

        assert_eq!(args.database_url.as_deref(), Some("postgres://localhost/events"));
        assert!(args.migrate);
    }
}
