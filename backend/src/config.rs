//! Sync and server settings loaded via OrthoConfig.
//!
//! Every field is optional; accessors supply the defaults. Values come from
//! `EVENTS_SYNC_*` environment variables, configuration files, and CLI
//! arguments in OrthoConfig's usual precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use pagination::PageSize;
use serde::Deserialize;
use url::Url;

use crate::domain::EventSyncConfig;

const DEFAULT_API_BASE_URL: &str = "https://api.intra.42.fr";
const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_PAGE_SIZE: i64 = 100;
const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_PAGE_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A URL setting did not parse.
    #[error("invalid {field}: {message}")]
    InvalidUrl {
        field: &'static str,
        message: String,
    },
    /// A setting needed for the requested operation is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

/// Settings for the sync engine, its upstream adapters, and the server.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EVENTS_SYNC")]
pub struct SyncSettings {
    /// Intranet API base URL.
    pub api_base_url: Option<String>,
    /// OAuth token endpoint; derived from the API base URL when unset.
    pub token_url: Option<String>,
    /// OAuth application identifier.
    pub client_id: Option<String>,
    /// OAuth application secret.
    pub client_secret: Option<String>,
    /// PostgreSQL connection URL; falls back to `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Subscriber page size requested upstream.
    pub page_size: Option<i64>,
    /// Minimum spacing between upstream requests, in milliseconds.
    pub request_interval_ms: Option<u64>,
    /// Attempts per subscriber page.
    pub max_page_attempts: Option<u32>,
    /// First retry backoff, in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Retry backoff cap, in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Period of the scheduled sync; no scheduler runs when unset.
    pub sync_interval_secs: Option<u64>,
}

impl SyncSettings {
    /// Intranet API base URL, defaulting to the public intranet.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "api_base_url",
            self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL),
        )
    }

    /// OAuth token endpoint, defaulting to `<api_base_url>/oauth/token`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when either URL does not parse.
    pub fn token_url(&self) -> Result<Url, SettingsError> {
        if let Some(raw) = self.token_url.as_deref() {
            return parse_url("token_url", raw);
        }
        let mut url = self.api_base_url()?;
        url.path_segments_mut()
            .map_err(|()| SettingsError::InvalidUrl {
                field: "api_base_url",
                message: "URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .extend(["oauth", "token"]);
        Ok(url)
    }

    /// OAuth client identifier and secret.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] naming the first absent value.
    pub fn client_credentials(&self) -> Result<(&str, &str), SettingsError> {
        let id = non_blank(self.client_id.as_deref()).ok_or(SettingsError::Missing("client_id"))?;
        let secret = non_blank(self.client_secret.as_deref())
            .ok_or(SettingsError::Missing("client_secret"))?;
        Ok((id, secret))
    }

    /// Database URL, falling back to the `DATABASE_URL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when neither source is set.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::Missing("database_url"))
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Server bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Scheduled sync period; `None` disables the scheduler.
    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Engine tuning derived from these settings.
    pub fn event_sync_config(&self) -> EventSyncConfig {
        EventSyncConfig {
            page_size: PageSize::clamped(self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
            request_interval: Duration::from_millis(
                self.request_interval_ms
                    .unwrap_or(DEFAULT_REQUEST_INTERVAL_MS),
            ),
            max_page_attempts: self
                .max_page_attempts
                .unwrap_or(DEFAULT_MAX_PAGE_ATTEMPTS)
                .max(1),
            initial_backoff: Duration::from_millis(
                self.initial_backoff_ms
                    .unwrap_or(DEFAULT_INITIAL_BACKOFF_MS),
            ),
            max_backoff: Duration::from_millis(
                self.max_backoff_ms.unwrap_or(DEFAULT_MAX_BACKOFF_MS),
            ),
            ..EventSyncConfig::default()
        }
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|error| SettingsError::InvalidUrl {
        field,
        message: error.to_string(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    //! Settings loading and default coverage.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 8] = [
        "EVENTS_SYNC_API_BASE_URL",
        "EVENTS_SYNC_TOKEN_URL",
        "EVENTS_SYNC_CLIENT_ID",
        "EVENTS_SYNC_CLIENT_SECRET",
        "EVENTS_SYNC_PAGE_SIZE",
        "EVENTS_SYNC_REQUEST_INTERVAL_MS",
        "EVENTS_SYNC_SYNC_INTERVAL_SECS",
        "EVENTS_SYNC_BIND_ADDR",
    ];

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        KEYS.iter().map(|key| (*key, None)).collect()
    }

    fn load_from_empty_args() -> SyncSettings {
        SyncSettings::load_from_iter([OsString::from("campus-events")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();
        let engine = settings.event_sync_config();

        assert_eq!(
            settings.api_base_url().expect("default URL").as_str(),
            "https://api.intra.42.fr/"
        );
        assert_eq!(
            settings.token_url().expect("derived URL").as_str(),
            "https://api.intra.42.fr/oauth/token"
        );
        assert_eq!(settings.bind_addr().port(), 8080);
        assert_eq!(settings.sync_interval(), None);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(engine, EventSyncConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.extend([
            ("EVENTS_SYNC_API_BASE_URL", Some("https://proxy.example/intra".to_owned())),
            ("EVENTS_SYNC_CLIENT_ID", Some("uid".to_owned())),
            ("EVENTS_SYNC_CLIENT_SECRET", Some("s3cr3t".to_owned())),
            ("EVENTS_SYNC_PAGE_SIZE", Some("40".to_owned())),
            ("EVENTS_SYNC_REQUEST_INTERVAL_MS", Some("250".to_owned())),
            ("EVENTS_SYNC_SYNC_INTERVAL_SECS", Some("600".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        let engine = settings.event_sync_config();

        assert_eq!(
            settings.token_url().expect("derived URL").as_str(),
            "https://proxy.example/intra/oauth/token"
        );
        assert_eq!(
            settings.client_credentials().expect("credentials set"),
            ("uid", "s3cr3t")
        );
        assert_eq!(engine.page_size.get(), 40);
        assert_eq!(engine.request_interval, Duration::from_millis(250));
        assert_eq!(settings.sync_interval(), Some(Duration::from_secs(600)));
    }

    #[rstest]
    #[case::oversized(500, 100)]
    #[case::zero(0, 30)]
    fn page_size_is_clamped(#[case] requested: i64, #[case] expected: u32) {
        let settings = SyncSettings {
            page_size: Some(requested),
            ..SyncSettings::default()
        };
        assert_eq!(settings.event_sync_config().page_size.get(), expected);
    }

    #[rstest]
    fn blank_client_secret_is_missing() {
        let settings = SyncSettings {
            client_id: Some("uid".to_owned()),
            client_secret: Some("  ".to_owned()),
            ..SyncSettings::default()
        };
        assert_eq!(
            settings.client_credentials(),
            Err(SettingsError::Missing("client_secret"))
        );
    }

    #[rstest]
    fn invalid_base_url_is_reported() {
        let settings = SyncSettings {
            api_base_url: Some("not a url".to_owned()),
            ..SyncSettings::default()
        };
        assert!(matches!(
            settings.token_url(),
            Err(SettingsError::InvalidUrl { field: "api_base_url", .. })
        ));
    }
}
