//! Domain primitives, ports, and the event sync engine.
//!
//! Purpose: keep catalogue entities, sync rules, and error semantics free of
//! transport and storage concerns. Adapters in `inbound` and `outbound`
//! implement or drive the ports declared in [`ports`].
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: transport-agnostic failure payload.
//! - [`CatalogueEvent`], [`Campus`], [`CampusMember`], [`NotificationRecord`]:
//!   catalogue entities keyed by upstream identifiers.
//! - [`EventSyncService`]: orchestrator behind the `EventSyncCommand` port.

pub mod error;
pub mod event_catalogue;
pub mod event_sync;
pub mod ports;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::event_catalogue::{
    Campus, CampusId, CampusMember, CatalogueEvent, EventId, NotificationRecord, TrackId, UserId,
};
pub use self::event_sync::{
    AttemptJitter, BackoffJitter, EventSyncConfig, EventSyncPorts, EventSyncRuntime,
    EventSyncService, SyncSleeper, TokioSleeper,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use campus_events::domain::{ApiResult, Error};
///
/// fn trigger() -> ApiResult<()> {
///     Err(Error::conflict("an event sync is already running"))
/// }
/// assert!(trigger().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
