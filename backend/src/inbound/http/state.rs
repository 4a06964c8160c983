//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and depend only on
//! the driving port, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::EventSyncCommand;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub event_sync: Arc<dyn EventSyncCommand>,
}

impl HttpState {
    /// Construct state around the sync trigger.
    pub fn new(event_sync: Arc<dyn EventSyncCommand>) -> Self {
        Self { event_sync }
    }
}
