//! HTTP inbound adapter exposing the sync trigger and health probes.

pub mod error;
pub mod fallback;
pub mod health;
pub mod request_span;
pub mod schemas;
pub mod state;
pub mod sync;

pub use error::ApiResult;
