//! Inbound adapters that translate external triggers into domain calls.
//!
//! HTTP handlers live under [`http`]; [`schedule`] fires the same
//! [`crate::domain::ports::EventSyncCommand`] on a timer.

pub mod http;
pub mod schedule;
