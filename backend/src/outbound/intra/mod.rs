//! Intranet outbound adapters.
//!
//! Thin reqwest implementations of the `IntraEventSource` and
//! `ServiceCredentialProvider` ports.

mod dto;
mod http_source;
mod oauth;
mod status;

pub use http_source::IntraHttpEventSource;
pub use oauth::{IntraClientCredentials, IntraOAuthCredentialProvider};
