//! Campus event sync: pulls intranet events per campus, reconciles them
//! with the local catalogue, and notifies campus members of new events.

pub mod bootstrap;
pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
