//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **intra**: reqwest clients for the intranet API and its OAuth endpoint
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod intra;
pub mod persistence;
