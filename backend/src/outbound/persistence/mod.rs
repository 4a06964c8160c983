//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the campus, campus member, and event
//! catalogue ports backed by PostgreSQL through `diesel-async` and a `bb8`
//! pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Reconciliation rules live in the domain.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Atomic fan-out**: an event insert and its notifications share one
//!   transaction; both use `ON CONFLICT DO NOTHING`.
//!
//! # Example
//!
//! ```ignore
//! use campus_events::outbound::persistence::{DbPool, DieselEventCatalogueRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/events")).await?;
//! let catalogue = DieselEventCatalogueRepository::new(pool);
//! ```

mod diesel_campus_repository;
mod diesel_error_mapping;
mod diesel_event_catalogue_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_campus_repository::DieselCampusRepository;
pub use diesel_event_catalogue_repository::DieselEventCatalogueRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
