//! Shared Diesel and pool error mapping for the catalogue repositories.
//!
//! Every repository port error carries `Connection` and `Query` variants.
//! These helpers decide which one a storage failure becomes so the sync engine
//! can tell an unreachable database from a failing statement.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure into a repository connection error.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map a Diesel failure into a repository query or connection error.
pub(super) fn map_diesel_error<E>(
    error: DieselError,
    operation: &str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(%error, %operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            connection(format!("{operation}: database connection lost"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query(format!("{operation}: serialization failure"))
        }
        DieselError::DatabaseError(_, info) => query(format!("{operation}: {}", info.message())),
        other => query(format!("{operation}: {other}")),
    }
}
