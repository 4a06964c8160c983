//! Driven port for reading provisioned campuses.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Campus;

define_port_error! {
    /// Errors raised while reading campuses.
    pub enum CampusRepositoryError {
        /// Storage could not be reached.
        Connection { message: String } => "campus repository connection failed: {message}",
        /// The query failed or returned malformed rows.
        Query { message: String } => "campus repository query failed: {message}",
    }
}

/// Port listing every campus known to storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampusRepository: Send + Sync {
    /// Return all campuses.
    async fn list_all_campuses(&self) -> Result<Vec<Campus>, CampusRepositoryError>;
}
