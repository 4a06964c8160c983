//! Driven port resolving the members of a campus.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{CampusId, CampusMember};

define_port_error! {
    /// Errors raised while reading campus members.
    pub enum CampusMemberRepositoryError {
        /// Storage could not be reached.
        Connection { message: String } =>
            "campus member repository connection failed: {message}",
        /// The query failed or returned malformed rows.
        Query { message: String } =>
            "campus member repository query failed: {message}",
    }
}

/// Port listing users registered at a campus.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampusMemberRepository: Send + Sync {
    /// Return every user whose campus list contains `campus_id`.
    async fn list_users_by_campus(
        &self,
        campus_id: CampusId,
    ) -> Result<Vec<CampusMember>, CampusMemberRepositoryError>;
}
