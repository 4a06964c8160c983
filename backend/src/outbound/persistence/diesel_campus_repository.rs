//! PostgreSQL-backed campus directory: campus listing and member lookup.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    CampusMemberRepository, CampusMemberRepositoryError, CampusRepository, CampusRepositoryError,
};
use crate::domain::{Campus, CampusId, CampusMember};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CampusMemberRow, CampusRow};
use super::pool::DbPool;
use super::schema::{campus_members, campuses};

/// Diesel-backed implementation of the campus and campus member ports.
#[derive(Clone)]
pub struct DieselCampusRepository {
    pool: DbPool,
}

impl DieselCampusRepository {
    /// Create a new repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/events")).await?;
    /// let campuses = DieselCampusRepository::new(pool);
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampusRepository for DieselCampusRepository {
    async fn list_all_campuses(&self) -> Result<Vec<Campus>, CampusRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, CampusRepositoryError::connection))?;

        let rows: Vec<CampusRow> = campuses::table
            .select(CampusRow::as_select())
            .order_by(campuses::campus_id)
            .load(&mut conn)
            .await
            .map_err(|error| {
                map_diesel_error(
                    error,
                    "campus listing",
                    CampusRepositoryError::query,
                    CampusRepositoryError::connection,
                )
            })?;

        rows.into_iter()
            .map(|row| Campus::try_from(row).map_err(CampusRepositoryError::query))
            .collect()
    }
}

#[async_trait]
impl CampusMemberRepository for DieselCampusRepository {
    async fn list_users_by_campus(
        &self,
        campus_id: CampusId,
    ) -> Result<Vec<CampusMember>, CampusMemberRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, CampusMemberRepositoryError::connection))?;

        let rows: Vec<CampusMemberRow> = campus_members::table
            .filter(campus_members::campus_ids.contains(vec![campus_id.get()]))
            .select(CampusMemberRow::as_select())
            .order_by(campus_members::user_id)
            .load(&mut conn)
            .await
            .map_err(|error| {
                map_diesel_error(
                    error,
                    "campus member listing",
                    CampusMemberRepositoryError::query,
                    CampusMemberRepositoryError::connection,
                )
            })?;

        Ok(rows.into_iter().map(CampusMember::from).collect())
    }
}
