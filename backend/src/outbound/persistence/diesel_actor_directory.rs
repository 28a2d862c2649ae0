//! PostgreSQL-backed `ActorDirectory` implementation using Diesel ORM.
//!
//! Area reach comes from the membership table matching the actor's primary
//! role: `agent_areas`, `rider_areas`, or `warehouse_staff_locations`
//! joined to areas through `areas.location_id`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ActorDirectory, ActorDirectoryError};
use crate::domain::{Actor, AreaAccess, AreaId, Role, UserId};

use super::diesel_helpers::{map_diesel_error as map_diesel, map_pool_error as map_pool};
use super::pool::{DbPool, PoolError};
use super::schema::{agent_areas, areas, rider_areas, user_roles, warehouse_staff_locations};

/// Diesel-backed implementation of the actor directory port.
#[derive(Clone)]
pub struct DieselActorDirectory {
    pool: DbPool,
}

impl DieselActorDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn agent_areas(&self, user: Uuid) -> Result<Vec<Uuid>, ActorDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        agent_areas::table
            .filter(agent_areas::user_id.eq(user))
            .select(agent_areas::area_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn rider_areas(&self, user: Uuid) -> Result<Vec<Uuid>, ActorDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        rider_areas::table
            .filter(rider_areas::user_id.eq(user))
            .select(rider_areas::area_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    /// Areas grouped under any location the staff member works at.
    async fn warehouse_areas(&self, user: Uuid) -> Result<Vec<Uuid>, ActorDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let locations = warehouse_staff_locations::table
            .filter(warehouse_staff_locations::user_id.eq(user))
            .select(warehouse_staff_locations::location_id.nullable());
        areas::table
            .filter(areas::location_id.eq_any(locations))
            .select(areas::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

fn map_pool_error(error: PoolError) -> ActorDirectoryError {
    map_pool(error, ActorDirectoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ActorDirectoryError {
    map_diesel(
        error,
        ActorDirectoryError::query,
        ActorDirectoryError::connection,
    )
}

fn parse_role(raw: &str) -> Result<Role, ActorDirectoryError> {
    raw.parse::<Role>()
        .map_err(|err| ActorDirectoryError::query(err.to_string()))
}

fn to_access(rows: Vec<Uuid>) -> AreaAccess {
    AreaAccess::from_areas(rows.into_iter().map(AreaId::from_uuid))
}

#[async_trait]
impl ActorDirectory for DieselActorDirectory {
    async fn find_actor(&self, user_id: &UserId) -> Result<Option<Actor>, ActorDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let role: Option<String> = user_roles::table
            .filter(
                user_roles::user_id
                    .eq(user_id.as_uuid())
                    .and(user_roles::is_primary.eq(true)),
            )
            .select(user_roles::role)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        role.map(|raw| Ok(Actor::new(user_id.clone(), parse_role(&raw)?)))
            .transpose()
    }

    async fn resolve_accessible_areas(
        &self,
        actor: &Actor,
    ) -> Result<AreaAccess, ActorDirectoryError> {
        let user = *actor.id.as_uuid();
        match actor.role {
            Role::Admin => Ok(AreaAccess::Unrestricted),
            Role::Client | Role::Support => Ok(AreaAccess::none()),
            Role::Agent => self.agent_areas(user).await.map(to_access),
            Role::Rider => self.rider_areas(user).await.map(to_access),
            Role::Warehouse => self.warehouse_areas(user).await.map(to_access),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for role parsing and error mapping.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rider", Role::Rider)]
    #[case("warehouse", Role::Warehouse)]
    fn stored_roles_parse(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(parse_role(raw), Ok(expected));
    }

    #[rstest]
    fn unknown_stored_role_is_a_query_error() {
        let err = parse_role("courier").expect_err("role is unknown");
        assert!(matches!(err, ActorDirectoryError::Query { .. }));
        assert!(err.to_string().contains("courier"));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, ActorDirectoryError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn membership_rows_become_area_access() {
        let area = Uuid::new_v4();
        let access = to_access(vec![area]);
        assert!(access.contains(&AreaId::from_uuid(area)));
        assert!(!access.contains(&AreaId::random()));
    }
}
