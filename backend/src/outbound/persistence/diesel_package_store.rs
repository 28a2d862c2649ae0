//! PostgreSQL-backed `PackageStore` implementation using Diesel ORM.
//!
//! `apply_scan` runs the conditional package write and the tracking event
//! insert inside one transaction. Transitions use
//! `UPDATE ... WHERE id = $1 AND version = $2`, so a concurrent writer that
//! committed first leaves zero matching rows; the adapter then re-reads the
//! row to tell a version conflict from a deleted package. Non-transitioning
//! scans lock the row with `SELECT ... FOR UPDATE` and compare versions
//! before appending their event.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{PackageStore, PackageStoreError, ScanUnitOfWork};
use crate::domain::{
    AgentId, AreaId, Package, PackageCode, PackageId, PackageState, ScanMetadata, TrackingEvent,
    TrackingEventType, UserId,
};

use super::diesel_helpers::{
    cast_version, cast_version_for_db, map_diesel_error as map_diesel, map_pool_error as map_pool,
};
use super::models::{NewTrackingEventRow, PackageRow, TrackingEventRow};
use super::pool::{DbPool, PoolError};
use super::schema::{agents, packages, tracking_events};

/// Diesel-backed implementation of the package store port.
#[derive(Clone)]
pub struct DieselPackageStore {
    pool: DbPool,
}

impl DieselPackageStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PackageStoreError {
    map_pool(error, PackageStoreError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PackageStoreError {
    map_diesel(error, PackageStoreError::query, PackageStoreError::connection)
}

/// Failure inside the scan transaction.
///
/// Diesel requires the transaction error to absorb `diesel::result::Error`;
/// store errors raised by the version checks travel alongside it so the
/// rollback still happens.
#[derive(Debug)]
enum ApplyFailure {
    Store(PackageStoreError),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for ApplyFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl ApplyFailure {
    fn into_store_error(self) -> PackageStoreError {
        match self {
            Self::Store(error) => error,
            Self::Database(error) => map_diesel_error(error),
        }
    }
}

fn parse_stored<T, E>(value: &str, column: &str) -> Result<T, PackageStoreError>
where
    T: std::str::FromStr<Err = E>,
    E: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| PackageStoreError::query(format!("invalid {column}: {err}")))
}

/// Convert a database row into a domain package.
///
/// `agent_areas` maps agent ids to their area so agent-pinned ends of the
/// route report an area even when the package row leaves it empty.
fn row_to_package(
    row: PackageRow,
    agent_areas: &HashMap<Uuid, Uuid>,
) -> Result<Package, PackageStoreError> {
    let PackageRow {
        id,
        code,
        state,
        origin_area_id,
        destination_area_id,
        origin_agent_id,
        destination_agent_id,
        owner_user_id,
        delivery_type,
        cost,
        origin_label,
        destination_label,
        sender_name,
        receiver_name,
        version,
        created_at,
        updated_at,
    } = row;

    let pinned = |area: Option<Uuid>, agent: Option<Uuid>| {
        area.or_else(|| agent.and_then(|agent| agent_areas.get(&agent).copied()))
            .map(AreaId::from_uuid)
    };

    Ok(Package {
        id: PackageId::from_uuid(id),
        code: PackageCode::new(code)
            .map_err(|err| PackageStoreError::query(format!("invalid code: {err}")))?,
        state: parse_stored(&state, "state")?,
        origin_area_id: pinned(origin_area_id, origin_agent_id),
        destination_area_id: pinned(destination_area_id, destination_agent_id),
        origin_agent_id: origin_agent_id.map(AgentId::from_uuid),
        destination_agent_id: destination_agent_id.map(AgentId::from_uuid),
        owner_user_id: UserId::from_uuid(owner_user_id),
        delivery_type: parse_stored(&delivery_type, "delivery_type")?,
        cost,
        origin_label,
        destination_label,
        sender_name,
        receiver_name,
        version: cast_version(version),
        created_at,
        updated_at,
    })
}

/// Agents whose area must be looked up to resolve the package's route.
fn unpinned_agents(row: &PackageRow) -> Vec<Uuid> {
    [
        row.origin_area_id.is_none().then_some(row.origin_agent_id),
        row.destination_area_id.is_none().then_some(row.destination_agent_id),
    ]
    .into_iter()
    .flatten()
    .flatten()
    .collect()
}

fn row_to_tracking_event(row: TrackingEventRow) -> Result<TrackingEvent, PackageStoreError> {
    let metadata: ScanMetadata = serde_json::from_value(row.metadata)
        .map_err(|err| PackageStoreError::query(format!("decode metadata: {err}")))?;

    Ok(TrackingEvent {
        id: row.id,
        package_id: PackageId::from_uuid(row.package_id),
        package_code: PackageCode::new(row.package_code)
            .map_err(|err| PackageStoreError::query(format!("invalid code: {err}")))?,
        actor_user_id: UserId::from_uuid(row.actor_user_id),
        event_type: TrackingEventType::from_stored(row.event_type),
        action: parse_stored(&row.action, "action")?,
        from_state: parse_stored(&row.from_state, "from_state")?,
        to_state: parse_stored(&row.to_state, "to_state")?,
        metadata,
        created_at: row.created_at,
    })
}

/// Explain why a versioned update matched no rows.
async fn disambiguate_zero_rows(
    conn: &mut AsyncPgConnection,
    work: &ScanUnitOfWork,
) -> ApplyFailure {
    let current = packages::table
        .filter(packages::id.eq(work.package_id.as_uuid()))
        .select(packages::version)
        .first::<i32>(conn)
        .await
        .optional();

    match current {
        Ok(Some(actual)) => ApplyFailure::Store(PackageStoreError::version_conflict(
            work.expected_version,
            cast_version(actual),
        )),
        Ok(None) => ApplyFailure::Store(PackageStoreError::missing(work.package_id.to_string())),
        Err(err) => ApplyFailure::Database(err),
    }
}

async fn advance_package(
    conn: &mut AsyncPgConnection,
    work: &ScanUnitOfWork,
    next: PackageState,
) -> Result<u32, ApplyFailure> {
    let updated = diesel::update(packages::table)
        .filter(
            packages::id
                .eq(work.package_id.as_uuid())
                .and(packages::version.eq(cast_version_for_db(work.expected_version))),
        )
        .set((
            packages::state.eq(next.as_str()),
            packages::version.eq(packages::version + 1),
            packages::updated_at.eq(work.event.created_at),
        ))
        .returning(packages::version)
        .get_result::<i32>(conn)
        .await
        .optional()?;

    match updated {
        Some(version) => Ok(cast_version(version)),
        None => Err(disambiguate_zero_rows(conn, work).await),
    }
}

async fn confirm_version(
    conn: &mut AsyncPgConnection,
    work: &ScanUnitOfWork,
) -> Result<u32, ApplyFailure> {
    let current = packages::table
        .filter(packages::id.eq(work.package_id.as_uuid()))
        .select(packages::version)
        .for_update()
        .first::<i32>(conn)
        .await
        .optional()?;

    match current.map(cast_version) {
        Some(version) if version == work.expected_version => Ok(version),
        Some(actual) => Err(ApplyFailure::Store(PackageStoreError::version_conflict(
            work.expected_version,
            actual,
        ))),
        None => Err(ApplyFailure::Store(PackageStoreError::missing(
            work.package_id.to_string(),
        ))),
    }
}

async fn append_event(
    conn: &mut AsyncPgConnection,
    event: &TrackingEvent,
    metadata: serde_json::Value,
) -> Result<(), ApplyFailure> {
    let row = NewTrackingEventRow {
        id: event.id,
        package_id: *event.package_id.as_uuid(),
        package_code: event.package_code.as_str(),
        actor_user_id: *event.actor_user_id.as_uuid(),
        event_type: event.event_type.as_str(),
        action: event.action.as_str(),
        from_state: event.from_state.as_str(),
        to_state: event.to_state.as_str(),
        metadata,
        created_at: event.created_at,
    };

    diesel::insert_into(tracking_events::table)
        .values(&row)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl PackageStore for DieselPackageStore {
    async fn load_package_by_code(
        &self,
        code: &PackageCode,
    ) -> Result<Option<Package>, PackageStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(row) = packages::table
            .filter(packages::code.eq(code.as_str()))
            .select(PackageRow::as_select())
            .first::<PackageRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let agent_ids = unpinned_agents(&row);
        let agent_areas: HashMap<Uuid, Uuid> = if agent_ids.is_empty() {
            HashMap::new()
        } else {
            agents::table
                .filter(agents::id.eq_any(agent_ids))
                .select((agents::id, agents::area_id))
                .load::<(Uuid, Option<Uuid>)>(&mut conn)
                .await
                .map_err(map_diesel_error)?
                .into_iter()
                .filter_map(|(agent, area)| area.map(|area| (agent, area)))
                .collect()
        };

        row_to_package(row, &agent_areas).map(Some)
    }

    async fn apply_scan(&self, work: &ScanUnitOfWork) -> Result<u32, PackageStoreError> {
        let metadata = serde_json::to_value(&work.event.metadata)
            .map_err(|err| PackageStoreError::query(format!("encode metadata: {err}")))?;
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<_, ApplyFailure, _>(|conn| {
            async move {
                let version = match work.next_state {
                    Some(next) => advance_package(conn, work, next).await?,
                    None => confirm_version(conn, work).await?,
                };
                append_event(conn, &work.event, metadata).await?;
                Ok(version)
            }
            .scope_boxed()
        })
        .await
        .map_err(ApplyFailure::into_store_error)
    }

    async fn tracking_events(
        &self,
        package_id: &PackageId,
    ) -> Result<Vec<TrackingEvent>, PackageStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TrackingEventRow> = tracking_events::table
            .filter(tracking_events::package_id.eq(package_id.as_uuid()))
            .order((tracking_events::created_at.asc(), tracking_events::id.asc()))
            .select(TrackingEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_tracking_event).collect()
    }
}
