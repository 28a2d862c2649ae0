//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{packages, tracking_events};

/// Row struct for reading from the packages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PackageRow {
    pub id: Uuid,
    pub code: String,
    pub state: String,
    pub origin_area_id: Option<Uuid>,
    pub destination_area_id: Option<Uuid>,
    pub origin_agent_id: Option<Uuid>,
    pub destination_agent_id: Option<Uuid>,
    pub owner_user_id: Uuid,
    pub delivery_type: String,
    pub cost: i64,
    pub origin_label: String,
    pub destination_label: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tracking event models
// ---------------------------------------------------------------------------

/// Row struct for reading from the tracking_events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tracking_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TrackingEventRow {
    pub id: Uuid,
    pub package_id: Uuid,
    pub package_code: String,
    pub actor_user_id: Uuid,
    pub event_type: String,
    pub action: String,
    pub from_state: String,
    pub to_state: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending tracking events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tracking_events)]
pub(crate) struct NewTrackingEventRow<'a> {
    pub id: Uuid,
    pub package_id: Uuid,
    pub package_code: &'a str,
    pub actor_user_id: Uuid,
    pub event_type: &'a str,
    pub action: &'a str,
    pub from_state: &'a str,
    pub to_state: &'a str,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
