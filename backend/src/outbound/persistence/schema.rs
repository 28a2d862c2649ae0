//! Diesel table definitions for the courier scanning schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Named operating regions.
    areas (id) {
        id -> Uuid,
        name -> Varchar,
        /// Optional grouping used by warehouse staff memberships.
        location_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Warehouse locations grouping one or more areas.
    locations (id) {
        id -> Uuid,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Staff pickup and drop-off points. A package pinned to an agent
    /// inherits the agent's area.
    agents (id) {
        id -> Uuid,
        name -> Varchar,
        area_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role memberships. Exactly one row per user is flagged primary.
    user_roles (user_id, role) {
        user_id -> Uuid,
        role -> Varchar,
        is_primary -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Areas an agent-role user operates in.
    agent_areas (user_id, area_id) {
        user_id -> Uuid,
        area_id -> Uuid,
    }
}

diesel::table! {
    /// Areas a rider operates in.
    rider_areas (user_id, area_id) {
        user_id -> Uuid,
        area_id -> Uuid,
    }
}

diesel::table! {
    /// Locations a warehouse staff member works at; areas are reached
    /// through `areas.location_id`.
    warehouse_staff_locations (user_id, location_id) {
        user_id -> Uuid,
        location_id -> Uuid,
    }
}

diesel::table! {
    /// Physical parcels. `state` and `version` are only written by scans.
    packages (id) {
        id -> Uuid,
        /// Unique printed code.
        code -> Varchar,
        state -> Varchar,
        origin_area_id -> Nullable<Uuid>,
        destination_area_id -> Nullable<Uuid>,
        origin_agent_id -> Nullable<Uuid>,
        destination_agent_id -> Nullable<Uuid>,
        owner_user_id -> Uuid,
        delivery_type -> Varchar,
        /// Minor currency units.
        cost -> Int8,
        origin_label -> Varchar,
        destination_label -> Varchar,
        sender_name -> Varchar,
        receiver_name -> Varchar,
        /// Optimistic concurrency token, bumped on every state write.
        version -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit log of executed scans.
    tracking_events (id) {
        id -> Uuid,
        package_id -> Uuid,
        package_code -> Varchar,
        actor_user_id -> Uuid,
        event_type -> Varchar,
        action -> Varchar,
        from_state -> Varchar,
        to_state -> Varchar,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(areas -> locations (location_id));
diesel::joinable!(agents -> areas (area_id));
diesel::joinable!(agent_areas -> areas (area_id));
diesel::joinable!(rider_areas -> areas (area_id));
diesel::joinable!(warehouse_staff_locations -> locations (location_id));
diesel::joinable!(tracking_events -> packages (package_id));

diesel::allow_tables_to_appear_in_same_query!(
    agent_areas,
    agents,
    areas,
    locations,
    packages,
    rider_areas,
    tracking_events,
    user_roles,
    warehouse_staff_locations,
);
