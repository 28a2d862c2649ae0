//! Builders for domain values used across test suites.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Actor, AreaId, DeliveryType, Package, PackageCode, PackageId, PackageState, Role, UserId,
};

/// Reference instant shared by fixtures.
pub fn fixture_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single() {
        Some(now) => now,
        None => panic!("fixture timestamp must be valid"),
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(fixture_now())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Address-based package (no areas) owned by a random client.
///
/// # Panics
/// Panics when `code` is not a valid package code.
pub fn package_in_state(code: &str, state: PackageState) -> Package {
    let code = match PackageCode::new(code) {
        Ok(code) => code,
        Err(error) => panic!("fixture package code {code:?} is invalid: {error}"),
    };
    Package {
        id: PackageId::random(),
        code,
        state,
        origin_area_id: None,
        destination_area_id: None,
        origin_agent_id: None,
        destination_agent_id: None,
        owner_user_id: UserId::random(),
        delivery_type: DeliveryType::Doorstep,
        cost: 45_000,
        origin_label: "Westlands".to_owned(),
        destination_label: "Kilimani".to_owned(),
        sender_name: "Amina Njeri".to_owned(),
        receiver_name: "Brian Otieno".to_owned(),
        version: 1,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

/// Package travelling between two areas.
///
/// # Panics
/// Panics when `code` is not a valid package code.
pub fn package_between(
    code: &str,
    state: PackageState,
    origin: AreaId,
    destination: AreaId,
) -> Package {
    Package {
        origin_area_id: Some(origin),
        destination_area_id: Some(destination),
        ..package_in_state(code, state)
    }
}

/// Actor with a random id.
pub fn actor_with_role(role: Role) -> Actor {
    Actor::new(UserId::random(), role)
}
