//! Package aggregate and its identifiers.
//!
//! A package's `state` is only ever advanced through the transition table in
//! [`crate::domain::transitions`]; nothing else in the crate writes it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::UserId;

/// Maximum accepted length of a package code.
pub const PACKAGE_CODE_MAX: usize = 64;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id! {
    /// Internal package row identifier.
    PackageId
}

uuid_id! {
    /// Operating area identifier.
    AreaId
}

uuid_id! {
    /// Staff agent (pickup/drop-off point) identifier.
    AgentId
}

/// Validation errors returned when constructing [`PackageCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageCodeValidationError {
    /// Code is empty after trimming whitespace.
    #[error("package code must not be empty")]
    Empty,
    /// Code has leading or trailing whitespace.
    #[error("package code must not contain surrounding whitespace")]
    ContainsWhitespace,
    /// Code exceeds [`PACKAGE_CODE_MAX`] characters.
    #[error("package code must be at most {max} characters")]
    TooLong { max: usize },
}

/// Globally unique, immutable package code printed on labels.
///
/// # Examples
/// ```
/// use courier::domain::PackageCode;
///
/// let code = PackageCode::new("PKG-001").expect("valid code");
/// assert_eq!(code.as_str(), "PKG-001");
/// assert!(PackageCode::new(" PKG-001").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageCode(String);

impl PackageCode {
    /// Validate and construct a package code.
    pub fn new(value: impl Into<String>) -> Result<Self, PackageCodeValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PackageCodeValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(PackageCodeValidationError::ContainsWhitespace);
        }
        if raw.chars().count() > PACKAGE_CODE_MAX {
            return Err(PackageCodeValidationError::TooLong {
                max: PACKAGE_CODE_MAX,
            });
        }
        Ok(Self(raw))
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PackageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for PackageCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<PackageCode> for String {
    fn from(value: PackageCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for PackageCode {
    type Error = PackageCodeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lifecycle state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
    /// Created by the client, awaiting payment.
    PendingUnpaid,
    /// Paid, awaiting drop-off.
    Pending,
    /// Handed over at the origin point.
    Submitted,
    /// Collected and moving toward the destination.
    InTransit,
    /// Delivered at the destination.
    Delivered,
    /// Confirmed by the receiver. Terminal.
    Collected,
    /// Rejected by staff; may be resubmitted.
    Rejected,
}

impl PackageState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::PendingUnpaid,
        Self::Pending,
        Self::Submitted,
        Self::InTransit,
        Self::Delivered,
        Self::Collected,
        Self::Rejected,
    ];

    /// Stable storage and display form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingUnpaid => "pending_unpaid",
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Collected => "collected",
            Self::Rejected => "rejected",
        }
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Collected)
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored state string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown package state: {0}")]
pub struct UnknownPackageState(pub String);

impl FromStr for PackageState {
    type Err = UnknownPackageState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| UnknownPackageState(value.to_owned()))
    }
}

/// How the package is handed over at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Fragile,
    Doorstep,
    Agent,
    Mixed,
    Collection,
}

impl DeliveryType {
    const ALL: [Self; 5] = [
        Self::Fragile,
        Self::Doorstep,
        Self::Agent,
        Self::Mixed,
        Self::Collection,
    ];

    /// Stable storage and display form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fragile => "fragile",
            Self::Doorstep => "doorstep",
            Self::Agent => "agent",
            Self::Mixed => "mixed",
            Self::Collection => "collection",
        }
    }
}

/// Raised when a stored delivery type string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown delivery type: {0}")]
pub struct UnknownDeliveryType(pub String);

impl FromStr for DeliveryType {
    type Err = UnknownDeliveryType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownDeliveryType(value.to_owned()))
    }
}

/// One physical parcel.
///
/// `origin_area_id` / `destination_area_id` are reported by the store with
/// agent-pinned areas already resolved, so authorization only looks at the
/// area fields. `version` is the optimistic concurrency token compared by
/// [`crate::domain::ports::PackageStore::apply_scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: PackageId,
    pub code: PackageCode,
    pub state: PackageState,
    pub origin_area_id: Option<AreaId>,
    pub destination_area_id: Option<AreaId>,
    pub origin_agent_id: Option<AgentId>,
    pub destination_agent_id: Option<AgentId>,
    pub owner_user_id: UserId,
    pub delivery_type: DeliveryType,
    /// Cost in minor currency units.
    pub cost: i64,
    /// Display label of the origin (area name or address).
    pub origin_label: String,
    /// Display label of the destination (area name or address).
    pub destination_label: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// Human readable route used on printed labels.
    pub fn route_description(&self) -> String {
        format!("{} → {}", self.origin_label, self.destination_label)
    }
}
