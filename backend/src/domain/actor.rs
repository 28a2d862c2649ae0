//! Actors performing scans and their resolved area reach.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::AreaId;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserIdValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserIdValidationError> {
        if id.is_empty() {
            return Err(UserIdValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserIdValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserIdValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Primary role used for authorization decisions.
///
/// A user may hold several role memberships; the directory reports the one
/// that governs the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Agent,
    Rider,
    Warehouse,
    Support,
    Admin,
}

impl Role {
    /// Every role.
    pub const ALL: [Self; 6] = [
        Self::Client,
        Self::Agent,
        Self::Rider,
        Self::Warehouse,
        Self::Support,
        Self::Admin,
    ];

    /// Stable storage and display form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Agent => "agent",
            Self::Rider => "rider",
            Self::Warehouse => "warehouse",
            Self::Support => "support",
            Self::Admin => "admin",
        }
    }

    /// Whether the role's area reach comes from membership rows.
    pub const fn is_area_bound(self) -> bool {
        matches!(self, Self::Agent | Self::Rider | Self::Warehouse)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_owned()))
    }
}

/// The user performing a scan, with their primary role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    /// Build an actor.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Resolved set of areas an actor operates in.
///
/// `Unrestricted` is a marker rather than a materialised list of every area;
/// membership checks against it always succeed.
///
/// # Examples
/// ```
/// use courier::domain::{AreaAccess, AreaId};
///
/// let area = AreaId::random();
/// assert!(AreaAccess::Unrestricted.contains(&area));
/// assert!(!AreaAccess::none().contains(&area));
/// assert!(AreaAccess::from_areas([area]).contains(&area));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaAccess {
    /// Reach over every area without enumerating them.
    Unrestricted,
    /// Reach limited to explicit membership rows.
    Areas(HashSet<AreaId>),
}

impl AreaAccess {
    /// No reach at all.
    pub fn none() -> Self {
        Self::Areas(HashSet::new())
    }

    /// Reach limited to the given areas.
    pub fn from_areas(areas: impl IntoIterator<Item = AreaId>) -> Self {
        Self::Areas(areas.into_iter().collect())
    }

    /// Whether `area` is reachable.
    pub fn contains(&self, area: &AreaId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Areas(areas) => areas.contains(area),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for actor primitives.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserIdValidationError::EmptyId)]
    #[case("not-a-uuid", UserIdValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserIdValidationError::InvalidId)]
    fn user_id_rejects_malformed_input(
        #[case] raw: &str,
        #[case] expected: UserIdValidationError,
    ) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn user_id_round_trips_display() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id = UserId::new(raw).expect("valid id");
        assert_eq!(id.to_string(), raw);
        assert_eq!(UserId::from_uuid(*id.as_uuid()), id);
    }

    #[rstest]
    fn role_parses_its_own_string_form() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "courier".parse::<Role>(),
            Err(UnknownRole("courier".to_owned()))
        );
    }

    #[rstest]
    #[case(Role::Agent, true)]
    #[case(Role::Rider, true)]
    #[case(Role::Warehouse, true)]
    #[case(Role::Client, false)]
    #[case(Role::Support, false)]
    #[case(Role::Admin, false)]
    fn area_bound_roles(#[case] role: Role, #[case] expected: bool) {
        assert_eq!(role.is_area_bound(), expected);
    }

    #[rstest]
    fn explicit_areas_only_contain_members() {
        let member = AreaId::random();
        let access = AreaAccess::from_areas([member]);
        assert!(access.contains(&member));
        assert!(!access.contains(&AreaId::random()));
    }
}
