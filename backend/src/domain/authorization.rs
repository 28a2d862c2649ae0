//! Role and area authorization for scan actions.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. `admin` may do anything.
//! 2. `collect` needs an agent or rider operating in the origin area.
//! 3. `deliver` needs a rider operating in the destination area.
//! 4. `print` is open to agents, riders, and warehouse staff in any area.
//! 5. `process` is reserved for warehouse staff.
//! 6. `confirm_receipt` is reserved for the package owner.
//! 7. Everything else is denied.

use std::fmt;

use super::{Actor, AreaAccess, AreaId, Package, Role, ScanAction};

/// Why a request was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationReason {
    /// Admins bypass every other rule.
    AdminOverride,
    /// The actor's role and area reach satisfy the action's rule.
    RoleInArea,
    /// The action is open to the actor's role regardless of area.
    RolePermitted,
    /// The actor owns the package.
    PackageOwner,
    /// The actor's role may not perform the action.
    RoleNotPermitted,
    /// The role fits but the actor does not operate in the package's area.
    OutsideArea,
    /// Only the package owner may perform the action.
    NotPackageOwner,
}

impl AuthorizationReason {
    fn describe(self) -> &'static str {
        match self {
            Self::AdminOverride => "admin override",
            Self::RoleInArea => "role operates in the package area",
            Self::RolePermitted => "role is permitted for this action",
            Self::PackageOwner => "actor owns the package",
            Self::RoleNotPermitted => "role is not permitted to perform this action",
            Self::OutsideArea => "actor does not operate in the package area",
            Self::NotPackageOwner => "only the package owner may perform this action",
        }
    }
}

impl fmt::Display for AuthorizationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Result of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: AuthorizationReason,
}

impl AuthorizationDecision {
    const fn allow(reason: AuthorizationReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    const fn deny(reason: AuthorizationReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    const fn area_gated(in_area: bool) -> Self {
        if in_area {
            Self::allow(AuthorizationReason::RoleInArea)
        } else {
            Self::deny(AuthorizationReason::OutsideArea)
        }
    }
}

/// Whether `actor` operates in `area`.
///
/// A missing area (address-based delivery) imposes no restriction. Admins and
/// [`AreaAccess::Unrestricted`] reach every area; everyone else needs an
/// explicit membership.
///
/// # Examples
/// ```
/// use courier::domain::authorization::operates_in_area;
/// use courier::domain::{Actor, AreaAccess, AreaId, Role, UserId};
///
/// let rider = Actor::new(UserId::random(), Role::Rider);
/// let area = AreaId::random();
/// assert!(operates_in_area(&rider, &AreaAccess::none(), None));
/// assert!(!operates_in_area(&rider, &AreaAccess::none(), Some(&area)));
/// assert!(operates_in_area(&rider, &AreaAccess::from_areas([area]), Some(&area)));
/// ```
pub fn operates_in_area(actor: &Actor, access: &AreaAccess, area: Option<&AreaId>) -> bool {
    let Some(area) = area else {
        return true;
    };
    if actor.role == Role::Admin {
        return true;
    }
    access.contains(area)
}

/// Decide whether `actor` may perform `action` on `package`.
///
/// `access` is the actor's resolved area reach; callers resolve it before
/// every decision so the check always runs against fresh membership data.
pub fn authorize(
    actor: &Actor,
    access: &AreaAccess,
    package: &Package,
    action: ScanAction,
) -> AuthorizationDecision {
    use AuthorizationReason as Reason;

    match (action, actor.role) {
        (_, Role::Admin) => AuthorizationDecision::allow(Reason::AdminOverride),
        (ScanAction::Collect, Role::Agent | Role::Rider) => AuthorizationDecision::area_gated(
            operates_in_area(actor, access, package.origin_area_id.as_ref()),
        ),
        (ScanAction::Deliver, Role::Rider) => AuthorizationDecision::area_gated(operates_in_area(
            actor,
            access,
            package.destination_area_id.as_ref(),
        )),
        (ScanAction::Print, Role::Agent | Role::Rider | Role::Warehouse)
        | (ScanAction::Process, Role::Warehouse) => {
            AuthorizationDecision::allow(Reason::RolePermitted)
        }
        (ScanAction::ConfirmReceipt, _) if actor.id == package.owner_user_id => {
            AuthorizationDecision::allow(Reason::PackageOwner)
        }
        (ScanAction::ConfirmReceipt, _) => AuthorizationDecision::deny(Reason::NotPackageOwner),
        _ => AuthorizationDecision::deny(Reason::RoleNotPermitted),
    }
}
