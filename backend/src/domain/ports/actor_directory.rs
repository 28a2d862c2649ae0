//! Port for actor lookup and area-membership resolution.

use async_trait::async_trait;

use crate::domain::{Actor, AreaAccess, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by actor directory adapters.
    pub enum ActorDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "actor directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "actor directory query failed: {message}",
    }
}

/// Read-only view over users, their primary roles, and area memberships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Resolve a user to an actor with its primary role.
    async fn find_actor(&self, user_id: &UserId) -> Result<Option<Actor>, ActorDirectoryError>;

    /// Resolve the set of areas `actor` operates in.
    ///
    /// Admins resolve to [`AreaAccess::Unrestricted`]; clients and support
    /// staff to an empty set.
    async fn resolve_accessible_areas(
        &self,
        actor: &Actor,
    ) -> Result<AreaAccess, ActorDirectoryError>;
}
