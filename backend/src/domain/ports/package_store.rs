//! Port for package reads and atomic scan writes.

use async_trait::async_trait;

use crate::domain::{Package, PackageCode, PackageId, PackageState, TrackingEvent};

use super::define_port_error;

define_port_error! {
    /// Errors raised by package store adapters.
    pub enum PackageStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "package store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "package store query failed: {message}",
        /// The package row changed since it was loaded.
        VersionConflict { expected: u32, actual: u32 } =>
            "package version conflict: expected {expected}, found {actual}",
        /// The package row disappeared between load and write.
        Missing { package_id: String } =>
            "package {package_id} no longer exists",
    }
}

/// One scan's writes, applied together or not at all.
///
/// `next_state` is `None` for non-transitioning actions; the version check
/// still runs so a concurrent transition forces the caller to re-validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUnitOfWork {
    /// Package being scanned.
    pub package_id: PackageId,
    /// Version observed when the scan was validated.
    pub expected_version: u32,
    /// State to write, if the action transitions.
    pub next_state: Option<PackageState>,
    /// Audit record appended in the same transaction.
    pub event: TrackingEvent,
}

/// Port for the transactional package store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Load a package by its code.
    async fn load_package_by_code(
        &self,
        code: &PackageCode,
    ) -> Result<Option<Package>, PackageStoreError>;

    /// Apply the conditional state write and event append in one
    /// transaction. Returns the package version after the write.
    ///
    /// Implementations must fail with [`PackageStoreError::VersionConflict`]
    /// when the stored version differs from `work.expected_version`, leaving
    /// both the package row and the event log untouched.
    async fn apply_scan(&self, work: &ScanUnitOfWork) -> Result<u32, PackageStoreError>;

    /// Read the audit trail for a package, oldest first.
    async fn tracking_events(
        &self,
        package_id: &PackageId,
    ) -> Result<Vec<TrackingEvent>, PackageStoreError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn version_conflict_formats_both_versions() {
        let err = PackageStoreError::version_conflict(2_u32, 5_u32);
        assert_eq!(
            err.to_string(),
            "package version conflict: expected 2, found 5"
        );
    }
}
