//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod actor_directory;
mod package_scan_command;
mod package_store;
mod transition_notifier;

#[cfg(test)]
pub use actor_directory::MockActorDirectory;
pub use actor_directory::{ActorDirectory, ActorDirectoryError};
pub use package_scan_command::{
    BulkScanItem, BulkScanRequest, BulkScanResponse, BulkScanSummary, PackageScanCommand,
    PrintPayload, ScanOutcome, ScanReport, ScanRequest,
};
#[cfg(test)]
pub use package_store::MockPackageStore;
pub use package_store::{PackageStore, PackageStoreError, ScanUnitOfWork};
#[cfg(test)]
pub use transition_notifier::MockTransitionNotifier;
pub use transition_notifier::{NotifierError, TransitionNotifier};
