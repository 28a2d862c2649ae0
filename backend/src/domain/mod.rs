//! Domain primitives, rules, and services for package scanning.
//!
//! Purpose: define the package lifecycle, who may move a package through
//! it, and the service that applies scans atomically. Types here carry no
//! persistence or transport concerns; adapters reach the domain through
//! [`ports`].
//!
//! Public surface:
//! - [`transitions`]: the pure `(state, action) -> next state` table.
//! - [`authorization`]: the role and area rule set.
//! - [`PackageScanService`]: single and bulk scan execution.
//! - [`Error`] / [`ErrorCode`]: typed failures returned to callers.

pub mod actor;
pub mod authorization;
pub mod error;
pub mod package;
pub mod ports;
pub mod scan_action;
pub mod scan_executor;
pub mod tracking_event;
pub mod transitions;

pub use self::actor::{
    Actor, AreaAccess, Role, UnknownRole, UserId, UserIdValidationError,
};
pub use self::authorization::{AuthorizationDecision, AuthorizationReason};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::package::{
    AgentId, AreaId, DeliveryType, PACKAGE_CODE_MAX, Package, PackageCode,
    PackageCodeValidationError, PackageId, PackageState, UnknownDeliveryType, UnknownPackageState,
};
pub use self::scan_action::{ScanAction, UnknownScanAction};
pub use self::scan_executor::{
    BackoffJitter, PackageScanPorts, PackageScanService, RandomJitter, ScanExecutorConfig,
    ScanRuntime, ScanSleeper, TokioSleeper,
};
pub use self::tracking_event::{
    METADATA_KEY_MAX, METADATA_MAX_ENTRIES, METADATA_VALUE_MAX, ScanMetadata,
    ScanMetadataValidationError, TrackingEvent, TrackingEventType,
};
pub use self::transitions::Transition;
