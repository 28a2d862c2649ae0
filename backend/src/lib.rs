//! Courier package scanning core.
//!
//! Packages move through a fixed lifecycle driven by scans. This crate
//! decides whether an actor may apply a scan action to a package, advances
//! the package state, and appends the audit trail in one unit of work, for
//! single packages and bulk lists alike.
//!
//! - [`domain`]: lifecycle rules, authorization, and the scan service.
//! - [`outbound`]: PostgreSQL and notifier adapters for the domain ports.
//! - [`settings`]: layered configuration for the scan service.

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
