//! Mapping helpers from port failures and raw input to domain errors.

use std::collections::BTreeMap;

use tracing::{error, warn};

use crate::domain::ports::{ActorDirectoryError, PackageStoreError, ScanRequest};
use crate::domain::{Actor, Error, PackageCode, ScanAction, ScanMetadata, UserId};

use super::attempt_error::AttemptError;

/// Input that passed validation and is ready for store I/O.
#[derive(Debug, Clone)]
pub(super) struct ValidatedScan {
    pub(super) code: PackageCode,
    pub(super) action: ScanAction,
    pub(super) metadata: ScanMetadata,
}

impl ValidatedScan {
    pub(super) fn from_request(request: &ScanRequest) -> Result<Self, Error> {
        let code = parse_code(&request.package_code)?;
        let (action, metadata) = parse_action_and_metadata(request)?;
        Ok(Self {
            code,
            action,
            metadata,
        })
    }
}

pub(super) fn parse_code(raw: &str) -> Result<PackageCode, Error> {
    PackageCode::new(raw).map_err(|err| Error::validation(format!("invalid package code: {err}")))
}

pub(super) fn parse_action(raw: &str) -> Result<ScanAction, Error> {
    raw.parse::<ScanAction>()
        .map_err(|err| Error::validation(err.to_string()))
}

pub(super) fn parse_metadata(entries: &BTreeMap<String, String>) -> Result<ScanMetadata, Error> {
    ScanMetadata::new(entries.clone())
        .map_err(|err| Error::validation(format!("invalid scan metadata: {err}")))
}

fn parse_action_and_metadata(request: &ScanRequest) -> Result<(ScanAction, ScanMetadata), Error> {
    Ok((parse_action(&request.action)?, parse_metadata(&request.metadata)?))
}

pub(super) fn map_load_error(error: PackageStoreError, code: &PackageCode) -> AttemptError {
    error!(package_code = %code, error = %error, "package lookup failed");
    AttemptError::Failed(Error::internal("package store unavailable"))
}

pub(super) fn map_apply_error(error: PackageStoreError, code: &PackageCode) -> AttemptError {
    match error {
        PackageStoreError::VersionConflict { expected, actual } => {
            AttemptError::Conflict { expected, actual }
        }
        PackageStoreError::Missing { .. } => {
            AttemptError::Failed(Error::not_found(format!("package {code} not found")))
        }
        other => {
            error!(package_code = %code, error = %other, "scan write failed");
            AttemptError::Failed(Error::internal("package store unavailable"))
        }
    }
}

pub(super) fn map_find_actor_error(error: ActorDirectoryError, user_id: &UserId) -> Error {
    error!(actor_id = %user_id, error = %error, "actor lookup failed");
    Error::internal("actor directory unavailable")
}

/// Area resolution failures deny the scan rather than widening access.
pub(super) fn map_area_resolution_error(error: ActorDirectoryError, actor: &Actor) -> Error {
    warn!(
        actor_id = %actor.id,
        role = %actor.role,
        error = %error,
        "area resolution failed; denying scan"
    );
    Error::unauthorized("unable to resolve operating areas for actor")
}

pub(super) fn conflict_exhausted(code: &PackageCode, attempts: u32) -> Error {
    Error::conflict(format!(
        "package {code} was modified concurrently; gave up after {attempts} attempts"
    ))
}
