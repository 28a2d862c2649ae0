//! Driving port for package scans.
//!
//! Callers hand over raw action strings and codes; the service validates
//! them, so malformed input surfaces as `validation_error` rather than a
//! deserialisation failure in the presentation layer.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DeliveryType, Error, ErrorCode, PackageCode, PackageState, ScanAction, TrackingEventType,
    UserId,
};

/// Request to scan one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub actor_id: UserId,
    pub package_code: String,
    pub action: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Overrides the configured per-scan timeout.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

/// Request to apply one action across several packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanRequest {
    pub actor_id: UserId,
    pub package_codes: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Overrides the configured per-item timeout.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl BulkScanRequest {
    /// Single-package request for the item at `code`.
    pub fn item(&self, code: &str) -> ScanRequest {
        ScanRequest {
            actor_id: self.actor_id.clone(),
            package_code: code.to_owned(),
            action: self.action.clone(),
            metadata: self.metadata.clone(),
            timeout: self.timeout,
        }
    }
}

/// Label data returned by `print` scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPayload {
    pub package_code: PackageCode,
    pub route_description: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub delivery_type: DeliveryType,
}

/// Successful scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub package_code: PackageCode,
    pub action: ScanAction,
    pub from_state: PackageState,
    pub to_state: PackageState,
    pub event_id: Uuid,
    pub event_type: TrackingEventType,
    /// Package version after the write.
    pub version: u32,
    /// Store attempts used, including the successful one.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print: Option<PrintPayload>,
}

impl ScanOutcome {
    /// Human readable summary of the scan.
    pub fn message(&self) -> String {
        if self.from_state == self.to_state {
            format!("{} recorded for package {}", self.event_type, self.package_code)
        } else {
            format!(
                "package {} moved from {} to {}",
                self.package_code, self.from_state, self.to_state
            )
        }
    }
}

/// Flattened scan result for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub success: bool,
    pub message: String,
    pub error_code: Option<ErrorCode>,
    pub from_state: Option<PackageState>,
    pub to_state: Option<PackageState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print: Option<PrintPayload>,
}

impl ScanReport {
    /// Flatten a single-scan result.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::ports::ScanReport;
    /// use courier::domain::{Error, ErrorCode};
    ///
    /// let report = ScanReport::from_result(&Err(Error::not_found("package PKG-9 not found")));
    /// assert!(!report.success);
    /// assert_eq!(report.error_code, Some(ErrorCode::NotFound));
    /// ```
    pub fn from_result(result: &Result<ScanOutcome, Error>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                message: outcome.message(),
                error_code: None,
                from_state: Some(outcome.from_state),
                to_state: Some(outcome.to_state),
                print: outcome.print.clone(),
            },
            Err(error) => Self {
                success: false,
                message: error.message().to_owned(),
                error_code: Some(error.code()),
                from_state: None,
                to_state: None,
                print: None,
            },
        }
    }
}

/// Outcome of one code within a bulk scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanItem {
    pub code: String,
    pub success: bool,
    pub message: String,
    pub error_code: Option<ErrorCode>,
    pub from_state: Option<PackageState>,
    pub to_state: Option<PackageState>,
}

impl BulkScanItem {
    /// Build the item for `code` from its single-scan result.
    pub fn from_result(code: impl Into<String>, result: &Result<ScanOutcome, Error>) -> Self {
        let ScanReport {
            success,
            message,
            error_code,
            from_state,
            to_state,
            ..
        } = ScanReport::from_result(result);
        Self {
            code: code.into(),
            success,
            message,
            error_code,
            from_state,
            to_state,
        }
    }
}

/// Aggregate counts over a bulk scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful items, rounded to two decimals.
    pub success_rate: f64,
}

impl BulkScanSummary {
    /// Summarise per-item results.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::ports::{BulkScanItem, BulkScanSummary};
    ///
    /// let item = |success| BulkScanItem {
    ///     code: "PKG".to_owned(),
    ///     success,
    ///     message: String::new(),
    ///     error_code: None,
    ///     from_state: None,
    ///     to_state: None,
    /// };
    /// let summary = BulkScanSummary::from_items(&[item(true), item(false), item(true)]);
    /// assert_eq!(summary.successful, 2);
    /// assert_eq!(summary.success_rate, 66.67);
    /// ```
    pub fn from_items(items: &[BulkScanItem]) -> Self {
        let total = items.len();
        let successful = items.iter().filter(|item| item.success).count();
        Self {
            total,
            successful,
            failed: total - successful,
            success_rate: success_rate(successful, total),
        }
    }
}

fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = successful as f64 / total as f64 * 100.0;
    (percentage * 100.0).round() / 100.0
}

/// Bulk scan response: per-item results in input order plus a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanResponse {
    pub results: Vec<BulkScanItem>,
    pub summary: BulkScanSummary,
}

impl BulkScanResponse {
    /// Wrap per-item results and compute the summary.
    pub fn from_items(results: Vec<BulkScanItem>) -> Self {
        let summary = BulkScanSummary::from_items(&results);
        Self { results, summary }
    }
}

/// Domain use-case port for scanning packages.
#[async_trait]
pub trait PackageScanCommand: Send + Sync {
    /// Scan one package.
    async fn scan_single(&self, request: ScanRequest) -> Result<ScanOutcome, Error>;

    /// Apply one action across many packages, isolating failures per item.
    ///
    /// Only request-level validation (empty or oversized code list, unknown
    /// action, malformed metadata) fails the whole call.
    async fn scan_bulk(&self, request: BulkScanRequest) -> Result<BulkScanResponse, Error>;
}
