//! Bulk scans: one action across many codes with per-item isolation.

use futures_util::stream::{self, StreamExt};
use tracing::{Instrument, info, info_span};

use crate::domain::Error;
use crate::domain::ports::{BulkScanItem, BulkScanRequest, BulkScanResponse, ScanRequest};

use super::{PackageScanService, mapping};

impl PackageScanService {
    /// Apply one action across `request.package_codes`.
    ///
    /// The request fails as a whole only for an empty or oversized code
    /// list, an unknown action, or malformed metadata. Every per-code
    /// failure, a malformed code included, becomes a failed item and never
    /// stops its siblings. Items run with bounded concurrency and results
    /// keep input order.
    pub async fn scan_many(&self, request: BulkScanRequest) -> Result<BulkScanResponse, Error> {
        self.validate_bulk(&request)?;

        let span = info_span!(
            "bulk_package_scan",
            action = %request.action,
            actor_id = %request.actor_id,
            total = request.package_codes.len(),
        );

        let items: Vec<ScanRequest> = request
            .package_codes
            .iter()
            .map(|code| request.item(code))
            .collect();

        let response = async {
            let results: Vec<BulkScanItem> = stream::iter(items)
                .map(|item| {
                    let code = item.package_code.clone();
                    let scan = self.scan(item);
                    async move { BulkScanItem::from_result(code, &scan.await) }
                })
                .buffered(self.config.bulk_concurrency)
                .collect()
                .await;

            let response = BulkScanResponse::from_items(results);
            info!(
                successful = response.summary.successful,
                failed = response.summary.failed,
                success_rate = response.summary.success_rate,
                "bulk scan finished"
            );
            response
        }
        .instrument(span)
        .await;
        Ok(response)
    }

    fn validate_bulk(&self, request: &BulkScanRequest) -> Result<(), Error> {
        if request.package_codes.is_empty() {
            return Err(Error::validation("bulk scan requires at least one package code"));
        }
        let max = self.config.max_bulk_size;
        if request.package_codes.len() > max {
            return Err(Error::validation(format!(
                "bulk scan accepts at most {max} package codes, got {}",
                request.package_codes.len()
            )));
        }
        mapping::parse_action(&request.action)?;
        mapping::parse_metadata(&request.metadata)?;
        Ok(())
    }
}
