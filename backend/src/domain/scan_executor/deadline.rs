//! Time budget for one scan, retries included.
//!
//! Only pre-commit work is bounded. Once `apply_scan` starts it runs to
//! completion, so a `Timeout` result always means nothing was written.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::warn;

use crate::domain::{Error, PackageCode};

/// Upper bound used when `now + limit` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub(super) struct ScanDeadline {
    at: Instant,
    limit: Duration,
}

impl ScanDeadline {
    pub(super) fn after(limit: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(limit)
            .unwrap_or_else(|| now + FAR_FUTURE.min(limit));
        Self { at, limit }
    }

    /// Await `work`, failing with a timeout if the deadline passes first.
    pub(super) async fn bound<T, E>(
        &self,
        code: &PackageCode,
        work: impl Future<Output = Result<T, E>>,
    ) -> Result<T, E>
    where
        E: From<Error>,
    {
        match timeout_at(self.at, work).await {
            Ok(result) => result,
            Err(_) => Err(self.expired(code).into()),
        }
    }

    /// Fail if the deadline has already passed.
    pub(super) fn ensure_open(&self, code: &PackageCode) -> Result<(), Error> {
        if Instant::now() >= self.at {
            return Err(self.expired(code));
        }
        Ok(())
    }

    fn expired(&self, code: &PackageCode) -> Error {
        let timeout_ms = u64::try_from(self.limit.as_millis()).unwrap_or(u64::MAX);
        warn!(timeout_ms, "scan timed out");
        Error::timeout(format!(
            "scan of package {code} timed out after {timeout_ms} ms"
        ))
    }
}
