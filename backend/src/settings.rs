//! Scan service configuration loaded via OrthoConfig.
//!
//! Every field is optional; unset values fall back to
//! [`ScanExecutorConfig::default`]. Environment variables use the
//! `COURIER_SCAN_` prefix, e.g. `COURIER_SCAN_MAX_ATTEMPTS=5`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ScanExecutorConfig;

/// Configuration values controlling scan retries, timeouts, and bulk limits.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COURIER_SCAN")]
pub struct ScanSettings {
    /// Store attempts per scan, including the first.
    pub max_attempts: Option<u32>,
    /// Delay before the first conflict retry, in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Cap on the retry delay, in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Bound on one scan including retries, in milliseconds.
    pub attempt_timeout_ms: Option<u64>,
    /// Items processed concurrently within a bulk scan.
    pub bulk_concurrency: Option<usize>,
    /// Largest accepted bulk code list.
    pub max_bulk_size: Option<usize>,
}

impl ScanSettings {
    /// Resolve the settings into a normalised executor configuration.
    ///
    /// # Examples
    /// ```
    /// use courier::settings::ScanSettings;
    /// use std::time::Duration;
    ///
    /// let settings = ScanSettings {
    ///     attempt_timeout_ms: Some(750),
    ///     bulk_concurrency: Some(0),
    ///     ..ScanSettings::default()
    /// };
    /// let config = settings.executor_config();
    /// assert_eq!(config.attempt_timeout, Duration::from_millis(750));
    /// assert_eq!(config.bulk_concurrency, 1);
    /// ```
    pub fn executor_config(&self) -> ScanExecutorConfig {
        let defaults = ScanExecutorConfig::default();
        ScanExecutorConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
            attempt_timeout: self
                .attempt_timeout_ms
                .map_or(defaults.attempt_timeout, Duration::from_millis),
            bulk_concurrency: self.bulk_concurrency.unwrap_or(defaults.bulk_concurrency),
            max_bulk_size: self.max_bulk_size.unwrap_or(defaults.max_bulk_size),
        }
        .normalised()
    }
}
