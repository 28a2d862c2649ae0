//! Port and runtime dependency bundles for the scan service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::domain::ports::{ActorDirectory, PackageStore, TransitionNotifier};

use super::{BackoffJitter, ScanSleeper};

/// Port bundle required by the scan service.
pub struct PackageScanPorts {
    /// Transactional package store.
    pub store: Arc<dyn PackageStore>,
    /// Actor and area-membership lookups.
    pub directory: Arc<dyn ActorDirectory>,
    /// Best-effort transition listener.
    pub notifier: Arc<dyn TransitionNotifier>,
}

impl PackageScanPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        store: Arc<dyn PackageStore>,
        directory: Arc<dyn ActorDirectory>,
        notifier: Arc<dyn TransitionNotifier>,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
        }
    }
}

/// Runtime helpers used by the conflict retry policy.
pub struct ScanRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn ScanSleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for ScanRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ScanSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let extra = rand::thread_rng().gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
