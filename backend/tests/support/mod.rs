//! Shared harness for scan integration tests.
//!
//! Wires the scan service to the in-memory store and directory with an
//! immediate sleeper, so retries never wait on wall-clock time.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier::domain::ports::{BulkScanRequest, ScanRequest};
use courier::domain::{
    Actor, AreaId, PackageScanPorts, PackageScanService, ScanExecutorConfig, ScanRuntime,
    TrackingEvent,
};
use courier::test_support::fixtures::FixedClock;
use courier::test_support::in_memory::{
    ChannelNotifier, InMemoryActorDirectory, InMemoryPackageStore,
};
use courier::test_support::scan_runtime::{ImmediateSleeper, NoJitter};
use tokio::sync::mpsc::UnboundedReceiver;

/// Service plus handles onto its in-memory collaborators.
pub struct ScanWorld {
    pub service: PackageScanService,
    pub store: Arc<InMemoryPackageStore>,
    pub directory: Arc<InMemoryActorDirectory>,
    pub notifications: UnboundedReceiver<TrackingEvent>,
}

impl ScanWorld {
    /// Empty store and directory with default executor settings.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPackageStore::default());
        let directory = Arc::new(InMemoryActorDirectory::default());
        let (notifier, notifications) = ChannelNotifier::channel();
        let service = PackageScanService::with_runtime(
            PackageScanPorts::new(store.clone(), directory.clone(), Arc::new(notifier)),
            Arc::new(FixedClock::default()),
            ScanRuntime {
                sleeper: Arc::new(ImmediateSleeper),
                jitter: Arc::new(NoJitter),
            },
            ScanExecutorConfig::default(),
        );
        Self {
            service,
            store,
            directory,
            notifications,
        }
    }

    /// Register `actor` operating in `areas` and return it.
    pub fn enrol(&self, actor: Actor, areas: impl IntoIterator<Item = AreaId>) -> Actor {
        self.directory.register(&actor, areas);
        actor
    }
}

/// Single-scan request without metadata.
pub fn scan(actor: &Actor, code: &str, action: &str) -> ScanRequest {
    ScanRequest {
        actor_id: actor.id.clone(),
        package_code: code.to_owned(),
        action: action.to_owned(),
        metadata: BTreeMap::new(),
        timeout: None,
    }
}

/// Bulk request without metadata.
pub fn bulk(actor: &Actor, codes: &[&str], action: &str) -> BulkScanRequest {
    BulkScanRequest {
        actor_id: actor.id.clone(),
        package_codes: codes.iter().map(|code| (*code).to_owned()).collect(),
        action: action.to_owned(),
        metadata: BTreeMap::new(),
        timeout: None,
    }
}
