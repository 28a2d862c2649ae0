//! In-memory port implementations for exercising the scan service end to
//! end without PostgreSQL.
//!
//! The package store keeps packages and events behind one mutex, so an
//! `apply_scan` call is atomic in the same way a database transaction is.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Barrier, mpsc};

use crate::domain::ports::{
    ActorDirectory, ActorDirectoryError, NotifierError, PackageStore, PackageStoreError,
    ScanUnitOfWork, TransitionNotifier,
};
use crate::domain::{
    Actor, AreaAccess, AreaId, Package, PackageCode, PackageId, Role, TrackingEvent, UserId,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

#[derive(Default)]
struct StoreState {
    packages: HashMap<PackageCode, Package>,
    events: Vec<TrackingEvent>,
}

/// Package store backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryPackageStore {
    state: Mutex<StoreState>,
    apply_calls: AtomicUsize,
    gate: Mutex<Option<(Arc<Barrier>, usize)>>,
    failure: Mutex<Option<PackageStoreError>>,
}

impl InMemoryPackageStore {
    /// Store seeded with `packages`.
    pub fn with_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        let store = Self::default();
        for package in packages {
            store.insert(package);
        }
        store
    }

    /// Insert or replace a package.
    pub fn insert(&self, package: Package) {
        lock(&self.state, "store")
            .packages
            .insert(package.code.clone(), package);
    }

    /// Current snapshot of a package.
    pub fn package(&self, code: &str) -> Option<Package> {
        let code = PackageCode::new(code).ok()?;
        lock(&self.state, "store").packages.get(&code).cloned()
    }

    /// Every event appended so far, in commit order.
    pub fn events(&self) -> Vec<TrackingEvent> {
        lock(&self.state, "store").events.clone()
    }

    /// Number of `apply_scan` calls, including rejected ones.
    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    /// Make the next `calls` writes wait on `barrier` before committing, so
    /// concurrent scans all validate against the same version.
    pub fn gate_writes(&self, barrier: Arc<Barrier>, calls: usize) {
        *lock(&self.gate, "gate") = Some((barrier, calls));
    }

    /// Fail every subsequent write with `error`.
    pub fn fail_writes_with(&self, error: PackageStoreError) {
        *lock(&self.failure, "failure") = Some(error);
    }

    fn take_gate(&self) -> Option<Arc<Barrier>> {
        let mut gate = lock(&self.gate, "gate");
        let (barrier, remaining) = gate.as_mut()?;
        let barrier = Arc::clone(barrier);
        *remaining -= 1;
        if *remaining == 0 {
            *gate = None;
        }
        Some(barrier)
    }
}

#[async_trait]
impl PackageStore for InMemoryPackageStore {
    async fn load_package_by_code(
        &self,
        code: &PackageCode,
    ) -> Result<Option<Package>, PackageStoreError> {
        Ok(lock(&self.state, "store").packages.get(code).cloned())
    }

    async fn apply_scan(&self, work: &ScanUnitOfWork) -> Result<u32, PackageStoreError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = self.take_gate() {
            barrier.wait().await;
        }
        if let Some(error) = lock(&self.failure, "failure").clone() {
            return Err(error);
        }

        let mut state = lock(&self.state, "store");
        let package = state
            .packages
            .values_mut()
            .find(|package| package.id == work.package_id)
            .ok_or_else(|| PackageStoreError::missing(work.package_id.to_string()))?;
        if package.version != work.expected_version {
            return Err(PackageStoreError::version_conflict(
                work.expected_version,
                package.version,
            ));
        }
        if let Some(next) = work.next_state {
            package.state = next;
            package.version += 1;
            package.updated_at = work.event.created_at;
        }
        let version = package.version;
        state.events.push(work.event.clone());
        Ok(version)
    }

    async fn tracking_events(
        &self,
        package_id: &PackageId,
    ) -> Result<Vec<TrackingEvent>, PackageStoreError> {
        Ok(lock(&self.state, "store")
            .events
            .iter()
            .filter(|event| event.package_id == *package_id)
            .cloned()
            .collect())
    }
}

/// Actor directory backed by explicit role and membership maps.
#[derive(Default)]
pub struct InMemoryActorDirectory {
    actors: Mutex<HashMap<UserId, Actor>>,
    memberships: Mutex<HashMap<UserId, HashSet<AreaId>>>,
    fail_resolution: Mutex<bool>,
}

impl InMemoryActorDirectory {
    /// Register `actor` operating in `areas`.
    pub fn register(&self, actor: &Actor, areas: impl IntoIterator<Item = AreaId>) {
        lock(&self.actors, "actors").insert(actor.id.clone(), actor.clone());
        lock(&self.memberships, "memberships")
            .entry(actor.id.clone())
            .or_default()
            .extend(areas);
    }

    /// Make every area resolution fail.
    pub fn fail_area_resolution(&self) {
        *lock(&self.fail_resolution, "fail_resolution") = true;
    }
}

#[async_trait]
impl ActorDirectory for InMemoryActorDirectory {
    async fn find_actor(&self, user_id: &UserId) -> Result<Option<Actor>, ActorDirectoryError> {
        Ok(lock(&self.actors, "actors").get(user_id).cloned())
    }

    async fn resolve_accessible_areas(
        &self,
        actor: &Actor,
    ) -> Result<AreaAccess, ActorDirectoryError> {
        if *lock(&self.fail_resolution, "fail_resolution") {
            return Err(ActorDirectoryError::connection("membership lookup offline"));
        }
        if actor.role == Role::Admin {
            return Ok(AreaAccess::Unrestricted);
        }
        if !actor.role.is_area_bound() {
            return Ok(AreaAccess::none());
        }
        let areas = lock(&self.memberships, "memberships")
            .get(&actor.id)
            .cloned()
            .unwrap_or_default();
        Ok(AreaAccess::Areas(areas))
    }
}

/// Notifier forwarding events into a channel.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<TrackingEvent>,
    fail: bool,
}

impl ChannelNotifier {
    /// Notifier plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TrackingEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                fail: false,
            },
            receiver,
        )
    }

    /// Notifier that forwards the event and then reports a failure.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<TrackingEvent>) {
        let (notifier, receiver) = Self::channel();
        (
            Self {
                fail: true,
                ..notifier
            },
            receiver,
        )
    }
}

#[async_trait]
impl TransitionNotifier for ChannelNotifier {
    async fn notify_transition(&self, event: &TrackingEvent) -> Result<(), NotifierError> {
        self.sender
            .send(event.clone())
            .map_err(|err| NotifierError::delivery(err.to_string()))?;
        if self.fail {
            return Err(NotifierError::delivery("push gateway rejected the event"));
        }
        Ok(())
    }
}
