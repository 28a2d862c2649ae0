//! Domain service executing package scans.
//!
//! One scan resolves the actor, loads the package, authorizes the action,
//! validates the transition, and hands a [`ScanUnitOfWork`] to the store,
//! which applies the state write and event append atomically. Version
//! conflicts restart the pipeline from a fresh load with jittered
//! exponential backoff. Pre-commit work, retries included, is bounded by a
//! timeout. Committed transitions are announced to the notifier on a
//! background task tracked by the service; call
//! [`PackageScanService::flush_notifications`] before shutting the runtime
//! down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::authorization::authorize;
use crate::domain::ports::{
    ActorDirectory, BulkScanRequest, BulkScanResponse, PackageScanCommand, PackageStore,
    PrintPayload, ScanOutcome, ScanRequest, ScanUnitOfWork, TransitionNotifier,
};
use crate::domain::transitions::next_state;
use crate::domain::{
    Actor, AreaAccess, Error, Package, ScanAction, TrackingEvent, TrackingEventType, UserId,
};

mod attempt_error;
mod bulk;
mod deadline;
mod mapping;
mod runtime;

use attempt_error::AttemptError;
use deadline::ScanDeadline;
use mapping::ValidatedScan;
pub use runtime::{PackageScanPorts, RandomJitter, ScanRuntime, TokioSleeper};

/// Retry, timeout, and bulk limits for the scan service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanExecutorConfig {
    /// Store attempts per scan, including the first.
    pub max_attempts: u32,
    /// Delay before the first conflict retry.
    pub initial_backoff: Duration,
    /// Cap on the retry delay.
    pub max_backoff: Duration,
    /// Bound on one scan including all retries.
    pub attempt_timeout: Duration,
    /// Items processed concurrently within a bulk scan.
    pub bulk_concurrency: usize,
    /// Largest accepted bulk code list.
    pub max_bulk_size: usize,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(5),
            bulk_concurrency: 4,
            max_bulk_size: 100,
        }
    }
}

impl ScanExecutorConfig {
    /// Clamp counts to at least one and keep the backoff cap above the
    /// initial delay.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::ScanExecutorConfig;
    ///
    /// let config = ScanExecutorConfig {
    ///     max_attempts: 0,
    ///     bulk_concurrency: 0,
    ///     ..ScanExecutorConfig::default()
    /// }
    /// .normalised();
    /// assert_eq!(config.max_attempts, 1);
    /// assert_eq!(config.bulk_concurrency, 1);
    /// ```
    #[must_use]
    pub fn normalised(self) -> Self {
        Self {
            max_attempts: self.max_attempts.max(1),
            max_backoff: self.max_backoff.max(self.initial_backoff),
            bulk_concurrency: self.bulk_concurrency.max(1),
            max_bulk_size: self.max_bulk_size.max(1),
            ..self
        }
    }
}

/// Async clock-independent sleeping abstraction for retries.
#[async_trait]
pub trait ScanSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use courier::domain::BackoffJitter;
    /// use std::time::Duration;
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let delay = FixedJitter.jittered_delay(Duration::from_millis(100), 2);
    /// assert_eq!(delay, Duration::from_millis(110));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration;
}

/// A scan that reached the store and committed.
struct CommittedScan {
    package: Package,
    work: ScanUnitOfWork,
    version: u32,
}

/// Domain-owned scan executor and bulk orchestrator.
pub struct PackageScanService {
    store: Arc<dyn PackageStore>,
    directory: Arc<dyn ActorDirectory>,
    notifier: Arc<dyn TransitionNotifier>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn ScanSleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: ScanExecutorConfig,
    notifications: Mutex<JoinSet<()>>,
}

impl PackageScanService {
    /// Build a service using default runtime dependencies.
    pub fn new(ports: PackageScanPorts, clock: Arc<dyn Clock>, config: ScanExecutorConfig) -> Self {
        Self::with_runtime(ports, clock, ScanRuntime::default(), config)
    }

    /// Build a service with injected runtime abstractions.
    pub fn with_runtime(
        ports: PackageScanPorts,
        clock: Arc<dyn Clock>,
        runtime: ScanRuntime,
        config: ScanExecutorConfig,
    ) -> Self {
        Self {
            store: ports.store,
            directory: ports.directory,
            notifier: ports.notifier,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config: config.normalised(),
            notifications: Mutex::new(JoinSet::new()),
        }
    }

    /// Active configuration after normalisation.
    pub fn config(&self) -> &ScanExecutorConfig {
        &self.config
    }

    /// Execute one scan.
    ///
    /// Input is validated before any store I/O. Actor lookup, package loads,
    /// area resolution and retry sleeps share one deadline: the request
    /// timeout, or the configured `attempt_timeout` when absent. The store
    /// write is not cut short once started, so a `Timeout` error means the
    /// package and its audit trail are unchanged, while a write that
    /// overruns the deadline still reports its committed outcome.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanOutcome, Error> {
        let command = ValidatedScan::from_request(&request)?;
        let deadline =
            ScanDeadline::after(request.timeout.unwrap_or(self.config.attempt_timeout));
        let span = info_span!(
            "package_scan",
            package_code = %command.code,
            action = %command.action,
            actor_id = %request.actor_id,
        );

        self.execute(&request.actor_id, &command, &deadline)
            .instrument(span)
            .await
    }

    /// Wait for every in-flight transition notification to finish.
    ///
    /// Notifications run on background tasks; a runtime dropped before they
    /// are polled would lose them.
    pub async fn flush_notifications(&self) {
        let mut pending = std::mem::take(&mut *self.pending_notifications());
        while let Some(joined) = pending.join_next().await {
            if let Err(error) = joined {
                warn!(%error, "transition notification task failed");
            }
        }
    }

    async fn execute(
        &self,
        actor_id: &UserId,
        command: &ValidatedScan,
        deadline: &ScanDeadline,
    ) -> Result<ScanOutcome, Error> {
        let actor = deadline
            .bound(&command.code, self.resolve_actor(actor_id))
            .await?;
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            match self.run_single_attempt(&actor, command, deadline).await {
                Ok(committed) => return Ok(self.finish(committed, attempt)),
                Err(AttemptError::Conflict { expected, actual }) if attempt < max_attempts => {
                    debug!(attempt, expected, actual, "version conflict; retrying from a fresh load");
                    let delay = self
                        .jitter
                        .jittered_delay(self.retry_base_delay(attempt), attempt);
                    deadline
                        .bound(&command.code, async {
                            self.sleeper.sleep(delay).await;
                            Ok::<(), Error>(())
                        })
                        .await?;
                }
                Err(AttemptError::Conflict { expected, actual }) => {
                    warn!(attempt, expected, actual, "version conflict retries exhausted");
                    return Err(mapping::conflict_exhausted(&command.code, attempt));
                }
                Err(AttemptError::Failed(error)) => return Err(error),
            }
        }

        Err(Error::internal("scan retry loop ended without an outcome"))
    }

    async fn resolve_actor(&self, actor_id: &UserId) -> Result<Actor, Error> {
        self.directory
            .find_actor(actor_id)
            .await
            .map_err(|err| mapping::map_find_actor_error(err, actor_id))?
            .ok_or_else(|| Error::unauthorized(format!("unknown actor {actor_id}")))
    }

    async fn resolve_access(&self, actor: &Actor) -> Result<AreaAccess, Error> {
        self.directory
            .resolve_accessible_areas(actor)
            .await
            .map_err(|err| mapping::map_area_resolution_error(err, actor))
    }

    async fn run_single_attempt(
        &self,
        actor: &Actor,
        command: &ValidatedScan,
        deadline: &ScanDeadline,
    ) -> Result<CommittedScan, AttemptError> {
        let code = &command.code;
        let package = deadline
            .bound(code, async {
                self.store
                    .load_package_by_code(code)
                    .await
                    .map_err(|err| mapping::map_load_error(err, code))
            })
            .await?
            .ok_or_else(|| Error::not_found(format!("package {code} not found")))?;

        let access = deadline.bound(code, self.resolve_access(actor)).await?;
        let decision = authorize(actor, &access, &package, command.action);
        if !decision.allowed {
            return Err(Error::unauthorized(format!(
                "{} may not {} package {}: {}",
                actor.role, command.action, package.code, decision.reason
            ))
            .into());
        }

        let transition = next_state(package.state, command.action)?;
        let event = TrackingEvent {
            id: Uuid::new_v4(),
            package_id: package.id,
            package_code: package.code.clone(),
            actor_user_id: actor.id.clone(),
            event_type: TrackingEventType::for_scan(command.action, actor.role),
            action: command.action,
            from_state: package.state,
            to_state: transition.resulting_state(package.state),
            metadata: command.metadata.clone(),
            created_at: self.clock.utc(),
        };
        let work = ScanUnitOfWork {
            package_id: package.id,
            expected_version: package.version,
            next_state: transition.state_write(),
            event,
        };

        deadline.ensure_open(code)?;
        let version = self
            .store
            .apply_scan(&work)
            .await
            .map_err(|err| mapping::map_apply_error(err, &command.code))?;

        Ok(CommittedScan {
            package,
            work,
            version,
        })
    }

    fn finish(&self, committed: CommittedScan, attempts: u32) -> ScanOutcome {
        let CommittedScan {
            package,
            work,
            version,
        } = committed;
        let event = work.event;
        info!(
            attempt = attempts,
            from_state = %event.from_state,
            to_state = %event.to_state,
            event_type = %event.event_type,
            "scan committed"
        );

        let print = (event.action == ScanAction::Print).then(|| PrintPayload {
            package_code: package.code.clone(),
            route_description: package.route_description(),
            sender_name: package.sender_name.clone(),
            receiver_name: package.receiver_name.clone(),
            delivery_type: package.delivery_type,
        });
        let outcome = ScanOutcome {
            package_code: package.code,
            action: event.action,
            from_state: event.from_state,
            to_state: event.to_state,
            event_id: event.id,
            event_type: event.event_type.clone(),
            version,
            attempts,
            print,
        };

        if work.next_state.is_some() {
            self.spawn_notification(event);
        }
        outcome
    }

    fn pending_notifications(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_notification(&self, event: TrackingEvent) {
        let notifier = Arc::clone(&self.notifier);
        let mut pending = self.pending_notifications();
        while pending.try_join_next().is_some() {}
        pending.spawn(
            async move {
                if let Err(error) = notifier.notify_transition(&event).await {
                    warn!(
                        package_code = %event.package_code,
                        event_type = %event.event_type,
                        error = %error,
                        "transition notification failed"
                    );
                }
            }
            .in_current_span(),
        );
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

#[async_trait]
impl PackageScanCommand for PackageScanService {
    async fn scan_single(&self, request: ScanRequest) -> Result<ScanOutcome, Error> {
        self.scan(request).await
    }

    async fn scan_bulk(&self, request: BulkScanRequest) -> Result<BulkScanResponse, Error> {
        self.scan_many(request).await
    }
}
