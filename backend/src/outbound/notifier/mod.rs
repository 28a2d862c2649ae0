//! Transition notifier that emits structured tracing records.
//!
//! Push delivery lives outside this crate; downstream collectors subscribe
//! to the `courier::transitions` target instead.

use async_trait::async_trait;
use tracing::info;

use crate::domain::TrackingEvent;
use crate::domain::ports::{NotifierError, TransitionNotifier};

/// Logs each committed transition at `info` on the `courier::transitions`
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransitionNotifier;

#[async_trait]
impl TransitionNotifier for TracingTransitionNotifier {
    async fn notify_transition(&self, event: &TrackingEvent) -> Result<(), NotifierError> {
        info!(
            target: "courier::transitions",
            event_id = %event.id,
            package_code = %event.package_code,
            actor_id = %event.actor_user_id,
            event_type = %event.event_type,
            from_state = %event.from_state,
            to_state = %event.to_state,
            "package transition"
        );
        Ok(())
    }
}
