//! Port for best-effort transition notifications.

use async_trait::async_trait;

use crate::domain::TrackingEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notifier adapters. Never surfaced to scan callers.
    pub enum NotifierError {
        /// Notification could not be handed off.
        Delivery { message: String } =>
            "transition notification failed: {message}",
    }
}

/// Receives committed package transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransitionNotifier: Send + Sync {
    /// Inform downstream listeners about a committed transition.
    async fn notify_transition(&self, event: &TrackingEvent) -> Result<(), NotifierError>;
}
