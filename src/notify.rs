//! Notification dispatch seam.

use async_trait::async_trait;

use crate::error::SendError;
use crate::hazard::Alert;
use crate::outcome::Outcome;

/// Outbound delivery of alerts, supplied by the caller.
///
/// The correlator never dispatches on its own; the request handler sends the
/// alert after correlation and only then marks the event as tracked.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Deliver `alert`, returning the backend's message id.
    async fn send(&self, alert: &Alert) -> Outcome<String, SendError>;
}
