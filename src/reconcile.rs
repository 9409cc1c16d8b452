//! Event reconciliation state machine.
//!
//! Decides whether an incoming calendar event is new, changed, or already
//! tracked, and keeps the locally-owned `tracked` bit alive across
//! remote-driven updates.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::error::StorageOutcome;
use crate::event::CalendarEvent;
use crate::outcome::{Outcome, Presence};
use crate::pipeline::AsyncPipeline;
use crate::storage::{DocumentStore, Filter};

/// Reconciles incoming calendar events against the local event store.
///
/// Reconciliation is read-then-upsert without a per-id lock: concurrent
/// reconciliations of the same id are last-write-wins on the backend's
/// atomic upsert, and a lost `tracked` bit self-heals on the next delivery
/// cycle.
pub struct EventReconciler {
    store: Arc<dyn DocumentStore>,
}

impl EventReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        EventReconciler { store }
    }

    /// Merge `incoming` with any existing record.
    ///
    /// When a record with the same id exists, the incoming event wins on
    /// every field except `tracked`, which is copied from the existing
    /// record; the remote never overrides local tracking state. When no
    /// record exists, `incoming` is inserted as-is (`tracked` defaults to
    /// false). Any storage failure short-circuits without a partial write.
    pub async fn reconcile(&self, incoming: CalendarEvent) -> StorageOutcome<CalendarEvent> {
        match self.lookup(&incoming.id).await {
            Outcome::Success(Presence::Present(existing)) => {
                let merged = incoming.with_tracked(existing.tracked);
                debug!(id = %merged.id, tracked = merged.tracked, "reconcile: updating event");
                match merged.to_document() {
                    Outcome::Success(doc) => {
                        let upserted = self.store.upsert_by_id(&merged.id, doc).await;
                        upserted.map(|_| merged)
                    }
                    Outcome::Failure(err) => Outcome::Failure(err),
                }
            }
            Outcome::Success(Presence::Absent) => {
                debug!(id = %incoming.id, "reconcile: creating event");
                match incoming.to_document() {
                    Outcome::Success(doc) => {
                        let inserted = self.store.insert(doc).await;
                        inserted.map(|_| incoming)
                    }
                    Outcome::Failure(err) => Outcome::Failure(err),
                }
            }
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// Set `tracked = true` on the persisted record.
    ///
    /// Called only after a notification has actually been delivered, never
    /// before. Returns whether an existing record was updated (`false` means
    /// the upsert had to create it).
    pub async fn mark_tracked(&self, event: &CalendarEvent) -> StorageOutcome<bool> {
        let tracked = event.with_tracked(true);
        match tracked.to_document() {
            Outcome::Success(doc) => {
                let upserted = self.store.upsert_by_id(&tracked.id, doc).await;
                upserted.map(|matched| matched > 0)
            }
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// Remove the record for `event_id`; `true` when one existed.
    pub async fn delete(&self, event_id: &str) -> StorageOutcome<bool> {
        self.store.delete(event_id).await
    }

    /// Events starting within `[now, now + days]`, inclusive on both ends,
    /// restricted to the given `tracked` state, in the store's default order.
    pub async fn list_scheduled_within(
        &self,
        days: i64,
        tracked: bool,
    ) -> StorageOutcome<AsyncPipeline<CalendarEvent>> {
        let now = Utc::now();
        let until = now + Duration::days(days);
        let filter = Filter::new()
            .eq("tracked", tracked)
            .between("start", now.to_rfc3339(), until.to_rfc3339());
        self.store.find(filter).await.map(decode_pipeline)
    }

    /// Every stored event with the given `tracked` state.
    pub async fn list_all(&self, tracked: bool) -> StorageOutcome<AsyncPipeline<CalendarEvent>> {
        self.store
            .find(Filter::new().eq("tracked", tracked))
            .await
            .map(decode_pipeline)
    }

    async fn lookup(&self, id: &str) -> StorageOutcome<Presence<CalendarEvent>> {
        self.store.get_by_id(id).await.chain(|presence| match presence {
            Presence::Present(doc) => CalendarEvent::from_document(doc).map(Presence::Present),
            Presence::Absent => Outcome::Success(Presence::Absent),
        })
    }
}

/// Decode stored documents, dropping any that no longer parse.
fn decode_pipeline(docs: crate::storage::DocumentStream) -> AsyncPipeline<CalendarEvent> {
    AsyncPipeline::new(docs).filter_map(|doc| match CalendarEvent::from_document(doc) {
        Outcome::Success(event) => Presence::Present(event),
        Outcome::Failure(err) => {
            debug!(%err, "skipping undecodable event record");
            Presence::Absent
        }
    })
}
