//! Webhook channel lifecycle bookkeeping.
//!
//! A channel is the opaque subscription token a push notification carries.
//! The registry owns two mappings: channel id → owning user + calendar, and
//! calendar id → its current channel id. Inbound webhook deliveries resolve
//! the first; subscription management uses the second.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StorageError, StorageOutcome};
use crate::outcome::{Outcome, Presence};
use crate::storage::KeyValueStore;

const CHANNEL_PREFIX: &str = "channel:";
const CALENDAR_PREFIX: &str = "calendar:";

/// Who a webhook subscription belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub user_email: String,
    pub calendar_id: String,
}

impl ChannelRecord {
    /// A record for a fresh subscription, with a newly minted channel id.
    pub fn open_for(calendar_id: &str, user_email: &str) -> Self {
        ChannelRecord {
            channel_id: Uuid::new_v4().to_string(),
            user_email: user_email.to_string(),
            calendar_id: calendar_id.to_string(),
        }
    }
}

/// Subscription bookkeeping over a key-value store.
///
/// One live record per channel id, one active channel per calendar.
/// Re-watching an already-watched calendar is a caller error this registry
/// does not guard against.
pub struct ChannelRegistry {
    kv: Arc<dyn KeyValueStore>,
}

impl ChannelRegistry {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        ChannelRegistry { kv }
    }

    /// Record both the calendar → channel and channel → owner mappings.
    ///
    /// The two writes are not transactional: if the second fails the registry
    /// is left inconsistent and the caller must retry or compensate.
    pub async fn open(&self, record: &ChannelRecord) -> StorageOutcome<()> {
        let body = match Outcome::<_, StorageError>::lift(|| serde_json::to_string(record)) {
            Outcome::Success(body) => body,
            Outcome::Failure(err) => return Outcome::Failure(err),
        };

        debug!(
            channel = %record.channel_id,
            calendar = %record.calendar_id,
            "registry: opening channel"
        );
        let calendar_entry = self
            .kv
            .put(&calendar_key(&record.calendar_id), record.channel_id.clone())
            .await;
        let channel_entry = channel_key(&record.channel_id);
        calendar_entry
            .chain_async(|()| async move { self.kv.put(&channel_entry, body).await })
            .await
    }

    /// Look up who a notification on `channel_id` belongs to.
    pub async fn resolve(&self, channel_id: &str) -> StorageOutcome<Presence<ChannelRecord>> {
        self.kv
            .get(&channel_key(channel_id))
            .await
            .chain(|presence| match presence {
                Presence::Present(body) => {
                    Outcome::lift(|| serde_json::from_str(&body)).map(Presence::Present)
                }
                Presence::Absent => Outcome::Success(Presence::Absent),
            })
    }

    /// The channel currently watching `calendar_id`, if any.
    pub async fn channel_for(&self, calendar_id: &str) -> StorageOutcome<Presence<String>> {
        self.kv.get(&calendar_key(calendar_id)).await
    }

    /// Remove both mappings for `calendar_id`'s channel.
    ///
    /// Closing a calendar that was never opened is a no-op success.
    pub async fn close(&self, calendar_id: &str) -> StorageOutcome<()> {
        match self.channel_for(calendar_id).await {
            Outcome::Success(Presence::Present(channel_id)) => {
                debug!(channel = %channel_id, calendar = %calendar_id, "registry: closing channel");
                let calendar_entry = self.kv.delete(&calendar_key(calendar_id)).await;
                calendar_entry
                    .chain_async(|_| async move { self.kv.delete(&channel_key(&channel_id)).await })
                    .await
                    .map(|_| ())
            }
            Outcome::Success(Presence::Absent) => Outcome::Success(()),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }
}

fn channel_key(channel_id: &str) -> String {
    format!("{CHANNEL_PREFIX}{channel_id}")
}

fn calendar_key(calendar_id: &str) -> String {
    format!("{CALENDAR_PREFIX}{calendar_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryKv;

    fn registry() -> (Arc<MemoryKv>, ChannelRegistry) {
        let kv = Arc::new(MemoryKv::new());
        (kv.clone(), ChannelRegistry::new(kv))
    }

    #[tokio::test]
    async fn open_then_resolve_round_trips_the_record() {
        let (_, sut) = registry();
        let record = ChannelRecord::open_for("cal-1", "ada@example.com");
        sut.open(&record).await.into_result().unwrap();

        let resolved = sut
            .resolve(&record.channel_id)
            .await
            .into_result()
            .unwrap()
            .into_option()
            .expect("record was opened");
        assert_eq!(resolved, record);

        let channel = sut
            .channel_for("cal-1")
            .await
            .into_result()
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(channel, record.channel_id);
    }

    #[tokio::test]
    async fn minted_channel_ids_are_unique() {
        let a = ChannelRecord::open_for("cal-1", "ada@example.com");
        let b = ChannelRecord::open_for("cal-1", "ada@example.com");
        assert_ne!(a.channel_id, b.channel_id);
    }

    #[tokio::test]
    async fn resolve_of_unknown_channel_is_absent() {
        let (_, sut) = registry();
        let presence = sut.resolve("no-such-channel").await.into_result().unwrap();
        assert!(presence.is_absent());
    }

    #[tokio::test]
    async fn close_removes_both_mappings() {
        let (_, sut) = registry();
        let record = ChannelRecord::open_for("cal-1", "ada@example.com");
        sut.open(&record).await.into_result().unwrap();

        sut.close("cal-1").await.into_result().unwrap();
        assert!(sut
            .resolve(&record.channel_id)
            .await
            .into_result()
            .unwrap()
            .is_absent());
        assert!(sut.channel_for("cal-1").await.into_result().unwrap().is_absent());
    }

    #[tokio::test]
    async fn close_on_never_opened_calendar_is_a_no_op_success() {
        let (_, sut) = registry();
        assert!(sut.close("never-watched").await.is_success());
    }

    #[tokio::test]
    async fn partial_open_failure_surfaces() {
        let (kv, sut) = registry();
        let record = ChannelRecord::open_for("cal-1", "ada@example.com");

        // First write consumes the fault, second write succeeds; arming it
        // here fails the calendar mapping before anything is written.
        kv.set_fault(StorageError::Backend("down".to_string())).await;
        let outcome = sut.open(&record).await;
        assert!(matches!(outcome, Outcome::Failure(StorageError::Backend(_))));
        assert!(sut.channel_for("cal-1").await.into_result().unwrap().is_absent());
    }
}
