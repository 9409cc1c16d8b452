//! In-memory storage backends.
//!
//! Used by the test suite and for embedding the core without external
//! services. Operations are atomic per key (one writer lock around each
//! call), matching the contract real backends are expected to provide.
//! A single-shot fault can be armed to exercise failure paths.

use std::collections::BTreeMap;

use futures::stream;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{StorageError, StorageOutcome};
use crate::outcome::{Outcome, Presence};
use crate::storage::{Document, DocumentStore, DocumentStream, Filter, KeyValueStore};

/// In-memory [`DocumentStore`] over a `BTreeMap`, so `find` iterates in
/// stable id order.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Document>>,
    fault: Mutex<Option<StorageError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Arm a fault: the next storage operation fails with `err` instead of
    /// running.
    pub async fn set_fault(&self, err: StorageError) {
        *self.fault.lock().await = Some(err);
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    async fn trip_fault(&self) -> Option<StorageError> {
        self.fault.lock().await.take()
    }
}

fn document_id(doc: &Document) -> StorageOutcome<String> {
    match doc.get("id").and_then(Value::as_str) {
        Some(id) => Outcome::Success(id.to_string()),
        None => Outcome::Failure(StorageError::Backend(
            "document has no `id` field".to_string(),
        )),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: Document) -> StorageOutcome<bool> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        document_id(&doc).chain_async(|id| async move {
            self.docs.write().await.insert(id, doc);
            Outcome::Success(true)
        })
        .await
    }

    async fn upsert_by_id(&self, id: &str, doc: Document) -> StorageOutcome<u64> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        let matched = self
            .docs
            .write()
            .await
            .insert(id.to_string(), doc)
            .map_or(0, |_| 1);
        Outcome::Success(matched)
    }

    async fn upsert_many(&self, docs: Vec<Document>) -> StorageOutcome<u64> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        let mut guard = self.docs.write().await;
        let mut written = 0u64;
        for doc in docs {
            match document_id(&doc) {
                Outcome::Success(id) => {
                    guard.insert(id, doc);
                    written += 1;
                }
                Outcome::Failure(err) => return Outcome::Failure(err),
            }
        }
        Outcome::Success(written)
    }

    async fn delete(&self, id: &str) -> StorageOutcome<bool> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        Outcome::Success(self.docs.write().await.remove(id).is_some())
    }

    async fn get_by_id(&self, id: &str) -> StorageOutcome<Presence<Document>> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        Outcome::Success(self.docs.read().await.get(id).cloned().into())
    }

    async fn find(&self, filter: Filter) -> StorageOutcome<DocumentStream> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        let matching: Vec<Document> = self
            .docs
            .read()
            .await
            .values()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        Outcome::Success(Box::pin(stream::iter(matching)))
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, String>>,
    fault: Mutex<Option<StorageError>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        MemoryKv::default()
    }

    /// Arm a fault: the next operation fails with `err` instead of running.
    pub async fn set_fault(&self, err: StorageError) {
        *self.fault.lock().await = Some(err);
    }

    async fn trip_fault(&self) -> Option<StorageError> {
        self.fault.lock().await.take()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn put(&self, key: &str, value: String) -> StorageOutcome<()> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        self.entries.write().await.insert(key.to_string(), value);
        Outcome::Success(())
    }

    async fn get(&self, key: &str) -> StorageOutcome<Presence<String>> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        Outcome::Success(self.entries.read().await.get(key).cloned().into())
    }

    async fn delete(&self, key: &str) -> StorageOutcome<bool> {
        if let Some(err) = self.trip_fault().await {
            return Outcome::Failure(err);
        }
        Outcome::Success(self.entries.write().await.remove(key).is_some())
    }
}
