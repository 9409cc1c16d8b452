//! Narrow storage contracts consumed by the core.
//!
//! The core never talks to a concrete persistence engine; it is handed
//! implementations of these traits (a document store for events and hazards,
//! a key-value store for webhook bookkeeping). Implementations must provide
//! per-key atomicity for upsert and delete; the core holds no locks of its
//! own.

pub mod memory;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::StorageOutcome;
use crate::outcome::Presence;
use crate::pipeline::stream::PipelineStream;

/// A stored record: an object-shaped JSON value with its id under `"id"`.
pub type Document = Value;

/// Stream of matching documents from [`DocumentStore::find`].
pub type DocumentStream = PipelineStream<Document>;

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    /// Inclusive on both ends; `None` means unbounded in that direction.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
}

/// Conjunction of field predicates, supporting equality and inclusive ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Predicate::Eq(value.into())));
        self
    }

    pub fn between(mut self, field: &str, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.clauses.push((
            field.to_string(),
            Predicate::Range {
                min: Some(min.into()),
                max: Some(max.into()),
            },
        ));
        self
    }

    pub fn at_least(mut self, field: &str, min: impl Into<Value>) -> Self {
        self.clauses.push((
            field.to_string(),
            Predicate::Range {
                min: Some(min.into()),
                max: None,
            },
        ));
        self
    }

    pub fn at_most(mut self, field: &str, max: impl Into<Value>) -> Self {
        self.clauses.push((
            field.to_string(),
            Predicate::Range {
                min: None,
                max: Some(max.into()),
            },
        ));
        self
    }

    /// Whether `doc` satisfies every clause. A missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|(field, predicate)| {
            let Some(actual) = doc.get(field) else {
                return false;
            };
            match predicate {
                Predicate::Eq(expected) => actual == expected,
                Predicate::Range { min, max } => {
                    let above = min.as_ref().map_or(true, |m| {
                        matches!(
                            compare_values(actual, m),
                            Some(Ordering::Greater | Ordering::Equal)
                        )
                    });
                    let below = max.as_ref().map_or(true, |m| {
                        matches!(
                            compare_values(actual, m),
                            Some(Ordering::Less | Ordering::Equal)
                        )
                    });
                    above && below
                }
            }
        })
    }
}

/// Ordering between two JSON values for range predicates.
///
/// Numbers compare numerically. Strings that both parse as RFC 3339
/// timestamps compare as instants (serialized timestamps are not reliably
/// ordered lexicographically once fractional seconds or offsets differ);
/// other strings compare lexicographically. Mixed types do not compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => Some(tx.cmp(&ty)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}

/// Document-oriented storage for calendar events and hazards.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new record. The document must carry an `"id"` field.
    async fn insert(&self, doc: Document) -> StorageOutcome<bool>;

    /// Insert or replace the record with the given id, returning how many
    /// existing records matched (0 when this created the record).
    async fn upsert_by_id(&self, id: &str, doc: Document) -> StorageOutcome<u64>;

    /// Bulk upsert keyed by each document's own id; returns the number of
    /// records written.
    async fn upsert_many(&self, docs: Vec<Document>) -> StorageOutcome<u64>;

    /// Delete by id; `true` when a record was removed.
    async fn delete(&self, id: &str) -> StorageOutcome<bool>;

    async fn get_by_id(&self, id: &str) -> StorageOutcome<Presence<Document>>;

    /// All records matching `filter`, in the backend's default order.
    async fn find(&self, filter: Filter) -> StorageOutcome<DocumentStream>;
}

/// Flat key-value storage for webhook channel bookkeeping.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> StorageOutcome<()>;

    async fn get(&self, key: &str) -> StorageOutcome<Presence<String>>;

    /// Delete a key; `true` when it existed. Deleting an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> StorageOutcome<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_and_range_clauses_conjoin() {
        let filter = Filter::new()
            .eq("active", true)
            .between("lat", 10.0, 20.0);

        assert!(filter.matches(&json!({"active": true, "lat": 15.0})));
        assert!(!filter.matches(&json!({"active": false, "lat": 15.0})));
        assert!(!filter.matches(&json!({"active": true, "lat": 25.0})));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let filter = Filter::new().between("lon", -80.0, -60.0);
        assert!(filter.matches(&json!({"lon": -80.0})));
        assert!(filter.matches(&json!({"lon": -60.0})));
        assert!(!filter.matches(&json!({"lon": -59.999})));
    }

    #[test]
    fn missing_field_never_matches() {
        let filter = Filter::new().eq("active", true);
        assert!(!filter.matches(&json!({"lat": 1.0})));
    }

    #[test]
    fn timestamp_strings_compare_as_instants() {
        // Lexicographically "...00.5Z" sorts before "...00Z"; as instants it
        // is later.
        let filter = Filter::new().at_least("start", "2026-09-01T10:00:00Z");
        assert!(filter.matches(&json!({"start": "2026-09-01T10:00:00.5Z"})));
        assert!(filter.matches(&json!({"start": "2026-09-01T10:00:00+00:00"})));
        assert!(!filter.matches(&json!({"start": "2026-09-01T09:59:59Z"})));
    }

    #[test]
    fn mixed_types_do_not_match_ranges() {
        let filter = Filter::new().at_most("lat", 50.0);
        assert!(!filter.matches(&json!({"lat": "50"})));
    }
}
