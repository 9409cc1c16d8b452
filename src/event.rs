//! Calendar event model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageOutcome, ValidationError};
use crate::geo::GeoPoint;
use crate::outcome::Outcome;
use crate::storage::Document;

/// A calendar event as tracked by this core.
///
/// `id` is the remote calendar's stable event id. `tracked` is locally owned:
/// it is never taken from the remote document and only the reconciler flips
/// it (see [`EventReconciler::mark_tracked`]).
///
/// [`EventReconciler::mark_tracked`]: crate::reconcile::EventReconciler::mark_tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub location: String,
    pub coordinates: GeoPoint,
    pub creator: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub link: String,
    #[serde(default)]
    pub tracked: bool,
}

impl CalendarEvent {
    /// Build an event from the remote calendar API's wire shape.
    ///
    /// Expects `id`, `summary`, `location`, `creator.email`, `htmlLink`, and
    /// `start`/`end` objects carrying either a `date` or a `dateTime`.
    /// Coordinates come from the geocoding step, which runs upstream.
    /// `tracked` always starts out `false`, regardless of the document.
    pub fn from_remote(obj: &Value, coordinates: GeoPoint) -> Outcome<Self, ValidationError> {
        Outcome::from(Self::parse_remote(obj, coordinates))
    }

    fn parse_remote(obj: &Value, coordinates: GeoPoint) -> Result<Self, ValidationError> {
        Ok(CalendarEvent {
            id: str_field(obj, "id")?.to_string(),
            summary: str_field(obj, "summary")?.to_string(),
            location: str_field(obj, "location")?.to_string(),
            coordinates,
            creator: str_field(
                obj.get("creator").ok_or(ValidationError::Missing("creator"))?,
                "email",
            )?
            .to_string(),
            start: time_field(obj, "start")?,
            end: time_field(obj, "end")?,
            link: str_field(obj, "htmlLink")?.to_string(),
            tracked: false,
        })
    }

    /// Copy of this event with the tracking bit replaced.
    pub fn with_tracked(&self, tracked: bool) -> Self {
        CalendarEvent {
            tracked,
            ..self.clone()
        }
    }

    pub fn to_document(&self) -> StorageOutcome<Document> {
        Outcome::lift(|| serde_json::to_value(self))
    }

    pub fn from_document(doc: Document) -> Outcome<Self, StorageError> {
        Outcome::lift(|| serde_json::from_value(doc))
    }
}

fn str_field<'a>(obj: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::Missing(field))
}

/// Reads a `start`/`end` object: all-day events carry a `date`, timed events
/// a `dateTime`.
fn time_field(obj: &Value, field: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    let slot = obj.get(field).ok_or(ValidationError::Missing(field))?;

    if let Some(date) = slot.get("date").and_then(Value::as_str) {
        let day = date
            .parse::<NaiveDate>()
            .map_err(|e| ValidationError::Invalid {
                field,
                reason: e.to_string(),
            })?;
        return Ok(day
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc());
    }

    let stamp = slot
        .get("dateTime")
        .and_then(Value::as_str)
        .ok_or(ValidationError::Missing(field))?;
    DateTime::parse_from_rfc3339(stamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::Invalid {
            field,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn remote_event() -> Value {
        json!({
            "id": "evt-1",
            "summary": "Kayaking trip",
            "location": "Hudson River, NY",
            "creator": {"email": "ada@example.com"},
            "start": {"dateTime": "2026-09-01T10:00:00Z"},
            "end": {"dateTime": "2026-09-01T14:00:00Z"},
            "htmlLink": "https://calendar.example.com/evt-1"
        })
    }

    #[test]
    fn parses_remote_wire_shape() {
        let event = CalendarEvent::from_remote(&remote_event(), GeoPoint::new(40.7, -74.0))
            .into_result()
            .expect("well-formed document");

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.creator, "ada@example.com");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap());
        assert_eq!(event.link, "https://calendar.example.com/evt-1");
        assert!(!event.tracked);
    }

    #[test]
    fn all_day_events_use_the_date_slot() {
        let mut obj = remote_event();
        obj["start"] = json!({"date": "2026-09-02"});
        let event = CalendarEvent::from_remote(&obj, GeoPoint::new(0.0, 0.0))
            .into_result()
            .unwrap();
        assert_eq!(event.start, Utc.with_ymd_and_hms(2026, 9, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn missing_field_is_a_validation_failure() {
        let mut obj = remote_event();
        obj.as_object_mut().unwrap().remove("location");
        let outcome = CalendarEvent::from_remote(&obj, GeoPoint::new(0.0, 0.0));
        assert!(matches!(
            outcome,
            Outcome::Failure(ValidationError::Missing("location"))
        ));
    }

    #[test]
    fn tracked_is_never_taken_from_the_remote() {
        let mut obj = remote_event();
        obj["tracked"] = json!(true);
        let event = CalendarEvent::from_remote(&obj, GeoPoint::new(0.0, 0.0))
            .into_result()
            .unwrap();
        assert!(!event.tracked);
    }

    #[test]
    fn document_round_trip_keeps_tracked() {
        let event = CalendarEvent::from_remote(&remote_event(), GeoPoint::new(40.7, -74.0))
            .into_result()
            .unwrap()
            .with_tracked(true);

        let doc = event.to_document().into_result().unwrap();
        let back = CalendarEvent::from_document(doc).into_result().unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn malformed_stored_document_is_corrupt() {
        let outcome = CalendarEvent::from_document(json!({"id": 42}));
        assert!(matches!(
            outcome,
            Outcome::Failure(StorageError::Corrupt(_))
        ));
    }
}
