//! Hazard event model and the alert aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageOutcome, ValidationError};
use crate::event::CalendarEvent;
use crate::geo::GeoPoint;
use crate::outcome::{Outcome, Presence};
use crate::pipeline::Pipeline;
use crate::storage::Document;

/// A hazard category reference (e.g. "Wildfires").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardCategory {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl HazardCategory {
    pub fn from_feed(obj: &Value) -> Outcome<Self, ValidationError> {
        Outcome::from(Self::parse_feed(obj))
    }

    fn parse_feed(obj: &Value) -> Result<Self, ValidationError> {
        let title = str_field(obj, "title")?.to_string();
        Ok(HazardCategory {
            id: id_field(obj)?,
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(&title)
                .to_string(),
            title,
        })
    }
}

/// A geotagged hazard event from the upstream feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    pub categories: Vec<HazardCategory>,
    pub active: bool,
    pub lat: f64,
    pub lon: f64,
    pub most_recent_date: DateTime<Utc>,
    /// Free-form value+unit string, possibly empty.
    pub magnitude: String,
}

impl HazardEvent {
    /// Build a hazard from the feed's wire shape.
    ///
    /// The last entry of `geometry` is the most recent known position.
    /// A hazard is active exactly when its `closed` date is null or absent.
    pub fn from_feed(obj: &Value) -> Outcome<Self, ValidationError> {
        Outcome::from(Self::parse_feed(obj))
    }

    fn parse_feed(obj: &Value) -> Result<Self, ValidationError> {
        let categories = Pipeline::new(
            obj.get("categories")
                .and_then(Value::as_array)
                .ok_or(ValidationError::Missing("categories"))?,
        )
        .filter_map(|cat| HazardCategory::from_feed(cat).success())
        .collect_as::<Vec<_>>()
        .unwrap_or(Vec::new());

        let latest = obj
            .get("geometry")
            .and_then(Value::as_array)
            .and_then(|points| points.last())
            .ok_or(ValidationError::Missing("geometry"))?;
        let coordinates = latest
            .get("coordinates")
            .and_then(Value::as_array)
            .ok_or(ValidationError::Missing("coordinates"))?;
        let (lon, lat) = match coordinates.as_slice() {
            [lon, lat, ..] => (
                lon.as_f64().ok_or(ValidationError::Missing("coordinates"))?,
                lat.as_f64().ok_or(ValidationError::Missing("coordinates"))?,
            ),
            _ => return Err(ValidationError::Missing("coordinates")),
        };

        let date = str_field(latest, "date")?;
        let most_recent_date = DateTime::parse_from_rfc3339(date)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ValidationError::Invalid {
                field: "date",
                reason: e.to_string(),
            })?;

        Ok(HazardEvent {
            id: id_field(obj)?,
            name: str_field(obj, "title")?.to_string(),
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            link: str_field(obj, "link")?.to_string(),
            categories,
            active: obj.get("closed").map_or(true, Value::is_null),
            lat,
            lon,
            most_recent_date,
            magnitude: join_magnitude(obj),
        })
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn to_document(&self) -> StorageOutcome<Document> {
        Outcome::lift(|| serde_json::to_value(self))
    }

    pub fn from_document(doc: Document) -> Outcome<Self, StorageError> {
        Outcome::lift(|| serde_json::from_value(doc))
    }
}

/// A notification about hazards active near a calendar event.
///
/// Read-only aggregate; never persisted by this core. The hazard list is
/// non-empty by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub recipient: String,
    pub event: CalendarEvent,
    pub hazards: Vec<HazardEvent>,
    pub dangerous: bool,
}

impl Alert {
    /// Raise an alert for `event`'s creator, or `Absent` when there is
    /// nothing to report. A `Present` alert always carries at least one
    /// hazard.
    pub fn raise(event: &CalendarEvent, hazards: Vec<HazardEvent>) -> Presence<Self> {
        if hazards.is_empty() {
            return Presence::Absent;
        }
        Presence::Present(Alert {
            recipient: event.creator.clone(),
            event: event.clone(),
            hazards,
            dangerous: true,
        })
    }
}

fn id_field(obj: &Value) -> Result<String, ValidationError> {
    match obj.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ValidationError::Missing("id")),
    }
}

fn str_field<'a>(obj: &'a Value, field: &'static str) -> Result<&'a str, ValidationError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::Missing(field))
}

/// "value unit", "value", "unit", or "" depending on what the feed carries.
fn join_magnitude(obj: &Value) -> String {
    let value = obj
        .get("magnitudeValue")
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let unit = obj
        .get("magnitudeUnit")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match (value.is_empty(), unit.is_empty()) {
        (false, false) => format!("{value} {unit}"),
        _ => format!("{value}{unit}"),
    }
}
