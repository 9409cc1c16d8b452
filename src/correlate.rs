//! Geospatial correlation of calendar events with active hazards.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageOutcome;
use crate::event::CalendarEvent;
use crate::geo::{BoundingBox, GeoPoint};
use crate::hazard::{Alert, HazardEvent};
use crate::outcome::{Outcome, Presence};
use crate::pipeline::{AsyncPipeline, Pipeline};
use crate::storage::{DocumentStore, Filter};

/// Default great-circle distance considered "near", in kilometres.
pub const DEFAULT_HAZARD_RADIUS_KM: f64 = 500.0;

/// Finds active hazards near a calendar event's coordinates.
///
/// The spatial query is a bounding-rectangle prefilter: the rectangle is
/// spanned by the destination points at bearings 45° and 225°, and matches
/// in the corner regions beyond the exact radius are kept deliberately.
/// Reads only; never mutates stored hazard state.
pub struct HazardCorrelator {
    store: Arc<dyn DocumentStore>,
    radius_km: f64,
}

impl HazardCorrelator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        HazardCorrelator {
            store,
            radius_km: DEFAULT_HAZARD_RADIUS_KM,
        }
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    /// Zero-or-one alert aggregating every active hazard near `event`.
    ///
    /// Storage failures are logged and flattened to `Absent`; callers that
    /// need the error use [`HazardCorrelator::scan_active`] directly.
    pub async fn correlate(&self, event: &CalendarEvent) -> Presence<Alert> {
        match self.scan_active(event.coordinates).await {
            Outcome::Success(Presence::Present(hazards)) => {
                debug!(
                    event = %event.id,
                    hazards = hazards.len(),
                    "correlate: active hazards near event"
                );
                Alert::raise(event, hazards)
            }
            Outcome::Success(Presence::Absent) => Presence::Absent,
            Outcome::Failure(err) => {
                warn!(event = %event.id, %err, "correlate: hazard scan failed");
                Presence::Absent
            }
        }
    }

    /// All active hazards inside the bounding rectangle around `point`,
    /// edges included. `Absent` when none matched; propagates storage
    /// failures.
    pub async fn scan_active(&self, point: GeoPoint) -> StorageOutcome<Presence<Vec<HazardEvent>>> {
        let bbox = BoundingBox::around(point, self.radius_km);
        let filter = Filter::new()
            .eq("active", true)
            .between("lat", bbox.southwest.lat, bbox.northeast.lat)
            .between("lon", bbox.southwest.lon, bbox.northeast.lon);

        self.store
            .find(filter)
            .await
            .chain_async(|docs| async move {
                let found = AsyncPipeline::new(docs)
                    .filter_map(|doc| match HazardEvent::from_document(doc) {
                        Outcome::Success(hazard) => Presence::Present(hazard),
                        Outcome::Failure(err) => {
                            debug!(%err, "skipping undecodable hazard record");
                            Presence::Absent
                        }
                    })
                    .collect_as::<Vec<_>>()
                    .await;
                Outcome::Success(found)
            })
            .await
    }

    /// Bulk-upsert freshly ingested hazards, keyed by hazard id.
    pub async fn save_many(&self, hazards: Vec<HazardEvent>) -> StorageOutcome<u64> {
        match Pipeline::new(hazards)
            .filter_map(|hazard| hazard.to_document().success())
            .collect_as::<Vec<Value>>()
        {
            Presence::Present(docs) => self.store.upsert_many(docs).await,
            Presence::Absent => Outcome::Success(0),
        }
    }
}
