//! Great-circle geometry and the geocoding collaborator seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::outcome::Outcome;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the sphere, in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Great-circle distance between two points, in kilometres (haversine).
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Destination point at `distance_km` along `bearing_deg` from `origin`,
/// using the spherical destination-point formula. Longitude is normalized
/// into [-180, 180).
pub fn destination_point(origin: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint {
        lat: lat2.to_degrees(),
        lon: (lon2.to_degrees() + 540.0) % 360.0 - 180.0,
    }
}

/// Axis-aligned latitude/longitude rectangle with inclusive bounds.
///
/// This is a prefilter, not a circle: the corners are the 45° and 225°
/// destination points, and callers rely on matches in the corner regions
/// beyond the exact radius being kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub southwest: GeoPoint,
    pub northeast: GeoPoint,
}

impl BoundingBox {
    /// The rectangle spanned by the two destination points `radius_km` away
    /// from `center` at bearings 45° (northeast) and 225° (southwest).
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        BoundingBox {
            northeast: destination_point(center, radius_km, 45.0),
            southwest: destination_point(center, radius_km, 225.0),
        }
    }

    /// Whether `point` lies inside the rectangle, edges included.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.southwest.lat
            && point.lat <= self.northeast.lat
            && point.lon >= self.southwest.lon
            && point.lon <= self.northeast.lon
    }
}

/// Location-text to coordinates lookup, supplied by the caller.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, location: &str) -> Outcome<GeoPoint, GeoError>;
}
