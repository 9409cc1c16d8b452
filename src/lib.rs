//! Effect-typed core for correlating calendar events with nearby hazards.
//!
//! This crate is the engine behind a calendar-watching alert service: it
//! reconciles incoming calendar events with locally tracked records, finds
//! hazard events active near an event's coordinates, and keeps the webhook
//! subscription bookkeeping that ties a push notification back to its owner.
//!
//! Expected failure modes are values, never panics: operations return
//! [`Outcome`] (success/failure) or [`Presence`] (value/absence), and
//! sequences flow through single-pass [`Pipeline`]/[`AsyncPipeline`] chains.
//! Persistence is consumed through the narrow [`storage`] contracts; HTTP
//! routing, credential handling, geocoding, and mail delivery live in the
//! surrounding service, not here.

pub mod channel;
pub mod correlate;
pub mod error;
pub mod event;
pub mod geo;
pub mod hazard;
pub mod notify;
pub mod outcome;
pub mod pipeline;
pub mod reconcile;
pub mod storage;

pub use channel::{ChannelRecord, ChannelRegistry};
pub use correlate::{HazardCorrelator, DEFAULT_HAZARD_RADIUS_KM};
pub use error::{GeoError, SendError, StorageError, StorageOutcome, ValidationError};
pub use event::CalendarEvent;
pub use geo::{GeoPoint, Geocoder};
pub use hazard::{Alert, HazardCategory, HazardEvent};
pub use notify::AlertDispatcher;
pub use outcome::{Classify, Outcome, Presence};
pub use pipeline::{AsyncPipeline, Pipeline};
pub use reconcile::EventReconciler;
