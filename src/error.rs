//! Error types for the hazcal core.
//!
//! Every failure kind a core operation can report lives here. "Not found" is
//! deliberately missing: absence is modelled as [`Presence::Absent`] and is
//! not an error.
//!
//! [`Presence::Absent`]: crate::outcome::Presence::Absent

use serde_json::error::Category;
use thiserror::Error;

use crate::outcome::{Classify, Outcome};

/// Failures from the persistence collaborators.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("write was not acknowledged by the backend")]
    Unacknowledged,

    #[error("stored record is malformed: {0}")]
    Corrupt(String),

    #[error("unexpected storage failure: {0}")]
    Unexpected(String),
}

/// A record that cannot be represented as a domain entity.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unexpected validation failure: {0}")]
    Unexpected(String),
}

/// Failures from the geocoding collaborator.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("no coordinates found for location `{0}`")]
    NoMatch(String),

    #[error("geocoding backend error: {0}")]
    Backend(String),
}

/// Failures from the notification dispatch collaborator.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("alert rejected for recipient `{0}`")]
    Rejected(String),

    #[error("delivery backend error: {0}")]
    Backend(String),
}

/// Outcome alias for storage-backed operations.
pub type StorageOutcome<T> = Outcome<T, StorageError>;

/// Serde errors raised while encoding or decoding a stored record are
/// expected corruption (bad data, truncated or mangled text); I/O errors are
/// outside the declared set and become fatal.
impl Classify<serde_json::Error> for StorageError {
    fn expected(raw: serde_json::Error) -> Result<Self, serde_json::Error> {
        match raw.classify() {
            Category::Data | Category::Syntax | Category::Eof => {
                Ok(StorageError::Corrupt(raw.to_string()))
            }
            Category::Io => Err(raw),
        }
    }

    fn unexpected(raw: serde_json::Error) -> Self {
        StorageError::Unexpected(raw.to_string())
    }
}

impl Classify<serde_json::Error> for ValidationError {
    fn expected(raw: serde_json::Error) -> Result<Self, serde_json::Error> {
        match raw.classify() {
            Category::Data => Ok(ValidationError::Invalid {
                field: "document",
                reason: raw.to_string(),
            }),
            _ => Err(raw),
        }
    }

    fn unexpected(raw: serde_json::Error) -> Self {
        ValidationError::Unexpected(raw.to_string())
    }
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}
