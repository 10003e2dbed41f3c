use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PalmError {
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("No hand detected in image")]
    NoHandDetected,

    #[error("Keypoint detection timed out after {0:?}")]
    DetectionTimeout(Duration),

    #[error("Knuckle confidence {lowest:.3} below threshold {threshold}")]
    InsufficientConfidence { lowest: f64, threshold: f64 },

    #[error("Reference pair '{0}' missing from distance vector")]
    MissingReference(&'static str),

    #[error("Palm already registered for identity '{0}'")]
    AlreadyRegistered(String),

    #[error("No palm registered for identity '{0}'")]
    NotRegistered(String),

    #[error("Templates share no common measurements")]
    NoCommonMeasurements,

    #[error("Invalid identity '{identity}': {reason}")]
    InvalidIdentity { identity: String, reason: String },

    #[error("Storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "http-provider")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PalmError>;
