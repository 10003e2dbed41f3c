//! Palmkey Core - palm-biometric template matching library
//!
//! This crate turns hand landmark detections into compact, reproducible palm
//! signatures, persists them per identity, and decides whether a newly
//! captured palm matches a registered one.
//!
//! # Features
//!
//! - Scale-invariant knuckle-distance templates with SHA-256 signatures
//! - Corruption-tolerant per-identity file store with atomic writes
//! - Nearest-neighbor matching with an explicit, caller-supplied threshold
//! - Pluggable keypoint providers (HTTP detector service, deterministic mock)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use palmkey_core::{
//!     DetectorFactory, RecognitionPipeline, TemplateStore, DEFAULT_THRESHOLD,
//! };
//!
//! # async fn example() -> palmkey_core::Result<()> {
//! let store = Arc::new(TemplateStore::open("palm_data")?);
//! let provider = DetectorFactory::create_mock();
//! let pipeline = RecognitionPipeline::new(provider, store);
//!
//! pipeline.register(Path::new("enroll.jpg"), "555-1111").await?;
//! let outcome = pipeline
//!     .recognize(Path::new("query.jpg"), None, DEFAULT_THRESHOLD)
//!     .await?;
//! assert!(outcome.matched);
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod error;
pub mod landmarks;
pub mod matching;
pub mod pipeline;
pub mod store;
pub mod template;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use detector::{DetectorConfig, DetectorFactory, DetectorSource, KeypointProvider,
    MockKeypointProvider};
pub use error::{PalmError, Result};
pub use landmarks::{pair_key, HandLandmarks, Knuckle, Landmark, LANDMARK_COUNT, REFERENCE_PAIR};
pub use matching::{decide, distance, search, BestMatch, DEFAULT_THRESHOLD};
pub use pipeline::{RecognitionOutcome, RecognitionPipeline, DEFAULT_DETECT_TIMEOUT};
pub use store::{validate_identity, Registration, RegistrationSummary, TemplateStore};
pub use template::{
    DistanceVector, Template, TemplateBuilder, MIN_KNUCKLE_CONFIDENCE, SIGNATURE_LEN,
};

#[cfg(feature = "http-provider")]
pub use detector::{DetectorHealthStatus, HttpDetectorConfig, HttpKeypointProvider};
