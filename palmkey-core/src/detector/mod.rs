//! Hand keypoint detection sources.
//!
//! The neural keypoint detector itself is an external collaborator; this
//! module only defines the contract the core consumes and the clients that
//! satisfy it:
//!
//! - `HttpKeypointProvider` - external detector sidecar over HTTP
//! - `MockKeypointProvider` - deterministic synthetic hand (testing only)
//!
//! ## Quick Start
//!
//! ```no_run
//! use palmkey_core::detector::{DetectorConfig, DetectorFactory, KeypointProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = DetectorFactory::create(DetectorConfig::Auto)?;
//! let landmarks = provider.detect(std::path::Path::new("palm.jpg")).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http-provider")]
mod http;
mod mock;

#[cfg(feature = "http-provider")]
pub use http::{DetectorHealthStatus, HttpDetectorConfig, HttpKeypointProvider};
pub use mock::MockKeypointProvider;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{PalmError, Result};
use crate::landmarks::HandLandmarks;

/// Trait for hand keypoint detection sources.
///
/// Implementations must be thread-safe (`Send + Sync`). A successful
/// detection returns all 21 landmarks with independent confidences; the core
/// never retries or post-processes raw pixels.
#[async_trait]
pub trait KeypointProvider: Send + Sync {
    /// Detect the 21 hand landmarks in an image.
    ///
    /// Returns [`PalmError::NoHandDetected`] when no hand is visible and
    /// [`PalmError::DetectorUnavailable`] when no usable detector is loaded.
    async fn detect(&self, image: &Path) -> Result<HandLandmarks>;

    /// Identifies the detection source for diagnostics.
    fn source_id(&self) -> DetectorSource;
}

/// Identifies the keypoint detection source.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectorSource {
    /// External detector service reached over HTTP
    HttpService,
    /// Deterministic mock for testing only
    Mock,
}

impl std::fmt::Display for DetectorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpService => write!(f, "HTTP detector service"),
            Self::Mock => write!(f, "Mock (testing only)"),
        }
    }
}

/// Configuration for creating keypoint providers.
#[derive(Debug, Clone, Default)]
pub enum DetectorConfig {
    /// External HTTP detector service
    #[cfg(feature = "http-provider")]
    Http(HttpDetectorConfig),

    /// Mock provider (testing only)
    Mock { seed: u64 },

    /// Auto-select from the environment
    #[default]
    Auto,
}

/// Factory for creating keypoint providers.
pub struct DetectorFactory;

impl DetectorFactory {
    /// Create a keypoint provider from configuration.
    pub fn create(config: DetectorConfig) -> Result<Arc<dyn KeypointProvider>> {
        match config {
            #[cfg(feature = "http-provider")]
            DetectorConfig::Http(http_config) => {
                let provider = HttpKeypointProvider::new(http_config)?;
                Ok(Arc::new(provider))
            }
            DetectorConfig::Mock { seed } => Ok(Arc::new(MockKeypointProvider::new(seed))),
            DetectorConfig::Auto => Self::create_auto(),
        }
    }

    /// Auto-select a provider: the HTTP service when `PALM_DETECTOR_URL` is
    /// set, otherwise unavailable.
    fn create_auto() -> Result<Arc<dyn KeypointProvider>> {
        #[cfg(feature = "http-provider")]
        if let Ok(config) = HttpDetectorConfig::from_env() {
            tracing::info!(url = %config.base_url, "Auto-selected HTTP detector service");
            return Self::create(DetectorConfig::Http(config));
        }

        Err(PalmError::DetectorUnavailable(
            "No detector configured; set PALM_DETECTOR_URL or use the mock provider".into(),
        ))
    }

    /// Create a mock provider for testing.
    pub fn create_mock() -> Arc<dyn KeypointProvider> {
        Arc::new(MockKeypointProvider::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_config_default_is_auto() {
        assert!(matches!(DetectorConfig::default(), DetectorConfig::Auto));
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = DetectorFactory::create_mock();
        assert_eq!(provider.source_id(), DetectorSource::Mock);
    }

    #[test]
    fn test_create_from_mock_config() {
        let provider = DetectorFactory::create(DetectorConfig::Mock { seed: 7 }).unwrap();
        assert_eq!(provider.source_id(), DetectorSource::Mock);
    }
}
