//! HTTP client for an external keypoint detector service, with retry,
//! backoff and transient-error classification.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{DetectorSource, KeypointProvider};
use crate::error::{PalmError, Result};
use crate::landmarks::{HandLandmarks, Landmark};

/// Configuration for the HTTP detector client.
#[derive(Debug, Clone)]
pub struct HttpDetectorConfig {
    /// Detector service base URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors
    pub max_retries: u32,
    /// Initial retry interval
    pub initial_interval: Duration,
    /// Maximum retry interval
    pub max_interval: Duration,
}

impl Default for HttpDetectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8500".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
        }
    }
}

impl HttpDetectorConfig {
    /// Create configuration from environment variables.
    ///
    /// Required: `PALM_DETECTOR_URL`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PALM_DETECTOR_URL").map_err(|_| {
            PalmError::DetectorUnavailable("PALM_DETECTOR_URL environment variable not set".into())
        })?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }
}

/// Health status of the detector service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorHealthStatus {
    /// Service is healthy and a model is loaded
    Healthy,
    /// Service is reachable but degraded
    Degraded { reason: String },
    /// Service is unreachable or has no model loaded
    Unavailable { reason: String },
}

/// Detector service response for one image.
#[derive(Debug, Deserialize)]
struct DetectionResponse {
    detected: bool,
    #[serde(default)]
    landmarks: Vec<LandmarkDto>,
}

#[derive(Debug, Deserialize)]
struct LandmarkDto {
    x: f64,
    y: f64,
    confidence: f64,
}

/// Detector service health response.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    model_loaded: bool,
}

/// HTTP keypoint detector client.
pub struct HttpKeypointProvider {
    client: Client,
    config: HttpDetectorConfig,
}

impl HttpKeypointProvider {
    /// Create a new detector client.
    #[instrument(level = "debug", skip_all, fields(base_url = %config.base_url))]
    pub fn new(config: HttpDetectorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PalmError::DetectorUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("Created detector HTTP client");
        Ok(Self { client, config })
    }

    /// Check detector service health.
    #[instrument(level = "debug", skip(self))]
    pub async fn health(&self) -> Result<DetectorHealthStatus> {
        let url = format!("{}/health", self.config.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(DetectorHealthStatus::Unavailable {
                    reason: format!("Health check failed: {e}"),
                })
            }
        };

        match response.status() {
            StatusCode::OK => {
                let health: HealthResponse = response.json().await.map_err(|e| {
                    PalmError::DetectorUnavailable(format!("Failed to parse health response: {e}"))
                })?;
                if health.model_loaded {
                    Ok(DetectorHealthStatus::Healthy)
                } else {
                    Ok(DetectorHealthStatus::Degraded {
                        reason: "No keypoint model loaded".into(),
                    })
                }
            }
            StatusCode::SERVICE_UNAVAILABLE => Ok(DetectorHealthStatus::Unavailable {
                reason: "Service unavailable".into(),
            }),
            status => Ok(DetectorHealthStatus::Unavailable {
                reason: format!("Unexpected status: {status}"),
            }),
        }
    }

    /// Run one detection attempt against the service.
    async fn detect_once(
        &self,
        image_bytes: &[u8],
    ) -> std::result::Result<HandLandmarks, backoff::Error<PalmError>> {
        let url = format!("{}/detect", self.config.base_url);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis();
                if is_transient_error(&e) {
                    warn!(error = %e, latency_ms = latency_ms as u64, "Transient error, will retry");
                    backoff::Error::transient(PalmError::DetectorUnavailable(format!(
                        "Transient error (will retry): {e}"
                    )))
                } else {
                    warn!(error = %e, latency_ms = latency_ms as u64, "Permanent error, aborting");
                    backoff::Error::permanent(PalmError::DetectorUnavailable(format!(
                        "Detector request failed: {e}"
                    )))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let err =
                PalmError::DetectorUnavailable(format!("Detector returned status: {status}"));
            return if is_transient_status(status) {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        let detection: DetectionResponse = response.json().await.map_err(|e| {
            backoff::Error::permanent(PalmError::Serialization(format!(
                "Failed to parse detector response: {e}"
            )))
        })?;

        if !detection.detected {
            return Err(backoff::Error::permanent(PalmError::NoHandDetected));
        }

        let points = detection
            .landmarks
            .into_iter()
            .map(|p| Landmark::new(p.x, p.y, p.confidence))
            .collect();
        let landmarks =
            HandLandmarks::from_points(points).map_err(backoff::Error::permanent)?;

        let latency_ms = start.elapsed().as_millis();
        debug!(latency_ms = latency_ms as u64, "Detection completed");

        Ok(landmarks)
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

#[async_trait]
impl KeypointProvider for HttpKeypointProvider {
    #[instrument(
        level = "info",
        skip(self),
        fields(source = "http", max_retries = self.config.max_retries)
    )]
    async fn detect(&self, image: &Path) -> Result<HandLandmarks> {
        let image_bytes = std::fs::read(image)?;
        let start = Instant::now();

        let result = retry_notify(
            self.build_backoff(),
            || async { self.detect_once(&image_bytes).await },
            |err: PalmError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await;

        let total_ms = start.elapsed().as_millis();
        match &result {
            Ok(_) => info!(total_latency_ms = total_ms as u64, "Detection succeeded"),
            Err(e) => {
                warn!(error = %e, total_latency_ms = total_ms as u64, "Detection failed after retries")
            }
        }

        result
    }

    fn source_id(&self) -> DetectorSource {
        DetectorSource::HttpService
    }
}

/// Check if a reqwest error is transient and should be retried.
fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
