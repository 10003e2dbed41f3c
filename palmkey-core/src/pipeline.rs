//! Recognition pipeline: detector -> builder -> store/matcher -> decision.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::detector::KeypointProvider;
use crate::error::{PalmError, Result};
use crate::matching::{decide, distance, search};
use crate::store::{Registration, RegistrationSummary, TemplateStore};
use crate::template::{Template, TemplateBuilder};

/// Default ceiling on one keypoint-provider call.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The decision produced by a recognition request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionOutcome {
    pub matched: bool,
    /// Identity of the best candidate on a positive match.
    pub identity: Option<String>,
    /// Distance to the nearest candidate; infinite when no candidate was
    /// comparable.
    pub best_distance: f64,
    /// The threshold this decision was made against.
    pub threshold: f64,
    /// `1 - best_distance`. A derived display value, not a calibrated
    /// probability; it can be negative or exceed 1.
    pub confidence: f64,
}

impl RecognitionOutcome {
    fn no_match(best_distance: f64, threshold: f64) -> Self {
        Self {
            matched: false,
            identity: None,
            best_distance,
            threshold,
            confidence: 1.0 - best_distance,
        }
    }

    fn matched(identity: String, best_distance: f64, threshold: f64) -> Self {
        Self {
            matched: true,
            identity: Some(identity),
            best_distance,
            threshold,
            confidence: 1.0 - best_distance,
        }
    }
}

/// Orchestrates the keypoint provider, template builder, store and match
/// engine into registration and recognition flows.
///
/// The provider call is the only unbounded-latency dependency, so it runs
/// under a request-scoped timeout; template building and matching are pure
/// CPU work.
pub struct RecognitionPipeline {
    provider: Arc<dyn KeypointProvider>,
    store: Arc<TemplateStore>,
    detect_timeout: Duration,
}

impl RecognitionPipeline {
    pub fn new(provider: Arc<dyn KeypointProvider>, store: Arc<TemplateStore>) -> Self {
        Self {
            provider,
            store,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
        }
    }

    pub fn with_detect_timeout(mut self, timeout: Duration) -> Self {
        self.detect_timeout = timeout;
        self
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Detect landmarks under the request timeout and build a template.
    ///
    /// On timeout the in-flight detection is cancelled and no state is
    /// persisted.
    async fn capture_template(&self, image: &Path) -> Result<Template> {
        let landmarks = tokio::time::timeout(self.detect_timeout, self.provider.detect(image))
            .await
            .map_err(|_| PalmError::DetectionTimeout(self.detect_timeout))??;

        TemplateBuilder::new(landmarks).build()
    }

    /// Register the palm in `image` under `identity`.
    #[instrument(level = "info", skip_all, fields(image = %image.display(), identity = %identity))]
    pub async fn register(&self, image: &Path, identity: &str) -> Result<Registration> {
        let template = self.capture_template(image).await?;
        debug!(signature = %template.signature, "Captured registration template");
        self.store.register(identity, &template)
    }

    /// Recognize the palm in `image`.
    ///
    /// With a `target` identity, only that registration is compared
    /// (targeted mode); otherwise the whole store is scanned for the nearest
    /// candidate (open-set mode). A positive match in either mode updates
    /// the matched registration's `last_used`.
    #[instrument(
        level = "info",
        skip_all,
        fields(image = %image.display(), target = ?target, threshold = threshold)
    )]
    pub async fn recognize(
        &self,
        image: &Path,
        target: Option<&str>,
        threshold: f64,
    ) -> Result<RecognitionOutcome> {
        let template = self.capture_template(image).await?;
        debug!(signature = %template.signature, "Captured query template");

        let outcome = match target {
            Some(identity) => self.recognize_targeted(&template, identity, threshold)?,
            None => self.recognize_open_set(&template, threshold)?,
        };

        if let Some(identity) = outcome.matched.then_some(outcome.identity.as_deref()).flatten() {
            // Touch failure downgrades to a log line; the match decision
            // itself already stands.
            match self.store.touch_last_used(identity) {
                Ok(_) => debug!(identity, "Updated lastUsed"),
                Err(e) => warn!(identity, error = %e, "Failed to update lastUsed"),
            }
        }

        info!(
            matched = outcome.matched,
            best_distance = outcome.best_distance,
            threshold = outcome.threshold,
            "Recognition decided"
        );
        Ok(outcome)
    }

    fn recognize_targeted(
        &self,
        template: &Template,
        identity: &str,
        threshold: f64,
    ) -> Result<RecognitionOutcome> {
        let record = self
            .store
            .load(identity)
            .ok_or_else(|| PalmError::NotRegistered(identity.to_string()))?;

        let d = distance(&template.normalized_distances, &record.normalized_distances);
        if d.is_finite() && decide(d, threshold) {
            Ok(RecognitionOutcome::matched(record.identity, d, threshold))
        } else {
            Ok(RecognitionOutcome::no_match(d, threshold))
        }
    }

    fn recognize_open_set(
        &self,
        template: &Template,
        threshold: f64,
    ) -> Result<RecognitionOutcome> {
        let candidates = self.store.load_all()?;
        debug!(candidates = candidates.len(), "Open-set scan");

        match search(template, candidates.iter()) {
            Some(best) if decide(best.distance, threshold) => Ok(RecognitionOutcome::matched(
                best.registration.identity.clone(),
                best.distance,
                threshold,
            )),
            Some(best) => Ok(RecognitionOutcome::no_match(best.distance, threshold)),
            None => Ok(RecognitionOutcome::no_match(f64::INFINITY, threshold)),
        }
    }

    /// Whether a registration exists for `identity`.
    pub fn is_registered(&self, identity: &str) -> bool {
        self.store.load(identity).is_some()
    }

    /// Remove the registration for `identity`. Returns whether one existed.
    pub fn delete(&self, identity: &str) -> bool {
        self.store.delete(identity)
    }

    /// Listing of all registrations.
    pub fn list(&self) -> Result<Vec<RegistrationSummary>> {
        self.store.list_all()
    }
}
