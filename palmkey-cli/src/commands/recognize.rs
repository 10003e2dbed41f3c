//! Recognize command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use palmkey_core::{RecognitionPipeline, TemplateStore};

use crate::detector::build_provider;
use crate::response::{emit, RecognizeData, RecognizeResponse};
use crate::DetectorArgs;

/// Execute the recognize command.
pub async fn execute(
    store: Arc<TemplateStore>,
    detector: &DetectorArgs,
    image: PathBuf,
    identity: Option<String>,
    threshold: f64,
) -> Result<()> {
    if !image.exists() {
        warn!(image = %image.display(), "Image not found");
        return emit(&RecognizeResponse::failure(format!(
            "Image not found: {}",
            image.display()
        )));
    }

    let provider = match build_provider(detector) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "Failed to create keypoint provider");
            let message = super::domain_failure_message(&e).unwrap_or_else(|| e.to_string());
            return emit(&RecognizeResponse::failure(message));
        }
    };

    let pipeline = RecognitionPipeline::new(provider, store);

    // Open-set recognition against an empty store has nothing to compare.
    if identity.is_none() && pipeline.list()?.is_empty() {
        info!("No registered palms in store");
        return emit(&RecognizeResponse::failure("No registered palms in database"));
    }

    match identity.as_deref() {
        Some(target) => info!(image = %image.display(), target, "Recognizing palm (targeted)"),
        None => info!(image = %image.display(), "Recognizing palm (open-set)"),
    }

    match pipeline.recognize(&image, identity.as_deref(), threshold).await {
        Ok(outcome) if outcome.matched => {
            info!(
                identity = outcome.identity.as_deref().unwrap_or_default(),
                distance = outcome.best_distance,
                "Palm recognized"
            );
            emit(&RecognizeResponse {
                success: true,
                matched: true,
                message: "Palm recognized successfully".to_string(),
                data: Some(RecognizeData {
                    identity: outcome.identity,
                    distance: outcome.best_distance,
                    confidence: Some(outcome.confidence),
                    threshold: outcome.threshold,
                }),
            })
        }
        Ok(outcome) => {
            info!(
                best_distance = outcome.best_distance,
                threshold = outcome.threshold,
                "No matching palm"
            );
            emit(&RecognizeResponse {
                success: true,
                matched: false,
                message: "Palm not recognized".to_string(),
                data: Some(RecognizeData {
                    identity: None,
                    distance: outcome.best_distance,
                    confidence: None,
                    threshold: outcome.threshold,
                }),
            })
        }
        Err(e) => match super::domain_failure_message(&e) {
            Some(message) => {
                warn!(error = %e, "Recognition failed");
                emit(&RecognizeResponse::failure(message))
            }
            None => Err(e.into()),
        },
    }
}
