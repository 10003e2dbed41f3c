//! Register command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use palmkey_core::{RecognitionPipeline, TemplateStore};

use crate::detector::build_provider;
use crate::response::{emit, RegisterData, RegisterResponse};
use crate::DetectorArgs;

/// Execute the register command.
pub async fn execute(
    store: Arc<TemplateStore>,
    detector: &DetectorArgs,
    image: PathBuf,
    identity: String,
) -> Result<()> {
    if !image.exists() {
        warn!(image = %image.display(), "Image not found");
        return emit(&RegisterResponse::failure(format!(
            "Image not found: {}",
            image.display()
        )));
    }

    let provider = match build_provider(detector) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "Failed to create keypoint provider");
            let message = super::domain_failure_message(&e).unwrap_or_else(|| e.to_string());
            return emit(&RegisterResponse::failure(message));
        }
    };

    let pipeline = RecognitionPipeline::new(provider, store);
    info!(image = %image.display(), identity, "Registering palm");

    match pipeline.register(&image, &identity).await {
        Ok(record) => {
            info!(identity = %record.identity, signature = %record.signature, "Palm registered");
            emit(&RegisterResponse {
                success: true,
                message: "Palm registered successfully".to_string(),
                data: Some(RegisterData {
                    identity: record.identity,
                    signature: record.signature,
                    registered_at: record.registered_at,
                }),
            })
        }
        Err(e) => match super::domain_failure_message(&e) {
            Some(message) => {
                warn!(error = %e, "Registration failed");
                emit(&RegisterResponse::failure(message))
            }
            None => Err(e.into()),
        },
    }
}
