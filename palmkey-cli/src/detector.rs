//! Keypoint provider selection from CLI flags.

use std::sync::Arc;

use tracing::warn;

use palmkey_core::{
    DetectorConfig, DetectorFactory, HttpDetectorConfig, KeypointProvider, Result,
};

use crate::DetectorArgs;

/// Build the keypoint provider the command should use: the mock when
/// requested, an explicit HTTP detector when a URL is given, otherwise
/// whatever the environment provides.
pub fn build_provider(args: &DetectorArgs) -> Result<Arc<dyn KeypointProvider>> {
    if args.mock {
        warn!("Using MOCK keypoint detector (testing only, not a real detection!)");
        return Ok(DetectorFactory::create_mock());
    }

    let config = match &args.detector_url {
        Some(url) => DetectorConfig::Http(HttpDetectorConfig {
            base_url: url.clone(),
            ..Default::default()
        }),
        None => DetectorConfig::Auto,
    };
    DetectorFactory::create(config)
}
